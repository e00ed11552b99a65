/*!
 * Tests for application configuration functionality
 */

use std::collections::HashMap;

use anyhow::Result;
use capforge::app_config::{read_env_file, Config, LogLevel, SecondaryProvider, StyleConfig};

use crate::common;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |key| map.get(key).cloned()
}

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.style.font_family, "Inter");
    assert_eq!(config.style.font_size, 56);
    assert!(!config.style.overlay);
    assert_eq!(config.transcription.deepgram.model, "nova-2-general");
    assert_eq!(config.transcription.openai.model, "whisper-1");
    assert_eq!(config.transcription.secondary, SecondaryProvider::OpenAI);
    assert_eq!(config.worker.poll_seconds, 2);
    assert_eq!(config.worker.error_message_chars, 250);
    assert_eq!(config.transcode.crf, 20);
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_fromPartialJson_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "conf.json",
        r#"{"style": {"font_family": "Roboto"}, "log_level": "debug"}"#,
    )?;

    let config = Config::from_file(&path)?;
    assert_eq!(config.style.font_family, "Roboto");
    assert_eq!(config.style.font_size, 56);
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.transcription.deepgram.endpoint, "https://api.deepgram.com");
    Ok(())
}

#[test]
fn test_config_saveThenLoad_shouldPreserveValues() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let mut config = Config::default();
    config.style.overlay = true;
    config.transcription.secondary = SecondaryProvider::Deepgram;
    config.save(&path)?;

    let loaded = Config::from_file(&path)?;
    assert!(loaded.style.overlay);
    assert_eq!(loaded.transcription.secondary, SecondaryProvider::Deepgram);
    Ok(())
}

#[test]
fn test_applyEnv_withVariables_shouldOverrideConfig() -> Result<()> {
    let mut config = Config::default();
    config.apply_env(lookup(&[
        ("DEEPGRAM_API_KEY", " dg-key "),
        ("OPENAI_API_KEY", "sk-test"),
        ("DEFAULT_FONT", "Montserrat"),
        ("POLL_SECONDS", "5"),
        ("CAPFORGE_SECONDARY_PROVIDER", "none"),
    ]))?;

    assert_eq!(config.transcription.deepgram.api_key, "dg-key");
    assert_eq!(config.transcription.openai.api_key, "sk-test");
    assert_eq!(config.style.font_family, "Montserrat");
    assert_eq!(config.worker.poll_seconds, 5);
    assert_eq!(config.transcription.secondary, SecondaryProvider::None);
    Ok(())
}

#[test]
fn test_applyEnv_withBlankOrMissing_shouldKeepConfig() -> Result<()> {
    let mut config = Config::default();
    config.apply_env(lookup(&[("DEFAULT_FONT", "   ")]))?;
    assert_eq!(config.style.font_family, "Inter");
    Ok(())
}

#[test]
fn test_applyEnv_withInvalidValues_shouldFail() {
    let mut config = Config::default();
    assert!(config.apply_env(lookup(&[("POLL_SECONDS", "soon")])).is_err());
    assert!(config.apply_env(lookup(&[("CAPFORGE_SECONDARY_PROVIDER", "whisperx")])).is_err());
}

#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();
    config.style.font_family = "  ".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.style.font_family = "Inter, Bold".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.worker.poll_seconds = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.style.font_size = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_secondaryAvailable_shouldRequireCredentials() {
    let mut config = Config::default();
    assert!(!config.transcription.secondary_available());

    config.transcription.openai.api_key = "sk-test".to_string();
    assert!(config.transcription.secondary_available());

    config.transcription.secondary = SecondaryProvider::None;
    assert!(!config.transcription.secondary_available());
}

#[test]
fn test_styleConfig_resolve_shouldFallBackPerField() {
    let defaults = StyleConfig::default();

    let resolved = defaults.resolve(Some("Bebas Neue"), None);
    assert_eq!(resolved.font_family, "Bebas Neue");
    assert!(!resolved.overlay);

    let resolved = defaults.resolve(Some("  "), Some(true));
    assert_eq!(resolved.font_family, "Inter");
    assert!(resolved.overlay);
    assert_eq!(resolved.font_size, 56);
}

#[test]
fn test_styleConfig_resolve_withUnusableFont_shouldUseDefault() {
    let defaults = StyleConfig::default();

    assert_eq!(defaults.resolve(Some("Arial, Bold"), None).font_family, "Inter");
    assert_eq!(defaults.resolve(Some("Arial\nBold"), None).font_family, "Inter");
    assert_eq!(defaults.resolve(Some(" Open Sans "), None).font_family, "Open Sans");
}

#[test]
fn test_secondaryProvider_fromStr_shouldBeCaseInsensitive() {
    assert_eq!("OpenAI".parse::<SecondaryProvider>().unwrap(), SecondaryProvider::OpenAI);
    assert_eq!("DEEPGRAM".parse::<SecondaryProvider>().unwrap(), SecondaryProvider::Deepgram);
    assert_eq!(SecondaryProvider::Deepgram.to_string(), "deepgram");
}

#[test]
fn test_readEnvFile_shouldParseQuotedValuesAndSkipComments() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        ".env",
        "# credentials\nDEEPGRAM_API_KEY=\"abc123\"\nOPENAI_API_KEY = 'sk-x'\nnot a pair\n",
    )?;

    let vars = read_env_file(&path)?;
    assert_eq!(vars.get("DEEPGRAM_API_KEY").map(String::as_str), Some("abc123"));
    assert_eq!(vars.get("OPENAI_API_KEY").map(String::as_str), Some("sk-x"));
    assert_eq!(vars.len(), 2);

    assert!(read_env_file(temp_dir.path().join("missing.env"))?.is_empty());
    Ok(())
}

#[test]
fn test_logLevel_toLevelFilter_shouldMapEachLevel() {
    assert_eq!(LogLevel::Warn.to_level_filter(), log::LevelFilter::Warn);
    assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
}
