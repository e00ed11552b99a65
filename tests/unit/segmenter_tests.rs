/*!
 * Tests for grouping ASR output into cues
 */

use capforge::segmenter::{group_words, segment, Cue, MAX_CUE_SECS, MAX_GAP_SECS, MAX_WORDS_PER_CUE};
use capforge::transcript::{AsrResponse, WordToken};

use crate::common;

/// Every token's text appears in exactly one cue, in order
fn assert_covers_in_order(words: &[WordToken], cues: &[Cue]) {
    let from_cues: Vec<String> = cues
        .iter()
        .flat_map(|c| c.text.split(' ').map(str::to_string))
        .collect();
    let from_words: Vec<String> = words.iter().map(|w| w.text.clone()).collect();
    assert_eq!(from_cues, from_words);
}

#[test]
fn test_segment_withTwoSentences_shouldYieldTwoCues() {
    let response = common::two_sentence_response();
    let cues = segment(response.first_alternative().unwrap()).unwrap();

    assert_eq!(
        cues,
        vec![Cue::new(0.0, 1.0, "Hello world."), Cue::new(1.2, 2.5, "This is great.")]
    );
}

#[test]
fn test_groupWords_withLargeGap_shouldSplit() {
    let words = common::words(&[(0.0, 0.3), (0.35, 0.6), (1.3, 1.5)]);
    let cues = group_words(&words);

    assert_eq!(cues.len(), 2);
    assert_eq!(cues[0].text, "w0 w1");
    assert_eq!(cues[1].text, "w2");
    assert_covers_in_order(&words, &cues);
}

#[test]
fn test_groupWords_withGapUnderLimit_shouldNotSplit() {
    let words = common::words(&[(0.0, 0.5), (1.05, 1.2)]);
    assert_eq!(group_words(&words).len(), 1);
}

#[test]
fn test_groupWords_withManyShortWords_shouldCapAtTwelve() {
    let words = common::evenly_spaced_words(30, 0.05, 0.01);
    let cues = group_words(&words);

    assert_eq!(cues.len(), 3);
    for cue in &cues {
        assert!(cue.text.split(' ').count() <= MAX_WORDS_PER_CUE);
    }
    assert_eq!(cues[0].text.split(' ').count(), 12);
    assert_eq!(cues[2].text.split(' ').count(), 6);
    assert_covers_in_order(&words, &cues);
}

#[test]
fn test_groupWords_withLongRun_shouldKeepCuesWithinThreeSeconds() {
    // 0.4s words with 0.2s gaps: the span limit triggers before the count limit
    let words = common::evenly_spaced_words(20, 0.4, 0.2);
    let cues = group_words(&words);

    assert!(cues.len() > 1);
    for cue in &cues {
        assert!(cue.end - cue.start <= MAX_CUE_SECS + 1e-9, "cue too long: {:?}", cue);
    }
    assert_covers_in_order(&words, &cues);
}

#[test]
fn test_groupWords_withSingleLongWord_shouldKeepItAlone() {
    let words = common::words(&[(0.0, 0.2), (0.3, 4.0), (4.1, 4.3)]);
    let cues = group_words(&words);

    assert_eq!(cues.len(), 3);
    assert_eq!(cues[1], Cue::new(0.3, 4.0, "w1"));
}

#[test]
fn test_groupWords_withGapInvariant_shouldNeverShareCueAcrossLargeGap() {
    let spans = [(0.0, 0.2), (0.9, 1.0), (1.05, 1.1), (1.8, 2.0), (2.1, 2.2), (2.95, 3.0)];
    let words = common::words(&spans);
    let cues = group_words(&words);

    for pair in words.windows(2) {
        if pair[1].start - pair[0].end > MAX_GAP_SECS {
            let same_cue = cues.iter().any(|c| {
                let tokens: Vec<&str> = c.text.split(' ').collect();
                tokens.contains(&pair[0].text.as_str()) && tokens.contains(&pair[1].text.as_str())
            });
            assert!(!same_cue, "{} and {} share a cue", pair[0].text, pair[1].text);
        }
    }
    assert_covers_in_order(&words, &cues);
}

#[test]
fn test_groupWords_withEmptyInput_shouldYieldNothing() {
    assert!(group_words(&[]).is_empty());
}

#[test]
fn test_segment_withTranscriptOnly_shouldEstimateDuration() {
    let json = r#"{"results":{"channels":[{"alternatives":[{"transcript":"one two three"}]}]}}"#;
    let response = AsrResponse::from_json(json).unwrap();
    let cues = segment(response.first_alternative().unwrap()).unwrap();
    assert_eq!(cues, vec![Cue::new(0.0, 2.0, "one two three")]);

    let long_text = vec!["word"; 10].join(" ");
    let json = format!(
        r#"{{"results":{{"channels":[{{"alternatives":[{{"transcript":"{}"}}]}}]}}}}"#,
        long_text
    );
    let response = AsrResponse::from_json(&json).unwrap();
    let cues = segment(response.first_alternative().unwrap()).unwrap();
    assert!((cues[0].end - 3.0).abs() < 1e-9);
}

#[test]
fn test_segment_withBlankTranscript_shouldYieldNoCues() {
    let json = r#"{"results":{"channels":[{"alternatives":[{"transcript":"   "}]}]}}"#;
    let response = AsrResponse::from_json(json).unwrap();
    assert!(segment(response.first_alternative().unwrap()).unwrap().is_empty());
}

#[test]
fn test_cueNew_withEndBeforeStart_shouldClampEnd() {
    let cue = Cue::new(2.0, 1.5, "x");
    assert_eq!(cue.end, 2.0);
}

#[test]
fn test_wordsWithin_shouldApplyToleranceOnBothEnds() {
    let cue = Cue::new(1.0, 2.0, "window");
    let words = common::words(&[(0.985, 1.2), (0.97, 1.2), (1.5, 2.015), (1.5, 2.03)]);
    let inside: Vec<&str> = cue.words_within(&words).iter().map(|w| w.text.as_str()).collect();
    assert_eq!(inside, vec!["w0", "w2"]);
}
