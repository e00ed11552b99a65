/*!
 * Provider fallback policy.
 *
 * The styled path runs against the primary provider once. If it fails, the
 * failure is classified a single time from the structured error and the
 * next state is a pure function of that classification.
 */

use std::fmt;

use log::{info, warn};

use crate::errors::{CaptionError, ProviderError};

/// Provider error codes that mean the account is out of quota or throttled
const QUOTA_ERROR_CODES: &[&str] = &[
    "insufficient_quota",
    "rate_limit_exceeded",
    "ASR_PAYMENT_REQUIRED",
    "TOO_MANY_REQUESTS",
];

/// Where the caption pipeline currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackState {
    /// Styled path against the primary provider
    Primary,
    /// Plain path against the secondary provider, then sanitization
    Secondary,
    /// No path left; the last error is surfaced
    Exhausted,
}

impl fmt::Display for FallbackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Exhausted => "exhausted",
        };
        write!(f, "{}", name)
    }
}

/// Classification of a caption pipeline failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    CredentialMissing,
    QuotaOrRateLimited,
    MalformedResponse,
    TransportError,
}

impl FailureKind {
    /// Classify an error from its structure, never from its message text
    pub fn classify(error: &CaptionError) -> Self {
        match error {
            CaptionError::Provider(provider) => Self::classify_provider(provider),
            CaptionError::NoAlternatives
            | CaptionError::EmptyTranscript
            | CaptionError::SanitizationFailure(_)
            | CaptionError::RenderingFailure(_) => Self::MalformedResponse,
            CaptionError::TranscodeFailure(_) => Self::TransportError,
        }
    }

    fn classify_provider(error: &ProviderError) -> Self {
        match error {
            ProviderError::MissingCredential(_) => Self::CredentialMissing,
            ProviderError::Transport(_) => Self::TransportError,
            ProviderError::MalformedResponse(_) => Self::MalformedResponse,
            ProviderError::Http { status, code, .. } => {
                let quota_code = code
                    .as_deref()
                    .is_some_and(|c| QUOTA_ERROR_CODES.iter().any(|q| q.eq_ignore_ascii_case(c)));
                match status {
                    402 | 429 => Self::QuotaOrRateLimited,
                    _ if quota_code => Self::QuotaOrRateLimited,
                    401 | 403 => Self::CredentialMissing,
                    408 | 500..=599 => Self::TransportError,
                    _ => Self::MalformedResponse,
                }
            }
        }
    }

    /// Whether this kind of failure may be retried on the secondary path
    pub fn allows_fallback(self) -> bool {
        matches!(self, Self::QuotaOrRateLimited | Self::MalformedResponse)
    }
}

/// Next state after a failure in `state`
pub fn next_state(state: FallbackState, kind: FailureKind, secondary_available: bool) -> FallbackState {
    match state {
        FallbackState::Primary if kind.allows_fallback() && secondary_available => FallbackState::Secondary,
        _ => FallbackState::Exhausted,
    }
}

/// Tracks one job's walk through the fallback states
#[derive(Debug, Clone)]
pub struct ProviderFallbackPolicy {
    state: FallbackState,
    secondary_available: bool,
}

impl ProviderFallbackPolicy {
    pub fn new(secondary_available: bool) -> Self {
        Self {
            state: FallbackState::Primary,
            secondary_available,
        }
    }

    pub fn state(&self) -> FallbackState {
        self.state
    }

    /// Record a failure of the current state's attempt and move on
    pub fn on_failure(&mut self, error: &CaptionError) -> FallbackState {
        let kind = FailureKind::classify(error);
        let next = next_state(self.state, kind, self.secondary_available);

        match next {
            FallbackState::Secondary => info!("{} path failed ({:?}): {}; trying {} path", self.state, kind, error, next),
            _ => warn!("{} path failed ({:?}): {}; no path left", self.state, kind, error),
        }

        self.state = next;
        next
    }
}
