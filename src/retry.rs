//! Retry/backoff wrapper with an explicit error classifier

use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{ExtractError, Result};

/// Bounded retry with exponential backoff.
///
/// The wait before attempt `n` (for `n > 1`) is `base_delay * 2^(n-1)`, capped at `max_delay`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Wait applied before the given 1-based attempt
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let factor = 2u32.saturating_pow(attempt - 1);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Failure categories that decide whether an attempt is repeated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    RateLimited,
    BotDetected,
    ExtractorFailure,
    Transient,
    Unavailable,
    Fatal,
}

impl ErrorClass {
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::BotDetected | Self::ExtractorFailure | Self::Transient
        )
    }
}

const BOT_MARKERS: &[&str] = &["bot", "sign in", "cookies"];
const RATE_LIMIT_MARKERS: &[&str] = &["429", "too many requests", "rate limit", "precondition"];
const EXTRACTOR_MARKERS: &[&str] = &["failed to extract", "player response"];
const UNAVAILABLE_MARKERS: &[&str] = &["video unavailable", "private video"];

/// Map an error onto its retry class
pub fn classify(error: &ExtractError) -> ErrorClass {
    match error {
        ExtractError::Upstream { status: Some(429), .. } => ErrorClass::RateLimited,
        ExtractError::Upstream { message, .. } => classify_message(message),
        ExtractError::RateLimited { .. } => ErrorClass::RateLimited,
        ExtractError::AccessBlocked { .. } => ErrorClass::BotDetected,
        ExtractError::VideoUnavailable(_) => ErrorClass::Unavailable,
        ExtractError::Network(e) if e.is_timeout() || e.is_connect() => ErrorClass::Transient,
        ExtractError::Network(e) if e.status().map(|s| s.as_u16()) == Some(429) => {
            ErrorClass::RateLimited
        }
        _ => ErrorClass::Fatal,
    }
}

fn classify_message(message: &str) -> ErrorClass {
    let lower = message.to_lowercase();
    let has_any = |markers: &[&str]| markers.iter().any(|m| lower.contains(m));

    if has_any(UNAVAILABLE_MARKERS) {
        ErrorClass::Unavailable
    } else if has_any(BOT_MARKERS) {
        ErrorClass::BotDetected
    } else if has_any(RATE_LIMIT_MARKERS) {
        ErrorClass::RateLimited
    } else if has_any(EXTRACTOR_MARKERS) {
        ErrorClass::ExtractorFailure
    } else {
        ErrorClass::Fatal
    }
}

/// Run `operation` until it succeeds, hits a non-retryable error, or runs out of attempts.
///
/// `operation` receives the 1-based attempt number. `cookies_configured` only shapes the
/// message of the terminal error.
pub async fn retry<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    cookies_configured: bool,
    mut operation: F,
) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last: Option<(ErrorClass, ExtractError)> = None;

    for attempt in 1..=max_attempts {
        let delay = policy.delay_before(attempt);
        if !delay.is_zero() {
            debug!("⏳ {}: waiting {:?} before attempt {}/{}", label, delay, attempt, max_attempts);
            tokio::time::sleep(delay).await;
        }

        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) => {
                let class = classify(&error);
                if !class.is_retryable() {
                    debug!("{}: {:?} error is not retried: {}", label, class, error);
                    return Err(match (class, error) {
                        (ErrorClass::Unavailable, ExtractError::Upstream { message, .. }) => {
                            ExtractError::VideoUnavailable(message)
                        }
                        (_, error) => error,
                    });
                }
                warn!(
                    "⚠️ {}: attempt {}/{} failed ({:?}): {}",
                    label, attempt, max_attempts, class, error
                );
                last = Some((class, error));
            }
        }
    }

    let (class, error) = match last {
        Some(last) => last,
        None => return Err(ExtractError::Backend(format!("{}: no attempt was made", label))),
    };

    Err(match class {
        ErrorClass::BotDetected => ExtractError::AccessBlocked {
            attempts: max_attempts,
            cookies_configured,
        },
        ErrorClass::RateLimited => ExtractError::RateLimited {
            attempts: max_attempts,
        },
        _ => ExtractError::RetriesExhausted {
            attempts: max_attempts,
            message: error.to_string(),
            cookies_configured,
        },
    })
}
