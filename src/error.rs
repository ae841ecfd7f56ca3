//! Error taxonomy for extraction operations

use serde::{Deserialize, Serialize};

/// Result type for extraction operations
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Error types for extraction operations
#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    #[error("Video not found or access restricted: {0}")]
    VideoUnavailable(String),

    #[error("YouTube rate limited the request after {attempts} attempts, try again later")]
    RateLimited { attempts: u32 },

    #[error("YouTube bot detection blocked access after {attempts} attempts; {}", cookie_hint(.cookies_configured))]
    AccessBlocked {
        attempts: u32,
        cookies_configured: bool,
    },

    #[error("Extraction failed after {attempts} attempts ({message}); {}", cookie_hint(.cookies_configured))]
    RetriesExhausted {
        attempts: u32,
        message: String,
        cookies_configured: bool,
    },

    #[error("Upstream error: {message}")]
    Upstream {
        status: Option<u16>,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("No transcript available: {0}")]
    NoTranscript(String),

    #[error("Subtitle parse failure: {0}")]
    Parse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Backend unavailable: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Coarse error categories reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UpstreamUnavailable,
    RateLimited,
    AccessBlocked,
    Unknown,
    Upstream,
    TransientNetwork,
    NoTranscript,
    ParseFailure,
    InvalidInput,
    Backend,
    Internal,
}

impl ExtractError {
    /// Build an upstream error from a message with no HTTP status
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            status: None,
            message: message.into(),
        }
    }

    /// Build an upstream error for a non-success HTTP response
    pub fn http_status(status: u16, message: impl Into<String>) -> Self {
        Self::Upstream {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::VideoUnavailable(_) => ErrorKind::UpstreamUnavailable,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::AccessBlocked { .. } => ErrorKind::AccessBlocked,
            Self::RetriesExhausted { .. } => ErrorKind::Unknown,
            Self::Upstream { .. } => ErrorKind::Upstream,
            Self::Network(_) => ErrorKind::TransientNetwork,
            Self::NoTranscript(_) => ErrorKind::NoTranscript,
            Self::Parse(_) => ErrorKind::ParseFailure,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Backend(_) => ErrorKind::Backend,
            Self::Io(_) | Self::Json(_) | Self::Csv(_) => ErrorKind::Internal,
        }
    }

    /// HTTP status code used when the error reaches the API surface
    pub fn status_code(&self) -> u16 {
        match self {
            Self::VideoUnavailable(_) | Self::NoTranscript(_) => 404,
            Self::RateLimited { .. } => 429,
            Self::AccessBlocked { .. } => 403,
            Self::RetriesExhausted { .. } => 500,
            Self::Upstream { .. } | Self::InvalidInput(_) => 400,
            Self::Network(_) => 502,
            Self::Parse(_) => 422,
            Self::Backend(_) => 503,
            Self::Io(_) | Self::Json(_) | Self::Csv(_) => 500,
        }
    }
}

fn cookie_hint(cookies_configured: &bool) -> &'static str {
    if *cookies_configured {
        "the configured cookie file was still rejected, refresh it or retry later"
    } else {
        "set YOUTUBE_COOKIES_FILE to a cookie file or retry later"
    }
}
