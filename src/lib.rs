//! YouTube Extractor
//!
//! Video metadata, transcripts, subtitle URLs and comments from YouTube, served over HTTP
//! or processed in batches from CSV files.

pub mod batch;
pub mod comments;
pub mod config;
pub mod error;
pub mod export;
pub mod extractor;
pub mod import;
pub mod models;
pub mod retry;
pub mod transcription;
pub mod youtube;

#[cfg(feature = "api")]
pub mod api;

// Re-export main types for easy access
pub use crate::batch::{BatchOutcome, BatchProcessor, PacingTier, RateLimitPolicy};
pub use crate::comments::{CommentRecord, CommentsResponse, LanguageGroup};
pub use crate::config::{Config, ConfigBuilder};
pub use crate::error::{ErrorKind, ExtractError, Result};
pub use crate::export::{CsvLayout, ExportFormat};
pub use crate::extractor::VideoExtractor;
pub use crate::models::{SubtitleListing, SubtitleUrl, TranscriptCue, TranscriptFields, VideoRecord};
pub use crate::retry::{ErrorClass, RetryPolicy};
pub use crate::transcription::{
    parse_vtt, ParsedTranscript, Transcript, TranscriptBackend, TranscriptStrategy, VttDocument,
};
pub use crate::youtube::{ExtractMode, ExtractRequest, VideoDownloader, YtDlpClient};
