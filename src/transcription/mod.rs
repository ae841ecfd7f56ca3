//! Transcript backends, the ordered backend strategy and the VTT cue parser

pub mod captions;
pub mod vtt;
pub mod ytdlp;

pub use captions::CaptionTrackBackend;
pub use vtt::{parse_vtt, ParsedTranscript, VttDocument};
pub use ytdlp::YtDlpSubtitleBackend;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{ExtractError, Result};
use crate::models::{TranscriptCue, TranscriptFields};
use crate::retry::{retry, RetryPolicy};
use crate::youtube::VideoDownloader;

/// A fetched transcript
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub cues: Vec<TranscriptCue>,
    pub text: String,
    pub language_code: String,
    pub language_name: String,
    pub is_generated: bool,
}

impl Transcript {
    pub fn from_parsed(
        parsed: ParsedTranscript,
        language_code: impl Into<String>,
        language_name: impl Into<String>,
        is_generated: bool,
    ) -> Self {
        Self {
            cues: parsed.cues,
            text: parsed.text,
            language_code: language_code.into(),
            language_name: language_name.into(),
            is_generated,
        }
    }

    /// Convert into the transcript field group of a video record
    pub fn into_fields(self) -> TranscriptFields {
        TranscriptFields {
            snippet_count: self.cues.len(),
            transcript: self.text,
            transcript_language: self.language_code,
            transcript_language_name: self.language_name,
            is_generated: self.is_generated,
            transcript_list: self.cues,
        }
    }
}

/// A source of transcripts for a video id
#[async_trait]
pub trait TranscriptBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch a transcript in the first available language of `languages`
    async fn fetch(&self, video_id: &str, languages: &[String]) -> Result<Transcript>;
}

/// HTTP client for subtitle and caption downloads
#[derive(Debug, Clone)]
pub struct SubtitleFetcher {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl SubtitleFetcher {
    pub fn new(client: reqwest::Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Ok(value) = reqwest::header::HeaderValue::from_str(&config.youtube.accept_language) {
            headers.insert(reqwest::header::ACCEPT_LANGUAGE, value);
        }
        headers.insert(
            reqwest::header::REFERER,
            reqwest::header::HeaderValue::from_static("https://www.youtube.com/"),
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.transcript.http_timeout_secs))
            .user_agent(config.youtube.user_agent.clone())
            .default_headers(headers)
            .build()?;

        Ok(Self::new(client, config.retry_policy()))
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// GET a URL as text, retrying rate-limited responses
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        retry(&self.retry, "subtitle download", false, |attempt| async move {
            debug!("Downloading subtitle (attempt {}): {}", attempt, url);
            let response = self.client.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(ExtractError::http_status(
                    status.as_u16(),
                    format!("subtitle download returned {}", status),
                ));
            }
            Ok(response.text().await?)
        })
        .await
    }

    /// Download a WebVTT track and parse it
    pub async fn fetch_vtt(&self, url: &str) -> Result<ParsedTranscript> {
        let body = self.fetch_text(url).await?;
        let parsed = parse_vtt(&body);
        if parsed.is_empty() {
            return Err(ExtractError::Parse("subtitle track contained no cues".to_string()));
        }
        Ok(parsed)
    }
}

/// Ordered transcript backends; the first success wins
#[derive(Clone, Default)]
pub struct TranscriptStrategy {
    backends: Vec<Arc<dyn TranscriptBackend>>,
}

impl TranscriptStrategy {
    pub fn new(backends: Vec<Arc<dyn TranscriptBackend>>) -> Self {
        Self { backends }
    }

    /// Build the backend list named in the configuration
    pub fn from_config(config: &Config, downloader: Arc<dyn VideoDownloader>) -> Result<Self> {
        let fetcher = Arc::new(SubtitleFetcher::from_config(config)?);
        let mut backends: Vec<Arc<dyn TranscriptBackend>> = Vec::new();

        for name in &config.transcript.backends {
            match name.as_str() {
                "captions" => backends.push(Arc::new(CaptionTrackBackend::new(fetcher.clone()))),
                "ytdlp" => backends.push(Arc::new(YtDlpSubtitleBackend::new(
                    downloader.clone(),
                    fetcher.clone(),
                    config,
                ))),
                other => {
                    return Err(ExtractError::InvalidInput(format!(
                        "unknown transcript backend: {}",
                        other
                    )))
                }
            }
        }

        Ok(Self::new(backends))
    }

    pub fn backend_names(&self) -> Vec<String> {
        self.backends.iter().map(|b| b.name().to_string()).collect()
    }

    /// Try each backend in order
    pub async fn fetch(&self, video_id: &str, languages: &[String]) -> Result<Transcript> {
        let mut last_error = None;

        for backend in &self.backends {
            match backend.fetch(video_id, languages).await {
                Ok(transcript) => {
                    info!(
                        "📝 Transcript for {} from {} ({}, {} cues)",
                        video_id,
                        backend.name(),
                        transcript.language_code,
                        transcript.cues.len()
                    );
                    return Ok(transcript);
                }
                Err(e) => {
                    warn!("Transcript backend {} failed for {}: {}", backend.name(), video_id, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ExtractError::NoTranscript(format!("no transcript backend configured for {}", video_id))
        }))
    }
}
