//! Combined metadata, transcript, comment and subtitle extraction

use std::sync::Arc;
use tracing::{info, warn};

use crate::batch::{BatchOutcome, BatchProcessor};
use crate::comments::{comments_from_info, CommentsResponse};
use crate::config::Config;
use crate::error::Result;
use crate::models::{SubtitleListing, VideoRecord};
use crate::retry::{retry, RetryPolicy};
use crate::transcription::{Transcript, TranscriptStrategy};
use crate::youtube::{extract_video_id, ExtractRequest, VideoDownloader, YtDlpClient};

/// Entry point for every extraction operation
#[derive(Clone)]
pub struct VideoExtractor {
    downloader: Arc<dyn VideoDownloader>,
    transcripts: TranscriptStrategy,
    retry: RetryPolicy,
    batch: BatchProcessor,
    default_languages: Vec<String>,
}

impl VideoExtractor {
    pub fn new(
        downloader: Arc<dyn VideoDownloader>,
        transcripts: TranscriptStrategy,
        retry: RetryPolicy,
        batch: BatchProcessor,
        default_languages: Vec<String>,
    ) -> Self {
        Self {
            downloader,
            transcripts,
            retry,
            batch,
            default_languages,
        }
    }

    /// yt-dlp downloader plus the configured transcript backends
    pub fn from_config(config: &Config) -> Result<Self> {
        let downloader: Arc<dyn VideoDownloader> = Arc::new(YtDlpClient::from_config(config));
        let transcripts = TranscriptStrategy::from_config(config, downloader.clone())?;
        Ok(Self::with_parts(config, downloader, transcripts))
    }

    /// Configured policies around caller-supplied backends
    pub fn with_parts(
        config: &Config,
        downloader: Arc<dyn VideoDownloader>,
        transcripts: TranscriptStrategy,
    ) -> Self {
        Self::new(
            downloader,
            transcripts,
            config.retry_policy(),
            BatchProcessor::new(config.rate_limit_policy()),
            config.youtube.default_languages.clone(),
        )
    }

    pub fn default_languages(&self) -> &[String] {
        &self.default_languages
    }

    pub fn transcript_backends(&self) -> Vec<String> {
        self.transcripts.backend_names()
    }

    fn languages_or_default(&self, languages: &[String]) -> Vec<String> {
        if languages.is_empty() {
            self.default_languages.clone()
        } else {
            languages.to_vec()
        }
    }

    async fn fetch_info(&self, request: ExtractRequest, label: &str) -> Result<serde_json::Value> {
        retry(
            &self.retry,
            label,
            self.downloader.cookies_configured(),
            |_| self.downloader.extract(&request),
        )
        .await
    }

    /// Video metadata and subtitle URLs
    pub async fn video_info(&self, url: &str) -> Result<VideoRecord> {
        let info = self.fetch_info(ExtractRequest::metadata(url), "video info").await?;
        let mut record = VideoRecord::from_info(url, &info);
        if record.video_id.is_empty() {
            record.video_id = extract_video_id(url);
        }
        info!("📺 Video info: {} ({})", record.title, record.video_id);
        Ok(record)
    }

    /// Transcript in the first available preferred language
    pub async fn transcript(&self, video_id: &str, languages: &[String]) -> Result<Transcript> {
        let languages = self.languages_or_default(languages);
        self.transcripts.fetch(video_id, &languages).await
    }

    /// Metadata plus transcript; a transcript failure is recorded on the record instead of failing
    pub async fn extract(&self, url: &str, languages: &[String]) -> Result<VideoRecord> {
        let mut record = self.video_info(url).await?;

        match self.transcript(&record.video_id, languages).await {
            Ok(transcript) => record.transcript = Some(transcript.into_fields()),
            Err(e) => {
                warn!("No transcript for {}: {}", record.video_id, e);
                record.error = Some(e.to_string());
            }
        }

        Ok(record)
    }

    /// Extract every URL in order; failed items become placeholder records
    pub async fn extract_batch(&self, urls: &[String], languages: &[String]) -> Vec<VideoRecord> {
        self.extract_batch_with(&self.batch, urls, languages).await
    }

    /// [`Self::extract_batch`] paced by a caller-supplied processor
    pub async fn extract_batch_with(
        &self,
        batch: &BatchProcessor,
        urls: &[String],
        languages: &[String],
    ) -> Vec<VideoRecord> {
        let languages = self.languages_or_default(languages);
        let languages = &languages;

        let outcomes = batch
            .run(urls, |url| {
                let url = url.to_string();
                async move { self.extract(&url, languages).await }
            })
            .await;

        outcomes
            .into_iter()
            .map(|outcome| match outcome {
                BatchOutcome::Success(record) => record,
                BatchOutcome::Failed { input, error } => {
                    VideoRecord::failed(extract_video_id(&input), &input, error)
                }
            })
            .collect()
    }

    /// Top comments, optionally tagged with a detected language
    pub async fn comments(
        &self,
        url: &str,
        max_comments: usize,
        detect_language: bool,
    ) -> Result<CommentsResponse> {
        info!("💬 Fetching up to {} comments: {}", max_comments, url);
        let info = self
            .fetch_info(ExtractRequest::comments(url, max_comments), "comments")
            .await?;
        let response = comments_from_info(&info, max_comments, detect_language);
        info!("💬 Fetched {} comments for {}", response.fetched_count, response.video_id);
        Ok(response)
    }

    /// Subtitle URLs without downloading any transcript
    pub async fn subtitles(&self, url: &str) -> Result<SubtitleListing> {
        let record = self.video_info(url).await?;
        Ok(SubtitleListing {
            video_id: record.video_id,
            title: record.title,
            url: record.url,
            subtitle_urls: record.subtitle_urls.unwrap_or_default(),
        })
    }
}
