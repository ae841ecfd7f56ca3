//! Fake backends shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use youtube_extractor::error::{ExtractError, Result};
use youtube_extractor::transcription::Transcript;
use youtube_extractor::youtube::extract_video_id;
use youtube_extractor::{
    BatchProcessor, ExtractMode, ExtractRequest, ParsedTranscript, RateLimitPolicy, RetryPolicy,
    TranscriptBackend, TranscriptCue, TranscriptStrategy, VideoDownloader, VideoExtractor,
};

/// Video ids with scripted downloader behaviour
pub const UNAVAILABLE_ID: &str = "unavailable";
pub const BOT_BLOCKED_ID: &str = "botblocked1";
pub const NO_TRANSCRIPT_ID: &str = "nocaptions1";

/// Downloader that answers from canned info records
#[derive(Default)]
pub struct FakeDownloader {
    pub calls: AtomicUsize,
    pub cookies: bool,
}

impl FakeDownloader {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn info_record(video_id: &str) -> Value {
    json!({
        "id": video_id,
        "title": format!("Video {}", video_id),
        "description": "A test video",
        "view_count": 1200,
        "like_count": 34,
        "comment_count": 3,
        "uploader": "Test Channel",
        "channel_id": "UC123",
        "channel_url": "https://www.youtube.com/channel/UC123",
        "channel_follower_count": 5000,
        "upload_date": "20240115",
        "duration": 125,
        "language": "ko",
        "thumbnail": "https://i.ytimg.com/vi/x/hq.jpg",
        "tags": ["rust", "test"],
        "categories": ["Education"],
        "subtitles": {
            "ko": [
                {"ext": "json3", "url": "https://example.test/ko.json3"},
                {"ext": "vtt", "url": "https://example.test/ko.vtt"}
            ]
        },
        "automatic_captions": {
            "en": [{"ext": "srv3", "url": "https://example.test/en.srv3"}]
        },
        "comments": [
            {"id": "c1", "parent": "root", "author": "@kim", "text": "정말 좋은 영상입니다", "like_count": 10, "_time_text": "1 day ago"},
            {"id": "c2", "parent": "root", "author": "@sam", "text": "Great video!", "like_count": 3, "is_pinned": true},
            {"id": "r1", "parent": "c1", "author": "@lee", "text": "동의합니다"}
        ]
    })
}

#[async_trait]
impl VideoDownloader for FakeDownloader {
    async fn extract(&self, request: &ExtractRequest) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let video_id = extract_video_id(&request.url);

        match video_id.as_str() {
            UNAVAILABLE_ID => Err(ExtractError::upstream(
                "ERROR: [youtube] unavailable: Video unavailable",
            )),
            BOT_BLOCKED_ID => Err(ExtractError::upstream(
                "ERROR: [youtube] botblocked1: Sign in to confirm you're not a bot",
            )),
            _ => {
                let mut info = info_record(&video_id);
                if !matches!(request.mode, ExtractMode::Comments { .. }) {
                    if let Some(map) = info.as_object_mut() {
                        map.remove("comments");
                    }
                }
                Ok(info)
            }
        }
    }

    fn cookies_configured(&self) -> bool {
        self.cookies
    }
}

/// Transcript backend that returns a fixed two-cue transcript
pub struct FakeTranscripts {
    pub name: &'static str,
    pub calls: AtomicUsize,
}

impl FakeTranscripts {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TranscriptBackend for FakeTranscripts {
    fn name(&self) -> &str {
        self.name
    }

    async fn fetch(&self, video_id: &str, languages: &[String]) -> Result<Transcript> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if video_id == NO_TRANSCRIPT_ID {
            return Err(ExtractError::NoTranscript(format!("no captions for {}", video_id)));
        }

        let language = languages.first().cloned().unwrap_or_else(|| "ko".to_string());
        let parsed = ParsedTranscript::from_cues(vec![
            TranscriptCue::new("안녕하세요".to_string(), 0.0, 2.5),
            TranscriptCue::new("반갑습니다".to_string(), 2.5, 4.0),
        ]);
        Ok(Transcript::from_parsed(parsed, language.clone(), language, false))
    }
}

pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
    }
}

/// Extractor over the fakes with no pacing between batch items
pub fn fake_extractor(downloader: Arc<FakeDownloader>) -> VideoExtractor {
    let backends: Vec<Arc<dyn TranscriptBackend>> = vec![Arc::new(FakeTranscripts::new("fake"))];
    VideoExtractor::new(
        downloader,
        TranscriptStrategy::new(backends),
        fast_retry(),
        BatchProcessor::new(RateLimitPolicy::none()),
        vec!["ko".to_string()],
    )
}
