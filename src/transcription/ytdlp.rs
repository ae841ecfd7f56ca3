use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::{SubtitleFetcher, Transcript, TranscriptBackend};
use crate::config::Config;
use crate::error::{ExtractError, Result};
use crate::retry::{retry, RetryPolicy};
use crate::youtube::{watch_url, ExtractRequest, VideoDownloader};

/// Transcript backend that asks the downloader for subtitle tracks and fetches the VTT itself
pub struct YtDlpSubtitleBackend {
    downloader: Arc<dyn VideoDownloader>,
    fetcher: Arc<SubtitleFetcher>,
    retry: RetryPolicy,
    manual_delay: Duration,
    automatic_delay: Duration,
}

impl YtDlpSubtitleBackend {
    pub fn new(downloader: Arc<dyn VideoDownloader>, fetcher: Arc<SubtitleFetcher>, config: &Config) -> Self {
        Self {
            downloader,
            fetcher,
            retry: config.retry_policy(),
            manual_delay: Duration::from_millis(config.transcript.manual_delay_ms),
            automatic_delay: Duration::from_millis(config.transcript.automatic_delay_ms),
        }
    }
}

/// A VTT track found in a downloader record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VttTrack {
    pub language: String,
    pub url: String,
    pub automatic: bool,
}

/// VTT tracks in preference order: per requested language, manual subtitles then automatic captions
pub fn vtt_candidates(info: &Value, languages: &[String]) -> Vec<VttTrack> {
    let mut tracks = Vec::new();
    for language in languages {
        for (key, automatic) in [("subtitles", false), ("automatic_captions", true)] {
            let entries = info
                .get(key)
                .and_then(|s| s.get(language))
                .and_then(Value::as_array);
            let Some(entries) = entries else {
                continue;
            };
            for entry in entries {
                let is_vtt = entry
                    .get("ext")
                    .and_then(Value::as_str)
                    .is_some_and(|ext| ext.contains("vtt"));
                if let (true, Some(url)) = (is_vtt, entry.get("url").and_then(Value::as_str)) {
                    tracks.push(VttTrack {
                        language: language.clone(),
                        url: url.to_string(),
                        automatic,
                    });
                }
            }
        }
    }
    tracks
}

fn available_languages(info: &Value) -> BTreeSet<String> {
    ["subtitles", "automatic_captions"]
        .iter()
        .filter_map(|key| info.get(*key).and_then(Value::as_object))
        .flat_map(|map| map.keys().cloned())
        .collect()
}

#[async_trait]
impl TranscriptBackend for YtDlpSubtitleBackend {
    fn name(&self) -> &str {
        "ytdlp"
    }

    async fn fetch(&self, video_id: &str, languages: &[String]) -> Result<Transcript> {
        let request = ExtractRequest::subtitles(watch_url(video_id), languages.to_vec());
        let info = retry(
            &self.retry,
            "subtitle listing",
            self.downloader.cookies_configured(),
            |_| self.downloader.extract(&request),
        )
        .await?;

        let available = available_languages(&info);
        info!(
            "Available subtitles for {}: {}",
            video_id,
            available.iter().cloned().collect::<Vec<_>>().join(", ")
        );

        for track in vtt_candidates(&info, languages) {
            let delay = if track.automatic { self.automatic_delay } else { self.manual_delay };
            tokio::time::sleep(delay).await;

            match self.fetcher.fetch_vtt(&track.url).await {
                Ok(parsed) => {
                    return Ok(Transcript::from_parsed(
                        parsed,
                        track.language.clone(),
                        track.language,
                        track.automatic,
                    ))
                }
                Err(e) => warn!(
                    "Subtitle download failed for {} ({}): {}",
                    video_id, track.language, e
                ),
            }
        }

        Err(ExtractError::NoTranscript(format!(
            "no usable VTT subtitle in {:?} for {}",
            languages, video_id
        )))
    }
}
