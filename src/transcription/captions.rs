//! Caption tracks through YouTube's InnerTube player endpoint

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info};
use url::Url;

use super::{SubtitleFetcher, Transcript, TranscriptBackend};
use crate::error::{ExtractError, Result};
use crate::youtube::watch_url;

const PLAYER_ENDPOINT: &str = "https://www.youtube.com/youtubei/v1/player";
const ANDROID_CLIENT_VERSION: &str = "20.10.38";

static API_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""INNERTUBE_API_KEY"\s*:\s*"([a-zA-Z0-9_-]+)""#).expect("valid api key pattern")
});

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    playability_status: Option<PlayabilityStatus>,
    captions: Option<Captions>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: Option<String>,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Captions {
    player_captions_tracklist_renderer: Option<TracklistRenderer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TracklistRenderer {
    #[serde(default)]
    caption_tracks: Vec<RawTrack>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTrack {
    base_url: String,
    language_code: String,
    name: Option<TrackName>,
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackName {
    simple_text: Option<String>,
    #[serde(default)]
    runs: Vec<TextRun>,
}

#[derive(Debug, Deserialize)]
struct TextRun {
    text: String,
}

/// One caption track listed by the player
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionTrack {
    pub language_code: String,
    pub language_name: String,
    pub base_url: String,
    pub is_generated: bool,
}

/// Transcript backend reading YouTube's own caption tracks
pub struct CaptionTrackBackend {
    fetcher: Arc<SubtitleFetcher>,
}

impl CaptionTrackBackend {
    pub fn new(fetcher: Arc<SubtitleFetcher>) -> Self {
        Self { fetcher }
    }

    /// List the caption tracks available for a video
    pub async fn list_tracks(&self, video_id: &str) -> Result<Vec<CaptionTrack>> {
        let html = self.fetcher.fetch_text(&watch_url(video_id)).await?;
        let api_key = extract_api_key(&html)?;
        debug!("Extracted InnerTube API key for {}", video_id);

        let body = serde_json::json!({
            "context": {
                "client": {
                    "clientName": "ANDROID",
                    "clientVersion": ANDROID_CLIENT_VERSION
                }
            },
            "videoId": video_id
        });

        let response = self
            .fetcher
            .client()
            .post(PLAYER_ENDPOINT)
            .query(&[("key", api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::http_status(
                status.as_u16(),
                format!("player request returned {}", status),
            ));
        }

        let player: PlayerResponse = response.json().await?;
        caption_tracks(video_id, player)
    }
}

#[async_trait]
impl TranscriptBackend for CaptionTrackBackend {
    fn name(&self) -> &str {
        "captions"
    }

    async fn fetch(&self, video_id: &str, languages: &[String]) -> Result<Transcript> {
        let tracks = self.list_tracks(video_id).await?;
        let track = select_track(&tracks, languages).ok_or_else(|| {
            let available: Vec<&str> = tracks.iter().map(|t| t.language_code.as_str()).collect();
            ExtractError::NoTranscript(format!(
                "no caption track in {:?} for {} (available: {:?})",
                languages, video_id, available
            ))
        })?;

        info!(
            "🎞️ Caption track {} ({}) for {}",
            track.language_code,
            if track.is_generated { "generated" } else { "manual" },
            video_id
        );

        let parsed = self.fetcher.fetch_vtt(&vtt_url(&track.base_url)?).await?;
        Ok(Transcript::from_parsed(
            parsed,
            track.language_code.clone(),
            track.language_name.clone(),
            track.is_generated,
        ))
    }
}

/// Pull the InnerTube API key out of a watch page
pub fn extract_api_key(html: &str) -> Result<String> {
    if let Some(caps) = API_KEY.captures(html) {
        return Ok(caps[1].to_string());
    }
    if html.contains("class=\"g-recaptcha\"") {
        return Err(ExtractError::upstream(
            "YouTube is asking to confirm you're not a bot (captcha page)",
        ));
    }
    Err(ExtractError::upstream(
        "Failed to extract InnerTube API key from watch page",
    ))
}

fn caption_tracks(video_id: &str, player: PlayerResponse) -> Result<Vec<CaptionTrack>> {
    if let Some(playability) = player.playability_status {
        let reason = playability.reason.unwrap_or_default();
        match playability.status.as_deref() {
            Some("OK") | None => {}
            Some("LOGIN_REQUIRED") => {
                return Err(ExtractError::upstream(format!(
                    "Sign in required by YouTube for {}: {}",
                    video_id, reason
                )))
            }
            Some(status) => {
                return Err(ExtractError::VideoUnavailable(format!(
                    "{} ({}): {}",
                    video_id, status, reason
                )))
            }
        }
    }

    let tracks: Vec<CaptionTrack> = player
        .captions
        .and_then(|c| c.player_captions_tracklist_renderer)
        .map(|r| r.caption_tracks)
        .unwrap_or_default()
        .into_iter()
        .map(|raw| CaptionTrack {
            language_name: raw
                .name
                .and_then(|n| n.simple_text.or_else(|| n.runs.into_iter().next().map(|r| r.text)))
                .unwrap_or_else(|| raw.language_code.clone()),
            is_generated: raw.kind.as_deref() == Some("asr"),
            language_code: raw.language_code,
            base_url: raw.base_url,
        })
        .collect();

    if tracks.is_empty() {
        return Err(ExtractError::NoTranscript(format!(
            "captions are disabled for {}",
            video_id
        )));
    }
    Ok(tracks)
}

/// Walk the preference list; per language a manual track beats a generated one
pub fn select_track<'a>(tracks: &'a [CaptionTrack], languages: &[String]) -> Option<&'a CaptionTrack> {
    languages.iter().find_map(|language| {
        let mut candidates = tracks.iter().filter(|t| &t.language_code == language);
        let first = candidates.next()?;
        if !first.is_generated {
            return Some(first);
        }
        candidates.find(|t| !t.is_generated).or(Some(first))
    })
}

/// Rewrite a track URL to request WebVTT
pub fn vtt_url(base_url: &str) -> Result<String> {
    let mut url = Url::parse(base_url)
        .map_err(|e| ExtractError::Parse(format!("invalid caption URL {}: {}", base_url, e)))?;
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "fmt")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(pairs)
        .append_pair("fmt", "vtt");
    Ok(url.to_string())
}
