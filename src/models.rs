//! Video records, transcript cues and subtitle listings returned by the service

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Title given to placeholder records for failed batch items
pub const FAILED_TITLE: &str = "processing failed";

/// A single timed transcript entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptCue {
    pub text: String,
    /// Start time in seconds
    pub start: f64,
    /// Duration in seconds, never negative
    pub duration: f64,
}

impl TranscriptCue {
    pub fn new(text: String, start: f64, end: f64) -> Self {
        Self {
            text,
            start,
            duration: (end - start).max(0.0),
        }
    }

    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Transcript fields of a video record.
///
/// Kept as one optional group on [`VideoRecord`] so the fields are either
/// all present or all absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptFields {
    pub transcript: String,
    pub transcript_language: String,
    pub transcript_language_name: String,
    pub is_generated: bool,
    pub snippet_count: usize,
    pub transcript_list: Vec<TranscriptCue>,
}

/// Subtitle download location for one language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleUrl {
    pub language: String,
    pub ext: String,
    pub url: String,
    /// Whether the track is an automatic caption
    pub automatic: bool,
}

/// Metadata, transcript and subtitle URLs for one video
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub video_id: String,
    pub title: String,
    pub url: String,
    pub description: Option<String>,

    pub view_count: Option<u64>,
    pub like_count: Option<u64>,
    pub comment_count: Option<u64>,

    pub channel: Option<String>,
    pub channel_id: Option<String>,
    pub channel_url: Option<String>,
    pub channel_follower_count: Option<u64>,

    pub upload_date: Option<String>,
    pub duration: Option<u64>,
    pub duration_string: Option<String>,
    pub language: Option<String>,

    pub thumbnail: Option<String>,

    pub tags: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,

    #[serde(flatten)]
    pub transcript: Option<TranscriptFields>,

    pub subtitle_urls: Option<Vec<SubtitleUrl>>,

    pub error: Option<String>,
}

impl VideoRecord {
    /// Map a downloader info record onto a video record
    pub fn from_info(url: &str, info: &Value) -> Self {
        let duration = info
            .get("duration")
            .and_then(Value::as_f64)
            .filter(|d| *d >= 0.0)
            .map(|d| d as u64);
        let subtitle_urls = subtitle_urls(info);

        Self {
            video_id: str_field(info, "id").unwrap_or_default(),
            title: str_field(info, "title").unwrap_or_default(),
            url: url.to_string(),
            description: str_field(info, "description"),
            view_count: u64_field(info, "view_count"),
            like_count: u64_field(info, "like_count"),
            comment_count: u64_field(info, "comment_count"),
            channel: str_field(info, "uploader").or_else(|| str_field(info, "channel")),
            channel_id: str_field(info, "channel_id").or_else(|| str_field(info, "uploader_id")),
            channel_url: str_field(info, "channel_url").or_else(|| str_field(info, "uploader_url")),
            channel_follower_count: u64_field(info, "channel_follower_count"),
            upload_date: str_field(info, "upload_date"),
            duration,
            duration_string: duration.map(format_duration),
            language: str_field(info, "language"),
            thumbnail: str_field(info, "thumbnail"),
            tags: string_list(info, "tags"),
            categories: string_list(info, "categories"),
            transcript: None,
            subtitle_urls: if subtitle_urls.is_empty() {
                None
            } else {
                Some(subtitle_urls)
            },
            error: None,
        }
    }

    /// Placeholder for a batch item that could not be processed
    pub fn failed(video_id: String, url: &str, error: String) -> Self {
        Self {
            video_id,
            title: FAILED_TITLE.to_string(),
            url: url.to_string(),
            error: Some(error),
            ..Default::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Subtitle-only listing for a video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleListing {
    pub video_id: String,
    pub title: String,
    pub url: String,
    pub subtitle_urls: Vec<SubtitleUrl>,
}

/// Format whole seconds as `M:SS`
pub fn format_duration(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Collect subtitle URLs, manual tracks first, then automatic captions.
///
/// Per language a `vtt` entry wins; otherwise the first `json3` or `srv3` entry is used.
pub fn subtitle_urls(info: &Value) -> Vec<SubtitleUrl> {
    let mut urls = Vec::new();
    for (key, automatic) in [("subtitles", false), ("automatic_captions", true)] {
        let Some(tracks) = info.get(key).and_then(Value::as_object) else {
            continue;
        };
        for (language, formats) in tracks {
            let Some(formats) = formats.as_array() else {
                continue;
            };
            let ext_of = |f: &Value| f.get("ext").and_then(Value::as_str).unwrap_or("").to_string();
            let chosen = formats
                .iter()
                .find(|f| ext_of(f) == "vtt")
                .or_else(|| formats.iter().find(|f| matches!(ext_of(f).as_str(), "json3" | "srv3")));

            if let Some(format) = chosen {
                if let Some(url) = format.get("url").and_then(Value::as_str) {
                    urls.push(SubtitleUrl {
                        language: language.clone(),
                        ext: ext_of(format),
                        url: url.to_string(),
                        automatic,
                    });
                }
            }
        }
    }
    urls
}

pub(crate) fn str_field(info: &Value, key: &str) -> Option<String> {
    info.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub(crate) fn u64_field(info: &Value, key: &str) -> Option<u64> {
    let value = info.get(key)?;
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
}

fn string_list(info: &Value, key: &str) -> Option<Vec<String>> {
    info.get(key).and_then(Value::as_array).map(|items| {
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_info() -> Value {
        json!({
            "id": "H5TAW-0X7eQ",
            "title": "Sample video",
            "description": "desc",
            "view_count": 1200,
            "like_count": 35,
            "comment_count": 4,
            "uploader_id": "@channel",
            "channel": "Channel name",
            "channel_url": "https://www.youtube.com/@channel",
            "channel_follower_count": 9000,
            "upload_date": "20240105",
            "duration": 200,
            "thumbnail": "https://i.ytimg.com/vi/H5TAW-0X7eQ/hq.jpg",
            "tags": ["a", "b"],
            "categories": ["Education"],
            "subtitles": {
                "ko": [
                    {"ext": "json3", "url": "https://example.com/ko.json3"},
                    {"ext": "vtt", "url": "https://example.com/ko.vtt"}
                ]
            },
            "automatic_captions": {
                "en": [
                    {"ext": "srv3", "url": "https://example.com/en.srv3"},
                    {"ext": "json3", "url": "https://example.com/en.json3"}
                ],
                "fr": [
                    {"ext": "ttml", "url": "https://example.com/fr.ttml"}
                ]
            }
        })
    }

    #[test]
    fn test_from_info_maps_fields_with_fallbacks() {
        let record = VideoRecord::from_info("https://youtu.be/H5TAW-0X7eQ", &sample_info());

        assert_eq!(record.video_id, "H5TAW-0X7eQ");
        assert_eq!(record.url, "https://youtu.be/H5TAW-0X7eQ");
        assert_eq!(record.channel.as_deref(), Some("Channel name"));
        assert_eq!(record.channel_id.as_deref(), Some("@channel"));
        assert_eq!(record.duration, Some(200));
        assert_eq!(record.duration_string.as_deref(), Some("3:20"));
        assert_eq!(record.tags, Some(vec!["a".to_string(), "b".to_string()]));
        assert!(record.transcript.is_none());
        assert!(record.is_success());
    }

    #[test]
    fn test_subtitle_urls_prefer_vtt() {
        let urls = subtitle_urls(&sample_info());

        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0].language, "ko");
        assert_eq!(urls[0].ext, "vtt");
        assert!(!urls[0].automatic);
        assert_eq!(urls[1].language, "en");
        assert_eq!(urls[1].ext, "srv3");
        assert!(urls[1].automatic);
    }

    #[test]
    fn test_missing_subtitles_are_absent() {
        let record = VideoRecord::from_info("u", &json!({"id": "x", "title": "t"}));
        assert!(record.subtitle_urls.is_none());
        assert!(record.duration_string.is_none());
    }

    #[test]
    fn test_duration_format() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(65), "1:05");
        assert_eq!(format_duration(3600), "60:00");
    }

    #[test]
    fn test_cue_duration_is_clamped() {
        let cue = TranscriptCue::new("x".into(), 5.0, 4.0);
        assert_eq!(cue.duration, 0.0);
        assert_eq!(cue.end(), 5.0);
    }

    #[test]
    fn test_transcript_fields_flatten() {
        let mut record = VideoRecord::failed("id".into(), "u", "boom".into());
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("transcript").is_none());
        assert_eq!(value["title"], FAILED_TITLE);

        record.transcript = Some(TranscriptFields {
            transcript: "hi".into(),
            transcript_language: "ko".into(),
            transcript_language_name: "Korean".into(),
            is_generated: false,
            snippet_count: 1,
            transcript_list: vec![TranscriptCue::new("hi".into(), 0.0, 1.0)],
        });
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["transcript"], "hi");
        assert_eq!(value["snippet_count"], 1);
    }
}
