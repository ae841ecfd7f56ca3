//! Comment records and script-based language detection

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use crate::models::{str_field, u64_field};

/// Coarse writing-system group of a comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguageGroup {
    Korean,
    Japanese,
    Chinese,
    Latin,
    Cyrillic,
    Arabic,
    Thai,
    Devanagari,
    Other,
}

impl LanguageGroup {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Korean => "korean",
            Self::Japanese => "japanese",
            Self::Chinese => "chinese",
            Self::Latin => "latin",
            Self::Cyrillic => "cyrillic",
            Self::Arabic => "arabic",
            Self::Thai => "thai",
            Self::Devanagari => "devanagari",
            Self::Other => "other",
        }
    }

    /// ISO 639-1 code when the script identifies a single language
    pub fn language_code(self) -> Option<&'static str> {
        match self {
            Self::Korean => Some("ko"),
            Self::Japanese => Some("ja"),
            Self::Chinese => Some("zh"),
            Self::Cyrillic => Some("ru"),
            Self::Arabic => Some("ar"),
            Self::Thai => Some("th"),
            Self::Devanagari => Some("hi"),
            Self::Latin | Self::Other => None,
        }
    }
}

fn script_of(c: char) -> Option<LanguageGroup> {
    let group = match c as u32 {
        0xAC00..=0xD7A3 | 0x1100..=0x11FF | 0x3130..=0x318F => LanguageGroup::Korean,
        0x3040..=0x30FF => LanguageGroup::Japanese,
        0x3400..=0x4DBF | 0x4E00..=0x9FFF => LanguageGroup::Chinese,
        0x0400..=0x04FF => LanguageGroup::Cyrillic,
        0x0600..=0x06FF => LanguageGroup::Arabic,
        0x0E00..=0x0E7F => LanguageGroup::Thai,
        0x0900..=0x097F => LanguageGroup::Devanagari,
        _ if c.is_ascii_alphabetic() => LanguageGroup::Latin,
        0x00C0..=0x024F if c.is_alphabetic() => LanguageGroup::Latin,
        _ => return None,
    };
    Some(group)
}

/// Detect the dominant script of a text.
///
/// Han characters count as Japanese when any kana is present.
pub fn detect_language(text: &str) -> (Option<&'static str>, LanguageGroup) {
    let mut counts: HashMap<LanguageGroup, usize> = HashMap::new();
    for group in text.chars().filter_map(script_of) {
        *counts.entry(group).or_default() += 1;
    }

    if counts.contains_key(&LanguageGroup::Japanese) {
        if let Some(han) = counts.remove(&LanguageGroup::Chinese) {
            *counts.entry(LanguageGroup::Japanese).or_default() += han;
        }
    }

    let dominant = counts
        .into_iter()
        .max_by(|(ga, a), (gb, b)| a.cmp(b).then_with(|| gb.cmp(ga)))
        .map(|(group, _)| group)
        .unwrap_or(LanguageGroup::Other);

    (dominant.language_code(), dominant)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: Option<String>,
    pub author: Option<String>,
    pub author_id: Option<String>,
    pub author_thumbnail: Option<String>,
    pub text: String,
    pub like_count: u64,
    pub reply_count: usize,
    pub time_text: Option<String>,
    pub is_pinned: bool,
    pub is_favorited: bool,
    pub author_is_uploader: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_group: Option<LanguageGroup>,
}

impl CommentRecord {
    fn from_value(value: &Value, reply_count: usize) -> Self {
        let flag = |key: &str| value.get(key).and_then(Value::as_bool).unwrap_or(false);
        Self {
            id: str_field(value, "id"),
            author: str_field(value, "author"),
            author_id: str_field(value, "author_id"),
            author_thumbnail: str_field(value, "author_thumbnail"),
            text: value
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            like_count: u64_field(value, "like_count").unwrap_or(0),
            reply_count,
            time_text: str_field(value, "_time_text").or_else(|| str_field(value, "time_text")),
            is_pinned: flag("is_pinned"),
            is_favorited: flag("is_favorited"),
            author_is_uploader: flag("author_is_uploader"),
            language: None,
            language_group: None,
        }
    }
}

/// Comment listing for one video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentsResponse {
    pub video_id: String,
    pub video_title: String,
    pub comment_count: u64,
    pub comments: Vec<CommentRecord>,
    pub fetched_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_summary: Option<BTreeMap<LanguageGroup, usize>>,
}

fn is_top_level(comment: &Value) -> bool {
    match comment.get("parent").and_then(Value::as_str) {
        None => true,
        Some(parent) => parent == "root",
    }
}

/// Build the comment listing from a downloader record fetched in comment mode
pub fn comments_from_info(info: &Value, max_comments: usize, detect_language_enabled: bool) -> CommentsResponse {
    let raw: &[Value] = info
        .get("comments")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut replies: HashMap<&str, usize> = HashMap::new();
    for comment in raw.iter().filter(|c| !is_top_level(c)) {
        if let Some(parent) = comment.get("parent").and_then(Value::as_str) {
            *replies.entry(parent).or_default() += 1;
        }
    }

    let mut comments: Vec<CommentRecord> = raw
        .iter()
        .filter(|c| is_top_level(c))
        .take(max_comments)
        .map(|c| {
            let reply_count = c
                .get("id")
                .and_then(Value::as_str)
                .and_then(|id| replies.get(id).copied())
                .unwrap_or(0);
            CommentRecord::from_value(c, reply_count)
        })
        .collect();

    let language_summary = if detect_language_enabled {
        let mut summary = BTreeMap::new();
        for comment in &mut comments {
            let (code, group) = detect_language(&comment.text);
            comment.language = code.map(str::to_string);
            comment.language_group = Some(group);
            *summary.entry(group).or_insert(0) += 1;
        }
        Some(summary)
    } else {
        None
    };

    CommentsResponse {
        video_id: str_field(info, "id").unwrap_or_default(),
        video_title: str_field(info, "title").unwrap_or_default(),
        comment_count: u64_field(info, "comment_count").unwrap_or(0),
        fetched_count: comments.len(),
        comments,
        language_summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detect_scripts() {
        assert_eq!(detect_language("정말 좋은 영상입니다"), (Some("ko"), LanguageGroup::Korean));
        assert_eq!(detect_language("日本語のコメントです"), (Some("ja"), LanguageGroup::Japanese));
        assert_eq!(detect_language("这是中文评论"), (Some("zh"), LanguageGroup::Chinese));
        assert_eq!(detect_language("Отличное видео"), (Some("ru"), LanguageGroup::Cyrillic));
        assert_eq!(detect_language("Great video!"), (None, LanguageGroup::Latin));
        assert_eq!(detect_language("👍👍 123"), (None, LanguageGroup::Other));
    }

    #[test]
    fn test_mixed_text_uses_dominant_script() {
        assert_eq!(detect_language("API 사용법 설명 감사합니다").1, LanguageGroup::Korean);
        assert_eq!(detect_language("wow 좋아요 this is amazing").1, LanguageGroup::Latin);
    }

    fn info() -> Value {
        json!({
            "id": "vid",
            "title": "Title",
            "comment_count": 10,
            "comments": [
                {"id": "c1", "parent": "root", "author": "@a", "text": "첫 번째 댓글", "like_count": 5, "is_pinned": true},
                {"id": "c1.r1", "parent": "c1", "author": "@b", "text": "reply"},
                {"id": "c1.r2", "parent": "c1", "author": "@c", "text": "reply two"},
                {"id": "c2", "author": "@d", "text": "second comment", "author_is_uploader": true},
                {"id": "c3", "parent": "root", "text": "third"}
            ]
        })
    }

    #[test]
    fn test_top_level_only_with_reply_counts() {
        let response = comments_from_info(&info(), 100, false);

        assert_eq!(response.video_id, "vid");
        assert_eq!(response.comment_count, 10);
        assert_eq!(response.fetched_count, 3);
        assert_eq!(response.comments[0].reply_count, 2);
        assert_eq!(response.comments[0].like_count, 5);
        assert!(response.comments[0].is_pinned);
        assert_eq!(response.comments[1].like_count, 0);
        assert!(response.comments[1].author_is_uploader);
        assert!(response.language_summary.is_none());
        assert!(response.comments[0].language_group.is_none());
    }

    #[test]
    fn test_max_comments_and_language_tally() {
        let response = comments_from_info(&info(), 2, true);

        assert_eq!(response.fetched_count, 2);
        assert_eq!(response.comments[0].language.as_deref(), Some("ko"));
        assert_eq!(response.comments[1].language, None);
        assert_eq!(response.comments[1].language_group, Some(LanguageGroup::Latin));

        let summary = response.language_summary.unwrap();
        assert_eq!(summary.get(&LanguageGroup::Korean), Some(&1));
        assert_eq!(summary.get(&LanguageGroup::Latin), Some(&1));
    }

    #[test]
    fn test_no_comments() {
        let response = comments_from_info(&json!({"id": "x"}), 10, true);
        assert!(response.comments.is_empty());
        assert_eq!(response.language_summary, Some(BTreeMap::new()));
    }
}
