//! API data models

use serde::{Deserialize, Serialize};

use crate::config::parse_language_list;
use crate::error::{ErrorKind, ExtractError};

/// Languages used by the CSV and browser test endpoints when none are given
pub const DEFAULT_QUERY_LANGUAGES: &str = "ko,en";

pub const DEFAULT_MAX_COMMENTS: usize = 100;

fn default_max_comments() -> usize {
    DEFAULT_MAX_COMMENTS
}

/// Body of `POST /extract`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRequest {
    pub video_url: String,
    #[serde(default)]
    pub languages: Option<Vec<String>>,
}

/// Body of `POST /transcript`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchVideoRequest {
    pub video_urls: Vec<String>,
    #[serde(default)]
    pub languages: Option<Vec<String>>,
}

/// Body of `POST /comments`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRequest {
    pub video_url: String,
    #[serde(default = "default_max_comments")]
    pub max_comments: usize,
    #[serde(default)]
    pub detect_language: bool,
}

/// Body of `POST /subtitles`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitleRequest {
    pub video_url: String,
}

/// Query of the CSV upload endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CsvQuery {
    pub languages: Option<String>,
    pub format: Option<String>,
}

/// Query of `GET /test/:video_id`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LanguageQuery {
    pub languages: Option<String>,
}

/// Query of `GET /test-comments/:video_id`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentQuery {
    pub max_comments: Option<usize>,
}

/// Language list from a comma-separated query value
pub fn query_languages(value: Option<&str>) -> Vec<String> {
    let languages = parse_language_list(value.unwrap_or(DEFAULT_QUERY_LANGUAGES));
    if languages.is_empty() {
        parse_language_list(DEFAULT_QUERY_LANGUAGES)
    } else {
        languages
    }
}

/// JSON error body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: ErrorKind,
}

impl From<&ExtractError> for ErrorResponse {
    fn from(error: &ExtractError) -> Self {
        Self {
            error: error.to_string(),
            kind: error.kind(),
        }
    }
}

/// Rendered export ready to send as an attachment
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_request_defaults() {
        let request: CommentRequest = serde_json::from_str(r#"{"video_url": "u"}"#).unwrap();
        assert_eq!(request.max_comments, 100);
        assert!(!request.detect_language);
    }

    #[test]
    fn test_query_languages() {
        assert_eq!(query_languages(None), vec!["ko", "en"]);
        assert_eq!(query_languages(Some("ja, en")), vec!["ja", "en"]);
        assert_eq!(query_languages(Some(" ,")), vec!["ko", "en"]);
    }
}
