//! API request handlers

use serde_json::Value;
use tracing::info;

use super::models::{
    query_languages, BatchVideoRequest, CommentRequest, CsvQuery, ExportFile, SubtitleRequest,
    VideoRequest, DEFAULT_MAX_COMMENTS,
};
use super::server::AppState;
use crate::batch::BatchProcessor;
use crate::comments::CommentsResponse;
use crate::error::{ExtractError, Result};
use crate::export::{export_filename, render, CsvLayout, ExportFormat};
use crate::import::read_url_list;
use crate::models::{SubtitleListing, VideoRecord};
use crate::youtube::watch_url;

/// Service description for `GET /`
pub fn root() -> Value {
    serde_json::json!({
        "service": "YouTube Video Extractor API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "features": [
            "video metadata (views, likes, comment count, subscribers)",
            "transcript text with timestamps",
            "subtitle URLs (VTT preferred)",
            "top comments with optional language detection",
            "batch extraction from JSON or CSV upload"
        ],
        "endpoints": {
            "POST /extract": "single video metadata and transcript",
            "POST /transcript": "batch extraction from a URL list",
            "POST /transcript/csv": "batch extraction from an uploaded CSV",
            "POST /transcript/csv-save": "batch extraction from CSV, returned as a JSON or CSV file",
            "POST /comments": "top comments",
            "POST /subtitles": "subtitle URLs only",
            "GET /test/:video_id": "browser shortcut for /extract",
            "GET /test-comments/:video_id": "browser shortcut for /comments"
        }
    })
}

/// Handle health check requests
pub fn health_check() -> Value {
    serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    })
}

fn require_url(url: &str) -> Result<&str> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ExtractError::InvalidInput("video_url must not be empty".to_string()));
    }
    Ok(url)
}

/// Handle single video extraction
pub async fn extract_video(state: &AppState, request: VideoRequest) -> Result<VideoRecord> {
    let url = require_url(&request.video_url)?;
    let languages = request.languages.unwrap_or_default();
    state.extractor.extract(url, &languages).await
}

/// Handle batch extraction from a JSON URL list
pub async fn extract_batch(state: &AppState, request: BatchVideoRequest) -> Result<Vec<VideoRecord>> {
    let max = state.config.server.max_batch_size;
    if request.video_urls.is_empty() {
        return Err(ExtractError::InvalidInput("video_urls must not be empty".to_string()));
    }
    if request.video_urls.len() > max {
        return Err(ExtractError::InvalidInput(format!(
            "at most {} videos per request, got {}",
            max,
            request.video_urls.len()
        )));
    }

    let languages = request.languages.unwrap_or_default();
    Ok(state.extractor.extract_batch(&request.video_urls, &languages).await)
}

fn csv_urls(state: &AppState, csv: &[u8]) -> Result<Vec<String>> {
    let urls = read_url_list(csv)?;
    if urls.is_empty() {
        return Err(ExtractError::InvalidInput(
            "no valid YouTube URL found in the CSV file".to_string(),
        ));
    }

    let max = state.config.server.max_csv_batch_size;
    if urls.len() > max {
        return Err(ExtractError::InvalidInput(format!(
            "at most {} videos per CSV file, got {}",
            max,
            urls.len()
        )));
    }

    info!("📄 CSV upload with {} URLs", urls.len());
    Ok(urls)
}

/// Handle batch extraction from an uploaded CSV
pub async fn extract_csv(state: &AppState, csv: &[u8], query: CsvQuery) -> Result<Vec<VideoRecord>> {
    let urls = csv_urls(state, csv)?;
    let languages = query_languages(query.languages.as_deref());
    let pacing = BatchProcessor::new(state.config.csv_upload_policy());
    Ok(state.extractor.extract_batch_with(&pacing, &urls, &languages).await)
}

/// Handle batch extraction from CSV returned as a downloadable file
pub async fn extract_csv_to_file(state: &AppState, csv: &[u8], query: CsvQuery) -> Result<ExportFile> {
    let format: ExportFormat = query.format.as_deref().unwrap_or("json").parse()?;
    let urls = csv_urls(state, csv)?;
    let languages = query_languages(query.languages.as_deref());

    let records = state.extractor.extract_batch(&urls, &languages).await;
    let bytes = render(
        &records,
        format,
        CsvLayout::Compact,
        state.config.output.csv_preview_chars,
    )?;

    Ok(ExportFile {
        filename: export_filename(format, &chrono::Local::now()),
        content_type: format.content_type(),
        bytes,
    })
}

/// Handle comment extraction
pub async fn comments(state: &AppState, request: CommentRequest) -> Result<CommentsResponse> {
    let url = require_url(&request.video_url)?;
    state
        .extractor
        .comments(url, request.max_comments, request.detect_language)
        .await
}

/// Handle subtitle URL listing
pub async fn subtitles(state: &AppState, request: SubtitleRequest) -> Result<SubtitleListing> {
    let url = require_url(&request.video_url)?;
    state.extractor.subtitles(url).await
}

/// Handle `GET /test/:video_id`
pub async fn test_video(state: &AppState, video_id: &str, languages: Option<&str>) -> Result<VideoRecord> {
    let languages = query_languages(languages);
    state.extractor.extract(&watch_url(video_id), &languages).await
}

/// Handle `GET /test-comments/:video_id`
pub async fn test_comments(
    state: &AppState,
    video_id: &str,
    max_comments: Option<usize>,
) -> Result<CommentsResponse> {
    state
        .extractor
        .comments(
            &watch_url(video_id),
            max_comments.unwrap_or(DEFAULT_MAX_COMMENTS),
            false,
        )
        .await
}
