//! YouTube URL handling and the video downloader capability

pub mod ytdlp;

pub use ytdlp::{ExtractMode, ExtractRequest, VideoDownloader, YtDlpClient};

use url::Url;

/// Length of a YouTube video id
pub const VIDEO_ID_LEN: usize = 11;

pub fn is_youtube_host(host: &str) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    host == "youtube.com" || host == "youtu.be" || host.ends_with(".youtube.com")
}

fn video_id_from_url(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    if !is_youtube_host(host) {
        return None;
    }

    if host.eq_ignore_ascii_case("youtu.be") {
        return url
            .path_segments()?
            .next()
            .filter(|id| !id.is_empty())
            .map(str::to_string);
    }

    if let Some((_, id)) = url.query_pairs().find(|(key, _)| key == "v") {
        if !id.is_empty() {
            return Some(id.into_owned());
        }
    }

    let mut segments = url.path_segments()?;
    match segments.next() {
        Some("shorts" | "embed" | "live" | "v") => segments
            .next()
            .filter(|id| !id.is_empty())
            .map(str::to_string),
        _ => None,
    }
}

/// Extract the video id from a YouTube URL.
///
/// Input that is not a recognizable YouTube URL is returned trimmed, so bare ids pass through.
pub fn extract_video_id(input: &str) -> String {
    let input = input.trim();
    Url::parse(input)
        .ok()
        .and_then(|url| video_id_from_url(&url))
        .unwrap_or_else(|| input.to_string())
}

/// Canonical watch URL for a video id
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// True when the string has the shape of a bare video id
pub fn looks_like_video_id(value: &str) -> bool {
    value.chars().count() == VIDEO_ID_LEN
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Turn user input into a fetchable URL: YouTube links pass through, bare ids become watch URLs
pub fn normalize_input(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if input.contains("youtube.com") || input.contains("youtu.be") {
        return Some(input.to_string());
    }
    if looks_like_video_id(input) {
        return Some(watch_url(input));
    }
    None
}
