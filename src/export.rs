//! JSON and CSV export of extraction results

use chrono::{DateTime, TimeZone};
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use crate::error::{ExtractError, Result};
use crate::models::VideoRecord;

/// UTF-8 byte order mark so spreadsheet tools detect the encoding
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Csv => "text/csv; charset=utf-8",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(ExtractError::InvalidInput(format!(
                "unsupported export format {:?}, expected json or csv",
                other
            ))),
        }
    }
}

/// Column set of a CSV export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvLayout {
    /// Transcript truncated to the preview length
    Compact,
    /// Preview plus full transcript and error columns
    Full,
}

impl CsvLayout {
    pub fn headers(self) -> &'static [&'static str] {
        match self {
            Self::Compact => &[
                "video_id", "title", "url", "view_count", "like_count", "comment_count",
                "channel", "channel_follower_count", "upload_date", "duration_string",
                "transcript", "transcript_language", "transcript_snippet_count",
            ],
            Self::Full => &[
                "video_id", "title", "url", "view_count", "like_count", "comment_count",
                "channel", "channel_follower_count", "upload_date", "duration_string",
                "transcript_preview", "transcript_language", "transcript_snippet_count",
                "transcript_full", "error",
            ],
        }
    }
}

fn cell<T: Display>(value: &Option<T>) -> String {
    value.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn csv_row(record: &VideoRecord, layout: CsvLayout, preview_chars: usize) -> Vec<String> {
    let transcript = record.transcript.as_ref();
    let full_text = transcript.map(|t| t.transcript.as_str()).unwrap_or("");

    let mut row = vec![
        record.video_id.clone(),
        record.title.clone(),
        record.url.clone(),
        cell(&record.view_count),
        cell(&record.like_count),
        cell(&record.comment_count),
        cell(&record.channel),
        cell(&record.channel_follower_count),
        cell(&record.upload_date),
        cell(&record.duration_string),
        preview(full_text, preview_chars),
        transcript.map(|t| t.transcript_language.clone()).unwrap_or_default(),
        transcript.map(|t| t.snippet_count.to_string()).unwrap_or_default(),
    ];

    if layout == CsvLayout::Full {
        row.push(full_text.to_string());
        row.push(cell(&record.error));
    }
    row
}

/// Pretty-printed JSON array of records
pub fn to_json(records: &[VideoRecord]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(records)?)
}

/// CSV document with a leading byte order mark
pub fn to_csv(records: &[VideoRecord], layout: CsvLayout, preview_chars: usize) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(UTF8_BOM.to_vec());
    writer.write_record(layout.headers())?;
    for record in records {
        writer.write_record(csv_row(record, layout, preview_chars))?;
    }
    writer.into_inner().map_err(|e| ExtractError::Io(e.into_error()))
}

pub fn render(
    records: &[VideoRecord],
    format: ExportFormat,
    layout: CsvLayout,
    preview_chars: usize,
) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Json => to_json(records),
        ExportFormat::Csv => to_csv(records, layout, preview_chars),
    }
}

/// Download name like `youtube_extract_20240105_143000.csv`
pub fn export_filename<Tz: TimeZone>(format: ExportFormat, at: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    format!(
        "youtube_extract_{}.{}",
        at.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

/// Write records to a file
pub fn write_export(
    path: &Path,
    records: &[VideoRecord],
    format: ExportFormat,
    layout: CsvLayout,
    preview_chars: usize,
) -> Result<()> {
    let bytes = render(records, format, layout, preview_chars)?;
    std::fs::write(path, bytes)?;
    info!("💾 Saved {} records to {}", records.len(), path.display());
    Ok(())
}
