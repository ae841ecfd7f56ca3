mod common;

use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

use common::{fake_extractor, FakeDownloader, BOT_BLOCKED_ID, NO_TRANSCRIPT_ID, UNAVAILABLE_ID};
use youtube_extractor::export::{write_export, CsvLayout, ExportFormat, UTF8_BOM};
use youtube_extractor::import::read_url_file;
use youtube_extractor::models::FAILED_TITLE;
use youtube_extractor::youtube::watch_url;
use youtube_extractor::{ErrorKind, ExtractError, LanguageGroup, VideoRecord};

fn langs(codes: &[&str]) -> Vec<String> {
    codes.iter().map(|c| c.to_string()).collect()
}

#[tokio::test]
async fn test_extract_combines_metadata_and_transcript() {
    let extractor = fake_extractor(Arc::new(FakeDownloader::default()));

    let record = assert_ok!(extractor.extract(&watch_url("dQw4w9WgXcQ"), &langs(&["en"])).await);

    assert_eq!(record.video_id, "dQw4w9WgXcQ");
    assert_eq!(record.title, "Video dQw4w9WgXcQ");
    assert_eq!(record.view_count, Some(1200));
    assert_eq!(record.channel.as_deref(), Some("Test Channel"));
    assert_eq!(record.duration_string.as_deref(), Some("2:05"));
    assert!(record.is_success());

    let transcript = record.transcript.expect("transcript fields");
    assert_eq!(transcript.transcript, "안녕하세요 반갑습니다");
    assert_eq!(transcript.transcript_language, "en");
    assert_eq!(transcript.snippet_count, 2);
    assert_eq!(transcript.transcript_list[1].start, 2.5);
    assert_eq!(transcript.transcript_list[1].duration, 1.5);

    let subtitles = record.subtitle_urls.expect("subtitle urls");
    assert_eq!(subtitles.len(), 2);
    assert_eq!(subtitles[0].language, "ko");
    assert_eq!(subtitles[0].ext, "vtt");
    assert!(!subtitles[0].automatic);
    assert!(subtitles[1].automatic);
}

#[tokio::test]
async fn test_extract_records_missing_transcript() {
    let extractor = fake_extractor(Arc::new(FakeDownloader::default()));

    let record = assert_ok!(extractor.extract(&watch_url(NO_TRANSCRIPT_ID), &[]).await);

    assert_eq!(record.title, format!("Video {}", NO_TRANSCRIPT_ID));
    assert!(record.transcript.is_none());
    assert!(!record.is_success());
    assert!(record.error.unwrap_or_default().contains("no captions"));

    // transcript fields are omitted entirely from the JSON shape
    let json = serde_json::to_value(
        assert_ok!(extractor.extract(&watch_url(NO_TRANSCRIPT_ID), &[]).await),
    )
    .unwrap();
    assert!(json.get("transcript").is_none());
    assert!(json.get("snippet_count").is_none());
}

#[tokio::test]
async fn test_unavailable_video_is_not_retried() {
    let downloader = Arc::new(FakeDownloader::default());
    let extractor = fake_extractor(downloader.clone());

    let error = assert_err!(extractor.video_info(&watch_url(UNAVAILABLE_ID)).await);

    assert!(matches!(error, ExtractError::VideoUnavailable(_)));
    assert_eq!(error.kind(), ErrorKind::UpstreamUnavailable);
    assert_eq!(downloader.calls(), 1);
}

#[tokio::test]
async fn test_bot_detection_exhausts_retries() {
    let downloader = Arc::new(FakeDownloader {
        cookies: true,
        ..Default::default()
    });
    let extractor = fake_extractor(downloader.clone());

    let error = assert_err!(extractor.video_info(&watch_url(BOT_BLOCKED_ID)).await);

    match &error {
        ExtractError::AccessBlocked {
            attempts,
            cookies_configured,
        } => {
            assert_eq!(*attempts, 3);
            assert!(*cookies_configured);
        }
        other => panic!("expected AccessBlocked, got {:?}", other),
    }
    assert_eq!(downloader.calls(), 3);
    assert!(error.to_string().contains("cookie file was still rejected"));
}

#[tokio::test]
async fn test_batch_keeps_order_and_placeholders() {
    let extractor = fake_extractor(Arc::new(FakeDownloader::default()));
    let urls = vec![
        watch_url("aaaaaaaaaaa"),
        watch_url(UNAVAILABLE_ID),
        "https://youtu.be/bbbbbbbbbbb".to_string(),
    ];

    let records = extractor.extract_batch(&urls, &[]).await;

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].video_id, "aaaaaaaaaaa");
    assert!(records[0].is_success());

    assert_eq!(records[1].video_id, UNAVAILABLE_ID);
    assert_eq!(records[1].title, FAILED_TITLE);
    assert_eq!(records[1].url, urls[1]);
    assert!(records[1].error.as_deref().unwrap_or("").contains("Video unavailable"));

    assert_eq!(records[2].video_id, "bbbbbbbbbbb");
    assert_eq!(
        records[2].transcript.as_ref().map(|t| t.transcript_language.as_str()),
        Some("ko")
    );
}

#[tokio::test]
async fn test_comments_with_language_detection() {
    let extractor = fake_extractor(Arc::new(FakeDownloader::default()));

    let response = assert_ok!(extractor.comments(&watch_url("ccccccccccc"), 10, true).await);

    assert_eq!(response.video_id, "ccccccccccc");
    assert_eq!(response.comment_count, 3);
    assert_eq!(response.fetched_count, 2);
    assert_eq!(response.comments[0].reply_count, 1);
    assert_eq!(response.comments[0].time_text.as_deref(), Some("1 day ago"));
    assert!(response.comments[1].is_pinned);

    let summary = response.language_summary.expect("summary");
    assert_eq!(summary.get(&LanguageGroup::Korean), Some(&1));
    assert_eq!(summary.get(&LanguageGroup::Latin), Some(&1));
}

#[tokio::test]
async fn test_subtitle_listing() {
    let extractor = fake_extractor(Arc::new(FakeDownloader::default()));

    let listing = assert_ok!(extractor.subtitles("https://youtu.be/ddddddddddd").await);

    assert_eq!(listing.video_id, "ddddddddddd");
    assert_eq!(listing.subtitle_urls.len(), 2);
    assert_eq!(listing.subtitle_urls[1].ext, "srv3");
}

#[tokio::test]
async fn test_csv_file_to_export_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("urls.csv");
    std::fs::write(
        &input,
        "url,note\nhttps://www.youtube.com/watch?v=eeeeeeeeeee,first\nfffffffffff,bare id\nnot a url,skip\n",
    )
    .unwrap();

    let urls = assert_ok!(read_url_file(&input));
    assert_eq!(urls.len(), 2);
    assert_eq!(urls[1], watch_url("fffffffffff"));

    let extractor = fake_extractor(Arc::new(FakeDownloader::default()));
    let records = extractor.extract_batch(&urls, &[]).await;

    let json_path = dir.path().join("out.json");
    assert_ok!(write_export(&json_path, &records, ExportFormat::Json, CsvLayout::Full, 500));
    let parsed: Vec<VideoRecord> =
        serde_json::from_slice(&std::fs::read(&json_path).unwrap()).unwrap();
    assert_eq!(parsed, records);

    let csv_path = dir.path().join("out.csv");
    assert_ok!(write_export(&csv_path, &records, ExportFormat::Csv, CsvLayout::Full, 5));
    let bytes = std::fs::read(&csv_path).unwrap();
    assert!(bytes.starts_with(UTF8_BOM));

    let mut reader = csv::Reader::from_reader(&bytes[UTF8_BOM.len()..]);
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.len(), CsvLayout::Full.headers().len());
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][0], "eeeeeeeeeee");
}
