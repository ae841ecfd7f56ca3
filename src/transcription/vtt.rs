//! WebVTT cue parsing
//!
//! Turns raw WebVTT text into timed [`TranscriptCue`]s. Parsing is lazy: [`VttDocument::cues`]
//! returns a fresh iterator over the borrowed text each time it is called.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::iter::Peekable;
use std::str::Lines;
use std::sync::LazyLock;
use tracing::warn;

use crate::models::TranscriptCue;

const ARROW: &str = "-->";

static INLINE_TIMESTAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\d+:\d+:\d+\.\d+>").expect("valid inline timestamp pattern"));
static CLASS_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?c[^>]*>").expect("valid class tag pattern"));
static ANY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid tag pattern"));

/// Borrowed WebVTT text
#[derive(Debug, Clone, Copy)]
pub struct VttDocument<'a> {
    source: &'a str,
}

impl<'a> VttDocument<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source }
    }

    /// Iterate cues from the start of the document
    pub fn cues(&self) -> VttCues<'a> {
        VttCues {
            lines: self.source.lines().peekable(),
        }
    }

    /// Parse every cue eagerly
    pub fn parse(&self) -> ParsedTranscript {
        ParsedTranscript::from_cues(self.cues().collect())
    }
}

/// Iterator over the cues of a [`VttDocument`]
pub struct VttCues<'a> {
    lines: Peekable<Lines<'a>>,
}

impl Iterator for VttCues<'_> {
    type Item = TranscriptCue;

    fn next(&mut self) -> Option<TranscriptCue> {
        loop {
            let line = self.lines.next()?.trim();
            if !line.contains(ARROW) {
                continue;
            }

            let timing = parse_timing_line(line);
            let text = self.take_cue_text();

            let Some((start, end)) = timing else {
                warn!("Skipping cue with malformed timing line: {}", line);
                continue;
            };
            if text.is_empty() {
                continue;
            }
            return Some(TranscriptCue::new(text, start, end));
        }
    }
}

impl VttCues<'_> {
    /// Consume the text lines following a timing line
    fn take_cue_text(&mut self) -> String {
        let mut parts: Vec<String> = Vec::new();
        while let Some(next) = self.lines.peek() {
            let next = next.trim();
            if next.is_empty() || next.contains(ARROW) {
                break;
            }
            let cleaned = strip_tags(next);
            if !cleaned.is_empty() {
                parts.push(cleaned);
            }
            self.lines.next();
        }
        parts.join(" ")
    }
}

/// Cues plus the joined transcript text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedTranscript {
    pub cues: Vec<TranscriptCue>,
    pub text: String,
    pub cue_count: usize,
}

impl ParsedTranscript {
    pub fn from_cues(cues: Vec<TranscriptCue>) -> Self {
        let text = cues
            .iter()
            .map(|cue| cue.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            cue_count: cues.len(),
            cues,
            text,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }
}

/// Parse WebVTT text into cues and joined text
pub fn parse_vtt(source: &str) -> ParsedTranscript {
    VttDocument::new(source).parse()
}

/// Split a timing line and parse both bounds, ignoring cue settings after each timestamp
fn parse_timing_line(line: &str) -> Option<(f64, f64)> {
    let (left, right) = line.split_once(ARROW)?;
    let start = parse_timestamp(left.split_whitespace().next()?)?;
    let end = parse_timestamp(right.split_whitespace().next()?)?;
    Some((start, end))
}

/// Parse `H:MM:SS.mmm` (or `MM:SS.mmm`) into seconds
///
/// Minutes and seconds must stay below 60 and seconds may only hold digits and one decimal point.
pub fn parse_timestamp(timestamp: &str) -> Option<f64> {
    let parts: Vec<&str> = timestamp.trim().split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [h, m, s] => (h.parse::<u64>().ok()?, m.parse::<u64>().ok()?, *s),
        [m, s] => (0, m.parse::<u64>().ok()?, *s),
        _ => return None,
    };
    if minutes >= 60 {
        return None;
    }

    let plain_decimal = !seconds.is_empty()
        && seconds.chars().all(|c| c.is_ascii_digit() || c == '.')
        && seconds.matches('.').count() <= 1;
    if !plain_decimal {
        return None;
    }
    let seconds: f64 = seconds.parse().ok()?;
    if seconds >= 60.0 {
        return None;
    }

    let whole = hours.checked_mul(3600)?.checked_add(minutes * 60)?;
    Some(whole as f64 + seconds)
}

/// Remove inline timestamps, class spans and any other markup from a cue line
pub fn strip_tags(text: &str) -> String {
    let text = INLINE_TIMESTAMP.replace_all(text, "");
    let text = CLASS_TAG.replace_all(&text, "");
    let text = ANY_TAG.replace_all(&text, "");
    decode_entities(text.trim())
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
