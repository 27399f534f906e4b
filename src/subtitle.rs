//! SRT subtitle codec.
//!
//! Reads and writes the SubRip text format while preserving entry order,
//! indices and timing.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SubfluxError};

/// A single subtitle cue, times in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleEntry {
    pub index: u32,
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

impl SubtitleEntry {
    pub fn new(index: u32, start_ms: u64, end_ms: u64, text: impl Into<String>) -> Self {
        Self {
            index,
            start_ms,
            end_ms,
            text: text.into(),
        }
    }

    /// Copy of this entry with different caption text
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..self.clone()
        }
    }
}

/// Parse SRT text into entries.
///
/// Accepts a leading BOM, CRLF line endings, runs of blank lines and `.` as
/// millisecond separator. Fails on the first malformed block, or when timing
/// or index ordering is violated.
pub fn parse_srt(input: &str) -> Result<Vec<SubtitleEntry>> {
    let normalized = input.trim_start_matches('\u{feff}').replace("\r\n", "\n").replace('\r', "\n");
    let mut entries: Vec<SubtitleEntry> = Vec::new();
    let mut lines = normalized.lines().peekable();
    let mut block = 0usize;

    loop {
        let index_line = match lines.next() {
            Some(l) if !l.trim().is_empty() => l.trim(),
            Some(_) => continue,
            None => break,
        };
        block += 1;

        let index: u32 = index_line.parse().map_err(|_| {
            SubfluxError::Parse(format!("block {}: invalid index '{}'", block, index_line))
        })?;

        let time_line = lines
            .next()
            .ok_or_else(|| SubfluxError::Parse(format!("block {}: missing time line", block)))?;
        let (start_ms, end_ms) = parse_time_range(time_line)
            .map_err(|e| SubfluxError::Parse(format!("block {}: {}", block, e)))?;

        if start_ms > end_ms {
            return Err(SubfluxError::Parse(format!(
                "block {}: start {} is after end {}",
                block,
                format_srt_time(start_ms),
                format_srt_time(end_ms)
            )));
        }
        if let Some(prev) = entries.last() {
            if index <= prev.index {
                return Err(SubfluxError::Parse(format!(
                    "block {}: index {} does not follow {}",
                    block, index, prev.index
                )));
            }
        }

        let mut text = Vec::new();
        while let Some(line) = lines.peek() {
            if line.trim().is_empty() {
                break;
            }
            text.push(line.trim_end().to_string());
            lines.next();
        }

        entries.push(SubtitleEntry {
            index,
            start_ms,
            end_ms,
            text: text.join("\n"),
        });
    }

    Ok(entries)
}

/// Serialize entries back to SRT text
pub fn generate_srt(entries: &[SubtitleEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            entry.index,
            format_srt_time(entry.start_ms),
            format_srt_time(entry.end_ms),
            entry.text.trim()
        ));
    }
    out
}

/// Total caption characters, used for usage accounting
pub fn character_count(entries: &[SubtitleEntry]) -> usize {
    entries.iter().map(|e| e.text.chars().count()).sum()
}

/// Parse `00:00:01,000 --> 00:00:02,000`, ignoring trailing position hints
fn parse_time_range(line: &str) -> std::result::Result<(u64, u64), String> {
    let mut parts = line.split("-->");
    let start = parts.next().ok_or("missing start time")?;
    let end = parts.next().ok_or_else(|| format!("invalid time line '{}'", line.trim()))?;
    // Some encoders append coordinates after the end time
    let end = end.split_whitespace().next().ok_or("missing end time")?;
    Ok((parse_srt_time(start.trim())?, parse_srt_time(end)?))
}

/// Parse `HH:MM:SS,mmm` (or `HH:MM:SS.mmm`) into milliseconds
fn parse_srt_time(t: &str) -> std::result::Result<u64, String> {
    let parts: Vec<&str> = t.split([':', ',', '.']).collect();
    if parts.len() != 4 {
        return Err(format!("invalid timestamp '{}'", t));
    }
    let field = |s: &str| s.trim().parse::<u64>().map_err(|_| format!("invalid timestamp '{}'", t));
    let h = field(parts[0])?;
    let m = field(parts[1])?;
    let s = field(parts[2])?;
    let ms = field(parts[3])?;
    if m >= 60 || s >= 60 || ms >= 1000 {
        return Err(format!("timestamp out of range '{}'", t));
    }
    h.checked_mul(3_600_000)
        .and_then(|total| total.checked_add(m * 60_000 + s * 1000 + ms))
        .ok_or_else(|| format!("timestamp out of range '{}'", t))
}

/// Format milliseconds to SRT time format (HH:MM:SS,mmm)
pub fn format_srt_time(total_ms: u64) -> String {
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1_000;
    let millis = total_ms % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}
