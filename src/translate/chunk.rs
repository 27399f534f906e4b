use crate::error::{Result, SubfluxError};
use crate::subtitle::SubtitleEntry;

/// Split entries into consecutive chunks bounded by entry count and
/// caption characters. An entry longer than `max_chars` gets a chunk of its own.
pub fn chunk_entries(
    entries: &[SubtitleEntry],
    max_entries: usize,
    max_chars: usize,
) -> Vec<&[SubtitleEntry]> {
    let max_entries = max_entries.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut chars = 0;

    for (i, entry) in entries.iter().enumerate() {
        let len = entry.text.chars().count();
        let size = i - start;
        if size > 0 && (size >= max_entries || chars + len > max_chars) {
            chunks.push(&entries[start..i]);
            start = i;
            chars = 0;
        }
        chars += len;
    }
    if start < entries.len() {
        chunks.push(&entries[start..]);
    }

    chunks
}

/// Merge translated chunks back into timed entries.
///
/// Timing always comes from the original entries; the translated chunks only
/// contribute text and must line up with the originals by index.
pub fn merge_chunks(
    original: &[SubtitleEntry],
    translated: Vec<Vec<SubtitleEntry>>,
) -> Result<Vec<SubtitleEntry>> {
    let flat: Vec<SubtitleEntry> = translated.into_iter().flatten().collect();
    if flat.len() != original.len() {
        return Err(SubfluxError::Translation(format!(
            "Merged {} translated entries for {} originals",
            flat.len(),
            original.len()
        )));
    }

    original
        .iter()
        .zip(flat)
        .map(|(source, target)| {
            if source.index != target.index {
                return Err(SubfluxError::Translation(format!(
                    "Translated entry {} is out of place (expected {})",
                    target.index, source.index
                )));
            }
            Ok(source.with_text(target.text))
        })
        .collect()
}

/// Share of entries that came back with non-empty text, in `0.0..=1.0`
pub fn translation_confidence(original: &[SubtitleEntry], translated: &[SubtitleEntry]) -> f64 {
    if original.is_empty() {
        return 0.0;
    }
    let filled = translated
        .iter()
        .filter(|e| !e.text.trim().is_empty())
        .count();
    (filled as f64 / original.len() as f64).min(1.0)
}
