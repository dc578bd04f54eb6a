//! SRT subtitle rendering over segments and translations.
//!
//! Thin consumer of the core data: one numbered block per entry, in time
//! order, `HH:MM:SS,mmm --> HH:MM:SS,mmm` timing lines.

use crate::segment::{TimeRange, TranscriptionSegment};
use crate::timestamp::srt_timestamp;
use crate::translation::Translation;

/// One renderable subtitle line with resolved text.
#[derive(Debug, Clone)]
pub struct SubtitleEntry {
    pub start_time: f64,
    pub end_time: f64,
    pub text: String,
}

impl TimeRange for SubtitleEntry {
    fn start(&self) -> f64 {
        self.start_time
    }

    fn end(&self) -> f64 {
        self.end_time
    }
}

impl SubtitleEntry {
    /// Source-language entry straight from a segment.
    pub fn from_segment(segment: &TranscriptionSegment) -> Self {
        Self {
            start_time: segment.start_time,
            end_time: segment.end_time,
            text: segment.text.clone(),
        }
    }

    /// Translated entry: timing from the source segment, text from the
    /// translation.
    pub fn from_translation(segment: &TranscriptionSegment, translation: &Translation) -> Self {
        Self {
            start_time: segment.start_time,
            end_time: segment.end_time,
            text: translation.translated_text.clone(),
        }
    }
}

/// Render entries into SRT. Entries are sorted by start time; empty-text
/// entries are skipped.
pub fn render_srt(entries: &[SubtitleEntry]) -> String {
    let mut sorted: Vec<&SubtitleEntry> = entries.iter().filter(|e| !e.text.trim().is_empty()).collect();
    sorted.sort_by(|a, b| a.start_time.partial_cmp(&b.start_time).unwrap_or(std::cmp::Ordering::Equal));

    let mut out = String::new();
    for (i, entry) in sorted.iter().enumerate() {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            srt_timestamp(entry.start_time),
            srt_timestamp(entry.end_time),
            entry.text.trim()
        ));
    }
    out
}
