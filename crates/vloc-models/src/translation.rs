//! Per-segment, per-language translations.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ids::{SegmentId, TranslationId};

/// One translation of one segment into one target language.
///
/// Upsert semantics: at most one row exists per (segment_id,
/// target_language) pair. A re-translate replaces text/confidence/model in
/// place rather than appending.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Translation {
    /// Unique translation ID
    pub id: TranslationId,

    /// Source segment this translates
    pub segment_id: SegmentId,

    /// Target language code
    pub target_language: String,

    /// Translated text
    pub translated_text: String,

    /// Confidence score (0.0-1.0)
    pub confidence: f64,

    /// Provider/model that produced it ("user-edit" after a manual override)
    pub model: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp (bumped on upsert and manual edit)
    pub updated_at: DateTime<Utc>,
}

impl Translation {
    /// Model tag recorded when a user edits a translation by hand.
    pub const USER_EDIT_MODEL: &'static str = "user-edit";

    /// Apply a manual user override to the text.
    pub fn apply_user_edit(mut self, text: impl Into<String>) -> Self {
        self.translated_text = text.into();
        self.model = Self::USER_EDIT_MODEL.to_string();
        self.confidence = 1.0;
        self.updated_at = Utc::now();
        self
    }
}
