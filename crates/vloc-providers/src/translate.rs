//! Machine-translation provider trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderResult;

/// One translated text, keyed by input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatedText {
    pub text: String,
    /// Provider confidence (0.0-1.0); defaulted when the provider reports
    /// none.
    pub confidence: f64,
}

/// Machine-translation capability.
///
/// `translate_batch` takes all of a video's segment texts in one call:
/// one network round-trip for N segments instead of N round-trips. Output
/// is keyed by input order and must have the same length as the input.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Stable provider/model name, recorded on translation rows.
    fn name(&self) -> &str;

    /// Translate a batch of texts in input order.
    async fn translate_batch(
        &self,
        texts: &[String],
        source_language: &str,
        target_language: &str,
    ) -> ProviderResult<Vec<TranslatedText>>;
}
