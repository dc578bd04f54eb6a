//! The provider set the pipeline runs against.

use std::sync::Arc;

use vloc_providers::{SpeechToText, TranslationProvider, VoiceSynthesis};

/// All external providers, bundled.
///
/// `speech` is an ordered ladder: index 0 is the primary, the rest are
/// fallbacks tried in order by the explicit fallback entry point.
#[derive(Clone)]
pub struct ProviderSet {
    pub speech: Vec<Arc<dyn SpeechToText>>,
    pub translation: Arc<dyn TranslationProvider>,
    pub synthesis: Arc<dyn VoiceSynthesis>,
}

impl ProviderSet {
    /// The primary speech provider.
    pub fn primary_speech(&self) -> Option<&Arc<dyn SpeechToText>> {
        self.speech.first()
    }

    /// The secondary speech provider used for language detection, falling
    /// back to the primary when only one is configured.
    pub fn detection_secondary(&self) -> Option<&Arc<dyn SpeechToText>> {
        self.speech.get(1).or_else(|| self.speech.first())
    }

    /// The fallback rungs (everything after the primary).
    pub fn fallback_speech(&self) -> &[Arc<dyn SpeechToText>] {
        if self.speech.len() > 1 {
            &self.speech[1..]
        } else {
            &[]
        }
    }

    /// Select speech providers by name; empty selection means primary only.
    pub fn select_speech(&self, selected: &[String]) -> Vec<Arc<dyn SpeechToText>> {
        if selected.is_empty() {
            return self.primary_speech().cloned().into_iter().collect();
        }
        self.speech
            .iter()
            .filter(|p| selected.iter().any(|s| s == p.name()))
            .cloned()
            .collect()
    }
}
