//! Provider boundary: speech-to-text, machine translation and voice
//! synthesis.
//!
//! Each capability is a trait so the pipeline can be exercised against
//! fakes; the HTTP implementations live alongside. Quota-class failures
//! are the only ones the [`fallback::FallbackLadder`] walks.

pub mod detect;
pub mod error;
pub mod fallback;
pub mod http;
pub mod speech;
pub mod synthesis;
pub mod translate;

pub use detect::{detect_language, DetectedLanguage, DEFAULT_LANGUAGE_CONFIDENCE};
pub use error::{ProviderError, ProviderResult};
pub use fallback::FallbackLadder;
pub use speech::{RawSegment, RawTranscript, SpeechToText, TranscribeOptions};
pub use synthesis::{DubbingPoll, DubbingRequest, ProviderJobStatus, VoiceSynthesis};
pub use translate::{TranslatedText, TranslationProvider};
