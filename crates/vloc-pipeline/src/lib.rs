//! Video localization pipeline: audio extraction, language detection,
//! transcription, translation and dubbing, coordinated around an explicit
//! status state machine with a human confirmation gate between the source
//! transcript and everything derived from it.

pub mod config;
pub mod dub;
pub mod error;
pub mod logging;
pub mod machine;
pub mod media;
pub mod providers;
pub mod transcribe;
pub mod translate;

pub use config::PipelineConfig;
pub use dub::DubbingOrchestrator;
pub use error::{PipelineError, PipelineResult};
pub use logging::{init_tracing, StageLogger};
pub use machine::{StageOutcome, VideoPipeline};
pub use media::{FfmpegMedia, MediaAccess};
pub use providers::ProviderSet;
pub use transcribe::{TranscriptionEngine, FALLBACK_MODEL_SOURCE};
pub use translate::TranslationEngine;
