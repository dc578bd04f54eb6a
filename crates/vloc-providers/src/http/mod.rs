//! HTTP provider implementations.

pub mod dubbing;
pub mod transcription;
pub mod translation;

pub use dubbing::HttpDubbingClient;
pub use transcription::HttpSpeechClient;
pub use translation::HttpTranslationClient;
