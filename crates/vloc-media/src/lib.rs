//! Media extraction layer: ffmpeg/ffprobe/yt-dlp subprocess wrappers.
//!
//! Turns a video source (local file, generic URL, streaming-platform URL)
//! into a normalized mono 16 kHz PCM audio file plus a duration. Pure
//! transforms over the filesystem, no pipeline state.

pub mod command;
pub mod download;
pub mod error;
pub mod extract;
pub mod probe;

pub use command::FfmpegCommand;
pub use download::{download_to_temp, platform_duration};
pub use error::{MediaError, MediaResult};
pub use extract::{extract_audio, get_duration, ExtractedAudio, AUDIO_SAMPLE_RATE};
pub use probe::{probe_file, MediaInfo};
