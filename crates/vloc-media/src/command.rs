//! FFmpeg command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file path
    input: PathBuf,
    /// Output file path
    output: PathBuf,
    /// Input arguments (before -i)
    input_args: Vec<String>,
    /// Output arguments (after -i)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
    /// Log level
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            input_args: Vec::new(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Add input arguments (before -i).
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        self.input_args.push(arg.into());
        self
    }

    /// Add output arguments (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Drop the video stream.
    pub fn no_video(self) -> Self {
        self.output_arg("-vn")
    }

    /// Set audio sample rate.
    pub fn sample_rate(self, rate: u32) -> Self {
        self.output_arg("-ar").output_arg(rate.to_string())
    }

    /// Set audio channel count.
    pub fn channels(self, channels: u32) -> Self {
        self.output_arg("-ac").output_arg(channels.to_string())
    }

    /// Set audio codec.
    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    /// Build the argument list.
    fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            self.log_level.clone(),
        ];
        args.extend(self.input_args.clone());
        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());
        args.extend(self.output_args.clone());
        if self.overwrite {
            args.push("-y".to_string());
        }
        args.push(self.output.to_string_lossy().to_string());
        args
    }

    /// Run the command to completion, capturing stderr into the error on
    /// failure.
    pub async fn run(&self) -> MediaResult<()> {
        which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

        let args = self.build_args();
        debug!(args = ?args, "Running ffmpeg");

        let output = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(MediaError::ffmpeg_failed(
                format!("ffmpeg failed for {}", self.input.display()),
                Some(stderr),
                output.status.code(),
            ));
        }

        Ok(())
    }
}
