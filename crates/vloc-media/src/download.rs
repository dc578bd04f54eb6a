//! Source download: yt-dlp for streaming platforms, HTTP streaming for
//! generic URLs.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

use futures::StreamExt;
use url::Url;
use vloc_models::is_platform_url;

use crate::error::{MediaError, MediaResult};

/// Download a remote source into `dir`, returning the local file path.
///
/// Platform URLs go through yt-dlp; anything else is streamed over HTTP.
pub async fn download_to_temp(url: &str, dir: impl AsRef<Path>) -> MediaResult<PathBuf> {
    let dir = dir.as_ref();
    tokio::fs::create_dir_all(dir).await?;

    if is_platform_url(url) {
        download_with_ytdlp(url, dir).await
    } else {
        download_with_http(url, dir).await
    }
}

/// Query a platform video's duration without downloading it.
///
/// Uses `yt-dlp --print duration`, which resolves metadata only.
pub async fn platform_duration(url: &str) -> MediaResult<f64> {
    which::which("yt-dlp").map_err(|_| MediaError::YtDlpNotFound)?;

    let output = Command::new("yt-dlp")
        .args(["--no-download", "--print", "duration", "--no-warnings"])
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        warn!(url, error = %stderr.trim(), "yt-dlp duration probe failed");
        return Err(MediaError::DurationUnavailable(url.to_string()));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .trim()
        .parse::<f64>()
        .map_err(|_| MediaError::DurationUnavailable(url.to_string()))
}

async fn download_with_ytdlp(url: &str, dir: &Path) -> MediaResult<PathBuf> {
    which::which("yt-dlp").map_err(|_| MediaError::YtDlpNotFound)?;

    let output_template = dir.join("source.%(ext)s");
    info!(url, "Downloading platform video with yt-dlp");

    let output = Command::new("yt-dlp")
        .args([
            "-f",
            "bestaudio/best",
            "--no-playlist",
            "--no-warnings",
            "-o",
        ])
        .arg(&output_template)
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        return Err(MediaError::download_failed(format!(
            "yt-dlp failed for {url}: {}",
            stderr.trim()
        )));
    }

    // yt-dlp resolves the extension itself; find what it wrote.
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path
            .file_stem()
            .map(|s| s == "source")
            .unwrap_or(false)
        {
            debug!(path = %path.display(), "yt-dlp download complete");
            return Ok(path);
        }
    }

    Err(MediaError::download_failed(format!(
        "yt-dlp reported success but produced no file for {url}"
    )))
}

/// Last path segment of the URL, query and fragment excluded.
fn derive_filename(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.next_back())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "source.bin".to_string())
}

async fn download_with_http(url: &str, dir: &Path) -> MediaResult<PathBuf> {
    let path = dir.join(derive_filename(url));

    info!(url, path = %path.display(), "Downloading via HTTP");

    let response = reqwest::get(url).await?;
    if !response.status().is_success() {
        return Err(MediaError::download_failed(format!(
            "HTTP {} fetching {url}",
            response.status()
        )));
    }

    let mut file = tokio::fs::File::create(&path).await?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| MediaError::download_failed(e.to_string()))?;
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    Ok(path)
}
