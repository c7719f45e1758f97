//! Video platform collaborator, backed by yt-dlp.

use crate::models::media::TrailerCandidate;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;

const SEARCH_TIMEOUT: Duration = Duration::from_secs(120);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Video platform interface consumed by the core.
#[allow(async_fn_in_trait)]
pub trait VideoPlatform {
    /// Search the platform, returning normalized candidates.
    async fn search(&self, query: &str) -> Result<Vec<TrailerCandidate>>;

    /// Download a video by ID, capped at `max_height` pixels.
    async fn download(&self, video_id: &str, max_height: u32, dest: &Path) -> Result<()>;
}

/// yt-dlp backed client.
pub struct YtDlpClient {
    binary: String,
    max_results: u32,
}

/// One line of `yt-dlp --dump-json` output, reduced to the fields we read.
#[derive(Debug, Deserialize)]
struct SearchLine {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    channel_is_verified: bool,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    height: Option<u32>,
}

impl YtDlpClient {
    pub fn new() -> Self {
        Self {
            binary: "yt-dlp".to_string(),
            max_results: 10,
        }
    }

    /// Check if yt-dlp is installed.
    pub async fn is_installed(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .output()
            .await
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    async fn run(&self, args: &[&str], timeout: Duration) -> Result<std::process::Output> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args);
        match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(Error::unavailable("yt-dlp", e)),
            Err(_) => Err(Error::unavailable("yt-dlp", "timed out")),
        }
    }
}

impl Default for YtDlpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoPlatform for YtDlpClient {
    async fn search(&self, query: &str) -> Result<Vec<TrailerCandidate>> {
        let search_arg = format!("ytsearch{}", self.max_results);
        let output = self
            .run(
                &[
                    "--dump-json",
                    "--default-search",
                    &search_arg,
                    "--no-playlist",
                    "--no-download",
                    query,
                ],
                SEARCH_TIMEOUT,
            )
            .await?;

        // yt-dlp may exit nonzero when some results fail (age-restricted
        // etc.) while still writing usable JSON lines to stdout.
        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() && stdout.trim().is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::debug!("yt-dlp exited {:?}: {:.200}", output.status.code(), stderr);
        }

        let mut candidates = Vec::new();
        for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
            let Ok(item) = serde_json::from_str::<SearchLine>(line) else {
                continue;
            };
            if item.id.is_empty() {
                continue;
            }
            candidates.push(TrailerCandidate {
                video_id: item.id,
                title: item.title,
                duration_seconds: item.duration.unwrap_or(0.0) as u32,
                channel_name: item.channel.unwrap_or_default(),
                is_official_tag: item.channel_is_verified,
                max_available_resolution: item.height.unwrap_or(0),
            });
        }
        Ok(candidates)
    }

    async fn download(&self, video_id: &str, max_height: u32, dest: &Path) -> Result<()> {
        let url = format!("https://www.youtube.com/watch?v={video_id}");
        let format_arg = format!("bestvideo[height<={max_height}]+bestaudio/best");
        let dest_arg = dest.to_string_lossy().to_string();

        let output = self
            .run(
                &[
                    "--format",
                    &format_arg,
                    "--merge-output-format",
                    "mkv",
                    "--output",
                    &dest_arg,
                    "--no-playlist",
                    "--quiet",
                    "--no-warnings",
                    &url,
                ],
                DOWNLOAD_TIMEOUT,
            )
            .await?;

        if output.status.success() && dest.exists() {
            Ok(())
        } else {
            Err(Error::unavailable(
                "yt-dlp",
                format!("download failed for {url}"),
            ))
        }
    }
}
