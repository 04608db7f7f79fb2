//! Video download to local staging
//!
//! Wraps the `yt-dlp` command-line tool. The caller owns the destination
//! directory and is responsible for removing it.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::process::Command;

/// File name (without extension) used for staged downloads
pub const STAGED_FILE_STEM: &str = "audit_video";

/// Download errors
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Failed to launch downloader `{binary}`: {source}")]
    Launch {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Downloader exited with status {status}: {stderr}")]
    Failed { status: i32, stderr: String },

    #[error("Downloader reported success but produced no file in {0}")]
    MissingOutput(PathBuf),
}

/// Fetches a remote video into a local directory
#[async_trait]
pub trait MediaDownloader: Send + Sync {
    /// Download `video_url` into `dest_dir`, returning the file path
    async fn download(&self, video_url: &str, dest_dir: &Path) -> Result<PathBuf, DownloadError>;
}

/// `yt-dlp` subprocess downloader
pub struct YtDlpDownloader {
    binary: String,
}

impl YtDlpDownloader {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn build_args(video_url: &str, dest_dir: &Path) -> Vec<String> {
        let template = dest_dir.join(format!("{}.%(ext)s", STAGED_FILE_STEM));
        vec![
            "--format".to_string(),
            "best[ext=mp4]/best".to_string(),
            "--no-playlist".to_string(),
            "--quiet".to_string(),
            "--output".to_string(),
            template.to_string_lossy().to_string(),
            video_url.to_string(),
        ]
    }
}

#[async_trait]
impl MediaDownloader for YtDlpDownloader {
    async fn download(&self, video_url: &str, dest_dir: &Path) -> Result<PathBuf, DownloadError> {
        tracing::info!(video_url, dest = %dest_dir.display(), "Downloading video");

        let output = Command::new(&self.binary)
            .args(Self::build_args(video_url, dest_dir))
            .output()
            .await
            .map_err(|source| DownloadError::Launch {
                binary: self.binary.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(DownloadError::Failed {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        find_staged_file(dest_dir).await
    }
}

/// Locate the downloaded file; the extension is chosen by yt-dlp
async fn find_staged_file(dest_dir: &Path) -> Result<PathBuf, DownloadError> {
    let mut entries = tokio::fs::read_dir(dest_dir)
        .await
        .map_err(|_| DownloadError::MissingOutput(dest_dir.to_path_buf()))?;

    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        let matches_stem = path
            .file_stem()
            .map(|stem| stem == STAGED_FILE_STEM)
            .unwrap_or(false);
        if matches_stem && path.is_file() {
            tracing::debug!(path = %path.display(), "Video staged locally");
            return Ok(path);
        }
    }

    Err(DownloadError::MissingOutput(dest_dir.to_path_buf()))
}
