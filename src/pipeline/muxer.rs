//! Stream-copy muxing via an external binary

use crate::utils::MediaForgeError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command as AsyncCommand;
use tracing::debug;

/// Combines exactly one video and one audio input into one output container
#[async_trait]
pub trait StreamMuxer: Send + Sync {
    async fn mux(
        &self,
        video: &Path,
        audio: &Path,
        output: &Path,
    ) -> Result<(), MediaForgeError>;
}

/// ffmpeg-backed muxer; always stream copy, never a re-encode
pub struct FfmpegMuxer {
    ffmpeg_path: PathBuf,
}

impl FfmpegMuxer {
    pub fn new(ffmpeg_path: PathBuf) -> Self {
        Self { ffmpeg_path }
    }

    /// Locate ffmpeg next to the executable, on PATH, or in common
    /// locations; falls back to the bare command name
    pub fn discover() -> Self {
        Self {
            ffmpeg_path: find_ffmpeg(),
        }
    }

    pub fn ffmpeg_path(&self) -> &Path {
        &self.ffmpeg_path
    }
}

#[async_trait]
impl StreamMuxer for FfmpegMuxer {
    async fn mux(
        &self,
        video: &Path,
        audio: &Path,
        output: &Path,
    ) -> Result<(), MediaForgeError> {
        debug!(
            "Muxing {} + {} -> {}",
            video.display(),
            audio.display(),
            output.display()
        );

        let result = AsyncCommand::new(&self.ffmpeg_path)
            .arg("-y")
            .arg("-i")
            .arg(video)
            .arg("-i")
            .arg(audio)
            .arg("-c")
            .arg("copy")
            .arg(output)
            .output()
            .await?;

        if !result.status.success() {
            let message = String::from_utf8_lossy(&result.stderr);
            return Err(MediaForgeError::Download(format!(
                "ffmpeg mux failed: {}",
                message.trim()
            )));
        }

        Ok(())
    }
}

/// Find ffmpeg with priority: exe-adjacent (bundled installs), PATH,
/// common installation paths
pub fn find_ffmpeg() -> PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let local = dir.join("ffmpeg");
            if local.exists() {
                return local;
            }
        }
    }

    if let Ok(path) = which::which("ffmpeg") {
        return path;
    }

    for candidate in [
        "/opt/homebrew/bin/ffmpeg",
        "/usr/local/bin/ffmpeg",
        "/usr/bin/ffmpeg",
    ] {
        let path = PathBuf::from(candidate);
        if path.exists() {
            return path;
        }
    }

    PathBuf::from("ffmpeg")
}
