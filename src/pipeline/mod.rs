//! Stream-pair download pipeline
//!
//! Two shapes: a single fetch for combined formats, and a dual fetch with an
//! external mux for separate video/audio selectors. Every in-flight file
//! lives under `<root>/temp` with the task id in its name, and the final
//! artifact only ever appears under its public name via a rename, so an
//! aborted task never leaves a half-written file where a caller expects a
//! complete one.

pub mod muxer;

pub use muxer::{FfmpegMuxer, StreamMuxer};

use crate::fetcher::{FetchProgress, MediaFetcher};
use crate::orchestrator::ProgressSender;
use crate::task::{DownloadOutcome, StreamRole};
use crate::utils::{sanitize_filename, MediaForgeError};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Fetch an already-combined format straight through. Progress is reported
/// under the `video` role only.
pub async fn fetch_single(
    fetcher: &dyn MediaFetcher,
    download_root: &Path,
    task_id: &str,
    url: &str,
    selector: &str,
    title: Option<&str>,
    progress: ProgressSender,
) -> Result<DownloadOutcome, MediaForgeError> {
    let (filename, final_path, download_url) = output_parts(download_root, title);
    let temp_dir = ensure_temp_dir(download_root).await?;
    let staging = temp_dir.join(format!("{}_single.mp4", task_id));

    let reporter = progress.clone();
    let on_progress = move |event: FetchProgress| {
        reporter.report(
            StreamRole::Video,
            event.percent(),
            event.speed.unwrap_or(0.0),
        );
    };

    if let Err(e) = fetcher.fetch(url, selector, &staging, &on_progress).await {
        remove_quietly(&staging).await;
        return Err(e);
    }

    finalize(&staging, &final_path).await?;
    let file_size = artifact_size(&final_path).await;
    Ok(DownloadOutcome {
        filename,
        file_size,
        download_url,
    })
}

/// Fetch separate video and audio streams concurrently, then stream-copy
/// them into one container. The temp inputs are removed whether or not the
/// mux succeeds.
#[allow(clippy::too_many_arguments)]
pub async fn fetch_pair(
    fetcher: &dyn MediaFetcher,
    muxer: &dyn StreamMuxer,
    download_root: &Path,
    task_id: &str,
    url: &str,
    video_selector: &str,
    audio_selector: &str,
    title: Option<&str>,
    progress: ProgressSender,
) -> Result<DownloadOutcome, MediaForgeError> {
    let (filename, final_path, download_url) = output_parts(download_root, title);
    let temp_dir = ensure_temp_dir(download_root).await?;

    // Task id in the temp names keeps concurrent tasks from colliding
    let video_temp = temp_dir.join(format!("{}_v.mp4", task_id));
    let audio_temp = temp_dir.join(format!("{}_a.m4a", task_id));
    let staging = temp_dir.join(format!("{}_muxed.mp4", task_id));

    let video_reporter = progress.clone();
    let on_video = move |event: FetchProgress| {
        video_reporter.report(
            StreamRole::Video,
            event.percent(),
            event.speed.unwrap_or(0.0),
        );
    };
    let audio_reporter = progress;
    let on_audio = move |event: FetchProgress| {
        audio_reporter.report(
            StreamRole::Audio,
            event.percent(),
            event.speed.unwrap_or(0.0),
        );
    };

    let fetched = futures::future::try_join(
        fetcher.fetch(url, video_selector, &video_temp, &on_video),
        fetcher.fetch(url, audio_selector, &audio_temp, &on_audio),
    )
    .await;

    if let Err(e) = fetched {
        remove_quietly(&video_temp).await;
        remove_quietly(&audio_temp).await;
        return Err(e);
    }

    let muxed = muxer.mux(&video_temp, &audio_temp, &staging).await;

    // Temp inputs go away regardless of how the mux went
    remove_quietly(&video_temp).await;
    remove_quietly(&audio_temp).await;

    if let Err(e) = muxed {
        remove_quietly(&staging).await;
        return Err(e);
    }

    finalize(&staging, &final_path).await?;
    let file_size = artifact_size(&final_path).await;
    Ok(DownloadOutcome {
        filename,
        file_size,
        download_url,
    })
}

/// Derive the artifact name, output path and retrieval URL from the
/// presented title. Sanitization happens here, exactly once, so the path
/// and the URL can never disagree.
fn output_parts(download_root: &Path, title: Option<&str>) -> (String, PathBuf, String) {
    let mut base = sanitize_filename(title.unwrap_or("video"));
    if base.is_empty() {
        base = "video".to_string();
    }

    let filename = format!("{}.mp4", base);
    let final_path = download_root.join(&filename);
    let download_url = format!("/download/{}", filename);
    (filename, final_path, download_url)
}

async fn ensure_temp_dir(download_root: &Path) -> Result<PathBuf, MediaForgeError> {
    let temp_dir = download_root.join("temp");
    tokio::fs::create_dir_all(&temp_dir).await?;
    Ok(temp_dir)
}

/// Move the staged file into place under its public name
async fn finalize(staging: &Path, final_path: &Path) -> Result<(), MediaForgeError> {
    if let Err(e) = tokio::fs::rename(staging, final_path).await {
        remove_quietly(staging).await;
        return Err(MediaForgeError::Download(format!(
            "failed to move finished file into place: {}",
            e
        )));
    }
    Ok(())
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove temp file {}: {}", path.display(), e);
        }
    }
}

async fn artifact_size(path: &Path) -> u64 {
    tokio::fs::metadata(path).await.map(|m| m.len()).unwrap_or(0)
}
