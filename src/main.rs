//! MediaForge - local media download service
//!
//! Probes media URLs through the plugin registry, downloads a chosen
//! video/audio pair and muxes it into a single artifact under the
//! download root. This binary drives the same service facade a request
//! layer would.

use anyhow::Result;
use clap::{Parser, Subcommand};
use mediaforge::{DownloadRequest, MediaService, ServiceConfig, StreamRole, TaskStatus};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "mediaforge", about = "Local media download service")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Probe a URL and list selectable formats
    Probe { url: String },

    /// Download a chosen format pair and wait for completion
    Download {
        url: String,

        /// Video format selector (or an already-combined format)
        #[arg(long)]
        video_format: String,

        /// Separate audio-only selector; omit for combined formats
        #[arg(long)]
        audio_format: Option<String>,

        /// Output title; defaults to the probed title
        #[arg(long)]
        title: Option<String>,

        /// Display label recorded in history
        #[arg(long)]
        quality_label: Option<String>,

        /// Language label recorded in history
        #[arg(long)]
        language: Option<String>,
    },

    /// Show recent download history
    History {
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let service = MediaService::start(ServiceConfig::default()).await?;

    match args.command {
        Command::Probe { url } => {
            let info = service.probe(&url).await?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Command::Download {
            url,
            video_format,
            audio_format,
            title,
            quality_label,
            language,
        } => {
            let title = match title {
                Some(title) => Some(title),
                None => service.probe(&url).await.ok().and_then(|info| info.title),
            };

            let task_id = service
                .submit_download(DownloadRequest {
                    url,
                    title,
                    video_format,
                    audio_format,
                    quality_label,
                    language,
                })
                .await?;
            println!("task {}", task_id);

            watch_task(&service, &task_id).await;
        }
        Command::History { limit } => {
            for record in service.history(limit).await? {
                let timestamp = record
                    .timestamp
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "-".to_string());
                let size = record.file_size.unwrap_or(0);
                let flag = if record.deleted { " (removed)" } else { "" };
                println!("{}  {}  {} bytes{}", timestamp, record.filename, size, flag);
            }
        }
    }

    Ok(())
}

/// Poll a task until it reaches a terminal state, echoing progress
async fn watch_task(service: &MediaService, task_id: &str) {
    loop {
        tokio::time::sleep(Duration::from_millis(500)).await;

        let Some(snapshot) = service.task_snapshot(task_id).await else {
            eprintln!("task {} disappeared", task_id);
            return;
        };

        let video = snapshot
            .progress
            .get(&StreamRole::Video)
            .copied()
            .unwrap_or_default();
        let audio = snapshot
            .progress
            .get(&StreamRole::Audio)
            .copied()
            .unwrap_or_default();
        println!(
            "video {:6.1}% @ {:9.0} B/s | audio {:6.1}% @ {:9.0} B/s",
            video.percent, video.speed, audio.percent, audio.speed
        );

        match snapshot.status {
            TaskStatus::Completed => {
                if let Some(result) = snapshot.result {
                    println!(
                        "done: {} ({} bytes) -> {}",
                        result.filename, result.file_size, result.download_url
                    );
                }
                return;
            }
            TaskStatus::Failed => {
                eprintln!(
                    "failed: {}",
                    snapshot.error.unwrap_or_else(|| "unknown error".to_string())
                );
                return;
            }
            TaskStatus::Pending | TaskStatus::Processing => {}
        }
    }
}
