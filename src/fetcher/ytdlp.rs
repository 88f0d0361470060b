//! yt-dlp implementation of the fetcher contract
//!
//! Probing shells out to `yt-dlp --dump-json --no-download`; fetching runs
//! `yt-dlp -f <selector> -o <dest> --newline` and turns the progress lines
//! into [`FetchProgress`] events.

use crate::fetcher::{FetchProgress, MediaFetcher, OnProgress, ProbeReport};
use crate::utils::MediaForgeError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command as AsyncCommand;
use tracing::{debug, info, warn};

pub struct YtDlpFetcher {
    ytdlp_path: PathBuf,
}

impl YtDlpFetcher {
    /// Use yt-dlp at an explicit path
    pub fn with_path(ytdlp_path: PathBuf) -> Self {
        Self { ytdlp_path }
    }

    /// Locate yt-dlp on the host. Falls back to the bare command name with
    /// a warning so the service can still start; probes will then fail with
    /// an ordinary extraction error until the tool is installed.
    pub fn discover() -> Self {
        match find_ytdlp() {
            Some(path) => {
                info!("Using yt-dlp at {}", path.display());
                Self { ytdlp_path: path }
            }
            None => {
                warn!("yt-dlp not found; media extraction will fail until it is installed");
                Self {
                    ytdlp_path: PathBuf::from("yt-dlp"),
                }
            }
        }
    }

    pub fn ytdlp_path(&self) -> &Path {
        &self.ytdlp_path
    }
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    async fn probe(&self, url: &str) -> Result<ProbeReport, MediaForgeError> {
        debug!("Probing media info for {}", url);

        let output = AsyncCommand::new(&self.ytdlp_path)
            .arg("--dump-json")
            .arg("--no-download")
            .arg("--no-warnings")
            .arg(url)
            .output()
            .await?;

        if !output.status.success() {
            let message = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(MediaForgeError::Extraction(message));
        }

        let report: ProbeReport = serde_json::from_slice(&output.stdout)?;
        Ok(report)
    }

    async fn fetch(
        &self,
        url: &str,
        selector: &str,
        dest: &Path,
        on_progress: &OnProgress,
    ) -> Result<(), MediaForgeError> {
        debug!("Fetching format '{}' from {} to {}", selector, url, dest.display());

        let mut child = AsyncCommand::new(&self.ytdlp_path)
            .arg("-f")
            .arg(selector)
            .arg("-o")
            .arg(dest)
            .arg("--newline")
            .arg("--no-warnings")
            .arg(url)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Collect stderr on the side so a chatty process can't deadlock
        // against the progress loop
        let stderr = child.stderr.take();
        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            if let Some(mut stderr) = stderr {
                let _ = stderr.read_to_string(&mut buf).await;
            }
            buf
        });

        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            while let Some(line) = lines.next_line().await? {
                if let Some(progress) = parse_progress_line(&line) {
                    on_progress(progress);
                }
            }
        }

        let status = child.wait().await?;
        let stderr_output = stderr_task.await.unwrap_or_default();

        if !status.success() {
            let message = stderr_output.trim();
            let message = if message.is_empty() {
                format!("yt-dlp exited with {}", status)
            } else {
                message.to_string()
            };
            return Err(MediaForgeError::Download(message));
        }

        Ok(())
    }
}

/// Parse one `--newline` progress line, e.g.
/// `[download]  42.5% of ~ 150.00MiB at  5.20MiB/s ETA 00:15`
fn parse_progress_line(line: &str) -> Option<FetchProgress> {
    if !line.starts_with("[download]") || !line.contains('%') {
        return None;
    }

    let pct_end = line.find('%')?;
    let pct_start = line[..pct_end].rfind(' ').map(|i| i + 1).unwrap_or(0);
    let percent: f64 = line[pct_start..pct_end].parse().ok()?;

    let total_bytes = line.find(" of ").and_then(|idx| {
        let rest = line[idx + 4..].trim_start().trim_start_matches('~').trim_start();
        let end = rest.find(" at ").unwrap_or(rest.len());
        parse_size(rest[..end].trim())
    });

    let speed = line.find(" at ").and_then(|idx| {
        let rest = &line[idx + 4..];
        let end = rest.find("/s")?;
        parse_size(rest[..end].trim()).map(|bytes| bytes as f64)
    });

    // yt-dlp reports percent, not bytes; reconstruct the byte count when
    // the total is known
    let downloaded_bytes = total_bytes
        .map(|total| ((percent / 100.0) * total as f64) as u64)
        .unwrap_or(0);

    Some(FetchProgress {
        downloaded_bytes,
        total_bytes,
        speed,
    })
}

/// Parse a size token such as `150.00MiB` into bytes
fn parse_size(token: &str) -> Option<u64> {
    let split = token
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(token.len());
    let value: f64 = token[..split].parse().ok()?;

    let scale = match token[split..].trim() {
        "KiB" => 1024.0,
        "MiB" => 1024.0 * 1024.0,
        "GiB" => 1024.0 * 1024.0 * 1024.0,
        _ => 1.0,
    };
    Some((value * scale) as u64)
}

/// Find yt-dlp on PATH or in common installation locations
pub fn find_ytdlp() -> Option<PathBuf> {
    if let Ok(path) = which::which("yt-dlp") {
        if path.exists() {
            return Some(path);
        }
    }

    let common_paths = [
        "/opt/homebrew/bin/yt-dlp",
        "/usr/local/bin/yt-dlp",
        "/usr/bin/yt-dlp",
        "~/.local/bin/yt-dlp",
    ];

    for path_str in common_paths {
        let expanded = if let Some(rest) = path_str.strip_prefix("~/") {
            match dirs::home_dir() {
                Some(home) => home.join(rest),
                None => continue,
            }
        } else {
            PathBuf::from(path_str)
        };

        if expanded.exists() {
            return Some(expanded);
        }
    }

    // Next to the executable, for bundled installs
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let local = dir.join("yt-dlp");
            if local.exists() {
                return Some(local);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_progress_line_full() {
        let line = "[download]  42.5% of ~ 150.00MiB at  5.20MiB/s ETA 00:15";
        let progress = parse_progress_line(line).unwrap();

        let total = 150u64 * 1024 * 1024;
        assert_eq!(progress.total_bytes, Some(total));
        assert_eq!(progress.speed, Some((5.2_f64 * 1024.0 * 1024.0) as u64 as f64));
        // 42.5% of 150 MiB, truncated the same way the parser truncates
        let expected = ((42.5 / 100.0) * total as f64) as u64;
        assert_eq!(progress.downloaded_bytes, expected);
    }

    #[test]
    fn test_parse_progress_line_exact_total() {
        let line = "[download] 100.0% of 10.00MiB at 1.00MiB/s ETA 00:00";
        let progress = parse_progress_line(line).unwrap();
        assert_eq!(progress.total_bytes, Some(10 * 1024 * 1024));
        assert_eq!(progress.downloaded_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_parse_progress_line_unknown_total() {
        let line = "[download]  12.0% of N/A at 500.00KiB/s ETA Unknown";
        let progress = parse_progress_line(line).unwrap();
        assert_eq!(progress.total_bytes, None);
        assert_eq!(progress.downloaded_bytes, 0);
        assert_eq!(progress.speed, Some(500.0 * 1024.0));
    }

    #[test]
    fn test_parse_progress_line_rejects_noise() {
        assert!(parse_progress_line("[info] Downloading 1 format(s): 137+140").is_none());
        assert!(parse_progress_line("[download] Destination: video.mp4").is_none());
        assert!(parse_progress_line("").is_none());
    }

    #[test]
    fn test_parse_size_units() {
        assert_eq!(parse_size("512B"), Some(512));
        assert_eq!(parse_size("1.50KiB"), Some(1536));
        assert_eq!(parse_size("2MiB"), Some(2 * 1024 * 1024));
        assert_eq!(parse_size("garbage"), None);
    }

    #[test]
    fn test_find_ytdlp() {
        // yt-dlp may not be installed in CI; just exercise the lookup
        let result = find_ytdlp();
        println!("yt-dlp found at: {:?}", result);
    }
}
