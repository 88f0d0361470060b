//! Contract for the external extraction/download library
//!
//! The rest of the crate only sees the [`MediaFetcher`] trait; the concrete
//! yt-dlp implementation lives in [`ytdlp`] and tests drive the pipeline
//! with scripted implementations instead.

pub mod ytdlp;

pub use ytdlp::YtDlpFetcher;

use crate::utils::MediaForgeError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One format entry as reported by the extraction library.
///
/// Everything beyond the selector identity is optional upstream; consumers
/// substitute defaults when presenting formats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFormat {
    pub format_id: String,
    pub ext: String,
    #[serde(default)]
    pub vcodec: Option<String>,
    #[serde(default)]
    pub acodec: Option<String>,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub abr: Option<f64>,
    #[serde(default)]
    pub filesize: Option<u64>,
    #[serde(default)]
    pub language: Option<String>,
}

impl RawFormat {
    /// A codec of "none" marks the stream as absent
    pub fn has_video(&self) -> bool {
        self.vcodec.as_deref().is_some_and(|c| c != "none")
    }

    pub fn has_audio(&self) -> bool {
        self.acodec.as_deref().is_some_and(|c| c != "none")
    }
}

/// Read-only probe result for a URL
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbeReport {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub formats: Vec<RawFormat>,
}

/// Progress event emitted while a stream is being fetched
#[derive(Debug, Clone, Copy)]
pub struct FetchProgress {
    pub downloaded_bytes: u64,
    /// Upstream may not know the total; percent math degrades instead of
    /// dividing by zero
    pub total_bytes: Option<u64>,
    pub speed: Option<f64>,
}

impl FetchProgress {
    /// Percent complete; an absent or zero total falls back to a
    /// denominator of 1
    pub fn percent(&self) -> f64 {
        let total = match self.total_bytes {
            Some(t) if t > 0 => t,
            _ => 1,
        };
        (self.downloaded_bytes as f64 / total as f64) * 100.0
    }
}

/// Callback invoked for every progress event during a fetch
pub type OnProgress = dyn Fn(FetchProgress) + Send + Sync;

/// Abstraction over the extraction/download library
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Probe a URL without downloading anything
    async fn probe(&self, url: &str) -> Result<ProbeReport, MediaForgeError>;

    /// Fetch one stream (or a `"+"`-joined pair the library muxes itself)
    /// to `dest`, reporting progress along the way
    async fn fetch(
        &self,
        url: &str,
        selector: &str,
        dest: &Path,
        on_progress: &OnProgress,
    ) -> Result<(), MediaForgeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_with_known_total() {
        let progress = FetchProgress {
            downloaded_bytes: 250,
            total_bytes: Some(1000),
            speed: None,
        };
        assert_eq!(progress.percent(), 25.0);
    }

    #[test]
    fn test_percent_tolerates_missing_total() {
        let progress = FetchProgress {
            downloaded_bytes: 4096,
            total_bytes: None,
            speed: None,
        };
        // Degenerate but finite
        assert_eq!(progress.percent(), 409_600.0);
    }

    #[test]
    fn test_percent_tolerates_zero_total() {
        let progress = FetchProgress {
            downloaded_bytes: 10,
            total_bytes: Some(0),
            speed: None,
        };
        assert_eq!(progress.percent(), 1000.0);
    }

    #[test]
    fn test_raw_format_codec_flags() {
        let combined: RawFormat = serde_json::from_str(
            r#"{"format_id":"22","ext":"mp4","vcodec":"avc1","acodec":"mp4a"}"#,
        )
        .unwrap();
        assert!(combined.has_video());
        assert!(combined.has_audio());

        let video_only: RawFormat = serde_json::from_str(
            r#"{"format_id":"137","ext":"mp4","vcodec":"avc1","acodec":"none"}"#,
        )
        .unwrap();
        assert!(video_only.has_video());
        assert!(!video_only.has_audio());

        let bare: RawFormat =
            serde_json::from_str(r#"{"format_id":"0","ext":"mp4"}"#).unwrap();
        assert!(!bare.has_video());
        assert!(!bare.has_audio());
    }
}
