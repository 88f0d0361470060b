//! Extractor plugin capability interface
//!
//! Every handler implements [`MediaPlugin`]; the registry dispatches a URL
//! to the highest-priority handler whose `can_handle` matches.

pub mod generic;
pub mod registry;
pub mod youtube;

pub use generic::GenericPlugin;
pub use registry::{builtin_plugins, PluginBuilder, PluginRegistry};
pub use youtube::YoutubePlugin;

use crate::fetcher::{MediaFetcher, RawFormat};
use crate::orchestrator::ProgressSender;
use crate::pipeline::StreamMuxer;
use crate::task::{DownloadOutcome, DownloadRequest};
use crate::utils::MediaForgeError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Shared construction context handed to every plugin
#[derive(Clone)]
pub struct PluginContext {
    pub download_root: PathBuf,
    pub fetcher: Arc<dyn MediaFetcher>,
    pub muxer: Arc<dyn StreamMuxer>,
}

/// A selectable video stream (possibly with audio already combined)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoFormat {
    pub format_id: String,
    pub resolution: String,
    pub filesize: u64,
    pub ext: String,
    /// "Combined" when the stream already carries audio, "Video Only"
    /// otherwise
    pub note: String,
}

impl VideoFormat {
    pub fn from_raw(raw: &RawFormat) -> Self {
        Self {
            format_id: raw.format_id.clone(),
            resolution: raw
                .resolution
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
            filesize: raw.filesize.unwrap_or(0),
            ext: raw.ext.clone(),
            note: if raw.has_audio() {
                "Combined".to_string()
            } else {
                "Video Only".to_string()
            },
        }
    }
}

/// A selectable audio-only stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioFormat {
    pub format_id: String,
    pub abr: f64,
    pub filesize: u64,
    pub ext: String,
    pub language: String,
    pub acodec: String,
}

impl AudioFormat {
    pub fn from_raw(raw: &RawFormat) -> Self {
        Self {
            format_id: raw.format_id.clone(),
            abr: raw.abr.unwrap_or(0.0),
            filesize: raw.filesize.unwrap_or(0),
            ext: raw.ext.clone(),
            language: raw.language.clone().unwrap_or_else(|| "unk".to_string()),
            acodec: raw.acodec.clone().unwrap_or_else(|| "Unknown".to_string()),
        }
    }
}

/// Extraction response presented to the caller for format selection.
/// Format lists are capped per handler; callers must not assume they are
/// complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInfo {
    pub title: Option<String>,
    pub thumbnail: Option<String>,
    pub duration: Option<f64>,
    pub video_formats: Vec<VideoFormat>,
    pub audio_formats: Vec<AudioFormat>,
}

/// Capability contract every extractor handler satisfies
#[async_trait]
pub trait MediaPlugin: Send + Sync {
    /// Short identifier used in logs and load errors
    fn name(&self) -> &'static str;

    /// Higher-priority handlers are consulted first
    fn priority(&self) -> i32;

    /// Pure dispatch predicate; must not perform I/O
    fn can_handle(&self, url: &str) -> bool;

    /// Read-only probe of the source
    async fn extract_info(&self, url: &str) -> Result<MediaInfo, MediaForgeError>;

    /// Fetch the chosen stream pair and produce the final artifact under
    /// the download root
    async fn download(
        &self,
        task_id: &str,
        request: &DownloadRequest,
        progress: ProgressSender,
    ) -> Result<DownloadOutcome, MediaForgeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(format_id: &str, vcodec: Option<&str>, acodec: Option<&str>) -> RawFormat {
        RawFormat {
            format_id: format_id.to_string(),
            ext: "mp4".to_string(),
            vcodec: vcodec.map(String::from),
            acodec: acodec.map(String::from),
            resolution: None,
            abr: None,
            filesize: None,
            language: None,
        }
    }

    #[test]
    fn test_video_format_defaults_and_note() {
        let combined = VideoFormat::from_raw(&raw("22", Some("avc1"), Some("mp4a")));
        assert_eq!(combined.note, "Combined");
        assert_eq!(combined.resolution, "Unknown");
        assert_eq!(combined.filesize, 0);

        let video_only = VideoFormat::from_raw(&raw("137", Some("avc1"), Some("none")));
        assert_eq!(video_only.note, "Video Only");
    }

    #[test]
    fn test_audio_format_defaults() {
        let audio = AudioFormat::from_raw(&raw("140", Some("none"), Some("mp4a")));
        assert_eq!(audio.language, "unk");
        assert_eq!(audio.abr, 0.0);
        assert_eq!(audio.acodec, "mp4a");
    }
}
