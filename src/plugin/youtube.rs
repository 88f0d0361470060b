//! YouTube handler
//!
//! Presents video-only and audio-only streams separately and muxes the
//! chosen pair locally, which keeps the stream selection explicit instead
//! of leaning on the extraction library's combined formats.

use crate::orchestrator::ProgressSender;
use crate::pipeline;
use crate::plugin::{AudioFormat, MediaInfo, MediaPlugin, PluginContext, VideoFormat};
use crate::task::{DownloadOutcome, DownloadRequest};
use crate::utils::MediaForgeError;
use async_trait::async_trait;
use std::sync::Arc;

const MAX_VIDEO_FORMATS: usize = 10;
const MAX_AUDIO_FORMATS: usize = 5;

pub struct YoutubePlugin {
    ctx: PluginContext,
}

impl YoutubePlugin {
    pub fn build(ctx: &PluginContext) -> Result<Arc<dyn MediaPlugin>, MediaForgeError> {
        Ok(Arc::new(Self { ctx: ctx.clone() }))
    }
}

#[async_trait]
impl MediaPlugin for YoutubePlugin {
    fn name(&self) -> &'static str {
        "youtube"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn can_handle(&self, url: &str) -> bool {
        url.contains("youtube.com") || url.contains("youtu.be")
    }

    async fn extract_info(&self, url: &str) -> Result<MediaInfo, MediaForgeError> {
        let report = self.ctx.fetcher.probe(url).await?;

        let video_formats: Vec<VideoFormat> = report
            .formats
            .iter()
            .filter(|f| f.has_video() && !f.has_audio())
            .map(VideoFormat::from_raw)
            .take(MAX_VIDEO_FORMATS)
            .collect();

        let audio_formats: Vec<AudioFormat> = report
            .formats
            .iter()
            .filter(|f| f.has_audio() && !f.has_video())
            .map(AudioFormat::from_raw)
            .take(MAX_AUDIO_FORMATS)
            .collect();

        if video_formats.is_empty() && audio_formats.is_empty() {
            return Err(MediaForgeError::Extraction(format!(
                "no downloadable formats found for {}",
                url
            )));
        }

        Ok(MediaInfo {
            title: report.title,
            thumbnail: report.thumbnail,
            duration: report.duration,
            video_formats,
            audio_formats,
        })
    }

    async fn download(
        &self,
        task_id: &str,
        request: &DownloadRequest,
        progress: ProgressSender,
    ) -> Result<DownloadOutcome, MediaForgeError> {
        match &request.audio_format {
            Some(audio_selector) => {
                pipeline::fetch_pair(
                    self.ctx.fetcher.as_ref(),
                    self.ctx.muxer.as_ref(),
                    &self.ctx.download_root,
                    task_id,
                    &request.url,
                    &request.video_format,
                    audio_selector,
                    request.title.as_deref(),
                    progress,
                )
                .await
            }
            None => {
                pipeline::fetch_single(
                    self.ctx.fetcher.as_ref(),
                    &self.ctx.download_root,
                    task_id,
                    &request.url,
                    &request.video_format,
                    request.title.as_deref(),
                    progress,
                )
                .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::{MediaFetcher, OnProgress, ProbeReport, RawFormat};
    use crate::pipeline::StreamMuxer;
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};

    struct CannedFetcher {
        report: ProbeReport,
    }

    #[async_trait]
    impl MediaFetcher for CannedFetcher {
        async fn probe(&self, _url: &str) -> Result<ProbeReport, MediaForgeError> {
            Ok(self.report.clone())
        }

        async fn fetch(
            &self,
            _url: &str,
            _selector: &str,
            dest: &Path,
            _on_progress: &OnProgress,
        ) -> Result<(), MediaForgeError> {
            tokio::fs::write(dest, b"bytes").await?;
            Ok(())
        }
    }

    struct NullMuxer;

    #[async_trait]
    impl StreamMuxer for NullMuxer {
        async fn mux(
            &self,
            _video: &Path,
            _audio: &Path,
            _output: &Path,
        ) -> Result<(), MediaForgeError> {
            Ok(())
        }
    }

    fn raw(format_id: &str, vcodec: &str, acodec: &str) -> RawFormat {
        RawFormat {
            format_id: format_id.to_string(),
            ext: "mp4".to_string(),
            vcodec: Some(vcodec.to_string()),
            acodec: Some(acodec.to_string()),
            resolution: None,
            abr: None,
            filesize: None,
            language: None,
        }
    }

    fn plugin_with(report: ProbeReport) -> Arc<dyn MediaPlugin> {
        let ctx = PluginContext {
            download_root: PathBuf::from("/tmp/forge-test"),
            fetcher: Arc::new(CannedFetcher { report }),
            muxer: Arc::new(NullMuxer),
        };
        YoutubePlugin::build(&ctx).unwrap()
    }

    #[test]
    fn test_can_handle_youtube_urls_only() {
        let plugin = plugin_with(ProbeReport::default());
        assert!(plugin.can_handle("https://www.youtube.com/watch?v=abc"));
        assert!(plugin.can_handle("https://youtu.be/abc"));
        assert!(!plugin.can_handle("https://vimeo.com/12345"));
    }

    #[tokio::test]
    async fn test_extract_info_excludes_combined_formats() {
        let plugin = plugin_with(ProbeReport {
            title: Some("split".to_string()),
            thumbnail: None,
            duration: None,
            formats: vec![
                raw("22", "avc1", "mp4a"),  // combined: not listed here
                raw("137", "avc1", "none"), // video only
                raw("140", "none", "mp4a"), // audio only
            ],
        });

        let info = plugin
            .extract_info("https://youtube.com/watch?v=abc")
            .await
            .unwrap();

        assert_eq!(info.video_formats.len(), 1);
        assert_eq!(info.video_formats[0].format_id, "137");
        assert_eq!(info.audio_formats.len(), 1);
        assert_eq!(info.audio_formats[0].format_id, "140");
    }

    #[tokio::test]
    async fn test_extract_info_caps_are_tighter_than_generic() {
        let mut formats = Vec::new();
        for i in 0..15 {
            formats.push(raw(&format!("v{}", i), "vp9", "none"));
        }
        for i in 0..8 {
            formats.push(raw(&format!("a{}", i), "none", "opus"));
        }

        let plugin = plugin_with(ProbeReport {
            title: None,
            thumbnail: None,
            duration: None,
            formats,
        });

        let info = plugin
            .extract_info("https://youtube.com/watch?v=abc")
            .await
            .unwrap();

        assert_eq!(info.video_formats.len(), 10);
        assert_eq!(info.audio_formats.len(), 5);
    }
}
