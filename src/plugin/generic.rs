//! Catch-all handler backed entirely by the extraction library
//!
//! Matches every URL at the lowest priority. Pair selections are delegated
//! to the library's own `"+"` mux support, so this handler always takes the
//! pipeline's single-fetch path.

use crate::orchestrator::ProgressSender;
use crate::pipeline;
use crate::plugin::{AudioFormat, MediaInfo, MediaPlugin, PluginContext, VideoFormat};
use crate::task::{DownloadOutcome, DownloadRequest};
use crate::utils::MediaForgeError;
use async_trait::async_trait;
use std::sync::Arc;

const MAX_VIDEO_FORMATS: usize = 20;
const MAX_AUDIO_FORMATS: usize = 10;

pub struct GenericPlugin {
    ctx: PluginContext,
}

impl GenericPlugin {
    pub fn build(ctx: &PluginContext) -> Result<Arc<dyn MediaPlugin>, MediaForgeError> {
        Ok(Arc::new(Self { ctx: ctx.clone() }))
    }
}

#[async_trait]
impl MediaPlugin for GenericPlugin {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn priority(&self) -> i32 {
        1
    }

    fn can_handle(&self, _url: &str) -> bool {
        true
    }

    async fn extract_info(&self, url: &str) -> Result<MediaInfo, MediaForgeError> {
        let report = self.ctx.fetcher.probe(url).await?;

        let mut video_formats = Vec::new();
        let mut audio_formats = Vec::new();
        for raw in &report.formats {
            if raw.has_video() {
                video_formats.push(VideoFormat::from_raw(raw));
            } else if raw.has_audio() {
                audio_formats.push(AudioFormat::from_raw(raw));
            }
        }

        if video_formats.is_empty() && audio_formats.is_empty() {
            return Err(MediaForgeError::Extraction(format!(
                "no downloadable formats found for {}",
                url
            )));
        }

        video_formats.truncate(MAX_VIDEO_FORMATS);
        audio_formats.truncate(MAX_AUDIO_FORMATS);

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
        let selector = match &request.audio_format {
            Some(audio) => format!("{}+{}", request.video_format, audio),
            None => request.video_format.clone(),
        };

        pipeline::fetch_single(
            self.ctx.fetcher.as_ref(),
            &self.ctx.download_root,
            task_id,
            &request.url,
            &selector,
            request.title.as_deref(),
            progress,
        )
        .await
    }
}
