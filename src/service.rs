//! Service facade
//!
//! Ties the registry, orchestrator, history store and retention manager
//! together and exposes the operations a request layer would call: probe,
//! submit, poll, history. Startup order matters: storage first, then the
//! retention pass, then plugins, so downloads are only accepted once the
//! retention pass has finished.

use crate::fetcher::{MediaFetcher, YtDlpFetcher};
use crate::history::{self, HistoryRecord, HistoryStore};
use crate::orchestrator::TaskOrchestrator;
use crate::pipeline::{FfmpegMuxer, StreamMuxer};
use crate::plugin::{builtin_plugins, MediaInfo, PluginBuilder, PluginContext, PluginRegistry};
use crate::retention::RetentionManager;
use crate::task::{DownloadRequest, TaskSnapshot};
use crate::utils::{MediaForgeError, ServiceConfig};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

pub struct MediaService {
    config: ServiceConfig,
    registry: PluginRegistry,
    orchestrator: TaskOrchestrator,
    history: Arc<HistoryStore>,
}

impl MediaService {
    /// Boot with the host's yt-dlp and ffmpeg and the built-in handlers
    pub async fn start(config: ServiceConfig) -> Result<Self, MediaForgeError> {
        let fetcher: Arc<dyn MediaFetcher> = Arc::new(YtDlpFetcher::discover());
        let muxer: Arc<dyn StreamMuxer> = Arc::new(FfmpegMuxer::discover());
        Self::start_with(config, fetcher, muxer, &builtin_plugins()).await
    }

    /// Boot with explicit fetcher/muxer handles and a custom handler list
    pub async fn start_with(
        config: ServiceConfig,
        fetcher: Arc<dyn MediaFetcher>,
        muxer: Arc<dyn StreamMuxer>,
        builders: &[PluginBuilder],
    ) -> Result<Self, MediaForgeError> {
        tokio::fs::create_dir_all(&config.data_dir).await?;
        tokio::fs::create_dir_all(&config.download_root).await?;

        let pool = history::initialize_database(&config.db_path().to_string_lossy()).await?;
        let history = Arc::new(HistoryStore::new(pool));

        // One retention pass per service start, before any task can run
        let retention = RetentionManager::new(
            history.clone(),
            config.download_root.clone(),
            config.retention_sessions,
        );
        match retention.run().await {
            Ok(purged) if purged > 0 => info!("Retention purged {} artifacts", purged),
            Ok(_) => {}
            // Cleanup trouble is logged, never fatal to startup
            Err(e) => error!("Auto cleanup error: {}", e),
        }

        let ctx = PluginContext {
            download_root: config.download_root.clone(),
            fetcher,
            muxer,
        };
        let registry = PluginRegistry::load(&ctx, builders);
        info!("Service ready with {} plugins", registry.len());

        let orchestrator = TaskOrchestrator::new(history.clone(), config.max_tracked_tasks);

        Ok(Self {
            config,
            registry,
            orchestrator,
            history,
        })
    }

    /// Probe a URL with the highest-priority matching handler
    pub async fn probe(&self, url: &str) -> Result<MediaInfo, MediaForgeError> {
        let plugin = self
            .registry
            .find_for_url(url)
            .ok_or_else(|| MediaForgeError::UnsupportedUrl(url.to_string()))?;
        plugin.extract_info(url).await
    }

    /// Start a download task. Returns the task id immediately; an
    /// unsupported URL is rejected before any task exists.
    pub async fn submit_download(
        &self,
        request: DownloadRequest,
    ) -> Result<String, MediaForgeError> {
        let plugin = self
            .registry
            .find_for_url(&request.url)
            .ok_or_else(|| MediaForgeError::UnsupportedUrl(request.url.clone()))?;
        Ok(self.orchestrator.submit(plugin, request).await)
    }

    /// Poll one task's current state
    pub async fn task_snapshot(&self, task_id: &str) -> Option<TaskSnapshot> {
        self.orchestrator.snapshot(task_id).await
    }

    /// Tasks currently tracked in memory
    pub async fn task_count(&self) -> usize {
        self.orchestrator.task_count().await
    }

    /// Recent download history, newest first
    pub async fn history(&self, limit: u32) -> Result<Vec<HistoryRecord>, MediaForgeError> {
        self.history.list_recent(limit).await
    }

    pub fn download_root(&self) -> &Path {
        &self.config.download_root
    }

    pub fn plugin_count(&self) -> usize {
        self.registry.len()
    }
}
