//! MediaForge library
//!
//! Download orchestration for a local media service: capability-based
//! extractor plugins, an async task lifecycle, a stream-pair
//! download-and-mux pipeline and restart-based artifact retention.

pub mod fetcher;
pub mod history;
pub mod orchestrator;
pub mod pipeline;
pub mod plugin;
pub mod retention;
pub mod service;
pub mod task;
pub mod utils;

// Re-export main types for easier use
pub use fetcher::{FetchProgress, MediaFetcher, OnProgress, ProbeReport, RawFormat, YtDlpFetcher};
pub use history::{HistoryRecord, HistoryStore};
pub use orchestrator::{ProgressSender, TaskOrchestrator};
pub use pipeline::{FfmpegMuxer, StreamMuxer};
pub use plugin::{
    builtin_plugins, MediaInfo, MediaPlugin, PluginBuilder, PluginContext, PluginRegistry,
};
pub use retention::RetentionManager;
pub use service::MediaService;
pub use task::{DownloadOutcome, DownloadRequest, StreamRole, TaskSnapshot, TaskStatus};
pub use utils::{sanitize_filename, MediaForgeError, ServiceConfig};
