//! Error handling for MediaForge

use thiserror::Error;

/// Main error type for MediaForge
#[derive(Debug, Error)]
pub enum MediaForgeError {
    #[error("No supported plugin found for URL: {0}")]
    UnsupportedUrl(String),

    #[error("Failed to extract media info: {0}")]
    Extraction(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Plugin '{plugin}' failed to load: {message}")]
    PluginLoad {
        plugin: &'static str,
        message: String,
    },

    #[error("History store error: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
