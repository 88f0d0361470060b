//! Service configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings for a MediaForge service instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Directory holding the history database and other service state
    pub data_dir: PathBuf,

    /// Root directory finished artifacts land in
    pub download_root: PathBuf,

    /// Number of service starts an artifact survives before the
    /// retention pass removes it
    pub retention_sessions: u32,

    /// Task records kept in memory before terminal entries are pruned
    pub max_tracked_tasks: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            data_dir: home.join(".mediaforge"),
            download_root: dirs::download_dir()
                .unwrap_or_else(|| PathBuf::from("./downloads"))
                .join("MediaForge"),
            retention_sessions: 3,
            max_tracked_tasks: 512,
        }
    }
}

impl ServiceConfig {
    /// Path of the sqlite history database
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("history.db")
    }

    /// Directory for in-flight stream temp files
    pub fn temp_dir(&self) -> PathBuf {
        self.download_root.join("temp")
    }
}
