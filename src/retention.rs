//! Restart-based cleanup of aged artifacts
//!
//! Runs once per service start, before any download is accepted. Aging is
//! tied to service restarts, not wall-clock time: every live record gains
//! one session of age, and records past the threshold lose their backing
//! file and are flagged deleted. The flag is one-way; a purged record is
//! never re-aged or revived.

use crate::history::HistoryStore;
use crate::utils::MediaForgeError;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info};

pub struct RetentionManager {
    store: Arc<HistoryStore>,
    download_root: PathBuf,
    threshold: u32,
}

impl RetentionManager {
    pub fn new(store: Arc<HistoryStore>, download_root: PathBuf, threshold: u32) -> Self {
        Self {
            store,
            download_root,
            threshold,
        }
    }

    /// Age all live records by one session, then purge the ones at or past
    /// the threshold. Returns how many records were purged.
    pub async fn run(&self) -> Result<usize, MediaForgeError> {
        let aged = self.store.increment_ages().await?;
        debug!("Retention: aged {} records", aged);

        let targets = self.store.purge_candidates(self.threshold).await?;
        let mut purged = 0;

        for (id, filename) in targets {
            let path = self.download_root.join(&filename);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => info!("Cleanup: deleted old file '{}'", filename),
                // Already gone counts as cleaned up
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => error!("Cleanup failed for '{}': {}", filename, e),
            }

            // The record is retired even when the file could not be removed
            self.store.mark_deleted(id).await?;
            purged += 1;
        }

        Ok(purged)
    }
}
