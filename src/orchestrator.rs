//! Asynchronous task lifecycle management
//!
//! Each submitted download gets a UUID, an entry in the shared task map and
//! its own worker. Workers publish progress into an unbounded channel; a
//! companion drain folds the updates into the entry so pollers always read
//! a consistent snapshot without ever blocking the worker.

use crate::history::HistoryStore;
use crate::plugin::MediaPlugin;
use crate::task::{
    DownloadOutcome, DownloadRequest, StreamProgress, StreamRole, TaskSnapshot, TaskStatus,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, error, info};
use uuid::Uuid;

/// One update published by a worker's reporting path
#[derive(Debug, Clone, Copy)]
pub struct ProgressUpdate {
    pub role: StreamRole,
    pub percent: f64,
    pub speed: f64,
}

/// Cloneable handle workers use to publish progress without blocking
#[derive(Clone)]
pub struct ProgressSender {
    tx: mpsc::UnboundedSender<ProgressUpdate>,
}

impl ProgressSender {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// A sender whose updates go nowhere, for driving the pipeline directly
    pub fn sink() -> Self {
        let (tx, _rx) = mpsc::unbounded_channel();
        Self { tx }
    }

    pub fn report(&self, role: StreamRole, percent: f64, speed: f64) {
        // A dropped receiver just means nobody is listening anymore
        let _ = self.tx.send(ProgressUpdate {
            role,
            percent,
            speed,
        });
    }
}

#[derive(Debug)]
struct TaskEntry {
    status: TaskStatus,
    progress: HashMap<StreamRole, StreamProgress>,
    result: Option<DownloadOutcome>,
    error: Option<String>,
    finished_at: Option<DateTime<Utc>>,
}

impl TaskEntry {
    fn new() -> Self {
        // Both roles start at zero so pollers see a stable shape
        let mut progress = HashMap::new();
        progress.insert(StreamRole::Video, StreamProgress::default());
        progress.insert(StreamRole::Audio, StreamProgress::default());

        Self {
            status: TaskStatus::Pending,
            progress,
            result: None,
            error: None,
            finished_at: None,
        }
    }
}

type TaskMap = HashMap<String, Arc<RwLock<TaskEntry>>>;

/// Owns the in-memory task map and spawns one worker per download
pub struct TaskOrchestrator {
    tasks: Arc<RwLock<TaskMap>>,
    history: Arc<HistoryStore>,
    max_tracked: usize,
}

impl TaskOrchestrator {
    pub fn new(history: Arc<HistoryStore>, max_tracked: usize) -> Self {
        Self {
            tasks: Arc::new(RwLock::new(HashMap::new())),
            history,
            max_tracked: max_tracked.max(1),
        }
    }

    /// Register a task and hand it to a worker. Returns the task id
    /// immediately; nothing here touches the network or the filesystem.
    pub async fn submit(
        &self,
        plugin: Arc<dyn MediaPlugin>,
        request: DownloadRequest,
    ) -> String {
        let task_id = Uuid::new_v4().to_string();
        let entry = Arc::new(RwLock::new(TaskEntry::new()));

        {
            let mut tasks = self.tasks.write().await;
            if tasks.len() >= self.max_tracked {
                prune_terminal(&mut tasks, self.max_tracked).await;
            }
            tasks.insert(task_id.clone(), entry.clone());
        }

        let (progress, mut progress_rx) = ProgressSender::channel();

        // Fold worker updates into the entry; the externally visible percent
        // never moves backwards even if the upstream restarts a fragment
        let monitor_entry = entry.clone();
        tokio::spawn(async move {
            while let Some(update) = progress_rx.recv().await {
                let mut entry = monitor_entry.write().await;
                let slot = entry.progress.entry(update.role).or_default();
                if update.percent >= slot.percent {
                    slot.percent = update.percent;
                }
                slot.speed = update.speed;
            }
        });

        let history = self.history.clone();
        let worker_entry = entry;
        let id = task_id.clone();
        tokio::spawn(async move {
            worker_entry.write().await.status = TaskStatus::Processing;
            info!("Task {} started for {}", id, request.url);

            match plugin.download(&id, &request, progress).await {
                Ok(outcome) => {
                    {
                        let mut entry = worker_entry.write().await;
                        entry.status = TaskStatus::Completed;
                        entry.result = Some(outcome.clone());
                        entry.finished_at = Some(Utc::now());
                    }
                    info!("Task {} completed: {}", id, outcome.filename);

                    let quality = request
                        .quality_label
                        .as_deref()
                        .unwrap_or("Unknown");
                    let language = request.language.as_deref().unwrap_or("Unknown");
                    if let Err(e) = history
                        .insert(
                            &id,
                            &request.url,
                            &outcome.filename,
                            outcome.file_size,
                            quality,
                            language,
                        )
                        .await
                    {
                        // History is ancillary; a failed write never fails
                        // the task
                        error!("History insert failed for task {}: {}", id, e);
                    }
                }
                Err(e) => {
                    let mut entry = worker_entry.write().await;
                    entry.status = TaskStatus::Failed;
                    entry.error = Some(e.to_string());
                    entry.finished_at = Some(Utc::now());
                    error!("Task {} failed: {}", id, e);
                }
            }
        });

        task_id
    }

    /// Consistent point-in-time view of one task
    pub async fn snapshot(&self, task_id: &str) -> Option<TaskSnapshot> {
        let entry = self.tasks.read().await.get(task_id).cloned()?;
        let entry = entry.read().await;
        Some(TaskSnapshot {
            id: task_id.to_string(),
            status: entry.status,
            progress: entry.progress.clone(),
            result: entry.result.clone(),
            error: entry.error.clone(),
        })
    }

    /// Number of tasks currently tracked, terminal entries included
    pub async fn task_count(&self) -> usize {
        self.tasks.read().await.len()
    }
}

/// Drop the oldest terminal entries until the map has room again.
/// In-flight tasks are never touched.
async fn prune_terminal(tasks: &mut TaskMap, cap: usize) {
    let mut finished: Vec<(String, DateTime<Utc>)> = Vec::new();
    for (id, entry) in tasks.iter() {
        let entry = entry.read().await;
        if entry.status.is_terminal() {
            finished.push((id.clone(), entry.finished_at.unwrap_or_else(Utc::now)));
        }
    }

    finished.sort_by_key(|(_, at)| *at);
    let overflow = (tasks.len() + 1).saturating_sub(cap);
    for (id, _) in finished.into_iter().take(overflow) {
        tasks.remove(&id);
        debug!("Evicted finished task {}", id);
    }
}
