//! History store operations

use crate::utils::MediaForgeError;
use chrono::NaiveDateTime;
use sqlx::{Pool, Row, Sqlite};
use tracing::debug;

/// One row of download history
#[derive(Debug, Clone)]
pub struct HistoryRecord {
    pub id: i64,
    pub task_id: String,
    pub url: Option<String>,
    pub filename: String,
    pub file_size: Option<i64>,
    pub quality: Option<String>,
    pub language: Option<String>,
    pub timestamp: Option<NaiveDateTime>,
    pub sessions_old: i64,
    pub deleted: bool,
}

/// sqlite-backed download history
pub struct HistoryStore {
    pool: Pool<Sqlite>,
}

impl HistoryStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Append a completed download
    pub async fn insert(
        &self,
        task_id: &str,
        url: &str,
        filename: &str,
        file_size: u64,
        quality: &str,
        language: &str,
    ) -> Result<(), MediaForgeError> {
        sqlx::query(
            r#"
            INSERT INTO downloads
            (task_id, url, filename, file_size, quality, language, sessions_old, deleted)
            VALUES (?, ?, ?, ?, ?, ?, 0, 0)
            "#,
        )
        .bind(task_id)
        .bind(url)
        .bind(filename)
        .bind(file_size as i64)
        .bind(quality)
        .bind(language)
        .execute(&self.pool)
        .await?;

        debug!("Logged download '{}' for task {}", filename, task_id);
        Ok(())
    }

    /// Most recent downloads first
    pub async fn list_recent(&self, limit: u32) -> Result<Vec<HistoryRecord>, MediaForgeError> {
        let rows = sqlx::query(
            "SELECT * FROM downloads ORDER BY timestamp DESC, id DESC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_into_record).collect()
    }

    /// Age every record that has not been purged yet; returns how many
    /// were touched
    pub async fn increment_ages(&self) -> Result<u64, MediaForgeError> {
        let result =
            sqlx::query("UPDATE downloads SET sessions_old = sessions_old + 1 WHERE deleted = 0")
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }

    /// Records old enough to purge, as (row id, filename) pairs
    pub async fn purge_candidates(
        &self,
        threshold: u32,
    ) -> Result<Vec<(i64, String)>, MediaForgeError> {
        let rows = sqlx::query(
            "SELECT id, filename FROM downloads WHERE sessions_old >= ? AND deleted = 0",
        )
        .bind(threshold as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.get("id"), row.get("filename")))
            .collect())
    }

    /// One-way transition; a purged record is never aged or purged again
    pub async fn mark_deleted(&self, id: i64) -> Result<(), MediaForgeError> {
        sqlx::query("UPDATE downloads SET deleted = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn row_into_record(row: sqlx::sqlite::SqliteRow) -> Result<HistoryRecord, MediaForgeError> {
    Ok(HistoryRecord {
        id: row.get("id"),
        task_id: row.get("task_id"),
        url: row.get("url"),
        filename: row.get("filename"),
        file_size: row.get("file_size"),
        quality: row.get("quality"),
        language: row.get("language"),
        timestamp: row.get("timestamp"),
        sessions_old: row.get("sessions_old"),
        deleted: row.get::<i64, _>("deleted") != 0,
    })
}
