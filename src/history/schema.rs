//! History database schema

use crate::utils::MediaForgeError;
use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Pool, Sqlite};
use tracing::debug;

/// Initialize the history database, creating it and its tables on first use
pub async fn initialize_database(db_path: &str) -> Result<Pool<Sqlite>, MediaForgeError> {
    if !Sqlite::database_exists(db_path).await? {
        debug!("Creating history database at: {}", db_path);
        Sqlite::create_database(db_path).await?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(db_path)
        .await?;

    create_tables(&pool).await?;
    Ok(pool)
}

async fn create_tables(pool: &Pool<Sqlite>) -> Result<(), MediaForgeError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS downloads (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            task_id TEXT NOT NULL,
            url TEXT,
            filename TEXT NOT NULL,
            file_size INTEGER,
            timestamp DATETIME DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Additive migrations; each ALTER fails harmlessly once the column
    // exists
    for statement in [
        "ALTER TABLE downloads ADD COLUMN quality TEXT",
        "ALTER TABLE downloads ADD COLUMN language TEXT",
        "ALTER TABLE downloads ADD COLUMN sessions_old INTEGER DEFAULT 0",
        "ALTER TABLE downloads ADD COLUMN deleted INTEGER DEFAULT 0",
    ] {
        let _ = sqlx::query(statement).execute(pool).await;
    }

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_downloads_deleted ON downloads(deleted)")
        .execute(pool)
        .await?;

    debug!("History tables ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_initialize_twice_is_harmless() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("history.db");
        let db_path = db_path.to_string_lossy();

        let pool = initialize_database(&db_path).await.unwrap();
        drop(pool);

        // Second boot re-runs the migrations against the existing file
        let pool = initialize_database(&db_path).await.unwrap();
        sqlx::query("SELECT quality, language, sessions_old, deleted FROM downloads")
            .fetch_all(&pool)
            .await
            .unwrap();
    }
}
