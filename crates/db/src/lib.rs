// crates/db/src/lib.rs
// Read-only SQLite access to the clinical-trial metrics store.
#![allow(clippy::too_many_arguments)]

pub mod filter;
pub mod fixtures;
mod queries;
pub mod schema;

pub use filter::WhereClause;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{ConnectOptions, SqlitePool};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Failed to determine cache directory")]
    NoCacheDir,

    #[error("Metrics database not found at {}", .0.display())]
    Missing(PathBuf),

    #[error("Failed to create database directory: {0}")]
    CreateDir(#[from] std::io::Error),
}

pub type DbResult<T> = Result<T, DbError>;

/// Main database handle wrapping a SQLite connection pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    db_path: PathBuf,
}

impl Database {
    /// Open an existing metrics store read-only.
    ///
    /// The store is produced by the external import pipeline; a missing file
    /// is an error rather than an empty database.
    pub async fn open_read_only(path: &Path) -> DbResult<Self> {
        if !path.exists() {
            return Err(DbError::Missing(path.to_owned()));
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
            .read_only(true)
            .busy_timeout(Duration::from_secs(30))
            .log_slow_statements(tracing::log::LevelFilter::Warn, Duration::from_secs(2));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        info!("Metrics database opened read-only at {}", path.display());
        Ok(Self {
            pool,
            db_path: path.to_owned(),
        })
    }

    /// Open (or create) a writable store and apply the schema.
    ///
    /// Used for development databases and demo seeding, never by the
    /// production read path. Rollback journal rather than WAL so the file can
    /// later be opened read-only without a writable `-shm`.
    pub async fn open_writable(path: &Path) -> DbResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Delete)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(30))
            .log_slow_statements(tracing::log::LevelFilter::Warn, Duration::from_secs(2));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        let db = Self {
            pool,
            db_path: path.to_owned(),
        };
        db.apply_schema().await?;

        info!("Metrics database opened writable at {}", path.display());
        Ok(db)
    }

    /// Create an in-memory database with the schema applied (for testing).
    ///
    /// Uses `shared_cache(true)` so all pool connections share the same
    /// in-memory database. Without this, each connection gets its own
    /// separate database and concurrent queries see empty tables.
    pub async fn new_in_memory() -> DbResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?
            .shared_cache(true)
            .busy_timeout(Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;
        let db = Self {
            pool,
            db_path: PathBuf::new(),
        };
        db.apply_schema().await?;
        Ok(db)
    }

    /// Create every table and index the query layer reads. Idempotent.
    pub async fn apply_schema(&self) -> DbResult<()> {
        for statement in schema::STATEMENTS {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Row count per known table. Tables absent from the store are skipped.
    pub async fn table_row_counts(&self) -> DbResult<Vec<(String, u64)>> {
        let existing: Vec<(String,)> =
            sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table'")
                .fetch_all(&self.pool)
                .await?;

        let mut counts = Vec::with_capacity(schema::TABLES.len());
        for table in schema::TABLES {
            if !existing.iter().any(|(name,)| name == table) {
                continue;
            }
            let row: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", table))
                .fetch_one(&self.pool)
                .await?;
            counts.push((table.to_string(), row.0.max(0) as u64));
        }
        Ok(counts)
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get the path to the database file.
    /// Returns an empty path for in-memory databases.
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

/// Returns the default store path: `<cache dir>/trial-view/edc_metrics.db`
pub fn default_db_path() -> DbResult<PathBuf> {
    dirs::cache_dir()
        .map(|dir| dir.join("trial-view").join("edc_metrics.db"))
        .ok_or(DbError::NoCacheDir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_database() {
        let db = Database::new_in_memory()
            .await
            .expect("should create in-memory database");

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM subject_level_metrics")
            .fetch_one(db.pool())
            .await
            .expect("subject_level_metrics table should exist");
        assert_eq!(count.0, 0);

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM subject_dqi_clean_status")
            .fetch_one(db.pool())
            .await
            .expect("subject_dqi_clean_status table should exist");
        assert_eq!(count.0, 0);
    }

    #[tokio::test]
    async fn test_schema_idempotent() {
        let db = Database::new_in_memory()
            .await
            .expect("first open should succeed");

        db.apply_schema()
            .await
            .expect("second schema run should succeed");

        let counts = db.table_row_counts().await.unwrap();
        assert_eq!(counts.len(), schema::TABLES.len());
        assert!(counts.iter().all(|(_, n)| *n == 0));
    }

    #[tokio::test]
    async fn test_read_only_rejects_missing_file() {
        let tmp = tempfile::tempdir().expect("should create temp dir");
        let path = tmp.path().join("absent.db");

        let err = Database::open_read_only(&path).await.unwrap_err();
        assert!(matches!(err, DbError::Missing(p) if p == path));
        assert!(!path.exists(), "read-only open must not create the file");
    }

    #[tokio::test]
    async fn test_read_only_refuses_writes() {
        let tmp = tempfile::tempdir().expect("should create temp dir");
        let path = tmp.path().join("metrics.db");

        let writable = Database::open_writable(&path).await.unwrap();
        writable.pool().close().await;

        let db = Database::open_read_only(&path).await.unwrap();
        let result = sqlx::query(
            "INSERT INTO subject_level_metrics (project_name, site_id, subject_id) VALUES ('P', 'S', 'X')",
        )
        .execute(db.pool())
        .await;
        assert!(result.is_err(), "writes must fail on a read-only handle");
    }

    #[tokio::test]
    async fn test_default_db_path() {
        let path = default_db_path().expect("should resolve default path");
        assert!(path.to_string_lossy().contains("trial-view"));
        assert!(path.to_string_lossy().ends_with("edc_metrics.db"));
    }
}
