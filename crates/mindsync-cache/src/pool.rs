//! SQLite pool for the local mind map store
//!
//! File databases run in WAL mode so readers never wait on the sync engine's
//! writes. In-memory databases live on a single connection, because every
//! SQLite connection opens its own private memory database.

use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use mindsync_core::config::CacheConfig;

use crate::CacheError;

const MAX_FILE_CONNECTIONS: u32 = 5;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Schema migrations, applied in order; each script is idempotent
const MIGRATIONS: &[(&str, &str)] = &[(
    "0001_initial",
    include_str!("migrations/0001_initial.sql"),
)];

/// Shared handle to the local store
#[derive(Clone)]
pub struct DatabasePool {
    pool: SqlitePool,
}

impl DatabasePool {
    /// Opens the database named by the cache section of the config
    pub async fn open(config: &CacheConfig) -> Result<Self, CacheError> {
        Self::new(&config.database_path).await
    }

    /// Opens or creates the database file at `db_path` and migrates it
    pub async fn new(db_path: &Path) -> Result<Self, CacheError> {
        if let Some(dir) = db_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| {
                CacheError::ConnectionFailed(format!("cannot create {}: {e}", dir.display()))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_FILE_CONNECTIONS)
            .connect_with(options)
            .await
            .map_err(|e| {
                CacheError::ConnectionFailed(format!("cannot open {}: {e}", db_path.display()))
            })?;

        let db = Self { pool };
        db.migrate().await?;
        tracing::info!(path = %db_path.display(), "Local store opened");
        Ok(db)
    }

    /// Opens a throwaway in-memory database, mostly for tests
    pub async fn in_memory() -> Result<Self, CacheError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| CacheError::ConnectionFailed(format!("in-memory database: {e}")))?;

        let db = Self { pool };
        db.migrate().await?;
        tracing::debug!("In-memory local store opened");
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Waits for open connections to finish and closes the pool
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn migrate(&self) -> Result<(), CacheError> {
        for (name, script) in MIGRATIONS {
            sqlx::raw_sql(script)
                .execute(&self.pool)
                .await
                .map_err(|e| CacheError::MigrationFailed(format!("{name}: {e}")))?;
            tracing::debug!(migration = name, "Migration applied");
        }
        Ok(())
    }
}
