// Database Module for PlaygroundHub
// Single-file SQLite store holding accounts, agents, chats and the audit trail

use crate::config::Settings;
use crate::errors::{ErrorCategory, ErrorCode, ErrorSeverity, HubError, HubResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

pub mod agents;
pub mod chats;
pub mod compliance;
pub mod migrations;
pub mod schema;
pub mod users;

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub db_path: PathBuf,
    pub enable_wal_mode: bool,
    pub busy_timeout_seconds: u64,
    pub auto_vacuum: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("data/app.db"),
            enable_wal_mode: true,
            busy_timeout_seconds: 30,
            auto_vacuum: true,
        }
    }
}

impl DatabaseConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            db_path: settings.db_path.clone(),
            ..Default::default()
        }
    }
}

/// Owns the connection pool and the schema lifecycle. Constructed once per
/// process and passed by reference; repositories take `&SqlitePool`.
pub struct DatabaseManager {
    config: DatabaseConfig,
    pool: Arc<RwLock<Option<sqlx::SqlitePool>>>,
}

impl DatabaseManager {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            pool: Arc::new(RwLock::new(None)),
        }
    }

    /// Initialize the store: create the parent directory, open the pool and
    /// bring the schema up to date. Any failure here is fatal; the process
    /// must not run against a half-initialized store.
    pub async fn initialize(&self) -> HubResult<()> {
        self.create_parent_directory().await?;

        let pool = Self::create_pool(&self.config).await?;
        migrations::ensure_schema(&pool).await?;

        {
            let mut slot = self.pool.write().await;
            *slot = Some(pool);
        }

        tracing::info!(db_path = %self.config.db_path.display(), "Database initialized");
        Ok(())
    }

    async fn create_parent_directory(&self) -> HubResult<()> {
        if let Some(parent) = self.config.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    HubError::new(
                        ErrorCode::InitializationFailed,
                        ErrorCategory::System,
                        ErrorSeverity::Critical,
                        &format!("Failed to create database directory: {}", e),
                    )
                })?;
            }
        }
        Ok(())
    }

    /// Get the connection pool. Errors until `initialize` has completed.
    pub async fn pool(&self) -> HubResult<sqlx::SqlitePool> {
        let slot = self.pool.read().await;
        slot.as_ref().cloned().ok_or_else(|| {
            HubError::new(
                ErrorCode::InitializationFailed,
                ErrorCategory::Storage,
                ErrorSeverity::Critical,
                "Database not initialized",
            )
        })
    }

    /// Create a new SQLite connection pool
    async fn create_pool(config: &DatabaseConfig) -> HubResult<sqlx::SqlitePool> {
        let mut options = sqlx::sqlite::SqliteConnectOptions::new()
            .filename(Path::new(&config.db_path))
            .create_if_missing(true);

        if config.enable_wal_mode {
            options = options.journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);
        }

        if config.auto_vacuum {
            options = options.auto_vacuum(sqlx::sqlite::SqliteAutoVacuum::Incremental);
        }

        options = options
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(config.busy_timeout_seconds));

        sqlx::SqlitePool::connect_with(options).await.map_err(|e| {
            HubError::new(
                ErrorCode::DatabaseError,
                ErrorCategory::Storage,
                ErrorSeverity::Critical,
                &format!("Failed to create database pool: {}", e),
            )
        })
    }

    /// Close the pool
    pub async fn shutdown(&self) {
        let mut slot = self.pool.write().await;
        if let Some(pool) = slot.take() {
            pool.close().await;
        }
        tracing::info!("Database shutdown complete");
    }
}

/// Current epoch timestamp used by every repository write.
pub(crate) fn now_ts() -> i64 {
    chrono::Utc::now().timestamp()
}
