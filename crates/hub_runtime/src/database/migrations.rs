// Schema Migrations for PlaygroundHub
// Converges an existing store on the canonical schema instead of replaying a
// versioned chain; every structural change applied is logged and recorded

use crate::database::{now_ts, schema};
use crate::errors::{ErrorCategory, ErrorCode, ErrorSeverity, HubError, HubResult};
use sqlx::SqlitePool;

/// Bring the store up to the canonical schema. Idempotent: a second run on an
/// up-to-date store performs no structural change and records nothing.
pub async fn ensure_schema(pool: &SqlitePool) -> HubResult<()> {
    create_migrations_table(pool).await?;

    // Must run before CREATE TABLE IF NOT EXISTS recreates the table in the
    // chat-scoped shape.
    drop_legacy_flat_messages(pool).await?;

    sqlx::raw_sql(schema::TABLES)
        .execute(pool)
        .await
        .map_err(|e| migration_error(&format!("Failed to create tables: {}", e)))?;

    add_missing_columns(pool).await?;

    // Indexes last: they may reference columns the upgrade just added.
    sqlx::raw_sql(schema::INDEXES)
        .execute(pool)
        .await
        .map_err(|e| migration_error(&format!("Failed to create indexes: {}", e)))?;

    Ok(())
}

/// Structural-change log. Not a gate: the schema converges by inspection, and
/// this table exists so operators can see which steps actually ran.
async fn create_migrations_table(pool: &SqlitePool) -> HubResult<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            description TEXT NOT NULL,
            applied_at INTEGER NOT NULL
        )
    "#,
    )
    .execute(pool)
    .await
    .map_err(|e| migration_error(&format!("Failed to create migrations table: {}", e)))?;

    Ok(())
}

/// Detect the pre-chat-session message table (user_id/agent_id directly on
/// messages) and drop it. This migration is destructive by design: chat
/// groupings cannot be reconstructed from the flat shape, so flat-shape
/// history is discarded. The step is logged and recorded for operators.
async fn drop_legacy_flat_messages(pool: &SqlitePool) -> HubResult<()> {
    let columns = table_columns(pool, "chat_messages").await?;
    if columns.is_empty() {
        return Ok(());
    }

    let is_flat = columns.iter().any(|c| c == "user_id" || c == "agent_id");
    if !is_flat {
        return Ok(());
    }

    tracing::warn!(
        "Legacy flat chat_messages table detected; dropping it and recreating the \
         chat-scoped shape. Message history stored in the flat shape is discarded."
    );

    sqlx::query("DROP TABLE chat_messages")
        .execute(pool)
        .await
        .map_err(|e| migration_error(&format!("Failed to drop legacy chat_messages: {}", e)))?;

    record_step(pool, "drop legacy flat chat_messages table (flat-shape history discarded)").await
}

/// Add any column missing from an existing table, with a safe default, so
/// upgrading from an older schema never loses data.
async fn add_missing_columns(pool: &SqlitePool) -> HubResult<()> {
    let mut cached_table = String::new();
    let mut cached_columns: Vec<String> = Vec::new();

    for &(table, column, alter_sql) in schema::COLUMN_UPGRADES {
        if cached_table != table {
            cached_columns = table_columns(pool, table).await?;
            cached_table = table.to_string();
        }
        if cached_columns.iter().any(|c| c == column) {
            continue;
        }

        tracing::info!(table, column, "Adding missing column");
        sqlx::query(alter_sql)
            .execute(pool)
            .await
            .map_err(|e| {
                migration_error(&format!("Failed to add {}.{}: {}", table, column, e))
            })?;

        // Backfill so existing chats keep a sensible recency ordering.
        if table == "chats" && column == "updated_at" {
            sqlx::query("UPDATE chats SET updated_at = created_at WHERE updated_at = 0")
                .execute(pool)
                .await
                .map_err(|e| migration_error(&format!("Failed to backfill chats.updated_at: {}", e)))?;
        }

        record_step(pool, &format!("add column {}.{}", table, column)).await?;
        cached_columns.push(column.to_string());
    }

    Ok(())
}

/// Actual columns of a table; empty when the table does not exist.
/// PRAGMA cannot take bound parameters, so the table name is interpolated —
/// callers only pass compile-time table names.
pub async fn table_columns(pool: &SqlitePool, table: &str) -> HubResult<Vec<String>> {
    let query = format!("PRAGMA table_info({})", table);
    let rows: Vec<(i64, String, String, i64, Option<String>, i64)> = sqlx::query_as(&query)
        .fetch_all(pool)
        .await
        .map_err(|e| migration_error(&format!("Failed to inspect {}: {}", table, e)))?;

    Ok(rows.into_iter().map(|(_, name, ..)| name).collect())
}

async fn record_step(pool: &SqlitePool, description: &str) -> HubResult<()> {
    sqlx::query("INSERT INTO _migrations (description, applied_at) VALUES (?, ?)")
        .bind(description)
        .bind(now_ts())
        .execute(pool)
        .await
        .map_err(|e| migration_error(&format!("Failed to record migration step: {}", e)))?;
    Ok(())
}

/// Structural-change history, oldest first.
pub async fn migration_history(pool: &SqlitePool) -> HubResult<Vec<(String, i64)>> {
    sqlx::query_as("SELECT description, applied_at FROM _migrations ORDER BY id")
        .fetch_all(pool)
        .await
        .map_err(|e| migration_error(&format!("Failed to read migration history: {}", e)))
}

fn migration_error(message: &str) -> HubError {
    HubError::new(
        ErrorCode::MigrationFailed,
        ErrorCategory::Storage,
        ErrorSeverity::Critical,
        message,
    )
}
