// Shared helpers for integration tests
#![allow(dead_code)]

use hub_runtime::database::migrations;
use hub_runtime::{NewAgent, Role, Settings, UserOps};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

/// Fresh in-memory store with the full schema applied. A single connection
/// keeps every query on the same in-memory database.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    migrations::ensure_schema(&pool).await.expect("schema");
    pool
}

pub fn test_settings() -> Settings {
    Settings::default()
}

pub async fn seed_user(pool: &SqlitePool, email: &str) -> i64 {
    UserOps::create_user(pool, email, "pw123456", Role::User, true)
        .await
        .expect("seed user")
}

pub fn sample_agent() -> NewAgent {
    NewAgent {
        name: "Agent A".to_string(),
        description: Some("Desc A".to_string()),
        model: "gpt-4o-mini".to_string(),
        max_tokens: Some(256),
        temperature: Some(0.7),
        system_prompt: Some("Prompt A".to_string()),
    }
}
