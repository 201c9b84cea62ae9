use hub_runtime::{
    AgentChatService, DatabaseConfig, DatabaseManager, OpenAiProvider, Settings, UserOps,
};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting PlaygroundHub runtime v{}...", hub_runtime::RUNTIME_VERSION);

    let settings = Settings::from_env();
    settings.validate()?;

    // A store that fails to initialize is fatal; nothing may run against a
    // half-initialized schema.
    let database = DatabaseManager::new(DatabaseConfig::from_settings(&settings));
    database.initialize().await?;

    let pool = database.pool().await?;
    if let Some(admin_id) = UserOps::ensure_admin(&pool, &settings).await? {
        info!(admin_id, "Bootstrap admin created");
    }

    if settings.openai_api_key.is_empty() {
        warn!("OPENAI_API_KEY not configured; chat turns and summaries are unavailable");
    } else {
        let provider = Arc::new(OpenAiProvider::new(&settings.openai_api_key)?);
        let _chat_service = AgentChatService::new(provider, settings.clone());
        info!("Agent chat service ready");
    }

    info!("PlaygroundHub runtime initialized; hand the pool to the presentation layer");

    database.shutdown().await;
    Ok(())
}
