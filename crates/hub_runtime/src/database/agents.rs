// Agent Database Operations
// Every read and write is scoped by (id, user_id); one tenant can never
// observe or mutate another tenant's agents

use crate::config::Settings;
use crate::database::now_ts;
use crate::errors::{HubError, HubResult};
use serde::{Deserialize, Serialize};

/// Agent configuration record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRecord {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub model: String,
    pub max_tokens: i64,
    pub temperature: f64,
    pub system_prompt: Option<String>,
    pub created_at: i64,
}

/// Fields for a new agent. Omitted numbers take the configured defaults.
#[derive(Debug, Clone)]
pub struct NewAgent {
    pub name: String,
    pub description: Option<String>,
    pub model: String,
    pub max_tokens: Option<i64>,
    pub temperature: Option<f64>,
    pub system_prompt: Option<String>,
}

/// Partial agent edit; only supplied fields are changed.
#[derive(Debug, Clone, Default)]
pub struct AgentUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<i64>,
    pub temperature: Option<f64>,
    pub system_prompt: Option<String>,
}

type AgentRow = (i64, i64, String, Option<String>, String, i64, f64, Option<String>, i64);

fn row_to_record(row: AgentRow) -> AgentRecord {
    AgentRecord {
        id: row.0,
        user_id: row.1,
        name: row.2,
        description: row.3,
        model: row.4,
        max_tokens: row.5,
        temperature: row.6,
        system_prompt: row.7,
        created_at: row.8,
    }
}

const SELECT_AGENT: &str = "SELECT id, user_id, name, description, model, max_tokens, temperature, system_prompt, created_at FROM agents";

fn validate_max_tokens(max_tokens: i64) -> HubResult<()> {
    if max_tokens <= 0 {
        return Err(HubError::validation("max_tokens must be greater than zero"));
    }
    Ok(())
}

fn validate_temperature(temperature: f64) -> HubResult<()> {
    if !temperature.is_finite() || !(0.0..=1.0).contains(&temperature) {
        return Err(HubError::validation("temperature must be between 0.0 and 1.0"));
    }
    Ok(())
}

/// Database operations for agents
pub struct AgentOps;

impl AgentOps {
    /// Create an agent for `user_id`. Missing temperature/max_tokens fall
    /// back to the global configuration defaults.
    pub async fn create_agent(
        pool: &sqlx::SqlitePool,
        user_id: i64,
        agent: &NewAgent,
        settings: &Settings,
    ) -> HubResult<i64> {
        if agent.name.trim().is_empty() {
            return Err(HubError::validation("Agent name must not be empty"));
        }
        if agent.model.trim().is_empty() {
            return Err(HubError::validation("Agent model must not be empty"));
        }

        let max_tokens = agent.max_tokens.unwrap_or_else(|| settings.default_agent_max_tokens());
        let temperature = agent.temperature.unwrap_or(settings.default_temperature);
        validate_max_tokens(max_tokens)?;
        validate_temperature(temperature)?;

        let result = sqlx::query(
            r#"
            INSERT INTO agents (user_id, name, description, model, max_tokens, temperature, system_prompt, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        )
        .bind(user_id)
        .bind(agent.name.trim())
        .bind(&agent.description)
        .bind(agent.model.trim())
        .bind(max_tokens)
        .bind(temperature)
        .bind(&agent.system_prompt)
        .bind(now_ts())
        .execute(pool)
        .await
        .map_err(|e| HubError::database_error(&format!("Failed to create agent: {}", e)))?;

        Ok(result.last_insert_rowid())
    }

    /// Agents owned by `user_id`, in creation order.
    pub async fn list_agents(pool: &sqlx::SqlitePool, user_id: i64) -> HubResult<Vec<AgentRecord>> {
        let rows: Vec<AgentRow> =
            sqlx::query_as(&format!("{} WHERE user_id = ? ORDER BY id", SELECT_AGENT))
                .bind(user_id)
                .fetch_all(pool)
                .await
                .map_err(|e| HubError::database_error(&format!("Failed to list agents: {}", e)))?;

        Ok(rows.into_iter().map(row_to_record).collect())
    }

    /// Ownership-scoped fetch. A non-owner lookup returns None, exactly like
    /// a missing agent, so existence never leaks across tenants.
    pub async fn get_agent(
        pool: &sqlx::SqlitePool,
        agent_id: i64,
        user_id: i64,
    ) -> HubResult<Option<AgentRecord>> {
        let row: Option<AgentRow> =
            sqlx::query_as(&format!("{} WHERE id = ? AND user_id = ?", SELECT_AGENT))
                .bind(agent_id)
                .bind(user_id)
                .fetch_optional(pool)
                .await
                .map_err(|e| HubError::database_error(&format!("Failed to get agent: {}", e)))?;

        Ok(row.map(row_to_record))
    }

    /// Partial, ownership-scoped update. Supplied numbers are validated; a
    /// non-owner update matches no row and mutates nothing.
    pub async fn update_agent(
        pool: &sqlx::SqlitePool,
        agent_id: i64,
        user_id: i64,
        update: &AgentUpdate,
    ) -> HubResult<()> {
        if let Some(max_tokens) = update.max_tokens {
            validate_max_tokens(max_tokens)?;
        }
        if let Some(temperature) = update.temperature {
            validate_temperature(temperature)?;
        }
        if let Some(name) = &update.name {
            if name.trim().is_empty() {
                return Err(HubError::validation("Agent name must not be empty"));
            }
        }

        let mut sets: Vec<&str> = Vec::new();
        if update.name.is_some() {
            sets.push("name = ?");
        }
        if update.description.is_some() {
            sets.push("description = ?");
        }
        if update.model.is_some() {
            sets.push("model = ?");
        }
        if update.max_tokens.is_some() {
            sets.push("max_tokens = ?");
        }
        if update.temperature.is_some() {
            sets.push("temperature = ?");
        }
        if update.system_prompt.is_some() {
            sets.push("system_prompt = ?");
        }
        if sets.is_empty() {
            return Ok(());
        }

        let sql = format!(
            "UPDATE agents SET {} WHERE id = ? AND user_id = ?",
            sets.join(", ")
        );
        let mut query = sqlx::query(&sql);
        if let Some(name) = &update.name {
            query = query.bind(name.trim().to_string());
        }
        if let Some(description) = &update.description {
            query = query.bind(description);
        }
        if let Some(model) = &update.model {
            query = query.bind(model);
        }
        if let Some(max_tokens) = update.max_tokens {
            query = query.bind(max_tokens);
        }
        if let Some(temperature) = update.temperature {
            query = query.bind(temperature);
        }
        if let Some(system_prompt) = &update.system_prompt {
            query = query.bind(system_prompt);
        }

        query
            .bind(agent_id)
            .bind(user_id)
            .execute(pool)
            .await
            .map_err(|e| HubError::database_error(&format!("Failed to update agent: {}", e)))?;

        Ok(())
    }

    /// Delete an agent and everything that references it: messages of the
    /// owner's chats with this agent, then the chats, then the agent row.
    /// All statements are owner-scoped and run in one transaction.
    pub async fn delete_agent(
        pool: &sqlx::SqlitePool,
        agent_id: i64,
        user_id: i64,
    ) -> HubResult<()> {
        let mut tx = pool
            .begin()
            .await
            .map_err(|e| HubError::database_error(&format!("Failed to start transaction: {}", e)))?;

        sqlx::query(
            "DELETE FROM chat_messages WHERE chat_id IN (SELECT id FROM chats WHERE user_id = ? AND agent_id = ?)",
        )
        .bind(user_id)
        .bind(agent_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| HubError::database_error(&format!("Failed to delete agent messages: {}", e)))?;

        sqlx::query("DELETE FROM chats WHERE user_id = ? AND agent_id = ?")
            .bind(user_id)
            .bind(agent_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| HubError::database_error(&format!("Failed to delete agent chats: {}", e)))?;

        sqlx::query("DELETE FROM agents WHERE id = ? AND user_id = ?")
            .bind(agent_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| HubError::database_error(&format!("Failed to delete agent: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| HubError::database_error(&format!("Failed to commit agent delete: {}", e)))?;

        Ok(())
    }
}
