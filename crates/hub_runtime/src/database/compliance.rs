// Compliance Aggregation
// Read-only audit view over user-authored traffic. Raw message content never
// leaves this layer; only the previously generated topic summaries do.

use crate::errors::{HubError, HubResult};
use serde::{Deserialize, Serialize};

/// Shown when a chat never received a generated summary.
pub const MISSING_SUMMARY_PLACEHOLDER: &str = "(topic not summarized)";
/// Shown for test-log rows whose agent config was deleted or never saved.
pub const MISSING_AGENT_PLACEHOLDER: &str = "(in configuration)";
pub const MISSING_MODEL_PLACEHOLDER: &str = "—";

/// Where an audit row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditSource {
    Chat,
    TestLog,
}

/// One denormalized audit row. Deliberately has no field for raw message
/// content; the summary is the only text surfaced to compliance.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub created_at: i64,
    pub user_email: String,
    pub topic_summary: String,
    pub tokens: i64,
    pub model: String,
    pub agent_name: String,
    pub has_attachment: bool,
    pub attachment_filename: Option<String>,
    pub estimated_cost_usd: f64,
    pub category: &'static str,
    pub source: AuditSource,
}

/// Heuristic per-token rate by model identifier substring, USD per token.
/// An approximation for audit dashboards, not billing-accurate.
pub fn estimate_cost_usd(model: &str, tokens: i64) -> f64 {
    let model = model.to_lowercase();
    let tokens = tokens.max(0) as f64;
    let rate_per_million = if model.contains("gpt-4") {
        2.50
    } else if model.contains("gpt-3.5") {
        0.50
    } else {
        0.20
    };
    tokens * (rate_per_million / 1_000_000.0)
}

/// Coarse category from the stored topic summary. Never looks at message
/// content, so the audit surface cannot re-expose raw text.
pub fn categorize_summary(summary: &str) -> &'static str {
    let summary = summary.to_lowercase();
    if summary.contains("test") {
        "test"
    } else if summary.contains("code") || summary.contains("def ") || summary.contains("class ") {
        "dev/code"
    } else {
        "general"
    }
}

fn presented_summary(raw: Option<String>) -> String {
    match raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) {
        Some(s) => s,
        None => MISSING_SUMMARY_PLACEHOLDER.to_string(),
    }
}

/// Read-only operations for the compliance audit view
pub struct ComplianceOps;

impl ComplianceOps {
    /// One row per user-authored message from real chats, unioned with the
    /// scratch-chat test log, enriched with derived cost and category and
    /// sorted newest first. This function only reads; it never mutates.
    pub async fn audit_records(pool: &sqlx::SqlitePool) -> HubResult<Vec<AuditRecord>> {
        let mut records = Self::chat_rows(pool).await?;
        records.extend(Self::test_log_rows(pool).await?);
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn chat_rows(pool: &sqlx::SqlitePool) -> HubResult<Vec<AuditRecord>> {
        let rows: Vec<(i64, String, Option<String>, Option<i64>, String, String, i64, Option<String>)> =
            sqlx::query_as(
                r#"
                SELECT
                    m.created_at,
                    u.email,
                    c.conversation_topic_summary,
                    m.tokens,
                    a.model,
                    a.name,
                    m.has_attachment,
                    m.attachment_filename
                FROM chat_messages m
                JOIN chats c ON m.chat_id = c.id
                JOIN users u ON c.user_id = u.id
                JOIN agents a ON c.agent_id = a.id
                WHERE m.role = 'user'
            "#,
            )
            .fetch_all(pool)
            .await
            .map_err(|e| HubError::database_error(&format!("Failed to read chat audit rows: {}", e)))?;

        Ok(rows
            .into_iter()
            .map(
                |(created_at, email, summary, tokens, model, agent_name, has_attachment, attachment_filename)| {
                    let tokens = tokens.unwrap_or(0);
                    let topic_summary = presented_summary(summary);
                    AuditRecord {
                        created_at,
                        user_email: email,
                        estimated_cost_usd: estimate_cost_usd(&model, tokens),
                        category: categorize_summary(&topic_summary),
                        topic_summary,
                        tokens,
                        model,
                        agent_name,
                        has_attachment: has_attachment != 0,
                        attachment_filename,
                        source: AuditSource::Chat,
                    }
                },
            )
            .collect())
    }

    async fn test_log_rows(pool: &sqlx::SqlitePool) -> HubResult<Vec<AuditRecord>> {
        let rows: Vec<(i64, String, Option<i64>, Option<String>, Option<String>, i64, Option<String>)> =
            sqlx::query_as(
                r#"
                SELECT
                    t.created_at,
                    u.email,
                    t.tokens,
                    t.model,
                    t.agent_name,
                    t.has_attachment,
                    t.attachment_filename
                FROM chat_test_messages t
                JOIN users u ON t.user_id = u.id
                WHERE t.role = 'user'
            "#,
            )
            .fetch_all(pool)
            .await
            .map_err(|e| HubError::database_error(&format!("Failed to read test audit rows: {}", e)))?;

        Ok(rows
            .into_iter()
            .map(
                |(created_at, email, tokens, model, agent_name, has_attachment, attachment_filename)| {
                    let tokens = tokens.unwrap_or(0);
                    let model = model
                        .map(|m| m.trim().to_string())
                        .filter(|m| !m.is_empty())
                        .unwrap_or_else(|| MISSING_MODEL_PLACEHOLDER.to_string());
                    let agent_name = agent_name
                        .map(|n| n.trim().to_string())
                        .filter(|n| !n.is_empty())
                        .unwrap_or_else(|| MISSING_AGENT_PLACEHOLDER.to_string());
                    let topic_summary = presented_summary(None);
                    AuditRecord {
                        created_at,
                        user_email: email,
                        estimated_cost_usd: estimate_cost_usd(&model, tokens),
                        category: categorize_summary(&topic_summary),
                        topic_summary,
                        tokens,
                        model,
                        agent_name,
                        has_attachment: has_attachment != 0,
                        attachment_filename,
                        source: AuditSource::TestLog,
                    }
                },
            )
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn cost_rates_follow_model_substrings() {
        assert!(close(estimate_cost_usd("gpt-4o-mini", 1_000_000), 2.50));
        assert!(close(estimate_cost_usd("GPT-4", 1_000_000), 2.50));
        assert!(close(estimate_cost_usd("gpt-3.5-turbo", 1_000_000), 0.50));
        assert!(close(estimate_cost_usd("some-other-model", 1_000_000), 0.20));
        assert!(close(estimate_cost_usd("gpt-4", 0), 0.0));
    }

    #[test]
    fn negative_tokens_never_produce_negative_cost() {
        assert!(close(estimate_cost_usd("gpt-4", -500), 0.0));
    }

    #[test]
    fn categories_come_from_summaries_only() {
        assert_eq!(categorize_summary("Testing the upload widget"), "test");
        assert_eq!(categorize_summary("Review of Python code structure"), "dev/code");
        assert_eq!(categorize_summary("Questions about vacation policy"), "general");
        assert_eq!(categorize_summary(""), "general");
    }

    #[test]
    fn empty_summaries_get_the_placeholder() {
        assert_eq!(presented_summary(None), MISSING_SUMMARY_PLACEHOLDER);
        assert_eq!(presented_summary(Some("   ".to_string())), MISSING_SUMMARY_PLACEHOLDER);
        assert_eq!(presented_summary(Some("Billing questions".to_string())), "Billing questions");
    }
}
