// Chat & Message Database Operations
// Chat sessions, their append-only transcripts and the scratch-chat test log

use crate::database::now_ts;
use crate::errors::{HubError, HubResult};
use serde::{Deserialize, Serialize};

/// Topic summary stored until the first real summary is generated.
pub const DEFAULT_TOPIC_SUMMARY: &str = "New chat started.";

const ATTACHMENT_FILENAME_MAX_CHARS: usize = 200;

/// Chat session record, including the opaque continuation token for the
/// external chat API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRecord {
    pub id: i64,
    pub user_id: i64,
    pub agent_id: i64,
    pub title: String,
    pub conversation_topic_summary: Option<String>,
    pub previous_response_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Listing row for the chat picker, most recently used first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSummary {
    pub id: i64,
    pub title: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// One transcript entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessageRecord {
    pub role: String,
    pub content: String,
    pub tokens: i64,
}

/// Optional fields of a transcript insert.
#[derive(Debug, Clone, Default)]
pub struct NewMessage {
    pub tokens: Option<i64>,
    pub has_attachment: Option<bool>,
    pub attachment_filename: Option<String>,
}

/// Scratch-chat log entry; kept only so compliance aggregation can see test
/// traffic, never used for conversational continuation.
#[derive(Debug, Clone, Default)]
pub struct NewTestMessage {
    pub agent_id: Option<i64>,
    pub tokens: Option<i64>,
    pub has_attachment: bool,
    pub attachment_filename: Option<String>,
    pub model: Option<String>,
    pub agent_name: Option<String>,
}

/// Reduce a possibly foreign-OS path to a stored basename: normalize
/// backslashes to forward slashes before splitting (a Windows path does not
/// split on `\` when the store runs on Linux), then cap at 200 characters.
pub fn normalize_attachment_filename(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalized = trimmed.replace('\\', "/");
    let basename = normalized.rsplit('/').next().unwrap_or("");
    let capped: String = basename.chars().take(ATTACHMENT_FILENAME_MAX_CHARS).collect();
    if capped.is_empty() {
        None
    } else {
        Some(capped)
    }
}

/// Database operations for chats
pub struct ChatOps;

impl ChatOps {
    /// Create a chat. The title defaults to a timestamped label and the
    /// topic summary starts at the fixed placeholder.
    pub async fn create_chat(
        pool: &sqlx::SqlitePool,
        user_id: i64,
        agent_id: i64,
        title: Option<&str>,
    ) -> HubResult<i64> {
        let title = match title.map(str::trim).filter(|t| !t.is_empty()) {
            Some(t) => t.to_string(),
            None => format!("Chat {}", chrono::Local::now().format("%d/%m/%Y %H:%M")),
        };

        let now = now_ts();
        let result = sqlx::query(
            r#"
            INSERT INTO chats (user_id, agent_id, title, conversation_topic_summary, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
        "#,
        )
        .bind(user_id)
        .bind(agent_id)
        .bind(title)
        .bind(DEFAULT_TOPIC_SUMMARY)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .map_err(|e| HubError::database_error(&format!("Failed to create chat: {}", e)))?;

        Ok(result.last_insert_rowid())
    }

    /// Chats of one user+agent pair, most recently updated first.
    pub async fn list_chats(
        pool: &sqlx::SqlitePool,
        user_id: i64,
        agent_id: i64,
    ) -> HubResult<Vec<ChatSummary>> {
        let rows: Vec<(i64, String, i64, i64)> = sqlx::query_as(
            r#"
            SELECT id, title, created_at, updated_at FROM chats
            WHERE user_id = ? AND agent_id = ?
            ORDER BY updated_at DESC, created_at DESC, id DESC
        "#,
        )
        .bind(user_id)
        .bind(agent_id)
        .fetch_all(pool)
        .await
        .map_err(|e| HubError::database_error(&format!("Failed to list chats: {}", e)))?;

        Ok(rows
            .into_iter()
            .map(|(id, title, created_at, updated_at)| ChatSummary {
                id,
                title,
                created_at,
                updated_at,
            })
            .collect())
    }

    /// Full ordered transcript of a chat.
    pub async fn get_messages(
        pool: &sqlx::SqlitePool,
        chat_id: i64,
    ) -> HubResult<Vec<ChatMessageRecord>> {
        let rows: Vec<(String, String, Option<i64>)> = sqlx::query_as(
            "SELECT role, content, tokens FROM chat_messages WHERE chat_id = ? ORDER BY id",
        )
        .bind(chat_id)
        .fetch_all(pool)
        .await
        .map_err(|e| HubError::database_error(&format!("Failed to get messages: {}", e)))?;

        Ok(rows
            .into_iter()
            .map(|(role, content, tokens)| ChatMessageRecord {
                role,
                content,
                tokens: tokens.unwrap_or(0),
            })
            .collect())
    }

    /// Append a message and bump the parent chat's updated_at; the bump is
    /// what drives most-recently-used ordering in `list_chats`.
    pub async fn add_message(
        pool: &sqlx::SqlitePool,
        chat_id: i64,
        role: &str,
        content: &str,
        extra: &NewMessage,
    ) -> HubResult<()> {
        let filename = extra
            .attachment_filename
            .as_deref()
            .and_then(normalize_attachment_filename);
        let has_attachment = extra.has_attachment.unwrap_or(filename.is_some());
        let tokens = extra.tokens.unwrap_or(0);

        let mut tx = pool
            .begin()
            .await
            .map_err(|e| HubError::database_error(&format!("Failed to start transaction: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO chat_messages (chat_id, role, content, tokens, has_attachment, attachment_filename, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
        )
        .bind(chat_id)
        .bind(role)
        .bind(content)
        .bind(tokens)
        .bind(if has_attachment { 1i64 } else { 0 })
        .bind(&filename)
        .bind(now_ts())
        .execute(&mut *tx)
        .await
        .map_err(|e| HubError::database_error(&format!("Failed to add message: {}", e)))?;

        sqlx::query("UPDATE chats SET updated_at = ? WHERE id = ?")
            .bind(now_ts())
            .bind(chat_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| HubError::database_error(&format!("Failed to touch chat: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| HubError::database_error(&format!("Failed to commit message: {}", e)))?;

        Ok(())
    }

    /// Ownership-scoped fetch including the continuation token and summary.
    pub async fn get_chat(
        pool: &sqlx::SqlitePool,
        chat_id: i64,
        user_id: i64,
    ) -> HubResult<Option<ChatRecord>> {
        let row: Option<(i64, i64, i64, String, Option<String>, Option<String>, i64, i64)> =
            sqlx::query_as(
                r#"
                SELECT id, user_id, agent_id, title, conversation_topic_summary, previous_response_id, created_at, updated_at
                FROM chats WHERE id = ? AND user_id = ?
            "#,
            )
            .bind(chat_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
            .map_err(|e| HubError::database_error(&format!("Failed to get chat: {}", e)))?;

        Ok(row.map(
            |(id, user_id, agent_id, title, conversation_topic_summary, previous_response_id, created_at, updated_at)| ChatRecord {
                id,
                user_id,
                agent_id,
                title,
                conversation_topic_summary,
                previous_response_id,
                created_at,
                updated_at,
            },
        ))
    }

    /// Most recent chat for a user+agent pair, if any.
    pub async fn latest_chat_for_agent(
        pool: &sqlx::SqlitePool,
        user_id: i64,
        agent_id: i64,
    ) -> HubResult<Option<ChatRecord>> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM chats WHERE user_id = ? AND agent_id = ? ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .bind(user_id)
        .bind(agent_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| HubError::database_error(&format!("Failed to get latest chat: {}", e)))?;

        match row {
            Some((chat_id,)) => Self::get_chat(pool, chat_id, user_id).await,
            None => Ok(None),
        }
    }

    /// Overwrite the privacy-safe topic summary, ownership-scoped.
    pub async fn update_topic_summary(
        pool: &sqlx::SqlitePool,
        chat_id: i64,
        user_id: i64,
        summary: Option<&str>,
    ) -> HubResult<()> {
        sqlx::query("UPDATE chats SET conversation_topic_summary = ? WHERE id = ? AND user_id = ?")
            .bind(summary)
            .bind(chat_id)
            .bind(user_id)
            .execute(pool)
            .await
            .map_err(|e| HubError::database_error(&format!("Failed to update topic summary: {}", e)))?;

        Ok(())
    }

    /// Store the continuation token to thread into the next outbound request.
    /// The token is opaque; it is only meaningful to the external API.
    pub async fn update_previous_response_id(
        pool: &sqlx::SqlitePool,
        chat_id: i64,
        user_id: i64,
        previous_response_id: Option<&str>,
    ) -> HubResult<()> {
        sqlx::query("UPDATE chats SET previous_response_id = ? WHERE id = ? AND user_id = ?")
            .bind(previous_response_id)
            .bind(chat_id)
            .bind(user_id)
            .execute(pool)
            .await
            .map_err(|e| {
                HubError::database_error(&format!("Failed to update previous response id: {}", e))
            })?;

        Ok(())
    }

    pub async fn rename_chat(
        pool: &sqlx::SqlitePool,
        chat_id: i64,
        user_id: i64,
        title: &str,
    ) -> HubResult<()> {
        if title.trim().is_empty() {
            return Err(HubError::validation("Chat title must not be empty"));
        }

        sqlx::query("UPDATE chats SET title = ?, updated_at = ? WHERE id = ? AND user_id = ?")
            .bind(title.trim())
            .bind(now_ts())
            .bind(chat_id)
            .bind(user_id)
            .execute(pool)
            .await
            .map_err(|e| HubError::database_error(&format!("Failed to rename chat: {}", e)))?;

        Ok(())
    }

    /// Delete a chat and its transcript. Terminal: the chat id is never
    /// reused for new messages.
    pub async fn delete_chat(
        pool: &sqlx::SqlitePool,
        chat_id: i64,
        user_id: i64,
    ) -> HubResult<()> {
        let mut tx = pool
            .begin()
            .await
            .map_err(|e| HubError::database_error(&format!("Failed to start transaction: {}", e)))?;

        sqlx::query(
            "DELETE FROM chat_messages WHERE chat_id = ? AND EXISTS (SELECT 1 FROM chats WHERE id = ? AND user_id = ?)",
        )
        .bind(chat_id)
        .bind(chat_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| HubError::database_error(&format!("Failed to delete chat messages: {}", e)))?;

        sqlx::query("DELETE FROM chats WHERE id = ? AND user_id = ?")
            .bind(chat_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| HubError::database_error(&format!("Failed to delete chat: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| HubError::database_error(&format!("Failed to commit chat delete: {}", e)))?;

        Ok(())
    }

    /// Append to the scratch-chat log. Independent of any chat id; the agent
    /// reference is weak and the model/agent name are snapshots taken at
    /// send time.
    pub async fn add_chat_test_message(
        pool: &sqlx::SqlitePool,
        user_id: i64,
        role: &str,
        content: &str,
        extra: &NewTestMessage,
    ) -> HubResult<()> {
        let filename = extra
            .attachment_filename
            .as_deref()
            .and_then(normalize_attachment_filename);

        sqlx::query(
            r#"
            INSERT INTO chat_test_messages (user_id, agent_id, role, content, tokens, has_attachment, attachment_filename, model, agent_name, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        )
        .bind(user_id)
        .bind(extra.agent_id)
        .bind(role)
        .bind(content)
        .bind(extra.tokens.unwrap_or(0))
        .bind(if extra.has_attachment || filename.is_some() { 1i64 } else { 0 })
        .bind(&filename)
        .bind(&extra.model)
        .bind(&extra.agent_name)
        .bind(now_ts())
        .execute(pool)
        .await
        .map_err(|e| HubError::database_error(&format!("Failed to add test message: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_paths_reduce_to_basename() {
        assert_eq!(
            normalize_attachment_filename(r"C:\tmp\report.pdf"),
            Some("report.pdf".to_string())
        );
        assert_eq!(
            normalize_attachment_filename("/home/user/docs/report.pdf"),
            Some("report.pdf".to_string())
        );
        assert_eq!(
            normalize_attachment_filename(r"C:\tmp/mixed\sep.pdf"),
            Some("sep.pdf".to_string())
        );
    }

    #[test]
    fn empty_and_separator_only_names_store_nothing() {
        assert_eq!(normalize_attachment_filename(""), None);
        assert_eq!(normalize_attachment_filename("   "), None);
        assert_eq!(normalize_attachment_filename("dir/"), None);
        assert_eq!(normalize_attachment_filename(r"C:\"), None);
    }

    #[test]
    fn long_names_are_capped_at_200_chars() {
        let long = format!("{}.pdf", "x".repeat(400));
        let stored = normalize_attachment_filename(&long).unwrap();
        assert_eq!(stored.chars().count(), 200);
        assert!(stored.chars().all(|c| c == 'x'));
    }
}
