// Agent Chat Service
// Turns an agent configuration plus a user message into one outbound request,
// and produces the privacy-safe topic summary kept for compliance

use crate::config::Settings;
use crate::database::agents::AgentRecord;
use crate::engines::llm::{LlmProvider, TokenUsage, TurnRequest};
use crate::errors::{HubError, HubResult};
use regex::Regex;
use std::sync::Arc;

/// Fixed text shown when no summary could be produced.
pub const SUMMARY_FALLBACK: &str = "(summary unavailable)";

const SUMMARY_MAX_MESSAGES: usize = 12;
const SUMMARY_MESSAGE_CHAR_CAP: usize = 400;
const SUMMARY_TRANSCRIPT_CHAR_BUDGET: usize = 4000;
const SUMMARY_CHAR_CAP: usize = 300;
const REDACTION_MARKER: &str = "[redacted]";

const SUMMARY_INSTRUCTIONS: &str = "You write topic summaries for a compliance audit trail. \
Reply with 1 to 3 sentences, at most 300 characters total, describing only the subject matter \
of the conversation. Do not include names, email addresses, phone numbers, identifiers or any \
other personally identifiable information. Do not quote the conversation verbatim.";

/// One role/content pair handed to the summarizer.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

/// Result of one agent turn; everything the caller needs to update the
/// transcript and the chat's continuation token.
#[derive(Debug, Clone)]
pub struct AgentReply {
    pub text: String,
    pub response_id: String,
    pub usage: Option<TokenUsage>,
}

/// Distinguishes a produced summary from a best-effort failure, so callers
/// can log failures without ever blocking the primary chat turn.
#[derive(Debug, Clone, PartialEq)]
pub enum SummaryOutcome {
    Generated(String),
    Unavailable,
}

impl SummaryOutcome {
    /// Text to persist; never empty and never longer than 300 characters.
    pub fn text(&self) -> &str {
        match self {
            SummaryOutcome::Generated(s) => s,
            SummaryOutcome::Unavailable => SUMMARY_FALLBACK,
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, SummaryOutcome::Generated(_))
    }
}

/// Chat service over an injected provider. Constructed once per process.
pub struct AgentChatService {
    provider: Arc<dyn LlmProvider>,
    settings: Settings,
}

impl AgentChatService {
    pub fn new(provider: Arc<dyn LlmProvider>, settings: Settings) -> Self {
        Self { provider, settings }
    }

    /// Send one turn for `agent`. The continuation token from the previous
    /// turn must be threaded through so the API resumes context server-side;
    /// prior transcript text is never resent.
    pub async fn run_agent_chat(
        &self,
        agent: &AgentRecord,
        user_text: &str,
        previous_response_id: Option<&str>,
        file_id: Option<&str>,
    ) -> HubResult<AgentReply> {
        if user_text.trim().is_empty() {
            return Err(HubError::validation("Message must not be empty"));
        }

        let temperature = if agent.temperature.is_finite() {
            agent.temperature
        } else {
            self.settings.default_temperature
        };

        // Non-positive means "unset": fall back to the configured default,
        // and send no limit at all when that is unset too.
        let max_output_tokens = if agent.max_tokens > 0 {
            Some(agent.max_tokens)
        } else {
            self.settings.default_max_output_tokens.filter(|&v| v > 0)
        };

        let request = TurnRequest {
            model: agent.model.clone(),
            input_text: user_text.to_string(),
            file_id: file_id.map(str::to_string),
            instructions: agent
                .system_prompt
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
            previous_response_id: previous_response_id.map(str::to_string),
            temperature: Some(temperature),
            max_output_tokens,
        };

        let response = self.provider.create_response(request).await?;

        Ok(AgentReply {
            text: response.output_text,
            response_id: response.response_id,
            usage: response.usage,
        })
    }

    /// Forward raw bytes to the provider's file store. Empty buffers are
    /// rejected before any network call.
    pub async fn upload_file(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        content_type: &str,
    ) -> HubResult<String> {
        if bytes.is_empty() {
            return Err(HubError::validation("Uploaded file is empty"));
        }
        self.provider.upload_file(bytes, filename, content_type).await
    }

    /// Produce the compliance topic summary for a conversation. Best-effort:
    /// provider failures are absorbed into `Unavailable` and logged, never
    /// propagated, because summarization must not interrupt the chat turn.
    /// The returned text is post-processed locally and safe to persist even
    /// when the model ignores its instructions.
    pub async fn generate_topic_summary(&self, messages: &[ChatTurn]) -> SummaryOutcome {
        let transcript = render_transcript(messages);
        if transcript.is_empty() {
            return SummaryOutcome::Unavailable;
        }

        let request = TurnRequest {
            model: self.settings.default_model.clone(),
            input_text: transcript,
            instructions: Some(SUMMARY_INSTRUCTIONS.to_string()),
            ..Default::default()
        };

        match self.provider.create_response(request).await {
            Ok(response) => {
                let summary = sanitize_summary(&response.output_text);
                if summary.is_empty() {
                    SummaryOutcome::Unavailable
                } else {
                    SummaryOutcome::Generated(summary)
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Topic summary generation failed");
                SummaryOutcome::Unavailable
            }
        }
    }
}

/// Render the tail of a conversation for the summarizer: at most the last 12
/// messages, each capped at 400 characters, within a 4000-character budget.
fn render_transcript(messages: &[ChatTurn]) -> String {
    let start = messages.len().saturating_sub(SUMMARY_MAX_MESSAGES);
    let mut transcript = String::new();

    for turn in &messages[start..] {
        let content = truncate_chars(turn.content.trim(), SUMMARY_MESSAGE_CHAR_CAP);
        if content.is_empty() {
            continue;
        }
        let line = format!("{}: {}\n", turn.role, content);
        if transcript.chars().count() + line.chars().count() > SUMMARY_TRANSCRIPT_CHAR_BUDGET {
            break;
        }
        transcript.push_str(&line);
    }

    transcript.trim_end().to_string()
}

/// Defense in depth over the summarizer's instructions: whatever the model
/// returned is stripped, redacted, whitespace-collapsed and clamped before it
/// may be persisted.
fn sanitize_summary(raw: &str) -> String {
    let stripped = raw
        .trim()
        .trim_matches(|c| matches!(c, '"' | '\'' | '\u{201c}' | '\u{201d}'))
        .trim();

    let redacted = redact_pii(stripped);
    let mut text = redacted.split_whitespace().collect::<Vec<_>>().join(" ");

    if text.chars().count() > SUMMARY_CHAR_CAP {
        text = text.chars().take(SUMMARY_CHAR_CAP - 1).collect();
        text.push('…');
    }
    text
}

/// Truncate on a character boundary.
fn truncate_chars(text: &str, cap: usize) -> String {
    text.chars().take(cap).collect()
}

/// Replace email-shaped substrings and digit runs of 7+ characters with a
/// fixed marker.
fn redact_pii(text: &str) -> String {
    let mut out = text.to_string();
    if let Ok(re) = Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}") {
        out = re.replace_all(&out, REDACTION_MARKER).into_owned();
    }
    if let Ok(re) = Regex::new(r"\d{7,}") {
        out = re.replace_all(&out, REDACTION_MARKER).into_owned();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_emails_and_long_digit_runs() {
        let input = "Contact joao.silva@empresa.com.br or call 5511999998888 about order 123456.";
        let out = redact_pii(input);
        assert!(!out.contains('@'));
        assert!(!out.contains("5511999998888"));
        // Runs shorter than 7 digits stay
        assert!(out.contains("123456"));
        assert!(out.contains(REDACTION_MARKER));
    }

    #[test]
    fn sanitize_strips_quotes_and_collapses_whitespace() {
        let out = sanitize_summary("\"  General   questions about\n\n expense reports.  \"");
        assert_eq!(out, "General questions about expense reports.");
    }

    #[test]
    fn sanitize_clamps_to_300_chars_with_ellipsis() {
        let out = sanitize_summary(&"x".repeat(10_000));
        assert_eq!(out.chars().count(), 300);
        assert!(out.ends_with('…'));
    }

    #[test]
    fn sanitize_redacts_before_clamping() {
        let long = format!("Reach me at user@example.com. {}", "detail ".repeat(100));
        let out = sanitize_summary(&long);
        assert!(!out.contains("user@example.com"));
        assert!(out.chars().count() <= 300);
    }

    #[test]
    fn transcript_keeps_only_the_last_twelve_messages() {
        let messages: Vec<ChatTurn> = (0..20)
            .map(|i| ChatTurn {
                role: "user".to_string(),
                content: format!("message {}", i),
            })
            .collect();
        let transcript = render_transcript(&messages);
        assert!(!transcript.contains("message 7"));
        assert!(transcript.contains("message 8"));
        assert!(transcript.contains("message 19"));
    }

    #[test]
    fn transcript_caps_each_message_and_the_total() {
        let messages: Vec<ChatTurn> = (0..12)
            .map(|_| ChatTurn {
                role: "user".to_string(),
                content: "y".repeat(2_000),
            })
            .collect();
        let transcript = render_transcript(&messages);
        assert!(transcript.chars().count() <= SUMMARY_TRANSCRIPT_CHAR_BUDGET);
        for line in transcript.lines() {
            assert!(line.chars().count() <= SUMMARY_MESSAGE_CHAR_CAP + "user: ".len());
        }
    }

    #[test]
    fn outcome_text_is_never_empty() {
        assert_eq!(SummaryOutcome::Unavailable.text(), SUMMARY_FALLBACK);
        assert_eq!(SummaryOutcome::Generated("ok".to_string()).text(), "ok");
    }
}
