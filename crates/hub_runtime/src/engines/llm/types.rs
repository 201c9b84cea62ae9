// LLM provider types
// One outbound turn, its reply and the reported token usage

use serde::{Deserialize, Serialize};

/// One outbound turn against the external chat-completion API. The caller
/// never resends prior transcript text; the continuation token lets the API
/// resume context server-side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnRequest {
    pub model: String,
    pub input_text: String,
    /// Opaque file id from a prior upload, attached to the user turn.
    pub file_id: Option<String>,
    /// The agent's system prompt.
    pub instructions: Option<String>,
    /// Opaque continuation token from the previous turn.
    pub previous_response_id: Option<String>,
    pub temperature: Option<f64>,
    /// None means no output limit is sent.
    pub max_output_tokens: Option<i64>,
}

/// Reply to one turn.
#[derive(Debug, Clone)]
pub struct TurnResponse {
    pub output_text: String,
    /// Continuation token to store for the next turn.
    pub response_id: String,
    pub usage: Option<TokenUsage>,
}

/// Usage counters as reported by the API; absent fields stay None.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: Option<i64>,
    pub output_tokens: Option<i64>,
    pub total_tokens: Option<i64>,
}
