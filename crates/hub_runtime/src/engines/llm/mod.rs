// LLM provider seam
// The chat service talks to this trait; production wires in the OpenAI
// provider, tests wire in mocks

pub mod providers;
pub mod types;

use crate::errors::HubResult;
use async_trait::async_trait;
pub use types::{TokenUsage, TurnRequest, TurnResponse};

/// A chat-completion backend.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name, for logging.
    fn name(&self) -> &str;

    /// Send one turn and return the reply, continuation token and usage.
    async fn create_response(&self, request: TurnRequest) -> HubResult<TurnResponse>;

    /// Store raw bytes with the provider and return an opaque file id for use
    /// in a subsequent turn.
    async fn upload_file(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        content_type: &str,
    ) -> HubResult<String>;
}
