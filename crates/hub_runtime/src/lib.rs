/*!
# Hub Runtime - Core PlaygroundHub Runtime

This crate contains the core runtime for PlaygroundHub, a multi-tenant hub
where users configure conversational agents, chat with them and keep an
auditable history.

## Architecture

- **Settings**: typed configuration resolved once at startup
- **Database Manager**: single-file SQLite store, schema convergence and
  in-place column upgrades
- **Repositories**: ownership-scoped CRUD over users, agents, chats and
  transcripts
- **Compliance Aggregation**: read-only denormalized audit view with derived
  cost and category columns
- **Agent Chat Service**: outbound turns against the external
  chat-completion API plus privacy-safe topic summaries
- **Role Gate**: equality-based role checks at every page entry point

The presentation layer lives outside this crate; every operation here is
request-scoped and synchronous from the caller's point of view.
*/

pub mod auth;
pub mod config;
pub mod database;
pub mod engines;
pub mod errors;

// Re-export main components
pub use auth::{hash_password, require_auth, require_roles, verify_password, Role, SessionContext};
pub use config::Settings;
pub use database::agents::{AgentOps, AgentRecord, AgentUpdate, NewAgent};
pub use database::chats::{
    ChatMessageRecord, ChatOps, ChatRecord, ChatSummary, NewMessage, NewTestMessage,
    DEFAULT_TOPIC_SUMMARY,
};
pub use database::compliance::{AuditRecord, AuditSource, ComplianceOps};
pub use database::users::{UserOps, UserRecord, UserUpdate};
pub use database::{DatabaseConfig, DatabaseManager};
pub use engines::chat::{AgentChatService, AgentReply, ChatTurn, SummaryOutcome, SUMMARY_FALLBACK};
pub use engines::llm::providers::openai::OpenAiProvider;
pub use engines::llm::{LlmProvider, TokenUsage, TurnRequest, TurnResponse};
pub use errors::{HubError, HubResult};

/// Runtime version
pub const RUNTIME_VERSION: &str = env!("CARGO_PKG_VERSION");
