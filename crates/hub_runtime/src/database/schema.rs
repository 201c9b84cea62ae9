// Database Schema Definitions for PlaygroundHub
// Canonical final column set for every table; upgrades are handled in migrations.rs

/// Table definitions. Timestamps are epoch seconds.
pub const TABLES: &str = r#"
-- Accounts
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL, -- ADMIN, USER, COMPLIANCE
    active INTEGER NOT NULL DEFAULT 1,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

-- Per-user agent configurations
CREATE TABLE IF NOT EXISTS agents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id),
    name TEXT NOT NULL,
    description TEXT,
    model TEXT NOT NULL,
    max_tokens INTEGER NOT NULL,
    temperature REAL NOT NULL,
    system_prompt TEXT,
    created_at INTEGER NOT NULL
);

-- Chat sessions
CREATE TABLE IF NOT EXISTS chats (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id),
    agent_id INTEGER NOT NULL REFERENCES agents(id),
    title TEXT NOT NULL,
    conversation_topic_summary TEXT,
    previous_response_id TEXT, -- opaque continuation token from the chat API
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

-- Ordered transcript per chat, append-only
CREATE TABLE IF NOT EXISTS chat_messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    chat_id INTEGER NOT NULL REFERENCES chats(id) ON DELETE CASCADE,
    role TEXT NOT NULL, -- user, assistant
    content TEXT NOT NULL,
    tokens INTEGER DEFAULT 0,
    has_attachment INTEGER NOT NULL DEFAULT 0,
    attachment_filename TEXT,
    created_at INTEGER NOT NULL
);

-- Scratch-chat log kept only for compliance aggregation
CREATE TABLE IF NOT EXISTS chat_test_messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id),
    agent_id INTEGER, -- weak reference; the config may never have been saved
    role TEXT NOT NULL,
    content TEXT NOT NULL,
    tokens INTEGER DEFAULT 0,
    has_attachment INTEGER NOT NULL DEFAULT 0,
    attachment_filename TEXT,
    model TEXT,
    agent_name TEXT,
    created_at INTEGER NOT NULL
);
"#;

/// Indexes, applied only after column upgrades so they may reference columns
/// added to pre-existing tables.
pub const INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);
CREATE INDEX IF NOT EXISTS idx_users_created_at ON users(created_at);

CREATE INDEX IF NOT EXISTS idx_agents_user_id ON agents(user_id);

CREATE INDEX IF NOT EXISTS idx_chats_user_agent ON chats(user_id, agent_id, updated_at DESC);

CREATE INDEX IF NOT EXISTS idx_chat_messages_chat_id ON chat_messages(chat_id);
CREATE INDEX IF NOT EXISTS idx_chat_messages_role ON chat_messages(role);
CREATE INDEX IF NOT EXISTS idx_chat_messages_created_at ON chat_messages(created_at);

CREATE INDEX IF NOT EXISTS idx_chat_test_messages_user_id ON chat_test_messages(user_id);
CREATE INDEX IF NOT EXISTS idx_chat_test_messages_created_at ON chat_test_messages(created_at);
"#;

/// Columns added after the first released schema, keyed by table. Each entry
/// is (column name, ALTER TABLE statement) applied when the column is missing
/// from an existing table so upgrades never lose data.
pub const COLUMN_UPGRADES: &[(&str, &str, &str)] = &[
    (
        "chats",
        "conversation_topic_summary",
        "ALTER TABLE chats ADD COLUMN conversation_topic_summary TEXT",
    ),
    (
        "chats",
        "previous_response_id",
        "ALTER TABLE chats ADD COLUMN previous_response_id TEXT",
    ),
    (
        "chats",
        "updated_at",
        "ALTER TABLE chats ADD COLUMN updated_at INTEGER NOT NULL DEFAULT 0",
    ),
    (
        "chat_messages",
        "tokens",
        "ALTER TABLE chat_messages ADD COLUMN tokens INTEGER DEFAULT 0",
    ),
    (
        "chat_messages",
        "has_attachment",
        "ALTER TABLE chat_messages ADD COLUMN has_attachment INTEGER NOT NULL DEFAULT 0",
    ),
    (
        "chat_messages",
        "attachment_filename",
        "ALTER TABLE chat_messages ADD COLUMN attachment_filename TEXT",
    ),
    (
        "chat_test_messages",
        "model",
        "ALTER TABLE chat_test_messages ADD COLUMN model TEXT",
    ),
    (
        "chat_test_messages",
        "agent_name",
        "ALTER TABLE chat_test_messages ADD COLUMN agent_name TEXT",
    ),
];
