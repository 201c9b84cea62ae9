// Runtime Settings for PlaygroundHub
// Typed configuration resolved once at startup from the environment

use crate::errors::{HubError, HubResult};
use std::path::PathBuf;

/// Fallback for the agent-creation max-tokens default when the environment
/// supplies nothing usable.
const FALLBACK_MAX_OUTPUT_TOKENS: i64 = 1024;

/// Process-wide settings, validated once at startup and passed by reference.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Bootstrap administrator account, seeded at boot when absent.
    pub admin_email: String,
    pub admin_password: String,
    /// Path of the single-file relational store.
    pub db_path: PathBuf,
    /// API key for the external chat-completion API. Empty means the chat
    /// service is unavailable; repositories still work.
    pub openai_api_key: String,
    pub default_model: String,
    pub default_temperature: f64,
    /// None means "no output limit sent" on outbound requests.
    pub default_max_output_tokens: Option<i64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            admin_email: "admin@company.com".to_string(),
            admin_password: "Admin@12345".to_string(),
            db_path: PathBuf::from("data/app.db"),
            openai_api_key: String::new(),
            default_model: "gpt-4o-mini".to_string(),
            default_temperature: 0.7,
            default_max_output_tokens: Some(FALLBACK_MAX_OUTPUT_TOKENS),
        }
    }
}

impl Settings {
    /// Resolve settings from environment variables, falling back to the
    /// documented defaults. Values are coerced defensively here so the rest
    /// of the runtime only ever sees typed fields.
    pub fn from_env() -> Self {
        let defaults = Settings::default();

        let max_tokens_raw = pick("OPENAI_MAX_OUTPUT_TOKENS")
            .or_else(|| pick("OPENAI_MAX_TOKENS"))
            .unwrap_or_default();

        Self {
            admin_email: pick("ADMIN_EMAIL")
                .map(|v| v.trim().to_lowercase())
                .unwrap_or(defaults.admin_email),
            admin_password: pick("ADMIN_PASSWORD").unwrap_or(defaults.admin_password),
            db_path: pick("APP_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            openai_api_key: pick("OPENAI_API_KEY")
                .map(|v| v.trim().to_string())
                .unwrap_or_default(),
            default_model: pick("OPENAI_MODEL")
                .map(|v| v.trim().to_string())
                .unwrap_or(defaults.default_model),
            default_temperature: parse_temperature(
                &pick("OPENAI_TEMPERATURE").unwrap_or_default(),
                defaults.default_temperature,
            ),
            default_max_output_tokens: parse_max_tokens(&max_tokens_raw),
        }
    }

    /// Validate once at startup; failures are fatal at boot.
    pub fn validate(&self) -> HubResult<()> {
        if self.admin_email.trim().is_empty() || !self.admin_email.contains('@') {
            return Err(HubError::config_error("ADMIN_EMAIL is not a usable email address"));
        }
        if self.admin_password.is_empty() {
            return Err(HubError::config_error("ADMIN_PASSWORD must not be empty"));
        }
        if self.default_model.is_empty() {
            return Err(HubError::config_error("OPENAI_MODEL must not be empty"));
        }
        if !self.default_temperature.is_finite() || self.default_temperature < 0.0 {
            return Err(HubError::config_error("OPENAI_TEMPERATURE must be a non-negative number"));
        }
        Ok(())
    }

    /// Max-tokens default applied when an agent is created without one.
    pub fn default_agent_max_tokens(&self) -> i64 {
        self.default_max_output_tokens
            .filter(|&v| v > 0)
            .unwrap_or(FALLBACK_MAX_OUTPUT_TOKENS)
    }
}

fn pick(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Unparsable or empty input falls back to the supplied default.
fn parse_temperature(raw: &str, default: f64) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => default,
    }
}

/// Unparsable, empty or non-positive input means "unset" (no limit sent).
fn parse_max_tokens(raw: &str) -> Option<i64> {
    match raw.trim().parse::<i64>() {
        Ok(v) if v > 0 => Some(v),
        Ok(_) => None,
        Err(_) => {
            if raw.trim().is_empty() {
                Some(FALLBACK_MAX_OUTPUT_TOKENS)
            } else {
                None
            }
        }
    }
}
