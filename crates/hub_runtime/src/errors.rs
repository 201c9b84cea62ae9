use serde::{Deserialize, Serialize};
use std::fmt;

/// Main result type for PlaygroundHub runtime operations
pub type HubResult<T> = Result<T, HubError>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ErrorCode {
    // General Errors
    Unknown,
    Timeout,

    // Config & Init
    ConfigError,
    InitializationFailed,

    // Validation (rejected before any store mutation)
    Validation,

    // Storage Errors
    DatabaseError,
    MigrationFailed,

    // LLM Errors
    LlmError,
    LlmApiError,
    LlmAuthentication,
    LlmRateLimited,
    LlmInvalidRequest,
    LlmInvalidResponse,
    LlmTimeout,

    // Serialization Errors
    SerializationError,

    // Security Errors
    AuthenticationRequired,
    PermissionDenied,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ErrorCategory {
    System,
    Configuration,
    Validation,
    Storage,
    Llm,
    Security,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone)]
pub struct HubError {
    pub code: ErrorCode,
    pub category: ErrorCategory,
    pub severity: ErrorSeverity,
    pub message: String,
}

impl HubError {
    pub fn new(
        code: ErrorCode,
        category: ErrorCategory,
        severity: ErrorSeverity,
        message: &str,
    ) -> Self {
        Self {
            code,
            category,
            severity,
            message: message.to_string(),
        }
    }

    /// Creates a validation error (no store mutation has happened)
    pub fn validation(message: &str) -> Self {
        Self::new(
            ErrorCode::Validation,
            ErrorCategory::Validation,
            ErrorSeverity::Low,
            message,
        )
    }

    /// Creates a database error
    pub fn database_error(message: &str) -> Self {
        Self::new(
            ErrorCode::DatabaseError,
            ErrorCategory::Storage,
            ErrorSeverity::High,
            message,
        )
    }

    /// Creates a configuration error
    pub fn config_error(message: &str) -> Self {
        Self::new(
            ErrorCode::ConfigError,
            ErrorCategory::Configuration,
            ErrorSeverity::Critical,
            message,
        )
    }

    pub fn category(&self) -> &ErrorCategory {
        &self.category
    }

    pub fn severity(&self) -> &ErrorSeverity {
        &self.severity
    }

    pub fn is_validation(&self) -> bool {
        matches!(self.code, ErrorCode::Validation)
    }

    /// Whether the caller may retry the operation as-is
    pub fn is_retriable(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::LlmError | ErrorCode::LlmApiError | ErrorCode::LlmRateLimited | ErrorCode::LlmTimeout
        )
    }
}

impl fmt::Display for HubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}/{:?}] {}", self.category, self.code, self.message)
    }
}

impl std::error::Error for HubError {}

// Conversion from serde_json::Error
impl From<serde_json::Error> for HubError {
    fn from(err: serde_json::Error) -> Self {
        HubError::new(
            ErrorCode::SerializationError,
            ErrorCategory::System,
            ErrorSeverity::Medium,
            &format!("JSON serialization error: {}", err),
        )
    }
}
