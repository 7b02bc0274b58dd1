//! # CLI Error Type
//!
//! Unified error type for commands.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Command                                                                │
//! │  Result<(), CliError>                                                   │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  SyncError / CoreError / io::Error ──► CliError { code, message }      │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  main: eprintln!("[NotFound] Product not found: 12"), exit(code)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use storefront_core::{CoreError, ValidationError};
use storefront_sync::SyncError;

pub type CliResult<T> = Result<T, CliError>;

/// Error returned from a command.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CliError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error codes, one per process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Product or category not found
    NotFound,

    /// Bad user input
    ValidationError,

    /// Unknown user or wrong password
    InvalidCredentials,

    /// Record service unreachable or too slow
    NetworkError,

    /// Record service rejected the request
    RemoteError,

    /// Bad or missing configuration
    ConfigError,

    /// Local storage failed
    StorageError,

    /// Anything else
    Internal,
}

impl ErrorCode {
    /// Process exit status for this code.
    pub fn exit_status(self) -> i32 {
        match self {
            ErrorCode::ValidationError => 2,
            ErrorCode::NotFound => 3,
            ErrorCode::InvalidCredentials => 4,
            ErrorCode::NetworkError | ErrorCode::RemoteError => 5,
            ErrorCode::ConfigError => 6,
            ErrorCode::StorageError | ErrorCode::Internal => 1,
        }
    }
}

impl CliError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        CliError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        CliError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::ValidationError, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::ConfigError, message)
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => CliError::not_found("Product", &id),
            CoreError::InvalidLink { .. } => CliError::validation(err.to_string()),
            CoreError::Validation(e) => CliError::validation(e.to_string()),
        }
    }
}

impl From<ValidationError> for CliError {
    fn from(err: ValidationError) -> Self {
        CliError::validation(err.to_string())
    }
}

impl From<SyncError> for CliError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Core(e) => e.into(),
            SyncError::InvalidCredentials => {
                CliError::new(ErrorCode::InvalidCredentials, err.to_string())
            }
            SyncError::Network(_) | SyncError::Timeout(_) => {
                CliError::new(ErrorCode::NetworkError, err.to_string())
            }
            SyncError::Service(_) => CliError::new(ErrorCode::RemoteError, err.to_string()),
            SyncError::InvalidConfig(_)
            | SyncError::ConfigLoadFailed(_)
            | SyncError::ConfigSaveFailed(_)
            | SyncError::NotConfigured(_) => CliError::config(err.to_string()),
            SyncError::Storage(_) | SyncError::Decode(_) => {
                CliError::new(ErrorCode::StorageError, err.to_string())
            }
            SyncError::PasswordHash(e) => {
                // Log the actual error but return a generic message
                tracing::error!(error = %e, "Internal failure");
                CliError::new(ErrorCode::Internal, "Operation failed")
            }
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::new(ErrorCode::StorageError, err.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::new(ErrorCode::StorageError, format!("Malformed JSON: {}", err))
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for CliError {}
