//! # Sync Error Types
//!
//! Error types for sync, persistence and account operations.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │  Remote calls   │  │     Local data          │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Network        │  │  Decode                 │ │
//! │  │  ConfigLoad/Save│  │  Timeout        │  │  Storage                │ │
//! │  │  NotConfigured  │  │  Service        │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐                              │
//! │  │    Accounts     │  │     Domain      │                              │
//! │  │                 │  │                 │                              │
//! │  │  InvalidCreds   │  │  Core(CoreError)│  validation, not found       │
//! │  │  PasswordHash   │  │                 │                              │
//! │  └─────────────────┘  └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Propagation Policy
//! - Validation errors are raised before any remote call
//! - Remote errors leave the local store untouched
//! - Nothing here is fatal to the process

use storefront_core::{CoreError, ValidationError};
use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync error type covering all possible sync failures.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    /// A collaborator the operation needs was not wired in.
    #[error("Not configured: {0}")]
    NotConfigured(String),

    // =========================================================================
    // Remote Errors
    // =========================================================================
    /// The record service could not be reached.
    #[error("Network error: {0}")]
    Network(String),

    /// A remote call did not complete in time.
    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    /// The record service rejected the request.
    #[error("Service error: {0}")]
    Service(String),

    // =========================================================================
    // Local Data Errors
    // =========================================================================
    /// A row or stored value could not be decoded/encoded.
    #[error("Decode failed: {0}")]
    Decode(String),

    /// Key-value storage failed.
    #[error("Storage error: {0}")]
    Storage(String),

    // =========================================================================
    // Account Errors
    // =========================================================================
    /// Unknown user or wrong password (deliberately indistinguishable).
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Password hashing failed.
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    // =========================================================================
    // Domain Errors
    // =========================================================================
    /// Store or validation error from storefront-core.
    #[error(transparent)]
    Core(#[from] CoreError),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<ValidationError> for SyncError {
    fn from(err: ValidationError) -> Self {
        SyncError::Core(CoreError::Validation(err))
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Decode(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::Storage(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::ConfigSaveFailed(err.to_string())
    }
}

impl From<argon2::password_hash::Error> for SyncError {
    fn from(err: argon2::password_hash::Error) -> Self {
        SyncError::PasswordHash(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl SyncError {
    /// Returns true if retrying the same call later might succeed.
    ///
    /// Nothing retries automatically; the caller decides.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::Network(_) | SyncError::Timeout(_))
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_)
                | SyncError::ConfigLoadFailed(_)
                | SyncError::ConfigSaveFailed(_)
                | SyncError::NotConfigured(_)
        )
    }

    /// Returns true if this is bad user input.
    pub fn is_validation(&self) -> bool {
        matches!(self, SyncError::Core(CoreError::Validation(_)))
    }

    /// Returns true if the target product does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SyncError::Core(e) if e.is_not_found())
    }
}
