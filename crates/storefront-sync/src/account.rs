//! # Accounts
//!
//! Registration, login and the locally stored session.
//!
//! ## Credential Handling
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  register:  password ──► Argon2 (random salt) ──► PHC string ──► user  │
//! │  login:     password ──► verify against stored PHC string              │
//! │  session:   { user_id, username, email, logged_in_at } ──► user_data   │
//! │                                                                         │
//! │  The plaintext password is never written, logged or sent anywhere.     │
//! │  Unknown user and wrong password give the same InvalidCredentials.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use storefront_core::validation::{validate_email, validate_password, validate_username};
use storefront_core::ValidationError;

use crate::error::{SyncError, SyncResult};
use crate::persistence::{keys, read_json, write_json, KeyValueStore};
use crate::protocol::{decode_rows, encode_row, UserInsertRow, UserRow, USERNAME, USER_TABLE};
use crate::service::{with_timeout, Query, RecordService};

// =============================================================================
// Types
// =============================================================================

/// Sign-up form input.
#[derive(Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Login form input.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Public account data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl From<UserRow> for UserProfile {
    fn from(row: UserRow) -> Self {
        UserProfile {
            id: row.id,
            username: row.username,
            email: row.email,
        }
    }
}

/// The logged-in user, as stored under `user_data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    /// RFC 3339.
    pub logged_in_at: String,
}

// =============================================================================
// Account Service
// =============================================================================

pub struct AccountService {
    service: Arc<dyn RecordService>,
    kv: Arc<dyn KeyValueStore>,
    timeout: Duration,
}

impl std::fmt::Debug for AccountService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountService")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl AccountService {
    pub fn new(
        service: Arc<dyn RecordService>,
        kv: Arc<dyn KeyValueStore>,
        timeout: Duration,
    ) -> Self {
        AccountService {
            service,
            kv,
            timeout,
        }
    }

    /// Creates an account.
    ///
    /// ## Errors
    /// - Validation errors for username, email and password (in that order)
    /// - `Duplicate` if the username is taken
    pub async fn register(&self, registration: &Registration) -> SyncResult<UserProfile> {
        let username = validate_username(&registration.username)?;
        let email = validate_email(&registration.email)?;
        validate_password(&registration.password)?;

        if self.find_user(&username).await?.is_some() {
            return Err(ValidationError::Duplicate {
                field: "username".into(),
                value: username,
            }
            .into());
        }

        let row = UserInsertRow {
            username,
            email,
            password_hash: hash_password(&registration.password)?,
        };
        let inserted = with_timeout(
            self.timeout,
            self.service.insert(USER_TABLE, encode_row(&row)?),
        )
        .await?;

        let profile: UserProfile = serde_json::from_value::<UserRow>(inserted)?.into();
        info!(user_id = profile.id, username = %profile.username, "Account registered");
        Ok(profile)
    }

    /// Verifies credentials and stores the session.
    pub async fn login(&self, credentials: &Credentials) -> SyncResult<UserSession> {
        let username = credentials.username.trim();
        if username.is_empty() {
            return Err(ValidationError::Required {
                field: "username".into(),
            }
            .into());
        }
        if credentials.password.is_empty() {
            return Err(ValidationError::Required {
                field: "password".into(),
            }
            .into());
        }

        let Some(user) = self.find_user(username).await? else {
            // Unknown users pay for one verification, like a wrong password.
            let _ = verify_password(&credentials.password, UNKNOWN_USER_HASH);
            debug!(username, "Login for unknown user");
            return Err(SyncError::InvalidCredentials);
        };

        if !verify_password(&credentials.password, &user.password_hash) {
            debug!(username, "Login with wrong password");
            return Err(SyncError::InvalidCredentials);
        }

        let session = UserSession {
            user_id: user.id,
            username: user.username,
            email: user.email,
            logged_in_at: chrono::Utc::now().to_rfc3339(),
        };
        write_json(&*self.kv, keys::USER_DATA, &session).await?;

        info!(user_id = session.user_id, username = %session.username, "Logged in");
        Ok(session)
    }

    /// Clears the stored session.
    pub async fn logout(&self) -> SyncResult<()> {
        self.kv.remove(keys::USER_DATA).await?;
        info!("Logged out");
        Ok(())
    }

    /// The stored session, if any.
    pub async fn current_session(&self) -> Option<UserSession> {
        read_json(&*self.kv, keys::USER_DATA).await
    }

    async fn find_user(&self, username: &str) -> SyncResult<Option<UserRow>> {
        let rows = with_timeout(
            self.timeout,
            self.service
                .select(&Query::table(USER_TABLE).eq(USERNAME, username)),
        )
        .await?;
        Ok(decode_rows::<UserRow>(rows)?.into_iter().next())
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Hashes a password into a PHC string.
fn hash_password(password: &str) -> SyncResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verified against when the username does not exist. Uses the same
/// parameters as `Argon2::default()`; no password matches it.
const UNKNOWN_USER_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c3RvcmVmcm9udC1kdW1teQ$VfvEbk5zTG2N4FTnqw20WU/wlVjWZrtfwssytRBP1Ag";

/// Verifies a password against a stored PHC string.
fn verify_password(password: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(e) => {
            warn!(error = %e, "Stored password hash is malformed");
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
