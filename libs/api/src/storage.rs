//! Storage abstraction
//!
//! The application persists three things:
//!
//! - **Contributions**: one row per identity that pressed the button, ever.
//! - **Click counter**: a singleton integer, always equal to the number of
//!   contributions. It is only written inside the same transaction that
//!   inserts a contribution.
//! - **Browser sessions**: the server side of the session cookie.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use harmonist_shared::models::Identity;
use serde::{Deserialize, Serialize};

// Re-export implementations
pub use crate::local::storage::LocalStorage;

// =============================================================================
// Contribution Ledger
// =============================================================================

/// At-most-once contributions and the global click counter derived from them
#[async_trait]
pub trait ContributionLedger: Send + Sync {
    /// Record a contribution for `identity` and bump the counter.
    ///
    /// Fails with [`StorageError::AlreadyContributed`] (and changes nothing)
    /// when the identity has contributed before. Safe under concurrent calls
    /// for the same identity: exactly one of them succeeds.
    async fn record_contribution(
        &self,
        identity: &Identity,
    ) -> Result<ContributionReceipt, StorageError>;

    /// The contribution recorded for `identity_id`, if any
    async fn get_contribution(
        &self,
        identity_id: &str,
    ) -> Result<Option<Contribution>, StorageError>;

    /// Current value of the global counter (0 when never incremented)
    async fn click_count(&self) -> Result<u64, StorageError>;

    /// Number of contribution records
    async fn contribution_count(&self) -> Result<u64, StorageError>;

    /// Bring the counter back in line with the contribution records.
    ///
    /// Returns the reconciled count.
    async fn reconcile_counter(&self) -> Result<u64, StorageError>;

    // =========================================================================
    // Convenience Methods (with default implementations)
    // =========================================================================

    /// Whether `identity_id` already has a contribution
    async fn has_contributed(&self, identity_id: &str) -> Result<bool, StorageError> {
        Ok(self.get_contribution(identity_id).await?.is_some())
    }
}

// =============================================================================
// Session Store
// =============================================================================

/// Server-side browser sessions keyed by an opaque cookie token
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a new session for `identity`
    async fn create_session(
        &self,
        token: &str,
        identity: &Identity,
        expires_at: DateTime<Utc>,
    ) -> Result<BrowserSession, StorageError>;

    /// Look up a live session; expired sessions are reported as absent
    async fn get_session(&self, token: &str) -> Result<Option<BrowserSession>, StorageError>;

    /// Remove a session. Removing an unknown token is not an error.
    async fn delete_session(&self, token: &str) -> Result<(), StorageError>;

    /// Drop every session that expired before `now`, returning how many
    async fn prune_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, StorageError>;
}

/// Everything the web application needs from storage
pub trait AppStorage: ContributionLedger + SessionStore {}

impl<T: ContributionLedger + SessionStore> AppStorage for T {}

// =============================================================================
// Error Types
// =============================================================================

/// Storage operation errors
#[derive(Debug, Clone, PartialEq)]
pub enum StorageError {
    /// The identity already has a contribution
    AlreadyContributed,
    /// Invalid request
    InvalidRequest(String),
    /// Internal storage error
    Internal(String),
    /// Connection error
    Connection(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::AlreadyContributed => write!(f, "Identity has already contributed"),
            StorageError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            StorageError::Internal(msg) => write!(f, "Internal error: {}", msg),
            StorageError::Connection(msg) => write!(f, "Connection error: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<libsql::Error> for StorageError {
    fn from(error: libsql::Error) -> Self {
        StorageError::Internal(error.to_string())
    }
}

impl From<String> for StorageError {
    fn from(s: String) -> Self {
        StorageError::Internal(s)
    }
}

// =============================================================================
// Types
// =============================================================================

/// Outcome of a successful [`ContributionLedger::record_contribution`]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContributionReceipt {
    pub created: bool,
    /// Counter value after this contribution
    pub count: u64,
}

/// A persisted contribution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contribution {
    pub identity_id: String,
    pub display_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Server side of a browser session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrowserSession {
    pub token: String,
    pub identity: Identity,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl BrowserSession {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
