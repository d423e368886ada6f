//! # Synthetic Webhook Records
//!
//! Types and the store abstraction for webhooks that Hook-Keeper manages but
//! which do not exist at the upstream API. Records are written by the tooling
//! that provisions the phantom webhooks; this crate only ever reads them.

use crate::{HookId, RepoKey};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ============================================================================
// Record Type
// ============================================================================

/// A stored record describing one synthetic webhook
///
/// Records are keyed by the compound repository key and carry just enough
/// data to synthesize a full webhook entry: the identifier the
/// reconciliation tool will address DELETE/PATCH calls to, the delivery
/// target URL, and the registration timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntheticHookRecord {
    /// Webhook identifier, unique within the repository
    pub id: HookId,

    /// Webhook delivery target URL
    pub url: String,

    /// Registration timestamp, reported as both created and updated time
    pub date: String,

    /// Repository the record belongs to
    pub repo: RepoKey,
}

impl SyntheticHookRecord {
    /// Create a new record
    pub fn new(id: HookId, url: impl Into<String>, date: impl Into<String>, repo: RepoKey) -> Self {
        Self {
            id,
            url: url.into(),
            date: date.into(),
            repo,
        }
    }
}

// ============================================================================
// Store Abstraction
// ============================================================================

/// Errors raised by record store implementations
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// The store rejected or failed the query.
    #[error("Store query failed: {message}")]
    QueryFailed { message: String },

    /// The store could not be reached (retryable).
    #[error("Store unavailable: {message}")]
    Unavailable { message: String },

    /// An item came back without the expected attributes.
    #[error("Malformed record for key '{key}': {message}")]
    MalformedRecord { key: String, message: String },
}

impl StoreError {
    /// Check if this error represents a transient condition that may succeed
    /// if retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

/// Read-only access to synthetic webhook records
///
/// Implementations query a persistent store by exact match on the compound
/// repository key. An empty result is not an error; store access failures
/// are, and the caller decides how to surface them.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// List all records registered for the given repository.
    ///
    /// The returned order is whatever the store yields; callers must not
    /// rely on any particular ordering between records.
    async fn list_for_repo(&self, repo: &RepoKey) -> Result<Vec<SyntheticHookRecord>, StoreError>;
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
