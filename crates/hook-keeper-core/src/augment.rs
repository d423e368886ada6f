//! # Response Augmentation
//!
//! The merge algorithm at the heart of Hook-Keeper: given a relayed
//! webhook-listing response, decide whether augmentation applies, synthesize
//! entries for every stored record, and produce the replacement body.
//!
//! Augmentation is deliberately conservative. Unless every gate condition
//! holds, the upstream response passes through untouched so the relay stays
//! transparent for everything it does not understand.

use crate::hook::HookEntry;
use crate::record::{RecordStore, StoreError};
use crate::RepoKey;
use bytes::Bytes;
use http::{Method, StatusCode};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, warn};

// ============================================================================
// Policy
// ============================================================================

/// Which owner and repositories augmentation is allowed for
///
/// Built once from process configuration and never mutated. A request only
/// qualifies when its owner matches the single authorized owner and its
/// repository name is on the allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AugmentPolicy {
    owner: String,
    repositories: HashSet<String>,
}

impl AugmentPolicy {
    /// Create a policy from the authorized owner and repository allow-list.
    ///
    /// An empty owner yields a policy that never matches, turning the service
    /// into a pure relay.
    pub fn new(owner: impl Into<String>, repositories: impl IntoIterator<Item = String>) -> Self {
        Self {
            owner: owner.into(),
            repositories: repositories.into_iter().collect(),
        }
    }

    /// Policy that never authorizes augmentation.
    pub fn disabled() -> Self {
        Self::new("", Vec::new())
    }

    /// Check whether the requesting owner is the authorized owner.
    pub fn owner_authorized(&self, owner: &str) -> bool {
        !self.owner.is_empty() && owner == self.owner
    }

    /// Check whether the repository name is on the allow-list.
    pub fn repo_allowed(&self, repo: &str) -> bool {
        self.repositories.contains(repo)
    }
}

// ============================================================================
// Augmenter
// ============================================================================

/// Outcome of applying the augmentation gate to one relayed response
#[derive(Debug, Clone, PartialEq)]
pub enum AugmentOutcome {
    /// Gate closed; the upstream response stands as-is.
    Unchanged,

    /// Synthetic entries were merged; this body replaces the upstream body.
    /// Status and headers are left alone.
    Augmented { body: Bytes },

    /// The record store failed; this status and body replace the upstream
    /// response entirely.
    StoreFailed { status: StatusCode, body: Bytes },
}

/// Applies the augmentation gate and merge algorithm to relayed responses
pub struct Augmenter {
    policy: AugmentPolicy,
    store: Arc<dyn RecordStore>,
    api_base: String,
}

impl Augmenter {
    /// Create a new augmenter.
    ///
    /// `api_base` is the upstream base URL used when interpolating the
    /// derived resource URLs of synthetic entries.
    pub fn new(policy: AugmentPolicy, store: Arc<dyn RecordStore>, api_base: impl Into<String>) -> Self {
        Self {
            policy,
            store,
            api_base: api_base.into(),
        }
    }

    /// Get the active policy.
    pub fn policy(&self) -> &AugmentPolicy {
        &self.policy
    }

    /// Apply the gate and, when it passes, merge synthetic entries into the
    /// upstream body.
    ///
    /// # Gate
    ///
    /// All of the following must hold, otherwise the response passes through
    /// unmodified:
    /// 1. the inbound request was a GET (only listing responses are merged),
    /// 2. the upstream answered 200,
    /// 3. the owner is the authorized owner,
    /// 4. the repository is on the allow-list,
    /// 5. the upstream array is non-empty (the first real entry donates the
    ///    structural fields synthetic entries are built around).
    ///
    /// # Failure
    ///
    /// A store lookup failure is converted into a structured 500 response;
    /// it never propagates out of this method.
    pub async fn augment(
        &self,
        method: &Method,
        owner: &str,
        repo: &str,
        status: StatusCode,
        body: &Bytes,
    ) -> AugmentOutcome {
        if *method != Method::GET {
            return AugmentOutcome::Unchanged;
        }

        if status != StatusCode::OK {
            return AugmentOutcome::Unchanged;
        }

        if !self.policy.owner_authorized(owner) || !self.policy.repo_allowed(repo) {
            return AugmentOutcome::Unchanged;
        }

        let entries: Vec<HookEntry> = match serde_json::from_slice(body) {
            Ok(entries) => entries,
            Err(e) => {
                // A 200 from the listing endpoint should always be an array;
                // if it is not, relay it untouched rather than guessing.
                warn!(owner = %owner, repo = %repo, error = %e, "Upstream body is not a webhook array; passing through");
                return AugmentOutcome::Unchanged;
            }
        };

        if entries.is_empty() {
            debug!(owner = %owner, repo = %repo, "Upstream returned no webhooks; nothing to merge against");
            return AugmentOutcome::Unchanged;
        }

        let key = RepoKey::from_parts(owner, repo);
        let records = match self.store.list_for_repo(&key).await {
            Ok(records) => records,
            Err(e) => {
                error!(repo_key = %key, error = %e, "Record store lookup failed");
                return store_failure(&e);
            }
        };

        debug!(
            repo_key = %key,
            real_entries = entries.len(),
            synthetic_records = records.len(),
            "Merging synthetic webhook entries"
        );

        let template = entries[0].clone();
        let mut merged = entries;
        merged.extend(
            records
                .iter()
                .map(|record| HookEntry::synthetic(&template, record, &self.api_base)),
        );

        match serde_json::to_string_pretty(&merged) {
            Ok(body) => AugmentOutcome::Augmented {
                body: Bytes::from(body),
            },
            Err(e) => {
                // Entries were just deserialized from JSON, so this cannot
                // realistically happen; pass through rather than fail the relay.
                error!(repo_key = %key, error = %e, "Failed to re-serialize merged webhook array");
                AugmentOutcome::Unchanged
            }
        }
    }
}

/// Build the structured error response for a failed store lookup.
fn store_failure(error: &StoreError) -> AugmentOutcome {
    let payload = json!({
        "error": format!("Could not list webhooks: {}", error),
    });

    let body = serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string());

    AugmentOutcome::StoreFailed {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: Bytes::from(body),
    }
}

#[cfg(test)]
#[path = "augment_tests.rs"]
mod tests;
