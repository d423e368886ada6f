//! # Hook-Keeper Core
//!
//! Core business logic for the Hook-Keeper webhook relay.
//!
//! This crate contains the domain logic for augmenting relayed GitHub
//! webhook-listing responses: deciding when augmentation applies, looking up
//! synthetic webhook records in a persistent store, and merging synthetic
//! webhook entries into the upstream JSON payload so that downstream tooling
//! sees them as real webhooks.
//!
//! ## Architecture
//!
//! The core follows clean architecture principles:
//! - Business logic depends only on trait abstractions
//! - Store implementations are injected at runtime
//! - HTTP transport concerns live in the service crate, not here
//!
//! ## Usage
//!
//! ```rust
//! use hook_keeper_core::RepoKey;
//!
//! let key = RepoKey::from_parts("octocat", "widgets");
//! assert_eq!(key.as_str(), "octocat/widgets");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod adapters;
pub mod augment;
pub mod hook;
pub mod record;

// Re-export commonly used types
pub use augment::{AugmentOutcome, AugmentPolicy, Augmenter};
pub use hook::{HookConfig, HookEntry, REDACTED_SECRET};
pub use record::{RecordStore, StoreError, SyntheticHookRecord};

// ============================================================================
// Domain Identifier Types
// ============================================================================

/// Compound repository key in `{owner}/{name}` form
///
/// This is the partition key under which synthetic webhook records are stored,
/// and the identity a relayed request is matched against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoKey(String);

impl RepoKey {
    /// Create a new repository key with validation
    ///
    /// # Validation Rules
    /// - Must contain exactly one `/` separating owner and name
    /// - Neither owner nor name may be empty
    /// - Must contain only printable ASCII without whitespace
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();

        if value.is_empty() {
            return Err(ValidationError::Required {
                field: "repo_key".to_string(),
            });
        }

        if !value.chars().all(|c| c.is_ascii_graphic()) {
            return Err(ValidationError::InvalidCharacters {
                field: "repo_key".to_string(),
                invalid_chars: "non-ASCII or whitespace".to_string(),
            });
        }

        let mut parts = value.splitn(2, '/');
        let owner = parts.next().unwrap_or_default();
        let name = parts.next();

        match name {
            Some(name) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Self(value))
            }
            _ => Err(ValidationError::InvalidFormat {
                field: "repo_key".to_string(),
                message: "expected '{owner}/{name}' with non-empty parts".to_string(),
            }),
        }
    }

    /// Create a repository key from its component parts
    pub fn from_parts(owner: &str, name: &str) -> Self {
        Self(format!("{}/{}", owner, name))
    }

    /// Get string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Owner (user or organization) component
    pub fn owner(&self) -> &str {
        self.0.split('/').next().unwrap_or_default()
    }

    /// Repository name component
    pub fn name(&self) -> &str {
        self.0.splitn(2, '/').nth(1).unwrap_or_default()
    }
}

impl fmt::Display for RepoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RepoKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

/// Numeric webhook identifier as assigned by the upstream API (or by the
/// tooling that registered a synthetic record)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HookId(u64);

impl HookId {
    /// Create new hook ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get numeric value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for HookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for HookId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.parse::<u64>().map_err(|_| ParseError::InvalidFormat {
            expected: "positive integer".to_string(),
            actual: s.to_string(),
        })?;
        Ok(Self::new(id))
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Error type for input validation failures
#[derive(Debug, Clone, thiserror::Error, Serialize, Deserialize)]
pub enum ValidationError {
    #[error("Field '{field}' is required")]
    Required { field: String },

    #[error("Field '{field}' has invalid format: {message}")]
    InvalidFormat { field: String, message: String },

    #[error("Field '{field}' contains invalid characters: {invalid_chars}")]
    InvalidCharacters {
        field: String,
        invalid_chars: String,
    },
}

/// Error type for string parsing failures
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid format: expected {expected}, got '{actual}'")]
    InvalidFormat { expected: String, actual: String },
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
