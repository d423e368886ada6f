//! # Webhook Entry Schema
//!
//! Typed representation of the webhook objects returned by the upstream
//! listing endpoint, plus the constructor that synthesizes entries from
//! stored records.
//!
//! The upstream payload is parsed into `Vec<HookEntry>` and re-serialized
//! after synthetic entries are appended. Fields this crate never touches are
//! carried through a flattened map so real entries survive the round trip
//! with all of their data intact.

use crate::{HookId, SyntheticHookRecord};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Placeholder reported instead of a webhook secret.
///
/// The upstream API redacts secrets the same way; synthetic entries must be
/// indistinguishable from real ones.
pub const REDACTED_SECRET: &str = "********";

// ============================================================================
// Config Object
// ============================================================================

/// The `config` object nested inside a webhook entry
///
/// All fields are optional on the wire; real entries may omit any of them.
/// Synthetic entries always carry the full fixed set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HookConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// String on modern API versions, number on some older payloads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insecure_ssl: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Any additional config fields the upstream returns.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HookConfig {
    /// Build the fixed config object for a synthetic entry.
    ///
    /// A fresh object is always constructed so the template entry's config is
    /// never shared or mutated.
    pub fn synthetic(delivery_url: &str) -> Self {
        Self {
            content_type: Some("json".to_string()),
            insecure_ssl: Some(Value::String("0".to_string())),
            secret: Some(REDACTED_SECRET.to_string()),
            url: Some(delivery_url.to_string()),
            extra: Map::new(),
        }
    }
}

// ============================================================================
// Webhook Entry
// ============================================================================

/// One element of the upstream webhook-listing array
///
/// The named fields are the ones augmentation overwrites; everything else
/// (`type`, `name`, `active`, `events`, `last_response`, ...) rides along in
/// `extra` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookEntry {
    pub id: HookId,
    pub url: String,
    pub test_url: String,
    pub ping_url: String,
    pub deliveries_url: String,
    pub created_at: String,
    pub updated_at: String,
    pub config: HookConfig,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HookEntry {
    /// Synthesize an entry for a stored record.
    ///
    /// The template is the first real entry the upstream returned; its
    /// structural fields (`extra`) are cloned so the synthetic entry has the
    /// same shape as a real one, then everything record-specific is
    /// overwritten. `api_base` is the upstream base URL the derived resource
    /// URLs are interpolated into.
    pub fn synthetic(template: &HookEntry, record: &SyntheticHookRecord, api_base: &str) -> Self {
        let base = api_base.trim_end_matches('/');
        let hook_url = format!("{}/repos/{}/hooks/{}", base, record.repo, record.id);

        Self {
            id: record.id,
            test_url: format!("{}/test", hook_url),
            ping_url: format!("{}/pings", hook_url),
            deliveries_url: format!("{}/deliveries", hook_url),
            url: hook_url,
            created_at: record.date.clone(),
            updated_at: record.date.clone(),
            config: HookConfig::synthetic(&record.url),
            extra: template.extra.clone(),
        }
    }
}

#[cfg(test)]
#[path = "hook_tests.rs"]
mod tests;
