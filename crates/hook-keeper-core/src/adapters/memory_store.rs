//! # In-Memory Record Store
//!
//! Thread-safe in-memory implementation for testing and development.

use crate::record::{RecordStore, StoreError, SyntheticHookRecord};
use crate::RepoKey;
use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

/// In-memory record store backed by a HashMap
///
/// Thread-safe and suitable for unit/integration tests. A configurable
/// failure can be injected to exercise the store-failure path.
#[derive(Clone, Default)]
pub struct InMemoryRecordStore {
    records: Arc<RwLock<HashMap<RepoKey, Vec<SyntheticHookRecord>>>>,
    failure: Arc<RwLock<Option<StoreError>>>,
}

impl InMemoryRecordStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with records
    pub fn with_records(records: impl IntoIterator<Item = SyntheticHookRecord>) -> Self {
        let store = Self::new();
        for record in records {
            store.add_record(record);
        }
        store
    }

    /// Add a record under its repository key
    pub fn add_record(&self, record: SyntheticHookRecord) {
        self.records
            .write()
            .unwrap()
            .entry(record.repo.clone())
            .or_default()
            .push(record);
    }

    /// Make every subsequent lookup fail with the given error
    pub fn fail_with(&self, error: StoreError) {
        *self.failure.write().unwrap() = Some(error);
    }

    /// Clear any injected failure
    pub fn clear_failure(&self) {
        *self.failure.write().unwrap() = None;
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn list_for_repo(&self, repo: &RepoKey) -> Result<Vec<SyntheticHookRecord>, StoreError> {
        if let Some(error) = self.failure.read().unwrap().clone() {
            return Err(error);
        }

        Ok(self
            .records
            .read()
            .unwrap()
            .get(repo)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
#[path = "memory_store_tests.rs"]
mod tests;
