//! Tests for the in-memory record store

use super::*;
use crate::HookId;

fn record(repo: &RepoKey, id: u64) -> SyntheticHookRecord {
    SyntheticHookRecord::new(
        HookId::new(id),
        format!("https://reconciler.example.com/hooks/{}", id),
        "2023-02-03T10:30:00Z",
        repo.clone(),
    )
}

#[tokio::test]
async fn test_lookup_on_empty_store_returns_no_records() {
    let store = InMemoryRecordStore::new();
    let key = RepoKey::from_parts("octocat", "widgets");

    let records = store.list_for_repo(&key).await.unwrap();

    assert!(records.is_empty());
}

#[tokio::test]
async fn test_lookup_returns_records_in_insertion_order() {
    let key = RepoKey::from_parts("octocat", "widgets");
    let store = InMemoryRecordStore::new();
    store.add_record(record(&key, 1));
    store.add_record(record(&key, 2));
    store.add_record(record(&key, 3));

    let records = store.list_for_repo(&key).await.unwrap();

    let ids: Vec<u64> = records.iter().map(|r| r.id.as_u64()).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_lookup_is_scoped_to_the_requested_key() {
    let widgets = RepoKey::from_parts("octocat", "widgets");
    let gadgets = RepoKey::from_parts("octocat", "gadgets");
    let store = InMemoryRecordStore::with_records([record(&widgets, 1), record(&gadgets, 2)]);

    let records = store.list_for_repo(&widgets).await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id.as_u64(), 1);
}

#[tokio::test]
async fn test_injected_failure_is_returned_until_cleared() {
    let key = RepoKey::from_parts("octocat", "widgets");
    let store = InMemoryRecordStore::with_records([record(&key, 1)]);

    store.fail_with(StoreError::Unavailable {
        message: "connection refused".to_string(),
    });
    assert!(matches!(
        store.list_for_repo(&key).await,
        Err(StoreError::Unavailable { .. })
    ));

    store.clear_failure();
    assert_eq!(store.list_for_repo(&key).await.unwrap().len(), 1);
}
