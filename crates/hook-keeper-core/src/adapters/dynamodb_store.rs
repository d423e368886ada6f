//! # DynamoDB Record Store
//!
//! Production record store backed by a DynamoDB table keyed on the compound
//! repository key. The table is provisioned and written by the tooling that
//! registers phantom webhooks; this adapter only queries it.

use crate::record::{RecordStore, StoreError, SyntheticHookRecord};
use crate::{HookId, RepoKey};
use async_trait::async_trait;
use aws_sdk_dynamodb::error::{DisplayErrorContext, SdkError};
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use std::collections::HashMap;

/// DynamoDB-backed record store
///
/// Items are expected to carry the attributes `id` (N), `url` (S), `date`
/// (S), and `repo` (S), with `repo` as the partition key.
#[derive(Clone)]
pub struct DynamoDbRecordStore {
    client: Client,
    table_name: String,
}

impl DynamoDbRecordStore {
    /// Create a store from an existing client
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    /// Create a store using the ambient AWS configuration (credentials chain,
    /// region, endpoint overrides)
    pub async fn from_env(table_name: impl Into<String>) -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&config), table_name)
    }

    /// Table the store queries
    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

#[async_trait]
impl RecordStore for DynamoDbRecordStore {
    async fn list_for_repo(&self, repo: &RepoKey) -> Result<Vec<SyntheticHookRecord>, StoreError> {
        let output = self
            .client
            .query()
            .table_name(&self.table_name)
            .key_condition_expression("repo = :repo")
            .expression_attribute_values(":repo", AttributeValue::S(repo.as_str().to_string()))
            .send()
            .await
            .map_err(|e| {
                let message = format!("{}", DisplayErrorContext(&e));
                match &e {
                    SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => {
                        StoreError::Unavailable { message }
                    }
                    _ => StoreError::QueryFailed { message },
                }
            })?;

        output
            .items()
            .iter()
            .map(|item| parse_item(item, repo))
            .collect()
    }
}

/// Convert one DynamoDB item into a record.
fn parse_item(
    item: &HashMap<String, AttributeValue>,
    key: &RepoKey,
) -> Result<SyntheticHookRecord, StoreError> {
    let malformed = |message: &str| StoreError::MalformedRecord {
        key: key.as_str().to_string(),
        message: message.to_string(),
    };

    let id = item
        .get("id")
        .and_then(|v| v.as_n().ok())
        .ok_or_else(|| malformed("missing numeric attribute 'id'"))?
        .parse::<u64>()
        .map_err(|_| malformed("attribute 'id' is not an unsigned integer"))?;

    let url = item
        .get("url")
        .and_then(|v| v.as_s().ok())
        .ok_or_else(|| malformed("missing string attribute 'url'"))?;

    let date = item
        .get("date")
        .and_then(|v| v.as_s().ok())
        .ok_or_else(|| malformed("missing string attribute 'date'"))?;

    let repo = item
        .get("repo")
        .and_then(|v| v.as_s().ok())
        .ok_or_else(|| malformed("missing string attribute 'repo'"))?;
    let repo = RepoKey::new(repo.clone())
        .map_err(|e| malformed(&format!("attribute 'repo' is not a valid key: {}", e)))?;

    Ok(SyntheticHookRecord::new(
        HookId::new(id),
        url.as_str(),
        date.as_str(),
        repo,
    ))
}
