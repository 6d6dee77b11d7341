// lib/src/storage_engine/storage_engine.rs

use std::fmt::Debug;

use async_trait::async_trait;
use models::errors::CareResult;
use models::queries::{Document, FieldUpdate, Query};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

/// Capacity of the change feed. Receivers that fall further behind observe
/// `RecvError::Lagged` and must re-read.
pub const CHANGE_FEED_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Set,
    Updated,
    Deleted,
}

/// Published after every successful write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub collection: String,
    pub id: String,
    pub kind: ChangeKind,
}

/// Collection-scoped document store with a change feed. Documents are JSON
/// objects; each carries its own id in the `id` field.
#[async_trait]
pub trait DocumentStore: Send + Sync + Debug {
    async fn get(&self, collection: &str, id: &str) -> CareResult<Option<Document>>;

    async fn query(&self, collection: &str, query: &Query) -> CareResult<Vec<Document>>;

    /// Stores `data` under a freshly generated id and returns the id.
    async fn create(&self, collection: &str, data: Value) -> CareResult<String>;

    /// Creates or replaces the document `id`.
    async fn set(&self, collection: &str, id: &str, data: Value) -> CareResult<()>;

    /// Applies `updates` atomically to an existing document and returns the
    /// result. Fails with `NotFound` when the document does not exist.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        updates: &[FieldUpdate],
    ) -> CareResult<Document>;

    /// Removes the document. Deleting a missing document is a no-op.
    async fn delete(&self, collection: &str, id: &str) -> CareResult<()>;

    fn changes(&self) -> broadcast::Receiver<ChangeEvent>;

    fn get_type(&self) -> &'static str;
}

/// Sender side of the change feed shared by the engines.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        ChangeFeed { sender }
    }

    pub fn publish(&self, collection: &str, id: &str, kind: ChangeKind) {
        // No receivers is not an error.
        let _ = self.sender.send(ChangeEvent {
            collection: collection.to_string(),
            id: id.to_string(),
            kind,
        });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}
