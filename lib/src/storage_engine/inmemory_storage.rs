// lib/src/storage_engine/inmemory_storage.rs

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use models::errors::{CareError, CareResult};
use models::queries::{apply_updates, Document, FieldUpdate, Query};
use serde_json::Value;
use tokio::sync::{broadcast, RwLock};

use super::storage_engine::{ChangeEvent, ChangeFeed, ChangeKind, DocumentStore};
use super::storage_utils::{prepare_new_document, stamp_id};

type Collection = BTreeMap<String, Value>;

#[derive(Debug)]
pub struct InMemoryStorage {
    collections: Arc<RwLock<HashMap<String, Collection>>>,
    feed: ChangeFeed,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        InMemoryStorage {
            collections: Arc::new(RwLock::new(HashMap::new())),
            feed: ChangeFeed::new(),
        }
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStorage {
    async fn get(&self, collection: &str, id: &str) -> CareResult<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| Document::new(id, data.clone())))
    }

    async fn query(&self, collection: &str, query: &Query) -> CareResult<Vec<Document>> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(query.apply(docs.iter().map(|(id, data)| Document::new(id.clone(), data.clone()))))
    }

    async fn create(&self, collection: &str, data: Value) -> CareResult<String> {
        let (id, data) = prepare_new_document(data)?;
        {
            let mut collections = self.collections.write().await;
            collections.entry(collection.to_string()).or_default().insert(id.clone(), data);
        }
        debug!("Created {}/{}", collection, id);
        self.feed.publish(collection, &id, ChangeKind::Created);
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, data: Value) -> CareResult<()> {
        let data = stamp_id(data, id)?;
        {
            let mut collections = self.collections.write().await;
            collections.entry(collection.to_string()).or_default().insert(id.to_string(), data);
        }
        self.feed.publish(collection, id, ChangeKind::Set);
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        updates: &[FieldUpdate],
    ) -> CareResult<Document> {
        let updated = {
            let mut collections = self.collections.write().await;
            let data = collections
                .get_mut(collection)
                .and_then(|docs| docs.get_mut(id))
                .ok_or_else(|| CareError::NotFound(format!("{}/{}", collection, id)))?;
            // Work on a copy so a failed update leaves the document untouched.
            let mut next = data.clone();
            apply_updates(&mut next, updates)?;
            *data = next.clone();
            next
        };
        self.feed.publish(collection, id, ChangeKind::Updated);
        Ok(Document::new(id, updated))
    }

    async fn delete(&self, collection: &str, id: &str) -> CareResult<()> {
        let removed = {
            let mut collections = self.collections.write().await;
            collections.get_mut(collection).and_then(|docs| docs.remove(id)).is_some()
        };
        if removed {
            self.feed.publish(collection, id, ChangeKind::Deleted);
        }
        Ok(())
    }

    fn changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.feed.subscribe()
    }

    fn get_type(&self) -> &'static str {
        "InMemory"
    }
}
