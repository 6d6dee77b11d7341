// lib/src/storage_engine/sled_storage.rs

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{debug, error, info};
use models::errors::{CareError, CareResult};
use models::queries::{apply_updates, Document, FieldUpdate, Query};
use serde_json::Value;
use tokio::sync::broadcast;

use super::storage_engine::{ChangeEvent, ChangeFeed, ChangeKind, DocumentStore};
use super::storage_utils::{deserialize_document, prepare_new_document, serialize_document, stamp_id};

/// Persistent engine backed by sled. Each collection path maps to its own
/// tree; values are JSON-encoded document bodies keyed by document id.
#[derive(Debug)]
pub struct SledStorage {
    db: sled::Db,
    path: PathBuf,
    feed: ChangeFeed,
}

fn storage_error(context: &str, e: sled::Error) -> CareError {
    error!("{}: {}", context, e);
    CareError::Storage(format!("{}: {}", context, e))
}

impl SledStorage {
    /// Opens (or creates) the database under `path`.
    pub fn new(path: &Path) -> CareResult<Self> {
        info!("Opening Sled database at {:?}", path);
        std::fs::create_dir_all(path).map_err(|e| {
            error!("Failed to create database directory at {:?}: {}", path, e);
            CareError::Storage(format!("Failed to create database directory at {:?}: {}", path, e))
        })?;
        let db = sled::Config::new()
            .path(path)
            .open()
            .map_err(|e| storage_error(&format!("Failed to open Sled database at {:?}", path), e))?;
        info!("Successfully opened Sled database at {:?}", path);
        Ok(SledStorage { db, path: path.to_path_buf(), feed: ChangeFeed::new() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tree(&self, collection: &str) -> CareResult<sled::Tree> {
        self.db
            .open_tree(collection.as_bytes())
            .map_err(|e| storage_error(&format!("Failed to open tree {}", collection), e))
    }

    pub async fn flush(&self) -> CareResult<()> {
        self.db.flush_async().await.map_err(|e| storage_error("Failed to flush Sled database", e))?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for SledStorage {
    async fn get(&self, collection: &str, id: &str) -> CareResult<Option<Document>> {
        let tree = self.tree(collection)?;
        match tree.get(id.as_bytes()).map_err(|e| storage_error("get", e))? {
            Some(bytes) => Ok(Some(Document::new(id, deserialize_document(&bytes)?))),
            None => Ok(None),
        }
    }

    async fn query(&self, collection: &str, query: &Query) -> CareResult<Vec<Document>> {
        let tree = self.tree(collection)?;
        let mut documents = Vec::new();
        for entry in tree.iter() {
            let (key, value) = entry.map_err(|e| storage_error("scan", e))?;
            let id = String::from_utf8_lossy(&key).into_owned();
            documents.push(Document::new(id, deserialize_document(&value)?));
        }
        Ok(query.apply(documents))
    }

    async fn create(&self, collection: &str, data: Value) -> CareResult<String> {
        let (id, data) = prepare_new_document(data)?;
        let tree = self.tree(collection)?;
        tree.insert(id.as_bytes(), serialize_document(&data)?)
            .map_err(|e| storage_error("insert", e))?;
        debug!("Created {}/{} in sled", collection, id);
        self.feed.publish(collection, &id, ChangeKind::Created);
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, data: Value) -> CareResult<()> {
        let data = stamp_id(data, id)?;
        let tree = self.tree(collection)?;
        tree.insert(id.as_bytes(), serialize_document(&data)?)
            .map_err(|e| storage_error("insert", e))?;
        self.feed.publish(collection, id, ChangeKind::Set);
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        updates: &[FieldUpdate],
    ) -> CareResult<Document> {
        let tree = self.tree(collection)?;
        let mut failure: Option<CareError> = None;

        // update_and_fetch may retry the closure under contention; each run
        // starts from the latest stored bytes.
        let result = tree
            .update_and_fetch(id.as_bytes(), |current| {
                let bytes = current?;
                failure = None;
                let outcome = deserialize_document(bytes).and_then(|mut data| {
                    apply_updates(&mut data, updates)?;
                    serialize_document(&data)
                });
                match outcome {
                    Ok(next) => Some(next),
                    Err(e) => {
                        failure = Some(e);
                        Some(bytes.to_vec())
                    }
                }
            })
            .map_err(|e| storage_error("update", e))?;

        if let Some(e) = failure {
            return Err(e);
        }
        let bytes = result.ok_or_else(|| CareError::NotFound(format!("{}/{}", collection, id)))?;
        self.feed.publish(collection, id, ChangeKind::Updated);
        Ok(Document::new(id, deserialize_document(&bytes)?))
    }

    async fn delete(&self, collection: &str, id: &str) -> CareResult<()> {
        let tree = self.tree(collection)?;
        let removed = tree.remove(id.as_bytes()).map_err(|e| storage_error("remove", e))?;
        if removed.is_some() {
            self.feed.publish(collection, id, ChangeKind::Deleted);
        }
        Ok(())
    }

    fn changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.feed.subscribe()
    }

    fn get_type(&self) -> &'static str {
        "Sled"
    }
}
