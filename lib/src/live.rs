// lib/src/live.rs

//! Live queries: a query bound to the store's change feed that redelivers the
//! full matching result set whenever its collection changes.
//!
//! Each delivery is an authoritative replacement of the previous one. There is
//! no ordering between two different live queries.

use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use log::{debug, warn};
use models::errors::CareResult;
use models::queries::Query;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::storage_engine::DocumentStore;

/// One full result set. `sequence` starts at 1 and increases by one per
/// delivery of the same live query.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    pub items: Vec<T>,
    pub sequence: u64,
}

pub struct LiveQuery<T> {
    collection: String,
    receiver: mpsc::Receiver<CareResult<Snapshot<T>>>,
    task: Option<JoinHandle<()>>,
    closed: bool,
    _marker: PhantomData<fn() -> T>,
}

/// Attaches a live query on `collection`. Must be called from within a tokio
/// runtime.
///
/// The change feed is registered before the initial read, so a write racing
/// with the attach is either part of the first snapshot or triggers a second.
pub fn subscribe<T>(
    store: Arc<dyn DocumentStore>,
    collection: impl Into<String>,
    query: Query,
    buffer: usize,
) -> LiveQuery<T>
where
    T: DeserializeOwned + Send + 'static,
{
    let collection = collection.into();
    let (sender, receiver) = mpsc::channel(buffer.max(1));
    let mut changes = store.changes();
    debug!("Attaching live query on {} with {} filter(s)", collection, query.filters.len());

    let task_collection = collection.clone();
    let task = tokio::spawn(async move {
        let collection = task_collection;
        let mut sequence = 0u64;
        loop {
            let result = read_snapshot::<T>(store.as_ref(), &collection, &query)
                .await
                .map(|items| {
                    sequence += 1;
                    Snapshot { items, sequence }
                });
            if let Err(e) = &result {
                warn!("Live query on {} failed to read: {}", collection, e);
            }
            if sender.send(result).await.is_err() {
                break;
            }

            if !wait_for_change(&mut changes, &collection).await {
                break;
            }
        }
        debug!("Live query on {} finished", collection);
    });

    LiveQuery { collection, receiver, task: Some(task), closed: false, _marker: PhantomData }
}

async fn read_snapshot<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &str,
    query: &Query,
) -> CareResult<Vec<T>> {
    store
        .query(collection, query)
        .await?
        .iter()
        .map(|doc| doc.decode::<T>())
        .collect()
}

/// Waits until `collection` changes. Events already queued behind the first
/// relevant one are drained, since the next read covers them. Returns false
/// once the feed is closed.
async fn wait_for_change(
    changes: &mut tokio::sync::broadcast::Receiver<crate::storage_engine::ChangeEvent>,
    collection: &str,
) -> bool {
    loop {
        match changes.recv().await {
            Ok(event) if event.collection == collection => break,
            Ok(_) => continue,
            Err(RecvError::Lagged(skipped)) => {
                warn!("Live query on {} lagged by {} change(s), re-reading", collection, skipped);
                break;
            }
            Err(RecvError::Closed) => return false,
        }
    }
    loop {
        match changes.try_recv() {
            Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Empty) => return true,
            Err(TryRecvError::Closed) => return false,
        }
    }
}

impl<T> LiveQuery<T> {
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Waits for the next delivery. Returns `None` after teardown.
    pub async fn next_snapshot(&mut self) -> Option<CareResult<Snapshot<T>>> {
        if self.closed {
            return None;
        }
        self.receiver.recv().await
    }

    pub fn is_active(&self) -> bool {
        !self.closed && self.task.as_ref().map_or(false, |task| !task.is_finished())
    }

    /// Tears the query down. Buffered deliveries are discarded.
    pub fn unsubscribe(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.receiver.close();
        while self.receiver.try_recv().is_ok() {}
        debug!("Detached live query on {}", self.collection);
    }
}

impl<T> Drop for LiveQuery<T> {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl<T> Stream for LiveQuery<T> {
    type Item = CareResult<Snapshot<T>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.closed {
            return Poll::Ready(None);
        }
        this.receiver.poll_recv(cx)
    }
}

impl<T> std::fmt::Debug for LiveQuery<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveQuery")
            .field("collection", &self.collection)
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage_engine::InMemoryStorage;
    use futures::StreamExt;
    use models::queries::Direction;
    use serde::Deserialize;
    use serde_json::json;
    use std::time::Duration;
    use tokio::time::timeout;

    #[derive(Debug, Deserialize)]
    struct Row {
        id: String,
        date: String,
    }

    fn appointments_for(patient: &str) -> Query {
        Query::new().where_eq("patientId", patient).order_by("date", Direction::Desc)
    }

    async fn next(live: &mut LiveQuery<Row>) -> Snapshot<Row> {
        timeout(Duration::from_secs(2), live.next_snapshot())
            .await
            .expect("snapshot in time")
            .expect("stream open")
            .expect("query ok")
    }

    #[tokio::test]
    async fn delivers_initial_then_full_replacements() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStorage::new());
        store.create("appointments", json!({"patientId": "p1", "date": "2024-06-01T10:00"})).await.unwrap();

        let mut live = subscribe::<Row>(store.clone(), "appointments", appointments_for("p1"), 16);
        let first = next(&mut live).await;
        assert_eq!(first.sequence, 1);
        assert_eq!(first.items.len(), 1);

        let id = store
            .create("appointments", json!({"patientId": "p1", "date": "2024-07-01T10:00"}))
            .await
            .unwrap();
        let second = next(&mut live).await;
        assert_eq!(second.sequence, 2);
        assert_eq!(second.items.len(), 2);
        assert_eq!(second.items[0].id, id);
        assert_eq!(second.items[0].date, "2024-07-01T10:00");
    }

    #[tokio::test]
    async fn ignores_other_collections() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStorage::new());
        let mut live = subscribe::<Row>(store.clone(), "appointments", appointments_for("p1"), 16);
        next(&mut live).await;

        store.create("doctorNotes", json!({"patientId": "p1", "date": "2024-06-01"})).await.unwrap();
        assert!(timeout(Duration::from_millis(150), live.next_snapshot()).await.is_err());
    }

    #[tokio::test]
    async fn unsubscribe_stops_delivery() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStorage::new());
        let mut live = subscribe::<Row>(store.clone(), "appointments", appointments_for("p1"), 16);
        next(&mut live).await;
        assert!(live.is_active());

        live.unsubscribe();
        store.create("appointments", json!({"patientId": "p1", "date": "2024-06-01T10:00"})).await.unwrap();
        assert!(!live.is_active());
        assert!(live.next_snapshot().await.is_none());
    }

    #[tokio::test]
    async fn works_as_a_stream() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStorage::new());
        let mut live = subscribe::<Row>(store.clone(), "appointments", appointments_for("p1"), 1);
        let first = timeout(Duration::from_secs(2), live.next()).await.unwrap().unwrap().unwrap();
        assert!(first.items.is_empty());
    }
}
