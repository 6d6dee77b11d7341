// lib/src/chat.rs

//! Two message stores. `ChatLog` is the live per-patient conversation under
//! `patients/{id}/messages`; `Inbox` is the root `messages` collection of
//! conversation summaries read by the patient dashboard. Neither writes to
//! the other.

use std::sync::Arc;

use log::{debug, info};
use models::collections::{patient_messages, MESSAGES};
use models::errors::CareResult;
use models::medical::{ChatMessage, MessageSummary, Principal};
use models::queries::{Direction, Query};

use crate::live::{subscribe, LiveQuery};
use crate::storage_engine::DocumentStore;

#[derive(Debug, Clone)]
pub struct ChatLog {
    store: Arc<dyn DocumentStore>,
    subscription_buffer: usize,
}

impl ChatLog {
    pub fn new(store: Arc<dyn DocumentStore>, subscription_buffer: usize) -> Self {
        ChatLog { store, subscription_buffer }
    }

    fn chronological() -> Query {
        Query::new().order_by("timestamp", Direction::Asc)
    }

    /// Appends a message from `sender`. Blank text is rejected.
    pub async fn send(
        &self,
        patient_id: &str,
        sender: &Principal,
        text: &str,
    ) -> CareResult<ChatMessage> {
        let message = ChatMessage::compose(sender, text)?;
        let id = self
            .store
            .create(&patient_messages(patient_id), serde_json::to_value(&message)?)
            .await?;
        debug!("{} sent message {} to chat of {}", sender.uid(), id, patient_id);
        Ok(ChatMessage { id, ..message })
    }

    pub async fn history(&self, patient_id: &str) -> CareResult<Vec<ChatMessage>> {
        self.store
            .query(&patient_messages(patient_id), &Self::chronological())
            .await?
            .iter()
            .map(|doc| doc.decode())
            .collect()
    }

    pub fn stream_for(&self, patient_id: &str) -> LiveQuery<ChatMessage> {
        subscribe(
            self.store.clone(),
            patient_messages(patient_id),
            Self::chronological(),
            self.subscription_buffer,
        )
    }
}

#[derive(Debug, Clone)]
pub struct Inbox {
    store: Arc<dyn DocumentStore>,
}

impl Inbox {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Inbox { store }
    }

    /// Summaries addressed to the patient, newest first.
    pub async fn recent_for(&self, patient_id: &str) -> CareResult<Vec<MessageSummary>> {
        let query = Query::new()
            .where_eq("patientId", patient_id)
            .order_by("timestamp", Direction::Desc);
        self.store
            .query(MESSAGES, &query)
            .await?
            .iter()
            .map(|doc| doc.decode())
            .collect()
    }

    pub async fn post_summary(&self, summary: &MessageSummary) -> CareResult<String> {
        let id = self.store.create(MESSAGES, serde_json::to_value(summary)?).await?;
        info!("Posted message summary {} for patient {}", id, summary.patient_id);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage_engine::InMemoryStorage;
    use models::errors::{CareError, ValidationError};
    use models::identifiers::Email;
    use models::medical::{DoctorPrincipal, PatientPrincipal};
    use std::time::Duration;
    use tokio::time::timeout;

    fn doctor() -> Principal {
        Principal::Doctor(DoctorPrincipal {
            uid: "d1".into(),
            email: Email::parse("house@clinic.org").unwrap(),
            display_name: "house".into(),
        })
    }

    fn patient() -> Principal {
        Principal::Patient(PatientPrincipal {
            uid: "p1".into(),
            email: Email::parse("p@x.com").unwrap(),
            name: "Pat".into(),
        })
    }

    #[tokio::test]
    async fn sent_message_reaches_the_stream() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStorage::new());
        let chat = ChatLog::new(store, 16);
        let mut live = chat.stream_for("p1");
        timeout(Duration::from_secs(2), live.next_snapshot()).await.unwrap().unwrap().unwrap();

        chat.send("p1", &doctor(), "How are you feeling?").await.unwrap();
        let snapshot = timeout(Duration::from_secs(2), live.next_snapshot()).await.unwrap().unwrap().unwrap();
        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.items[0].text, "How are you feeling?");
        assert_eq!(snapshot.items[0].sender_id, "d1");
    }

    #[tokio::test]
    async fn history_is_chronological_and_scoped() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStorage::new());
        let chat = ChatLog::new(store, 16);
        chat.send("p1", &doctor(), "first").await.unwrap();
        chat.send("p1", &patient(), "second").await.unwrap();
        chat.send("p2", &doctor(), "elsewhere").await.unwrap();

        let history = chat.history("p1").await.unwrap();
        let texts: Vec<_> = history.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
        assert_eq!(history[1].sender_name, "Pat");
    }

    #[tokio::test]
    async fn back_to_back_sends_keep_their_order() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStorage::new());
        let chat = ChatLog::new(store, 16);
        let sent: Vec<String> = (0..200).map(|i| format!("m{:03}", i)).collect();
        for text in &sent {
            chat.send("p1", &doctor(), text).await.unwrap();
        }

        let history: Vec<String> = chat.history("p1").await.unwrap().into_iter().map(|m| m.text).collect();
        assert_eq!(history, sent);
    }

    #[tokio::test]
    async fn text_is_stored_exactly_as_sent() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStorage::new());
        let chat = ChatLog::new(store, 16);
        let text = "  indented\n  code  ";
        let sent = chat.send("p1", &patient(), text).await.unwrap();
        assert_eq!(sent.text, text);

        let history = chat.history("p1").await.unwrap();
        assert_eq!(history[0].text, text);

        let mut live = chat.stream_for("p1");
        let snapshot = timeout(Duration::from_secs(2), live.next_snapshot()).await.unwrap().unwrap().unwrap();
        assert_eq!(snapshot.items[0].text, text);
    }

    #[tokio::test]
    async fn blank_messages_are_rejected() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStorage::new());
        let chat = ChatLog::new(store, 16);
        let result = chat.send("p1", &doctor(), "  \n").await;
        assert!(matches!(result, Err(CareError::Validation(ValidationError::EmptyMessage))));
        assert!(chat.history("p1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn inbox_is_independent_of_chat() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStorage::new());
        let chat = ChatLog::new(store.clone(), 16);
        let inbox = Inbox::new(store);

        chat.send("p1", &doctor(), "hello").await.unwrap();
        assert!(inbox.recent_for("p1").await.unwrap().is_empty());

        let mut older = MessageSummary::new("p1", "d1", "house", "old");
        older.timestamp = "2024-01-01T00:00:00.000Z".into();
        inbox.post_summary(&older).await.unwrap();
        inbox.post_summary(&MessageSummary::new("p1", "d1", "house", "new")).await.unwrap();

        let recent = inbox.recent_for("p1").await.unwrap();
        assert_eq!(recent[0].last_message, "new");
        assert_eq!(recent[1].last_message, "old");
    }
}
