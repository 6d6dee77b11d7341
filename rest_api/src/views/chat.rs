// rest_api/src/views/chat.rs

use carebridge_lib::chat::ChatLog;
use carebridge_lib::live::{LiveQuery, Snapshot};
use carebridge_lib::services::CareServices;
use log::debug;
use models::errors::{CareError, CareResult};
use models::medical::{ChatMessage, Principal};
use security::SessionWatcher;

use super::{authorize_patient_access, signed_in};

#[derive(Debug, Clone, PartialEq)]
pub enum ChatUpdate {
    /// The whole conversation, oldest first.
    Messages(Vec<ChatMessage>),
    Closed,
}

enum Event {
    SignedOut,
    Messages(Option<CareResult<Snapshot<ChatMessage>>>),
}

#[derive(Debug)]
pub struct ChatView {
    patient_id: String,
    patient_name: String,
    sender: Principal,
    chat: ChatLog,
    messages: LiveQuery<ChatMessage>,
    session: SessionWatcher,
    closed: bool,
}

impl ChatView {
    pub async fn open(
        services: &CareServices,
        patient_id: &str,
        session: SessionWatcher,
    ) -> CareResult<Self> {
        let sender = signed_in(&session)?;
        let patient = authorize_patient_access(services, &sender, patient_id).await?;
        let messages = services.chat.stream_for(patient_id);
        debug!("Opened chat with patient {} for {}", patient_id, sender.uid());
        Ok(ChatView {
            patient_id: patient_id.to_string(),
            patient_name: patient.name,
            sender,
            chat: services.chat.clone(),
            messages,
            session,
            closed: false,
        })
    }

    pub fn patient_name(&self) -> &str {
        &self.patient_name
    }

    pub fn is_open(&self) -> bool {
        !self.closed
    }

    pub async fn next_update(&mut self) -> CareResult<ChatUpdate> {
        if self.closed {
            return Ok(ChatUpdate::Closed);
        }
        let event = tokio::select! {
            _ = self.session.signed_out() => Event::SignedOut,
            next = self.messages.next_snapshot() => Event::Messages(next),
        };
        match event {
            Event::Messages(Some(Ok(snapshot))) => Ok(ChatUpdate::Messages(snapshot.items)),
            Event::Messages(Some(Err(e))) => Err(e),
            Event::SignedOut | Event::Messages(None) => {
                self.close();
                Ok(ChatUpdate::Closed)
            }
        }
    }

    /// Sends as the principal the view was opened for.
    pub async fn send(&self, text: &str) -> CareResult<ChatMessage> {
        if self.closed {
            return Err(CareError::Unauthenticated);
        }
        self.chat.send(&self.patient_id, &self.sender, text).await
    }

    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.messages.unsubscribe();
        self.closed = true;
        debug!("Closed chat with patient {}", self.patient_id);
    }
}
