// models/src/medical/message.rs

use serde::{Deserialize, Serialize};

use crate::errors::{ValidationError, ValidationResult};
use crate::medical::role::Principal;
use crate::timestamps::now_timestamp;

/// One line of a chat conversation, stored under `patients/{id}/messages`.
/// Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    #[serde(default)]
    pub id: String,
    pub sender_id: String,
    #[serde(default)]
    pub sender_name: String,
    pub text: String,
    pub timestamp: String,
}

impl ChatMessage {
    /// Text is stored exactly as sent; only all-blank text is rejected.
    pub fn compose(sender: &Principal, text: &str) -> ValidationResult<Self> {
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyMessage);
        }
        Ok(ChatMessage {
            id: String::new(),
            sender_id: sender.uid().to_string(),
            sender_name: sender.display_name().to_string(),
            text: text.to_string(),
            timestamp: now_timestamp(),
        })
    }
}

/// A conversation summary in the root `messages` collection, shown on the
/// patient dashboard. Not derived from chat messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSummary {
    #[serde(default)]
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    #[serde(default)]
    pub doctor_name: String,
    #[serde(default)]
    pub last_message: String,
    pub timestamp: String,
}

impl MessageSummary {
    pub fn new(patient_id: &str, doctor_id: &str, doctor_name: &str, last_message: &str) -> Self {
        MessageSummary {
            id: String::new(),
            patient_id: patient_id.to_string(),
            doctor_id: doctor_id.to_string(),
            doctor_name: doctor_name.to_string(),
            last_message: last_message.to_string(),
            timestamp: now_timestamp(),
        }
    }
}
