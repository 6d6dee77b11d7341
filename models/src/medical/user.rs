// models/src/medical/user.rs

use serde::{Deserialize, Serialize};

use crate::identifiers::{display_name_from_email, Email};
use crate::medical::role::Role;
use crate::timestamps::now_timestamp;

/// A role record in the `users` collection, keyed by identity id. Doctors get
/// one at sign-up; doctor-managed patients get one when provisioned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    pub email: String,
    #[serde(rename = "type")]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

impl UserProfile {
    pub fn new(uid: &str, email: &Email, role: Role) -> Self {
        UserProfile {
            uid: uid.to_string(),
            email: email.as_str().to_string(),
            role,
            name: None,
            specialty: None,
            created_at: now_timestamp(),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Stored name when present, otherwise the email's local part.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => display_name_from_email(&self.email),
        }
    }
}
