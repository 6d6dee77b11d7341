// rest_api/src/views/guards.rs

//! At most one in-flight submission per principal and action. A second
//! submit while the first is still running is refused instead of queued.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};

use log::debug;
use models::errors::{CareError, CareResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Submission {
    SignIn,
    SignUp,
    Register,
    AddPatient,
    LinkPatient,
    LinkDoctor,
    Unlink,
    Appointment,
    Note,
    DeleteRecord,
    Message,
}

impl Submission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Submission::SignIn => "sign-in",
            Submission::SignUp => "sign-up",
            Submission::Register => "register",
            Submission::AddPatient => "add-patient",
            Submission::LinkPatient => "link-patient",
            Submission::LinkDoctor => "link-doctor",
            Submission::Unlink => "unlink",
            Submission::Appointment => "appointment",
            Submission::Note => "note",
            Submission::DeleteRecord => "delete-record",
            Submission::Message => "message",
        }
    }
}

impl fmt::Display for Submission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type Key = (String, Submission);

#[derive(Debug, Clone, Default)]
pub struct SubmitGuards {
    in_flight: Arc<Mutex<HashSet<Key>>>,
}

impl SubmitGuards {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the `(owner, action)` slot. The slot is released when the
    /// returned token drops, whether the submission succeeded or not.
    pub fn begin(&self, owner: &str, action: Submission) -> CareResult<InFlight> {
        let key = (owner.to_string(), action);
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if !in_flight.insert(key.clone()) {
            debug!("Refused concurrent {} for {}", action, owner);
            return Err(CareError::SubmissionInFlight(action.to_string()));
        }
        Ok(InFlight { key: Some(key), in_flight: self.in_flight.clone() })
    }

    pub fn is_busy(&self, owner: &str, action: Submission) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(&(owner.to_string(), action))
    }
}

#[derive(Debug)]
pub struct InFlight {
    key: Option<Key>,
    in_flight: Arc<Mutex<HashSet<Key>>>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.in_flight
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .remove(&key);
        }
    }
}
