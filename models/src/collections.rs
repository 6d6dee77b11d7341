// models/src/collections.rs

//! Collection names of the persisted layout.

pub const PATIENTS: &str = "patients";
pub const USERS: &str = "users";
pub const APPOINTMENTS: &str = "appointments";
pub const DOCTOR_NOTES: &str = "doctorNotes";
/// Root-level conversation summaries. Independent of the per-patient chat.
pub const MESSAGES: &str = "messages";
/// Credential records owned by the local identity provider.
pub const IDENTITIES: &str = "identities";

/// The chat sub-collection of one patient.
pub fn patient_messages(patient_id: &str) -> String {
    format!("{}/{}/messages", PATIENTS, patient_id)
}
