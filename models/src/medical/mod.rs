// models/src/medical/mod.rs

pub mod appointment;
pub mod clinical_note;
pub mod message;
pub mod patient;
pub mod role;
pub mod user;

pub use appointment::{Appointment, AppointmentStatus, NewAppointment};
pub use clinical_note::{ClinicalNote, NewClinicalNote};
pub use message::{ChatMessage, MessageSummary};
pub use patient::PatientRecord;
pub use role::{DoctorPrincipal, Identity, PatientPrincipal, Principal, Role};
pub use user::UserProfile;

/// A doctor-authored record scoped to one patient and gated on its author
/// for deletion.
pub trait CareRecord:
    serde::Serialize + serde::de::DeserializeOwned + Clone + Send + Sync + 'static
{
    const COLLECTION: &'static str;
    /// Field the record lists are ordered by.
    const ORDER_FIELD: &'static str;

    fn id(&self) -> &str;
    fn patient_id(&self) -> &str;
    fn doctor_id(&self) -> &str;
}
