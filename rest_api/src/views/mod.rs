// rest_api/src/views/mod.rs

//! Screen-level view models. Each live view owns its subscriptions and a
//! `SessionWatcher` handed in by whoever owns the session; it tears the
//! subscriptions down when the session ends, when closed, or on drop.

pub mod chat;
pub mod dashboard;
pub mod forms;
pub mod guards;
pub mod patient_detail;
pub mod roster;

pub use chat::{ChatUpdate, ChatView};
pub use dashboard::PatientDashboard;
pub use guards::{InFlight, SubmitGuards, Submission};
pub use patient_detail::{DetailUpdate, PatientDetailView};
pub use roster::{RosterUpdate, RosterView};

use carebridge_lib::services::CareServices;
use models::errors::{CareError, CareResult};
use models::medical::{PatientRecord, Principal};
use security::SessionWatcher;

/// Loads `patient_id` if `principal` may see it: the patient themselves, or
/// a doctor who has them on their roster.
pub async fn authorize_patient_access(
    services: &CareServices,
    principal: &Principal,
    patient_id: &str,
) -> CareResult<PatientRecord> {
    if let Principal::Patient(patient) = principal {
        if patient.uid != patient_id {
            return Err(CareError::Forbidden(format!("patient {}", patient_id)));
        }
    }
    let patient = services
        .roster
        .get_patient(patient_id)
        .await?
        .ok_or_else(|| CareError::NotFound(format!("patient {}", patient_id)))?;
    if let Principal::Doctor(doctor) = principal {
        if !patient.is_assigned_to(&doctor.uid) {
            return Err(CareError::Forbidden(format!("patient {}", patient_id)));
        }
    }
    Ok(patient)
}

/// The principal a view may open for. Views never attach without one.
fn signed_in(session: &SessionWatcher) -> CareResult<Principal> {
    session.current().ok_or(CareError::Unauthenticated)
}
