// rest_api/src/views/dashboard.rs

use carebridge_lib::services::CareServices;
use chrono::{DateTime, Utc};
use log::debug;
use models::errors::{CareError, CareResult};
use models::medical::{
    Appointment, ClinicalNote, MessageSummary, PatientPrincipal, PatientRecord, UserProfile,
};
use models::queries::Direction;
use serde::Serialize;

/// Everything the patient dashboard shows, loaded once.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientDashboard {
    pub patient: PatientRecord,
    pub doctors: Vec<UserProfile>,
    pub upcoming_appointments: Vec<Appointment>,
    pub notes: Vec<ClinicalNote>,
    pub messages: Vec<MessageSummary>,
}

impl PatientDashboard {
    pub async fn load(
        services: &CareServices,
        patient: &PatientPrincipal,
        now: DateTime<Utc>,
    ) -> CareResult<Self> {
        let record = services
            .roster
            .get_patient(&patient.uid)
            .await?
            .ok_or(CareError::NotAPatient)?;

        let (doctors, upcoming_appointments, notes, messages) = tokio::try_join!(
            services.roster.doctors_for_patient(&patient.uid),
            services.appointments.upcoming_for(&patient.uid, now),
            services.notes.list_for(&patient.uid, "date", Direction::Desc),
            services.inbox.recent_for(&patient.uid),
        )?;
        debug!(
            "Loaded dashboard for patient {}: {} doctors, {} upcoming appointments",
            patient.uid,
            doctors.len(),
            upcoming_appointments.len()
        );

        Ok(PatientDashboard { patient: record, doctors, upcoming_appointments, notes, messages })
    }
}
