// models/src/medical/appointment.rs

use serde::{Deserialize, Serialize};

use crate::collections::APPOINTMENTS;
use crate::errors::ValidationResult;
use crate::medical::role::DoctorPrincipal;
use crate::medical::CareRecord;
use crate::timestamps::{normalize_appointment_date, now_timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
}

fn general() -> String {
    "General".to_string()
}

/// A scheduled visit in the `appointments` collection. `date` is stored as
/// `YYYY-MM-DDTHH:MM` so that string order is chronological.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    #[serde(default)]
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    #[serde(default)]
    pub doctor_name: String,
    pub date: String,
    #[serde(default = "general")]
    pub specialty: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub status: AppointmentStatus,
    #[serde(default)]
    pub created_at: String,
}

/// Form input for a new appointment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    pub date: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub specialty: Option<String>,
}

impl Appointment {
    /// Builds an appointment booked by `doctor` for `patient_id`. Fails when
    /// the date is missing or unparseable.
    pub fn schedule(
        doctor: &DoctorPrincipal,
        patient_id: &str,
        input: &NewAppointment,
    ) -> ValidationResult<Self> {
        let date = normalize_appointment_date(&input.date)?;
        let specialty = input
            .specialty
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(general);

        Ok(Appointment {
            id: String::new(),
            patient_id: patient_id.to_string(),
            doctor_id: doctor.uid.clone(),
            doctor_name: doctor.display_name.clone(),
            date,
            specialty,
            notes: input.notes.clone().unwrap_or_default(),
            status: AppointmentStatus::Scheduled,
            created_at: now_timestamp(),
        })
    }
}

impl CareRecord for Appointment {
    const COLLECTION: &'static str = APPOINTMENTS;
    const ORDER_FIELD: &'static str = "date";

    fn id(&self) -> &str {
        &self.id
    }

    fn patient_id(&self) -> &str {
        &self.patient_id
    }

    fn doctor_id(&self) -> &str {
        &self.doctor_id
    }
}
