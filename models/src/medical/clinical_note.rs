// models/src/medical/clinical_note.rs

use serde::{Deserialize, Serialize};

use crate::collections::DOCTOR_NOTES;
use crate::errors::{ValidationError, ValidationResult};
use crate::medical::role::DoctorPrincipal;
use crate::medical::CareRecord;
use crate::timestamps::now_timestamp;

/// A diagnosis/treatment entry in the `doctorNotes` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalNote {
    #[serde(default)]
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    #[serde(default)]
    pub doctor_name: String,
    pub diagnosis: String,
    pub treatment: String,
    pub date: String,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewClinicalNote {
    pub diagnosis: String,
    pub treatment: String,
}

impl ClinicalNote {
    /// Both diagnosis and treatment are required. The note is dated now.
    pub fn write(
        doctor: &DoctorPrincipal,
        patient_id: &str,
        input: &NewClinicalNote,
    ) -> ValidationResult<Self> {
        let diagnosis = input.diagnosis.trim();
        let treatment = input.treatment.trim();
        if diagnosis.is_empty() || treatment.is_empty() {
            return Err(ValidationError::MissingNoteFields);
        }

        let now = now_timestamp();
        Ok(ClinicalNote {
            id: String::new(),
            patient_id: patient_id.to_string(),
            doctor_id: doctor.uid.clone(),
            doctor_name: doctor.display_name.clone(),
            diagnosis: diagnosis.to_string(),
            treatment: treatment.to_string(),
            date: now.clone(),
            created_at: now,
        })
    }
}

impl CareRecord for ClinicalNote {
    const COLLECTION: &'static str = DOCTOR_NOTES;
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
