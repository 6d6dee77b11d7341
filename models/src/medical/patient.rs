// models/src/medical/patient.rs

use serde::{Deserialize, Serialize};

use crate::identifiers::Email;
use crate::medical::role::Role;
use crate::timestamps::now_timestamp;

fn unknown_patient() -> String {
    "Unknown Patient".to_string()
}

fn patient_role() -> Role {
    Role::Patient
}

/// A patient document in the `patients` collection.
///
/// `assigned_doctors` is the roster: the ids of every doctor caring for this
/// patient. `doctor_names` is a denormalised cache written alongside it and
/// is not kept in step with it; the two lists can drift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default = "unknown_patient")]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "type", default = "patient_role")]
    pub kind: Role,
    #[serde(default)]
    pub assigned_doctors: Vec<String>,
    #[serde(default)]
    pub doctor_names: Vec<String>,
    #[serde(default)]
    pub created_at: String,
}

impl PatientRecord {
    /// A fresh record. The id is left empty for the store to assign unless
    /// the caller keys it by an identity id.
    pub fn new(id: impl Into<String>, name: &str, email: &Email) -> Self {
        PatientRecord {
            id: id.into(),
            name: name.trim().to_string(),
            email: email.as_str().to_string(),
            kind: Role::Patient,
            assigned_doctors: Vec::new(),
            doctor_names: Vec::new(),
            created_at: now_timestamp(),
        }
    }

    pub fn with_doctor(mut self, doctor_id: &str, doctor_name: Option<&str>) -> Self {
        self.assigned_doctors.push(doctor_id.to_string());
        if let Some(name) = doctor_name {
            self.doctor_names.push(name.to_string());
        }
        self
    }

    pub fn is_assigned_to(&self, doctor_id: &str) -> bool {
        self.assigned_doctors.iter().any(|id| id == doctor_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn should_use_camel_case_field_names() {
        let record = PatientRecord::new("p1", " Pat ", &Email::parse("p@x.com").unwrap())
            .with_doctor("d1", Some("house"));
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["name"], "Pat");
        assert_eq!(value["type"], "patient");
        assert_eq!(value["assignedDoctors"], json!(["d1"]));
        assert_eq!(value["doctorNames"], json!(["house"]));
        assert!(value["createdAt"].as_str().is_some());
    }

    #[test]
    fn should_tolerate_sparse_documents() {
        let record: PatientRecord = serde_json::from_value(json!({"id": "p9"})).unwrap();
        assert_eq!(record.name, "Unknown Patient");
        assert!(record.assigned_doctors.is_empty());
        assert!(!record.is_assigned_to("d1"));
    }
}
