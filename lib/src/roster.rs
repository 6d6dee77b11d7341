// lib/src/roster.rs

//! The doctor/patient roster. Links live in the `assignedDoctors` array of
//! each patient record; there is no separate join collection.

use std::sync::Arc;

use log::{debug, info, warn};
use models::collections::{PATIENTS, USERS};
use models::errors::{CareError, CareResult, LinkKind, ValidationError};
use models::identifiers::{display_name_from_email, Email};
use models::medical::{DoctorPrincipal, PatientRecord, Role, UserProfile};
use models::queries::{Direction, Document, FieldUpdate, Query};
use serde_json::Value;

use crate::identity::IdentityProvider;
use crate::live::{subscribe, LiveQuery};
use crate::routes::Route;
use crate::storage_engine::DocumentStore;

#[derive(Debug, Clone, PartialEq)]
pub enum LinkOutcome {
    /// An existing record gained the doctor.
    Linked(PatientRecord),
    /// No record matched; a new one was created from the fallback name.
    Created(PatientRecord),
}

impl LinkOutcome {
    pub fn patient(&self) -> &PatientRecord {
        match self {
            LinkOutcome::Linked(p) | LinkOutcome::Created(p) => p,
        }
    }
}

/// Result of provisioning a patient account on a doctor's behalf. The
/// patient continues on their own through `next_route`.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientOnboarding {
    pub patient: PatientRecord,
    pub next_route: Route,
}

#[derive(Debug, Clone)]
pub struct RosterManager {
    store: Arc<dyn DocumentStore>,
    identities: Arc<dyn IdentityProvider>,
    subscription_buffer: usize,
}

impl RosterManager {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        identities: Arc<dyn IdentityProvider>,
        subscription_buffer: usize,
    ) -> Self {
        RosterManager { store, identities, subscription_buffer }
    }

    /// Earliest-created document in `collection` whose `email` matches.
    async fn find_by_email(
        &self,
        collection: &str,
        email: &Email,
        role: Option<Role>,
    ) -> CareResult<Option<Document>> {
        let mut query = Query::new().where_eq("email", email.as_str());
        if let Some(role) = role {
            query = query.where_eq("type", role.as_str());
        }
        let query = query.order_by("createdAt", Direction::Asc).limit(1);
        Ok(self.store.query(collection, &query).await?.into_iter().next())
    }

    pub async fn get_patient(&self, patient_id: &str) -> CareResult<Option<PatientRecord>> {
        match self.store.get(PATIENTS, patient_id).await? {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }

    /// Adds `doctor_id` to the patient registered under `email`. Without a
    /// match, creates the patient from `fallback_name`, or fails with
    /// `NeedsName` so the caller can ask for one.
    pub async fn link_patient_by_email(
        &self,
        doctor_id: &str,
        email: &Email,
        fallback_name: Option<&str>,
    ) -> CareResult<LinkOutcome> {
        if let Some(doc) = self.find_by_email(PATIENTS, email, None).await? {
            let existing: PatientRecord = doc.decode()?;
            if existing.is_assigned_to(doctor_id) {
                return Err(CareError::AlreadyLinked(LinkKind::PatientInCare));
            }
            let updated = self
                .store
                .update(
                    PATIENTS,
                    &doc.id,
                    &[FieldUpdate::array_union("assignedDoctors", vec![Value::from(doctor_id)])],
                )
                .await?;
            info!("Linked doctor {} to patient {}", doctor_id, doc.id);
            return Ok(LinkOutcome::Linked(updated.decode()?));
        }

        let name = fallback_name.map(str::trim).filter(|n| !n.is_empty());
        let Some(name) = name else {
            return Err(CareError::NeedsName);
        };

        let record = PatientRecord::new("", name, email).with_doctor(doctor_id, None);
        let id = self.store.create(PATIENTS, serde_json::to_value(&record)?).await?;
        info!("Created patient {} for doctor {}", id, doctor_id);
        Ok(LinkOutcome::Created(PatientRecord { id, ..record }))
    }

    /// Adds the doctor registered under `email` to the patient's roster and
    /// caches their display name.
    pub async fn link_doctor_by_email(
        &self,
        patient_id: &str,
        email: &Email,
    ) -> CareResult<UserProfile> {
        let doctor: UserProfile = self
            .find_by_email(USERS, email, Some(Role::Doctor))
            .await?
            .ok_or_else(|| CareError::DoctorNotFound(email.to_string()))?
            .decode()?;

        let patient = self
            .get_patient(patient_id)
            .await?
            .ok_or_else(|| CareError::NotFound(format!("patient {}", patient_id)))?;
        if patient.is_assigned_to(&doctor.uid) {
            return Err(CareError::AlreadyLinked(LinkKind::DoctorAssigned));
        }

        let display_name = display_name_from_email(&doctor.email);
        self.store
            .update(
                PATIENTS,
                patient_id,
                &[
                    FieldUpdate::array_union("assignedDoctors", vec![Value::from(doctor.uid.as_str())]),
                    FieldUpdate::array_union("doctorNames", vec![Value::from(display_name)]),
                ],
            )
            .await?;
        info!("Patient {} added doctor {}", patient_id, doctor.uid);
        Ok(doctor)
    }

    /// Removes `counterparty_id` from the patient's `assignedDoctors` by
    /// rewriting the filtered list. Concurrent links may be lost; the last
    /// writer wins. Returns whether anything was removed.
    pub async fn unlink(&self, patient_record_id: &str, counterparty_id: &str) -> CareResult<bool> {
        let Some(patient) = self.get_patient(patient_record_id).await? else {
            warn!("Unlink on missing patient record {}", patient_record_id);
            return Ok(false);
        };
        if !patient.is_assigned_to(counterparty_id) {
            debug!("{} is not linked to {}, nothing to unlink", counterparty_id, patient_record_id);
            return Ok(false);
        }

        let remaining: Vec<Value> = patient
            .assigned_doctors
            .iter()
            .filter(|id| id.as_str() != counterparty_id)
            .map(|id| Value::from(id.as_str()))
            .collect();
        self.store
            .update(PATIENTS, patient_record_id, &[FieldUpdate::set("assignedDoctors", remaining)])
            .await?;
        info!("Unlinked {} from patient {}", counterparty_id, patient_record_id);
        Ok(true)
    }

    /// Provisions a patient account and its records on behalf of `doctor`.
    /// The new identity is never signed in; the acting doctor's session is
    /// not touched.
    pub async fn create_doctor_managed_patient(
        &self,
        doctor: &DoctorPrincipal,
        email: &Email,
        name: &str,
        password: &str,
    ) -> CareResult<PatientOnboarding> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingName.into());
        }

        let identity = self.identities.create_account(email, password).await.map_err(|e| {
            warn!("Identity provider refused account for {}: {}", email, e);
            match e {
                CareError::Auth(failure) => CareError::Provider(failure.to_string()),
                other => CareError::Provider(other.to_string()),
            }
        })?;

        let record = PatientRecord::new(identity.uid.as_str(), name, email)
            .with_doctor(&doctor.uid, Some(&doctor.display_name));
        self.store.set(PATIENTS, &identity.uid, serde_json::to_value(&record)?).await?;

        let profile = UserProfile::new(&identity.uid, email, Role::Patient).with_name(name);
        self.store.set(USERS, &identity.uid, serde_json::to_value(&profile)?).await?;

        info!("Doctor {} provisioned patient {}", doctor.uid, identity.uid);
        Ok(PatientOnboarding { patient: record, next_route: Route::PatientLogin })
    }

    fn roster_query(doctor_id: &str) -> Query {
        Query::new()
            .where_array_contains("assignedDoctors", doctor_id)
            .order_by("createdAt", Direction::Asc)
    }

    pub async fn patients_for_doctor(&self, doctor_id: &str) -> CareResult<Vec<PatientRecord>> {
        self.store
            .query(PATIENTS, &Self::roster_query(doctor_id))
            .await?
            .iter()
            .map(|doc| doc.decode())
            .collect()
    }

    pub fn watch_patients_for_doctor(&self, doctor_id: &str) -> LiveQuery<PatientRecord> {
        subscribe(self.store.clone(), PATIENTS, Self::roster_query(doctor_id), self.subscription_buffer)
    }

    /// Profiles of the patient's assigned doctors, in roster order. Ids with
    /// no `users` record are skipped.
    pub async fn doctors_for_patient(&self, patient_id: &str) -> CareResult<Vec<UserProfile>> {
        let patient = self
            .get_patient(patient_id)
            .await?
            .ok_or_else(|| CareError::NotFound(format!("patient {}", patient_id)))?;

        let mut doctors = Vec::with_capacity(patient.assigned_doctors.len());
        for doctor_id in &patient.assigned_doctors {
            match self.store.get(USERS, doctor_id).await? {
                Some(doc) => doctors.push(doc.decode::<UserProfile>()?),
                None => debug!("Skipping dangling doctor id {} on patient {}", doctor_id, patient_id),
            }
        }
        Ok(doctors)
    }
}
