// rest_api/src/handlers/doctor.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use carebridge_lib::roster::LinkOutcome;
use models::medical::{Appointment, ClinicalNote, PatientRecord, Principal};
use models::queries::Direction;
use serde_json::{json, Value};

use crate::auth::DoctorAuth;
use crate::errors::RestApiError;
use crate::views::authorize_patient_access;
use crate::views::forms::{AddPatientForm, AppointmentForm, LinkPatientForm, NoteForm};
use crate::views::Submission;
use crate::AppState;

pub async fn list_patients_handler(
    State(state): State<AppState>,
    DoctorAuth(doctor): DoctorAuth,
) -> Result<Json<Vec<PatientRecord>>, RestApiError> {
    Ok(Json(state.services.roster.patients_for_doctor(&doctor.uid).await?))
}

pub async fn link_patient_handler(
    State(state): State<AppState>,
    DoctorAuth(doctor): DoctorAuth,
    Json(form): Json<LinkPatientForm>,
) -> Result<Json<Value>, RestApiError> {
    let email = form.validate()?;
    let _in_flight = state.guards.begin(&doctor.uid, Submission::LinkPatient)?;
    let outcome = state
        .services
        .roster
        .link_patient_by_email(&doctor.uid, &email, form.fallback_name())
        .await?;
    let kind = match &outcome {
        LinkOutcome::Linked(_) => "linked",
        LinkOutcome::Created(_) => "created",
    };
    Ok(Json(json!({
        "outcome": kind,
        "patient": outcome.patient(),
    })))
}

pub async fn add_patient_handler(
    State(state): State<AppState>,
    DoctorAuth(doctor): DoctorAuth,
    Json(form): Json<AddPatientForm>,
) -> Result<(StatusCode, Json<Value>), RestApiError> {
    let email = form.validate(state.min_password_length)?;
    let _in_flight = state.guards.begin(&doctor.uid, Submission::AddPatient)?;
    let onboarding = state
        .services
        .roster
        .create_doctor_managed_patient(&doctor, &email, &form.name, &form.password)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "patient": onboarding.patient,
            "next": onboarding.next_route,
        })),
    ))
}

pub async fn unlink_patient_handler(
    State(state): State<AppState>,
    DoctorAuth(doctor): DoctorAuth,
    Path(patient_id): Path<String>,
) -> Result<Json<Value>, RestApiError> {
    let _in_flight = state.guards.begin(&doctor.uid, Submission::Unlink)?;
    let removed = state.services.roster.unlink(&patient_id, &doctor.uid).await?;
    Ok(Json(json!({ "removed": removed })))
}

pub async fn list_appointments_handler(
    State(state): State<AppState>,
    DoctorAuth(doctor): DoctorAuth,
    Path(patient_id): Path<String>,
) -> Result<Json<Vec<Appointment>>, RestApiError> {
    authorize_patient_access(&state.services, &Principal::Doctor(doctor), &patient_id).await?;
    let appointments = state
        .services
        .appointments
        .list_for(&patient_id, "date", Direction::Desc)
        .await?;
    Ok(Json(appointments))
}

pub async fn create_appointment_handler(
    State(state): State<AppState>,
    DoctorAuth(doctor): DoctorAuth,
    Path(patient_id): Path<String>,
    Json(form): Json<AppointmentForm>,
) -> Result<(StatusCode, Json<Appointment>), RestApiError> {
    let new_appointment = form.validate()?;
    let _in_flight = state.guards.begin(&doctor.uid, Submission::Appointment)?;
    let principal = Principal::Doctor(doctor.clone());
    authorize_patient_access(&state.services, &principal, &patient_id).await?;

    let appointment = Appointment::schedule(&doctor, &patient_id, &new_appointment)?;
    let id = state.services.appointments.create(&appointment).await?;
    Ok((StatusCode::CREATED, Json(Appointment { id, ..appointment })))
}

pub async fn delete_appointment_handler(
    State(state): State<AppState>,
    DoctorAuth(doctor): DoctorAuth,
    Path(id): Path<String>,
) -> Result<Json<Value>, RestApiError> {
    let _in_flight = state.guards.begin(&doctor.uid, Submission::DeleteRecord)?;
    state.services.appointments.delete(&id, &doctor.uid).await?;
    Ok(Json(json!({ "status": "ok", "deleted": id })))
}

pub async fn list_notes_handler(
    State(state): State<AppState>,
    DoctorAuth(doctor): DoctorAuth,
    Path(patient_id): Path<String>,
) -> Result<Json<Vec<ClinicalNote>>, RestApiError> {
    authorize_patient_access(&state.services, &Principal::Doctor(doctor), &patient_id).await?;
    let notes = state.services.notes.list_for(&patient_id, "date", Direction::Desc).await?;
    Ok(Json(notes))
}

pub async fn create_note_handler(
    State(state): State<AppState>,
    DoctorAuth(doctor): DoctorAuth,
    Path(patient_id): Path<String>,
    Json(form): Json<NoteForm>,
) -> Result<(StatusCode, Json<ClinicalNote>), RestApiError> {
    let new_note = form.validate()?;
    let _in_flight = state.guards.begin(&doctor.uid, Submission::Note)?;
    let principal = Principal::Doctor(doctor.clone());
    authorize_patient_access(&state.services, &principal, &patient_id).await?;

    let note = ClinicalNote::write(&doctor, &patient_id, &new_note)?;
    let id = state.services.notes.create(&note).await?;
    Ok((StatusCode::CREATED, Json(ClinicalNote { id, ..note })))
}

pub async fn delete_note_handler(
    State(state): State<AppState>,
    DoctorAuth(doctor): DoctorAuth,
    Path(id): Path<String>,
) -> Result<Json<Value>, RestApiError> {
    let _in_flight = state.guards.begin(&doctor.uid, Submission::DeleteRecord)?;
    state.services.notes.delete(&id, &doctor.uid).await?;
    Ok(Json(json!({ "status": "ok", "deleted": id })))
}
