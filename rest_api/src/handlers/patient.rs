// rest_api/src/handlers/patient.rs

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use models::identifiers::display_name_from_email;
use serde_json::{json, Value};

use crate::auth::PatientAuth;
use crate::errors::RestApiError;
use crate::views::forms::LinkDoctorForm;
use crate::views::{PatientDashboard, Submission};
use crate::AppState;

pub async fn dashboard_handler(
    State(state): State<AppState>,
    PatientAuth(patient): PatientAuth,
) -> Result<Json<PatientDashboard>, RestApiError> {
    let dashboard = PatientDashboard::load(&state.services, &patient, Utc::now()).await?;
    Ok(Json(dashboard))
}

pub async fn link_doctor_handler(
    State(state): State<AppState>,
    PatientAuth(patient): PatientAuth,
    Json(form): Json<LinkDoctorForm>,
) -> Result<Json<Value>, RestApiError> {
    let email = form.validate()?;
    let _in_flight = state.guards.begin(&patient.uid, Submission::LinkDoctor)?;
    let doctor = state.services.roster.link_doctor_by_email(&patient.uid, &email).await?;
    Ok(Json(json!({
        "doctor": {
            "uid": doctor.uid,
            "email": doctor.email,
            "name": display_name_from_email(&doctor.email),
        },
    })))
}

pub async fn unlink_doctor_handler(
    State(state): State<AppState>,
    PatientAuth(patient): PatientAuth,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, RestApiError> {
    let _in_flight = state.guards.begin(&patient.uid, Submission::Unlink)?;
    let removed = state.services.roster.unlink(&patient.uid, &doctor_id).await?;
    Ok(Json(json!({ "removed": removed })))
}
