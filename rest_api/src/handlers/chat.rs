// rest_api/src/handlers/chat.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use models::medical::ChatMessage;
use serde_json::{json, Value};

use crate::auth::Authenticated;
use crate::errors::RestApiError;
use crate::views::authorize_patient_access;
use crate::views::forms::MessageForm;
use crate::views::Submission;
use crate::AppState;

pub async fn chat_history_handler(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(patient_id): Path<String>,
) -> Result<Json<Value>, RestApiError> {
    let patient = authorize_patient_access(&state.services, &auth.principal, &patient_id).await?;
    let messages = state.services.chat.history(&patient_id).await?;
    Ok(Json(json!({
        "patientName": patient.name,
        "messages": messages,
    })))
}

pub async fn send_message_handler(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(patient_id): Path<String>,
    Json(form): Json<MessageForm>,
) -> Result<(StatusCode, Json<ChatMessage>), RestApiError> {
    let _in_flight = state.guards.begin(auth.principal.uid(), Submission::Message)?;
    authorize_patient_access(&state.services, &auth.principal, &patient_id).await?;
    let message = state.services.chat.send(&patient_id, &auth.principal, &form.text).await?;
    Ok((StatusCode::CREATED, Json(message)))
}
