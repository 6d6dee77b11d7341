// rest_api/src/handlers/session.rs

use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use carebridge_lib::routes::Route;
use log::info;
use models::errors::CareError;
use security::SessionTicket;
use serde_json::{json, Value};

use crate::auth::{bearer_token, Authenticated};
use crate::errors::RestApiError;
use crate::views::forms::{CredentialsForm, PatientRegistrationForm};
use crate::views::Submission;
use crate::AppState;

pub async fn health_check_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn routes_handler() -> Json<Value> {
    Json(json!({
        "entryPoints": Route::entry_points(),
        "routes": Route::all(),
    }))
}

pub async fn doctor_signup_handler(
    State(state): State<AppState>,
    Json(form): Json<CredentialsForm>,
) -> Result<(StatusCode, Json<SessionTicket>), RestApiError> {
    let email = form.validate()?;
    let _in_flight = state.guards.begin(email.as_str(), Submission::SignUp)?;
    let ticket = state.doctor_session().sign_up(&email, &form.password).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

pub async fn doctor_login_handler(
    State(state): State<AppState>,
    Json(form): Json<CredentialsForm>,
) -> Result<Json<SessionTicket>, RestApiError> {
    let email = form.validate()?;
    let _in_flight = state.guards.begin(email.as_str(), Submission::SignIn)?;
    let ticket = state.doctor_session().sign_in(&email, &form.password).await?;
    Ok(Json(ticket))
}

pub async fn patient_register_handler(
    State(state): State<AppState>,
    Json(form): Json<PatientRegistrationForm>,
) -> Result<(StatusCode, Json<SessionTicket>), RestApiError> {
    let email = form.validate(state.min_password_length)?;
    let _in_flight = state.guards.begin(email.as_str(), Submission::Register)?;
    let ticket = state
        .patient_session()
        .register(&form.name, &email, &form.password)
        .await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

pub async fn patient_login_handler(
    State(state): State<AppState>,
    Json(form): Json<CredentialsForm>,
) -> Result<Json<SessionTicket>, RestApiError> {
    let email = form.validate()?;
    let _in_flight = state.guards.begin(email.as_str(), Submission::SignIn)?;
    let ticket = state.patient_session().sign_in(&email, &form.password).await?;
    Ok(Json(ticket))
}

/// Rehydrates the principal behind a stored token.
pub async fn session_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, RestApiError> {
    let token = bearer_token(&headers).ok_or(CareError::Unauthenticated)?;
    let claims = state.signer.verify(token)?;
    let session = state.session_for(claims.role);
    let principal = session.restore(token).await?;
    Ok(Json(json!({
        "principal": principal,
        "next": session.home(),
    })))
}

/// Ends the session: the token is revoked, so later requests and open feeds
/// carrying it are rejected.
pub async fn logout_handler(
    State(state): State<AppState>,
    auth: Authenticated,
) -> Result<Json<Value>, RestApiError> {
    let session = state.session_for(auth.claims.role);
    session.restore(&auth.token).await?;
    session.logout();
    state.signer.revoke(&auth.claims);
    info!("{} logged out", auth.principal.uid());
    Ok(Json(json!({
        "status": "ok",
        "next": Route::Home,
    })))
}
