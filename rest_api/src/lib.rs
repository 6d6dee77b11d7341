// rest_api/src/lib.rs

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Error as AnyhowError};
use axum::{
    http::Method,
    routing::{delete, get, post},
    Router,
};
use carebridge_lib::config::{AppConfig, SecurityConfig};
use carebridge_lib::identity::IdentityProvider;
use carebridge_lib::services::CareServices;
use carebridge_lib::storage_engine::create_storage;
use log::info;
use security::{
    CareAuthenticator, DoctorSession, LocalIdentityProvider, PatientSession, SessionCell,
    TokenSigner,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

pub mod auth;
pub mod errors;
pub mod handlers;
pub mod views;

pub use errors::RestApiError;

use handlers::{chat, doctor, feeds, patient, session};
use views::SubmitGuards;

// Shared state for the Axum application
#[derive(Debug, Clone)]
pub struct AppState {
    pub services: CareServices,
    pub auth: CareAuthenticator,
    pub signer: TokenSigner,
    pub guards: SubmitGuards,
    pub min_password_length: usize,
}

impl AppState {
    pub fn new(services: CareServices, security: &SecurityConfig) -> Self {
        let auth = CareAuthenticator::new(services.identities.clone(), services.store.clone());
        AppState {
            services,
            auth,
            signer: TokenSigner::from_config(security),
            guards: SubmitGuards::new(),
            min_password_length: security.min_password_length,
        }
    }

    /// Builds the storage engine and local identity provider described by
    /// `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self, AnyhowError> {
        let store = create_storage(&config.storage).context("Failed to open document store")?;
        let identities: Arc<dyn IdentityProvider> = Arc::new(LocalIdentityProvider::new(
            store.clone(),
            config.security.min_password_length,
        ));
        let services = CareServices::new(store, identities, &config.storage);
        Ok(Self::new(services, &config.security))
    }

    /// A fresh doctor session for one request. Its cell lives only as long
    /// as the request does.
    pub fn doctor_session(&self) -> DoctorSession {
        DoctorSession::new(self.auth.clone(), SessionCell::new(), self.signer.clone())
    }

    pub fn patient_session(&self) -> PatientSession {
        PatientSession::new(self.auth.clone(), SessionCell::new(), self.signer.clone())
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any)
        .allow_origin(Any);

    let api = Router::new()
        .route("/health", get(session::health_check_handler))
        .route("/routes", get(session::routes_handler))
        .route("/doctor/signup", post(session::doctor_signup_handler))
        .route("/doctor/login", post(session::doctor_login_handler))
        .route("/patient/register", post(session::patient_register_handler))
        .route("/patient/login", post(session::patient_login_handler))
        .route("/session", get(session::session_handler))
        .route("/logout", post(session::logout_handler))
        .route(
            "/doctor/patients",
            get(doctor::list_patients_handler).post(doctor::add_patient_handler),
        )
        .route("/doctor/patients/live", get(feeds::roster_feed_handler))
        .route("/doctor/patients/link", post(doctor::link_patient_handler))
        .route("/doctor/patients/:patient_id", delete(doctor::unlink_patient_handler))
        .route(
            "/patients/:patient_id/appointments",
            get(doctor::list_appointments_handler).post(doctor::create_appointment_handler),
        )
        .route("/appointments/:id", delete(doctor::delete_appointment_handler))
        .route(
            "/patients/:patient_id/notes",
            get(doctor::list_notes_handler).post(doctor::create_note_handler),
        )
        .route("/notes/:id", delete(doctor::delete_note_handler))
        .route("/patients/:patient_id/live", get(feeds::patient_feed_handler))
        .route(
            "/chat/:patient_id/messages",
            get(chat::chat_history_handler).post(chat::send_message_handler),
        )
        .route("/chat/:patient_id/live", get(feeds::chat_feed_handler))
        .route("/patient/dashboard", get(patient::dashboard_handler))
        .route("/patient/doctors", post(patient::link_doctor_handler))
        .route("/patient/doctors/:doctor_id", delete(patient::unlink_doctor_handler));

    Router::new()
        .nest("/api/v1", api)
        .with_state(state)
        .layer(cors)
}

/// Serves the API on `config.rest` until `shutdown` resolves.
pub async fn start_server<F>(config: &AppConfig, shutdown: F) -> Result<(), AnyhowError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let state = AppState::from_config(config)?;
    let app = build_router(state);

    let addr = format!("{}:{}", config.rest.host, config.rest.port);
    let listener = TcpListener::bind(&addr)
        .await
        .context(format!("Failed to bind to address: {}", addr))?;
    info!("REST API server listening on {}", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
        .context("REST API server failed to start or run")?;

    info!("REST API server stopped.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        build_router(AppState::from_config(&AppConfig::default()).unwrap())
    }

    async fn call(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }

    async fn doctor_token(app: &Router, email: &str) -> String {
        let (status, body) = call(
            app,
            "POST",
            "/api/v1/doctor/signup",
            None,
            Some(json!({ "email": email, "password": "secret1" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        assert_eq!(body["next"], "/dashboard");
        body["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_is_public() {
        let (status, body) = call(&app(), "GET", "/api/v1/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn protected_routes_need_a_token() {
        let (status, body) = call(&app(), "GET", "/api/v1/doctor/patients", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["status"], "error");
        assert_eq!(body["code"], "unauthenticated");
    }

    #[tokio::test]
    async fn managed_patient_leaves_the_doctor_signed_in() {
        let app = app();
        let token = doctor_token(&app, "house@clinic.org").await;

        let (status, body) = call(
            &app,
            "POST",
            "/api/v1/doctor/patients",
            Some(&token),
            Some(json!({
                "name": "Pat",
                "email": "pat@x.com",
                "password": "secret1",
                "confirmPassword": "secret1",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        assert_eq!(body["next"], "/patient/login");
        assert_eq!(body["patient"]["doctorNames"], json!(["house"]));

        let (status, body) = call(&app, "GET", "/api/v1/session", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["principal"]["role"], "doctor");
        assert_eq!(body["principal"]["email"], "house@clinic.org");

        let (_, roster) = call(&app, "GET", "/api/v1/doctor/patients", Some(&token), None).await;
        assert_eq!(roster.as_array().unwrap().len(), 1);

        let (status, body) = call(
            &app,
            "POST",
            "/api/v1/patient/login",
            None,
            Some(json!({ "email": "pat@x.com", "password": "secret1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["next"], "/patient/dashboard");
    }

    #[tokio::test]
    async fn logout_revokes_the_token() {
        let app = app();
        let token = doctor_token(&app, "house@clinic.org").await;
        let other = doctor_token(&app, "wilson@clinic.org").await;

        let (status, body) = call(&app, "POST", "/api/v1/logout", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["next"], "/");

        let (status, _) = call(&app, "GET", "/api/v1/session", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = call(&app, "GET", "/api/v1/doctor/patients", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = call(&app, "POST", "/api/v1/logout", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call(&app, "GET", "/api/v1/session", Some(&other), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(
            &app,
            "POST",
            "/api/v1/doctor/login",
            None,
            Some(json!({ "email": "house@clinic.org", "password": "secret1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        let fresh = body["token"].as_str().unwrap();
        let (status, _) = call(&app, "GET", "/api/v1/session", Some(fresh), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn doctors_cannot_sign_in_as_patients() {
        let app = app();
        doctor_token(&app, "house@clinic.org").await;
        let (status, body) = call(
            &app,
            "POST",
            "/api/v1/patient/login",
            None,
            Some(json!({ "email": "house@clinic.org", "password": "secret1" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Not a patient account");
    }

    #[tokio::test]
    async fn linking_an_unknown_email_asks_for_a_name() {
        let app = app();
        let token = doctor_token(&app, "house@clinic.org").await;
        let (status, body) = call(
            &app,
            "POST",
            "/api/v1/doctor/patients/link",
            Some(&token),
            Some(json!({ "email": "new@x.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "needs_name");

        let (status, body) = call(
            &app,
            "POST",
            "/api/v1/doctor/patients/link",
            Some(&token),
            Some(json!({ "email": "new@x.com", "name": "Newt" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "created");

        let (status, body) = call(
            &app,
            "POST",
            "/api/v1/doctor/patients/link",
            Some(&token),
            Some(json!({ "email": "NEW@x.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "This patient is already in your care");
    }

    #[tokio::test]
    async fn only_the_author_deletes_an_appointment() {
        let app = app();
        let house = doctor_token(&app, "house@clinic.org").await;
        let wilson = doctor_token(&app, "wilson@clinic.org").await;

        let (_, linked) = call(
            &app,
            "POST",
            "/api/v1/doctor/patients/link",
            Some(&house),
            Some(json!({ "email": "pat@x.com", "name": "Pat" })),
        )
        .await;
        let patient_id = linked["patient"]["id"].as_str().unwrap().to_string();
        call(
            &app,
            "POST",
            "/api/v1/doctor/patients/link",
            Some(&wilson),
            Some(json!({ "email": "pat@x.com" })),
        )
        .await;

        let (status, appointment) = call(
            &app,
            "POST",
            &format!("/api/v1/patients/{}/appointments", patient_id),
            Some(&house),
            Some(json!({ "date": "2030-05-01T10:00:00" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", appointment);
        assert_eq!(appointment["date"], "2030-05-01T10:00");
        let id = appointment["id"].as_str().unwrap().to_string();

        let (status, _) =
            call(&app, "DELETE", &format!("/api/v1/appointments/{}", id), Some(&wilson), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) =
            call(&app, "DELETE", &format!("/api/v1/appointments/{}", id), Some(&house), None).await;
        assert_eq!(status, StatusCode::OK);

        let (_, listed) = call(
            &app,
            "GET",
            &format!("/api/v1/patients/{}/appointments", patient_id),
            Some(&wilson),
            None,
        )
        .await;
        assert!(listed.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn patients_are_kept_out_of_doctor_routes() {
        let app = app();
        let (status, body) = call(
            &app,
            "POST",
            "/api/v1/patient/register",
            None,
            Some(json!({
                "name": "Pat",
                "email": "pat@x.com",
                "password": "secret1",
                "confirmPassword": "secret1",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        let token = body["token"].as_str().unwrap().to_string();

        let (status, _) = call(&app, "GET", "/api/v1/doctor/patients", Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, dashboard) = call(&app, "GET", "/api/v1/patient/dashboard", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(dashboard["patient"]["name"], "Pat");
    }

    #[tokio::test]
    async fn registration_mismatch_is_reported_inline() {
        let (status, body) = call(
            &app(),
            "POST",
            "/api/v1/patient/register",
            None,
            Some(json!({
                "name": "Pat",
                "email": "pat@x.com",
                "password": "secret1",
                "confirmPassword": "secret2",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["message"], "Passwords do not match");
    }
}
