// rest_api/src/auth.rs

//! Bearer-token extractors. Every request re-derives its principal from the
//! token; the server keeps no per-client session between requests beyond
//! the list of revoked tokens.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use carebridge_lib::routes::Route;
use log::debug;
use models::errors::{CareError, CareResult};
use models::medical::{DoctorPrincipal, PatientPrincipal, Principal, Role};
use security::{Claims, DoctorSession, PatientSession, SessionWatcher};

use crate::errors::RestApiError;
use crate::AppState;

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Any signed-in principal.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub principal: Principal,
    pub claims: Claims,
    pub token: String,
}

#[async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = RestApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(CareError::Unauthenticated)?;
        let claims = state.signer.verify(token)?;
        let principal = state.auth.resolve(&claims).await?;
        debug!("{} {} authenticated as {}", parts.method, parts.uri.path(), principal.uid());
        Ok(Authenticated { principal, claims, token: token.to_string() })
    }
}

#[derive(Debug, Clone)]
pub struct DoctorAuth(pub DoctorPrincipal);

#[async_trait]
impl FromRequestParts<AppState> for DoctorAuth {
    type Rejection = RestApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match Authenticated::from_request_parts(parts, state).await?.principal {
            Principal::Doctor(doctor) => Ok(DoctorAuth(doctor)),
            Principal::Patient(_) => Err(CareError::Forbidden("doctor only".to_string()).into()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PatientAuth(pub PatientPrincipal);

#[async_trait]
impl FromRequestParts<AppState> for PatientAuth {
    type Rejection = RestApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match Authenticated::from_request_parts(parts, state).await?.principal {
            Principal::Patient(patient) => Ok(PatientAuth(patient)),
            Principal::Doctor(_) => Err(CareError::Forbidden("patient only".to_string()).into()),
        }
    }
}

/// A role-specific session with its own cell, used where a connection needs
/// session state of its own.
#[derive(Debug, Clone)]
pub enum RoleSession {
    Doctor(DoctorSession),
    Patient(PatientSession),
}

impl RoleSession {
    pub async fn restore(&self, token: &str) -> CareResult<Principal> {
        match self {
            RoleSession::Doctor(session) => session.restore(token).await,
            RoleSession::Patient(session) => session.restore(token).await,
        }
    }

    pub fn logout(&self) {
        match self {
            RoleSession::Doctor(session) => session.logout(),
            RoleSession::Patient(session) => session.logout(),
        }
    }

    pub fn watch(&self) -> SessionWatcher {
        match self {
            RoleSession::Doctor(session) => session.watch(),
            RoleSession::Patient(session) => session.watch(),
        }
    }

    pub fn home(&self) -> Route {
        match self {
            RoleSession::Doctor(_) => Route::DoctorDashboard,
            RoleSession::Patient(_) => Route::PatientDashboard,
        }
    }
}

impl AppState {
    pub fn session_for(&self, role: Role) -> RoleSession {
        match role {
            Role::Doctor => RoleSession::Doctor(self.doctor_session()),
            Role::Patient => RoleSession::Patient(self.patient_session()),
        }
    }
}
