// security/src/doctor_session.rs

use carebridge_lib::routes::Route;
use log::info;
use models::errors::{AuthFailure, CareError, CareResult};
use models::identifiers::Email;
use models::medical::{Principal, Role};
use serde::Serialize;

use crate::authenticator::CareAuthenticator;
use crate::session::{SessionCell, SessionWatcher};
use crate::tokens::TokenSigner;

/// What a successful sign-in hands back to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionTicket {
    pub token: String,
    pub principal: Principal,
    pub next: Route,
}

#[derive(Debug, Clone)]
pub struct DoctorSession {
    auth: CareAuthenticator,
    cell: SessionCell,
    signer: TokenSigner,
}

impl DoctorSession {
    pub fn new(auth: CareAuthenticator, cell: SessionCell, signer: TokenSigner) -> Self {
        DoctorSession { auth, cell, signer }
    }

    fn establish(&self, principal: Principal) -> CareResult<SessionTicket> {
        let token = self.signer.issue(&principal)?;
        self.cell.publish(Some(principal.clone()));
        Ok(SessionTicket { token, principal, next: Route::DoctorDashboard })
    }

    pub async fn sign_in(&self, email: &Email, password: &str) -> CareResult<SessionTicket> {
        let principal = self.auth.doctor_sign_in(email, password).await?;
        self.establish(principal)
    }

    pub async fn sign_up(&self, email: &Email, password: &str) -> CareResult<SessionTicket> {
        let principal = self.auth.doctor_sign_up(email, password).await?;
        self.establish(principal)
    }

    async fn verified_principal(&self, token: &str) -> CareResult<Principal> {
        let claims = self.signer.verify(token)?;
        if claims.role != Role::Doctor {
            return Err(CareError::Auth(AuthFailure::InvalidToken));
        }
        self.auth.resolve(&claims).await
    }

    /// Rehydrates the session from a previously issued token. A rejected
    /// token leaves the session signed out.
    pub async fn restore(&self, token: &str) -> CareResult<Principal> {
        match self.verified_principal(token).await {
            Ok(principal) => {
                self.cell.publish(Some(principal.clone()));
                Ok(principal)
            }
            Err(e) => {
                self.cell.clear();
                Err(e)
            }
        }
    }

    /// Idempotent.
    pub fn logout(&self) {
        if let Some(principal) = self.cell.current() {
            info!("Doctor {} signed out", principal.uid());
        }
        self.cell.clear();
    }

    pub fn current(&self) -> Option<Principal> {
        self.cell.current()
    }

    pub fn watch(&self) -> SessionWatcher {
        self.cell.subscribe()
    }
}
