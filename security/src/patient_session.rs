// security/src/patient_session.rs

use carebridge_lib::routes::Route;
use log::{info, warn};
use models::errors::{AuthFailure, CareError, CareResult};
use models::identifiers::Email;
use models::medical::{Principal, Role};

use crate::authenticator::CareAuthenticator;
use crate::doctor_session::SessionTicket;
use crate::session::{SessionCell, SessionWatcher};
use crate::tokens::TokenSigner;

/// Like `DoctorSession`, but a session only exists for identities that own a
/// patient record.
#[derive(Debug, Clone)]
pub struct PatientSession {
    auth: CareAuthenticator,
    cell: SessionCell,
    signer: TokenSigner,
}

impl PatientSession {
    pub fn new(auth: CareAuthenticator, cell: SessionCell, signer: TokenSigner) -> Self {
        PatientSession { auth, cell, signer }
    }

    fn establish(&self, principal: Principal) -> CareResult<SessionTicket> {
        let token = self.signer.issue(&principal)?;
        self.cell.publish(Some(principal.clone()));
        Ok(SessionTicket { token, principal, next: Route::PatientDashboard })
    }

    /// An identity without a patient record is signed straight back out and
    /// the call fails with `NotAPatient`.
    pub async fn sign_in(&self, email: &Email, password: &str) -> CareResult<SessionTicket> {
        match self.auth.patient_sign_in(email, password).await {
            Ok(principal) => self.establish(principal),
            Err(CareError::NotAPatient) => {
                warn!("{} authenticated but is not a patient; signing out", email);
                self.cell.clear();
                Err(CareError::NotAPatient)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn register(
        &self,
        name: &str,
        email: &Email,
        password: &str,
    ) -> CareResult<SessionTicket> {
        let principal = self.auth.patient_register(name, email, password).await?;
        self.establish(principal)
    }

    async fn verified_principal(&self, token: &str) -> CareResult<Principal> {
        let claims = self.signer.verify(token)?;
        if claims.role != Role::Patient {
            return Err(CareError::Auth(AuthFailure::InvalidToken));
        }
        self.auth.resolve(&claims).await
    }

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

    pub fn logout(&self) {
        if let Some(principal) = self.cell.current() {
            info!("Patient {} signed out", principal.uid());
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
