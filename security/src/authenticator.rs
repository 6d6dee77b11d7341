// security/src/authenticator.rs

use std::sync::Arc;

use carebridge_lib::identity::IdentityProvider;
use carebridge_lib::storage_engine::DocumentStore;
use log::{info, warn};
use models::collections::{PATIENTS, USERS};
use models::errors::{AuthFailure, CareError, CareResult, ValidationError};
use models::identifiers::Email;
use models::medical::{
    DoctorPrincipal, Identity, PatientPrincipal, PatientRecord, Principal, Role, UserProfile,
};

use crate::tokens::Claims;

/// Role logic on top of the identity provider. Holds no session state; the
/// session types publish what it resolves.
#[derive(Debug, Clone)]
pub struct CareAuthenticator {
    identities: Arc<dyn IdentityProvider>,
    store: Arc<dyn DocumentStore>,
}

impl CareAuthenticator {
    pub fn new(identities: Arc<dyn IdentityProvider>, store: Arc<dyn DocumentStore>) -> Self {
        CareAuthenticator { identities, store }
    }

    pub async fn doctor_sign_in(&self, email: &Email, password: &str) -> CareResult<Principal> {
        let identity = self.identities.sign_in(email, password).await?;
        info!("Doctor {} signed in", identity.uid);
        Ok(Principal::Doctor(DoctorPrincipal::from_identity(identity)))
    }

    /// Creates the account and its `users` profile with role `doctor`.
    pub async fn doctor_sign_up(&self, email: &Email, password: &str) -> CareResult<Principal> {
        let identity = self.identities.create_account(email, password).await?;
        let profile = UserProfile::new(&identity.uid, &identity.email, Role::Doctor);
        self.store.set(USERS, &identity.uid, serde_json::to_value(&profile)?).await?;
        info!("Doctor {} signed up", identity.uid);
        Ok(Principal::Doctor(DoctorPrincipal::from_identity(identity)))
    }

    /// Authenticates, then requires a patient record for the identity.
    pub async fn patient_sign_in(&self, email: &Email, password: &str) -> CareResult<Principal> {
        let identity = self.identities.sign_in(email, password).await?;
        self.patient_principal(identity).await
    }

    /// Creates the account and its patient record keyed by the identity id.
    pub async fn patient_register(
        &self,
        name: &str,
        email: &Email,
        password: &str,
    ) -> CareResult<Principal> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingName.into());
        }
        let identity = self.identities.create_account(email, password).await?;
        let record = PatientRecord::new(identity.uid.as_str(), name, &identity.email);
        self.store.set(PATIENTS, &identity.uid, serde_json::to_value(&record)?).await?;
        info!("Patient {} registered", identity.uid);
        Ok(Principal::Patient(PatientPrincipal {
            uid: identity.uid,
            email: identity.email,
            name: record.name,
        }))
    }

    async fn patient_principal(&self, identity: Identity) -> CareResult<Principal> {
        let Some(doc) = self.store.get(PATIENTS, &identity.uid).await? else {
            warn!("Identity {} has no patient record", identity.uid);
            return Err(CareError::NotAPatient);
        };
        let record: PatientRecord = doc.decode()?;
        Ok(Principal::Patient(PatientPrincipal {
            uid: identity.uid,
            email: identity.email,
            name: record.name,
        }))
    }

    /// Re-derives the principal behind a validated token.
    pub async fn resolve(&self, claims: &Claims) -> CareResult<Principal> {
        let identity = self
            .identities
            .get_identity(&claims.sub)
            .await?
            .ok_or(CareError::Auth(AuthFailure::InvalidToken))?;
        match claims.role {
            Role::Doctor => Ok(Principal::Doctor(DoctorPrincipal::from_identity(identity))),
            Role::Patient => self.patient_principal(identity).await,
        }
    }
}
