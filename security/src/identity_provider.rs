// security/src/identity_provider.rs

use std::sync::Arc;

use async_trait::async_trait;
use carebridge_lib::identity::IdentityProvider;
use carebridge_lib::storage_engine::DocumentStore;
use chrono::Utc;
use log::{info, warn};
use models::collections::IDENTITIES;
use models::errors::{AuthFailure, CareError, CareResult};
use models::identifiers::{new_document_id, Email};
use models::medical::Identity;
use models::queries::{Direction, Query};
use models::timestamps::format_timestamp;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::password::{hash_password, verify_password};

/// Stored form of an account in the `identities` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialRecord {
    uid: String,
    email: Email,
    password_hash: String,
    created_at: String,
}

impl From<CredentialRecord> for Identity {
    fn from(record: CredentialRecord) -> Self {
        Identity { uid: record.uid, email: record.email }
    }
}

/// Identity provider over the document store, with argon2 password hashes.
#[derive(Debug)]
pub struct LocalIdentityProvider {
    store: Arc<dyn DocumentStore>,
    min_password_length: usize,
    create_lock: Mutex<()>,
}

impl LocalIdentityProvider {
    pub fn new(store: Arc<dyn DocumentStore>, min_password_length: usize) -> Self {
        LocalIdentityProvider { store, min_password_length, create_lock: Mutex::new(()) }
    }

    async fn find_by_email(&self, email: &Email) -> CareResult<Option<CredentialRecord>> {
        let query = Query::new()
            .where_eq("email", email.as_str())
            .order_by("createdAt", Direction::Asc)
            .limit(1);
        match self.store.query(IDENTITIES, &query).await?.into_iter().next() {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn create_account(&self, email: &Email, password: &str) -> CareResult<Identity> {
        if password.chars().count() < self.min_password_length {
            return Err(CareError::Auth(AuthFailure::WeakPassword(self.min_password_length)));
        }

        // Check-then-insert must not interleave with another sign-up.
        let _guard = self.create_lock.lock().await;
        if self.find_by_email(email).await?.is_some() {
            warn!("Rejected sign-up for {}: email already in use", email);
            return Err(CareError::Auth(AuthFailure::EmailInUse));
        }

        let record = CredentialRecord {
            uid: new_document_id(),
            email: email.clone(),
            password_hash: hash_password(password)?,
            created_at: format_timestamp(Utc::now()),
        };
        self.store.set(IDENTITIES, &record.uid, serde_json::to_value(&record)?).await?;
        info!("Created identity {} for {}", record.uid, email);
        Ok(record.into())
    }

    async fn sign_in(&self, email: &Email, password: &str) -> CareResult<Identity> {
        let Some(record) = self.find_by_email(email).await? else {
            info!("Sign-in for unknown email {}", email);
            return Err(CareError::Auth(AuthFailure::InvalidCredentials));
        };
        verify_password(password, &record.password_hash)?;
        Ok(record.into())
    }

    async fn get_identity(&self, uid: &str) -> CareResult<Option<Identity>> {
        match self.store.get(IDENTITIES, uid).await? {
            Some(doc) => Ok(Some(doc.decode::<CredentialRecord>()?.into())),
            None => Ok(None),
        }
    }
}
