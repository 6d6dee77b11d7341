// security/src/tokens.rs

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::{debug, error, info};
use models::errors::{AuthFailure, CareError, CareResult};
use models::identifiers::new_document_id;
use models::medical::{Principal, Role};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use carebridge_lib::config::SecurityConfig;

/// Claims for JWT.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Identity id.
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
    /// Token id, the key for revocation.
    #[serde(default)]
    pub jti: String,
}

/// Token ids revoked by logout, kept until their tokens would have expired
/// anyway. Every revocation bumps a generation counter so open feeds can
/// notice without polling.
#[derive(Debug)]
struct Revocations {
    revoked: Mutex<HashMap<String, i64>>,
    generation: watch::Sender<u64>,
}

impl Revocations {
    fn new() -> Self {
        let (generation, _) = watch::channel(0);
        Revocations { revoked: Mutex::new(HashMap::new()), generation }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, i64>> {
        self.revoked.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Issues and validates HS256 session tokens.
#[derive(Clone)]
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
    revocations: Arc<Revocations>,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl TokenSigner {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        TokenSigner {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
            revocations: Arc::new(Revocations::new()),
        }
    }

    pub fn from_config(config: &SecurityConfig) -> Self {
        Self::new(&config.jwt_secret, Duration::hours(config.token_ttl_hours))
    }

    pub fn issue(&self, principal: &Principal) -> CareResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: principal.uid().to_string(),
            email: principal.email().to_string(),
            role: principal.role(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            jti: new_document_id(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            error!("Failed to encode JWT: {}", e);
            CareError::Storage(format!("Failed to encode JWT: {}", e))
        })
    }

    /// Decodes and validates a token, including its expiry and revocation.
    pub fn verify(&self, token: &str) -> CareResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Rejected session token: {}", e);
                CareError::Auth(AuthFailure::InvalidToken)
            })?;
        if self.is_revoked(&claims.jti) {
            debug!("Rejected revoked session token for {}", claims.sub);
            return Err(CareError::Auth(AuthFailure::InvalidToken));
        }
        Ok(claims)
    }

    /// Rejects the token behind `claims` from now on. Shared by every clone
    /// of this signer.
    pub fn revoke(&self, claims: &Claims) {
        let now = Utc::now().timestamp();
        {
            let mut revoked = self.revocations.lock();
            revoked.retain(|_, exp| *exp > now);
            revoked.insert(claims.jti.clone(), claims.exp);
        }
        self.revocations.generation.send_modify(|generation| *generation += 1);
        info!("Revoked session token for {}", claims.sub);
    }

    pub fn is_revoked(&self, jti: &str) -> bool {
        self.revocations.lock().contains_key(jti)
    }

    /// Resolves once `jti` is revoked.
    pub async fn revoked(&self, jti: &str) {
        let mut generation = self.revocations.generation.subscribe();
        loop {
            if self.is_revoked(jti) {
                return;
            }
            if generation.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::identifiers::Email;
    use models::medical::PatientPrincipal;

    fn patient() -> Principal {
        Principal::Patient(PatientPrincipal {
            uid: "p1".into(),
            email: Email::parse("p@x.com").unwrap(),
            name: "Pat".into(),
        })
    }

    #[test]
    fn issued_token_round_trips_claims() {
        let signer = TokenSigner::new("test-secret", Duration::hours(1));
        let claims = signer.verify(&signer.issue(&patient()).unwrap()).unwrap();
        assert_eq!(claims.sub, "p1");
        assert_eq!(claims.role, Role::Patient);
        assert_eq!(claims.email, "p@x.com");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn expired_and_foreign_tokens_are_invalid() {
        let expired = TokenSigner::new("test-secret", Duration::hours(-1));
        let token = expired.issue(&patient()).unwrap();
        assert!(matches!(expired.verify(&token), Err(CareError::Auth(AuthFailure::InvalidToken))));

        let other = TokenSigner::new("other-secret", Duration::hours(1));
        let token = other.issue(&patient()).unwrap();
        let signer = TokenSigner::new("test-secret", Duration::hours(1));
        assert!(signer.verify(&token).is_err());
        assert!(signer.verify("garbage").is_err());
    }

    #[tokio::test]
    async fn revoked_tokens_are_rejected_by_every_clone() {
        let signer = TokenSigner::new("test-secret", Duration::hours(1));
        let first = signer.issue(&patient()).unwrap();
        let second = signer.issue(&patient()).unwrap();
        let claims = signer.verify(&first).unwrap();

        let clone = signer.clone();
        let waiter = tokio::spawn(async move { clone.revoked(&claims.jti).await });
        signer.revoke(&signer.verify(&first).unwrap());

        tokio::time::timeout(std::time::Duration::from_secs(2), waiter).await.unwrap().unwrap();
        assert!(matches!(signer.verify(&first), Err(CareError::Auth(AuthFailure::InvalidToken))));
        assert!(signer.clone().verify(&first).is_err());
        assert!(signer.verify(&second).is_ok());
    }
}
