// lib/src/identity.rs

use async_trait::async_trait;
use models::errors::CareResult;
use models::identifiers::Email;
use models::medical::Identity;

/// Issues and authenticates accounts. Implementations never touch any
/// session: creating an account does not sign it in anywhere.
#[async_trait]
pub trait IdentityProvider: Send + Sync + std::fmt::Debug {
    /// Fails with `Auth(WeakPassword)` for short passwords and
    /// `Auth(EmailInUse)` for an existing email.
    async fn create_account(&self, email: &Email, password: &str) -> CareResult<Identity>;

    /// Unknown email and wrong password both fail with
    /// `Auth(InvalidCredentials)`.
    async fn sign_in(&self, email: &Email, password: &str) -> CareResult<Identity>;

    async fn get_identity(&self, uid: &str) -> CareResult<Option<Identity>>;
}
