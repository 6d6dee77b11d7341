// security/src/password.rs

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2, PasswordHash, PasswordVerifier,
};
use log::error;
use models::errors::{AuthFailure, CareError, CareResult};

/// Hashes a password using Argon2 into a PHC string.
pub fn hash_password(password: &str) -> CareResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password with Argon2: {}", e);
            CareError::Storage(format!("Failed to hash password: {}", e))
        })
}

/// Verifies a password against an Argon2 hash. A mismatch is
/// `InvalidCredentials`; a corrupt hash is a storage failure.
pub fn verify_password(password: &str, hashed_password: &str) -> CareResult<()> {
    let password_hash = PasswordHash::new(hashed_password).map_err(|e| {
        error!("Failed to parse Argon2 password hash: {}", e);
        CareError::Storage(format!("Failed to parse password hash: {}", e))
    })?;
    Argon2::default()
        .verify_password(password.as_bytes(), &password_hash)
        .map_err(|e| match e {
            argon2::password_hash::Error::Password => CareError::Auth(AuthFailure::InvalidCredentials),
            other => CareError::Storage(format!("Failed to verify password: {}", other)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_salted_and_verifiable() {
        let first = hash_password("secret1").unwrap();
        let second = hash_password("secret1").unwrap();
        assert_ne!(first, second);
        assert!(first.starts_with("$argon2"));
        verify_password("secret1", &first).unwrap();
        assert!(matches!(
            verify_password("secret2", &first),
            Err(CareError::Auth(AuthFailure::InvalidCredentials))
        ));
    }

    #[test]
    fn corrupt_hash_is_not_a_credential_failure() {
        assert!(matches!(verify_password("x", "not-a-hash"), Err(CareError::Storage(_))));
    }
}
