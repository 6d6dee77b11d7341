// security/src/lib.rs

pub mod authenticator;
pub mod doctor_session;
pub mod identity_provider;
pub mod password;
pub mod patient_session;
pub mod session;
pub mod tokens;

pub use authenticator::CareAuthenticator;
pub use doctor_session::{DoctorSession, SessionTicket};
pub use identity_provider::LocalIdentityProvider;
pub use password::{hash_password, verify_password};
pub use patient_session::PatientSession;
pub use session::{SessionCell, SessionWatcher};
pub use tokens::{Claims, TokenSigner};
