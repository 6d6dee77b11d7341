// models/src/errors.rs

use std::fmt;
use thiserror::Error;

/// Why the identity provider refused a credential operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// Unknown email or wrong password. The two are deliberately indistinguishable.
    InvalidCredentials,
    /// An account with this email already exists.
    EmailInUse,
    /// Password shorter than the configured minimum length.
    WeakPassword(usize),
    /// The email address could not be parsed.
    InvalidEmail,
    /// Token missing, malformed or expired.
    InvalidToken,
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AuthFailure::InvalidCredentials => write!(f, "invalid email or password"),
            AuthFailure::EmailInUse => write!(f, "email address is already in use"),
            AuthFailure::WeakPassword(min) => {
                write!(f, "Password should be at least {} characters", min)
            }
            AuthFailure::InvalidEmail => write!(f, "email address is badly formatted"),
            AuthFailure::InvalidToken => write!(f, "session token is invalid or expired"),
        }
    }
}

/// Which side of the roster tried to create a link that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// A doctor adding a patient who is already in their care.
    PatientInCare,
    /// A patient adding a doctor who is already assigned to them.
    DoctorAssigned,
}

#[derive(Debug, Error)]
pub enum CareError {
    #[error("Authentication failed: {0}")]
    Auth(AuthFailure),

    #[error("Not a patient account")]
    NotAPatient,

    #[error("Already linked: {0:?}")]
    AlreadyLinked(LinkKind),

    /// Not terminal: the caller should ask for a name and retry.
    #[error("No patient record for this email; a name is required to create one")]
    NeedsName,

    #[error("No doctor registered with email {0}")]
    DoctorNotFound(String),

    #[error("Record {0} belongs to another doctor")]
    NotOwner(String),

    #[error("{0}")]
    Provider(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage operation failed: {0}")]
    Storage(String),

    #[error("JSON serialization/deserialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not signed in")]
    Unauthenticated,

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("A submission for {0} is already in flight")]
    SubmissionInFlight(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl CareError {
    /// Short, human-readable text shown inline next to the form that
    /// triggered the failure.
    pub fn user_message(&self) -> String {
        match self {
            CareError::Auth(AuthFailure::EmailInUse) => {
                "Failed to create account. Email might be in use.".to_string()
            }
            CareError::Auth(AuthFailure::WeakPassword(min)) => {
                format!("Password must be at least {} characters", min)
            }
            CareError::Auth(AuthFailure::InvalidEmail) => {
                "Please enter a valid email address".to_string()
            }
            CareError::Auth(AuthFailure::InvalidToken) | CareError::Unauthenticated => {
                "Your session has expired. Please sign in again.".to_string()
            }
            CareError::Auth(AuthFailure::InvalidCredentials) => {
                "Failed to sign in. Please check your credentials.".to_string()
            }
            CareError::NotAPatient => "Not a patient account".to_string(),
            CareError::AlreadyLinked(LinkKind::PatientInCare) => {
                "This patient is already in your care".to_string()
            }
            CareError::AlreadyLinked(LinkKind::DoctorAssigned) => {
                "This doctor is already assigned to you".to_string()
            }
            CareError::NeedsName => {
                "Patient not found. Please enter their name to create a new account.".to_string()
            }
            CareError::DoctorNotFound(_) => {
                "Doctor not found. Please check the email address and try again.".to_string()
            }
            CareError::NotOwner(_) => "You can only delete records you created.".to_string(),
            CareError::Provider(msg) => msg.clone(),
            CareError::Validation(e) => e.to_string(),
            CareError::SubmissionInFlight(_) => {
                "Please wait for the previous request to finish.".to_string()
            }
            CareError::Forbidden(_) => "You do not have access to this page.".to_string(),
            CareError::NotFound(_) => "The requested record could not be found.".to_string(),
            CareError::Storage(_) | CareError::Serialization(_) | CareError::Configuration(_) => {
                "An error occurred. Please try again.".to_string()
            }
        }
    }

    /// Stable machine-readable tag for the variant.
    pub fn code(&self) -> &'static str {
        match self {
            CareError::Auth(_) => "auth",
            CareError::NotAPatient => "not_a_patient",
            CareError::AlreadyLinked(_) => "already_linked",
            CareError::NeedsName => "needs_name",
            CareError::DoctorNotFound(_) => "doctor_not_found",
            CareError::NotOwner(_) => "not_owner",
            CareError::Provider(_) => "provider",
            CareError::NotFound(_) => "not_found",
            CareError::Validation(_) => "validation",
            CareError::Storage(_) => "storage",
            CareError::Serialization(_) => "serialization",
            CareError::Unauthenticated => "unauthenticated",
            CareError::Forbidden(_) => "forbidden",
            CareError::SubmissionInFlight(_) => "in_flight",
            CareError::Configuration(_) => "configuration",
        }
    }
}

/// Input rejected before it reached a collaborator. The display text is the
/// exact message shown next to the offending form.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("All fields are required")]
    MissingFields,
    #[error("Please enter your name")]
    MissingName,
    #[error("Please enter an email address")]
    MissingEmail,
    #[error("Please enter a valid email address")]
    InvalidEmail(String),
    #[error("Password must be at least {0} characters")]
    PasswordTooShort(usize),
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Please choose a date and time")]
    MissingDate,
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Diagnosis and treatment are required")]
    MissingNoteFields,
    #[error("Message text cannot be empty")]
    EmptyMessage,
    #[error("Unknown route: {0}")]
    UnknownRoute(String),
}

pub type CareResult<T> = Result<T, CareError>;

pub type ValidationResult<T> = Result<T, ValidationError>;
