// models/src/medical/role.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{AuthFailure, CareError};
use crate::identifiers::Email;

/// Role tag stored in the `type` field of `users` and `patients` documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Doctor,
    Patient,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Doctor => "doctor",
            Role::Patient => "patient",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "doctor" => Ok(Role::Doctor),
            "patient" => Ok(Role::Patient),
            _ => Err(CareError::Auth(AuthFailure::InvalidToken)),
        }
    }
}

/// An account issued by the identity provider. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,
    pub email: Email,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorPrincipal {
    pub uid: String,
    pub email: Email,
    pub display_name: String,
}

impl DoctorPrincipal {
    pub fn from_identity(identity: Identity) -> Self {
        let display_name = crate::identifiers::display_name_from_email(identity.email.as_str());
        DoctorPrincipal { uid: identity.uid, email: identity.email, display_name }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientPrincipal {
    pub uid: String,
    pub email: Email,
    pub name: String,
}

/// The authenticated party behind a session, resolved once when the session
/// is established.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Principal {
    Doctor(DoctorPrincipal),
    Patient(PatientPrincipal),
}

impl Principal {
    pub fn uid(&self) -> &str {
        match self {
            Principal::Doctor(d) => &d.uid,
            Principal::Patient(p) => &p.uid,
        }
    }

    pub fn email(&self) -> &Email {
        match self {
            Principal::Doctor(d) => &d.email,
            Principal::Patient(p) => &p.email,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Principal::Doctor(_) => Role::Doctor,
            Principal::Patient(_) => Role::Patient,
        }
    }

    /// Name shown next to chat messages this principal sends.
    pub fn display_name(&self) -> &str {
        match self {
            Principal::Doctor(d) => &d.display_name,
            Principal::Patient(p) => &p.name,
        }
    }

    pub fn as_doctor(&self) -> Option<&DoctorPrincipal> {
        match self {
            Principal::Doctor(d) => Some(d),
            Principal::Patient(_) => None,
        }
    }

    pub fn as_patient(&self) -> Option<&PatientPrincipal> {
        match self {
            Principal::Patient(p) => Some(p),
            Principal::Doctor(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn principal_serializes_with_role_tag() {
        let principal = Principal::Doctor(DoctorPrincipal::from_identity(Identity {
            uid: "d1".into(),
            email: Email::parse("house@clinic.org").unwrap(),
        }));
        let json = serde_json::to_value(&principal).unwrap();
        assert_eq!(json["role"], "doctor");
        assert_eq!(json["displayName"], "house");
        assert_eq!(principal.display_name(), "house");
    }

    #[test]
    fn role_round_trips_through_str() {
        assert_eq!("Patient".parse::<Role>().unwrap(), Role::Patient);
        assert!("nurse".parse::<Role>().is_err());
    }
}
