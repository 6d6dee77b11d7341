// rest_api/src/views/forms.rs

//! Form payloads and the checks run before anything reaches a collaborator.
//! Each `validate` reports the first failing rule with the exact inline
//! message of the screen that hosts the form.

use models::errors::{ValidationError, ValidationResult};
use models::identifiers::Email;
use models::medical::{NewAppointment, NewClinicalNote};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsForm {
    pub email: String,
    pub password: String,
}

impl CredentialsForm {
    pub fn validate(&self) -> ValidationResult<Email> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(ValidationError::MissingFields);
        }
        Email::parse(&self.email)
    }
}

/// Self-service patient registration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRegistrationForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl PatientRegistrationForm {
    pub fn validate(&self, min_password_length: usize) -> ValidationResult<Email> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        if self.password.chars().count() < min_password_length {
            return Err(ValidationError::PasswordTooShort(min_password_length));
        }
        Email::parse(&self.email)
    }
}

/// The doctor dashboard's "add patient" dialog, which provisions an account.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPatientForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl AddPatientForm {
    pub fn validate(&self, min_password_length: usize) -> ValidationResult<Email> {
        if self.email.trim().is_empty() || self.name.trim().is_empty() || self.password.is_empty() {
            return Err(ValidationError::MissingFields);
        }
        if self.password.chars().count() < min_password_length {
            return Err(ValidationError::PasswordTooShort(min_password_length));
        }
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        Email::parse(&self.email)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkPatientForm {
    pub email: String,
    /// Only needed when no patient is registered under `email`.
    #[serde(default)]
    pub name: Option<String>,
}

impl LinkPatientForm {
    pub fn validate(&self) -> ValidationResult<Email> {
        Email::parse(&self.email)
    }

    pub fn fallback_name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkDoctorForm {
    pub email: String,
}

impl LinkDoctorForm {
    pub fn validate(&self) -> ValidationResult<Email> {
        Email::parse(&self.email)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentForm {
    pub date: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub specialty: Option<String>,
}

impl AppointmentForm {
    /// Date parsing and normalisation happen when the appointment is
    /// scheduled.
    pub fn validate(&self) -> ValidationResult<NewAppointment> {
        if self.date.trim().is_empty() {
            return Err(ValidationError::MissingDate);
        }
        Ok(NewAppointment {
            date: self.date.trim().to_string(),
            notes: self.notes.clone(),
            specialty: self.specialty.clone(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteForm {
    pub diagnosis: String,
    pub treatment: String,
}

impl NoteForm {
    pub fn validate(&self) -> ValidationResult<NewClinicalNote> {
        if self.diagnosis.trim().is_empty() || self.treatment.trim().is_empty() {
            return Err(ValidationError::MissingNoteFields);
        }
        Ok(NewClinicalNote {
            diagnosis: self.diagnosis.trim().to_string(),
            treatment: self.treatment.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageForm {
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_patient(name: &str, email: &str, password: &str, confirm: &str) -> AddPatientForm {
        AddPatientForm {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            confirm_password: confirm.into(),
        }
    }

    #[test]
    fn add_patient_rules_apply_in_order() {
        assert_eq!(
            add_patient("", "a@b.com", "secret1", "secret1").validate(6),
            Err(ValidationError::MissingFields)
        );
        assert_eq!(
            add_patient("Ann", "a@b.com", "abc", "xyz").validate(6),
            Err(ValidationError::PasswordTooShort(6))
        );
        assert_eq!(
            add_patient("Ann", "a@b.com", "secret1", "secret2").validate(6),
            Err(ValidationError::PasswordMismatch)
        );
        let email = add_patient("Ann", " Ann@B.com ", "secret1", "secret1").validate(6).unwrap();
        assert_eq!(email.as_str(), "ann@b.com");
    }

    #[test]
    fn too_short_password_message() {
        let err = add_patient("Ann", "a@b.com", "abc", "abc").validate(6).unwrap_err();
        assert_eq!(err.to_string(), "Password must be at least 6 characters");
    }

    #[test]
    fn registration_checks_name_then_match_then_length() {
        let form = PatientRegistrationForm {
            name: " ".into(),
            email: "p@x.com".into(),
            password: "abc".into(),
            confirm_password: "abd".into(),
        };
        assert_eq!(form.validate(6), Err(ValidationError::MissingName));

        let form = PatientRegistrationForm { name: "Pat".into(), ..form };
        assert_eq!(form.validate(6), Err(ValidationError::PasswordMismatch));

        let form = PatientRegistrationForm { confirm_password: "abc".into(), ..form };
        assert_eq!(form.validate(6), Err(ValidationError::PasswordTooShort(6)));
    }

    #[test]
    fn link_form_ignores_blank_fallback_name() {
        let form = LinkPatientForm { email: "p@x.com".into(), name: Some("  ".into()) };
        assert_eq!(form.fallback_name(), None);
        let form = LinkPatientForm { email: "p@x.com".into(), name: Some(" Pat ".into()) };
        assert_eq!(form.fallback_name(), Some("Pat"));
    }

    #[test]
    fn record_forms_require_their_fields() {
        assert_eq!(AppointmentForm::default().validate(), Err(ValidationError::MissingDate));
        let note = NoteForm { diagnosis: "Flu".into(), treatment: " ".into() };
        assert_eq!(note.validate(), Err(ValidationError::MissingNoteFields));
    }

    #[test]
    fn credentials_are_deserialized_from_camel_case() {
        let form: PatientRegistrationForm = serde_json::from_str(
            r#"{"name":"Pat","email":"p@x.com","password":"secret1","confirmPassword":"secret1"}"#,
        )
        .unwrap();
        assert!(form.validate(6).is_ok());
    }
}
