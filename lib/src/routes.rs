// lib/src/routes.rs

use std::fmt;
use std::str::FromStr;

use models::errors::ValidationError;
use serde::{Serialize, Serializer};

/// Client-side screens the application navigates between.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    DoctorLogin,
    DoctorDashboard,
    Chat { patient_id: String },
    PatientLogin,
    PatientDashboard,
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::DoctorLogin => "/login".to_string(),
            Route::DoctorDashboard => "/dashboard".to_string(),
            Route::Chat { patient_id } => format!("/chat/{}", patient_id),
            Route::PatientLogin => "/patient/login".to_string(),
            Route::PatientDashboard => "/patient/dashboard".to_string(),
        }
    }

    /// Screens offered from the home page.
    pub fn entry_points() -> Vec<Route> {
        vec![Route::DoctorLogin, Route::PatientLogin]
    }

    /// Every static route, with the chat route shown as a template.
    pub fn all() -> Vec<Route> {
        vec![
            Route::Home,
            Route::DoctorLogin,
            Route::DoctorDashboard,
            Route::Chat { patient_id: "{patientId}".to_string() },
            Route::PatientLogin,
            Route::PatientDashboard,
        ]
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

impl FromStr for Route {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let path = if trimmed.len() > 1 { trimmed.trim_end_matches('/') } else { trimmed };
        match path {
            "/" => Ok(Route::Home),
            "/login" => Ok(Route::DoctorLogin),
            "/dashboard" => Ok(Route::DoctorDashboard),
            "/patient/login" => Ok(Route::PatientLogin),
            "/patient/dashboard" => Ok(Route::PatientDashboard),
            other => match other.strip_prefix("/chat/") {
                Some(id) if !id.is_empty() && !id.contains('/') => {
                    Ok(Route::Chat { patient_id: id.to_string() })
                }
                _ => Err(ValidationError::UnknownRoute(s.to_string())),
            },
        }
    }
}

impl Serialize for Route {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_parse_back() {
        for route in [
            Route::Home,
            Route::DoctorLogin,
            Route::DoctorDashboard,
            Route::Chat { patient_id: "p1".into() },
            Route::PatientLogin,
            Route::PatientDashboard,
        ] {
            assert_eq!(route.path().parse::<Route>().unwrap(), route);
        }
    }

    #[test]
    fn unknown_paths_are_rejected() {
        assert!("/chat/".parse::<Route>().is_err());
        assert!("/admin".parse::<Route>().is_err());
        assert_eq!("/dashboard/".parse::<Route>().unwrap(), Route::DoctorDashboard);
    }

    #[test]
    fn serializes_as_path() {
        let json = serde_json::to_value(Route::Chat { patient_id: "p1".into() }).unwrap();
        assert_eq!(json, "/chat/p1");
    }
}
