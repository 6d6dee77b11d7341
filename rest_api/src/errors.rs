// rest_api/src/errors.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::{error, warn};
use models::errors::{AuthFailure, CareError, ValidationError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RestApiError {
    #[error(transparent)]
    Care(#[from] CareError),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<ValidationError> for RestApiError {
    fn from(e: ValidationError) -> Self {
        RestApiError::Care(CareError::Validation(e))
    }
}

impl RestApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            RestApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            RestApiError::Care(e) => match e {
                CareError::Auth(AuthFailure::InvalidCredentials)
                | CareError::Auth(AuthFailure::InvalidToken)
                | CareError::Unauthenticated => StatusCode::UNAUTHORIZED,
                CareError::Auth(AuthFailure::EmailInUse) => StatusCode::CONFLICT,
                CareError::Auth(_) => StatusCode::UNPROCESSABLE_ENTITY,
                CareError::NotAPatient | CareError::Forbidden(_) | CareError::NotOwner(_) => {
                    StatusCode::FORBIDDEN
                }
                CareError::AlreadyLinked(_) | CareError::SubmissionInFlight(_) => {
                    StatusCode::CONFLICT
                }
                CareError::DoctorNotFound(_) | CareError::NotFound(_) => StatusCode::NOT_FOUND,
                CareError::NeedsName | CareError::Validation(_) | CareError::Provider(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                CareError::Storage(_)
                | CareError::Serialization(_)
                | CareError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn code(&self) -> &'static str {
        match self {
            RestApiError::Care(e) => e.code(),
            RestApiError::InvalidInput(_) => "invalid_input",
        }
    }

    fn user_message(&self) -> String {
        match self {
            RestApiError::Care(e) => e.user_message(),
            RestApiError::InvalidInput(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for RestApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected ({}): {}", status, self);
        }

        let body = Json(json!({
            "status": "error",
            "message": self.user_message(),
            "code": self.code(),
        }));

        (status, body).into_response()
    }
}
