use actix_web::{HttpResponse, ResponseError, http};
use serde_json::json;
use thiserror::Error;

use crate::leave::validation::ValidationErrors;
use crate::repository::RepositoryError;

#[derive(Debug, Error)]
pub enum LeaveError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("{0}")]
    Conflict(String),
    #[error("leave request {0} not found")]
    NotFound(u64),
    #[error("{0}")]
    Forbidden(String),
    #[error(transparent)]
    Infrastructure(#[from] RepositoryError),
}

impl From<ValidationErrors> for LeaveError {
    fn from(errors: ValidationErrors) -> Self {
        LeaveError::Validation(errors)
    }
}

impl ResponseError for LeaveError {
    fn status_code(&self) -> http::StatusCode {
        match self {
            LeaveError::Validation(_) => http::StatusCode::UNPROCESSABLE_ENTITY,
            LeaveError::Conflict(_) => http::StatusCode::CONFLICT,
            LeaveError::NotFound(_) => http::StatusCode::NOT_FOUND,
            LeaveError::Forbidden(_) => http::StatusCode::FORBIDDEN,
            LeaveError::Infrastructure(_) => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            LeaveError::Validation(errors) => json!({
                "message": "Validation failed",
                "errors": errors
            }),
            LeaveError::Infrastructure(e) => {
                tracing::error!(error = %e, "Leave storage failure");
                json!({ "message": "Internal Server Error" })
            }
            other => json!({ "message": other.to_string() }),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}
