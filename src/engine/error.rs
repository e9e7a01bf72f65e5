//! Error taxonomy for the payroll engine.
//!
//! Every failure aborts its enclosing transaction wholesale; there is no
//! partial commit and no silent skip of invalid rows. Retrying is simply
//! re-invoking the same operation.

use actix_web::{HttpResponse, http::StatusCode};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Missing or malformed required field in an import row or manual edit.
    #[error("validation failed: {message}")]
    Validation { message: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A state-machine or unique-key violation.
    #[error("conflict: {message}")]
    Conflict { message: String },

    #[error("no active employees found for calculation")]
    NoActiveEmployees,

    /// The underlying store aborted the transaction.
    #[error("transaction failed: {0}")]
    Transaction(#[from] sqlx::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl actix_web::ResponseError for EngineError {
    fn status_code(&self) -> StatusCode {
        match self {
            EngineError::Validation { .. } | EngineError::NoActiveEmployees => {
                StatusCode::BAD_REQUEST
            }
            EngineError::NotFound { .. } => StatusCode::NOT_FOUND,
            EngineError::Conflict { .. } => StatusCode::CONFLICT,
            EngineError::Transaction(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let EngineError::Transaction(e) = self {
            tracing::error!(error = %e, "Engine transaction failed");
            return HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            }));
        }

        HttpResponse::build(self.status_code()).json(json!({
            "message": self.to_string()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::ResponseError;

    #[test]
    fn not_found_displays_entity_and_id() {
        let error = EngineError::NotFound {
            entity: "payroll batch",
            id: "2026-07".to_string(),
        };
        assert_eq!(error.to_string(), "payroll batch not found: 2026-07");
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn conflict_maps_to_409() {
        let error = EngineError::Conflict {
            message: "batch 2026-07 is approved".to_string(),
        };
        assert_eq!(error.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn no_active_employees_maps_to_400() {
        assert_eq!(
            EngineError::NoActiveEmployees.status_code(),
            StatusCode::BAD_REQUEST
        );
    }
}
