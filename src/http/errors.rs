use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;

use crate::domain::order::OrderError;

// ============================================================================
// Error → HTTP mapping
// ============================================================================
//
// Validation → 400, NotFound → 404, Constraint → 409, Persistence → 500.
// Store internals are logged, never echoed to the client.
//
// ============================================================================

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

impl ResponseError for OrderError {
    fn status_code(&self) -> StatusCode {
        match self {
            OrderError::Validation(_) => StatusCode::BAD_REQUEST,
            OrderError::NotFound(_) => StatusCode::NOT_FOUND,
            OrderError::Constraint(_) => StatusCode::CONFLICT,
            OrderError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            OrderError::Persistence(source) => {
                tracing::error!(
                    operation = source.operation(),
                    error = %source,
                    "Request failed in the order store"
                );
                "The order store failed to complete the request".to_string()
            }
            OrderError::Constraint(source) => {
                tracing::warn!(
                    operation = source.operation(),
                    error = %source,
                    "Request rejected by a store constraint"
                );
                "The request conflicts with existing order data".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.kind(),
            message,
        })
    }
}

/// Turn an extractor failure (body, path or query) into a 400 response.
pub(crate) fn bad_request(detail: impl std::fmt::Display) -> actix_web::Error {
    OrderError::Validation(detail.to_string()).into()
}
