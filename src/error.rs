//! HTTP error taxonomy
//!
//! Every handler returns `Result<_, ApiError>`; the conversion below is the
//! only place a failure turns into a status code and `{success, message}`.

use crate::models::Violation;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

pub const INVALID_CREDENTIALS: &str = "Invalid email or password";
pub const UNAUTHENTICATED: &str = "Not authorized, please log in";

#[derive(Debug)]
pub enum ApiError {
    /// Missing or malformed input (400)
    Validation(Vec<Violation>),
    /// Request is well formed but not allowed in the current state (400)
    BadRequest(String),
    /// Login failed; one message for unknown account and wrong password (401)
    InvalidCredentials(&'static str),
    /// Missing, malformed, expired or forged token (401)
    Unauthenticated,
    /// Role or approval mismatch (403)
    Forbidden(String),
    /// Missing resource, or another tenant's resource (404)
    NotFound(String),
    /// Anything unexpected (500)
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ApiError::Validation(vec![Violation::new(field, message)])
    }

    /// `Ok(())` for an empty violation list.
    pub fn check(violations: Vec<Violation>) -> Result<(), ApiError> {
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(violations))
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials(_) | ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::Validation(violations) => violations
                .iter()
                .map(|v| v.message.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            ApiError::BadRequest(msg) | ApiError::Forbidden(msg) | ApiError::NotFound(msg) => {
                msg.clone()
            }
            ApiError::InvalidCredentials(msg) => msg.to_string(),
            ApiError::Unauthenticated => UNAUTHENTICATED.to_string(),
            // Passed through unsanitized
            ApiError::Internal(err) => format!("{:#}", err),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();

        let body = match &self {
            ApiError::Internal(err) => {
                tracing::error!("Internal error: {:#}", err);
                json!({ "success": false, "message": message })
            }
            ApiError::Validation(violations) => {
                json!({ "success": false, "message": message, "errors": violations })
            }
            _ => json!({ "success": false, "message": message }),
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_statuses() {
        assert_eq!(ApiError::validation("title", "x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::InvalidCredentials(INVALID_CREDENTIALS).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden("no".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::NotFound("gone".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(anyhow::anyhow!("disk full")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_message_passes_through() {
        let err: ApiError = anyhow::anyhow!("disk full").into();
        assert_eq!(err.message(), "disk full");
    }

    #[test]
    fn test_validation_message_joins_violations() {
        let err = ApiError::Validation(vec![
            Violation::new("title", "Please enter book title"),
            Violation::new("price", "Price must be a non-negative number"),
        ]);
        assert_eq!(
            err.message(),
            "Please enter book title, Price must be a non-negative number"
        );
    }

    #[test]
    fn test_check_accepts_empty() {
        assert!(ApiError::check(vec![]).is_ok());
        assert!(ApiError::check(vec![Violation::new("x", "y")]).is_err());
    }
}
