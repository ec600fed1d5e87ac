use std::fmt;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use common::LedgerError;
use serde_json::json;
use tracing::error;

/// HTTP face of a [`LedgerError`].
#[derive(Debug)]
pub struct ApiError(pub LedgerError);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError(LedgerError::InvalidInput(message.into()))
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        ApiError(LedgerError::NotFound(what.into()))
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            LedgerError::NotFound(_) => StatusCode::NOT_FOUND,
            LedgerError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            LedgerError::InvalidTransition { .. } => StatusCode::CONFLICT,
            e if e.is_unique_violation() => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status.is_server_error() {
            error!(error = %self.0, "Request failed");
            "Internal server error".to_string()
        } else if self.0.is_unique_violation() {
            "Resource already exists".to_string()
        } else {
            self.0.to_string()
        };

        HttpResponse::build(status).json(json!({
            "error": message,
            "status": status.as_u16(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_errors_map_to_status_codes() {
        assert_eq!(ApiError::not_found("user 7").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::bad_request("nope").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError(LedgerError::InvalidTransition {
                id: 3,
                status: "confirmed".to_string()
            })
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError(LedgerError::Database(sqlx::Error::PoolTimedOut)).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn server_errors_hide_details() {
        let response = ApiError(LedgerError::Config("secret dsn".to_string())).error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
