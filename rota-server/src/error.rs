//! HTTP error responses
//!
//! Business rejections carry their own code and message. Anything the store
//! could not classify is reported as a generic `SERVER` error and the detail
//! only goes to the log.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rota_core::{ConflictReason, Error};
use serde::Serialize;
use tracing::{error, warn};

const NOT_FOUND_MESSAGE: &str = "data not found";
const SERVER_MESSAGE: &str = "error in service work";

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

/// Wrapper to make [`rota_core::Error`] usable as an axum error response
#[derive(Debug)]
pub struct ApiError(Error);

impl ApiError {
    /// HTTP status for this error
    ///
    /// A team name collision is a bad request, the other conflicts are 409.
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(ConflictReason::TeamExists) => StatusCode::BAD_REQUEST,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::Config(_) | Error::Io(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match &self.0 {
            Error::NotFound(_) => "NOT_FOUND",
            Error::Conflict(reason) => reason.code(),
            Error::InvalidInput(_) => "INVALID_INPUT",
            _ => "SERVER",
        }
    }

    fn public_message(&self) -> String {
        match &self.0 {
            Error::NotFound(_) => NOT_FOUND_MESSAGE.to_string(),
            Error::Conflict(reason) => reason.message().to_string(),
            Error::InvalidInput(detail) => detail.clone(),
            _ => SERVER_MESSAGE.to_string(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(Error::InvalidInput(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(Error::InvalidInput(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        if status.is_server_error() {
            error!(code, error = %self.0, "Request failed");
        } else {
            warn!(code, error = %self.0, "Request rejected");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code,
                message: self.public_message(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Reject blank identifiers before they reach the store
pub fn require(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{} must not be empty", field)).into());
    }
    Ok(())
}
