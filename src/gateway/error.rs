use crate::models::ErrorBody;
use crate::submission::SubmissionError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// The fixed set of failures a caller can observe. Display strings are the
/// exact messages sent in the `error` field.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("No image data provided")]
    MissingImage,
    #[error("Payload too large")]
    PayloadTooLarge,
    #[error("Not found")]
    NotFound,
    #[error("Failed to identify plant")]
    IdentificationFailed,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::MissingImage => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::IdentificationFailed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(ErrorBody::new(self.to_string()))).into_response()
    }
}

impl From<SubmissionError> for ApiError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::Empty | SubmissionError::InvalidBase64(_) => ApiError::MissingImage,
            SubmissionError::TooLarge { .. } => ApiError::PayloadTooLarge,
        }
    }
}

/// Upstream details are logged here and never reach the caller.
impl From<crate::Error> for ApiError {
    fn from(err: crate::Error) -> Self {
        tracing::error!("Error identifying plant: {}", err);
        ApiError::IdentificationFailed
    }
}
