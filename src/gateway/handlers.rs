use super::error::ApiError;
use super::AppState;
use crate::models::{IdentifyRequest, PlantReport};
use crate::submission::ImageSubmission;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use tracing::{debug, info};

/// `POST /api/identify-plant`
pub async fn identify_plant(
    State(state): State<AppState>,
    payload: Result<Json<IdentifyRequest>, JsonRejection>,
) -> Result<Json<PlantReport>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            debug!("Unreadable identify request body: {}", rejection.body_text());
            ApiError::MissingImage
        }
    })?;

    let image_data = request
        .image_data
        .filter(|data| !data.is_empty())
        .ok_or(ApiError::MissingImage)?;

    let submission = ImageSubmission::from_image_data(&image_data, state.max_body_bytes)
        .inspect_err(|e| debug!("Rejected image submission: {}", e))?;

    info!(
        "Identifying plant from {} image ({} bytes)",
        submission.mime_type,
        submission.bytes.len()
    );

    let report = state.service.identify(&submission).await?;
    Ok(Json(report))
}

/// Any non-`POST` call on the identify route.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
