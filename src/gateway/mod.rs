//! HTTP gateway
//!
//! Accepts `{ "imageData": "..." }` submissions, hands the decoded image to
//! the identification service and maps every failure onto a small fixed set
//! of error responses.

pub mod error;
pub mod handlers;

pub use error::ApiError;

use crate::service::IdentificationService;
use axum::extract::{DefaultBodyLimit, Request};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info_span;
use uuid::Uuid;

pub const IDENTIFY_PATH: &str = "/api/identify-plant";
pub const HEALTH_PATH: &str = "/health";

/// Room for the JSON envelope and a data-URI prefix around the base64 text.
const ENVELOPE_ALLOWANCE: usize = 16 * 1024;

/// Raw body ceiling admitting a base64 image of `max_decoded_bytes`.
///
/// The decoded-size check in [`ImageSubmission`](crate::submission::ImageSubmission)
/// is the limit that binds; this only stops bodies that cannot possibly fit.
pub fn body_limit_for(max_decoded_bytes: usize) -> usize {
    max_decoded_bytes
        .div_ceil(3)
        .saturating_mul(4)
        .saturating_add(ENVELOPE_ALLOWANCE)
}

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<IdentificationService>,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(service: IdentificationService, max_body_bytes: usize) -> Self {
        Self {
            service: Arc::new(service),
            max_body_bytes,
        }
    }
}

/// Returns the [`Router`] of this service.
pub fn router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        let request_id = Uuid::new_v4();
        info_span!(
            "http_request",
            %request_id,
            method = ?request.method(),
            uri = %request.uri()
        )
    });

    let body_limit = DefaultBodyLimit::max(body_limit_for(state.max_body_bytes));

    Router::new()
        .route(
            IDENTIFY_PATH,
            post(handlers::identify_plant).fallback(handlers::method_not_allowed),
        )
        .route(HEALTH_PATH, get(handlers::health))
        .fallback(handlers::not_found)
        .layer(body_limit)
        .layer(trace_layer)
        .with_state(state)
}
