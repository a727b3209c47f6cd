//! Route definitions for the `/device-requests` resource.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::{device_requests, reports};
use crate::state::AppState;

/// Routes mounted at `/device-requests`.
///
/// ```text
/// GET    /              -> list_requests
/// POST   /              -> create_request
/// GET    /dashboard     -> request_dashboard
/// GET    /{id}          -> get_request
/// DELETE /{id}          -> delete_request
/// PUT    /{id}/status   -> update_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(device_requests::list_requests).post(device_requests::create_request),
        )
        .route("/dashboard", get(reports::request_dashboard))
        .route(
            "/{id}",
            get(device_requests::get_request).delete(device_requests::delete_request),
        )
        .route("/{id}/status", put(device_requests::update_status))
}
