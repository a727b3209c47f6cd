//! Route definitions for the `/devices` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{devices, reports};
use crate::state::AppState;

/// Routes mounted at `/devices`.
///
/// ```text
/// GET    /                                   -> search_devices
/// POST   /                                   -> create_device
/// GET    /statistics                         -> device_statistics
/// GET    /status-summary                     -> status_summary
/// GET    /location-summary                   -> location_summary
/// GET    /dashboard                          -> device_overview
/// GET    /{id}                               -> get_device
/// PUT    /{id}                               -> update_device
/// DELETE /{id}                               -> delete_device
/// POST   /{id}/assign/{user_id}              -> assign_device
/// PUT    /{id}/status                        -> change_status
/// GET    /{id}/warranties                    -> list_warranties
/// POST   /{id}/warranties                    -> add_warranty
/// PUT    /{id}/warranties/{warranty_id}      -> update_warranty
/// DELETE /{id}/warranties/{warranty_id}      -> delete_warranty
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(devices::search_devices).post(devices::create_device),
        )
        .route("/statistics", get(reports::device_statistics))
        .route("/status-summary", get(reports::status_summary))
        .route("/location-summary", get(reports::location_summary))
        .route("/dashboard", get(reports::device_overview))
        .route(
            "/{id}",
            get(devices::get_device)
                .put(devices::update_device)
                .delete(devices::delete_device),
        )
        .route("/{id}/assign/{user_id}", post(devices::assign_device))
        .route("/{id}/status", put(devices::change_status))
        .route(
            "/{id}/warranties",
            get(devices::list_warranties).post(devices::add_warranty),
        )
        .route(
            "/{id}/warranties/{warranty_id}",
            put(devices::update_warranty).delete(devices::delete_warranty),
        )
}
