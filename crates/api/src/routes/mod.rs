pub mod auth;
pub mod device_requests;
pub mod devices;
pub mod health;
pub mod users;
pub mod warranties;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                                   login (public)
/// /auth/register                                register (public)
///
/// /users                                        search, create
/// /users/me                                     own profile
/// /users/{id}                                   get, update, deactivate
///
/// /devices                                      search, create
/// /devices/statistics                           counts and percentages
/// /devices/status-summary                       per-status breakdown
/// /devices/location-summary                     per-location breakdown
/// /devices/dashboard                            overview
/// /devices/{id}                                 get, update, delete
/// /devices/{id}/assign/{user_id}                assign (POST)
/// /devices/{id}/status                          change status (PUT)
/// /devices/{id}/warranties                      list, add
/// /devices/{id}/warranties/{warranty_id}        update, delete
///
/// /warranties/dashboard                         expiry dashboard
///
/// /device-requests                              list, submit
/// /device-requests/dashboard                    counts and recent requests
/// /device-requests/{id}                         get, delete
/// /device-requests/{id}/status                  approve / reject (PUT)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/devices", devices::router())
        .nest("/warranties", warranties::router())
        .nest("/device-requests", device_requests::router())
}
