//! Route definitions for the `/warranties` resource.
//!
//! Warranty CRUD lives under `/devices/{id}/warranties`; only the
//! cross-device dashboard is mounted here.

use axum::routing::get;
use axum::Router;

use crate::handlers::reports;
use crate::state::AppState;

/// Routes mounted at `/warranties`.
///
/// ```text
/// GET /dashboard  -> warranty_dashboard
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/dashboard", get(reports::warranty_dashboard))
}
