//! Route definitions for the `/users` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

/// Routes mounted at `/users`.
///
/// ```text
/// GET    /       -> search_users
/// POST   /       -> create_user
/// GET    /me     -> me
/// GET    /{id}   -> get_user
/// PUT    /{id}   -> update_user
/// DELETE /{id}   -> deactivate_user
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(users::search_users).post(users::create_user))
        .route("/me", get(users::me))
        .route(
            "/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::deactivate_user),
        )
}
