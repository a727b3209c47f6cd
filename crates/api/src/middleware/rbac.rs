//! Capability extractors.
//!
//! Each extractor wraps [`AuthUser`] and rejects the request with 403 unless
//! the user's role holds the named [`Capability`]. Per-target rules (who may
//! see which user, request or warranty) are checked inside handlers.
//!
//! ```ignore
//! async fn approve(RequireDecideRequest(user): RequireDecideRequest) -> AppResult<Json<()>> {
//!     // user is guaranteed to be a super admin here
//!     Ok(Json(()))
//! }
//! ```

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use inventory_core::access::{authorize, Capability};

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

macro_rules! capability_extractor {
    ($(#[$meta:meta])* $name:ident => $capability:expr) => {
        $(#[$meta])*
        pub struct $name(pub AuthUser);

        impl FromRequestParts<AppState> for $name {
            type Rejection = AppError;

            async fn from_request_parts(
                parts: &mut Parts,
                state: &AppState,
            ) -> Result<Self, Self::Rejection> {
                let user = AuthUser::from_request_parts(parts, state).await?;
                authorize(&user.actor(), $capability)?;
                Ok($name(user))
            }
        }
    };
}

capability_extractor! {
    /// Super admin only: create users, change roles and the active flag.
    RequireManageUsers => Capability::ManageUsers
}

capability_extractor! {
    /// Super admin or admin: look up and search users.
    RequireViewUsers => Capability::ViewUsers
}

capability_extractor! {
    /// Super admin or admin: device and warranty management.
    RequireManageInventory => Capability::ManageInventory
}

capability_extractor! {
    /// Super admin or admin: inspect and delete any device request.
    RequireViewRequests => Capability::ViewRequests
}

capability_extractor! {
    /// Super admin only: approve or reject device requests.
    RequireDecideRequest => Capability::DecideRequest
}

capability_extractor! {
    /// Super admin or admin: statistics and dashboards.
    RequireViewReports => Capability::ViewReports
}
