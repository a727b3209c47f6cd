//! Shared response envelope types for API handlers.
//!
//! Resource endpoints respond with a `{ "data": ... }` envelope. Login and
//! registration return the session object unwrapped.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
///
/// ```ignore
/// Ok(Json(DataResponse { data: devices }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
