//! Device request entity model and DTOs.

use inventory_core::device_request::{RequestPriority, RequestStatus, RequestType};
use inventory_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `device_requests` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DeviceRequest {
    pub id: DbId,
    pub requester_id: DbId,
    pub processed_by_id: Option<DbId>,
    pub device_id: Option<DbId>,
    #[sqlx(try_from = "String")]
    pub request_type: RequestType,
    #[sqlx(try_from = "String")]
    pub status: RequestStatus,
    #[sqlx(try_from = "String")]
    pub priority: RequestPriority,
    pub quantity: Option<i32>,
    pub notes: Option<String>,
    pub reason_for_rejection: Option<String>,
    pub requested_date: Timestamp,
    pub processed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for submitting a request. The requester is the acting user.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDeviceRequest {
    pub request_type: RequestType,
    pub device_id: Option<DbId>,
    pub quantity: Option<i32>,
    #[serde(default)]
    pub priority: RequestPriority,
    pub notes: Option<String>,
    /// When the device is needed. Defaults to the submission time.
    pub requested_date: Option<Timestamp>,
}

/// Filters for [`crate::repositories::DeviceRequestRepo::list`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceRequestFilter {
    pub request_type: Option<RequestType>,
    pub status: Option<RequestStatus>,
    pub priority: Option<RequestPriority>,
    /// Restrict to one requester. Set from the actor, never from the query.
    #[serde(skip)]
    pub requester_id: Option<DbId>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Compact row for the request dashboard.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RecentRequest {
    pub id: DbId,
    #[sqlx(try_from = "String")]
    pub request_type: RequestType,
    #[sqlx(try_from = "String")]
    pub status: RequestStatus,
    pub requester_email: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
