//! Grouped count rows feeding the statistics builders in
//! `inventory_core::statistics`.

use inventory_core::device_request::{RequestStatus, RequestType};
use inventory_core::inventory::{DeviceCondition, DeviceLocation, DeviceStatus};
use inventory_core::statistics::{DeviceFacetCount, RequestFacetCount};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct DeviceFacetRow {
    #[sqlx(try_from = "String")]
    pub status: DeviceStatus,
    #[sqlx(try_from = "String")]
    pub condition: DeviceCondition,
    #[sqlx(try_from = "String")]
    pub location: DeviceLocation,
    pub count: i64,
}

impl From<DeviceFacetRow> for DeviceFacetCount {
    fn from(row: DeviceFacetRow) -> Self {
        Self {
            status: row.status,
            condition: row.condition,
            location: row.location,
            count: row.count,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct RequestFacetRow {
    #[sqlx(try_from = "String")]
    pub request_type: RequestType,
    #[sqlx(try_from = "String")]
    pub status: RequestStatus,
    pub count: i64,
}

impl From<RequestFacetRow> for RequestFacetCount {
    fn from(row: RequestFacetRow) -> Self {
        Self {
            request_type: row.request_type,
            status: row.status,
            count: row.count,
        }
    }
}
