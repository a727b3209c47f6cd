//! Device entity model and DTOs.

use inventory_core::inventory::{DeviceCondition, DeviceLocation, DeviceStatus};
use inventory_core::types::{Date, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `devices` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Device {
    pub id: DbId,
    pub serial_number: String,
    pub manufacturer: String,
    pub model_name: String,
    #[sqlx(try_from = "String")]
    pub status: DeviceStatus,
    #[sqlx(try_from = "String")]
    pub condition: DeviceCondition,
    #[sqlx(try_from = "String")]
    pub location: DeviceLocation,
    pub purchase_date: Date,
    pub assigned_user_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inventory intake. New devices always start `available`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDevice {
    pub serial_number: String,
    pub manufacturer: String,
    pub model_name: String,
    pub condition: DeviceCondition,
    pub location: DeviceLocation,
    pub purchase_date: Date,
}

/// DTO for updating descriptive fields. Status and assignee are not
/// editable here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDevice {
    pub serial_number: Option<String>,
    pub manufacturer: Option<String>,
    pub model_name: Option<String>,
    pub condition: Option<DeviceCondition>,
    pub location: Option<DeviceLocation>,
    pub purchase_date: Option<Date>,
}

/// Filters for [`crate::repositories::DeviceRepo::search`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceSearch {
    /// Case-insensitive serial number substring.
    pub serial_number: Option<String>,
    pub status: Option<DeviceStatus>,
    pub location: Option<DeviceLocation>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
