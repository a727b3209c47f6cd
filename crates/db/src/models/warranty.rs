//! Warranty entity model and DTOs.

use inventory_core::types::{Date, DbId, Timestamp};
use inventory_core::warranty::{warranty_status, WarrantyPeriod, WarrantyStatus, WarrantyType};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `warranties` table. Status is not a column.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Warranty {
    pub id: DbId,
    pub device_id: DbId,
    pub warranty_code: String,
    #[sqlx(try_from = "String")]
    pub warranty_type: WarrantyType,
    pub start_date: Date,
    pub end_date: Date,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl WarrantyPeriod for Warranty {
    fn start_date(&self) -> Date {
        self.start_date
    }

    fn end_date(&self) -> Date {
        self.end_date
    }
}

/// A warranty together with its status as of a given date.
#[derive(Debug, Clone, Serialize)]
pub struct WarrantyWithStatus {
    #[serde(flatten)]
    pub warranty: Warranty,
    pub status: WarrantyStatus,
}

impl WarrantyWithStatus {
    pub fn as_of(warranty: Warranty, today: Date) -> Self {
        let status = warranty_status(warranty.start_date, warranty.end_date, today);
        Self { warranty, status }
    }
}

impl WarrantyPeriod for WarrantyWithStatus {
    fn start_date(&self) -> Date {
        self.warranty.start_date
    }

    fn end_date(&self) -> Date {
        self.warranty.end_date
    }
}

/// DTO for adding a warranty to a device.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateWarranty {
    pub warranty_code: String,
    pub warranty_type: WarrantyType,
    pub start_date: Date,
    pub end_date: Date,
    pub description: Option<String>,
}

/// DTO for updating a warranty. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateWarranty {
    pub warranty_code: Option<String>,
    pub warranty_type: Option<WarrantyType>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub description: Option<String>,
}
