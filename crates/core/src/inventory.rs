//! Device enumerations, field validation and status transition rules.
//!
//! `Assigned` is only reachable through [`plan_assignment`]; every other
//! status change goes through [`plan_status_change`]. Both return the full
//! target placement so the repository can write it in one statement.
//! Plain location edits go through [`plan_relocation`].

use crate::error::CoreError;
use crate::types::{define_str_enum, DbId};

pub const MAX_SERIAL_NUMBER_LENGTH: usize = 50;
pub const MAX_MANUFACTURER_LENGTH: usize = 100;
pub const MAX_MODEL_NAME_LENGTH: usize = 100;

define_str_enum! {
    /// Lifecycle status of a device.
    DeviceStatus {
        Available => "available",
        Assigned => "assigned",
        Maintenance => "maintenance",
    }
}

define_str_enum! {
    /// Physical condition of a device.
    DeviceCondition {
        New => "new",
        Used => "used",
        Refurbished => "refurbished",
        Damaged => "damaged",
    }
}

define_str_enum! {
    /// Where a device currently is.
    DeviceLocation {
        OfficeHq => "office_hq",
        OfficeBranch => "office_branch",
        Warehouse => "warehouse",
        WithEmployee => "with_employee",
        InTransit => "in_transit",
    }
}

/// Status, location and assignee a device moves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub status: DeviceStatus,
    pub location: DeviceLocation,
    pub assigned_user_id: Option<DbId>,
}

/// Validate the identifying fields shared by create and update.
pub fn validate_device_fields(
    serial_number: &str,
    manufacturer: &str,
    model_name: &str,
) -> Result<(), String> {
    check_required("Serial number", serial_number, MAX_SERIAL_NUMBER_LENGTH)?;
    check_required("Manufacturer", manufacturer, MAX_MANUFACTURER_LENGTH)?;
    check_required("Model name", model_name, MAX_MODEL_NAME_LENGTH)?;
    Ok(())
}

fn check_required(field: &str, value: &str, max: usize) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} is required"));
    }
    if value.chars().count() > max {
        return Err(format!("{field} cannot exceed {max} characters"));
    }
    Ok(())
}

/// Assign an available device to `user_id`.
///
/// The device ends up `Assigned`, `WithEmployee`, owned by `user_id`.
pub fn plan_assignment(
    device_id: DbId,
    current: DeviceStatus,
    user_id: DbId,
) -> Result<Placement, CoreError> {
    match current {
        DeviceStatus::Available => Ok(Placement {
            status: DeviceStatus::Assigned,
            location: DeviceLocation::WithEmployee,
            assigned_user_id: Some(user_id),
        }),
        DeviceStatus::Assigned => Err(CoreError::Conflict(format!(
            "Device {device_id} is already assigned"
        ))),
        DeviceStatus::Maintenance => Err(CoreError::Conflict(format!(
            "Device {device_id} is under maintenance"
        ))),
    }
}

/// Move a device between statuses other than `Assigned`.
///
/// - `Assigned -> Available` returns the device to the warehouse.
/// - `Available | Assigned -> Maintenance` clears the assignee.
/// - `Maintenance -> Available` returns the device to the warehouse.
pub fn plan_status_change(
    device_id: DbId,
    current: DeviceStatus,
    current_location: DeviceLocation,
    target: DeviceStatus,
) -> Result<Placement, CoreError> {
    use DeviceStatus::*;

    match (current, target) {
        (from, to) if from == to => Err(CoreError::Conflict(format!(
            "Device {device_id} is already {to}"
        ))),
        (_, Assigned) => Err(CoreError::Validation(
            "Use the assign operation to assign a device".into(),
        )),
        (Assigned | Maintenance, Available) => Ok(Placement {
            status: Available,
            location: DeviceLocation::Warehouse,
            assigned_user_id: None,
        }),
        (Available, Maintenance) => Ok(Placement {
            status: Maintenance,
            location: current_location,
            assigned_user_id: None,
        }),
        (Assigned, Maintenance) => Ok(Placement {
            status: Maintenance,
            location: DeviceLocation::Warehouse,
            assigned_user_id: None,
        }),
        (from, to) => Err(CoreError::Conflict(format!(
            "Device {device_id} cannot move from {from} to {to}"
        ))),
    }
}

/// Locations a device may be given outside an assignment.
pub fn validate_stock_location(location: DeviceLocation) -> Result<(), String> {
    if location == DeviceLocation::WithEmployee {
        return Err("A device is placed with an employee only by assigning it".into());
    }
    Ok(())
}

/// Move a device to another location without changing its status.
///
/// An assigned device stays `WithEmployee` until it is returned to stock.
pub fn plan_relocation(
    device_id: DbId,
    status: DeviceStatus,
    from: DeviceLocation,
    to: DeviceLocation,
) -> Result<DeviceLocation, CoreError> {
    if from == to {
        return Ok(to);
    }
    if status == DeviceStatus::Assigned {
        return Err(CoreError::Conflict(format!(
            "Device {device_id} is assigned and cannot be relocated"
        )));
    }
    validate_stock_location(to).map_err(CoreError::Validation)?;
    Ok(to)
}
