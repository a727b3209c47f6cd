//! Handlers for the `/devices` resource and its warranty sub-resource.
//!
//! Status and assignee change only through `assign` and `status`; the plain
//! update touches descriptive fields and may relocate an unassigned device.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use inventory_core::access::can_view_device_warranties;
use inventory_core::error::CoreError;
use inventory_core::inventory::{validate_device_fields, validate_stock_location, DeviceStatus};
use inventory_core::types::DbId;
use inventory_core::warranty::{ensure_belongs_to, validate_warranty};
use inventory_db::models::device::{CreateDevice, Device, DeviceSearch, UpdateDevice};
use inventory_db::models::warranty::{CreateWarranty, UpdateWarranty, Warranty, WarrantyWithStatus};
use inventory_db::repositories::{
    AssignOutcome, DeleteOutcome, DeviceRepo, StatusChangeOutcome, UpdateOutcome, WarrantyRepo,
};
use serde::Deserialize;

use crate::error::{validation, AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireManageInventory;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `PUT /devices/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    pub status: DeviceStatus,
}

// ---------------------------------------------------------------------------
// Devices
// ---------------------------------------------------------------------------

/// GET /api/v1/devices
pub async fn search_devices(
    State(state): State<AppState>,
    RequireManageInventory(_user): RequireManageInventory,
    Query(params): Query<DeviceSearch>,
) -> AppResult<Json<DataResponse<Vec<Device>>>> {
    let devices = DeviceRepo::search(&state.pool, &params).await?;
    Ok(Json(DataResponse { data: devices }))
}

/// POST /api/v1/devices
///
/// Inventory intake. A duplicate serial number is rejected by the
/// `uq_devices_serial_number` constraint with 409.
pub async fn create_device(
    State(state): State<AppState>,
    RequireManageInventory(user): RequireManageInventory,
    Json(input): Json<CreateDevice>,
) -> AppResult<(StatusCode, Json<DataResponse<Device>>)> {
    validation(validate_device_fields(
        &input.serial_number,
        &input.manufacturer,
        &input.model_name,
    ))?;
    validation(validate_stock_location(input.location))?;

    let device = DeviceRepo::create(&state.pool, &input).await?;
    tracing::info!(device_id = device.id, created_by = user.user_id, "Device created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: device })))
}

/// GET /api/v1/devices/{id}
pub async fn get_device(
    State(state): State<AppState>,
    RequireManageInventory(_user): RequireManageInventory,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Device>>> {
    let device = find_device(&state, id).await?;
    Ok(Json(DataResponse { data: device }))
}

/// PUT /api/v1/devices/{id}
pub async fn update_device(
    State(state): State<AppState>,
    RequireManageInventory(user): RequireManageInventory,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateDevice>,
) -> AppResult<Json<DataResponse<Device>>> {
    let existing = find_device(&state, id).await?;
    validation(validate_device_fields(
        input.serial_number.as_deref().unwrap_or(&existing.serial_number),
        input.manufacturer.as_deref().unwrap_or(&existing.manufacturer),
        input.model_name.as_deref().unwrap_or(&existing.model_name),
    ))?;

    let device = match DeviceRepo::update(&state.pool, id, &input).await? {
        UpdateOutcome::Updated(device) => device,
        UpdateOutcome::NotFound => {
            return Err(AppError::Core(CoreError::NotFound { entity: "Device", id }))
        }
        UpdateOutcome::Refused(err) => return Err(AppError::Core(err)),
    };

    tracing::info!(device_id = id, updated_by = user.user_id, "Device updated");
    Ok(Json(DataResponse { data: device }))
}

/// DELETE /api/v1/devices/{id}
///
/// Refused while a pending request references the device.
pub async fn delete_device(
    State(state): State<AppState>,
    RequireManageInventory(user): RequireManageInventory,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    match DeviceRepo::delete(&state.pool, id).await? {
        DeleteOutcome::Deleted => {
            tracing::info!(device_id = id, deleted_by = user.user_id, "Device deleted");
            Ok(StatusCode::NO_CONTENT)
        }
        DeleteOutcome::NotFound => Err(AppError::Core(CoreError::NotFound {
            entity: "Device",
            id,
        })),
        DeleteOutcome::PendingRequests(count) => Err(AppError::Core(CoreError::Conflict(
            format!("Device {id} is referenced by {count} pending request(s)"),
        ))),
    }
}

/// POST /api/v1/devices/{id}/assign/{user_id}
pub async fn assign_device(
    State(state): State<AppState>,
    RequireManageInventory(_user): RequireManageInventory,
    Path((id, user_id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<Device>>> {
    let outcome = DeviceRepo::assign(&state.pool, id, user_id).await?;
    let device = assign_outcome_to_result(id, user_id, outcome)?;
    Ok(Json(DataResponse { data: device }))
}

/// PUT /api/v1/devices/{id}/status
pub async fn change_status(
    State(state): State<AppState>,
    RequireManageInventory(_user): RequireManageInventory,
    Path(id): Path<DbId>,
    Json(input): Json<StatusChangeRequest>,
) -> AppResult<Json<DataResponse<Device>>> {
    match DeviceRepo::change_status(&state.pool, id, input.status).await? {
        StatusChangeOutcome::Changed(device) => Ok(Json(DataResponse { data: device })),
        StatusChangeOutcome::NotFound => Err(AppError::Core(CoreError::NotFound {
            entity: "Device",
            id,
        })),
        StatusChangeOutcome::Refused(err) => Err(AppError::Core(err)),
    }
}

// ---------------------------------------------------------------------------
// Warranties
// ---------------------------------------------------------------------------

/// GET /api/v1/devices/{id}/warranties
///
/// Each warranty carries its status as of today. Employees may list only
/// the warranties of a device assigned to them.
pub async fn list_warranties(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<WarrantyWithStatus>>>> {
    let device = find_device(&state, id).await?;
    can_view_device_warranties(&auth.actor(), device.assigned_user_id)?;

    let today = Utc::now().date_naive();
    let warranties = WarrantyRepo::list_for_device(&state.pool, id)
        .await?
        .into_iter()
        .map(|w| WarrantyWithStatus::as_of(w, today))
        .collect();
    Ok(Json(DataResponse { data: warranties }))
}

/// POST /api/v1/devices/{id}/warranties
pub async fn add_warranty(
    State(state): State<AppState>,
    RequireManageInventory(user): RequireManageInventory,
    Path(id): Path<DbId>,
    Json(input): Json<CreateWarranty>,
) -> AppResult<(StatusCode, Json<DataResponse<WarrantyWithStatus>>)> {
    validation(validate_warranty(
        &input.warranty_code,
        input.start_date,
        input.end_date,
    ))?;

    let warranty = WarrantyRepo::create(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Device", id }))?;

    tracing::info!(
        device_id = id,
        warranty_id = warranty.id,
        created_by = user.user_id,
        "Warranty added",
    );
    let today = Utc::now().date_naive();
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: WarrantyWithStatus::as_of(warranty, today),
        }),
    ))
}

/// PUT /api/v1/devices/{id}/warranties/{warranty_id}
///
/// A warranty owned by another device is reported as not belonging to this
/// one, distinct from a warranty that does not exist at all.
pub async fn update_warranty(
    State(state): State<AppState>,
    RequireManageInventory(user): RequireManageInventory,
    Path((id, warranty_id)): Path<(DbId, DbId)>,
    Json(input): Json<UpdateWarranty>,
) -> AppResult<Json<DataResponse<WarrantyWithStatus>>> {
    let existing = find_owned_warranty(&state, id, warranty_id).await?;

    validation(validate_warranty(
        input.warranty_code.as_deref().unwrap_or(&existing.warranty_code),
        input.start_date.unwrap_or(existing.start_date),
        input.end_date.unwrap_or(existing.end_date),
    ))?;

    let warranty = WarrantyRepo::update(&state.pool, id, warranty_id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Warranty",
            id: warranty_id,
        }))?;

    tracing::info!(device_id = id, warranty_id, updated_by = user.user_id, "Warranty updated");
    let today = Utc::now().date_naive();
    Ok(Json(DataResponse {
        data: WarrantyWithStatus::as_of(warranty, today),
    }))
}

/// DELETE /api/v1/devices/{id}/warranties/{warranty_id}
pub async fn delete_warranty(
    State(state): State<AppState>,
    RequireManageInventory(user): RequireManageInventory,
    Path((id, warranty_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    find_owned_warranty(&state, id, warranty_id).await?;

    if !WarrantyRepo::delete(&state.pool, id, warranty_id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Warranty",
            id: warranty_id,
        }));
    }
    tracing::info!(device_id = id, warranty_id, deleted_by = user.user_id, "Warranty deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_device(state: &AppState, id: DbId) -> AppResult<Device> {
    DeviceRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Device", id }))
}

/// Resolve the device, then the warranty, then check ownership.
async fn find_owned_warranty(
    state: &AppState,
    device_id: DbId,
    warranty_id: DbId,
) -> AppResult<Warranty> {
    find_device(state, device_id).await?;
    let warranty = WarrantyRepo::find_by_id(&state.pool, warranty_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Warranty",
            id: warranty_id,
        }))?;
    ensure_belongs_to(warranty.id, warranty.device_id, device_id)?;
    Ok(warranty)
}

/// Map an [`AssignOutcome`] to the assigned device or a typed error.
pub(crate) fn assign_outcome_to_result(
    device_id: DbId,
    user_id: DbId,
    outcome: AssignOutcome,
) -> AppResult<Device> {
    match outcome {
        AssignOutcome::Assigned(device) => Ok(device),
        AssignOutcome::DeviceNotFound => Err(AppError::Core(CoreError::NotFound {
            entity: "Device",
            id: device_id,
        })),
        AssignOutcome::UserNotFound => Err(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user_id,
        })),
        AssignOutcome::UserInactive => Err(AppError::Core(CoreError::Validation(format!(
            "User {user_id} is deactivated and cannot receive devices"
        )))),
        AssignOutcome::Refused(err) => Err(AppError::Core(err)),
    }
}
