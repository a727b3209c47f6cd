//! Handlers for the `/device-requests` resource.
//!
//! Every role may submit; employees see only their own requests; only super
//! admins decide. A decision is final.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use inventory_core::access::{authorize, can_view_request, request_scope, Capability};
use inventory_core::device_request::{
    already_processed, plan_decision, validate_notes, validate_request_payload, RequestStatus,
};
use inventory_core::error::CoreError;
use inventory_core::types::DbId;
use inventory_db::models::device_request::{
    CreateDeviceRequest, DeviceRequest, DeviceRequestFilter,
};
use inventory_db::repositories::{AssignOutcome, DeviceRequestRepo, TransitionOutcome};
use serde::Deserialize;

use crate::error::{validation, AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireDecideRequest, RequireViewRequests};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `PUT /device-requests/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: RequestStatus,
    /// Required when rejecting, ignored when approving.
    pub reason_for_rejection: Option<String>,
}

/// GET /api/v1/device-requests
///
/// Staff see every request; employees only their own.
pub async fn list_requests(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(mut filter): Query<DeviceRequestFilter>,
) -> AppResult<Json<DataResponse<Vec<DeviceRequest>>>> {
    filter.requester_id = request_scope(&auth.actor());
    let requests = DeviceRequestRepo::list(&state.pool, &filter).await?;
    Ok(Json(DataResponse { data: requests }))
}

/// POST /api/v1/device-requests
///
/// Submit a pending request on behalf of the caller.
pub async fn create_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateDeviceRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<DeviceRequest>>)> {
    authorize(&auth.actor(), Capability::SubmitRequest)?;
    validation(validate_request_payload(
        input.request_type,
        input.device_id,
        input.quantity,
    ))?;
    validation(validate_notes(input.notes.as_deref()))?;

    let request = DeviceRequestRepo::create(&state.pool, auth.user_id, &input)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "Device",
                id: input.device_id.unwrap_or_default(),
            })
        })?;

    tracing::info!(
        request_id = request.id,
        requester_id = auth.user_id,
        request_type = %request.request_type,
        "Device request submitted",
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: request })))
}

/// GET /api/v1/device-requests/{id}
pub async fn get_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<DeviceRequest>>> {
    let request = find_request(&state, id).await?;
    can_view_request(&auth.actor(), request.requester_id)?;
    Ok(Json(DataResponse { data: request }))
}

/// PUT /api/v1/device-requests/{id}/status
///
/// Approve or reject a pending request. Approving an assignment request
/// assigns the device to the requester in the same transaction; if that
/// fails the request stays pending.
pub async fn update_status(
    State(state): State<AppState>,
    RequireDecideRequest(user): RequireDecideRequest,
    Path(id): Path<DbId>,
    Json(input): Json<StatusUpdateRequest>,
) -> AppResult<Json<DataResponse<DeviceRequest>>> {
    let decision = plan_decision(input.status, input.reason_for_rejection.as_deref())?;
    validation(validate_notes(decision.reason()))?;

    match DeviceRequestRepo::transition(&state.pool, id, user.user_id, &decision).await? {
        TransitionOutcome::Decided(request) => Ok(Json(DataResponse { data: request })),
        TransitionOutcome::NotFound => Err(AppError::Core(CoreError::NotFound {
            entity: "DeviceRequest",
            id,
        })),
        TransitionOutcome::AlreadyProcessed(status) => {
            Err(AppError::Core(already_processed(id, status)))
        }
        TransitionOutcome::DeviceMissing => Err(AppError::Core(CoreError::Conflict(format!(
            "The device referenced by request {id} no longer exists"
        )))),
        TransitionOutcome::AssignmentFailed(outcome) => {
            Err(AppError::Core(assignment_failure(id, outcome)))
        }
    }
}

/// DELETE /api/v1/device-requests/{id}
pub async fn delete_request(
    State(state): State<AppState>,
    RequireViewRequests(user): RequireViewRequests,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !DeviceRequestRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "DeviceRequest",
            id,
        }));
    }
    tracing::info!(request_id = id, deleted_by = user.user_id, "Device request deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_request(state: &AppState, id: DbId) -> AppResult<DeviceRequest> {
    DeviceRequestRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "DeviceRequest",
            id,
        }))
}

fn assignment_failure(request_id: DbId, outcome: AssignOutcome) -> CoreError {
    match outcome {
        AssignOutcome::Refused(err) => err,
        AssignOutcome::UserNotFound | AssignOutcome::UserInactive => CoreError::Conflict(format!(
            "The requester of request {request_id} can no longer receive devices"
        )),
        AssignOutcome::DeviceNotFound | AssignOutcome::Assigned(_) => CoreError::Conflict(
            format!("The device referenced by request {request_id} could not be assigned"),
        ),
    }
}
