//! Repository for the `device_requests` table.
//!
//! [`DeviceRequestRepo::transition`] is the only writer of `status`. It
//! locks the request row, re-checks `pending`, performs any assignment on
//! the same transaction and finishes with a write conditional on
//! `status = 'pending'`, so at most one decision ever lands.

use inventory_core::device_request::{Decision, RequestStatus, RequestType};
use inventory_core::search::{clamp_limit, clamp_offset, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use inventory_core::types::DbId;
use sqlx::PgPool;

use crate::models::device_request::{CreateDeviceRequest, DeviceRequest, DeviceRequestFilter};
use crate::repositories::device_repo::{AssignOutcome, DeviceRepo};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, requester_id, processed_by_id, device_id, request_type, status, \
                       priority, quantity, notes, reason_for_rejection, requested_date, \
                       processed_at, created_at, updated_at";

/// Result of a decision attempt. Anything but `Decided` leaves the request
/// untouched.
#[derive(Debug)]
pub enum TransitionOutcome {
    Decided(DeviceRequest),
    NotFound,
    AlreadyProcessed(RequestStatus),
    /// An assignment request whose device has since been deleted.
    DeviceMissing,
    /// The assignment side effect was refused.
    AssignmentFailed(AssignOutcome),
}

/// Provides creation, listing and the status state machine for requests.
pub struct DeviceRequestRepo;

impl DeviceRequestRepo {
    /// Insert a pending request on behalf of `requester_id`.
    ///
    /// For assignment requests the referenced device is share-locked for the
    /// duration of the insert. Returns `None` if that device does not exist.
    pub async fn create(
        pool: &PgPool,
        requester_id: DbId,
        input: &CreateDeviceRequest,
    ) -> Result<Option<DeviceRequest>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if let Some(device_id) = input.device_id {
            let device: Option<(DbId,)> =
                sqlx::query_as("SELECT id FROM devices WHERE id = $1 FOR SHARE")
                    .bind(device_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            if device.is_none() {
                return Ok(None);
            }
        }

        let query = format!(
            "INSERT INTO device_requests
                (requester_id, device_id, request_type, status, priority, quantity, notes,
                 requested_date)
             VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, NOW()))
             RETURNING {COLUMNS}"
        );
        let request = sqlx::query_as::<_, DeviceRequest>(&query)
            .bind(requester_id)
            .bind(input.device_id)
            .bind(input.request_type.as_str())
            .bind(RequestStatus::Pending.as_str())
            .bind(input.priority.as_str())
            .bind(input.quantity)
            .bind(input.notes.as_deref())
            .bind(input.requested_date)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(request))
    }

    /// Find a request by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<DeviceRequest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM device_requests WHERE id = $1");
        sqlx::query_as::<_, DeviceRequest>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List requests matching the filter, newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &DeviceRequestFilter,
    ) -> Result<Vec<DeviceRequest>, sqlx::Error> {
        let limit = clamp_limit(filter.limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT);
        let offset = clamp_offset(filter.offset);

        let mut conditions = Vec::new();
        let mut bind_idx = 1u32;

        if filter.request_type.is_some() {
            conditions.push(format!("request_type = ${bind_idx}"));
            bind_idx += 1;
        }
        if filter.status.is_some() {
            conditions.push(format!("status = ${bind_idx}"));
            bind_idx += 1;
        }
        if filter.priority.is_some() {
            conditions.push(format!("priority = ${bind_idx}"));
            bind_idx += 1;
        }
        if filter.requester_id.is_some() {
            conditions.push(format!("requester_id = ${bind_idx}"));
            bind_idx += 1;
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "SELECT {COLUMNS} FROM device_requests {where_clause} \
             ORDER BY created_at DESC, id DESC \
             LIMIT ${bind_idx} OFFSET ${next_idx}",
            next_idx = bind_idx + 1,
        );

        let mut q = sqlx::query_as::<_, DeviceRequest>(&query);
        if let Some(request_type) = filter.request_type {
            q = q.bind(request_type.as_str());
        }
        if let Some(status) = filter.status {
            q = q.bind(status.as_str());
        }
        if let Some(priority) = filter.priority {
            q = q.bind(priority.as_str());
        }
        if let Some(requester_id) = filter.requester_id {
            q = q.bind(requester_id);
        }
        q.bind(limit).bind(offset).fetch_all(pool).await
    }

    /// Apply a decision to a pending request.
    ///
    /// Approving a `device_assignment` request assigns the device to the
    /// requester on the same transaction; if that fails nothing is written.
    pub async fn transition(
        pool: &PgPool,
        id: DbId,
        processed_by_id: DbId,
        decision: &Decision,
    ) -> Result<TransitionOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!("SELECT {COLUMNS} FROM device_requests WHERE id = $1 FOR UPDATE");
        let request = sqlx::query_as::<_, DeviceRequest>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(request) = request else {
            return Ok(TransitionOutcome::NotFound);
        };
        if request.status.is_terminal() {
            return Ok(TransitionOutcome::AlreadyProcessed(request.status));
        }

        if *decision == Decision::Approve && request.request_type == RequestType::DeviceAssignment
        {
            let Some(device_id) = request.device_id else {
                return Ok(TransitionOutcome::DeviceMissing);
            };
            match DeviceRepo::assign_in_tx(&mut tx, device_id, request.requester_id).await? {
                AssignOutcome::Assigned(_) => {}
                AssignOutcome::DeviceNotFound => return Ok(TransitionOutcome::DeviceMissing),
                other => return Ok(TransitionOutcome::AssignmentFailed(other)),
            }
        }

        let query = format!(
            "UPDATE device_requests SET
                status = $2,
                processed_by_id = $3,
                reason_for_rejection = $4,
                processed_at = NOW()
             WHERE id = $1 AND status = 'pending'
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, DeviceRequest>(&query)
            .bind(id)
            .bind(decision.status().as_str())
            .bind(processed_by_id)
            .bind(decision.reason())
            .fetch_optional(&mut *tx)
            .await?;

        let Some(updated) = updated else {
            return Ok(TransitionOutcome::AlreadyProcessed(request.status));
        };

        tx.commit().await?;
        tracing::info!(
            request_id = id,
            processed_by_id,
            status = %updated.status,
            "Device request decided",
        );
        Ok(TransitionOutcome::Decided(updated))
    }

    /// Delete a request by ID. Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM device_requests WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
