//! Repository for the `devices` table.
//!
//! Status, location and assignee are written only by [`DeviceRepo::assign`],
//! [`DeviceRepo::change_status`], [`DeviceRepo::update`] (location only) and
//! request approval, each of which locks the device row before deciding.

use inventory_core::error::CoreError;
use inventory_core::inventory::{
    plan_assignment, plan_relocation, plan_status_change, DeviceStatus, Placement,
};
use inventory_core::search::{clamp_limit, clamp_offset, like_pattern, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use inventory_core::types::DbId;
use sqlx::PgPool;

use crate::models::device::{CreateDevice, Device, DeviceSearch, UpdateDevice};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, serial_number, manufacturer, model_name, status, condition, location, \
                       purchase_date, assigned_user_id, created_at, updated_at";

/// Result of an assignment attempt.
#[derive(Debug)]
pub enum AssignOutcome {
    Assigned(Device),
    DeviceNotFound,
    UserNotFound,
    UserInactive,
    /// The device's current status does not allow assignment.
    Refused(CoreError),
}

/// Result of a status change attempt.
#[derive(Debug)]
pub enum StatusChangeOutcome {
    Changed(Device),
    NotFound,
    Refused(CoreError),
}

/// Result of an update attempt.
#[derive(Debug)]
pub enum UpdateOutcome {
    Updated(Device),
    NotFound,
    /// The requested location is not allowed for the device's status.
    Refused(CoreError),
}

/// Result of a delete attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    /// Pending requests still reference the device.
    PendingRequests(i64),
}

/// Provides CRUD and state transitions for devices.
pub struct DeviceRepo;

impl DeviceRepo {
    /// Insert a new device in the `available` state.
    ///
    /// A duplicate serial number fails atomically on
    /// `uq_devices_serial_number` and inserts nothing.
    pub async fn create(pool: &PgPool, input: &CreateDevice) -> Result<Device, sqlx::Error> {
        let query = format!(
            "INSERT INTO devices
                (serial_number, manufacturer, model_name, status, condition, location, purchase_date)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Device>(&query)
            .bind(&input.serial_number)
            .bind(&input.manufacturer)
            .bind(&input.model_name)
            .bind(DeviceStatus::Available.as_str())
            .bind(input.condition.as_str())
            .bind(input.location.as_str())
            .bind(input.purchase_date)
            .fetch_one(pool)
            .await
    }

    /// Find a device by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Device>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM devices WHERE id = $1");
        sqlx::query_as::<_, Device>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Search devices with optional filters, ordered by id.
    pub async fn search(pool: &PgPool, params: &DeviceSearch) -> Result<Vec<Device>, sqlx::Error> {
        let limit = clamp_limit(params.limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT);
        let offset = clamp_offset(params.offset);
        let pattern = params.serial_number.as_deref().and_then(like_pattern);

        let mut conditions = Vec::new();
        let mut bind_idx = 1u32;

        if pattern.is_some() {
            conditions.push(format!("serial_number ILIKE ${bind_idx}"));
            bind_idx += 1;
        }
        if params.status.is_some() {
            conditions.push(format!("status = ${bind_idx}"));
            bind_idx += 1;
        }
        if params.location.is_some() {
            conditions.push(format!("location = ${bind_idx}"));
            bind_idx += 1;
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "SELECT {COLUMNS} FROM devices {where_clause} \
             ORDER BY id \
             LIMIT ${bind_idx} OFFSET ${next_idx}",
            next_idx = bind_idx + 1,
        );

        let mut q = sqlx::query_as::<_, Device>(&query);
        if let Some(ref pattern) = pattern {
            q = q.bind(pattern);
        }
        if let Some(status) = params.status {
            q = q.bind(status.as_str());
        }
        if let Some(location) = params.location {
            q = q.bind(location.as_str());
        }
        q.bind(limit).bind(offset).fetch_all(pool).await
    }

    /// Update descriptive fields. Only non-`None` fields in `input` are applied.
    ///
    /// A location change is checked against the locked row's status, so it
    /// cannot race an assignment or approval.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateDevice,
    ) -> Result<UpdateOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let Some(current) = Self::lock(&mut tx, id).await? else {
            return Ok(UpdateOutcome::NotFound);
        };

        let location = match input.location {
            Some(to) => match plan_relocation(id, current.status, current.location, to) {
                Ok(location) => location,
                Err(err) => return Ok(UpdateOutcome::Refused(err)),
            },
            None => current.location,
        };

        let query = format!(
            "UPDATE devices SET
                serial_number = COALESCE($2, serial_number),
                manufacturer = COALESCE($3, manufacturer),
                model_name = COALESCE($4, model_name),
                condition = COALESCE($5, condition),
                location = $6,
                purchase_date = COALESCE($7, purchase_date)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let device = sqlx::query_as::<_, Device>(&query)
            .bind(id)
            .bind(input.serial_number.as_deref())
            .bind(input.manufacturer.as_deref())
            .bind(input.model_name.as_deref())
            .bind(input.condition.map(|c| c.as_str()))
            .bind(location.as_str())
            .bind(input.purchase_date)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(UpdateOutcome::Updated(device))
    }

    /// Assign a device to an active user in one transaction.
    pub async fn assign(
        pool: &PgPool,
        device_id: DbId,
        user_id: DbId,
    ) -> Result<AssignOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let outcome = Self::assign_in_tx(&mut tx, device_id, user_id).await?;
        if matches!(outcome, AssignOutcome::Assigned(_)) {
            tx.commit().await?;
        }
        Ok(outcome)
    }

    /// Assignment steps on an open transaction.
    ///
    /// Locks the device row, then the user row, and writes the new
    /// placement only when both checks pass. The caller commits.
    pub async fn assign_in_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        device_id: DbId,
        user_id: DbId,
    ) -> Result<AssignOutcome, sqlx::Error> {
        let Some(device) = Self::lock(tx, device_id).await? else {
            return Ok(AssignOutcome::DeviceNotFound);
        };

        let user: Option<(bool,)> =
            sqlx::query_as("SELECT is_active FROM users WHERE id = $1 FOR SHARE")
                .bind(user_id)
                .fetch_optional(&mut **tx)
                .await?;
        match user {
            None => return Ok(AssignOutcome::UserNotFound),
            Some((false,)) => return Ok(AssignOutcome::UserInactive),
            Some((true,)) => {}
        }

        let placement = match plan_assignment(device_id, device.status, user_id) {
            Ok(p) => p,
            Err(err) => return Ok(AssignOutcome::Refused(err)),
        };

        let device = Self::write_placement(tx, device_id, placement).await?;
        tracing::info!(device_id, user_id, "Device assigned");
        Ok(AssignOutcome::Assigned(device))
    }

    /// Move a device to `target` under a row lock.
    pub async fn change_status(
        pool: &PgPool,
        id: DbId,
        target: DeviceStatus,
    ) -> Result<StatusChangeOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let Some(device) = Self::lock(&mut tx, id).await? else {
            return Ok(StatusChangeOutcome::NotFound);
        };

        let placement = match plan_status_change(id, device.status, device.location, target) {
            Ok(p) => p,
            Err(err) => return Ok(StatusChangeOutcome::Refused(err)),
        };

        let updated = Self::write_placement(&mut tx, id, placement).await?;
        tx.commit().await?;

        tracing::info!(
            device_id = id,
            from = %device.status,
            to = %updated.status,
            "Device status changed",
        );
        Ok(StatusChangeOutcome::Changed(updated))
    }

    /// Delete a device unless a pending request still references it.
    ///
    /// Warranties cascade; processed requests keep their history with
    /// `device_id` cleared.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<DeleteOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if Self::lock(&mut tx, id).await?.is_none() {
            return Ok(DeleteOutcome::NotFound);
        }

        let (pending,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM device_requests WHERE device_id = $1 AND status = 'pending'",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if pending > 0 {
            return Ok(DeleteOutcome::PendingRequests(pending));
        }

        sqlx::query("DELETE FROM devices WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(DeleteOutcome::Deleted)
    }

    /// Load a device and hold its row lock until the transaction ends.
    pub(crate) async fn lock(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
    ) -> Result<Option<Device>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM devices WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Device>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
    }

    async fn write_placement(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
        placement: Placement,
    ) -> Result<Device, sqlx::Error> {
        let query = format!(
            "UPDATE devices SET status = $2, location = $3, assigned_user_id = $4
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Device>(&query)
            .bind(id)
            .bind(placement.status.as_str())
            .bind(placement.location.as_str())
            .bind(placement.assigned_user_id)
            .fetch_one(&mut **tx)
            .await
    }
}
