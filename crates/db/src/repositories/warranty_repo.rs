//! Repository for the `warranties` table.
//!
//! Mutations are scoped by both warranty id and device id so a warranty
//! can only be changed through the device that owns it.

use inventory_core::types::DbId;
use sqlx::PgPool;

use crate::models::warranty::{CreateWarranty, UpdateWarranty, Warranty};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, device_id, warranty_code, warranty_type, start_date, end_date, \
                       description, created_at, updated_at";

/// Provides device-scoped CRUD for warranties.
pub struct WarrantyRepo;

impl WarrantyRepo {
    /// Add a warranty to a device.
    ///
    /// Holds a share lock on the device row so it cannot be deleted between
    /// the existence check and the insert. Returns `None` if the device does
    /// not exist.
    pub async fn create(
        pool: &PgPool,
        device_id: DbId,
        input: &CreateWarranty,
    ) -> Result<Option<Warranty>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let device: Option<(DbId,)> =
            sqlx::query_as("SELECT id FROM devices WHERE id = $1 FOR SHARE")
                .bind(device_id)
                .fetch_optional(&mut *tx)
                .await?;
        if device.is_none() {
            return Ok(None);
        }

        let query = format!(
            "INSERT INTO warranties
                (device_id, warranty_code, warranty_type, start_date, end_date, description)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        let warranty = sqlx::query_as::<_, Warranty>(&query)
            .bind(device_id)
            .bind(&input.warranty_code)
            .bind(input.warranty_type.as_str())
            .bind(input.start_date)
            .bind(input.end_date)
            .bind(input.description.as_deref())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(warranty))
    }

    /// Find a warranty by ID regardless of device.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Warranty>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM warranties WHERE id = $1");
        sqlx::query_as::<_, Warranty>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a device's warranties, soonest-ending first.
    pub async fn list_for_device(
        pool: &PgPool,
        device_id: DbId,
    ) -> Result<Vec<Warranty>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM warranties WHERE device_id = $1 ORDER BY end_date, id"
        );
        sqlx::query_as::<_, Warranty>(&query)
            .bind(device_id)
            .fetch_all(pool)
            .await
    }

    /// Every warranty, in insertion order.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Warranty>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM warranties ORDER BY id");
        sqlx::query_as::<_, Warranty>(&query).fetch_all(pool).await
    }

    /// Update a warranty owned by `device_id`. Only non-`None` fields are applied.
    ///
    /// Returns `None` if no such warranty exists on that device.
    pub async fn update(
        pool: &PgPool,
        device_id: DbId,
        id: DbId,
        input: &UpdateWarranty,
    ) -> Result<Option<Warranty>, sqlx::Error> {
        let query = format!(
            "UPDATE warranties SET
                warranty_code = COALESCE($3, warranty_code),
                warranty_type = COALESCE($4, warranty_type),
                start_date = COALESCE($5, start_date),
                end_date = COALESCE($6, end_date),
                description = COALESCE($7, description)
             WHERE id = $1 AND device_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Warranty>(&query)
            .bind(id)
            .bind(device_id)
            .bind(input.warranty_code.as_deref())
            .bind(input.warranty_type.map(|t| t.as_str()))
            .bind(input.start_date)
            .bind(input.end_date)
            .bind(input.description.as_deref())
            .fetch_optional(pool)
            .await
    }

    /// Delete a warranty owned by `device_id`. Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, device_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM warranties WHERE id = $1 AND device_id = $2")
            .bind(id)
            .bind(device_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
