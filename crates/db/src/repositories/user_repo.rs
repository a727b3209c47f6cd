//! Repository for the `users` table.

use inventory_core::lockout::{LockoutPolicy, LoginCounters};
use inventory_core::search::{clamp_limit, clamp_offset, like_pattern, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use inventory_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::user::{CreateUser, UpdateUser, User, UserSearch};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, username, email, password_hash, first_name, last_name, phone_number, \
                       role, department, is_active, failed_login_count, locked_until, \
                       last_login_at, created_at, updated_at";

/// Provides CRUD and login bookkeeping for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    ///
    /// Duplicate usernames or emails surface as a unique violation on
    /// `uq_users_username` / `uq_users_email`.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users
                (username, email, password_hash, first_name, last_name, phone_number, role, department)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.username)
            .bind(&input.email)
            .bind(&input.password_hash)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(input.phone_number.as_deref())
            .bind(input.role.as_str())
            .bind(input.department.as_str())
            .fetch_one(pool)
            .await
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by username (case-sensitive).
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE username = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    pub async fn username_exists(pool: &PgPool, username: &str) -> Result<bool, sqlx::Error> {
        let row: (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(pool)
                .await?;
        Ok(row.0)
    }

    pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    /// Search users with optional filters, ordered by id.
    pub async fn search(pool: &PgPool, params: &UserSearch) -> Result<Vec<User>, sqlx::Error> {
        let limit = clamp_limit(params.limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT);
        let offset = clamp_offset(params.offset);
        let pattern = params.search.as_deref().and_then(like_pattern);

        let mut conditions = Vec::new();
        let mut bind_idx = 1u32;

        if pattern.is_some() {
            conditions.push(format!(
                "(username ILIKE ${bind_idx} OR email ILIKE ${bind_idx} \
                 OR first_name ILIKE ${bind_idx} OR last_name ILIKE ${bind_idx})"
            ));
            bind_idx += 1;
        }
        if params.role.is_some() {
            conditions.push(format!("role = ${bind_idx}"));
            bind_idx += 1;
        }
        if params.department.is_some() {
            conditions.push(format!("department = ${bind_idx}"));
            bind_idx += 1;
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "SELECT {COLUMNS} FROM users {where_clause} \
             ORDER BY id \
             LIMIT ${bind_idx} OFFSET ${next_idx}",
            next_idx = bind_idx + 1,
        );

        let mut q = sqlx::query_as::<_, User>(&query);
        if let Some(ref pattern) = pattern {
            q = q.bind(pattern);
        }
        if let Some(role) = params.role {
            q = q.bind(role.as_str());
        }
        if let Some(department) = params.department {
            q = q.bind(department.as_str());
        }
        q.bind(limit).bind(offset).fetch_all(pool).await
    }

    /// Update a user. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateUser,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET
                email = COALESCE($2, email),
                first_name = COALESCE($3, first_name),
                last_name = COALESCE($4, last_name),
                phone_number = COALESCE($5, phone_number),
                department = COALESCE($6, department),
                role = COALESCE($7, role),
                is_active = COALESCE($8, is_active)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(input.email.as_deref())
            .bind(input.first_name.as_deref())
            .bind(input.last_name.as_deref())
            .bind(input.phone_number.as_deref())
            .bind(input.department.map(|d| d.as_str()))
            .bind(input.role.map(|r| r.as_str()))
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Soft-deactivate a user by setting `is_active = false`.
    ///
    /// Returns `true` if the row was updated.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE users SET is_active = false WHERE id = $1 AND is_active = true")
                .bind(id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Apply one failed attempt under a row lock.
    ///
    /// Concurrent failures serialise on the lock so no increment is lost.
    /// Returns the new counters, or `None` if the user does not exist.
    pub async fn record_failed_login(
        pool: &PgPool,
        id: DbId,
        policy: &LockoutPolicy,
        now: Timestamp,
    ) -> Result<Option<LoginCounters>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let current: Option<(i32, Option<Timestamp>)> = sqlx::query_as(
            "SELECT failed_login_count, locked_until FROM users WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((failed_login_count, locked_until)) = current else {
            return Ok(None);
        };

        let next = policy.register_failure(
            LoginCounters {
                failed_login_count,
                locked_until,
            },
            now,
        );

        sqlx::query("UPDATE users SET failed_login_count = $2, locked_until = $3 WHERE id = $1")
            .bind(id)
            .bind(next.failed_login_count)
            .bind(next.locked_until)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(next))
    }

    /// Record a successful login: reset the failure counter, clear the lock
    /// and stamp `last_login_at`.
    ///
    /// The write only lands if the account is not locked at `now`, so a
    /// lock applied by a concurrent failure wins. Returns `None` when the
    /// write was refused (or the user vanished).
    pub async fn record_successful_login(
        pool: &PgPool,
        id: DbId,
        now: Timestamp,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET
                failed_login_count = 0,
                locked_until = NULL,
                last_login_at = $2
             WHERE id = $1 AND (locked_until IS NULL OR locked_until <= $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(now)
            .fetch_optional(pool)
            .await
    }
}
