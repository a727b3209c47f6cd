//! User entity model and DTOs.

use inventory_core::lockout::LoginCounters;
use inventory_core::roles::{Department, Role};
use inventory_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Full user row from the `users` table.
///
/// Contains the password hash -- NEVER serialize this to API responses directly.
/// Use [`UserResponse`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    #[sqlx(try_from = "String")]
    pub role: Role,
    #[sqlx(try_from = "String")]
    pub department: Department,
    pub is_active: bool,
    pub failed_login_count: i32,
    pub locked_until: Option<Timestamp>,
    pub last_login_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    pub fn login_counters(&self) -> LoginCounters {
        LoginCounters {
            failed_login_count: self.failed_login_count,
            locked_until: self.locked_until,
        }
    }
}

/// Safe user representation for API responses (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub role: Role,
    pub department: Department,
    pub is_active: bool,
    pub last_login_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            phone_number: user.phone_number,
            role: user.role,
            department: user.department,
            is_active: user.is_active,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// DTO for creating a new user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub role: Role,
    pub department: Department,
}

/// DTO for updating an existing user. All fields are optional.
///
/// `role` and `is_active` are privileged; callers check
/// [`UpdateUser::changes_privileges`] against the authorization policy.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub department: Option<Department>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

impl UpdateUser {
    pub fn changes_privileges(&self) -> bool {
        self.role.is_some() || self.is_active.is_some()
    }
}

/// Filters for [`crate::repositories::UserRepo::search`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserSearch {
    /// Substring matched against username, email, first and last name.
    pub search: Option<String>,
    pub role: Option<Role>,
    pub department: Option<Department>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
