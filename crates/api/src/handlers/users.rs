//! Handlers for the `/users` resource.
//!
//! Visibility and edit rules come from `inventory_core::access`; the
//! extractors only gate whole capabilities.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use inventory_core::access::{can_update_user, can_view_user, effective_search_role};
use inventory_core::credentials::{
    validate_password_complexity, validate_person_name, validate_phone_number, validate_username,
};
use inventory_core::error::CoreError;
use inventory_core::roles::{Department, Role};
use inventory_core::types::DbId;
use inventory_db::models::user::{CreateUser, UpdateUser, UserResponse, UserSearch};
use inventory_db::repositories::UserRepo;
use serde::Deserialize;
use validator::Validate;

use crate::auth::password::hash_password;
use crate::error::{validation, AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireManageUsers, RequireViewUsers};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /users`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    pub username: String,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub role: Role,
    pub department: Department,
}

/// Request body for `PUT /users/{id}`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(email(message = "Email must be a valid address"))]
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub department: Option<Department>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/users
///
/// Search users. Admins only ever see employees, whatever role they ask for.
pub async fn search_users(
    State(state): State<AppState>,
    RequireViewUsers(user): RequireViewUsers,
    Query(mut params): Query<UserSearch>,
) -> AppResult<Json<DataResponse<Vec<UserResponse>>>> {
    params.role = effective_search_role(&user.actor(), params.role);
    let users = UserRepo::search(&state.pool, &params).await?;
    Ok(Json(DataResponse {
        data: users.into_iter().map(UserResponse::from).collect(),
    }))
}

/// POST /api/v1/users
///
/// Create a user with any role.
pub async fn create_user(
    State(state): State<AppState>,
    RequireManageUsers(admin): RequireManageUsers,
    Json(input): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<UserResponse>>)> {
    input.validate()?;
    validation(validate_username(&input.username))?;
    validation(validate_person_name("First name", &input.first_name))?;
    validation(validate_person_name("Last name", &input.last_name))?;
    if let Some(phone) = &input.phone_number {
        validation(validate_phone_number(phone))?;
    }
    validation(validate_password_complexity(&input.password))?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            username: input.username,
            email: input.email,
            password_hash,
            first_name: input.first_name,
            last_name: input.last_name,
            phone_number: input.phone_number,
            role: input.role,
            department: input.department,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, created_by = admin.user_id, role = %user.role, "User created");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse { data: user.into() }),
    ))
}

/// GET /api/v1/users/me
///
/// Any authenticated user may read their own profile.
pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        }))?;
    Ok(Json(DataResponse { data: user.into() }))
}

/// GET /api/v1/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;

    can_view_user(&auth.actor(), user.id, user.role)?;
    Ok(Json(DataResponse { data: user.into() }))
}

/// PUT /api/v1/users/{id}
///
/// Profile fields follow the visibility rule; `role` and `is_active` need
/// the user-management capability.
pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateUserRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    input.validate()?;
    if let Some(first_name) = &input.first_name {
        validation(validate_person_name("First name", first_name))?;
    }
    if let Some(last_name) = &input.last_name {
        validation(validate_person_name("Last name", last_name))?;
    }
    if let Some(phone) = &input.phone_number {
        validation(validate_phone_number(phone))?;
    }

    let changes = UpdateUser {
        email: input.email,
        first_name: input.first_name,
        last_name: input.last_name,
        phone_number: input.phone_number,
        department: input.department,
        role: input.role,
        is_active: input.is_active,
    };

    let target = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;
    can_update_user(
        &auth.actor(),
        target.id,
        target.role,
        changes.changes_privileges(),
    )?;

    let user = UserRepo::update(&state.pool, id, &changes)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;

    tracing::info!(user_id = id, updated_by = auth.user_id, "User updated");
    Ok(Json(DataResponse { data: user.into() }))
}

/// DELETE /api/v1/users/{id}
///
/// Users are never hard-deleted; this clears the active flag. Deactivating
/// an inactive user is a no-op.
pub async fn deactivate_user(
    State(state): State<AppState>,
    RequireManageUsers(admin): RequireManageUsers,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if UserRepo::find_by_id(&state.pool, id).await?.is_none() {
        return Err(AppError::Core(CoreError::NotFound { entity: "User", id }));
    }
    if !UserRepo::deactivate(&state.pool, id).await? {
        return Ok(StatusCode::NO_CONTENT);
    }
    tracing::info!(user_id = id, deactivated_by = admin.user_id, "User deactivated");
    Ok(StatusCode::NO_CONTENT)
}
