//! Handlers for the `/auth` resource (login, register).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use inventory_core::credentials::{
    validate_password_complexity, validate_person_name, validate_phone_number, validate_username,
};
use inventory_core::error::CoreError;
use inventory_core::lockout::ensure_not_locked;
use inventory_core::roles::{Department, Role};
use inventory_db::models::user::{CreateUser, User, UserResponse};
use inventory_db::repositories::UserRepo;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::jwt::generate_access_token;
use crate::auth::password::{hash_password, verify_password};
use crate::error::{validation, AppError, AppResult};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Request body for `POST /auth/register`. Self-registration always
/// creates an employee.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    pub username: String,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub department: Department,
}

/// Successful authentication response returned by login and register.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub access_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserResponse,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/login
///
/// Authenticate with username + password. A locked account is refused even
/// when the password is correct.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<SessionResponse>> {
    let now = Utc::now();

    // 1. Unknown usernames look exactly like bad passwords.
    let user = UserRepo::find_by_username(&state.pool, &input.username)
        .await?
        .ok_or_else(invalid_credentials)?;

    // 2. Deactivated accounts never authenticate.
    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    // 3. Lock state is evaluated lazily on every attempt.
    ensure_not_locked(user.locked_until, now)?;

    // 4. Verify password.
    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;

    if !password_valid {
        let counters =
            UserRepo::record_failed_login(&state.pool, user.id, &state.config.lockout, now)
                .await?;
        match counters {
            Some(c) if c.locked_until.is_some() => tracing::warn!(
                user_id = user.id,
                failed_login_count = c.failed_login_count,
                "Account locked after repeated failed logins",
            ),
            Some(c) => tracing::warn!(
                user_id = user.id,
                failed_login_count = c.failed_login_count,
                "Failed login",
            ),
            None => {}
        }
        return Err(invalid_credentials());
    }

    // 5. The success write is refused if a concurrent failure locked the account.
    let Some(user) = UserRepo::record_successful_login(&state.pool, user.id, now).await? else {
        let current = UserRepo::find_by_id(&state.pool, user.id).await?;
        return Err(match current.and_then(|u| u.locked_until) {
            Some(until) => AppError::Core(CoreError::AccountLocked { until }),
            None => invalid_credentials(),
        });
    };

    tracing::info!(user_id = user.id, "User logged in");
    Ok(Json(session_for(&state, user)?))
}

/// POST /api/v1/auth/register
///
/// Create an employee account and return a session for it.
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<SessionResponse>)> {
    input.validate()?;
    validation(validate_username(&input.username))?;
    validation(validate_person_name("First name", &input.first_name))?;
    validation(validate_person_name("Last name", &input.last_name))?;
    if let Some(phone) = &input.phone_number {
        validation(validate_phone_number(phone))?;
    }
    validation(validate_password_complexity(&input.password))?;

    if UserRepo::username_exists(&state.pool, &input.username).await? {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Username '{}' is already taken",
            input.username
        ))));
    }
    if UserRepo::email_exists(&state.pool, &input.email).await? {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Email '{}' is already registered",
            input.email
        ))));
    }

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    // The unique constraints still back the existence checks above.
    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            username: input.username,
            email: input.email,
            password_hash,
            first_name: input.first_name,
            last_name: input.last_name,
            phone_number: input.phone_number,
            role: Role::Employee,
            department: input.department,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, "User registered");
    Ok((StatusCode::CREATED, Json(session_for(&state, user)?)))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn invalid_credentials() -> AppError {
    AppError::Core(CoreError::Unauthorized("Invalid username or password".into()))
}

/// Issue an access token and build the session payload.
fn session_for(state: &AppState, user: User) -> AppResult<SessionResponse> {
    let access_token =
        generate_access_token(user.id, &user.username, user.role, &state.config.jwt)
            .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    Ok(SessionResponse {
        access_token,
        token_type: "Bearer",
        expires_in: state.config.jwt.expires_in_secs(),
        user: user.into(),
    })
}
