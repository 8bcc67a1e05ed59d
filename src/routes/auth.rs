use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::user::{AuthResponse, DbUser, LoginRequest, RegisterRequest, Role, User};
use crate::utils::{hash_password, verify_password};

/// Self-registration always produces a Student account. Professor and
/// admin accounts are provisioned through the CLI seeder or by an admin
/// editing the user afterwards.
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let name = payload.name.trim();
    let email = payload.email.trim().to_lowercase();
    if name.is_empty() {
        return Err(AppError::bad_request("name is required"));
    }
    if !email.contains('@') {
        return Err(AppError::bad_request("email is invalid"));
    }

    let password_hash = hash_password(&payload.password)?;
    let user_id = Uuid::new_v4();
    let now = state.clock.now();

    sqlx::query(
        "INSERT INTO users (id, name, email, password_hash, role, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(name)
    .bind(&email)
    .bind(&password_hash)
    .bind(Role::Student.as_str())
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await
    .map_err(|err| match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::conflict("email already registered")
        }
        _ => AppError::Database(err),
    })?;

    let user = fetch_user(&state.pool, user_id).await?;
    let token = state.jwt.encode(user.id, Role::Student)?;
    let user: User = user.try_into()?;

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login succeeded", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let email = payload.email.trim().to_lowercase();

    let user: Option<DbUser> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(&state.pool)
        .await?;

    // Same error for unknown email and wrong password.
    let user = user.ok_or_else(|| AppError::unauthorized("invalid credentials"))?;
    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(AppError::unauthorized("invalid credentials"));
    }

    let user: User = user.try_into()?;
    let token = state.jwt.encode(user.id, user.role)?;

    Ok(Json(AuthResponse { token, user }))
}

#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Auth",
    responses((status = 200, description = "The authenticated user", body = User))
)]
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<User>> {
    let user = fetch_user(&state.pool, auth.user_id).await?;
    Ok(Json(user.try_into()?))
}

/// Tokens are stateless, so logout is a client-side operation; the
/// endpoint exists so clients have something to call.
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Auth",
    responses((status = 200, description = "Logged out"))
)]
pub async fn logout(_auth: AuthUser) -> Json<Value> {
    Json(json!({ "message": "logged out" }))
}

pub(crate) async fn fetch_user(pool: &SqlitePool, id: Uuid) -> AppResult<DbUser> {
    sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("user not found"))
}
