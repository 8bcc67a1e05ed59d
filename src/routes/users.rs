use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz;
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::user::{DbUser, User, UserUpdateRequest};

use super::auth::fetch_user;

#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    responses((status = 200, description = "All users", body = [User]))
)]
pub async fn list_users(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<Vec<User>>> {
    authz::require_admin(&auth)?;

    let rows: Vec<DbUser> = sqlx::query_as("SELECT * FROM users ORDER BY created_at ASC")
        .fetch_all(&state.pool)
        .await?;

    rows.into_iter().map(User::try_from).collect::<Result<_, _>>().map(Json)
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User id")),
    responses((status = 200, description = "User detail", body = User))
)]
pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<User>> {
    // Users may read themselves; anything else is admin territory.
    if id != auth.user_id {
        authz::require_admin(&auth)?;
    }

    let user = fetch_user(&state.pool, id).await?;
    Ok(Json(user.try_into()?))
}

/// Users may rename themselves and change their email; role changes are
/// admin-only.
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = UserUpdateRequest,
    responses((status = 200, description = "User updated", body = User))
)]
pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UserUpdateRequest>,
) -> AppResult<Json<User>> {
    if id != auth.user_id {
        authz::require_admin(&auth)?;
    }
    if payload.role.is_some() {
        authz::require_admin(&auth)?;
    }

    let mut user = fetch_user(&state.pool, id).await?;

    if let Some(name) = &payload.name {
        if name.trim().is_empty() {
            return Err(AppError::bad_request("name must not be empty"));
        }
        user.name = name.trim().to_string();
    }
    if let Some(email) = &payload.email {
        let email = email.trim().to_lowercase();
        if !email.contains('@') {
            return Err(AppError::bad_request("email is invalid"));
        }
        user.email = email;
    }
    if let Some(role) = payload.role {
        user.role = role.as_str().to_string();
    }

    sqlx::query("UPDATE users SET name = ?, email = ?, role = ?, updated_at = ? WHERE id = ?")
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.role)
        .bind(state.clock.now())
        .bind(user.id)
        .execute(&state.pool)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::conflict("email already registered")
            }
            _ => AppError::Database(err),
        })?;

    let user = fetch_user(&state.pool, id).await?;
    Ok(Json(user.try_into()?))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User id")),
    responses((status = 204, description = "User deleted"))
)]
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    authz::require_admin(&auth)?;

    let affected = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if affected.rows_affected() == 0 {
        return Err(AppError::not_found("user not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
