use axum::extract::State;
use axum::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz;
use crate::clock::Clock;
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::settings::{SettingsUpdateRequest, StudentSettings};

/// Settings are created lazily: the first read materializes a row with
/// the defaults.
#[utoipa::path(
    get,
    path = "/settings",
    tag = "Settings",
    responses((status = 200, description = "The caller's settings", body = StudentSettings))
)]
pub async fn get_settings(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<StudentSettings>> {
    authz::require_student(&auth)?;

    let settings = fetch_or_create(&state.pool, &state.clock, auth.user_id).await?;
    Ok(Json(settings))
}

#[utoipa::path(
    put,
    path = "/settings",
    tag = "Settings",
    request_body = SettingsUpdateRequest,
    responses((status = 200, description = "Settings updated", body = StudentSettings))
)]
pub async fn update_settings(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<SettingsUpdateRequest>,
) -> AppResult<Json<StudentSettings>> {
    authz::require_student(&auth)?;

    let mut settings = fetch_or_create(&state.pool, &state.clock, auth.user_id).await?;

    if let Some(theme) = &payload.theme {
        if !matches!(theme.as_str(), "light" | "dark" | "system") {
            return Err(AppError::bad_request("theme must be light, dark or system"));
        }
        settings.theme = theme.clone();
    }
    if let Some(days) = payload.reminder_advance_days {
        if !(0..=30).contains(&days) {
            return Err(AppError::bad_request("reminder_advance_days must be between 0 and 30"));
        }
        settings.reminder_advance_days = days;
    }
    if let Some(value) = payload.email_notifications {
        settings.email_notifications = value;
    }
    if let Some(value) = payload.push_notifications {
        settings.push_notifications = value;
    }
    if let Some(value) = payload.grade_notifications {
        settings.grade_notifications = value;
    }
    if let Some(value) = payload.deadline_reminders {
        settings.deadline_reminders = value;
    }
    if let Some(language) = payload.language {
        settings.language = language;
    }
    if let Some(font_size) = payload.font_size {
        settings.font_size = font_size;
    }
    if let Some(value) = payload.compact_mode {
        settings.compact_mode = value;
    }
    if let Some(view) = payload.default_calendar_view {
        settings.default_calendar_view = view;
    }
    if let Some(format) = payload.grade_display_format {
        settings.grade_display_format = format;
    }
    if let Some(value) = payload.auto_save_reports {
        settings.auto_save_reports = value;
    }

    sqlx::query(
        "UPDATE student_settings SET email_notifications = ?, push_notifications = ?, \
         grade_notifications = ?, deadline_reminders = ?, theme = ?, language = ?, \
         font_size = ?, compact_mode = ?, default_calendar_view = ?, grade_display_format = ?, \
         auto_save_reports = ?, reminder_advance_days = ?, updated_at = ? WHERE id = ?",
    )
    .bind(settings.email_notifications)
    .bind(settings.push_notifications)
    .bind(settings.grade_notifications)
    .bind(settings.deadline_reminders)
    .bind(&settings.theme)
    .bind(&settings.language)
    .bind(&settings.font_size)
    .bind(settings.compact_mode)
    .bind(&settings.default_calendar_view)
    .bind(&settings.grade_display_format)
    .bind(settings.auto_save_reports)
    .bind(settings.reminder_advance_days)
    .bind(state.clock.now())
    .bind(settings.id)
    .execute(&state.pool)
    .await?;

    let settings = fetch_or_create(&state.pool, &state.clock, auth.user_id).await?;
    Ok(Json(settings))
}

/// Drops the caller's row; the next read recreates it with the defaults.
#[utoipa::path(
    post,
    path = "/settings/reset",
    tag = "Settings",
    responses((status = 200, description = "Settings restored to defaults", body = StudentSettings))
)]
pub async fn reset_settings(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<StudentSettings>> {
    authz::require_student(&auth)?;

    sqlx::query("DELETE FROM student_settings WHERE user_id = ?")
        .bind(auth.user_id)
        .execute(&state.pool)
        .await?;

    let settings = fetch_or_create(&state.pool, &state.clock, auth.user_id).await?;
    Ok(Json(settings))
}

#[utoipa::path(
    delete,
    path = "/settings",
    tag = "Settings",
    responses((status = 204, description = "Settings row removed"))
)]
pub async fn delete_settings(State(state): State<AppState>, auth: AuthUser) -> AppResult<axum::http::StatusCode> {
    authz::require_student(&auth)?;

    sqlx::query("DELETE FROM student_settings WHERE user_id = ?")
        .bind(auth.user_id)
        .execute(&state.pool)
        .await?;

    Ok(axum::http::StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/settings/all",
    tag = "Settings",
    responses((status = 200, description = "Every stored settings row", body = [StudentSettings]))
)]
pub async fn list_settings(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<Vec<StudentSettings>>> {
    authz::require_admin(&auth)?;

    let rows: Vec<StudentSettings> =
        sqlx::query_as("SELECT * FROM student_settings ORDER BY created_at ASC")
            .fetch_all(&state.pool)
            .await?;

    Ok(Json(rows))
}

async fn fetch_or_create(pool: &SqlitePool, clock: &Clock, user_id: Uuid) -> AppResult<StudentSettings> {
    let existing: Option<StudentSettings> =
        sqlx::query_as("SELECT * FROM student_settings WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

    if let Some(settings) = existing {
        return Ok(settings);
    }

    let now = clock.now();
    // The defaults live in the schema; only the keys and timestamps are
    // bound here. A concurrent insert loses on the unique user_id and we
    // fall through to the stored row.
    let inserted = sqlx::query(
        "INSERT INTO student_settings (id, user_id, created_at, updated_at) VALUES (?, ?, ?, ?)",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await;

    if let Err(err) = inserted {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {}
            _ => return Err(AppError::Database(err)),
        }
    }

    sqlx::query_as("SELECT * FROM student_settings WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::internal("settings row missing after insert"))
}
