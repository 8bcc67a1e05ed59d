use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz;
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::achievement::{Achievement, AchievementCreateRequest, AchievementUpdateRequest};

const RECENT_LIMIT: i64 = 5;

#[utoipa::path(
    get,
    path = "/achievements/my",
    tag = "Achievements",
    responses((status = 200, description = "The caller's achievements", body = [Achievement]))
)]
pub async fn list_my_achievements(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<Achievement>>> {
    authz::require_student(&auth)?;

    let achievements: Vec<Achievement> = sqlx::query_as(
        "SELECT * FROM achievements WHERE student_id = ? \
         ORDER BY achievement_date DESC, created_at DESC",
    )
    .bind(auth.user_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(achievements))
}

#[utoipa::path(
    get,
    path = "/achievements/my/recent",
    tag = "Achievements",
    responses((status = 200, description = "The caller's five most recent achievements", body = [Achievement]))
)]
pub async fn list_my_recent_achievements(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<Achievement>>> {
    authz::require_student(&auth)?;

    let achievements: Vec<Achievement> = sqlx::query_as(
        "SELECT * FROM achievements WHERE student_id = ? \
         ORDER BY achievement_date DESC, created_at DESC LIMIT ?",
    )
    .bind(auth.user_id)
    .bind(RECENT_LIMIT)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(achievements))
}

/// Sum of points over the caller's verified achievements.
#[utoipa::path(
    get,
    path = "/achievements/my/points",
    tag = "Achievements",
    responses((status = 200, description = "Total verified points", body = i64))
)]
pub async fn get_my_points(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<i64>> {
    authz::require_student(&auth)?;

    let points: Option<i64> = sqlx::query_scalar(
        "SELECT SUM(points_awarded) FROM achievements \
         WHERE student_id = ? AND status = 'Verified'",
    )
    .bind(auth.user_id)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(points.unwrap_or(0)))
}

#[utoipa::path(
    get,
    path = "/achievements/student/{student_id}",
    tag = "Achievements",
    params(("student_id" = Uuid, Path, description = "Student id")),
    responses((status = 200, description = "Achievements of the student", body = [Achievement]))
)]
pub async fn list_student_achievements(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(student_id): Path<Uuid>,
) -> AppResult<Json<Vec<Achievement>>> {
    authz::require_privileged(&auth)?;

    let achievements: Vec<Achievement> = sqlx::query_as(
        "SELECT * FROM achievements WHERE student_id = ? \
         ORDER BY achievement_date DESC, created_at DESC",
    )
    .bind(student_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(achievements))
}

/// Self-reported achievements start Pending; verification is a separate
/// privileged step.
#[utoipa::path(
    post,
    path = "/achievements",
    tag = "Achievements",
    request_body = AchievementCreateRequest,
    responses((status = 201, description = "Achievement recorded", body = Achievement))
)]
pub async fn create_achievement(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<AchievementCreateRequest>,
) -> AppResult<(StatusCode, Json<Achievement>)> {
    authz::require_student(&auth)?;

    if payload.title.trim().is_empty() {
        return Err(AppError::bad_request("title is required"));
    }

    let achievement_id = Uuid::new_v4();
    let now = state.clock.now();

    sqlx::query(
        "INSERT INTO achievements (id, student_id, title, description, achievement_type, \
         issuing_organization, achievement_date, status, points_awarded, category, is_public, \
         created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, 'Pending', ?, ?, ?, ?, ?)",
    )
    .bind(achievement_id)
    .bind(auth.user_id)
    .bind(payload.title.trim())
    .bind(&payload.description)
    .bind(&payload.achievement_type)
    .bind(&payload.issuing_organization)
    .bind(payload.achievement_date)
    .bind(payload.points_awarded)
    .bind(&payload.category)
    .bind(payload.is_public.unwrap_or(true))
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(fetch_achievement(&state.pool, achievement_id).await?)))
}

#[utoipa::path(
    put,
    path = "/achievements/{id}",
    tag = "Achievements",
    params(("id" = Uuid, Path, description = "Achievement id")),
    request_body = AchievementUpdateRequest,
    responses((status = 200, description = "Achievement updated", body = Achievement))
)]
pub async fn update_achievement(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AchievementUpdateRequest>,
) -> AppResult<Json<Achievement>> {
    let mut achievement = fetch_achievement(&state.pool, id).await?;
    if !auth.is_privileged() && achievement.student_id != auth.user_id {
        return Err(AppError::forbidden("not the owner of this achievement"));
    }

    if let Some(title) = &payload.title {
        if title.trim().is_empty() {
            return Err(AppError::bad_request("title must not be empty"));
        }
        achievement.title = title.trim().to_string();
    }
    if let Some(description) = payload.description {
        achievement.description = Some(description);
    }
    if let Some(achievement_type) = payload.achievement_type {
        achievement.achievement_type = Some(achievement_type);
    }
    if let Some(organization) = payload.issuing_organization {
        achievement.issuing_organization = Some(organization);
    }
    if let Some(date) = payload.achievement_date {
        achievement.achievement_date = Some(date);
    }
    if let Some(points) = payload.points_awarded {
        achievement.points_awarded = Some(points);
    }
    if let Some(category) = payload.category {
        achievement.category = Some(category);
    }
    if let Some(is_public) = payload.is_public {
        achievement.is_public = is_public;
    }

    // Edits by the owner send a verified achievement back for review.
    if !auth.is_privileged() && achievement.status == "Verified" {
        achievement.status = "Pending".to_string();
    }

    sqlx::query(
        "UPDATE achievements SET title = ?, description = ?, achievement_type = ?, \
         issuing_organization = ?, achievement_date = ?, status = ?, points_awarded = ?, \
         category = ?, is_public = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&achievement.title)
    .bind(&achievement.description)
    .bind(&achievement.achievement_type)
    .bind(&achievement.issuing_organization)
    .bind(achievement.achievement_date)
    .bind(&achievement.status)
    .bind(achievement.points_awarded)
    .bind(&achievement.category)
    .bind(achievement.is_public)
    .bind(state.clock.now())
    .bind(achievement.id)
    .execute(&state.pool)
    .await?;

    Ok(Json(fetch_achievement(&state.pool, id).await?))
}

/// Marks the achievement Verified.
#[utoipa::path(
    patch,
    path = "/achievements/{id}/verify",
    tag = "Achievements",
    params(("id" = Uuid, Path, description = "Achievement id")),
    responses((status = 200, description = "Achievement verified", body = Achievement))
)]
pub async fn verify_achievement(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Achievement>> {
    authz::require_privileged(&auth)?;

    fetch_achievement(&state.pool, id).await?;

    sqlx::query("UPDATE achievements SET status = 'Verified', updated_at = ? WHERE id = ?")
        .bind(state.clock.now())
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(Json(fetch_achievement(&state.pool, id).await?))
}

#[utoipa::path(
    delete,
    path = "/achievements/{id}",
    tag = "Achievements",
    params(("id" = Uuid, Path, description = "Achievement id")),
    responses((status = 204, description = "Achievement deleted"))
)]
pub async fn delete_achievement(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let achievement = fetch_achievement(&state.pool, id).await?;
    if !auth.is_privileged() && achievement.student_id != auth.user_id {
        return Err(AppError::forbidden("not the owner of this achievement"));
    }

    sqlx::query("DELETE FROM achievements WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_achievement(pool: &SqlitePool, id: Uuid) -> AppResult<Achievement> {
    sqlx::query_as("SELECT * FROM achievements WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("achievement not found"))
}
