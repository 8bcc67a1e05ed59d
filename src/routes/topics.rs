use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz;
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::topic::{
    ApplicationReviewRequest, Topic, TopicApplication, TopicApplyRequest, TopicCreateRequest,
    TopicUpdateRequest,
};

#[utoipa::path(
    get,
    path = "/topics",
    tag = "Topics",
    responses((status = 200, description = "All topics", body = [Topic]))
)]
pub async fn list_topics(State(state): State<AppState>, _auth: AuthUser) -> AppResult<Json<Vec<Topic>>> {
    let topics: Vec<Topic> = sqlx::query_as("SELECT * FROM topics ORDER BY created_at DESC")
        .fetch_all(&state.pool)
        .await?;
    Ok(Json(topics))
}

#[utoipa::path(
    get,
    path = "/topics/available",
    tag = "Topics",
    responses((status = 200, description = "Topics still open for applications", body = [Topic]))
)]
pub async fn list_available_topics(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> AppResult<Json<Vec<Topic>>> {
    let topics: Vec<Topic> = sqlx::query_as(
        "SELECT * FROM topics \
         WHERE status = 'Available' AND current_students < max_students \
         ORDER BY created_at DESC",
    )
    .fetch_all(&state.pool)
    .await?;
    Ok(Json(topics))
}

#[utoipa::path(
    get,
    path = "/topics/{id}",
    tag = "Topics",
    params(("id" = Uuid, Path, description = "Topic id")),
    responses((status = 200, description = "Topic detail", body = Topic))
)]
pub async fn get_topic(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Topic>> {
    Ok(Json(fetch_topic(&state.pool, id).await?))
}

#[utoipa::path(
    post,
    path = "/topics",
    tag = "Topics",
    request_body = TopicCreateRequest,
    responses((status = 201, description = "Topic created", body = Topic))
)]
pub async fn create_topic(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<TopicCreateRequest>,
) -> AppResult<(StatusCode, Json<Topic>)> {
    authz::require_privileged(&auth)?;

    if payload.title.trim().is_empty() {
        return Err(AppError::bad_request("title is required"));
    }
    let max_students = payload.max_students.unwrap_or(1);
    if max_students < 1 {
        return Err(AppError::bad_request("max_students must be at least 1"));
    }

    let topic_id = Uuid::new_v4();
    let now = state.clock.now();

    sqlx::query(
        "INSERT INTO topics (id, title, description, supervisor, department, topic_type, status, \
         max_students, current_students, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, 'Available', ?, 0, ?, ?)",
    )
    .bind(topic_id)
    .bind(payload.title.trim())
    .bind(&payload.description)
    .bind(&payload.supervisor)
    .bind(&payload.department)
    .bind(&payload.topic_type)
    .bind(max_students)
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(fetch_topic(&state.pool, topic_id).await?)))
}

#[utoipa::path(
    put,
    path = "/topics/{id}",
    tag = "Topics",
    params(("id" = Uuid, Path, description = "Topic id")),
    request_body = TopicUpdateRequest,
    responses((status = 200, description = "Topic updated", body = Topic))
)]
pub async fn update_topic(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<TopicUpdateRequest>,
) -> AppResult<Json<Topic>> {
    authz::require_privileged(&auth)?;

    let mut topic = fetch_topic(&state.pool, id).await?;

    if let Some(title) = &payload.title {
        if title.trim().is_empty() {
            return Err(AppError::bad_request("title must not be empty"));
        }
        topic.title = title.trim().to_string();
    }
    if let Some(max_students) = payload.max_students {
        if max_students < topic.current_students {
            return Err(AppError::bad_request(
                "max_students cannot drop below the number of assigned students",
            ));
        }
        topic.max_students = max_students;
    }
    if let Some(description) = payload.description {
        topic.description = Some(description);
    }
    if let Some(supervisor) = payload.supervisor {
        topic.supervisor = supervisor;
    }
    if let Some(department) = payload.department {
        topic.department = Some(department);
    }
    if let Some(topic_type) = payload.topic_type {
        topic.topic_type = Some(topic_type);
    }
    if let Some(status) = payload.status {
        topic.status = status;
    }

    sqlx::query(
        "UPDATE topics SET title = ?, description = ?, supervisor = ?, department = ?, \
         topic_type = ?, status = ?, max_students = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&topic.title)
    .bind(&topic.description)
    .bind(&topic.supervisor)
    .bind(&topic.department)
    .bind(&topic.topic_type)
    .bind(&topic.status)
    .bind(topic.max_students)
    .bind(state.clock.now())
    .bind(topic.id)
    .execute(&state.pool)
    .await?;

    Ok(Json(fetch_topic(&state.pool, id).await?))
}

#[utoipa::path(
    delete,
    path = "/topics/{id}",
    tag = "Topics",
    params(("id" = Uuid, Path, description = "Topic id")),
    responses((status = 204, description = "Topic deleted"))
)]
pub async fn delete_topic(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    authz::require_admin(&auth)?;

    let mut tx = state.pool.begin().await?;

    sqlx::query("DELETE FROM topic_applications WHERE topic_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let affected = sqlx::query("DELETE FROM topics WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    if affected.rows_affected() == 0 {
        return Err(AppError::not_found("topic not found"));
    }

    tx.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// A student may hold at most one pending application per topic, and may
/// only apply while the topic still has capacity.
#[utoipa::path(
    post,
    path = "/topics/{id}/apply",
    tag = "Topics",
    params(("id" = Uuid, Path, description = "Topic id")),
    request_body = TopicApplyRequest,
    responses(
        (status = 201, description = "Application submitted", body = TopicApplication),
        (status = 409, description = "Topic full or already applied")
    )
)]
pub async fn apply_to_topic(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<TopicApplyRequest>,
) -> AppResult<(StatusCode, Json<TopicApplication>)> {
    authz::require_student(&auth)?;

    let topic = fetch_topic(&state.pool, id).await?;
    if !topic.is_available() {
        return Err(AppError::conflict("topic is not open for applications"));
    }

    let pending: i64 = sqlx::query_scalar(
        "SELECT COUNT(1) FROM topic_applications \
         WHERE topic_id = ? AND student_id = ? AND status = 'Pending'",
    )
    .bind(id)
    .bind(auth.user_id)
    .fetch_one(&state.pool)
    .await?;
    if pending > 0 {
        return Err(AppError::conflict("application already pending for this topic"));
    }

    let application_id = Uuid::new_v4();
    let now = state.clock.now();

    sqlx::query(
        "INSERT INTO topic_applications (id, student_id, topic_id, motivation, status, applied_at) \
         VALUES (?, ?, ?, ?, 'Pending', ?)",
    )
    .bind(application_id)
    .bind(auth.user_id)
    .bind(id)
    .bind(&payload.motivation)
    .bind(now)
    .execute(&state.pool)
    .await?;

    let application = fetch_application(&state.pool, application_id).await?;
    Ok((StatusCode::CREATED, Json(application)))
}

#[utoipa::path(
    get,
    path = "/topics/applications/my",
    tag = "Topics",
    responses((status = 200, description = "The caller's applications", body = [TopicApplication]))
)]
pub async fn list_my_applications(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<TopicApplication>>> {
    authz::require_student(&auth)?;

    let applications: Vec<TopicApplication> = sqlx::query_as(
        "SELECT * FROM topic_applications WHERE student_id = ? ORDER BY applied_at DESC",
    )
    .bind(auth.user_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(applications))
}

#[utoipa::path(
    get,
    path = "/topics/{id}/applications",
    tag = "Topics",
    params(("id" = Uuid, Path, description = "Topic id")),
    responses((status = 200, description = "Applications for the topic", body = [TopicApplication]))
)]
pub async fn list_topic_applications(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<TopicApplication>>> {
    authz::require_privileged(&auth)?;

    fetch_topic(&state.pool, id).await?;

    let applications: Vec<TopicApplication> = sqlx::query_as(
        "SELECT * FROM topic_applications WHERE topic_id = ? ORDER BY applied_at ASC",
    )
    .bind(id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(applications))
}

/// Approving an application seats the student: the topic's headcount goes
/// up and the topic flips to Taken when it reaches capacity. An
/// application can only be reviewed once.
#[utoipa::path(
    put,
    path = "/topics/applications/{id}/review",
    tag = "Topics",
    params(("id" = Uuid, Path, description = "Application id")),
    request_body = ApplicationReviewRequest,
    responses(
        (status = 200, description = "Application reviewed", body = TopicApplication),
        (status = 409, description = "Already reviewed or topic full")
    )
)]
pub async fn review_application(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ApplicationReviewRequest>,
) -> AppResult<Json<TopicApplication>> {
    authz::require_privileged(&auth)?;
    payload.validate()?;

    let mut tx = state.pool.begin().await?;

    let application: TopicApplication =
        sqlx::query_as("SELECT * FROM topic_applications WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::not_found("application not found"))?;

    if application.status != "Pending" {
        return Err(AppError::conflict("application already reviewed"));
    }

    if payload.status == "Approved" {
        let topic: Topic = sqlx::query_as("SELECT * FROM topics WHERE id = ?")
            .bind(application.topic_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::not_found("topic not found"))?;

        if !topic.is_available() {
            return Err(AppError::conflict("topic has no remaining capacity"));
        }

        let seated = topic.current_students + 1;
        let status = if seated >= topic.max_students { "Taken" } else { "Available" };

        sqlx::query("UPDATE topics SET current_students = ?, status = ?, updated_at = ? WHERE id = ?")
            .bind(seated)
            .bind(status)
            .bind(state.clock.now())
            .bind(topic.id)
            .execute(&mut *tx)
            .await?;
    }

    sqlx::query(
        "UPDATE topic_applications SET status = ?, reviewed_at = ?, reviewer_comments = ? \
         WHERE id = ?",
    )
    .bind(&payload.status)
    .bind(state.clock.now())
    .bind(&payload.reviewer_comments)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    let application = fetch_application(&state.pool, id).await?;
    Ok(Json(application))
}

async fn fetch_topic(pool: &SqlitePool, id: Uuid) -> AppResult<Topic> {
    sqlx::query_as("SELECT * FROM topics WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("topic not found"))
}

async fn fetch_application(pool: &SqlitePool, id: Uuid) -> AppResult<TopicApplication> {
    sqlx::query_as("SELECT * FROM topic_applications WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("application not found"))
}
