use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Duration;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::event::{Event, EventCreateRequest, EventUpdateRequest};

const UPCOMING_WINDOW_DAYS: i64 = 30;

/// Students see public events plus their own; privileged callers see
/// everything.
#[utoipa::path(
    get,
    path = "/events",
    tag = "Events",
    responses((status = 200, description = "Events visible to the caller", body = [Event]))
)]
pub async fn list_events(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<Vec<Event>>> {
    let events: Vec<Event> = if auth.is_privileged() {
        sqlx::query_as("SELECT * FROM events ORDER BY event_date ASC, event_time ASC")
            .fetch_all(&state.pool)
            .await?
    } else {
        sqlx::query_as(
            "SELECT * FROM events WHERE is_public = 1 OR student_id = ? \
             ORDER BY event_date ASC, event_time ASC",
        )
        .bind(auth.user_id)
        .fetch_all(&state.pool)
        .await?
    };

    Ok(Json(events))
}

/// Visible events in the next thirty days, cancelled ones excluded.
#[utoipa::path(
    get,
    path = "/events/upcoming",
    tag = "Events",
    responses((status = 200, description = "Upcoming events", body = [Event]))
)]
pub async fn list_upcoming_events(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<Vec<Event>>> {
    let today = state.clock.today();
    let horizon = today + Duration::days(UPCOMING_WINDOW_DAYS);

    let events: Vec<Event> = if auth.is_privileged() {
        sqlx::query_as(
            "SELECT * FROM events WHERE event_date BETWEEN ? AND ? AND status != 'cancelled' \
             ORDER BY event_date ASC, event_time ASC",
        )
        .bind(today)
        .bind(horizon)
        .fetch_all(&state.pool)
        .await?
    } else {
        sqlx::query_as(
            "SELECT * FROM events WHERE event_date BETWEEN ? AND ? AND status != 'cancelled' \
             AND (is_public = 1 OR student_id = ?) \
             ORDER BY event_date ASC, event_time ASC",
        )
        .bind(today)
        .bind(horizon)
        .bind(auth.user_id)
        .fetch_all(&state.pool)
        .await?
    };

    Ok(Json(events))
}

/// Visible events on one calendar day.
#[utoipa::path(
    get,
    path = "/events/date/{date}",
    tag = "Events",
    params(("date" = String, Path, description = "Calendar day, ISO-8601")),
    responses((status = 200, description = "Events on the day", body = [Event]))
)]
pub async fn list_events_by_date(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(date): Path<chrono::NaiveDate>,
) -> AppResult<Json<Vec<Event>>> {
    let events: Vec<Event> = if auth.is_privileged() {
        sqlx::query_as("SELECT * FROM events WHERE event_date = ? ORDER BY event_time ASC")
            .bind(date)
            .fetch_all(&state.pool)
            .await?
    } else {
        sqlx::query_as(
            "SELECT * FROM events WHERE event_date = ? AND (is_public = 1 OR student_id = ?) \
             ORDER BY event_time ASC",
        )
        .bind(date)
        .bind(auth.user_id)
        .fetch_all(&state.pool)
        .await?
    };

    Ok(Json(events))
}

#[utoipa::path(
    get,
    path = "/events/{id}",
    tag = "Events",
    params(("id" = Uuid, Path, description = "Event id")),
    responses((status = 200, description = "Event detail", body = Event))
)]
pub async fn get_event(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Event>> {
    let event = fetch_event(&state.pool, id).await?;
    if !auth.is_privileged() && !event.is_public && event.student_id != Some(auth.user_id) {
        return Err(AppError::forbidden("event is not visible to this user"));
    }
    Ok(Json(event))
}

/// Students create private events for themselves; privileged callers may
/// target any student or publish campus-wide events.
#[utoipa::path(
    post,
    path = "/events",
    tag = "Events",
    request_body = EventCreateRequest,
    responses((status = 201, description = "Event created", body = Event))
)]
pub async fn create_event(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<EventCreateRequest>,
) -> AppResult<(StatusCode, Json<Event>)> {
    if payload.title.trim().is_empty() {
        return Err(AppError::bad_request("title is required"));
    }

    let (student_id, is_public) = if auth.is_privileged() {
        (payload.student_id, payload.is_public.unwrap_or(false))
    } else {
        (Some(auth.user_id), false)
    };

    let event_id = Uuid::new_v4();
    let now = state.clock.now();

    sqlx::query(
        "INSERT INTO events (id, title, description, event_date, event_time, event_type, \
         location, status, student_id, is_public, created_by, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(event_id)
    .bind(payload.title.trim())
    .bind(&payload.description)
    .bind(payload.event_date)
    .bind(payload.event_time)
    .bind(&payload.event_type)
    .bind(&payload.location)
    .bind(payload.status.as_deref().unwrap_or("scheduled"))
    .bind(student_id)
    .bind(is_public)
    .bind(auth.user_id.to_string())
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(fetch_event(&state.pool, event_id).await?)))
}

#[utoipa::path(
    put,
    path = "/events/{id}",
    tag = "Events",
    params(("id" = Uuid, Path, description = "Event id")),
    request_body = EventUpdateRequest,
    responses((status = 200, description = "Event updated", body = Event))
)]
pub async fn update_event(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<EventUpdateRequest>,
) -> AppResult<Json<Event>> {
    let mut event = fetch_event(&state.pool, id).await?;
    if !auth.is_privileged() && event.student_id != Some(auth.user_id) {
        return Err(AppError::forbidden("not the owner of this event"));
    }

    if let Some(title) = &payload.title {
        if title.trim().is_empty() {
            return Err(AppError::bad_request("title must not be empty"));
        }
        event.title = title.trim().to_string();
    }
    if let Some(description) = payload.description {
        event.description = Some(description);
    }
    if let Some(event_date) = payload.event_date {
        event.event_date = event_date;
    }
    if let Some(event_time) = payload.event_time {
        event.event_time = Some(event_time);
    }
    if let Some(event_type) = payload.event_type {
        event.event_type = Some(event_type);
    }
    if let Some(location) = payload.location {
        event.location = Some(location);
    }
    if let Some(status) = payload.status {
        event.status = status;
    }
    if let Some(is_public) = payload.is_public {
        if is_public && !auth.is_privileged() {
            return Err(AppError::forbidden("only staff can publish events"));
        }
        event.is_public = is_public;
    }

    sqlx::query(
        "UPDATE events SET title = ?, description = ?, event_date = ?, event_time = ?, \
         event_type = ?, location = ?, status = ?, is_public = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&event.title)
    .bind(&event.description)
    .bind(event.event_date)
    .bind(event.event_time)
    .bind(&event.event_type)
    .bind(&event.location)
    .bind(&event.status)
    .bind(event.is_public)
    .bind(state.clock.now())
    .bind(event.id)
    .execute(&state.pool)
    .await?;

    Ok(Json(fetch_event(&state.pool, id).await?))
}

#[utoipa::path(
    delete,
    path = "/events/{id}",
    tag = "Events",
    params(("id" = Uuid, Path, description = "Event id")),
    responses((status = 204, description = "Event deleted"))
)]
pub async fn delete_event(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let event = fetch_event(&state.pool, id).await?;
    if !auth.is_privileged() && event.student_id != Some(auth.user_id) {
        return Err(AppError::forbidden("not the owner of this event"));
    }

    sqlx::query("DELETE FROM events WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_event(pool: &SqlitePool, id: Uuid) -> AppResult<Event> {
    sqlx::query_as("SELECT * FROM events WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("event not found"))
}
