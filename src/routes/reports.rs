use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz;
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::report::{Report, ReportCreateRequest, ReportUpdateRequest};

#[utoipa::path(
    get,
    path = "/reports",
    tag = "Reports",
    responses((status = 200, description = "All reports", body = [Report]))
)]
pub async fn list_reports(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<Vec<Report>>> {
    authz::require_privileged(&auth)?;

    let reports: Vec<Report> = sqlx::query_as("SELECT * FROM reports ORDER BY created_at DESC")
        .fetch_all(&state.pool)
        .await?;

    Ok(Json(reports))
}

#[utoipa::path(
    get,
    path = "/reports/my",
    tag = "Reports",
    responses((status = 200, description = "The caller's reports", body = [Report]))
)]
pub async fn list_my_reports(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<Vec<Report>>> {
    authz::require_student(&auth)?;

    let reports: Vec<Report> =
        sqlx::query_as("SELECT * FROM reports WHERE student_id = ? ORDER BY created_at DESC")
            .bind(auth.user_id)
            .fetch_all(&state.pool)
            .await?;

    Ok(Json(reports))
}

#[utoipa::path(
    get,
    path = "/reports/student/{student_id}",
    tag = "Reports",
    params(("student_id" = Uuid, Path, description = "Student id")),
    responses((status = 200, description = "Reports of the student", body = [Report]))
)]
pub async fn list_student_reports(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(student_id): Path<Uuid>,
) -> AppResult<Json<Vec<Report>>> {
    authz::require_privileged(&auth)?;

    let reports: Vec<Report> =
        sqlx::query_as("SELECT * FROM reports WHERE student_id = ? ORDER BY created_at DESC")
            .bind(student_id)
            .fetch_all(&state.pool)
            .await?;

    Ok(Json(reports))
}

#[utoipa::path(
    get,
    path = "/reports/{id}",
    tag = "Reports",
    params(("id" = Uuid, Path, description = "Report id")),
    responses((status = 200, description = "Report detail", body = Report))
)]
pub async fn get_report(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Report>> {
    let report = fetch_report(&state.pool, id).await?;
    if !auth.is_privileged() && report.student_id != auth.user_id {
        return Err(AppError::forbidden("not the owner of this report"));
    }
    Ok(Json(report))
}

#[utoipa::path(
    post,
    path = "/reports",
    tag = "Reports",
    request_body = ReportCreateRequest,
    responses((status = 201, description = "Report created as a draft", body = Report))
)]
pub async fn create_report(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<ReportCreateRequest>,
) -> AppResult<(StatusCode, Json<Report>)> {
    authz::require_student(&auth)?;

    if payload.title.trim().is_empty() {
        return Err(AppError::bad_request("title is required"));
    }

    let report_id = Uuid::new_v4();
    let now = state.clock.now();

    sqlx::query(
        "INSERT INTO reports (id, student_id, title, content, report_type, status, created_at, \
         updated_at) VALUES (?, ?, ?, ?, ?, 'Draft', ?, ?)",
    )
    .bind(report_id)
    .bind(auth.user_id)
    .bind(payload.title.trim())
    .bind(&payload.content)
    .bind(&payload.report_type)
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(fetch_report(&state.pool, report_id).await?)))
}

/// Draft edits only; a submitted report is read-only for its author.
#[utoipa::path(
    put,
    path = "/reports/{id}",
    tag = "Reports",
    params(("id" = Uuid, Path, description = "Report id")),
    request_body = ReportUpdateRequest,
    responses((status = 200, description = "Report updated", body = Report))
)]
pub async fn update_report(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReportUpdateRequest>,
) -> AppResult<Json<Report>> {
    let mut report = fetch_report(&state.pool, id).await?;

    if !auth.is_privileged() {
        if report.student_id != auth.user_id {
            return Err(AppError::forbidden("not the owner of this report"));
        }
        if report.status != "Draft" {
            return Err(AppError::conflict("only draft reports can be edited"));
        }
    }

    if let Some(title) = &payload.title {
        if title.trim().is_empty() {
            return Err(AppError::bad_request("title must not be empty"));
        }
        report.title = title.trim().to_string();
    }
    if let Some(content) = payload.content {
        report.content = Some(content);
    }
    if let Some(report_type) = payload.report_type {
        report.report_type = Some(report_type);
    }

    sqlx::query(
        "UPDATE reports SET title = ?, content = ?, report_type = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&report.title)
    .bind(&report.content)
    .bind(&report.report_type)
    .bind(state.clock.now())
    .bind(report.id)
    .execute(&state.pool)
    .await?;

    Ok(Json(fetch_report(&state.pool, id).await?))
}

/// Moves a draft to Submitted and stamps the submission time.
#[utoipa::path(
    patch,
    path = "/reports/{id}/submit",
    tag = "Reports",
    params(("id" = Uuid, Path, description = "Report id")),
    responses(
        (status = 200, description = "Report submitted", body = Report),
        (status = 409, description = "Report is not a draft")
    )
)]
pub async fn submit_report(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Report>> {
    authz::require_student(&auth)?;

    let report = fetch_report(&state.pool, id).await?;
    if report.student_id != auth.user_id {
        return Err(AppError::forbidden("not the owner of this report"));
    }
    if report.status != "Draft" {
        return Err(AppError::conflict("report has already been submitted"));
    }

    let now = state.clock.now();
    sqlx::query(
        "UPDATE reports SET status = 'Submitted', submitted_at = ?, updated_at = ? WHERE id = ?",
    )
    .bind(now)
    .bind(now)
    .bind(id)
    .execute(&state.pool)
    .await?;

    Ok(Json(fetch_report(&state.pool, id).await?))
}

#[utoipa::path(
    delete,
    path = "/reports/{id}",
    tag = "Reports",
    params(("id" = Uuid, Path, description = "Report id")),
    responses((status = 204, description = "Report deleted"))
)]
pub async fn delete_report(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let report = fetch_report(&state.pool, id).await?;
    if !auth.is_privileged() && report.student_id != auth.user_id {
        return Err(AppError::forbidden("not the owner of this report"));
    }

    sqlx::query("DELETE FROM reports WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_report(pool: &SqlitePool, id: Uuid) -> AppResult<Report> {
    sqlx::query_as("SELECT * FROM reports WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("report not found"))
}
