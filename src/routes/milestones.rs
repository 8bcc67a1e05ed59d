use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Duration;
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::app::AppState;
use crate::authz;
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::milestone::{
    DbMilestone, Milestone, MilestoneCreateRequest, MilestonePriority, MilestoneStatus,
    MilestoneUpdateRequest,
};
use crate::utils::ensure_percentage;

use super::projects::fetch_active_project;

const MILESTONE_COLUMNS: &str = "id, project_id, title, description, due_date, completion_date, \
    status, priority, progress_percentage, notes, order_index, created_at, updated_at";

const DUE_SOON_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Deserialize)]
pub struct MilestoneListQuery {
    pub status: Option<MilestoneStatus>,
    pub priority: Option<MilestonePriority>,
}

/// Cross-project listing for staff, with optional status/priority filters.
#[utoipa::path(
    get,
    path = "/project-milestones",
    tag = "Milestones",
    responses((status = 200, description = "All milestones", body = [Milestone]))
)]
pub async fn list_milestones(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<MilestoneListQuery>,
) -> AppResult<Json<Vec<Milestone>>> {
    authz::require_privileged(&auth)?;

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT {MILESTONE_COLUMNS} FROM project_milestones WHERE 1=1"
    ));
    if let Some(status) = query.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(priority) = query.priority {
        qb.push(" AND priority = ").push_bind(priority.as_str());
    }
    qb.push(" ORDER BY project_id, order_index ASC");

    let rows = qb.build_query_as::<DbMilestone>().fetch_all(&state.pool).await?;
    Ok(Json(rows_to_milestones(rows)?))
}

/// The caller's active project's milestones.
#[utoipa::path(
    get,
    path = "/project-milestones/my-milestones",
    tag = "Milestones",
    responses((status = 200, description = "Milestones of the caller's active project", body = [Milestone]))
)]
pub async fn get_my_milestones(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<Vec<Milestone>>> {
    authz::require_student(&auth)?;

    let project = fetch_active_project(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("no active project"))?;

    let rows = sqlx::query_as::<_, DbMilestone>(&format!(
        "SELECT {MILESTONE_COLUMNS} FROM project_milestones \
         WHERE project_id = ? ORDER BY order_index ASC"
    ))
    .bind(project.id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(rows_to_milestones(rows)?))
}

/// Incomplete milestones with a due date across all of the caller's
/// projects, soonest first.
#[utoipa::path(
    get,
    path = "/project-milestones/my-milestones/upcoming",
    tag = "Milestones",
    responses((status = 200, description = "Upcoming milestones for the caller", body = [Milestone]))
)]
pub async fn get_my_upcoming_milestones(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<Milestone>>> {
    authz::require_student(&auth)?;

    let rows = sqlx::query_as::<_, DbMilestone>(
        "SELECT m.id, m.project_id, m.title, m.description, m.due_date, m.completion_date, \
         m.status, m.priority, m.progress_percentage, m.notes, m.order_index, m.created_at, \
         m.updated_at \
         FROM project_milestones m JOIN projects p ON p.id = m.project_id \
         WHERE p.student_id = ? AND m.status != 'Completed' AND m.due_date IS NOT NULL \
         ORDER BY m.due_date ASC",
    )
    .bind(auth.user_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(rows_to_milestones(rows)?))
}

/// Creates a milestone under the caller's active project; without one the
/// request is rejected.
#[utoipa::path(
    post,
    path = "/project-milestones",
    tag = "Milestones",
    request_body = MilestoneCreateRequest,
    responses(
        (status = 201, description = "Milestone created", body = Milestone),
        (status = 400, description = "No active project")
    )
)]
pub async fn create_my_milestone(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<MilestoneCreateRequest>,
) -> AppResult<(StatusCode, Json<Milestone>)> {
    authz::require_student(&auth)?;

    let project = fetch_active_project(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::bad_request("no active project to attach the milestone to"))?;

    let milestone = insert_milestone(&state, project.id, payload).await?;
    Ok((StatusCode::CREATED, Json(milestone.try_into()?)))
}

#[utoipa::path(
    get,
    path = "/project-milestones/status/{status}",
    tag = "Milestones",
    params(("status" = String, Path, description = "Milestone status literal")),
    responses((status = 200, description = "Milestones with the given status", body = [Milestone]))
)]
pub async fn list_milestones_by_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(status): Path<String>,
) -> AppResult<Json<Vec<Milestone>>> {
    authz::require_privileged(&auth)?;
    let status: MilestoneStatus = status.parse().map_err(AppError::bad_request)?;

    let rows = sqlx::query_as::<_, DbMilestone>(&format!(
        "SELECT {MILESTONE_COLUMNS} FROM project_milestones WHERE status = ? \
         ORDER BY project_id, order_index ASC"
    ))
    .bind(status.as_str())
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(rows_to_milestones(rows)?))
}

#[utoipa::path(
    get,
    path = "/project-milestones/priority/{priority}",
    tag = "Milestones",
    params(("priority" = String, Path, description = "Milestone priority literal")),
    responses((status = 200, description = "Milestones with the given priority", body = [Milestone]))
)]
pub async fn list_milestones_by_priority(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(priority): Path<String>,
) -> AppResult<Json<Vec<Milestone>>> {
    authz::require_privileged(&auth)?;
    let priority: MilestonePriority = priority.parse().map_err(AppError::bad_request)?;

    let rows = sqlx::query_as::<_, DbMilestone>(&format!(
        "SELECT {MILESTONE_COLUMNS} FROM project_milestones WHERE priority = ? \
         ORDER BY project_id, order_index ASC"
    ))
    .bind(priority.as_str())
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(rows_to_milestones(rows)?))
}

#[derive(Debug, Deserialize)]
pub struct MilestoneSearchQuery {
    pub keyword: String,
}

#[utoipa::path(
    get,
    path = "/project-milestones/search",
    tag = "Milestones",
    params(("keyword" = String, Query, description = "Substring to search for")),
    responses((status = 200, description = "Matching milestones", body = [Milestone]))
)]
pub async fn search_milestones(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<MilestoneSearchQuery>,
) -> AppResult<Json<Vec<Milestone>>> {
    authz::require_privileged(&auth)?;

    // instr() is case-sensitive, unlike LIKE in SQLite.
    let rows = sqlx::query_as::<_, DbMilestone>(&format!(
        "SELECT {MILESTONE_COLUMNS} FROM project_milestones \
         WHERE instr(title, ?) > 0 OR instr(coalesce(description, ''), ?) > 0 \
         ORDER BY project_id, order_index ASC"
    ))
    .bind(&query.keyword)
    .bind(&query.keyword)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(rows_to_milestones(rows)?))
}

/// Overdue milestones across every project.
#[utoipa::path(
    get,
    path = "/project-milestones/overdue",
    tag = "Milestones",
    responses((status = 200, description = "Overdue milestones", body = [Milestone]))
)]
pub async fn get_all_overdue_milestones(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<Milestone>>> {
    authz::require_privileged(&auth)?;

    let rows = sqlx::query_as::<_, DbMilestone>(&format!(
        "SELECT {MILESTONE_COLUMNS} FROM project_milestones \
         WHERE due_date < ? AND status != 'Completed' ORDER BY due_date ASC"
    ))
    .bind(state.clock.today())
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(rows_to_milestones(rows)?))
}

/// Incomplete milestones due within the next week, across every project.
#[utoipa::path(
    get,
    path = "/project-milestones/due-soon",
    tag = "Milestones",
    responses((status = 200, description = "Milestones due soon", body = [Milestone]))
)]
pub async fn get_all_milestones_due_soon(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<Milestone>>> {
    authz::require_privileged(&auth)?;

    let today = state.clock.today();
    let horizon = today + Duration::days(DUE_SOON_WINDOW_DAYS);

    let rows = sqlx::query_as::<_, DbMilestone>(&format!(
        "SELECT {MILESTONE_COLUMNS} FROM project_milestones \
         WHERE due_date BETWEEN ? AND ? AND status != 'Completed' ORDER BY due_date ASC"
    ))
    .bind(today)
    .bind(horizon)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(rows_to_milestones(rows)?))
}

#[utoipa::path(
    get,
    path = "/project-milestones/statuses",
    tag = "Milestones",
    responses((status = 200, description = "Distinct stored statuses", body = [String]))
)]
pub async fn list_milestone_statuses(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<String>>> {
    authz::require_privileged(&auth)?;

    let statuses: Vec<String> = sqlx::query_scalar(
        "SELECT DISTINCT status FROM project_milestones ORDER BY status",
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(statuses))
}

#[utoipa::path(
    get,
    path = "/project-milestones/priorities",
    tag = "Milestones",
    responses((status = 200, description = "Distinct stored priorities", body = [String]))
)]
pub async fn list_milestone_priorities(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<String>>> {
    authz::require_privileged(&auth)?;

    let priorities: Vec<String> = sqlx::query_scalar(
        "SELECT DISTINCT priority FROM project_milestones WHERE priority IS NOT NULL \
         ORDER BY priority",
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(priorities))
}

#[utoipa::path(
    get,
    path = "/project-milestones/project/{project_id}",
    tag = "Milestones",
    params(("project_id" = Uuid, Path, description = "Parent project id")),
    responses((status = 200, description = "Milestones ordered by position", body = [Milestone]))
)]
pub async fn list_project_milestones(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
) -> AppResult<Json<Vec<Milestone>>> {
    authz::require_project_access(&state.pool, &auth, project_id).await?;

    let rows = sqlx::query_as::<_, DbMilestone>(&format!(
        "SELECT {MILESTONE_COLUMNS} FROM project_milestones \
         WHERE project_id = ? ORDER BY order_index ASC"
    ))
    .bind(project_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(rows_to_milestones(rows)?))
}

#[utoipa::path(
    get,
    path = "/project-milestones/{id}",
    tag = "Milestones",
    params(("id" = Uuid, Path, description = "Milestone id")),
    responses((status = 200, description = "Milestone detail", body = Milestone))
)]
pub async fn get_milestone(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Milestone>> {
    authz::require_milestone_access(&state.pool, &auth, id).await?;

    let milestone = fetch_milestone(&state.pool, id).await?;
    Ok(Json(milestone.try_into()?))
}

/// Creates a milestone under the project. Caller-supplied status and
/// progress are discarded; a new milestone is always Pending at 0%. When
/// `order_index` is omitted it becomes `existing count + 1`. Positions are
/// never renormalized afterwards, so duplicates and gaps can occur.
#[utoipa::path(
    post,
    path = "/project-milestones/project/{project_id}",
    tag = "Milestones",
    params(("project_id" = Uuid, Path, description = "Parent project id")),
    request_body = MilestoneCreateRequest,
    responses((status = 201, description = "Milestone created", body = Milestone))
)]
pub async fn create_milestone(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<MilestoneCreateRequest>,
) -> AppResult<(StatusCode, Json<Milestone>)> {
    authz::require_project_access(&state.pool, &auth, project_id).await?;

    // The parent must exist even for privileged callers.
    super::projects::fetch_project(&state.pool, project_id).await?;

    let milestone = insert_milestone(&state, project_id, payload).await?;
    Ok((StatusCode::CREATED, Json(milestone.try_into()?)))
}

async fn insert_milestone(
    state: &AppState,
    project_id: Uuid,
    payload: MilestoneCreateRequest,
) -> AppResult<DbMilestone> {
    if payload.title.trim().is_empty() {
        return Err(AppError::bad_request("title is required"));
    }

    let order_index = match payload.order_index {
        Some(index) => index,
        None => {
            let count: i64 =
                sqlx::query_scalar("SELECT COUNT(1) FROM project_milestones WHERE project_id = ?")
                    .bind(project_id)
                    .fetch_one(&state.pool)
                    .await?;
            count + 1
        }
    };

    let milestone_id = Uuid::new_v4();
    let now = state.clock.now();

    sqlx::query(
        "INSERT INTO project_milestones (id, project_id, title, description, due_date, \
         completion_date, status, priority, progress_percentage, notes, order_index, \
         created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(milestone_id)
    .bind(project_id)
    .bind(payload.title.trim())
    .bind(&payload.description)
    .bind(payload.due_date)
    .bind(None::<chrono::NaiveDate>)
    .bind(MilestoneStatus::Pending.as_str())
    .bind(payload.priority.map(|p| p.as_str()))
    .bind(0.0_f64)
    .bind(&payload.notes)
    .bind(order_index)
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await?;

    fetch_milestone(&state.pool, milestone_id).await
}

/// Partial merge. Moving a milestone to Completed without supplying a
/// completion date stamps today's date and forces progress to 100, even
/// when the payload carries a different progress value.
#[utoipa::path(
    put,
    path = "/project-milestones/{id}",
    tag = "Milestones",
    params(("id" = Uuid, Path, description = "Milestone id")),
    request_body = MilestoneUpdateRequest,
    responses((status = 200, description = "Milestone updated", body = Milestone))
)]
pub async fn update_milestone(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<MilestoneUpdateRequest>,
) -> AppResult<Json<Milestone>> {
    authz::require_milestone_access(&state.pool, &auth, id).await?;

    let mut milestone = fetch_milestone(&state.pool, id).await?;

    if let Some(title) = &payload.title {
        if title.trim().is_empty() {
            return Err(AppError::bad_request("title must not be empty"));
        }
        milestone.title = title.trim().to_string();
    }
    if let Some(progress) = payload.progress_percentage {
        ensure_percentage(progress, "progress_percentage")?;
        milestone.progress_percentage = progress;
    }
    if let Some(status) = payload.status {
        milestone.status = status.as_str().to_string();
    }
    if let Some(priority) = payload.priority {
        milestone.priority = Some(priority.as_str().to_string());
    }
    if let Some(description) = payload.description {
        milestone.description = Some(description);
    }
    if let Some(due_date) = payload.due_date {
        milestone.due_date = Some(due_date);
    }
    if let Some(notes) = payload.notes {
        milestone.notes = Some(notes);
    }
    if let Some(order_index) = payload.order_index {
        milestone.order_index = order_index;
    }

    if milestone.status == MilestoneStatus::Completed.as_str() && milestone.completion_date.is_none() {
        milestone.completion_date = Some(state.clock.today());
        milestone.progress_percentage = 100.0;
    }

    let milestone = persist_milestone(&state.pool, milestone, state.clock.now()).await?;
    Ok(Json(milestone.try_into()?))
}

/// Marks the milestone Completed with today's date and 100% progress,
/// regardless of its current state. Only the owning student may call this.
#[utoipa::path(
    patch,
    path = "/project-milestones/{id}/complete",
    tag = "Milestones",
    params(("id" = Uuid, Path, description = "Milestone id")),
    responses((status = 200, description = "Milestone completed", body = Milestone))
)]
pub async fn complete_milestone(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Milestone>> {
    if !authz::is_milestone_owner(&state.pool, id, auth.user_id).await {
        return Err(AppError::forbidden("not the owner of this milestone"));
    }

    let mut milestone = fetch_milestone(&state.pool, id).await?;
    milestone.status = MilestoneStatus::Completed.as_str().to_string();
    milestone.completion_date = Some(state.clock.today());
    milestone.progress_percentage = 100.0;

    let milestone = persist_milestone(&state.pool, milestone, state.clock.now()).await?;
    Ok(Json(milestone.try_into()?))
}

#[utoipa::path(
    delete,
    path = "/project-milestones/{id}",
    tag = "Milestones",
    params(("id" = Uuid, Path, description = "Milestone id")),
    responses((status = 204, description = "Milestone deleted"))
)]
pub async fn delete_milestone(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if !auth.is_admin() && !authz::is_milestone_owner(&state.pool, id, auth.user_id).await {
        return Err(AppError::forbidden("not the owner of this milestone"));
    }

    let affected = sqlx::query("DELETE FROM project_milestones WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if affected.rows_affected() == 0 {
        return Err(AppError::not_found("milestone not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/project-milestones/project/{project_id}/status/{status}",
    tag = "Milestones",
    params(
        ("project_id" = Uuid, Path, description = "Parent project id"),
        ("status" = String, Path, description = "Milestone status literal")
    ),
    responses((status = 200, description = "Milestones with the given status", body = [Milestone]))
)]
pub async fn get_milestones_by_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, status)): Path<(Uuid, String)>,
) -> AppResult<Json<Vec<Milestone>>> {
    authz::require_project_access(&state.pool, &auth, project_id).await?;
    let status: MilestoneStatus = status.parse().map_err(AppError::bad_request)?;

    let rows = sqlx::query_as::<_, DbMilestone>(&format!(
        "SELECT {MILESTONE_COLUMNS} FROM project_milestones \
         WHERE project_id = ? AND status = ? ORDER BY order_index ASC"
    ))
    .bind(project_id)
    .bind(status.as_str())
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(rows_to_milestones(rows)?))
}

/// Milestones past their due date and not yet Completed, whatever their
/// stored status says.
#[utoipa::path(
    get,
    path = "/project-milestones/project/{project_id}/overdue",
    tag = "Milestones",
    params(("project_id" = Uuid, Path, description = "Parent project id")),
    responses((status = 200, description = "Overdue milestones", body = [Milestone]))
)]
pub async fn get_overdue_milestones(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
) -> AppResult<Json<Vec<Milestone>>> {
    authz::require_project_access(&state.pool, &auth, project_id).await?;

    let rows = sqlx::query_as::<_, DbMilestone>(&format!(
        "SELECT {MILESTONE_COLUMNS} FROM project_milestones \
         WHERE project_id = ? AND due_date < ? AND status != 'Completed' \
         ORDER BY due_date ASC"
    ))
    .bind(project_id)
    .bind(state.clock.today())
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(rows_to_milestones(rows)?))
}

/// Incomplete milestones due within the next week.
#[utoipa::path(
    get,
    path = "/project-milestones/project/{project_id}/due-soon",
    tag = "Milestones",
    params(("project_id" = Uuid, Path, description = "Parent project id")),
    responses((status = 200, description = "Milestones due soon", body = [Milestone]))
)]
pub async fn get_milestones_due_soon(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
) -> AppResult<Json<Vec<Milestone>>> {
    authz::require_project_access(&state.pool, &auth, project_id).await?;

    let today = state.clock.today();
    let horizon = today + Duration::days(DUE_SOON_WINDOW_DAYS);

    let rows = sqlx::query_as::<_, DbMilestone>(&format!(
        "SELECT {MILESTONE_COLUMNS} FROM project_milestones \
         WHERE project_id = ? AND due_date BETWEEN ? AND ? AND status != 'Completed' \
         ORDER BY due_date ASC"
    ))
    .bind(project_id)
    .bind(today)
    .bind(horizon)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(rows_to_milestones(rows)?))
}

/// Mean progress across the project's milestones; 0.0 when it has none.
#[utoipa::path(
    get,
    path = "/project-milestones/project/{project_id}/statistics/progress",
    tag = "Milestones",
    params(("project_id" = Uuid, Path, description = "Parent project id")),
    responses((status = 200, description = "Average milestone progress", body = f64))
)]
pub async fn get_average_milestone_progress(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
) -> AppResult<Json<f64>> {
    authz::require_project_access(&state.pool, &auth, project_id).await?;

    let average: Option<f64> = sqlx::query_scalar(
        "SELECT AVG(progress_percentage) FROM project_milestones WHERE project_id = ?",
    )
    .bind(project_id)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(average.unwrap_or(0.0)))
}

/// Share of Completed milestones as a percentage; 0.0 when the project has
/// no milestones.
#[utoipa::path(
    get,
    path = "/project-milestones/project/{project_id}/statistics/completion",
    tag = "Milestones",
    params(("project_id" = Uuid, Path, description = "Parent project id")),
    responses((status = 200, description = "Milestone completion rate", body = f64))
)]
pub async fn get_milestone_completion_rate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
) -> AppResult<Json<f64>> {
    authz::require_project_access(&state.pool, &auth, project_id).await?;

    let (total, completed): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(1), COALESCE(SUM(status = 'Completed'), 0) \
         FROM project_milestones WHERE project_id = ?",
    )
    .bind(project_id)
    .fetch_one(&state.pool)
    .await?;

    if total == 0 {
        return Ok(Json(0.0));
    }
    Ok(Json(completed as f64 / total as f64 * 100.0))
}

// -- helpers ----------------------------------------------------------------

async fn fetch_milestone(pool: &SqlitePool, id: Uuid) -> AppResult<DbMilestone> {
    sqlx::query_as::<_, DbMilestone>(&format!(
        "SELECT {MILESTONE_COLUMNS} FROM project_milestones WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("milestone not found"))
}

async fn persist_milestone(
    pool: &SqlitePool,
    mut milestone: DbMilestone,
    now: chrono::DateTime<chrono::Utc>,
) -> AppResult<DbMilestone> {
    milestone.updated_at = now;

    sqlx::query(
        "UPDATE project_milestones SET title = ?, description = ?, due_date = ?, \
         completion_date = ?, status = ?, priority = ?, progress_percentage = ?, notes = ?, \
         order_index = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&milestone.title)
    .bind(&milestone.description)
    .bind(milestone.due_date)
    .bind(milestone.completion_date)
    .bind(&milestone.status)
    .bind(&milestone.priority)
    .bind(milestone.progress_percentage)
    .bind(&milestone.notes)
    .bind(milestone.order_index)
    .bind(milestone.updated_at)
    .bind(milestone.id)
    .execute(pool)
    .await?;

    Ok(milestone)
}

fn rows_to_milestones(rows: Vec<DbMilestone>) -> AppResult<Vec<Milestone>> {
    rows.into_iter().map(Milestone::try_from).collect()
}
