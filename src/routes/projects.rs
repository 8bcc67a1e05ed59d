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
use crate::models::project::{
    DbProject, OwnProjectUpdateRequest, Project, ProjectCreateRequest, ProjectStatus,
    ProjectUpdateRequest, MAX_TITLE_LENGTH,
};
use crate::utils::ensure_percentage;

const PROJECT_COLUMNS: &str = "id, student_id, topic_id, title, description, supervisor, \
    co_supervisor, department, project_type, status, start_date, end_date, \
    expected_completion_date, progress_percentage, current_phase, objectives, methodology, \
    expected_outcomes, current_challenges, next_steps, final_grade, supervisor_feedback, \
    presentation_date, repository_url, documentation_url, created_at, updated_at";

const DUE_SOON_WINDOW_DAYS: i64 = 14;

#[derive(Debug, Deserialize)]
pub struct ProjectListQuery {
    pub status: Option<ProjectStatus>,
    #[serde(rename = "type")]
    pub project_type: Option<String>,
    pub department: Option<String>,
    pub supervisor: Option<String>,
    pub phase: Option<String>,
    pub keyword: Option<String>,
}

/// All supplied filters are AND-ed; an omitted parameter matches
/// everything. Keyword is a case-sensitive substring match, OR-ed across
/// title, description, supervisor and department.
#[utoipa::path(
    get,
    path = "/projects",
    tag = "Projects",
    responses((status = 200, description = "List projects", body = [Project]))
)]
pub async fn list_projects(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ProjectListQuery>,
) -> AppResult<Json<Vec<Project>>> {
    authz::require_privileged(&auth)?;

    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE 1=1"));

    if let Some(status) = query.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(project_type) = &query.project_type {
        qb.push(" AND project_type = ").push_bind(project_type.clone());
    }
    if let Some(department) = &query.department {
        qb.push(" AND department = ").push_bind(department.clone());
    }
    if let Some(supervisor) = &query.supervisor {
        qb.push(" AND supervisor = ").push_bind(supervisor.clone());
    }
    if let Some(phase) = &query.phase {
        qb.push(" AND current_phase = ").push_bind(phase.clone());
    }
    if let Some(keyword) = &query.keyword {
        push_keyword_filter(&mut qb, keyword);
    }
    qb.push(" ORDER BY created_at DESC");

    let rows = qb.build_query_as::<DbProject>().fetch_all(&state.pool).await?;
    Ok(Json(rows_to_projects(rows)?))
}

#[utoipa::path(
    get,
    path = "/projects/my-project",
    tag = "Projects",
    responses((status = 200, description = "Caller's active project", body = Project))
)]
pub async fn get_my_project(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<Project>> {
    authz::require_student(&auth)?;

    let project = fetch_active_project(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("no active project"))?;

    Ok(Json(project.try_into()?))
}

#[utoipa::path(
    get,
    path = "/projects/my-projects",
    tag = "Projects",
    responses((status = 200, description = "All of the caller's projects", body = [Project]))
)]
pub async fn get_my_projects(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<Vec<Project>>> {
    authz::require_student(&auth)?;

    let rows = sqlx::query_as::<_, DbProject>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE student_id = ? ORDER BY created_at DESC"
    ))
    .bind(auth.user_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(rows_to_projects(rows)?))
}

#[utoipa::path(
    get,
    path = "/projects/{id}",
    tag = "Projects",
    params(("id" = Uuid, Path, description = "Project id")),
    responses((status = 200, description = "Project detail", body = Project))
)]
pub async fn get_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Project>> {
    authz::require_project_access(&state.pool, &auth, id).await?;

    let project = fetch_project(&state.pool, id).await?;
    Ok(Json(project.try_into()?))
}

/// Creates the caller's project. The status and progress supplied by the
/// caller are discarded: every new project starts Active at 0%.
#[utoipa::path(
    post,
    path = "/projects",
    tag = "Projects",
    request_body = ProjectCreateRequest,
    responses(
        (status = 201, description = "Project created", body = Project),
        (status = 409, description = "An active project already exists")
    )
)]
pub async fn create_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<ProjectCreateRequest>,
) -> AppResult<(StatusCode, Json<Project>)> {
    authz::require_student(&auth)?;
    validate_title(&payload.title)?;

    let project_id = Uuid::new_v4();
    let now = state.clock.now();

    // The pre-check gives the common sequential case a clean conflict; the
    // partial unique index on (student_id) WHERE status='Active' is the
    // authoritative guard and catches concurrent create attempts.
    let existing: Option<Uuid> =
        sqlx::query_scalar("SELECT id FROM projects WHERE student_id = ? AND status = 'Active'")
            .bind(auth.user_id)
            .fetch_optional(&state.pool)
            .await?;
    if existing.is_some() {
        return Err(AppError::conflict("student already has an active project"));
    }

    sqlx::query(
        "INSERT INTO projects (id, student_id, topic_id, title, description, supervisor, \
         co_supervisor, department, project_type, status, start_date, end_date, \
         expected_completion_date, progress_percentage, current_phase, objectives, methodology, \
         expected_outcomes, current_challenges, next_steps, repository_url, documentation_url, \
         created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(project_id)
    .bind(auth.user_id)
    .bind(payload.topic_id)
    .bind(payload.title.trim())
    .bind(&payload.description)
    .bind(&payload.supervisor)
    .bind(&payload.co_supervisor)
    .bind(&payload.department)
    .bind(&payload.project_type)
    .bind(ProjectStatus::Active.as_str())
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.expected_completion_date)
    .bind(0.0_f64)
    .bind(&payload.current_phase)
    .bind(&payload.objectives)
    .bind(&payload.methodology)
    .bind(&payload.expected_outcomes)
    .bind(&payload.current_challenges)
    .bind(&payload.next_steps)
    .bind(&payload.repository_url)
    .bind(&payload.documentation_url)
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await
    .map_err(|err| match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::conflict("student already has an active project")
        }
        _ => AppError::Database(err),
    })?;

    let project = fetch_project(&state.pool, project_id).await?;
    Ok((StatusCode::CREATED, Json(project.try_into()?)))
}

/// Partial merge over the fields a student may touch on their own active
/// project; absent fields keep their stored value.
#[utoipa::path(
    put,
    path = "/projects/my-project",
    tag = "Projects",
    request_body = OwnProjectUpdateRequest,
    responses((status = 200, description = "Project updated", body = Project))
)]
pub async fn update_my_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<OwnProjectUpdateRequest>,
) -> AppResult<Json<Project>> {
    authz::require_student(&auth)?;

    let mut project = fetch_active_project(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("no active project"))?;

    if let Some(title) = &payload.title {
        validate_title(title)?;
        project.title = title.trim().to_string();
    }
    if let Some(progress) = payload.progress_percentage {
        ensure_percentage(progress, "progress_percentage")?;
        project.progress_percentage = progress;
    }
    merge_option(&mut project.description, payload.description);
    merge_option(&mut project.objectives, payload.objectives);
    merge_option(&mut project.methodology, payload.methodology);
    merge_option(&mut project.expected_outcomes, payload.expected_outcomes);
    merge_option(&mut project.current_challenges, payload.current_challenges);
    merge_option(&mut project.next_steps, payload.next_steps);
    merge_option(&mut project.repository_url, payload.repository_url);
    merge_option(&mut project.documentation_url, payload.documentation_url);
    merge_option(&mut project.current_phase, payload.current_phase);

    let project = persist_project(&state.pool, project, state.clock.now()).await?;
    Ok(Json(project.try_into()?))
}

/// Admin/professor update over the full field set, including supervision,
/// status, dates and grading.
#[utoipa::path(
    put,
    path = "/projects/{id}",
    tag = "Projects",
    params(("id" = Uuid, Path, description = "Project id")),
    request_body = ProjectUpdateRequest,
    responses((status = 200, description = "Project updated", body = Project))
)]
pub async fn update_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProjectUpdateRequest>,
) -> AppResult<Json<Project>> {
    authz::require_privileged(&auth)?;

    let mut project = fetch_project(&state.pool, id).await?;

    if let Some(title) = &payload.title {
        validate_title(title)?;
        project.title = title.trim().to_string();
    }
    if let Some(status) = payload.status {
        project.status = status.as_str().to_string();
    }
    if let Some(progress) = payload.progress_percentage {
        ensure_percentage(progress, "progress_percentage")?;
        project.progress_percentage = progress;
    }
    merge_option(&mut project.description, payload.description);
    merge_option(&mut project.supervisor, payload.supervisor);
    merge_option(&mut project.co_supervisor, payload.co_supervisor);
    merge_option(&mut project.department, payload.department);
    merge_option(&mut project.project_type, payload.project_type);
    merge_option(&mut project.start_date, payload.start_date);
    merge_option(&mut project.end_date, payload.end_date);
    merge_option(&mut project.expected_completion_date, payload.expected_completion_date);
    merge_option(&mut project.current_phase, payload.current_phase);
    merge_option(&mut project.objectives, payload.objectives);
    merge_option(&mut project.methodology, payload.methodology);
    merge_option(&mut project.expected_outcomes, payload.expected_outcomes);
    merge_option(&mut project.current_challenges, payload.current_challenges);
    merge_option(&mut project.next_steps, payload.next_steps);
    merge_option(&mut project.final_grade, payload.final_grade);
    merge_option(&mut project.supervisor_feedback, payload.supervisor_feedback);
    merge_option(&mut project.presentation_date, payload.presentation_date);
    merge_option(&mut project.repository_url, payload.repository_url);
    merge_option(&mut project.documentation_url, payload.documentation_url);

    let project = persist_project(&state.pool, project, state.clock.now()).await?;
    Ok(Json(project.try_into()?))
}

/// Admin-only. Milestones are removed in the same transaction; there is no
/// reliance on foreign-key cascade pragmas.
#[utoipa::path(
    delete,
    path = "/projects/{id}",
    tag = "Projects",
    params(("id" = Uuid, Path, description = "Project id")),
    responses((status = 204, description = "Project and its milestones deleted"))
)]
pub async fn delete_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    authz::require_admin(&auth)?;

    let mut tx = state.pool.begin().await?;

    sqlx::query("DELETE FROM project_milestones WHERE project_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let affected = sqlx::query("DELETE FROM projects WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    if affected.rows_affected() == 0 {
        return Err(AppError::not_found("project not found"));
    }

    tx.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/projects/status/{status}",
    tag = "Projects",
    params(("status" = String, Path, description = "Project status literal")),
    responses((status = 200, description = "Projects with the given status", body = [Project]))
)]
pub async fn get_projects_by_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(status): Path<String>,
) -> AppResult<Json<Vec<Project>>> {
    authz::require_privileged(&auth)?;
    let status: ProjectStatus = status.parse().map_err(AppError::bad_request)?;

    let rows = sqlx::query_as::<_, DbProject>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE status = ? ORDER BY created_at DESC"
    ))
    .bind(status.as_str())
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(rows_to_projects(rows)?))
}

#[utoipa::path(
    get,
    path = "/projects/department/{department}",
    tag = "Projects",
    params(("department" = String, Path, description = "Department name")),
    responses((status = 200, description = "Projects in the department", body = [Project]))
)]
pub async fn get_projects_by_department(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(department): Path<String>,
) -> AppResult<Json<Vec<Project>>> {
    authz::require_privileged(&auth)?;

    let rows = sqlx::query_as::<_, DbProject>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE department = ? ORDER BY created_at DESC"
    ))
    .bind(&department)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(rows_to_projects(rows)?))
}

#[utoipa::path(
    get,
    path = "/projects/supervisor/{supervisor}",
    tag = "Projects",
    params(("supervisor" = String, Path, description = "Supervisor name")),
    responses((status = 200, description = "Projects under the supervisor", body = [Project]))
)]
pub async fn get_projects_by_supervisor(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(supervisor): Path<String>,
) -> AppResult<Json<Vec<Project>>> {
    authz::require_privileged(&auth)?;

    let rows = sqlx::query_as::<_, DbProject>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE supervisor = ? ORDER BY created_at DESC"
    ))
    .bind(&supervisor)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(rows_to_projects(rows)?))
}

/// Active projects whose expected completion date has passed.
#[utoipa::path(
    get,
    path = "/projects/overdue",
    tag = "Projects",
    responses((status = 200, description = "Overdue active projects", body = [Project]))
)]
pub async fn get_overdue_projects(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<Vec<Project>>> {
    authz::require_privileged(&auth)?;

    let rows = sqlx::query_as::<_, DbProject>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects \
         WHERE status = 'Active' AND expected_completion_date < ? \
         ORDER BY expected_completion_date ASC"
    ))
    .bind(state.clock.today())
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(rows_to_projects(rows)?))
}

/// Active projects expected to complete within the next two weeks.
#[utoipa::path(
    get,
    path = "/projects/due-soon",
    tag = "Projects",
    responses((status = 200, description = "Active projects due soon", body = [Project]))
)]
pub async fn get_projects_due_soon(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<Vec<Project>>> {
    authz::require_privileged(&auth)?;

    let today = state.clock.today();
    let horizon = today + Duration::days(DUE_SOON_WINDOW_DAYS);

    let rows = sqlx::query_as::<_, DbProject>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects \
         WHERE status = 'Active' AND expected_completion_date BETWEEN ? AND ? \
         ORDER BY expected_completion_date ASC"
    ))
    .bind(today)
    .bind(horizon)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(rows_to_projects(rows)?))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub keyword: String,
}

#[utoipa::path(
    get,
    path = "/projects/search",
    tag = "Projects",
    params(("keyword" = String, Query, description = "Substring to search for")),
    responses((status = 200, description = "Matching projects", body = [Project]))
)]
pub async fn search_projects(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<Project>>> {
    authz::require_privileged(&auth)?;

    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE 1=1"));
    push_keyword_filter(&mut qb, &query.keyword);
    qb.push(" ORDER BY created_at DESC");

    let rows = qb.build_query_as::<DbProject>().fetch_all(&state.pool).await?;
    Ok(Json(rows_to_projects(rows)?))
}

/// Mean progress across Active projects; 0.0 when there are none.
#[utoipa::path(
    get,
    path = "/projects/statistics/average-progress",
    tag = "Projects",
    responses((status = 200, description = "Average progress of active projects", body = f64))
)]
pub async fn get_average_progress(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<f64>> {
    authz::require_privileged(&auth)?;

    let average: Option<f64> =
        sqlx::query_scalar("SELECT AVG(progress_percentage) FROM projects WHERE status = 'Active'")
            .fetch_one(&state.pool)
            .await?;

    Ok(Json(average.unwrap_or(0.0)))
}

#[utoipa::path(
    get,
    path = "/projects/statistics/count-by-status/{status}",
    tag = "Projects",
    params(("status" = String, Path, description = "Project status literal")),
    responses((status = 200, description = "Number of projects with the status", body = i64))
)]
pub async fn get_count_by_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(status): Path<String>,
) -> AppResult<Json<i64>> {
    authz::require_privileged(&auth)?;
    let status: ProjectStatus = status.parse().map_err(AppError::bad_request)?;

    let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM projects WHERE status = ?")
        .bind(status.as_str())
        .fetch_one(&state.pool)
        .await?;

    Ok(Json(count))
}

#[utoipa::path(
    get,
    path = "/projects/departments",
    tag = "Projects",
    responses((status = 200, description = "Distinct departments", body = [String]))
)]
pub async fn get_departments(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<Vec<String>>> {
    authz::require_privileged(&auth)?;

    let departments: Vec<String> = sqlx::query_scalar(
        "SELECT DISTINCT department FROM projects WHERE department IS NOT NULL ORDER BY department",
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(departments))
}

#[utoipa::path(
    get,
    path = "/projects/phases",
    tag = "Projects",
    responses((status = 200, description = "Distinct phases of active projects", body = [String]))
)]
pub async fn get_active_phases(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<Vec<String>>> {
    authz::require_privileged(&auth)?;

    let phases: Vec<String> = sqlx::query_scalar(
        "SELECT DISTINCT current_phase FROM projects \
         WHERE status = 'Active' AND current_phase IS NOT NULL ORDER BY current_phase",
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(phases))
}

// -- helpers ----------------------------------------------------------------

pub(crate) async fn fetch_project(pool: &SqlitePool, id: Uuid) -> AppResult<DbProject> {
    sqlx::query_as::<_, DbProject>(&format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("project not found"))
}

pub(crate) async fn fetch_active_project(pool: &SqlitePool, student_id: Uuid) -> AppResult<Option<DbProject>> {
    let project = sqlx::query_as::<_, DbProject>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE student_id = ? AND status = 'Active'"
    ))
    .bind(student_id)
    .fetch_optional(pool)
    .await?;

    Ok(project)
}

async fn persist_project(
    pool: &SqlitePool,
    mut project: DbProject,
    now: chrono::DateTime<chrono::Utc>,
) -> AppResult<DbProject> {
    project.updated_at = now;

    sqlx::query(
        "UPDATE projects SET title = ?, description = ?, supervisor = ?, co_supervisor = ?, \
         department = ?, project_type = ?, status = ?, start_date = ?, end_date = ?, \
         expected_completion_date = ?, progress_percentage = ?, current_phase = ?, \
         objectives = ?, methodology = ?, expected_outcomes = ?, current_challenges = ?, \
         next_steps = ?, final_grade = ?, supervisor_feedback = ?, presentation_date = ?, \
         repository_url = ?, documentation_url = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&project.title)
    .bind(&project.description)
    .bind(&project.supervisor)
    .bind(&project.co_supervisor)
    .bind(&project.department)
    .bind(&project.project_type)
    .bind(&project.status)
    .bind(project.start_date)
    .bind(project.end_date)
    .bind(project.expected_completion_date)
    .bind(project.progress_percentage)
    .bind(&project.current_phase)
    .bind(&project.objectives)
    .bind(&project.methodology)
    .bind(&project.expected_outcomes)
    .bind(&project.current_challenges)
    .bind(&project.next_steps)
    .bind(project.final_grade)
    .bind(&project.supervisor_feedback)
    .bind(project.presentation_date)
    .bind(&project.repository_url)
    .bind(&project.documentation_url)
    .bind(project.updated_at)
    .bind(project.id)
    .execute(pool)
    .await
    .map_err(|err| match &err {
        // Reactivating a project while the student already holds an Active
        // one trips the partial unique index; report it as a conflict.
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::conflict("student already has an active project")
        }
        _ => AppError::Database(err),
    })?;

    Ok(project)
}

fn validate_title(title: &str) -> AppResult<()> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppError::bad_request("title is required"));
    }
    if trimmed.chars().count() > MAX_TITLE_LENGTH {
        return Err(AppError::bad_request(format!(
            "title must be at most {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(())
}

fn merge_option<T>(target: &mut Option<T>, incoming: Option<T>) {
    if incoming.is_some() {
        *target = incoming;
    }
}

fn push_keyword_filter(qb: &mut QueryBuilder<'_, Sqlite>, keyword: &str) {
    // instr() is case-sensitive, unlike LIKE in SQLite.
    qb.push(" AND (instr(title, ");
    qb.push_bind(keyword.to_string());
    qb.push(") > 0 OR instr(coalesce(description, ''), ");
    qb.push_bind(keyword.to_string());
    qb.push(") > 0 OR instr(coalesce(supervisor, ''), ");
    qb.push_bind(keyword.to_string());
    qb.push(") > 0 OR instr(coalesce(department, ''), ");
    qb.push_bind(keyword.to_string());
    qb.push(") > 0)");
}

fn rows_to_projects(rows: Vec<DbProject>) -> AppResult<Vec<Project>> {
    rows.into_iter().map(Project::try_from).collect()
}
