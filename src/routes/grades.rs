use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::app::AppState;
use crate::authz;
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::grade::{Grade, GradeCreateRequest, GradeUpdateRequest};

#[utoipa::path(
    get,
    path = "/grades",
    tag = "Grades",
    responses((status = 200, description = "All grades", body = [Grade]))
)]
pub async fn list_grades(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<Vec<Grade>>> {
    authz::require_privileged(&auth)?;

    let grades: Vec<Grade> = sqlx::query_as(
        "SELECT * FROM grades ORDER BY evaluation_date DESC, created_at DESC",
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(grades))
}

#[derive(Debug, Deserialize)]
pub struct MyGradesQuery {
    pub semester: Option<String>,
    pub academic_year: Option<String>,
}

/// Students only ever see grades that have been published. Optional
/// semester and academic-year filters narrow the listing.
#[utoipa::path(
    get,
    path = "/grades/my",
    tag = "Grades",
    responses((status = 200, description = "The caller's published grades", body = [Grade]))
)]
pub async fn list_my_grades(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<MyGradesQuery>,
) -> AppResult<Json<Vec<Grade>>> {
    authz::require_student(&auth)?;

    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT * FROM grades WHERE is_published = 1 AND student_id = ");
    qb.push_bind(auth.user_id);
    if let Some(semester) = &query.semester {
        qb.push(" AND semester = ").push_bind(semester.clone());
    }
    if let Some(academic_year) = &query.academic_year {
        qb.push(" AND academic_year = ").push_bind(academic_year.clone());
    }
    qb.push(" ORDER BY evaluation_date DESC, created_at DESC");

    let grades = qb.build_query_as::<Grade>().fetch_all(&state.pool).await?;
    Ok(Json(grades))
}

/// Credit-weighted mean over the caller's published grades; grades missing
/// a value or credits are skipped. 0.0 when nothing qualifies.
#[utoipa::path(
    get,
    path = "/grades/my/gpa",
    tag = "Grades",
    responses((status = 200, description = "Weighted grade average", body = f64))
)]
pub async fn get_my_gpa(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<f64>> {
    authz::require_student(&auth)?;

    let rows: Vec<(f64, i64)> = sqlx::query_as(
        "SELECT grade_value, credits FROM grades \
         WHERE student_id = ? AND is_published = 1 \
         AND grade_value IS NOT NULL AND credits IS NOT NULL",
    )
    .bind(auth.user_id)
    .fetch_all(&state.pool)
    .await?;

    let total_credits: i64 = rows.iter().map(|(_, credits)| credits).sum();
    if total_credits == 0 {
        return Ok(Json(0.0));
    }
    let weighted: f64 = rows.iter().map(|(value, credits)| value * *credits as f64).sum();

    Ok(Json(weighted / total_credits as f64))
}

#[utoipa::path(
    get,
    path = "/grades/student/{student_id}",
    tag = "Grades",
    params(("student_id" = Uuid, Path, description = "Student id")),
    responses((status = 200, description = "All grades for the student", body = [Grade]))
)]
pub async fn list_student_grades(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(student_id): Path<Uuid>,
) -> AppResult<Json<Vec<Grade>>> {
    authz::require_privileged(&auth)?;

    let grades: Vec<Grade> = sqlx::query_as(
        "SELECT * FROM grades WHERE student_id = ? \
         ORDER BY evaluation_date DESC, created_at DESC",
    )
    .bind(student_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(grades))
}

#[utoipa::path(
    post,
    path = "/grades",
    tag = "Grades",
    request_body = GradeCreateRequest,
    responses((status = 201, description = "Grade recorded", body = Grade))
)]
pub async fn create_grade(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<GradeCreateRequest>,
) -> AppResult<(StatusCode, Json<Grade>)> {
    authz::require_privileged(&auth)?;

    if payload.subject_name.trim().is_empty() {
        return Err(AppError::bad_request("subject_name is required"));
    }

    let grade_id = Uuid::new_v4();
    let now = state.clock.now();

    sqlx::query(
        "INSERT INTO grades (id, student_id, subject_name, subject_code, grade_value, \
         letter_grade, credits, semester, academic_year, evaluation_type, evaluation_date, \
         max_score, obtained_score, professor, comments, status, is_published, created_at, \
         updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(grade_id)
    .bind(payload.student_id)
    .bind(payload.subject_name.trim())
    .bind(&payload.subject_code)
    .bind(payload.grade_value)
    .bind(&payload.letter_grade)
    .bind(payload.credits)
    .bind(&payload.semester)
    .bind(&payload.academic_year)
    .bind(&payload.evaluation_type)
    .bind(payload.evaluation_date)
    .bind(payload.max_score)
    .bind(payload.obtained_score)
    .bind(&payload.professor)
    .bind(&payload.comments)
    .bind(&payload.status)
    .bind(payload.is_published.unwrap_or(false))
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await?;

    Ok((StatusCode::CREATED, Json(fetch_grade(&state.pool, grade_id).await?)))
}

#[utoipa::path(
    put,
    path = "/grades/{id}",
    tag = "Grades",
    params(("id" = Uuid, Path, description = "Grade id")),
    request_body = GradeUpdateRequest,
    responses((status = 200, description = "Grade updated", body = Grade))
)]
pub async fn update_grade(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<GradeUpdateRequest>,
) -> AppResult<Json<Grade>> {
    authz::require_privileged(&auth)?;

    let mut grade = fetch_grade(&state.pool, id).await?;

    if let Some(subject_name) = &payload.subject_name {
        if subject_name.trim().is_empty() {
            return Err(AppError::bad_request("subject_name must not be empty"));
        }
        grade.subject_name = subject_name.trim().to_string();
    }
    if let Some(value) = payload.grade_value {
        grade.grade_value = Some(value);
    }
    if let Some(letter) = payload.letter_grade {
        grade.letter_grade = Some(letter);
    }
    if let Some(code) = payload.subject_code {
        grade.subject_code = Some(code);
    }
    if let Some(credits) = payload.credits {
        grade.credits = Some(credits);
    }
    if let Some(semester) = payload.semester {
        grade.semester = Some(semester);
    }
    if let Some(year) = payload.academic_year {
        grade.academic_year = Some(year);
    }
    if let Some(kind) = payload.evaluation_type {
        grade.evaluation_type = Some(kind);
    }
    if let Some(date) = payload.evaluation_date {
        grade.evaluation_date = Some(date);
    }
    if let Some(max_score) = payload.max_score {
        grade.max_score = Some(max_score);
    }
    if let Some(obtained) = payload.obtained_score {
        grade.obtained_score = Some(obtained);
    }
    if let Some(professor) = payload.professor {
        grade.professor = Some(professor);
    }
    if let Some(comments) = payload.comments {
        grade.comments = Some(comments);
    }
    if let Some(status) = payload.status {
        grade.status = Some(status);
    }
    if let Some(published) = payload.is_published {
        grade.is_published = published;
    }

    sqlx::query(
        "UPDATE grades SET subject_name = ?, subject_code = ?, grade_value = ?, letter_grade = ?, \
         credits = ?, semester = ?, academic_year = ?, evaluation_type = ?, evaluation_date = ?, \
         max_score = ?, obtained_score = ?, professor = ?, comments = ?, status = ?, \
         is_published = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&grade.subject_name)
    .bind(&grade.subject_code)
    .bind(grade.grade_value)
    .bind(&grade.letter_grade)
    .bind(grade.credits)
    .bind(&grade.semester)
    .bind(&grade.academic_year)
    .bind(&grade.evaluation_type)
    .bind(grade.evaluation_date)
    .bind(grade.max_score)
    .bind(grade.obtained_score)
    .bind(&grade.professor)
    .bind(&grade.comments)
    .bind(&grade.status)
    .bind(grade.is_published)
    .bind(state.clock.now())
    .bind(grade.id)
    .execute(&state.pool)
    .await?;

    Ok(Json(fetch_grade(&state.pool, id).await?))
}

#[utoipa::path(
    delete,
    path = "/grades/{id}",
    tag = "Grades",
    params(("id" = Uuid, Path, description = "Grade id")),
    responses((status = 204, description = "Grade deleted"))
)]
pub async fn delete_grade(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    authz::require_privileged(&auth)?;

    let affected = sqlx::query("DELETE FROM grades WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if affected.rows_affected() == 0 {
        return Err(AppError::not_found("grade not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_grade(pool: &SqlitePool, id: Uuid) -> AppResult<Grade> {
    sqlx::query_as("SELECT * FROM grades WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("grade not found"))
}
