//! Ownership checks and role pre-conditions.
//!
//! Every mutating handler calls these explicitly before touching the
//! store. The ownership predicates are pure reads and fail closed: a
//! missing row or a database error yields `false`, never an error.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::user::Role;

/// True when `user_id` is the student that owns `project_id`.
pub async fn is_project_owner(pool: &SqlitePool, project_id: Uuid, user_id: Uuid) -> bool {
    let owner: Result<Option<Uuid>, _> =
        sqlx::query_scalar("SELECT student_id FROM projects WHERE id = ?")
            .bind(project_id)
            .fetch_optional(pool)
            .await;

    matches!(owner, Ok(Some(student_id)) if student_id == user_id)
}

/// Milestone ownership is transitive through the parent project's student.
pub async fn is_milestone_owner(pool: &SqlitePool, milestone_id: Uuid, user_id: Uuid) -> bool {
    let owner: Result<Option<Uuid>, _> = sqlx::query_scalar(
        "SELECT p.student_id FROM project_milestones m \
         JOIN projects p ON p.id = m.project_id \
         WHERE m.id = ?",
    )
    .bind(milestone_id)
    .fetch_optional(pool)
    .await;

    matches!(owner, Ok(Some(student_id)) if student_id == user_id)
}

pub fn require_student(auth: &AuthUser) -> AppResult<()> {
    if auth.role != Role::Student {
        return Err(AppError::forbidden("student role required"));
    }
    Ok(())
}

pub fn require_privileged(auth: &AuthUser) -> AppResult<()> {
    if !auth.is_privileged() {
        return Err(AppError::forbidden("admin or professor role required"));
    }
    Ok(())
}

pub fn require_admin(auth: &AuthUser) -> AppResult<()> {
    if !auth.is_admin() {
        return Err(AppError::forbidden("admin role required"));
    }
    Ok(())
}

/// Privileged callers pass unconditionally; students must own the project.
pub async fn require_project_access(pool: &SqlitePool, auth: &AuthUser, project_id: Uuid) -> AppResult<()> {
    if auth.is_privileged() || is_project_owner(pool, project_id, auth.user_id).await {
        return Ok(());
    }
    Err(AppError::forbidden("not the owner of this project"))
}

/// Privileged callers pass unconditionally; students must own the
/// milestone's parent project.
pub async fn require_milestone_access(pool: &SqlitePool, auth: &AuthUser, milestone_id: Uuid) -> AppResult<()> {
    if auth.is_privileged() || is_milestone_owner(pool, milestone_id, auth.user_id).await {
        return Ok(());
    }
    Err(AppError::forbidden("not the owner of this milestone"))
}
