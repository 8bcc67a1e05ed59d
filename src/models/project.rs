use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;

pub const MAX_TITLE_LENGTH: usize = 200;

/// Project lifecycle status. The wire literals are fixed; existing clients
/// depend on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ProjectStatus {
    Active,
    Completed,
    Suspended,
    Cancelled,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "Active",
            ProjectStatus::Completed => "Completed",
            ProjectStatus::Suspended => "Suspended",
            ProjectStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Active" => Ok(ProjectStatus::Active),
            "Completed" => Ok(ProjectStatus::Completed),
            "Suspended" => Ok(ProjectStatus::Suspended),
            "Cancelled" => Ok(ProjectStatus::Cancelled),
            other => Err(format!("unknown project status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Project {
    pub id: Uuid,
    pub student_id: Uuid,
    pub topic_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub supervisor: Option<String>,
    pub co_supervisor: Option<String>,
    pub department: Option<String>,
    #[serde(rename = "type")]
    pub project_type: Option<String>,
    pub status: ProjectStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub expected_completion_date: Option<NaiveDate>,
    pub progress_percentage: f64,
    pub current_phase: Option<String>,
    pub objectives: Option<String>,
    pub methodology: Option<String>,
    pub expected_outcomes: Option<String>,
    pub current_challenges: Option<String>,
    pub next_steps: Option<String>,
    pub final_grade: Option<f64>,
    pub supervisor_feedback: Option<String>,
    pub presentation_date: Option<NaiveDate>,
    pub repository_url: Option<String>,
    pub documentation_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbProject {
    pub id: Uuid,
    pub student_id: Uuid,
    pub topic_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub supervisor: Option<String>,
    pub co_supervisor: Option<String>,
    pub department: Option<String>,
    pub project_type: Option<String>,
    pub status: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub expected_completion_date: Option<NaiveDate>,
    pub progress_percentage: f64,
    pub current_phase: Option<String>,
    pub objectives: Option<String>,
    pub methodology: Option<String>,
    pub expected_outcomes: Option<String>,
    pub current_challenges: Option<String>,
    pub next_steps: Option<String>,
    pub final_grade: Option<f64>,
    pub supervisor_feedback: Option<String>,
    pub presentation_date: Option<NaiveDate>,
    pub repository_url: Option<String>,
    pub documentation_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbProject> for Project {
    type Error = AppError;

    fn try_from(value: DbProject) -> Result<Self, Self::Error> {
        Ok(Project {
            id: value.id,
            student_id: value.student_id,
            topic_id: value.topic_id,
            title: value.title,
            description: value.description,
            supervisor: value.supervisor,
            co_supervisor: value.co_supervisor,
            department: value.department,
            project_type: value.project_type,
            status: value.status.parse().map_err(AppError::internal)?,
            start_date: value.start_date,
            end_date: value.end_date,
            expected_completion_date: value.expected_completion_date,
            progress_percentage: value.progress_percentage,
            current_phase: value.current_phase,
            objectives: value.objectives,
            methodology: value.methodology,
            expected_outcomes: value.expected_outcomes,
            current_challenges: value.current_challenges,
            next_steps: value.next_steps,
            final_grade: value.final_grade,
            supervisor_feedback: value.supervisor_feedback,
            presentation_date: value.presentation_date,
            repository_url: value.repository_url,
            documentation_url: value.documentation_url,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

/// Creation payload. `status` and `progress_percentage` are accepted for
/// wire compatibility but ignored: a new project is always Active at 0%.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ProjectCreateRequest {
    #[schema(example = "Anomaly detection in campus energy data")]
    pub title: String,
    pub description: Option<String>,
    pub supervisor: Option<String>,
    pub co_supervisor: Option<String>,
    pub department: Option<String>,
    #[serde(rename = "type")]
    pub project_type: Option<String>,
    pub topic_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub expected_completion_date: Option<NaiveDate>,
    pub current_phase: Option<String>,
    pub objectives: Option<String>,
    pub methodology: Option<String>,
    pub expected_outcomes: Option<String>,
    pub current_challenges: Option<String>,
    pub next_steps: Option<String>,
    pub repository_url: Option<String>,
    pub documentation_url: Option<String>,
    pub status: Option<String>,
    pub progress_percentage: Option<f64>,
}

/// Fields a student may change on their own active project. Absent fields
/// leave the stored value untouched.
#[derive(Debug, Deserialize, ToSchema)]
pub struct OwnProjectUpdateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub objectives: Option<String>,
    pub methodology: Option<String>,
    pub expected_outcomes: Option<String>,
    pub current_challenges: Option<String>,
    pub next_steps: Option<String>,
    pub repository_url: Option<String>,
    pub documentation_url: Option<String>,
    pub progress_percentage: Option<f64>,
    pub current_phase: Option<String>,
}

/// Full field set, available to admins and professors. Same
/// overwrite-if-present merge semantics as the student update.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ProjectUpdateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub supervisor: Option<String>,
    pub co_supervisor: Option<String>,
    pub department: Option<String>,
    #[serde(rename = "type")]
    pub project_type: Option<String>,
    pub status: Option<ProjectStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub expected_completion_date: Option<NaiveDate>,
    pub progress_percentage: Option<f64>,
    pub current_phase: Option<String>,
    pub objectives: Option<String>,
    pub methodology: Option<String>,
    pub expected_outcomes: Option<String>,
    pub current_challenges: Option<String>,
    pub next_steps: Option<String>,
    pub final_grade: Option<f64>,
    pub supervisor_feedback: Option<String>,
    pub presentation_date: Option<NaiveDate>,
    pub repository_url: Option<String>,
    pub documentation_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_literals_are_stable() {
        assert_eq!(ProjectStatus::Active.as_str(), "Active");
        assert_eq!("Cancelled".parse::<ProjectStatus>().unwrap(), ProjectStatus::Cancelled);
        assert!("active".parse::<ProjectStatus>().is_err());
    }

    #[test]
    fn status_serializes_to_bare_literal() {
        let json = serde_json::to_string(&ProjectStatus::Suspended).unwrap();
        assert_eq!(json, "\"Suspended\"");
    }
}
