use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;

/// Milestone status. `Overdue` is a value callers may store; the overdue
/// *view* served by queries is derived from the due date instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum MilestoneStatus {
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
    Overdue,
}

impl MilestoneStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MilestoneStatus::Pending => "Pending",
            MilestoneStatus::InProgress => "In Progress",
            MilestoneStatus::Completed => "Completed",
            MilestoneStatus::Overdue => "Overdue",
        }
    }
}

impl fmt::Display for MilestoneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MilestoneStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Pending" => Ok(MilestoneStatus::Pending),
            "In Progress" => Ok(MilestoneStatus::InProgress),
            "Completed" => Ok(MilestoneStatus::Completed),
            "Overdue" => Ok(MilestoneStatus::Overdue),
            other => Err(format!("unknown milestone status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum MilestonePriority {
    Low,
    Medium,
    High,
    Critical,
}

impl MilestonePriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            MilestonePriority::Low => "Low",
            MilestonePriority::Medium => "Medium",
            MilestonePriority::High => "High",
            MilestonePriority::Critical => "Critical",
        }
    }
}

impl fmt::Display for MilestonePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MilestonePriority {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Low" => Ok(MilestonePriority::Low),
            "Medium" => Ok(MilestonePriority::Medium),
            "High" => Ok(MilestonePriority::High),
            "Critical" => Ok(MilestonePriority::Critical),
            other => Err(format!("unknown milestone priority: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Milestone {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub completion_date: Option<NaiveDate>,
    pub status: MilestoneStatus,
    pub priority: Option<MilestonePriority>,
    pub progress_percentage: f64,
    pub notes: Option<String>,
    pub order_index: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbMilestone {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub completion_date: Option<NaiveDate>,
    pub status: String,
    pub priority: Option<String>,
    pub progress_percentage: f64,
    pub notes: Option<String>,
    pub order_index: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbMilestone> for Milestone {
    type Error = AppError;

    fn try_from(value: DbMilestone) -> Result<Self, Self::Error> {
        let priority = value
            .priority
            .map(|raw| raw.parse().map_err(AppError::internal))
            .transpose()?;

        Ok(Milestone {
            id: value.id,
            project_id: value.project_id,
            title: value.title,
            description: value.description,
            due_date: value.due_date,
            completion_date: value.completion_date,
            status: value.status.parse().map_err(AppError::internal)?,
            priority,
            progress_percentage: value.progress_percentage,
            notes: value.notes,
            order_index: value.order_index,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

/// Creation payload. `status` and `progress_percentage` are accepted for
/// wire compatibility but ignored: a new milestone is always Pending at 0%.
/// When `order_index` is omitted it is assigned `existing count + 1`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MilestoneCreateRequest {
    #[schema(example = "Literature review")]
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<MilestonePriority>,
    pub notes: Option<String>,
    pub order_index: Option<i64>,
    pub status: Option<String>,
    pub progress_percentage: Option<f64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MilestoneUpdateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<MilestoneStatus>,
    pub priority: Option<MilestonePriority>,
    pub progress_percentage: Option<f64>,
    pub notes: Option<String>,
    pub order_index: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_progress_uses_spaced_literal() {
        assert_eq!(MilestoneStatus::InProgress.as_str(), "In Progress");
        assert_eq!(
            serde_json::to_string(&MilestoneStatus::InProgress).unwrap(),
            "\"In Progress\""
        );
        assert_eq!(
            serde_json::from_str::<MilestoneStatus>("\"In Progress\"").unwrap(),
            MilestoneStatus::InProgress
        );
    }

    #[test]
    fn priority_literals() {
        assert_eq!("Critical".parse::<MilestonePriority>().unwrap(), MilestonePriority::Critical);
        assert!("critical".parse::<MilestonePriority>().is_err());
    }
}
