use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Topic {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub supervisor: String,
    pub department: Option<String>,
    #[serde(rename = "type")]
    pub topic_type: Option<String>,
    /// "Available", "Taken" or "Completed".
    pub status: String,
    pub max_students: i64,
    pub current_students: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Topic {
    pub fn is_available(&self) -> bool {
        self.status == "Available" && self.current_students < self.max_students
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct TopicApplication {
    pub id: Uuid,
    pub student_id: Uuid,
    pub topic_id: Uuid,
    pub motivation: Option<String>,
    /// "Pending", "Approved" or "Rejected".
    pub status: String,
    pub applied_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewer_comments: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TopicCreateRequest {
    #[schema(example = "Graph-based fraud detection")]
    pub title: String,
    pub description: Option<String>,
    pub supervisor: String,
    pub department: Option<String>,
    #[serde(rename = "type")]
    pub topic_type: Option<String>,
    pub max_students: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TopicUpdateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub supervisor: Option<String>,
    pub department: Option<String>,
    #[serde(rename = "type")]
    pub topic_type: Option<String>,
    pub status: Option<String>,
    pub max_students: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TopicApplyRequest {
    pub motivation: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApplicationReviewRequest {
    /// "Approved" or "Rejected".
    pub status: String,
    pub reviewer_comments: Option<String>,
}

impl ApplicationReviewRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        match self.status.as_str() {
            "Approved" | "Rejected" => Ok(()),
            other => Err(AppError::bad_request(format!(
                "review status must be Approved or Rejected, got {other}"
            ))),
        }
    }
}
