use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Report {
    pub id: Uuid,
    pub student_id: Uuid,
    pub title: String,
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub report_type: Option<String>,
    /// "Draft", "Submitted" or "Reviewed".
    pub status: String,
    pub submitted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReportCreateRequest {
    #[schema(example = "Mid-term progress report")]
    pub title: String,
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub report_type: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReportUpdateRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub report_type: Option<String>,
}
