use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Achievement {
    pub id: Uuid,
    pub student_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub achievement_type: Option<String>,
    pub issuing_organization: Option<String>,
    pub achievement_date: Option<NaiveDate>,
    /// "Verified", "Pending" or "Rejected".
    pub status: String,
    pub points_awarded: Option<i64>,
    pub category: Option<String>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AchievementCreateRequest {
    #[schema(example = "Best poster award")]
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub achievement_type: Option<String>,
    pub issuing_organization: Option<String>,
    pub achievement_date: Option<NaiveDate>,
    pub points_awarded: Option<i64>,
    pub category: Option<String>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AchievementUpdateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub achievement_type: Option<String>,
    pub issuing_organization: Option<String>,
    pub achievement_date: Option<NaiveDate>,
    pub points_awarded: Option<i64>,
    pub category: Option<String>,
    pub is_public: Option<bool>,
}
