use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub event_date: NaiveDate,
    pub event_time: Option<NaiveTime>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub location: Option<String>,
    /// "scheduled", "upcoming", "completed" or "cancelled".
    pub status: String,
    pub student_id: Option<Uuid>,
    pub is_public: bool,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct EventCreateRequest {
    #[schema(example = "PFE defense rehearsal")]
    pub title: String,
    pub description: Option<String>,
    pub event_date: NaiveDate,
    pub event_time: Option<NaiveTime>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
    /// Privileged callers may schedule an event for a specific student.
    pub student_id: Option<Uuid>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct EventUpdateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub event_time: Option<NaiveTime>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
    pub is_public: Option<bool>,
}
