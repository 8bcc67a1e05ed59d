use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Per-student preferences. One row per user, created lazily with defaults
/// on first read.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct StudentSettings {
    pub id: Uuid,
    pub user_id: Uuid,
    pub email_notifications: bool,
    pub push_notifications: bool,
    pub grade_notifications: bool,
    pub deadline_reminders: bool,
    /// "light", "dark" or "system".
    pub theme: String,
    pub language: String,
    pub font_size: String,
    pub compact_mode: bool,
    pub default_calendar_view: String,
    pub grade_display_format: String,
    pub auto_save_reports: bool,
    pub reminder_advance_days: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SettingsUpdateRequest {
    pub email_notifications: Option<bool>,
    pub push_notifications: Option<bool>,
    pub grade_notifications: Option<bool>,
    pub deadline_reminders: Option<bool>,
    pub theme: Option<String>,
    pub language: Option<String>,
    pub font_size: Option<String>,
    pub compact_mode: Option<bool>,
    pub default_calendar_view: Option<String>,
    pub grade_display_format: Option<String>,
    pub auto_save_reports: Option<bool>,
    pub reminder_advance_days: Option<i64>,
}
