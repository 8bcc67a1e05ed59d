use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Grade {
    pub id: Uuid,
    pub student_id: Uuid,
    pub subject_name: String,
    pub subject_code: Option<String>,
    pub grade_value: Option<f64>,
    pub letter_grade: Option<String>,
    pub credits: Option<i64>,
    pub semester: Option<String>,
    pub academic_year: Option<String>,
    pub evaluation_type: Option<String>,
    pub evaluation_date: Option<NaiveDate>,
    pub max_score: Option<f64>,
    pub obtained_score: Option<f64>,
    pub professor: Option<String>,
    pub comments: Option<String>,
    /// "Final", "Provisional" or "Under Review".
    pub status: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GradeCreateRequest {
    pub student_id: Uuid,
    #[schema(example = "Distributed Systems")]
    pub subject_name: String,
    pub subject_code: Option<String>,
    pub grade_value: Option<f64>,
    pub letter_grade: Option<String>,
    pub credits: Option<i64>,
    pub semester: Option<String>,
    pub academic_year: Option<String>,
    pub evaluation_type: Option<String>,
    pub evaluation_date: Option<NaiveDate>,
    pub max_score: Option<f64>,
    pub obtained_score: Option<f64>,
    pub professor: Option<String>,
    pub comments: Option<String>,
    pub status: Option<String>,
    pub is_published: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GradeUpdateRequest {
    pub subject_name: Option<String>,
    pub subject_code: Option<String>,
    pub grade_value: Option<f64>,
    pub letter_grade: Option<String>,
    pub credits: Option<i64>,
    pub semester: Option<String>,
    pub academic_year: Option<String>,
    pub evaluation_type: Option<String>,
    pub evaluation_date: Option<NaiveDate>,
    pub max_score: Option<f64>,
    pub obtained_score: Option<f64>,
    pub professor: Option<String>,
    pub comments: Option<String>,
    pub status: Option<String>,
    pub is_published: Option<bool>,
}
