use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::errors::AppResult;

/// Liveness plus a database round-trip.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, description = "Service is healthy"))
)]
pub async fn health(State(state): State<AppState>) -> AppResult<Json<Value>> {
    sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(&state.pool).await?;
    Ok(Json(json!({ "status": "ok" })))
}
