use axum::{extract::State, Json};
use taskman_shared::api::DbHealthResponse;

use crate::error::AppError;
use crate::routes::AppState;

pub async fn health_check() -> &'static str {
    "OK"
}

/// GET /health/db
pub async fn db_status(
    State(state): State<AppState>,
) -> Result<Json<DbHealthResponse>, AppError> {
    let task_count = state.tasks.count().await?;

    Ok(Json(DbHealthResponse {
        status: "connected".to_string(),
        task_count,
    }))
}
