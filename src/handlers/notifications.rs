use axum::{Json, extract::State, response::IntoResponse};
use sqlx::PgPool;
use validator::Validate;

use crate::{error::AppError, models::notification::BroadcastRequest, services::notifications};

/// Fan a notification out to every user subscribed to its type.
/// Admin only.
pub async fn broadcast(
    State(pool): State<PgPool>,
    Json(payload): Json<BroadcastRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let created = notifications::broadcast(&pool, &payload).await?;

    Ok(Json(serde_json::json!({ "created": created })))
}
