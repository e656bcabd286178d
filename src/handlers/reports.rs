use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::report::{NewReport, SubmitReportRequest},
    services::moderation,
    utils::jwt::Claims,
};

/// Report a review or community post for moderator attention.
/// Type and reason are checked before anything touches the database.
pub async fn submit_report(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SubmitReportRequest>,
) -> Result<impl IntoResponse, AppError> {
    let report = NewReport::try_from(payload)?;
    let reporter_id = claims.user_id()?;

    let id = moderation::submit_report(&pool, reporter_id, &report).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": id, "message": "Report submitted" })),
    ))
}
