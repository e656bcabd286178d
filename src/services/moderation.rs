//! Report intake and admin status changes.

use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    error::AppError,
    models::report::{NewReport, ReportResponse, ReportRow, ReportStatus, ReportTarget},
};

const REPORT_SELECT: &str = r#"
    SELECT
        r.id, r.reporter_id,
        u.username AS reporter_username,
        u.email AS reporter_email,
        r.target_type, r.ref_id, r.reason, r.comment, r.status,
        r.created_at, r.updated_at
"#;

/// Checks that the reported review or community post exists.
async fn ensure_target_exists(pool: &PgPool, target: ReportTarget) -> Result<(), AppError> {
    let sql = format!("SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1)", target.table());
    let exists = sqlx::query_scalar::<_, bool>(&sql)
        .bind(target.id())
        .fetch_one(pool)
        .await?;

    if !exists {
        let what = match target {
            ReportTarget::Review(_) => "Review",
            ReportTarget::CommunityPost(_) => "Community post",
        };
        return Err(AppError::NotFound(format!("{} not found", what)));
    }
    Ok(())
}

/// Files a new `pending` report and returns its id.
pub async fn submit_report(
    pool: &PgPool,
    reporter_id: i64,
    report: &NewReport,
) -> Result<i64, AppError> {
    ensure_target_exists(pool, report.target).await?;

    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO reports (reporter_id, target_type, ref_id, reason, comment)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(reporter_id)
    .bind(report.target.kind())
    .bind(report.target.id())
    .bind(report.reason)
    .bind(&report.comment)
    .fetch_one(pool)
    .await?;

    tracing::info!(report_id = id, reporter_id, reported = ?report.target, "Report submitted");

    Ok(id)
}

/// All reports, newest first, optionally restricted to one status.
pub async fn list_reports(
    pool: &PgPool,
    status: Option<ReportStatus>,
) -> Result<Vec<ReportResponse>, AppError> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(REPORT_SELECT);
    builder.push(" FROM reports r JOIN users u ON u.id = r.reporter_id");
    if let Some(status) = status {
        builder.push(" WHERE r.status = ");
        builder.push_bind(status);
    }
    builder.push(" ORDER BY r.created_at DESC, r.id DESC");

    let rows = builder.build_query_as::<ReportRow>().fetch_all(pool).await?;

    Ok(rows.into_iter().map(ReportResponse::from).collect())
}

/// Relabels a report. Every status is reachable from every other one,
/// and setting the current status again is a no-op.
pub async fn set_report_status(
    pool: &PgPool,
    report_id: i64,
    status: ReportStatus,
) -> Result<ReportResponse, AppError> {
    let sql = format!(
        r#"
        WITH updated AS (
            UPDATE reports SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
        )
        {REPORT_SELECT}
        FROM updated r
        JOIN users u ON u.id = r.reporter_id
        "#
    );

    let row = sqlx::query_as::<_, ReportRow>(&sql)
        .bind(report_id)
        .bind(status)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Report not found".to_string()))?;

    tracing::info!(report_id, status = %status, "Report status updated");

    Ok(row.into())
}

pub async fn pending_count(pool: &PgPool) -> Result<i64, AppError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM reports WHERE status = 'pending'",
    )
    .fetch_one(pool)
    .await?;
    Ok(count)
}
