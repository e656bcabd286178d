//! Notification fan-out and per-user notification inbox operations.

use sqlx::PgPool;

use crate::{
    config::NOTIFICATION_LIST_LIMIT,
    error::AppError,
    models::notification::{BroadcastRequest, NEW_RELEASE, NotificationResponse, NotificationRow},
};

/// Which preference flag selects the recipients of a broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    NewReleases,
    Updates,
}

impl Audience {
    /// `new_release` goes to release subscribers, every other type to
    /// update subscribers.
    pub fn for_type(kind: &str) -> Self {
        if kind == NEW_RELEASE {
            Audience::NewReleases
        } else {
            Audience::Updates
        }
    }

    pub fn preference_column(&self) -> &'static str {
        match self {
            Audience::NewReleases => "notify_new_releases",
            Audience::Updates => "notify_updates",
        }
    }
}

/// Creates one unread notification per opted-in user in a single statement
/// and returns how many were created.
pub async fn broadcast(pool: &PgPool, req: &BroadcastRequest) -> Result<u64, AppError> {
    if let Some(game_id) = req.related_game {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM games WHERE id = $1)")
            .bind(game_id)
            .fetch_one(pool)
            .await?;
        if !exists {
            return Err(AppError::NotFound("Related game not found".to_string()));
        }
    }

    let audience = Audience::for_type(&req.r#type);
    let sql = format!(
        r#"
        INSERT INTO notifications (user_id, game_id, title, message, type)
        SELECT id, $1, $2, $3, $4
        FROM users
        WHERE {} = TRUE
        "#,
        audience.preference_column()
    );

    let created = sqlx::query(&sql)
        .bind(req.related_game)
        .bind(&req.title)
        .bind(&req.message)
        .bind(&req.r#type)
        .execute(pool)
        .await?
        .rows_affected();

    tracing::info!(kind = %req.r#type, ?audience, created, "Broadcast delivered");

    Ok(created)
}

/// The caller's latest notifications, newest first.
pub async fn list_for_user(pool: &PgPool, user_id: i64) -> Result<Vec<NotificationResponse>, AppError> {
    let rows = sqlx::query_as::<_, NotificationRow>(
        r#"
        SELECT
            n.id, n.user_id, n.game_id,
            g.name AS game_name, g.slug AS game_slug,
            n.title, n.message, n.type, n.read, n.created_at
        FROM notifications n
        LEFT JOIN games g ON g.id = n.game_id
        WHERE n.user_id = $1
        ORDER BY n.created_at DESC, n.id DESC
        LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(NOTIFICATION_LIST_LIMIT)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(NotificationResponse::from).collect())
}

/// Marks one of the caller's notifications read. Already-read is a no-op;
/// a notification owned by someone else is reported as not found.
pub async fn mark_read(
    pool: &PgPool,
    user_id: i64,
    notification_id: i64,
) -> Result<NotificationResponse, AppError> {
    let row = sqlx::query_as::<_, NotificationRow>(
        r#"
        WITH updated AS (
            UPDATE notifications SET read = TRUE
            WHERE id = $1 AND user_id = $2
            RETURNING *
        )
        SELECT
            n.id, n.user_id, n.game_id,
            g.name AS game_name, g.slug AS game_slug,
            n.title, n.message, n.type, n.read, n.created_at
        FROM updated n
        LEFT JOIN games g ON g.id = n.game_id
        "#,
    )
    .bind(notification_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Notification not found".to_string()))?;

    Ok(row.into())
}

/// Marks every unread notification of the caller read; returns how many flipped.
pub async fn mark_all_read(pool: &PgPool, user_id: i64) -> Result<u64, AppError> {
    let result = sqlx::query("UPDATE notifications SET read = TRUE WHERE user_id = $1 AND read = FALSE")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
