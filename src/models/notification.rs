use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::news::RelatedGame;

/// Notification type that targets users opted into new-release alerts.
pub const NEW_RELEASE: &str = "new_release";

/// Represents the 'notifications' table joined with the related game.
#[derive(Debug, Clone, FromRow)]
pub struct NotificationRow {
    pub id: i64,
    pub user_id: i64,
    pub game_id: Option<i64>,
    pub game_name: Option<String>,
    pub game_slug: Option<String>,
    pub title: String,
    pub message: String,
    #[sqlx(rename = "type")]
    pub r#type: String,
    pub read: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationResponse {
    pub id: i64,
    pub user_id: i64,
    pub related_game: Option<RelatedGame>,
    pub title: String,
    pub message: String,
    pub r#type: String,
    pub read: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<NotificationRow> for NotificationResponse {
    fn from(row: NotificationRow) -> Self {
        let related_game = match (row.game_id, row.game_name, row.game_slug) {
            (Some(id), Some(name), Some(slug)) => Some(RelatedGame {
                id,
                name,
                slug,
                cover_image: None,
            }),
            _ => None,
        };
        Self {
            id: row.id,
            user_id: row.user_id,
            related_game,
            title: row.title,
            message: row.message,
            r#type: row.r#type,
            read: row.read,
            created_at: row.created_at,
        }
    }
}

/// DTO for an admin broadcast.
#[derive(Debug, Deserialize, Validate)]
pub struct BroadcastRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
    #[validate(length(min = 1, max = 50))]
    pub r#type: String,
    #[serde(alias = "relatedGame")]
    pub related_game: Option<i64>,
}
