use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::utils::html::clean_html;

/// Represents the 'community_posts' table joined with the author's username.
/// Posts are immutable once created.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CommunityPost {
    pub id: i64,
    pub game_id: i64,
    pub user_id: i64,
    pub username: String,
    pub title: String,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for creating a community post.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommunityPostRequest {
    #[validate(length(
        min = 1,
        max = 150,
        message = "Title length must be between 1 and 150 chars"
    ))]
    pub title: String,

    #[validate(length(
        min = 1,
        max = 2000,
        message = "Content length must be between 1 and 2000 chars"
    ))]
    pub content: String,
}

impl CreateCommunityPostRequest {
    /// Trims the title and sanitizes the body; validation runs on the result.
    pub fn sanitized(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            content: clean_html(self.content.trim()).trim().to_string(),
        }
    }
}
