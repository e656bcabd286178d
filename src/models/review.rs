use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::{models::game::RatingSummary, utils::html::clean_html};

/// Represents the 'reviews' table joined with the author's username.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Review {
    pub id: i64,
    pub game_id: i64,
    pub user_id: i64,
    pub username: String,
    pub rating: i16,
    pub title: Option<String>,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for submitting (or replacing) the caller's review of a game.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitReviewRequest {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i16,

    #[validate(length(max = 100, message = "Title must be at most 100 characters"))]
    pub title: Option<String>,

    #[validate(length(
        min = 1,
        max = 2000,
        message = "Content length must be between 1 and 2000 chars"
    ))]
    pub content: String,
}

impl SubmitReviewRequest {
    /// Trims the title and sanitizes the body. Validation runs on the result,
    /// so a body that sanitizes to nothing is rejected.
    pub fn sanitized(self) -> Self {
        Self {
            rating: self.rating,
            title: self
                .title
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            content: clean_html(self.content.trim()).trim().to_string(),
        }
    }
}

/// The stored review together with the game's refreshed aggregate.
#[derive(Debug, Serialize)]
pub struct SubmitReviewResponse {
    #[serde(flatten)]
    pub review: Review,
    pub game_rating: RatingSummary,
}
