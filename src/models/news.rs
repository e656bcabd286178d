// src/models/news.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::game::validate_url_string;

/// Stored as the `news_category` enum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "news_category")]
pub enum NewsCategory {
    #[default]
    News,
    Review,
    Update,
    Release,
    Industry,
}

/// Represents the 'news' table joined with its optional related game.
#[derive(Debug, Clone, FromRow)]
pub struct NewsRow {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub image: String,
    pub category: NewsCategory,
    pub source: String,
    pub related_game_id: Option<i64>,
    pub related_game_name: Option<String>,
    pub related_game_slug: Option<String>,
    pub related_game_cover: Option<String>,
    pub featured: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// SELECT prefix producing [`NewsRow`]s; callers append WHERE/ORDER/LIMIT.
pub const NEWS_SELECT: &str = r#"
    SELECT
        n.id, n.title, n.slug, n.excerpt, n.content, n.image, n.category, n.source,
        n.related_game_id,
        g.name AS related_game_name,
        g.slug AS related_game_slug,
        g.cover_image AS related_game_cover,
        n.featured, n.created_at, n.updated_at
    FROM news n
    LEFT JOIN games g ON g.id = n.related_game_id
"#;

/// Minimal reference to the game a news item or notification is about.
#[derive(Debug, Clone, Serialize)]
pub struct RelatedGame {
    pub id: i64,
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewsResponse {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub image: String,
    pub category: NewsCategory,
    pub source: String,
    pub related_game: Option<RelatedGame>,
    pub featured: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<NewsRow> for NewsResponse {
    fn from(row: NewsRow) -> Self {
        let related_game = match (row.related_game_id, row.related_game_name, row.related_game_slug) {
            (Some(id), Some(name), Some(slug)) => Some(RelatedGame {
                id,
                name,
                slug,
                cover_image: row.related_game_cover,
            }),
            _ => None,
        };
        Self {
            id: row.id,
            title: row.title,
            slug: row.slug,
            excerpt: row.excerpt,
            content: row.content,
            image: row.image,
            category: row.category,
            source: row.source,
            related_game,
            featured: row.featured,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// DTO for creating a news article (admin).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateNewsRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// Derived from `title` when omitted.
    #[validate(length(min = 1, max = 200))]
    pub slug: Option<String>,
    #[validate(length(max = 300))]
    pub excerpt: Option<String>,
    #[validate(length(min = 1, max = 50000))]
    pub content: String,
    #[validate(length(max = 500), custom(function = validate_url_string))]
    pub image: Option<String>,
    #[serde(default)]
    pub category: NewsCategory,
    #[validate(length(min = 1, max = 100))]
    pub source: Option<String>,
    pub related_game_id: Option<i64>,
    #[serde(default)]
    pub featured: bool,
}

/// DTO for updating a news article. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateNewsRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub slug: Option<String>,
    #[validate(length(max = 300))]
    pub excerpt: Option<String>,
    #[validate(length(min = 1, max = 50000))]
    pub content: Option<String>,
    #[validate(length(max = 500), custom(function = validate_url_string))]
    pub image: Option<String>,
    pub category: Option<NewsCategory>,
    #[validate(length(min = 1, max = 100))]
    pub source: Option<String>,
    pub related_game_id: Option<i64>,
    pub featured: Option<bool>,
}

/// Query parameters for the public news listing.
#[derive(Debug, Default, Deserialize)]
pub struct NewsListParams {
    pub category: Option<NewsCategory>,
    /// Only "true" filters; anything else lists everything.
    pub featured: Option<String>,
    pub limit: Option<i64>,
}

impl NewsListParams {
    pub fn featured_only(&self) -> bool {
        self.featured.as_deref() == Some("true")
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(20).clamp(1, 100)
    }
}
