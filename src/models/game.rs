// src/models/game.rs

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use url::Url;
use validator::Validate;

use crate::error::AppError;

/// Game genre, stored as the `game_category` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "game_category")]
pub enum GameCategory {
    Action,
    Adventure,
    #[sqlx(rename = "RPG")]
    #[serde(rename = "RPG")]
    Rpg,
    Sports,
    Racing,
    Shooter,
    Strategy,
    Simulation,
    Horror,
    Indie,
    Other,
}

/// Stored as the `game_platform` enum; a game carries a set of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "game_platform")]
pub enum Platform {
    #[sqlx(rename = "PC")]
    #[serde(rename = "PC")]
    Pc,
    PlayStation,
    Xbox,
    #[sqlx(rename = "Nintendo Switch")]
    #[serde(rename = "Nintendo Switch")]
    NintendoSwitch,
    Mobile,
}

/// Denormalized `{average, count}` summary of a game's reviews.
#[derive(Debug, Clone, Copy, PartialEq, FromRow, Serialize, Deserialize)]
pub struct RatingSummary {
    #[sqlx(rename = "rating_average")]
    pub average: f64,
    #[sqlx(rename = "rating_count")]
    pub count: i64,
}

/// Represents the 'games' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Game {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub short_description: Option<String>,
    pub developer: Option<String>,
    pub publisher: Option<String>,
    pub category: GameCategory,
    pub platforms: Vec<Platform>,
    pub release_date: NaiveDate,
    pub is_upcoming: bool,
    pub cover_image: String,
    pub screenshots: Vec<String>,
    pub trailer_urls: Vec<String>,
    #[sqlx(flatten)]
    pub rating: RatingSummary,
    pub trending: bool,
    pub featured: bool,
    pub recent_update: Option<String>,
    pub update_date: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Column list matching [`Game`].
pub const GAME_COLUMNS: &str = "id, name, slug, description, short_description, developer, \
     publisher, category, platforms, release_date, is_upcoming, cover_image, screenshots, \
     trailer_urls, rating_average, rating_count, trending, featured, recent_update, \
     update_date, created_at, updated_at";

/// Compact game card used by bookmarks and listings that embed games.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GameSummary {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub cover_image: String,
    pub category: GameCategory,
    pub release_date: NaiveDate,
    #[sqlx(flatten)]
    pub rating: RatingSummary,
}

/// DTO for creating a game (admin).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateGameRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    /// Derived from `name` when omitted.
    #[validate(length(min = 1, max = 200))]
    pub slug: Option<String>,
    #[validate(length(min = 1, max = 20000))]
    pub description: String,
    #[validate(length(max = 200))]
    pub short_description: Option<String>,
    #[validate(length(max = 100))]
    pub developer: Option<String>,
    #[validate(length(max = 100))]
    pub publisher: Option<String>,
    pub category: GameCategory,
    #[serde(default)]
    pub platforms: Vec<Platform>,
    pub release_date: NaiveDate,
    #[serde(default)]
    pub is_upcoming: bool,
    #[validate(length(max = 500), custom(function = validate_url_string))]
    pub cover_image: Option<String>,
    #[serde(default)]
    #[validate(custom(function = validate_urls))]
    pub screenshots: Vec<String>,
    #[serde(default)]
    #[validate(custom(function = validate_urls))]
    pub trailer_urls: Vec<String>,
    #[serde(default)]
    pub trending: bool,
    #[serde(default)]
    pub featured: bool,
    pub recent_update: Option<String>,
    pub update_date: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for updating a game. Fields are optional; the rating is never writable.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateGameRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub slug: Option<String>,
    #[validate(length(min = 1, max = 20000))]
    pub description: Option<String>,
    #[validate(length(max = 200))]
    pub short_description: Option<String>,
    pub developer: Option<String>,
    pub publisher: Option<String>,
    pub category: Option<GameCategory>,
    pub platforms: Option<Vec<Platform>>,
    pub release_date: Option<NaiveDate>,
    pub is_upcoming: Option<bool>,
    #[validate(length(max = 500), custom(function = validate_url_string))]
    pub cover_image: Option<String>,
    #[validate(custom(function = validate_urls))]
    pub screenshots: Option<Vec<String>>,
    #[validate(custom(function = validate_urls))]
    pub trailer_urls: Option<Vec<String>>,
    pub trending: Option<bool>,
    pub featured: Option<bool>,
    pub recent_update: Option<String>,
    pub update_date: Option<chrono::DateTime<chrono::Utc>>,
}

/// Query parameters for the public game listing.
#[derive(Debug, Default, Deserialize)]
pub struct GameListParams {
    /// Case-insensitive match against name and description.
    pub search: Option<String>,
    pub category: Option<GameCategory>,
    pub platform: Option<Platform>,
    /// "true" or "false"; anything else is ignored.
    pub upcoming: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<i64>,
}

impl GameListParams {
    pub fn upcoming_filter(&self) -> Option<bool> {
        match self.upcoming.as_deref() {
            Some("true") => Some(true),
            Some("false") => Some(false),
            _ => None,
        }
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(50).clamp(1, 100)
    }
}

/// Whitelisted sort keys for the game listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameSort {
    NewestFirst,
    OldestFirst,
    NameAsc,
    NameDesc,
    ReleaseAsc,
    ReleaseDesc,
    RatingAsc,
    RatingDesc,
}

impl GameSort {
    pub fn parse(raw: Option<&str>) -> Result<Self, AppError> {
        let sort = match raw.unwrap_or("-createdAt") {
            "-createdAt" => GameSort::NewestFirst,
            "createdAt" => GameSort::OldestFirst,
            "name" => GameSort::NameAsc,
            "-name" => GameSort::NameDesc,
            "releaseDate" => GameSort::ReleaseAsc,
            "-releaseDate" => GameSort::ReleaseDesc,
            "rating" => GameSort::RatingAsc,
            "-rating" => GameSort::RatingDesc,
            other => return Err(AppError::BadRequest(format!("Invalid sort key '{}'", other))),
        };
        Ok(sort)
    }

    pub fn order_clause(&self) -> &'static str {
        match self {
            GameSort::NewestFirst => "created_at DESC, id DESC",
            GameSort::OldestFirst => "created_at ASC, id ASC",
            GameSort::NameAsc => "name ASC, id ASC",
            GameSort::NameDesc => "name DESC, id DESC",
            GameSort::ReleaseAsc => "release_date ASC, id ASC",
            GameSort::ReleaseDesc => "release_date DESC, id DESC",
            GameSort::RatingAsc => "rating_average ASC, rating_count ASC, id ASC",
            GameSort::RatingDesc => "rating_average DESC, rating_count DESC, id DESC",
        }
    }
}

static SLUG_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static SLUG_DISALLOWED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_-]+").unwrap());

/// Derives a URL slug from a display name: lowercase, whitespace runs become
/// `-`, anything outside `[A-Za-z0-9_-]` is dropped.
pub fn slugify(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let dashed = SLUG_WHITESPACE.replace_all(&lowered, "-");
    SLUG_DISALLOWED.replace_all(&dashed, "").into_owned()
}

/// Explicit slug if given, else one derived from `source`.
pub fn resolve_slug(explicit: Option<&str>, source: &str) -> Result<String, AppError> {
    let slug = match explicit.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => slugify(s),
        None => slugify(source),
    };
    if slug.is_empty() {
        return Err(AppError::BadRequest("Cannot derive a slug from the given name".to_string()));
    }
    Ok(slug)
}

/// Validates that a string is a correctly formatted URL.
pub fn validate_url_string(url: &str) -> Result<(), validator::ValidationError> {
    if Url::parse(url).is_err() {
        return Err(validator::ValidationError::new("invalid_url"));
    }
    Ok(())
}

/// Validates a collection of URLs, ensuring each meets length and format requirements.
fn validate_urls(urls: &[String]) -> Result<(), validator::ValidationError> {
    for url in urls {
        if url.len() > 500 {
            return Err(validator::ValidationError::new("url_too_long"));
        }
        validate_url_string(url)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_follows_name() {
        assert_eq!(slugify("Grand Theft Auto V"), "grand-theft-auto-v");
        assert_eq!(slugify("  Baldur's Gate 3 "), "baldurs-gate-3");
        assert_eq!(slugify("Marvel's   Spider-Man: 2"), "marvels-spider-man-2");
    }

    #[test]
    fn explicit_slug_wins_and_empty_slug_is_rejected() {
        assert_eq!(resolve_slug(Some("My Slug"), "ignored").unwrap(), "my-slug");
        assert_eq!(resolve_slug(Some("  "), "Halo").unwrap(), "halo");
        assert!(matches!(resolve_slug(None, "!!!"), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn sort_keys_are_whitelisted() {
        assert_eq!(GameSort::parse(None).unwrap(), GameSort::NewestFirst);
        assert_eq!(GameSort::parse(Some("-rating")).unwrap().order_clause(), "rating_average DESC, rating_count DESC, id DESC");
        assert!(GameSort::parse(Some("name; DROP TABLE games")).is_err());
    }

    #[test]
    fn every_ordering_ends_with_an_id_tiebreaker() {
        for key in ["-createdAt", "createdAt", "name", "-name", "releaseDate", "-releaseDate", "rating", "-rating"] {
            let clause = GameSort::parse(Some(key)).unwrap().order_clause();
            assert!(clause.ends_with("id ASC") || clause.ends_with("id DESC"), "{key}: {clause}");
        }
    }

    #[test]
    fn listing_params_defaults() {
        let params = GameListParams::default();
        assert_eq!(params.limit(), 50);
        assert_eq!(params.upcoming_filter(), None);

        let params = GameListParams { upcoming: Some("false".into()), limit: Some(1000), ..Default::default() };
        assert_eq!(params.upcoming_filter(), Some(false));
        assert_eq!(params.limit(), 100);
    }

    #[test]
    fn enums_use_catalog_spelling() {
        assert_eq!(serde_json::to_string(&Platform::NintendoSwitch).unwrap(), "\"Nintendo Switch\"");
        assert_eq!(serde_json::to_string(&GameCategory::Rpg).unwrap(), "\"RPG\"");
        let p: Platform = serde_json::from_str("\"PC\"").unwrap();
        assert_eq!(p, Platform::Pc);
    }

    #[test]
    fn create_request_checks_urls() {
        let req: CreateGameRequest = serde_json::from_value(serde_json::json!({
            "name": "Halo",
            "description": "Space marines",
            "category": "Shooter",
            "release_date": "2001-11-15",
            "cover_image": "not a url"
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }
}
