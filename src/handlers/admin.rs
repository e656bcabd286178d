// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    config::{DEFAULT_GAME_COVER, DEFAULT_NEWS_IMAGE},
    error::AppError,
    models::{
        game::{CreateGameRequest, GAME_COLUMNS, Game, UpdateGameRequest, resolve_slug},
        news::{CreateNewsRequest, NEWS_SELECT, NewsResponse, NewsRow, UpdateNewsRequest},
        report::{ReportListParams, ReportStatus, UpdateReportStatusRequest},
    },
    services::{moderation, rating},
};

/// Maps a foreign-key miss on `related_game_id` to a precise message.
fn related_game_missing(err: sqlx::Error) -> AppError {
    match AppError::from(err) {
        AppError::NotFound(_) => AppError::NotFound("Related game not found".to_string()),
        other => other,
    }
}

async fn fetch_game(pool: &PgPool, id: i64) -> Result<Game, AppError> {
    sqlx::query_as::<_, Game>(&format!("SELECT {GAME_COLUMNS} FROM games WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Game not found".to_string()))
}

async fn fetch_news(pool: &PgPool, id: i64) -> Result<NewsResponse, AppError> {
    sqlx::query_as::<_, NewsRow>(&format!("{NEWS_SELECT} WHERE n.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .map(NewsResponse::from)
        .ok_or(AppError::NotFound("News not found".to_string()))
}

/// Lists every game, newest first.
/// Admin only.
pub async fn list_games(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let games = sqlx::query_as::<_, Game>(&format!(
        "SELECT {GAME_COLUMNS} FROM games ORDER BY created_at DESC, id DESC"
    ))
    .fetch_all(&pool)
    .await?;

    Ok(Json(games))
}

/// Creates a new game. The slug is derived from the name unless given.
/// Admin only.
pub async fn create_game(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateGameRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let slug = resolve_slug(payload.slug.as_deref(), &payload.name)?;
    let cover_image = payload
        .cover_image
        .clone()
        .unwrap_or_else(|| DEFAULT_GAME_COVER.to_string());

    let game = sqlx::query_as::<_, Game>(&format!(
        r#"
        INSERT INTO games
        (name, slug, description, short_description, developer, publisher, category,
         platforms, release_date, is_upcoming, cover_image, screenshots, trailer_urls,
         trending, featured, recent_update, update_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
        RETURNING {GAME_COLUMNS}
        "#
    ))
    .bind(payload.name.trim())
    .bind(&slug)
    .bind(&payload.description)
    .bind(&payload.short_description)
    .bind(&payload.developer)
    .bind(&payload.publisher)
    .bind(payload.category)
    .bind(&payload.platforms)
    .bind(payload.release_date)
    .bind(payload.is_upcoming)
    .bind(cover_image)
    .bind(&payload.screenshots)
    .bind(&payload.trailer_urls)
    .bind(payload.trending)
    .bind(payload.featured)
    .bind(&payload.recent_update)
    .bind(payload.update_date)
    .fetch_one(&pool)
    .await?;

    tracing::info!(game_id = game.id, slug = %game.slug, "Game created");

    Ok((StatusCode::CREATED, Json(game)))
}

/// Updates the provided fields of a game. The rating is never touched and
/// the slug only changes when given explicitly.
/// Admin only.
pub async fn update_game(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateGameRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE games SET ");
    let mut separated = builder.separated(", ");

    if let Some(name) = payload.name {
        separated.push("name = ");
        separated.push_bind_unseparated(name.trim().to_string());
    }

    if let Some(slug) = payload.slug {
        separated.push("slug = ");
        separated.push_bind_unseparated(resolve_slug(Some(&slug), "")?);
    }

    if let Some(description) = payload.description {
        separated.push("description = ");
        separated.push_bind_unseparated(description);
    }

    if let Some(short_description) = payload.short_description {
        separated.push("short_description = ");
        separated.push_bind_unseparated(short_description);
    }

    if let Some(developer) = payload.developer {
        separated.push("developer = ");
        separated.push_bind_unseparated(developer);
    }

    if let Some(publisher) = payload.publisher {
        separated.push("publisher = ");
        separated.push_bind_unseparated(publisher);
    }

    if let Some(category) = payload.category {
        separated.push("category = ");
        separated.push_bind_unseparated(category);
    }

    if let Some(platforms) = payload.platforms {
        separated.push("platforms = ");
        separated.push_bind_unseparated(platforms);
    }

    if let Some(release_date) = payload.release_date {
        separated.push("release_date = ");
        separated.push_bind_unseparated(release_date);
    }

    if let Some(is_upcoming) = payload.is_upcoming {
        separated.push("is_upcoming = ");
        separated.push_bind_unseparated(is_upcoming);
    }

    if let Some(cover_image) = payload.cover_image {
        separated.push("cover_image = ");
        separated.push_bind_unseparated(cover_image);
    }

    if let Some(screenshots) = payload.screenshots {
        separated.push("screenshots = ");
        separated.push_bind_unseparated(screenshots);
    }

    if let Some(trailer_urls) = payload.trailer_urls {
        separated.push("trailer_urls = ");
        separated.push_bind_unseparated(trailer_urls);
    }

    if let Some(trending) = payload.trending {
        separated.push("trending = ");
        separated.push_bind_unseparated(trending);
    }

    if let Some(featured) = payload.featured {
        separated.push("featured = ");
        separated.push_bind_unseparated(featured);
    }

    if let Some(recent_update) = payload.recent_update {
        separated.push("recent_update = ");
        separated.push_bind_unseparated(recent_update);
    }

    if let Some(update_date) = payload.update_date {
        separated.push("update_date = ");
        separated.push_bind_unseparated(update_date);
    }

    separated.push("updated_at = NOW()");

    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(format!(" RETURNING {GAME_COLUMNS}"));

    let game = builder
        .build_query_as::<Game>()
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Game not found".to_string()))?;

    Ok(Json(game))
}

/// Deletes a game by ID. Its reviews, posts and bookmarks go with it.
/// Admin only.
pub async fn delete_game(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM games WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete game: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Game not found".to_string()));
    }

    tracing::info!(game_id = id, "Game deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Rebuilds a game's rating from its reviews.
/// Admin only.
pub async fn recompute_game_rating(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    rating::recompute_rating(&pool, id).await?;

    Ok(Json(fetch_game(&pool, id).await?))
}

/// Lists every news article, newest first.
/// Admin only.
pub async fn list_news(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let rows = sqlx::query_as::<_, NewsRow>(&format!(
        "{NEWS_SELECT} ORDER BY n.created_at DESC, n.id DESC"
    ))
    .fetch_all(&pool)
    .await?;

    Ok(Json(rows.into_iter().map(NewsResponse::from).collect::<Vec<_>>()))
}

/// Creates a news article. The slug is derived from the title unless given.
/// Admin only.
pub async fn create_news(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateNewsRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let slug = resolve_slug(payload.slug.as_deref(), &payload.title)?;

    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO news
        (title, slug, excerpt, content, image, category, source, related_game_id, featured)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id
        "#,
    )
    .bind(payload.title.trim())
    .bind(&slug)
    .bind(&payload.excerpt)
    .bind(&payload.content)
    .bind(payload.image.as_deref().unwrap_or(DEFAULT_NEWS_IMAGE))
    .bind(payload.category)
    .bind(payload.source.as_deref().unwrap_or("GameSphere"))
    .bind(payload.related_game_id)
    .bind(payload.featured)
    .fetch_one(&pool)
    .await
    .map_err(related_game_missing)?;

    tracing::info!(news_id = id, slug = %slug, "News created");

    Ok((StatusCode::CREATED, Json(fetch_news(&pool, id).await?)))
}

/// Updates the provided fields of a news article.
/// Admin only.
pub async fn update_news(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateNewsRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE news SET ");
    let mut separated = builder.separated(", ");

    if let Some(title) = payload.title {
        separated.push("title = ");
        separated.push_bind_unseparated(title.trim().to_string());
    }

    if let Some(slug) = payload.slug {
        separated.push("slug = ");
        separated.push_bind_unseparated(resolve_slug(Some(&slug), "")?);
    }

    if let Some(excerpt) = payload.excerpt {
        separated.push("excerpt = ");
        separated.push_bind_unseparated(excerpt);
    }

    if let Some(content) = payload.content {
        separated.push("content = ");
        separated.push_bind_unseparated(content);
    }

    if let Some(image) = payload.image {
        separated.push("image = ");
        separated.push_bind_unseparated(image);
    }

    if let Some(category) = payload.category {
        separated.push("category = ");
        separated.push_bind_unseparated(category);
    }

    if let Some(source) = payload.source {
        separated.push("source = ");
        separated.push_bind_unseparated(source);
    }

    if let Some(related_game_id) = payload.related_game_id {
        separated.push("related_game_id = ");
        separated.push_bind_unseparated(related_game_id);
    }

    if let Some(featured) = payload.featured {
        separated.push("featured = ");
        separated.push_bind_unseparated(featured);
    }

    separated.push("updated_at = NOW()");

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder
        .build()
        .execute(&pool)
        .await
        .map_err(related_game_missing)?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("News not found".to_string()));
    }

    Ok(Json(fetch_news(&pool, id).await?))
}

/// Deletes a news article by ID.
/// Admin only.
pub async fn delete_news(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM news WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("News not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub games_count: i64,
    pub news_count: i64,
    pub users_count: i64,
    pub reports_pending: i64,
}

/// Counts shown on the admin dashboard.
/// Admin only.
pub async fn stats(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let (games_count, news_count, users_count) = sqlx::query_as::<_, (i64, i64, i64)>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM games),
            (SELECT COUNT(*) FROM news),
            (SELECT COUNT(*) FROM users)
        "#,
    )
    .fetch_one(&pool)
    .await?;

    let reports_pending = moderation::pending_count(&pool).await?;

    Ok(Json(DashboardStats {
        games_count,
        news_count,
        users_count,
        reports_pending,
    }))
}

/// Lists reports, newest first, with the reporter resolved.
/// Admin only.
pub async fn list_reports(
    State(pool): State<PgPool>,
    Query(params): Query<ReportListParams>,
) -> Result<impl IntoResponse, AppError> {
    let status = params
        .status
        .as_deref()
        .map(str::parse::<ReportStatus>)
        .transpose()?;

    let reports = moderation::list_reports(&pool, status).await?;

    Ok(Json(reports))
}

/// Sets a report's status.
/// Admin only.
pub async fn update_report_status(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateReportStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let status: ReportStatus = payload
        .status
        .as_deref()
        .ok_or(AppError::BadRequest("Invalid status".to_string()))?
        .parse()?;

    let report = moderation::set_report_status(&pool, id, status).await?;

    Ok(Json(report))
}
