// src/handlers/games.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    config::{COMMUNITY_LIST_LIMIT, TRENDING_LIMIT},
    error::AppError,
    models::{
        community::{CommunityPost, CreateCommunityPostRequest},
        game::{GAME_COLUMNS, Game, GameListParams, GameSort},
        review::{Review, SubmitReviewRequest, SubmitReviewResponse},
    },
    services::rating,
    utils::jwt::Claims,
};

/// Lists games with optional search, category, platform and upcoming filters.
pub async fn list_games(
    State(pool): State<PgPool>,
    Query(params): Query<GameListParams>,
) -> Result<impl IntoResponse, AppError> {
    let sort = GameSort::parse(params.sort.as_deref())?;

    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {GAME_COLUMNS} FROM games WHERE TRUE"));

    if let Some(upcoming) = params.upcoming_filter() {
        builder.push(" AND is_upcoming = ");
        builder.push_bind(upcoming);
    }

    if let Some(search) = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", escape_like(search));
        builder.push(" AND (name ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR description ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }

    if let Some(category) = params.category {
        builder.push(" AND category = ");
        builder.push_bind(category);
    }

    if let Some(platform) = params.platform {
        builder.push(" AND ");
        builder.push_bind(platform);
        builder.push(" = ANY(platforms)");
    }

    builder.push(" ORDER BY ");
    builder.push(sort.order_clause());
    builder.push(" LIMIT ");
    builder.push_bind(params.limit());

    let games = builder
        .build_query_as::<Game>()
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list games: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok(Json(games))
}

/// Trending released games, best rated first.
pub async fn trending_games(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let games = sqlx::query_as::<_, Game>(&format!(
        r#"
        SELECT {GAME_COLUMNS} FROM games
        WHERE trending = TRUE AND is_upcoming = FALSE
        ORDER BY rating_average DESC, rating_count DESC, id DESC
        LIMIT $1
        "#
    ))
    .bind(TRENDING_LIMIT)
    .fetch_all(&pool)
    .await?;

    Ok(Json(games))
}

/// Upcoming games, soonest release first.
pub async fn upcoming_games(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let games = sqlx::query_as::<_, Game>(&format!(
        "SELECT {GAME_COLUMNS} FROM games WHERE is_upcoming = TRUE ORDER BY release_date ASC, id ASC"
    ))
    .fetch_all(&pool)
    .await?;

    Ok(Json(games))
}

/// Get a single game by numeric id or by slug.
pub async fn get_game(
    State(pool): State<PgPool>,
    Path(identifier): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let game = match identifier.parse::<i64>() {
        Ok(id) => sqlx::query_as::<_, Game>(&format!(
            // An id match wins over a slug that happens to be numeric.
            "SELECT {GAME_COLUMNS} FROM games WHERE id = $1 OR slug = $2 ORDER BY (id = $1) DESC LIMIT 1"
        ))
        .bind(id)
        .bind(&identifier)
        .fetch_optional(&pool)
        .await?,
        Err(_) => sqlx::query_as::<_, Game>(&format!(
            "SELECT {GAME_COLUMNS} FROM games WHERE slug = $1"
        ))
        .bind(&identifier)
        .fetch_optional(&pool)
        .await?,
    }
    .ok_or(AppError::NotFound("Game not found".to_string()))?;

    Ok(Json(game))
}

/// Reviews of a game, newest first.
pub async fn list_reviews(
    State(pool): State<PgPool>,
    Path(game_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let reviews = sqlx::query_as::<_, Review>(
        r#"
        SELECT r.id, r.game_id, r.user_id, u.username, r.rating, r.title, r.content,
               r.created_at, r.updated_at
        FROM reviews r
        JOIN users u ON u.id = r.user_id
        WHERE r.game_id = $1
        ORDER BY r.created_at DESC, r.id DESC
        "#,
    )
    .bind(game_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(reviews))
}

/// Create or replace the caller's review of a game.
/// The game's aggregate rating is refreshed before responding.
pub async fn submit_review(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(game_id): Path<i64>,
    Json(payload): Json<SubmitReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    let payload = payload.sanitized();
    payload.validate()?;
    let user_id = claims.user_id()?;

    let (review, game_rating) = rating::submit_review(&pool, game_id, user_id, &payload).await?;

    Ok(Json(SubmitReviewResponse {
        review,
        game_rating,
    }))
}

/// Community posts of a game, newest first.
pub async fn list_community_posts(
    State(pool): State<PgPool>,
    Path(game_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let posts = sqlx::query_as::<_, CommunityPost>(
        r#"
        SELECT p.id, p.game_id, p.user_id, u.username, p.title, p.content, p.created_at
        FROM community_posts p
        JOIN users u ON u.id = p.user_id
        WHERE p.game_id = $1
        ORDER BY p.created_at DESC, p.id DESC
        LIMIT $2
        "#,
    )
    .bind(game_id)
    .bind(COMMUNITY_LIST_LIMIT)
    .fetch_all(&pool)
    .await?;

    Ok(Json(posts))
}

/// Create a community post on a game.
pub async fn create_community_post(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(game_id): Path<i64>,
    Json(payload): Json<CreateCommunityPostRequest>,
) -> Result<impl IntoResponse, AppError> {
    let payload = payload.sanitized();
    payload.validate()?;
    let user_id = claims.user_id()?;

    let post = sqlx::query_as::<_, CommunityPost>(
        r#"
        WITH inserted AS (
            INSERT INTO community_posts (game_id, user_id, title, content)
            VALUES ($1, $2, $3, $4)
            RETURNING *
        )
        SELECT p.id, p.game_id, p.user_id, u.username, p.title, p.content, p.created_at
        FROM inserted p
        JOIN users u ON u.id = p.user_id
        "#,
    )
    .bind(game_id)
    .bind(user_id)
    .bind(&payload.title)
    .bind(&payload.content)
    .fetch_one(&pool)
    .await
    .map_err(|e| match AppError::from(e) {
        AppError::NotFound(_) => AppError::NotFound("Game not found".to_string()),
        other => other,
    })?;

    Ok((StatusCode::CREATED, Json(post)))
}

/// Escapes LIKE wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
