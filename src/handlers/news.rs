// src/handlers/news.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    error::AppError,
    models::news::{NEWS_SELECT, NewsListParams, NewsResponse, NewsRow},
};

/// Lists news articles, newest first, optionally filtered by category or featured flag.
pub async fn list_news(
    State(pool): State<PgPool>,
    Query(params): Query<NewsListParams>,
) -> Result<impl IntoResponse, AppError> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(NEWS_SELECT);
    builder.push(" WHERE TRUE");

    if let Some(category) = params.category {
        builder.push(" AND n.category = ");
        builder.push_bind(category);
    }

    if params.featured_only() {
        builder.push(" AND n.featured = TRUE");
    }

    builder.push(" ORDER BY n.created_at DESC, n.id DESC LIMIT ");
    builder.push_bind(params.limit());

    let rows = builder.build_query_as::<NewsRow>().fetch_all(&pool).await?;

    Ok(Json(rows.into_iter().map(NewsResponse::from).collect::<Vec<_>>()))
}

/// Retrieves a single article by slug.
pub async fn get_news(
    State(pool): State<PgPool>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let row = sqlx::query_as::<_, NewsRow>(&format!("{NEWS_SELECT} WHERE n.slug = $1"))
        .bind(&slug)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("News not found".to_string()))?;

    Ok(Json(NewsResponse::from(row)))
}
