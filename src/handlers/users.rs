// src/handlers/users.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    error::AppError,
    handlers::auth::USER_COLUMNS,
    models::{
        game::GameSummary,
        user::{
            ChangePasswordRequest, PreferencesRequest, ProfileResponse, UpdateProfileRequest, User,
        },
    },
    services::notifications,
    utils::{
        hash::{hash_password, verify_password},
        jwt::Claims,
    },
};

pub async fn fetch_user(pool: &PgPool, user_id: i64) -> Result<User, AppError> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))
}

/// Bookmarked games, most recently bookmarked first.
pub async fn fetch_bookmarks(pool: &PgPool, user_id: i64) -> Result<Vec<GameSummary>, AppError> {
    let games = sqlx::query_as::<_, GameSummary>(
        r#"
        SELECT g.id, g.name, g.slug, g.cover_image, g.category, g.release_date,
               g.rating_average, g.rating_count
        FROM user_bookmarks b
        JOIN games g ON g.id = b.game_id
        WHERE b.user_id = $1
        ORDER BY b.created_at DESC, g.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(games)
}

/// Current user's profile with bookmarks.
pub async fn get_profile(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let user = fetch_user(&pool, user_id).await?;
    let bookmarks = fetch_bookmarks(&pool, user_id).await?;

    Ok(Json(ProfileResponse { user, bookmarks }))
}

/// Updates username, email, avatar and notification flags.
/// Only the provided fields change.
pub async fn update_profile(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    let payload = payload.trimmed();
    payload.validate()?;
    let user_id = claims.user_id()?;

    if payload.is_empty() {
        return Ok(Json(fetch_user(&pool, user_id).await?));
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE users SET ");
    let mut separated = builder.separated(", ");

    if let Some(username) = &payload.username {
        separated.push("username = ");
        separated.push_bind_unseparated(username.clone());
    }

    if let Some(email) = &payload.email {
        separated.push("email = ");
        separated.push_bind_unseparated(email.clone());
    }

    if let Some(avatar) = payload.avatar_update() {
        separated.push("avatar = ");
        separated.push_bind_unseparated(avatar);
    }

    if let Some(flag) = payload.notify_new_releases {
        separated.push("notify_new_releases = ");
        separated.push_bind_unseparated(flag);
    }

    if let Some(flag) = payload.notify_updates {
        separated.push("notify_updates = ");
        separated.push_bind_unseparated(flag);
    }

    separated.push("updated_at = NOW()");

    builder.push(" WHERE id = ");
    builder.push_bind(user_id);
    builder.push(format!(" RETURNING {USER_COLUMNS}"));

    let user = builder
        .build_query_as::<User>()
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Changes the password after checking the current one.
pub async fn change_password(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user = fetch_user(&pool, claims.user_id()?).await?;

    if !verify_password(&payload.current_password, &user.password)? {
        return Err(AppError::AuthError("Current password is incorrect".to_string()));
    }

    let hashed = hash_password(&payload.new_password)?;
    sqlx::query("UPDATE users SET password = $1, updated_at = NOW() WHERE id = $2")
        .bind(hashed)
        .bind(user.id)
        .execute(&pool)
        .await?;

    tracing::info!(user_id = user.id, "Password changed");

    Ok(Json(json!({ "message": "Password updated" })))
}

pub async fn list_bookmarks(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let bookmarks = fetch_bookmarks(&pool, claims.user_id()?).await?;
    Ok(Json(bookmarks))
}

/// Toggle a game in the caller's bookmarks.
/// Adds it when absent, removes it when present.
pub async fn toggle_bookmark(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(game_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let mut tx = pool.begin().await?;

    let removed = sqlx::query("DELETE FROM user_bookmarks WHERE user_id = $1 AND game_id = $2")
        .bind(user_id)
        .bind(game_id)
        .execute(&mut *tx)
        .await?
        .rows_affected()
        > 0;

    if !removed {
        sqlx::query(
            "INSERT INTO user_bookmarks (user_id, game_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(game_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::NotFound(_) => AppError::NotFound("Game not found".to_string()),
            other => other,
        })?;
    }

    tx.commit().await?;

    let bookmarks = fetch_bookmarks(&pool, user_id).await?;

    Ok(Json(json!({
        "bookmarked": !removed,
        "bookmarks": bookmarks,
    })))
}

pub async fn list_notifications(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let list = notifications::list_for_user(&pool, claims.user_id()?).await?;
    Ok(Json(list))
}

pub async fn mark_notification_read(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let notification = notifications::mark_read(&pool, claims.user_id()?, id).await?;
    Ok(Json(notification))
}

pub async fn mark_all_notifications_read(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let updated = notifications::mark_all_read(&pool, claims.user_id()?).await?;
    Ok(Json(json!({ "updated": updated })))
}

/// Sets the notification preference flags; omitted flags keep their value.
pub async fn update_preferences(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<PreferencesRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users
        SET notify_new_releases = COALESCE($2, notify_new_releases),
            notify_updates = COALESCE($3, notify_updates),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(claims.user_id()?)
    .bind(payload.notify_new_releases)
    .bind(payload.notify_updates)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}
