//! Aggregate rating maintenance for games.
//!
//! A game stores `rating_sum` and `rating_count` next to the published
//! `rating_average`. Review writes lock the game row, apply the delta and
//! write all three back in the same transaction, so concurrent submissions
//! for one game serialize and the aggregate never drifts. A full recompute
//! from the review table is kept for repair and backfill.

use sqlx::{PgPool, Postgres, Transaction};

use crate::{
    error::AppError,
    models::{
        game::RatingSummary,
        review::{Review, SubmitReviewRequest},
    },
};

/// Running sum and count of a game's review ratings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RatingAggregate {
    pub sum: i64,
    pub count: i64,
}

impl RatingAggregate {
    pub fn new(sum: i64, count: i64) -> Self {
        Self { sum, count }
    }

    pub fn from_ratings(ratings: &[i16]) -> Self {
        Self {
            sum: ratings.iter().map(|&r| i64::from(r)).sum(),
            count: ratings.len() as i64,
        }
    }

    /// Folds one review write into the aggregate. `previous` is the caller's
    /// earlier rating for the same game, if the write replaces it.
    pub fn apply(self, previous: Option<i16>, rating: i16) -> Self {
        match previous {
            Some(old) => Self {
                sum: self.sum - i64::from(old) + i64::from(rating),
                count: self.count,
            },
            None => Self {
                sum: self.sum + i64::from(rating),
                count: self.count + 1,
            },
        }
    }

    /// Mean rating rounded half-up to one decimal; 0 with no reviews.
    pub fn average(&self) -> f64 {
        if self.count <= 0 {
            return 0.0;
        }
        // Integer tenths avoid binary float artifacts at the .x5 boundary.
        let tenths = (self.sum * 20 + self.count) / (self.count * 2);
        tenths as f64 / 10.0
    }

    pub fn summary(&self) -> RatingSummary {
        RatingSummary {
            average: self.average(),
            count: self.count,
        }
    }
}

/// Locks the game row for the rest of the transaction and returns its
/// stored aggregate.
async fn lock_game(
    tx: &mut Transaction<'_, Postgres>,
    game_id: i64,
) -> Result<RatingAggregate, AppError> {
    let (sum, count) = sqlx::query_as::<_, (i64, i64)>(
        "SELECT rating_sum, rating_count FROM games WHERE id = $1 FOR UPDATE",
    )
    .bind(game_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(AppError::NotFound("Game not found".to_string()))?;

    Ok(RatingAggregate::new(sum, count))
}

async fn store_aggregate(
    tx: &mut Transaction<'_, Postgres>,
    game_id: i64,
    aggregate: RatingAggregate,
) -> Result<RatingSummary, AppError> {
    sqlx::query_as::<_, RatingSummary>(
        r#"
        UPDATE games
        SET rating_sum = $2, rating_count = $3, rating_average = $4
        WHERE id = $1
        RETURNING rating_average, rating_count
        "#,
    )
    .bind(game_id)
    .bind(aggregate.sum)
    .bind(aggregate.count)
    .bind(aggregate.average())
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(AppError::NotFound("Game not found".to_string()))
}

/// Upserts the caller's review of a game and refreshes the game's aggregate.
///
/// Fails with NotFound when the game does not exist; nothing is written then.
pub async fn submit_review(
    pool: &PgPool,
    game_id: i64,
    user_id: i64,
    payload: &SubmitReviewRequest,
) -> Result<(Review, RatingSummary), AppError> {
    let mut tx = pool.begin().await?;

    let aggregate = lock_game(&mut tx, game_id).await?;

    let previous = sqlx::query_scalar::<_, i16>(
        "SELECT rating FROM reviews WHERE game_id = $1 AND user_id = $2",
    )
    .bind(game_id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?;

    let review = sqlx::query_as::<_, Review>(
        r#"
        WITH upserted AS (
            INSERT INTO reviews (game_id, user_id, rating, title, content)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (game_id, user_id) DO UPDATE
            SET rating = EXCLUDED.rating,
                title = EXCLUDED.title,
                content = EXCLUDED.content,
                updated_at = NOW()
            RETURNING *
        )
        SELECT r.id, r.game_id, r.user_id, u.username, r.rating, r.title, r.content,
               r.created_at, r.updated_at
        FROM upserted r
        JOIN users u ON u.id = r.user_id
        "#,
    )
    .bind(game_id)
    .bind(user_id)
    .bind(payload.rating)
    .bind(&payload.title)
    .bind(&payload.content)
    .fetch_one(&mut *tx)
    .await?;

    let summary = store_aggregate(&mut tx, game_id, aggregate.apply(previous, payload.rating)).await?;

    tx.commit().await?;

    tracing::debug!(
        game_id,
        user_id,
        replaced = previous.is_some(),
        average = summary.average,
        count = summary.count,
        "Review stored"
    );

    Ok((review, summary))
}

/// Rebuilds a game's aggregate from every review that references it.
pub async fn recompute_rating(pool: &PgPool, game_id: i64) -> Result<RatingSummary, AppError> {
    let mut tx = pool.begin().await?;

    lock_game(&mut tx, game_id).await?;

    let (sum, count) = sqlx::query_as::<_, (i64, i64)>(
        "SELECT COALESCE(SUM(rating), 0)::BIGINT, COUNT(*) FROM reviews WHERE game_id = $1",
    )
    .bind(game_id)
    .fetch_one(&mut *tx)
    .await?;

    let summary = store_aggregate(&mut tx, game_id, RatingAggregate::new(sum, count)).await?;

    tx.commit().await?;

    tracing::info!(game_id, average = summary.average, count = summary.count, "Rating recomputed");

    Ok(summary)
}
