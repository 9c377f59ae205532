//! Repository for the `reviews` table.

use marquee_core::media::MediaKind;
use marquee_core::review::{NewReview, ReviewPatch, ReviewSort, ReviewVisibility};
use marquee_core::types::DbId;
use sqlx::PgPool;

use crate::models::review::{RatingSummaryRow, ReviewRow};

/// Column list for reviews queries.
const COLUMNS: &str = "id, author_id, profile_id, media_ref, rating, content, \
    is_public, spoiler, like_count, created_at, updated_at";

/// Visibility predicate shared by the media listing and its count.
///
/// `$2` admits everything, `$3` is the viewer whose private reviews are
/// admitted (NULL for anonymous viewers).
const VISIBLE: &str = "($2::BOOLEAN OR is_public OR author_id = $3)";

/// ORDER BY clause for a media listing. Ties fall back to most recent first.
fn order_by(sort: ReviewSort) -> &'static str {
    match sort {
        ReviewSort::Recent => "created_at DESC, id DESC",
        ReviewSort::RatingHigh => "rating DESC, created_at DESC, id DESC",
        ReviewSort::RatingLow => "rating ASC, created_at DESC, id DESC",
        ReviewSort::Likes => "like_count DESC, created_at DESC, id DESC",
    }
}

/// Bind values for [`VISIBLE`].
fn visibility_binds(visibility: ReviewVisibility) -> (bool, Option<DbId>) {
    match visibility {
        ReviewVisibility::PublicOnly => (false, None),
        ReviewVisibility::PublicAndOwn(viewer) => (false, Some(viewer)),
        ReviewVisibility::All => (true, None),
    }
}

/// Provides CRUD and aggregate queries for reviews.
pub struct ReviewRepo;

impl ReviewRepo {
    /// Insert a review, returning the created row.
    ///
    /// A second review by the same author and profile for the same media
    /// violates `uq_reviews_author_profile_media`.
    pub async fn create(pool: &PgPool, input: &NewReview) -> Result<ReviewRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO reviews
                (author_id, profile_id, media_ref, rating, content, is_public, spoiler)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ReviewRow>(&query)
            .bind(input.author_id)
            .bind(input.profile_id)
            .bind(input.media_ref.to_string())
            .bind(input.rating)
            .bind(&input.content)
            .bind(input.is_public)
            .bind(input.spoiler)
            .fetch_one(pool)
            .await
    }

    /// Find a review by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ReviewRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM reviews WHERE id = $1");
        sqlx::query_as::<_, ReviewRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List one page of a media item's reviews.
    pub async fn list_for_media(
        pool: &PgPool,
        media_ref: &str,
        visibility: ReviewVisibility,
        sort: ReviewSort,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ReviewRow>, sqlx::Error> {
        let order = order_by(sort);
        let query = format!(
            "SELECT {COLUMNS} FROM reviews
             WHERE media_ref = $1 AND {VISIBLE}
             ORDER BY {order}
             LIMIT $4 OFFSET $5"
        );
        let (all, viewer) = visibility_binds(visibility);
        sqlx::query_as::<_, ReviewRow>(&query)
            .bind(media_ref)
            .bind(all)
            .bind(viewer)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count a media item's reviews under the same visibility rules.
    pub async fn count_for_media(
        pool: &PgPool,
        media_ref: &str,
        visibility: ReviewVisibility,
    ) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM reviews WHERE media_ref = $1 AND {VISIBLE}");
        let (all, viewer) = visibility_binds(visibility);
        sqlx::query_scalar::<_, i64>(&query)
            .bind(media_ref)
            .bind(all)
            .bind(viewer)
            .fetch_one(pool)
            .await
    }

    /// List one page of an author's reviews, most recent first.
    pub async fn list_for_author(
        pool: &PgPool,
        author_id: DbId,
        profile_id: Option<DbId>,
        public_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ReviewRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM reviews
             WHERE author_id = $1
               AND ($2::BIGINT IS NULL OR profile_id = $2)
               AND (NOT $3 OR is_public)
             ORDER BY created_at DESC, id DESC
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, ReviewRow>(&query)
            .bind(author_id)
            .bind(profile_id)
            .bind(public_only)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count an author's reviews under the same filters.
    pub async fn count_for_author(
        pool: &PgPool,
        author_id: DbId,
        profile_id: Option<DbId>,
        public_only: bool,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM reviews
             WHERE author_id = $1
               AND ($2::BIGINT IS NULL OR profile_id = $2)
               AND (NOT $3 OR is_public)",
        )
        .bind(author_id)
        .bind(profile_id)
        .bind(public_only)
        .fetch_one(pool)
        .await
    }

    /// Apply a patch. Absent fields keep their current value.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        patch: &ReviewPatch,
    ) -> Result<Option<ReviewRow>, sqlx::Error> {
        let query = format!(
            "UPDATE reviews SET
                rating = COALESCE($1, rating),
                content = COALESCE($2, content),
                is_public = COALESCE($3, is_public),
                spoiler = COALESCE($4, spoiler)
             WHERE id = $5
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ReviewRow>(&query)
            .bind(patch.rating)
            .bind(&patch.content)
            .bind(patch.is_public)
            .bind(patch.spoiler)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Delete a review. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Add one like in a single statement, returning the new count.
    pub async fn increment_likes(pool: &PgPool, id: DbId) -> Result<Option<i64>, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "UPDATE reviews SET like_count = like_count + 1
             WHERE id = $1
             RETURNING like_count",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Every numeric rating for a media reference.
    pub async fn ratings_for(pool: &PgPool, media_ref: &str) -> Result<Vec<f64>, sqlx::Error> {
        sqlx::query_scalar::<_, f64>(
            "SELECT rating FROM reviews WHERE media_ref = $1 AND rating > 0",
        )
        .bind(media_ref)
        .fetch_all(pool)
        .await
    }

    /// Aggregates for rated media references, best first.
    ///
    /// The average is rounded once, here, and that same value drives the
    /// ordering. With `kind`, local references take their kind from
    /// `media_items` (no row, no match) and external ones from the key.
    /// A NULL `limit` returns all of them.
    pub async fn rating_summaries(
        pool: &PgPool,
        kind: Option<MediaKind>,
        limit: Option<i64>,
    ) -> Result<Vec<RatingSummaryRow>, sqlx::Error> {
        sqlx::query_as::<_, RatingSummaryRow>(
            "SELECT r.media_ref,
                    ROUND(AVG(r.rating)::NUMERIC, 1)::FLOAT8 AS average,
                    COUNT(*) AS review_count
             FROM reviews r
             LEFT JOIN media_items m ON m.id::TEXT = r.media_ref
             WHERE r.rating > 0
               AND ($1::TEXT IS NULL
                    OR COALESCE(m.media_kind, NULLIF(split_part(r.media_ref, ':', 2), '')) = $1)
             GROUP BY r.media_ref
             ORDER BY average DESC, review_count DESC, r.media_ref ASC
             LIMIT $2",
        )
        .bind(kind.map(|k| k.as_str()))
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}
