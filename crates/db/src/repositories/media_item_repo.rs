//! Repository for the `media_items` table.

use marquee_core::media::{MediaKind, NewMediaItem};
use marquee_core::types::DbId;
use sqlx::PgPool;

use crate::models::media_item::MediaItemRow;

/// Column list for media_items queries.
const COLUMNS: &str = "id, external_id, media_kind, title, overview, poster_path, \
    backdrop_path, release_date, rating_average, rating_count, created_at, updated_at";

/// Provides CRUD operations for the local media catalog.
pub struct MediaItemRepo;

impl MediaItemRepo {
    /// Insert a new catalog entry, returning the created row.
    ///
    /// A second item with the same `(external_id, media_kind)` violates
    /// `uq_media_items_external`.
    pub async fn create(pool: &PgPool, input: &NewMediaItem) -> Result<MediaItemRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO media_items
                (external_id, media_kind, title, overview, poster_path,
                 backdrop_path, release_date)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MediaItemRow>(&query)
            .bind(input.external_id)
            .bind(input.media_kind.as_str())
            .bind(input.title.trim())
            .bind(&input.overview)
            .bind(&input.poster_path)
            .bind(&input.backdrop_path)
            .bind(input.release_date)
            .fetch_one(pool)
            .await
    }

    /// Find a catalog entry by its local ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<MediaItemRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM media_items WHERE id = $1");
        sqlx::query_as::<_, MediaItemRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a catalog entry by its external identity.
    pub async fn find_by_external(
        pool: &PgPool,
        kind: MediaKind,
        external_id: i64,
    ) -> Result<Option<MediaItemRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM media_items
             WHERE external_id = $1 AND media_kind = $2"
        );
        sqlx::query_as::<_, MediaItemRow>(&query)
            .bind(external_id)
            .bind(kind.as_str())
            .fetch_optional(pool)
            .await
    }

    /// List catalog entries, newest first, optionally filtered by kind.
    pub async fn list(
        pool: &PgPool,
        kind: Option<MediaKind>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MediaItemRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM media_items
             WHERE ($1::TEXT IS NULL OR media_kind = $1)
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, MediaItemRow>(&query)
            .bind(kind.map(|k| k.as_str()))
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count catalog entries, optionally filtered by kind.
    pub async fn count(pool: &PgPool, kind: Option<MediaKind>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM media_items WHERE ($1::TEXT IS NULL OR media_kind = $1)",
        )
        .bind(kind.map(|k| k.as_str()))
        .fetch_one(pool)
        .await
    }

    /// Overwrite the stored aggregate. Returns `true` if the row exists.
    pub async fn set_rating(
        pool: &PgPool,
        id: DbId,
        average: f64,
        review_count: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE media_items SET rating_average = $1, rating_count = $2 WHERE id = $3",
        )
        .bind(average)
        .bind(review_count)
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
