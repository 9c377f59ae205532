//! Repository for the `external_media_cache` table.

use marquee_core::media::ExternalMetadata;
use sqlx::PgPool;

use crate::models::external_media::ExternalMediaRow;

/// Column list for external_media_cache queries.
const COLUMNS: &str = "id, media_ref, title, poster_path, overview, created_at, updated_at";

/// Provides upsert and lookup for cached external display metadata.
pub struct ExternalMediaRepo;

impl ExternalMediaRepo {
    /// Insert or refresh the cache row for `media_ref`.
    ///
    /// Fields absent from `metadata` keep their cached value.
    pub async fn upsert(
        pool: &PgPool,
        media_ref: &str,
        metadata: &ExternalMetadata,
    ) -> Result<ExternalMediaRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO external_media_cache (media_ref, title, poster_path, overview)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (media_ref) DO UPDATE SET
                title = COALESCE(EXCLUDED.title, external_media_cache.title),
                poster_path = COALESCE(EXCLUDED.poster_path, external_media_cache.poster_path),
                overview = COALESCE(EXCLUDED.overview, external_media_cache.overview)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ExternalMediaRow>(&query)
            .bind(media_ref)
            .bind(&metadata.title)
            .bind(&metadata.poster_path)
            .bind(&metadata.overview)
            .fetch_one(pool)
            .await
    }

    /// Find the cache row for a canonical external reference.
    pub async fn find(pool: &PgPool, media_ref: &str) -> Result<Option<ExternalMediaRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM external_media_cache WHERE media_ref = $1");
        sqlx::query_as::<_, ExternalMediaRow>(&query)
            .bind(media_ref)
            .fetch_optional(pool)
            .await
    }
}
