//! Postgres implementations of the core storage traits.

use async_trait::async_trait;
use marquee_core::error::CoreError;
use marquee_core::media::{ExternalMediaCacheEntry, ExternalMetadata, MediaItem, MediaKind};
use marquee_core::media_ref::MediaRef;
use marquee_core::pagination::Page;
use marquee_core::rating::AggregateRating;
use marquee_core::review::{AuthorReviewFilter, MediaReviewFilter, NewReview, Review, ReviewPatch};
use marquee_core::store::{MediaStore, RatingSummary, ReviewStore};
use marquee_core::types::DbId;
use sqlx::PgPool;

use crate::error::{map_db_error, unique_violation, UQ_REVIEWS_AUTHOR_PROFILE_MEDIA};
use crate::repositories::{ExternalMediaRepo, MediaItemRepo, ReviewRepo};

fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, CoreError>
where
    T: TryFrom<R, Error = CoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

/* --------------------------------------------------------------------------
Media
-------------------------------------------------------------------------- */

/// [`MediaStore`] backed by `media_items` and `external_media_cache`.
#[derive(Clone)]
pub struct PgMediaStore {
    pool: PgPool,
}

impl PgMediaStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MediaStore for PgMediaStore {
    async fn find_by_local_id(&self, id: DbId) -> Result<Option<MediaItem>, CoreError> {
        MediaItemRepo::find_by_id(&self.pool, id)
            .await
            .map_err(map_db_error)?
            .map(MediaItem::try_from)
            .transpose()
    }

    async fn find_by_external(
        &self,
        kind: MediaKind,
        external_id: i64,
    ) -> Result<Option<MediaItem>, CoreError> {
        MediaItemRepo::find_by_external(&self.pool, kind, external_id)
            .await
            .map_err(map_db_error)?
            .map(MediaItem::try_from)
            .transpose()
    }

    async fn set_aggregate_rating(
        &self,
        media_ref: &MediaRef,
        rating: &AggregateRating,
    ) -> Result<bool, CoreError> {
        let Some(id) = media_ref.local_id() else {
            return Ok(false);
        };
        MediaItemRepo::set_rating(&self.pool, id, rating.average, rating.review_count)
            .await
            .map_err(map_db_error)
    }

    async fn upsert_external_cache(
        &self,
        media_ref: &MediaRef,
        metadata: &ExternalMetadata,
    ) -> Result<ExternalMediaCacheEntry, CoreError> {
        if !media_ref.is_external() {
            return Err(CoreError::InvalidMediaReference(format!(
                "'{media_ref}' is not an external reference"
            )));
        }
        let row = ExternalMediaRepo::upsert(&self.pool, &media_ref.to_string(), metadata)
            .await
            .map_err(map_db_error)?;
        row.try_into()
    }

    async fn find_external_cache(
        &self,
        media_ref: &MediaRef,
    ) -> Result<Option<ExternalMediaCacheEntry>, CoreError> {
        ExternalMediaRepo::find(&self.pool, &media_ref.to_string())
            .await
            .map_err(map_db_error)?
            .map(ExternalMediaCacheEntry::try_from)
            .transpose()
    }
}

/* --------------------------------------------------------------------------
Reviews
-------------------------------------------------------------------------- */

/// [`ReviewStore`] backed by the `reviews` table.
///
/// Uniqueness is enforced by `uq_reviews_author_profile_media`, so
/// concurrent duplicate creates resolve inside Postgres.
#[derive(Clone)]
pub struct PgReviewStore {
    pool: PgPool,
}

impl PgReviewStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewStore for PgReviewStore {
    async fn create(&self, review: &NewReview) -> Result<Review, CoreError> {
        match ReviewRepo::create(&self.pool, review).await {
            Ok(row) => row.try_into(),
            Err(err) if unique_violation(&err).as_deref() == Some(UQ_REVIEWS_AUTHOR_PROFILE_MEDIA) => {
                Err(CoreError::DuplicateReview {
                    media_ref: review.media_ref.to_string(),
                })
            }
            Err(err) => Err(map_db_error(err)),
        }
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<Review>, CoreError> {
        ReviewRepo::find_by_id(&self.pool, id)
            .await
            .map_err(map_db_error)?
            .map(Review::try_from)
            .transpose()
    }

    async fn find_by_media(
        &self,
        media_ref: &MediaRef,
        filter: &MediaReviewFilter,
    ) -> Result<Page<Review>, CoreError> {
        let key = media_ref.to_string();
        let rows = ReviewRepo::list_for_media(
            &self.pool,
            &key,
            filter.visibility,
            filter.sort,
            filter.page.limit,
            filter.page.offset(),
        )
        .await
        .map_err(map_db_error)?;
        let total = ReviewRepo::count_for_media(&self.pool, &key, filter.visibility)
            .await
            .map_err(map_db_error)?;
        Ok(Page::new(convert_all(rows)?, filter.page, total))
    }

    async fn find_by_author(
        &self,
        author_id: DbId,
        filter: &AuthorReviewFilter,
    ) -> Result<Page<Review>, CoreError> {
        let rows = ReviewRepo::list_for_author(
            &self.pool,
            author_id,
            filter.profile_id,
            filter.public_only,
            filter.page.limit,
            filter.page.offset(),
        )
        .await
        .map_err(map_db_error)?;
        let total =
            ReviewRepo::count_for_author(&self.pool, author_id, filter.profile_id, filter.public_only)
                .await
                .map_err(map_db_error)?;
        Ok(Page::new(convert_all(rows)?, filter.page, total))
    }

    async fn update(&self, id: DbId, patch: &ReviewPatch) -> Result<Option<Review>, CoreError> {
        ReviewRepo::update(&self.pool, id, patch)
            .await
            .map_err(map_db_error)?
            .map(Review::try_from)
            .transpose()
    }

    async fn delete(&self, id: DbId) -> Result<bool, CoreError> {
        ReviewRepo::delete(&self.pool, id).await.map_err(map_db_error)
    }

    async fn increment_likes(&self, id: DbId) -> Result<Option<i64>, CoreError> {
        ReviewRepo::increment_likes(&self.pool, id)
            .await
            .map_err(map_db_error)
    }

    async fn ratings_for(&self, media_ref: &MediaRef) -> Result<Vec<f64>, CoreError> {
        ReviewRepo::ratings_for(&self.pool, &media_ref.to_string())
            .await
            .map_err(map_db_error)
    }

    async fn rating_summaries(
        &self,
        kind: Option<MediaKind>,
        limit: Option<i64>,
    ) -> Result<Vec<RatingSummary>, CoreError> {
        let rows = ReviewRepo::rating_summaries(&self.pool, kind, limit)
            .await
            .map_err(map_db_error)?;
        convert_all(rows)
    }
}
