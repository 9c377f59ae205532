//! Storage seams for the review subsystem.
//!
//! `marquee_db` (Postgres) and [`crate::memory`] implement these traits. Every
//! method is a suspension point; implementations must not cache reads.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::CoreError;
use crate::media::{ExternalMediaCacheEntry, ExternalMetadata, MediaItem, MediaKind};
use crate::media_ref::MediaRef;
use crate::pagination::Page;
use crate::rating::AggregateRating;
use crate::review::{AuthorReviewFilter, MediaReviewFilter, NewReview, Review, ReviewPatch};
use crate::types::DbId;

/// Aggregate for one media reference, as computed from stored reviews.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingSummary {
    pub media_ref: MediaRef,
    pub rating: AggregateRating,
}

/// Persisted catalog of media items and the external display cache.
///
/// The aggregate-rating columns are written only through
/// [`MediaStore::set_aggregate_rating`], which only the rating aggregator
/// calls.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn find_by_local_id(&self, id: DbId) -> Result<Option<MediaItem>, CoreError>;

    async fn find_by_external(
        &self,
        kind: MediaKind,
        external_id: i64,
    ) -> Result<Option<MediaItem>, CoreError>;

    /// Overwrite the stored aggregate. Returns `true` when a row was written;
    /// external references and unknown local ids are a no-op.
    async fn set_aggregate_rating(
        &self,
        media_ref: &MediaRef,
        rating: &AggregateRating,
    ) -> Result<bool, CoreError>;

    /// Insert or refresh the display cache for an external reference.
    async fn upsert_external_cache(
        &self,
        media_ref: &MediaRef,
        metadata: &ExternalMetadata,
    ) -> Result<ExternalMediaCacheEntry, CoreError>;

    async fn find_external_cache(
        &self,
        media_ref: &MediaRef,
    ) -> Result<Option<ExternalMediaCacheEntry>, CoreError>;
}

/// Persisted reviews.
///
/// `create` must enforce `(author_id, profile_id, media_ref)` uniqueness
/// atomically and fail with [`CoreError::DuplicateReview`].
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn create(&self, review: &NewReview) -> Result<Review, CoreError>;

    async fn find_by_id(&self, id: DbId) -> Result<Option<Review>, CoreError>;

    async fn find_by_media(
        &self,
        media_ref: &MediaRef,
        filter: &MediaReviewFilter,
    ) -> Result<Page<Review>, CoreError>;

    async fn find_by_author(
        &self,
        author_id: DbId,
        filter: &AuthorReviewFilter,
    ) -> Result<Page<Review>, CoreError>;

    /// Apply `patch`, returning the updated review or `None` if it is gone.
    async fn update(&self, id: DbId, patch: &ReviewPatch) -> Result<Option<Review>, CoreError>;

    /// Hard-delete a review. Returns `true` if a row was removed.
    async fn delete(&self, id: DbId) -> Result<bool, CoreError>;

    /// Atomically add one like, returning the new count.
    async fn increment_likes(&self, id: DbId) -> Result<Option<i64>, CoreError>;

    /// Every rating above zero for `media_ref`, read at call time.
    async fn ratings_for(&self, media_ref: &MediaRef) -> Result<Vec<f64>, CoreError>;

    /// Aggregates per media reference, best first (average desc, count desc,
    /// reference asc), ordered by the same rounded average that is returned.
    ///
    /// With `kind`, external references match on their own kind and local
    /// ones on their catalog row; local references without a row are
    /// skipped. A `None` limit returns every rated reference.
    async fn rating_summaries(
        &self,
        kind: Option<MediaKind>,
        limit: Option<i64>,
    ) -> Result<Vec<RatingSummary>, CoreError>;
}
