//! Rating aggregation.
//!
//! [`RatingAggregator`] is the only writer of a media item's stored
//! aggregate. It always reads the full current rating set, so whichever
//! recompute runs after the last committed review write leaves the correct
//! value behind; no locking across requests is needed.

use std::sync::Arc;

use crate::error::CoreError;
use crate::media_ref::MediaRef;
use crate::rating::AggregateRating;
use crate::store::{MediaStore, ReviewStore};

/// Derives `{average, review_count}` for a media reference from its reviews.
#[derive(Clone)]
pub struct RatingAggregator {
    reviews: Arc<dyn ReviewStore>,
    media: Arc<dyn MediaStore>,
}

impl RatingAggregator {
    pub fn new(reviews: Arc<dyn ReviewStore>, media: Arc<dyn MediaStore>) -> Self {
        Self { reviews, media }
    }

    /// Compute the aggregate without persisting it.
    ///
    /// This is how external media is rated: it has no catalog row, so its
    /// aggregate only ever exists on demand.
    pub async fn compute(&self, media_ref: &MediaRef) -> Result<AggregateRating, CoreError> {
        let ratings = self.reviews.ratings_for(media_ref).await?;
        Ok(AggregateRating::from_ratings(&ratings))
    }

    /// Compute the aggregate and, for local media, store it on the item.
    ///
    /// Must be awaited after the review write that triggered it has
    /// returned. Calling it again with no review change yields the same
    /// value and repeats the same write.
    pub async fn recompute(&self, media_ref: &MediaRef) -> Result<AggregateRating, CoreError> {
        let rating = self.compute(media_ref).await?;

        if media_ref.is_external() {
            tracing::debug!(
                media_ref = %media_ref,
                average = rating.average,
                review_count = rating.review_count,
                "Computed aggregate for external media (not persisted)"
            );
            return Ok(rating);
        }

        let written = self.media.set_aggregate_rating(media_ref, &rating).await?;
        if !written {
            tracing::warn!(
                media_ref = %media_ref,
                "Aggregate computed for local media with no catalog row"
            );
        }
        tracing::debug!(
            media_ref = %media_ref,
            average = rating.average,
            review_count = rating.review_count,
            "Aggregate rating stored"
        );
        Ok(rating)
    }
}
