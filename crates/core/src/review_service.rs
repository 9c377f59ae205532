//! Review orchestration.
//!
//! [`ReviewService`] is the boundary the HTTP layer calls. Every mutation
//! writes the review first and only then recomputes the media aggregate, so
//! a recompute never runs ahead of the write that triggered it.
//!
//! Review lifecycle:
//!
//! ```text
//! (none) --create--> active --update--> active --delete--> (none)
//! ```

use std::sync::Arc;

use serde::Serialize;

use crate::aggregator::RatingAggregator;
use crate::error::CoreError;
use crate::media::{ExternalMetadata, MediaKind};
use crate::media_ref::{classify, MediaRef};
use crate::pagination::{clamp_limit, Page, PageRequest, MAX_PAGE_LIMIT};
use crate::rating::{validate_rating, AggregateRating, NO_RATING};
use crate::review::{
    normalize_content, AuthorReviewFilter, CreateReview, MediaReviewFilter, NewReview, Review,
    ReviewPatch, ReviewSort, ReviewVisibility,
};
use crate::roles::ROLE_ADMIN;
use crate::store::{MediaStore, ReviewStore};
use crate::types::DbId;

/// Default number of entries in the top-rated listing.
pub const DEFAULT_TOP_RATED_LIMIT: i64 = 10;

/* --------------------------------------------------------------------------
Inputs and results
-------------------------------------------------------------------------- */

/// The authenticated caller, as supplied by the auth layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: DbId,
    pub role: String,
}

impl Actor {
    pub fn new(user_id: DbId, role: impl Into<String>) -> Self {
        Self {
            user_id,
            role: role.into(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

/// Outcome of the recompute that follows a review mutation.
///
/// A failed recompute never fails the mutation itself: the review write has
/// already happened, so the stale aggregate is reported here instead and is
/// corrected by the next recompute of the same media.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingRefresh {
    pub rating: Option<AggregateRating>,
    pub aggregation_warning: Option<String>,
}

impl RatingRefresh {
    pub fn is_stale(&self) -> bool {
        self.aggregation_warning.is_some()
    }
}

/// A created or updated review together with the refreshed aggregate.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewWithRating {
    pub review: Review,
    #[serde(flatten)]
    pub refresh: RatingRefresh,
}

/// Result of a delete.
#[derive(Debug, Clone, Serialize)]
pub struct DeletedReview {
    pub review_id: DbId,
    pub media_ref: MediaRef,
    #[serde(flatten)]
    pub refresh: RatingRefresh,
}

/// Like counter after a like.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LikeCount {
    pub review_id: DbId,
    pub like_count: i64,
}

/// Options for listing a media item's reviews.
#[derive(Debug, Clone, Copy, Default)]
pub struct MediaReviewQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort: ReviewSort,
    /// Only honoured for administrators.
    pub include_non_public: bool,
}

/// Options for listing an author's reviews.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorReviewQuery {
    pub profile_id: Option<DbId>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// A page of reviews for one media item plus its current aggregate.
#[derive(Debug, Clone, Serialize)]
pub struct MediaReviews {
    pub media_ref: MediaRef,
    pub rating: AggregateRating,
    #[serde(flatten)]
    pub reviews: Page<Review>,
}

/// Current aggregate for one media reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MediaRating {
    pub media_ref: MediaRef,
    #[serde(flatten)]
    pub rating: AggregateRating,
}

/// One entry of the top-rated listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopRatedMedia {
    pub media_ref: MediaRef,
    pub media_id: Option<DbId>,
    pub media_kind: Option<MediaKind>,
    pub title: Option<String>,
    pub poster_path: Option<String>,
    pub rating: AggregateRating,
}

/* --------------------------------------------------------------------------
Service
-------------------------------------------------------------------------- */

/// Create, update and delete reviews while keeping media aggregates current.
#[derive(Clone)]
pub struct ReviewService {
    media: Arc<dyn MediaStore>,
    reviews: Arc<dyn ReviewStore>,
    aggregator: RatingAggregator,
}

impl ReviewService {
    pub fn new(media: Arc<dyn MediaStore>, reviews: Arc<dyn ReviewStore>) -> Self {
        let aggregator = RatingAggregator::new(Arc::clone(&reviews), Arc::clone(&media));
        Self {
            media,
            reviews,
            aggregator,
        }
    }

    /// Create a review and refresh the reviewed media's aggregate.
    ///
    /// Local references must name an existing catalog item; external
    /// references are taken as given.
    pub async fn create_review(
        &self,
        actor: &Actor,
        input: CreateReview,
    ) -> Result<ReviewWithRating, CoreError> {
        let content = normalize_content(&input.content)?;
        let rating = input.rating.unwrap_or(NO_RATING);
        validate_rating(rating)?;

        let media_ref = classify(&input.media_ref)?;
        self.ensure_media_exists(&media_ref).await?;

        let new_review = NewReview {
            author_id: actor.user_id,
            profile_id: input.profile_id,
            media_ref,
            rating,
            content,
            is_public: input.is_public.unwrap_or(true),
            spoiler: input.spoiler.unwrap_or(false),
        };
        let review = self.reviews.create(&new_review).await?;

        tracing::info!(
            user_id = actor.user_id,
            profile_id = review.profile_id,
            review_id = review.id,
            media_ref = %media_ref,
            "Review created"
        );

        if let (true, Some(metadata)) = (media_ref.is_external(), &input.external_metadata) {
            self.cache_external(&media_ref, metadata).await;
        }

        let refresh = self.refresh_rating(&media_ref).await;
        Ok(ReviewWithRating { review, refresh })
    }

    /// Apply `patch` to the caller's own review and refresh the aggregate.
    ///
    /// The aggregate is recomputed even when the rating did not change.
    pub async fn update_review(
        &self,
        review_id: DbId,
        actor: &Actor,
        patch: ReviewPatch,
    ) -> Result<ReviewWithRating, CoreError> {
        let existing = self.require_review(review_id).await?;
        if existing.author_id != actor.user_id {
            return Err(CoreError::Forbidden(
                "You can only update your own reviews".to_string(),
            ));
        }

        let patch = patch.normalized()?;
        let review = self
            .reviews
            .update(review_id, &patch)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Review",
                id: review_id,
            })?;

        tracing::info!(user_id = actor.user_id, review_id, "Review updated");

        let refresh = self.refresh_rating(&review.media_ref).await;
        Ok(ReviewWithRating { review, refresh })
    }

    /// Delete a review (author or administrator) and refresh the aggregate.
    pub async fn delete_review(
        &self,
        review_id: DbId,
        actor: &Actor,
    ) -> Result<DeletedReview, CoreError> {
        let existing = self.require_review(review_id).await?;
        if existing.author_id != actor.user_id && !actor.is_admin() {
            return Err(CoreError::Forbidden(
                "You can only delete your own reviews".to_string(),
            ));
        }

        let media_ref = existing.media_ref;
        if !self.reviews.delete(review_id).await? {
            return Err(CoreError::NotFound {
                entity: "Review",
                id: review_id,
            });
        }

        tracing::info!(
            user_id = actor.user_id,
            review_id,
            media_ref = %media_ref,
            "Review deleted"
        );

        let refresh = self.refresh_rating(&media_ref).await;
        Ok(DeletedReview {
            review_id,
            media_ref,
            refresh,
        })
    }

    /// Add a like. Likes never touch the aggregate.
    pub async fn like_review(&self, review_id: DbId) -> Result<LikeCount, CoreError> {
        let like_count = self
            .reviews
            .increment_likes(review_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Review",
                id: review_id,
            })?;
        Ok(LikeCount {
            review_id,
            like_count,
        })
    }

    /// Fetch one review. Private reviews are visible to their author and to
    /// administrators only.
    pub async fn get_review(
        &self,
        review_id: DbId,
        viewer: Option<&Actor>,
    ) -> Result<Review, CoreError> {
        let review = self.require_review(review_id).await?;
        let allowed = review.is_public
            || viewer.is_some_and(|v| v.user_id == review.author_id || v.is_admin());
        if !allowed {
            return Err(CoreError::Forbidden("This review is private".to_string()));
        }
        Ok(review)
    }

    /// List the reviews of one media item together with its aggregate.
    pub async fn list_media_reviews(
        &self,
        raw_media_ref: &str,
        viewer: Option<&Actor>,
        query: MediaReviewQuery,
    ) -> Result<MediaReviews, CoreError> {
        let media_ref = classify(raw_media_ref)?;
        let rating = self.current_rating(&media_ref).await?;

        let visibility = match viewer {
            Some(v) if v.is_admin() && query.include_non_public => ReviewVisibility::All,
            Some(v) => ReviewVisibility::PublicAndOwn(v.user_id),
            None => ReviewVisibility::PublicOnly,
        };
        let filter = MediaReviewFilter {
            visibility,
            sort: query.sort,
            page: PageRequest::new(query.page, query.limit),
        };
        let reviews = self.reviews.find_by_media(&media_ref, &filter).await?;

        Ok(MediaReviews {
            media_ref,
            rating,
            reviews,
        })
    }

    /// List an author's reviews, most recent first. Other viewers only see
    /// the public ones.
    pub async fn list_author_reviews(
        &self,
        author_id: DbId,
        viewer: Option<&Actor>,
        query: AuthorReviewQuery,
    ) -> Result<Page<Review>, CoreError> {
        let filter = AuthorReviewFilter {
            profile_id: query.profile_id,
            public_only: viewer.is_none_or(|v| v.user_id != author_id),
            page: PageRequest::new(query.page, query.limit),
        };
        self.reviews.find_by_author(author_id, &filter).await
    }

    /// Current aggregate for a raw reference.
    pub async fn media_rating(&self, raw_media_ref: &str) -> Result<MediaRating, CoreError> {
        let media_ref = classify(raw_media_ref)?;
        let rating = self.current_rating(&media_ref).await?;
        Ok(MediaRating { media_ref, rating })
    }

    /// Best-rated media across local and external references.
    ///
    /// Entries are enriched with catalog or cached display data where
    /// available. With a `kind` filter, local references whose catalog row is
    /// missing are skipped since their kind is unknown.
    pub async fn top_rated(
        &self,
        limit: Option<i64>,
        kind: Option<MediaKind>,
    ) -> Result<Vec<TopRatedMedia>, CoreError> {
        let limit = clamp_limit(limit, DEFAULT_TOP_RATED_LIMIT, MAX_PAGE_LIMIT);
        let summaries = self.reviews.rating_summaries(kind, Some(limit)).await?;

        let mut entries = Vec::with_capacity(summaries.len());
        for summary in summaries {
            entries.push(self.describe(summary.media_ref, summary.rating).await?);
        }
        Ok(entries)
    }

    /* ----------------------------------------------------------------------
    Helpers
    ---------------------------------------------------------------------- */

    async fn require_review(&self, review_id: DbId) -> Result<Review, CoreError> {
        self.reviews
            .find_by_id(review_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Review",
                id: review_id,
            })
    }

    async fn ensure_media_exists(&self, media_ref: &MediaRef) -> Result<(), CoreError> {
        if let Some(id) = media_ref.local_id() {
            self.media
                .find_by_local_id(id)
                .await?
                .ok_or_else(|| CoreError::MediaNotFound(media_ref.to_string()))?;
        }
        Ok(())
    }

    /// Stored aggregate for local media, computed aggregate for external.
    async fn current_rating(&self, media_ref: &MediaRef) -> Result<AggregateRating, CoreError> {
        match media_ref.local_id() {
            Some(id) => self
                .media
                .find_by_local_id(id)
                .await?
                .map(|item| item.aggregate_rating)
                .ok_or_else(|| CoreError::MediaNotFound(media_ref.to_string())),
            None => self.aggregator.compute(media_ref).await,
        }
    }

    async fn refresh_rating(&self, media_ref: &MediaRef) -> RatingRefresh {
        match self.aggregator.recompute(media_ref).await {
            Ok(rating) => RatingRefresh {
                rating: Some(rating),
                aggregation_warning: None,
            },
            Err(err) => {
                let failure = CoreError::AggregationFailed {
                    media_ref: media_ref.to_string(),
                    reason: err.to_string(),
                };
                tracing::warn!(
                    media_ref = %media_ref,
                    error = %failure,
                    "Review saved but aggregate rating is stale"
                );
                RatingRefresh {
                    rating: None,
                    aggregation_warning: Some(failure.to_string()),
                }
            }
        }
    }

    async fn cache_external(&self, media_ref: &MediaRef, metadata: &ExternalMetadata) {
        if let Err(err) = self.media.upsert_external_cache(media_ref, metadata).await {
            tracing::warn!(
                media_ref = %media_ref,
                error = %err,
                "Failed to cache external media metadata"
            );
        }
    }

    async fn describe(
        &self,
        media_ref: MediaRef,
        rating: AggregateRating,
    ) -> Result<TopRatedMedia, CoreError> {
        let mut entry = TopRatedMedia {
            media_ref,
            media_id: None,
            media_kind: media_ref.kind(),
            title: None,
            poster_path: None,
            rating,
        };
        match media_ref {
            MediaRef::Local(id) => {
                if let Some(item) = self.media.find_by_local_id(id).await? {
                    entry.media_id = Some(item.id);
                    entry.media_kind = Some(item.media_kind);
                    entry.title = Some(item.title);
                    entry.poster_path = item.poster_path;
                }
            }
            MediaRef::External { kind, external_id } => {
                if let Some(cached) = self.media.find_external_cache(&media_ref).await? {
                    entry.title = cached.title;
                    entry.poster_path = cached.poster_path;
                } else if let Some(item) = self.media.find_by_external(kind, external_id).await? {
                    // Imported into the catalog after it was reviewed.
                    entry.title = Some(item.title);
                    entry.poster_path = item.poster_path;
                }
            }
        }
        Ok(entry)
    }
}
