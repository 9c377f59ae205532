//! Review entity, inputs, listing options and validation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::media::ExternalMetadata;
use crate::media_ref::MediaRef;
use crate::pagination::PageRequest;
use crate::rating::{validate_rating, NO_RATING};
use crate::types::{DbId, Timestamp};

/* --------------------------------------------------------------------------
Constants
-------------------------------------------------------------------------- */

/// Maximum length of a review's text, in characters.
pub const MAX_CONTENT_LENGTH: usize = 1_000;

/* --------------------------------------------------------------------------
Entity
-------------------------------------------------------------------------- */

/// A stored review.
///
/// `author_id`, `profile_id` and `media_ref` are fixed at creation. At most
/// one review exists per `(author_id, profile_id, media_ref)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Review {
    pub id: DbId,
    pub author_id: DbId,
    pub profile_id: DbId,
    pub media_ref: MediaRef,
    /// `0` marks a text-only review.
    pub rating: f64,
    pub content: String,
    pub is_public: bool,
    pub spoiler: bool,
    pub like_count: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Review {
    /// Whether the review carries a numeric rating.
    pub fn is_rated(&self) -> bool {
        self.rating > NO_RATING
    }
}

/// A validated review ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub author_id: DbId,
    pub profile_id: DbId,
    pub media_ref: MediaRef,
    pub rating: f64,
    pub content: String,
    pub is_public: bool,
    pub spoiler: bool,
}

/// Caller input for creating a review.
///
/// `media_ref` is the raw reference as the client sent it; it is classified
/// before anything touches storage.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReview {
    pub profile_id: DbId,
    pub media_ref: String,
    pub rating: Option<f64>,
    pub content: String,
    pub is_public: Option<bool>,
    pub spoiler: Option<bool>,
    /// Display metadata cached for external media. Ignored for local media.
    pub external_metadata: Option<ExternalMetadata>,
}

/// The mutable subset of a review. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReviewPatch {
    pub rating: Option<f64>,
    pub content: Option<String>,
    pub is_public: Option<bool>,
    pub spoiler: Option<bool>,
}

impl ReviewPatch {
    /// Validate the supplied fields and return the patch with content
    /// trimmed.
    pub fn normalized(self) -> Result<Self, CoreError> {
        if let Some(rating) = self.rating {
            validate_rating(rating)?;
        }
        let content = match self.content {
            Some(content) => Some(normalize_content(&content)?),
            None => None,
        };
        Ok(Self { content, ..self })
    }
}

/* --------------------------------------------------------------------------
Listing
-------------------------------------------------------------------------- */

/// Sort order for a media item's reviews. Ties always fall back to most
/// recent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReviewSort {
    #[default]
    Recent,
    RatingHigh,
    RatingLow,
    Likes,
}

impl ReviewSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewSort::Recent => "recent",
            ReviewSort::RatingHigh => "rating-high",
            ReviewSort::RatingLow => "rating-low",
            ReviewSort::Likes => "likes",
        }
    }
}

impl fmt::Display for ReviewSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewSort {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "recent" => Ok(ReviewSort::Recent),
            "rating-high" => Ok(ReviewSort::RatingHigh),
            "rating-low" => Ok(ReviewSort::RatingLow),
            "likes" => Ok(ReviewSort::Likes),
            other => Err(CoreError::Validation(format!(
                "Invalid sort '{other}'. Must be one of: recent, rating-high, rating-low, likes"
            ))),
        }
    }
}

/// Which reviews a listing may include.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewVisibility {
    /// Public reviews only (anonymous viewers).
    PublicOnly,
    /// Public reviews plus the viewer's own private ones.
    PublicAndOwn(DbId),
    /// Everything (administrators asking for non-public reviews).
    All,
}

impl ReviewVisibility {
    /// Whether `review` passes this filter.
    pub fn admits(&self, review: &Review) -> bool {
        match self {
            ReviewVisibility::PublicOnly => review.is_public,
            ReviewVisibility::PublicAndOwn(viewer) => {
                review.is_public || review.author_id == *viewer
            }
            ReviewVisibility::All => true,
        }
    }
}

/// Store-level options for listing a media item's reviews.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaReviewFilter {
    pub visibility: ReviewVisibility,
    pub sort: ReviewSort,
    pub page: PageRequest,
}

/// Store-level options for listing an author's reviews.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AuthorReviewFilter {
    pub profile_id: Option<DbId>,
    pub public_only: bool,
    pub page: PageRequest,
}

/* --------------------------------------------------------------------------
Validation
-------------------------------------------------------------------------- */

/// Validate review text and return it trimmed.
///
/// The text must be non-empty after trimming and at most
/// [`MAX_CONTENT_LENGTH`] characters.
pub fn normalize_content(content: &str) -> Result<String, CoreError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidContent(
            "Review content must not be empty".to_string(),
        ));
    }
    let length = trimmed.chars().count();
    if length > MAX_CONTENT_LENGTH {
        return Err(CoreError::InvalidContent(format!(
            "Review content exceeds maximum length of {MAX_CONTENT_LENGTH} characters (got {length})"
        )));
    }
    Ok(trimmed.to_string())
}
