//! Review rows.

use marquee_core::error::CoreError;
use marquee_core::media_ref::MediaRef;
use marquee_core::rating::AggregateRating;
use marquee_core::review::Review;
use marquee_core::store::RatingSummary;
use marquee_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `reviews` table.
#[derive(Debug, Clone, FromRow)]
pub struct ReviewRow {
    pub id: DbId,
    pub author_id: DbId,
    pub profile_id: DbId,
    pub media_ref: String,
    pub rating: f64,
    pub content: String,
    pub is_public: bool,
    pub spoiler: bool,
    pub like_count: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<ReviewRow> for Review {
    type Error = CoreError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        Ok(Review {
            id: row.id,
            author_id: row.author_id,
            profile_id: row.profile_id,
            media_ref: parse_stored_ref(&row.media_ref)?,
            rating: row.rating,
            content: row.content,
            is_public: row.is_public,
            spoiler: row.spoiler,
            like_count: row.like_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Per-reference aggregate as returned by the top-rated query. `average`
/// is already rounded to one decimal by the query.
#[derive(Debug, Clone, FromRow)]
pub struct RatingSummaryRow {
    pub media_ref: String,
    pub average: f64,
    pub review_count: i64,
}

impl TryFrom<RatingSummaryRow> for RatingSummary {
    type Error = CoreError;

    fn try_from(row: RatingSummaryRow) -> Result<Self, Self::Error> {
        Ok(RatingSummary {
            media_ref: parse_stored_ref(&row.media_ref)?,
            rating: AggregateRating {
                average: row.average,
                review_count: row.review_count,
            },
        })
    }
}

/// Stored references are always canonical; anything else is corruption.
pub(crate) fn parse_stored_ref(raw: &str) -> Result<MediaRef, CoreError> {
    raw.parse()
        .map_err(|_| CoreError::Internal(format!("Stored media reference '{raw}' is malformed")))
}
