//! Rating values and the aggregate derived from them.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Lowest accepted rating. Also the "text review, no rating" sentinel.
pub const MIN_RATING: f64 = 0.0;

/// Highest accepted rating.
pub const MAX_RATING: f64 = 5.0;

/// Rating value meaning "no numeric rating". Never aggregated.
pub const NO_RATING: f64 = 0.0;

/// The `{average, review_count}` pair shown for a media item.
///
/// Only ratings strictly greater than zero participate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AggregateRating {
    pub average: f64,
    pub review_count: i64,
}

impl AggregateRating {
    /// Aggregate for media with no numeric ratings.
    pub const EMPTY: AggregateRating = AggregateRating {
        average: 0.0,
        review_count: 0,
    };

    /// Compute the aggregate of a set of rating values.
    ///
    /// Zero (and anything not above zero) is skipped, so callers may pass an
    /// unfiltered set.
    pub fn from_ratings(ratings: &[f64]) -> Self {
        let counted: Vec<f64> = ratings.iter().copied().filter(|r| *r > NO_RATING).collect();
        if counted.is_empty() {
            return Self::EMPTY;
        }
        let mean = counted.iter().sum::<f64>() / counted.len() as f64;
        AggregateRating {
            average: round_to_tenth(mean),
            review_count: counted.len() as i64,
        }
    }
}

/// Round to one decimal place, half away from zero.
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Validate that a rating is a finite number within `[0, 5]`.
pub fn validate_rating(rating: f64) -> Result<(), CoreError> {
    if !rating.is_finite() || !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(CoreError::Validation(format!(
            "Rating must be between {MIN_RATING} and {MAX_RATING} (got {rating})"
        )));
    }
    Ok(())
}
