//! Media catalog row.

use chrono::NaiveDate;
use marquee_core::error::CoreError;
use marquee_core::media::MediaItem;
use marquee_core::rating::AggregateRating;
use marquee_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `media_items` table.
#[derive(Debug, Clone, FromRow)]
pub struct MediaItemRow {
    pub id: DbId,
    pub external_id: i64,
    pub media_kind: String,
    pub title: String,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub rating_average: f64,
    pub rating_count: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<MediaItemRow> for MediaItem {
    type Error = CoreError;

    fn try_from(row: MediaItemRow) -> Result<Self, Self::Error> {
        let media_kind = row.media_kind.parse().map_err(|_| {
            CoreError::Internal(format!(
                "media_items.{} has unknown media_kind '{}'",
                row.id, row.media_kind
            ))
        })?;
        Ok(MediaItem {
            id: row.id,
            external_id: row.external_id,
            media_kind,
            title: row.title,
            overview: row.overview,
            poster_path: row.poster_path,
            backdrop_path: row.backdrop_path,
            release_date: row.release_date,
            aggregate_rating: AggregateRating {
                average: row.rating_average,
                review_count: row.rating_count,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
