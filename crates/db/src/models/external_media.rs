//! External media display cache row.

use marquee_core::error::CoreError;
use marquee_core::media::ExternalMediaCacheEntry;
use marquee_core::types::{DbId, Timestamp};
use sqlx::FromRow;

use super::review::parse_stored_ref;

/// A row from the `external_media_cache` table.
#[derive(Debug, Clone, FromRow)]
pub struct ExternalMediaRow {
    pub id: DbId,
    pub media_ref: String,
    pub title: Option<String>,
    pub poster_path: Option<String>,
    pub overview: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<ExternalMediaRow> for ExternalMediaCacheEntry {
    type Error = CoreError;

    fn try_from(row: ExternalMediaRow) -> Result<Self, Self::Error> {
        Ok(ExternalMediaCacheEntry {
            media_ref: parse_stored_ref(&row.media_ref)?,
            title: row.title,
            poster_path: row.poster_path,
            overview: row.overview,
            updated_at: row.updated_at,
        })
    }
}
