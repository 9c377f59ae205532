//! Catalog media types (local media items and the external display cache).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::media_ref::MediaRef;
use crate::rating::AggregateRating;
use crate::types::{DbId, Timestamp};

/* --------------------------------------------------------------------------
Constants
-------------------------------------------------------------------------- */

/// Maximum length for a media title.
pub const MAX_TITLE_LENGTH: u64 = 500;

/// Maximum length for a media overview.
pub const MAX_OVERVIEW_LENGTH: u64 = 10_000;

/* --------------------------------------------------------------------------
Media kind
-------------------------------------------------------------------------- */

/// The kind of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    #[serde(alias = "tv")]
    Series,
}

impl MediaKind {
    /// Database and canonical-key representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Series => "series",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = CoreError;

    /// Parses `movie`, `series`, or the catalog provider's `tv` alias,
    /// ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "movie" => Ok(MediaKind::Movie),
            "series" | "tv" => Ok(MediaKind::Series),
            other => Err(CoreError::Validation(format!(
                "Invalid media kind '{other}'. Must be one of: movie, series"
            ))),
        }
    }
}

/* --------------------------------------------------------------------------
Media items
-------------------------------------------------------------------------- */

/// A media item persisted in the local catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaItem {
    pub id: DbId,
    pub external_id: i64,
    pub media_kind: MediaKind,
    pub title: String,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<chrono::NaiveDate>,
    pub aggregate_rating: AggregateRating,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl MediaItem {
    /// The reference reviews use to point at this item.
    pub fn media_ref(&self) -> MediaRef {
        MediaRef::Local(self.id)
    }
}

/// Input for adding a media item to the local catalog, either fetched from
/// the catalog provider or entered by an administrator.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewMediaItem {
    #[validate(range(min = 1, message = "external_id must be positive"))]
    pub external_id: i64,
    pub media_kind: MediaKind,
    #[validate(length(min = 1, max = MAX_TITLE_LENGTH))]
    pub title: String,
    #[validate(length(max = MAX_OVERVIEW_LENGTH))]
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<chrono::NaiveDate>,
}

impl NewMediaItem {
    /// Run the derived field checks and fold them into a [`CoreError`].
    pub fn check(&self) -> Result<(), CoreError> {
        self.validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;
        if self.title.trim().is_empty() {
            return Err(CoreError::Validation(
                "Media title must not be blank".to_string(),
            ));
        }
        Ok(())
    }
}

/* --------------------------------------------------------------------------
External display cache
-------------------------------------------------------------------------- */

/// Display metadata a client supplies alongside a review of external media.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalMetadata {
    pub title: Option<String>,
    pub poster_path: Option<String>,
    pub overview: Option<String>,
}

/// Cached display metadata for media known only by an external key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExternalMediaCacheEntry {
    pub media_ref: MediaRef,
    pub title: Option<String>,
    pub poster_path: Option<String>,
    pub overview: Option<String>,
    pub updated_at: Timestamp,
}
