//! Shared query parameter types for API handlers.
//!
//! Enum-valued parameters arrive as strings and are parsed here so that a bad
//! value produces the standard JSON error body instead of a bare extractor
//! rejection.

use marquee_core::error::CoreError;
use marquee_core::media::MediaKind;
use marquee_core::review::ReviewSort;
use marquee_core::review_service::{AuthorReviewQuery, MediaReviewQuery};
use marquee_core::types::DbId;
use serde::Deserialize;

/// Parse an optional `kind` parameter.
fn parse_kind(kind: Option<&str>) -> Result<Option<MediaKind>, CoreError> {
    kind.filter(|k| !k.is_empty()).map(str::parse).transpose()
}

/// `GET /reviews/media/{media_ref}` parameters.
#[derive(Debug, Default, Deserialize)]
pub struct MediaReviewParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort: Option<String>,
    #[serde(default)]
    pub include_non_public: bool,
}

impl MediaReviewParams {
    pub fn into_query(self) -> Result<MediaReviewQuery, CoreError> {
        let sort = match self.sort.as_deref() {
            None | Some("") => ReviewSort::default(),
            Some(raw) => raw.parse()?,
        };
        Ok(MediaReviewQuery {
            page: self.page,
            limit: self.limit,
            sort,
            include_non_public: self.include_non_public,
        })
    }
}

/// `GET /reviews/user/{user_id}` and `GET /reviews/mine` parameters.
#[derive(Debug, Default, Deserialize)]
pub struct AuthorReviewParams {
    pub profile_id: Option<DbId>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl From<AuthorReviewParams> for AuthorReviewQuery {
    fn from(params: AuthorReviewParams) -> Self {
        AuthorReviewQuery {
            profile_id: params.profile_id,
            page: params.page,
            limit: params.limit,
        }
    }
}

/// `GET /reviews/top-rated` parameters.
#[derive(Debug, Default, Deserialize)]
pub struct TopRatedParams {
    pub limit: Option<i64>,
    pub kind: Option<String>,
}

impl TopRatedParams {
    pub fn kind(&self) -> Result<Option<MediaKind>, CoreError> {
        parse_kind(self.kind.as_deref())
    }
}

/// `GET /media` parameters.
#[derive(Debug, Default, Deserialize)]
pub struct MediaListParams {
    pub kind: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl MediaListParams {
    pub fn kind(&self) -> Result<Option<MediaKind>, CoreError> {
        parse_kind(self.kind.as_deref())
    }
}
