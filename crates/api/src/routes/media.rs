//! Route definitions for the media catalog.

use axum::routing::get;
use axum::Router;

use crate::handlers::media;
use crate::state::AppState;

/// Media routes, nested under `/media`.
///
/// ```text
/// GET    /            list_media
/// POST   /            create_media (admin)
/// GET    /{id}        get_media
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(media::list_media).post(media::create_media))
        .route("/{id}", get(media::get_media))
}
