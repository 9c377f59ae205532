pub mod health;
pub mod media;
pub mod reviews;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /reviews                                 create (auth)
/// /reviews/top-rated                       best-rated media (?limit=&kind=)
/// /reviews/mine                            caller's reviews (auth)
/// /reviews/media/{media_ref}               reviews of one media item
/// /reviews/media/{media_ref}/rating        current aggregate
/// /reviews/user/{user_id}                  a user's reviews
/// /reviews/{id}                            get, update, delete
/// /reviews/{id}/like                       like (auth)
///
/// /media                                   list, create (admin)
/// /media/{id}                              get
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/reviews", reviews::router())
        .nest("/media", media::router())
}
