//! Route definitions for reviews.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::reviews;
use crate::state::AppState;

/// Review routes, nested under `/reviews`.
///
/// Static segments (`top-rated`, `mine`, `media`, `user`) take precedence
/// over `/{id}`.
///
/// ```text
/// POST   /                            create_review
/// GET    /top-rated                   top_rated
/// GET    /mine                        list_my_reviews
/// GET    /media/{media_ref}           list_media_reviews
/// GET    /media/{media_ref}/rating    media_rating
/// GET    /user/{user_id}              list_user_reviews
/// GET    /{id}                        get_review
/// PUT    /{id}                        update_review
/// DELETE /{id}                        delete_review
/// POST   /{id}/like                   like_review
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(reviews::create_review))
        .route("/top-rated", get(reviews::top_rated))
        .route("/mine", get(reviews::list_my_reviews))
        .route("/media/{media_ref}", get(reviews::list_media_reviews))
        .route("/media/{media_ref}/rating", get(reviews::media_rating))
        .route("/user/{user_id}", get(reviews::list_user_reviews))
        .route(
            "/{id}",
            get(reviews::get_review)
                .put(reviews::update_review)
                .delete(reviews::delete_review),
        )
        .route("/{id}/like", post(reviews::like_review))
}
