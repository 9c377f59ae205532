//! Handlers for reviews and media ratings.
//!
//! Every mutation goes through [`ReviewService`](marquee_core::review_service::ReviewService),
//! which keeps the stored aggregate in step with the review set. A failed
//! recompute still returns success with `aggregation_warning` set.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use marquee_core::review::{CreateReview, ReviewPatch};
use marquee_core::types::DbId;

use crate::error::AppResult;
use crate::middleware::auth::{AuthUser, OptionalAuthUser};
use crate::query::{AuthorReviewParams, MediaReviewParams, TopRatedParams};
use crate::response::DataResponse;
use crate::state::AppState;

/* --------------------------------------------------------------------------
Mutations
-------------------------------------------------------------------------- */

/// POST /reviews
///
/// Create a review for a local or external media reference.
pub async fn create_review(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateReview>,
) -> AppResult<impl IntoResponse> {
    let created = state.reviews.create_review(&auth.actor(), input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

/// PUT /reviews/{id}
///
/// Update the caller's own review.
pub async fn update_review(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(review_id): Path<DbId>,
    Json(patch): Json<ReviewPatch>,
) -> AppResult<impl IntoResponse> {
    let updated = state
        .reviews
        .update_review(review_id, &auth.actor(), patch)
        .await?;
    Ok(Json(DataResponse { data: updated }))
}

/// DELETE /reviews/{id}
///
/// Delete a review. Authors may delete their own; administrators any.
pub async fn delete_review(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(review_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let deleted = state.reviews.delete_review(review_id, &auth.actor()).await?;
    Ok(Json(DataResponse { data: deleted }))
}

/// POST /reviews/{id}/like
pub async fn like_review(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(review_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let likes = state.reviews.like_review(review_id).await?;
    tracing::debug!(user_id = auth.user_id, review_id, "Review liked");
    Ok(Json(DataResponse { data: likes }))
}

/* --------------------------------------------------------------------------
Reads
-------------------------------------------------------------------------- */

/// GET /reviews/{id}
pub async fn get_review(
    viewer: OptionalAuthUser,
    State(state): State<AppState>,
    Path(review_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let review = state
        .reviews
        .get_review(review_id, viewer.actor().as_ref())
        .await?;
    Ok(Json(DataResponse { data: review }))
}

/// GET /reviews/media/{media_ref}
///
/// One page of a media item's reviews plus its current aggregate.
pub async fn list_media_reviews(
    viewer: OptionalAuthUser,
    State(state): State<AppState>,
    Path(media_ref): Path<String>,
    Query(params): Query<MediaReviewParams>,
) -> AppResult<impl IntoResponse> {
    let query = params.into_query()?;
    let page = state
        .reviews
        .list_media_reviews(&media_ref, viewer.actor().as_ref(), query)
        .await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /reviews/media/{media_ref}/rating
pub async fn media_rating(
    State(state): State<AppState>,
    Path(media_ref): Path<String>,
) -> AppResult<impl IntoResponse> {
    let rating = state.reviews.media_rating(&media_ref).await?;
    Ok(Json(DataResponse { data: rating }))
}

/// GET /reviews/user/{user_id}
///
/// A user's reviews. Private ones are included only for the user themself.
pub async fn list_user_reviews(
    viewer: OptionalAuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
    Query(params): Query<AuthorReviewParams>,
) -> AppResult<impl IntoResponse> {
    let page = state
        .reviews
        .list_author_reviews(user_id, viewer.actor().as_ref(), params.into())
        .await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /reviews/mine
pub async fn list_my_reviews(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<AuthorReviewParams>,
) -> AppResult<impl IntoResponse> {
    let actor = auth.actor();
    let page = state
        .reviews
        .list_author_reviews(actor.user_id, Some(&actor), params.into())
        .await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /reviews/top-rated
pub async fn top_rated(
    State(state): State<AppState>,
    Query(params): Query<TopRatedParams>,
) -> AppResult<impl IntoResponse> {
    let kind = params.kind()?;
    let entries = state.reviews.top_rated(params.limit, kind).await?;
    Ok(Json(DataResponse { data: entries }))
}
