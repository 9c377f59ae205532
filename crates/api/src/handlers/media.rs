//! Handlers for the local media catalog.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use marquee_core::error::CoreError;
use marquee_core::media::{MediaItem, NewMediaItem};
use marquee_core::pagination::{Page, PageRequest};
use marquee_core::types::DbId;
use marquee_db::repositories::MediaItemRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::query::MediaListParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /media
///
/// List catalog entries, newest first, optionally filtered by `kind`.
pub async fn list_media(
    State(state): State<AppState>,
    Query(params): Query<MediaListParams>,
) -> AppResult<impl IntoResponse> {
    let kind = params.kind()?;
    let request = PageRequest::new(params.page, params.limit);

    let rows = MediaItemRepo::list(&state.pool, kind, request.limit, request.offset()).await?;
    let total = MediaItemRepo::count(&state.pool, kind).await?;
    let items = rows
        .into_iter()
        .map(MediaItem::try_from)
        .collect::<Result<Vec<_>, CoreError>>()?;

    Ok(Json(DataResponse {
        data: Page::new(items, request, total),
    }))
}

/// POST /media
///
/// Add a catalog entry (admin only). A duplicate `(external_id, media_kind)`
/// is rejected with 409.
pub async fn create_media(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<NewMediaItem>,
) -> AppResult<impl IntoResponse> {
    input.check()?;

    let row = MediaItemRepo::create(&state.pool, &input).await?;
    let item = MediaItem::try_from(row)?;

    tracing::info!(
        user_id = admin.user_id,
        media_id = item.id,
        external_id = item.external_id,
        media_kind = %item.media_kind,
        "Media item created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: item })))
}

/// GET /media/{id}
pub async fn get_media(
    State(state): State<AppState>,
    Path(media_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let row = MediaItemRepo::find_by_id(&state.pool, media_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "MediaItem",
                id: media_id,
            })
        })?;
    Ok(Json(DataResponse {
        data: MediaItem::try_from(row)?,
    }))
}
