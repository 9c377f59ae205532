//! JWT-based authentication extractors for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use marquee_core::error::CoreError;
use marquee_core::review_service::Actor;
use marquee_core::types::DbId;

use crate::auth::jwt::verify_access_token;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated caller extracted from a JWT Bearer token in the
/// `Authorization` header.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, role = %user.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The account id (from `claims.sub`).
    pub user_id: DbId,
    /// The role name (`"admin"` or `"user"`).
    pub role: String,
}

impl AuthUser {
    /// The caller as the review service sees it.
    pub fn actor(&self) -> Actor {
        Actor::new(self.user_id, self.role.clone())
    }
}

fn unauthorized(message: &str) -> AppError {
    AppError::Core(CoreError::Unauthorized(message.into()))
}

/// Verify a raw `Authorization` header value.
fn authenticate(header: &str, state: &AppState) -> Result<AuthUser, AppError> {
    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| unauthorized("Invalid Authorization format. Expected: Bearer <token>"))?;

    let claims = verify_access_token(token, &state.config.jwt)
        .map_err(|_| unauthorized("Invalid or expired token"))?;

    Ok(AuthUser {
        user_id: claims.sub,
        role: claims.role,
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| unauthorized("Missing Authorization header"))?;
        authenticate(header, state)
    }
}

/// Caller identity for routes that also serve anonymous viewers.
///
/// A missing header yields `None`; a present but invalid token is still
/// rejected with 401.
#[derive(Debug, Clone)]
pub struct OptionalAuthUser(pub Option<AuthUser>);

impl OptionalAuthUser {
    pub fn actor(&self) -> Option<Actor> {
        self.0.as_ref().map(AuthUser::actor)
    }
}

impl FromRequestParts<AppState> for OptionalAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match parts.headers.get(AUTHORIZATION) {
            None => Ok(OptionalAuthUser(None)),
            Some(value) => {
                let header = value
                    .to_str()
                    .map_err(|_| unauthorized("Malformed Authorization header"))?;
                Ok(OptionalAuthUser(Some(authenticate(header, state)?)))
            }
        }
    }
}
