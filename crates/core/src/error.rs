use crate::types::DbId;

/// Domain error shared by every layer of the review subsystem.
///
/// The core never decides on transport status codes; the API crate maps
/// each variant onto an HTTP response.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Invalid media reference: {0}")]
    InvalidMediaReference(String),

    #[error("Invalid review content: {0}")]
    InvalidContent(String),

    #[error("Media not found: {0}")]
    MediaNotFound(String),

    #[error("This profile has already reviewed media {media_ref}")]
    DuplicateReview { media_ref: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Rating aggregation failed for {media_ref}: {reason}")]
    AggregationFailed { media_ref: String, reason: String },

    #[error("Internal error: {0}")]
    Internal(String),
}
