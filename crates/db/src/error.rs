//! Translation of sqlx failures into [`CoreError`].

use marquee_core::error::CoreError;

/// Constraint guarding one review per `(author_id, profile_id, media_ref)`.
pub const UQ_REVIEWS_AUTHOR_PROFILE_MEDIA: &str = "uq_reviews_author_profile_media";

/// PostgreSQL `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Map a sqlx error onto the domain error taxonomy.
///
/// - Unique violations on `uq_` constraints become [`CoreError::Conflict`].
/// - Everything else becomes [`CoreError::StorageUnavailable`].
pub fn map_db_error(err: sqlx::Error) -> CoreError {
    if let Some(constraint) = unique_violation(&err) {
        if constraint.starts_with("uq_") {
            return CoreError::Conflict(format!(
                "Duplicate value violates unique constraint: {constraint}"
            ));
        }
    }
    tracing::error!(error = %err, "Database error");
    CoreError::StorageUnavailable(err.to_string())
}

/// Name of the violated constraint, if `err` is a unique violation.
pub fn unique_violation(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            Some(db_err.constraint().unwrap_or("unknown").to_string())
        }
        _ => None,
    }
}
