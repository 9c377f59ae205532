use std::sync::Arc;

use marquee_core::review_service::ReviewService;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: marquee_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Review orchestration over the Postgres stores.
    pub reviews: Arc<ReviewService>,
}

impl AppState {
    /// Wire the review service to Postgres-backed stores on `pool`.
    pub fn new(pool: marquee_db::DbPool, config: ServerConfig) -> Self {
        let reviews = ReviewService::new(
            Arc::new(marquee_db::PgMediaStore::new(pool.clone())),
            Arc::new(marquee_db::PgReviewStore::new(pool.clone())),
        );
        Self {
            pool,
            config: Arc::new(config),
            reviews: Arc::new(reviews),
        }
    }
}
