//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod external_media_repo;
pub mod media_item_repo;
pub mod review_repo;

pub use external_media_repo::ExternalMediaRepo;
pub use media_item_repo::MediaItemRepo;
pub use review_repo::ReviewRepo;
