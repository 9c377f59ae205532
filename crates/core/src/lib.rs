//! Domain logic for media reviews and rating consistency.
//!
//! Storage is reached only through the traits in [`store`]; the Postgres
//! adapters live in `marquee-db` and the in-process ones in [`memory`].

pub mod aggregator;
pub mod error;
pub mod media;
pub mod media_ref;
pub mod memory;
pub mod pagination;
pub mod rating;
pub mod review;
pub mod review_service;
pub mod roles;
pub mod store;
pub mod types;
