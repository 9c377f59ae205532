//! Row structs.
//!
//! Each submodule contains a `FromRow` struct matching one table and a
//! conversion into the corresponding `marquee_core` type.

pub mod external_media;
pub mod media_item;
pub mod review;
