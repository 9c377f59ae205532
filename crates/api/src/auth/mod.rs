//! Authentication primitives.
//!
//! - [`jwt`] -- verifies HS256 bearer tokens issued by the accounts service.

pub mod jwt;
