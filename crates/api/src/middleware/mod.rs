//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Authenticated caller from a JWT Bearer token.
//! - [`auth::OptionalAuthUser`] -- Same, but anonymous requests are allowed.
//! - [`rbac::RequireAdmin`] -- Requires the `admin` role.

pub mod auth;
pub mod rbac;
