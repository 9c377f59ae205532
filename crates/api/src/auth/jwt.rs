//! Bearer token verification.
//!
//! Tokens are issued by the accounts service and signed with a secret this
//! service shares. Only HS256 is accepted, and `exp` and `sub` must both be
//! present. [`mint_access_token`] signs with the same secret; the server
//! never calls it, it exists for tests and local scripts.

use std::str::FromStr;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use marquee_core::types::DbId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Lifetime of minted tokens when `JWT_ACCESS_EXPIRY_MINS` is unset.
const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 15;

/// Payload of an access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Account id of the caller; becomes the review author id.
    pub sub: DbId,
    /// `"admin"` or `"user"`.
    pub role: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

/// Shared secret plus the lifetime used when minting.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expiry_mins: i64,
}

impl JwtConfig {
    /// Read `JWT_SECRET` (required, non-empty) and `JWT_ACCESS_EXPIRY_MINS`.
    ///
    /// # Panics
    ///
    /// On a missing or empty secret, or an unparsable expiry.
    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .expect("JWT_SECRET must be set to a non-empty value");

        Self {
            secret,
            access_token_expiry_mins: env_or("JWT_ACCESS_EXPIRY_MINS", DEFAULT_ACCESS_EXPIRY_MINS),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a valid number, got '{raw}'")),
        Err(_) => default,
    }
}

fn validation() -> Validation {
    let mut validation = Validation::new(ALGORITHM);
    validation.set_required_spec_claims(&["exp", "sub"]);
    validation
}

/// Check the signature, algorithm and expiry of `token` and return its
/// claims.
pub fn verify_access_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let key = DecodingKey::from_secret(config.secret.as_bytes());
    decode::<Claims>(token, &key, &validation()).map(|data| data.claims)
}

/// Sign a token for `user_id` with the shared secret.
pub fn mint_access_token(
    user_id: DbId,
    role: &str,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let issued_at = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        role: role.to_string(),
        exp: issued_at + config.access_token_expiry_mins * 60,
        iat: issued_at,
        jti: Uuid::new_v4().to_string(),
    };
    let key = EncodingKey::from_secret(config.secret.as_bytes());
    encode(&Header::new(ALGORITHM), &claims, &key)
}
