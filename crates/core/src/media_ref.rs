//! Media reference classification.
//!
//! A review points at its media either through a local catalog id or through
//! a composite key naming an item in the external catalog. Every raw
//! reference entering the system goes through [`classify`]; nothing else
//! parses reference strings.
//!
//! Canonical forms:
//!
//! ```text
//! 42                     local media item 42
//! external:movie:550     external movie 550
//! external:series:1399   external series 1399
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::media::MediaKind;
use crate::types::DbId;

/// Prefix carried by every canonical external reference.
pub const EXTERNAL_PREFIX: &str = "external:";

/// Accepts `external:<kind>:<id>`, `<kind>-<id>` and the legacy
/// `tmdb-<kind>-<id>` forms.
static EXTERNAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:external:([a-z]+):|(?:tmdb-)?([a-z]+)-)([0-9]+)$").expect("valid regex")
});

/// A classified media reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MediaRef {
    /// A media item persisted in the local catalog.
    Local(DbId),
    /// An item known only by its external catalog identity.
    External { kind: MediaKind, external_id: i64 },
}

impl MediaRef {
    /// `true` iff the reference names external-only media.
    pub fn is_external(&self) -> bool {
        matches!(self, MediaRef::External { .. })
    }

    /// The local id, when the reference is local.
    pub fn local_id(&self) -> Option<DbId> {
        match self {
            MediaRef::Local(id) => Some(*id),
            MediaRef::External { .. } => None,
        }
    }

    /// The media kind, when it is known from the reference alone.
    pub fn kind(&self) -> Option<MediaKind> {
        match self {
            MediaRef::Local(_) => None,
            MediaRef::External { kind, .. } => Some(*kind),
        }
    }
}

impl fmt::Display for MediaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaRef::Local(id) => write!(f, "{id}"),
            MediaRef::External { kind, external_id } => {
                write!(f, "{EXTERNAL_PREFIX}{kind}:{external_id}")
            }
        }
    }
}

impl FromStr for MediaRef {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        classify(s)
    }
}

impl TryFrom<String> for MediaRef {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        classify(&value)
    }
}

impl From<MediaRef> for String {
    fn from(value: MediaRef) -> Self {
        value.to_string()
    }
}

/// Classify a raw media reference.
///
/// Surrounding whitespace is ignored. Fails with
/// [`CoreError::InvalidMediaReference`] for empty or malformed input.
pub fn classify(raw: &str) -> Result<MediaRef, CoreError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(CoreError::InvalidMediaReference(
            "Media reference must not be empty".to_string(),
        ));
    }

    if raw.bytes().all(|b| b.is_ascii_digit()) {
        let id = parse_positive_id(raw, raw)?;
        return Ok(MediaRef::Local(id));
    }

    let caps = EXTERNAL_RE.captures(raw).ok_or_else(|| {
        CoreError::InvalidMediaReference(format!(
            "'{raw}' is neither a local id nor an external:<kind>:<id> key"
        ))
    })?;

    let kind_str = caps
        .get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str())
        .unwrap_or_default();
    let kind = kind_str.parse::<MediaKind>().map_err(|_| {
        CoreError::InvalidMediaReference(format!("'{raw}' has unknown media kind '{kind_str}'"))
    })?;
    let external_id = parse_positive_id(&caps[3], raw)?;

    Ok(MediaRef::External { kind, external_id })
}

/// `true` iff `media_ref` is in canonical external form.
pub fn is_external(media_ref: &str) -> bool {
    media_ref.starts_with(EXTERNAL_PREFIX)
}

fn parse_positive_id(digits: &str, raw: &str) -> Result<i64, CoreError> {
    match digits.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(CoreError::InvalidMediaReference(format!(
            "'{raw}' does not carry a positive numeric id"
        ))),
    }
}
