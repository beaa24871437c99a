use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identity::ETag;
use crate::object::Timestamp;

/// Target of an `If-Match` / `If-None-Match` precondition.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ETagMatch {
    /// Matches any existing version (`*`).
    Any,
    /// Matches only a version carrying this tag.
    Tag(ETag),
}

impl fmt::Display for ETagMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Tag(tag) => write!(f, "{tag}"),
        }
    }
}

impl From<ETag> for ETagMatch {
    fn from(tag: ETag) -> Self {
        Self::Tag(tag)
    }
}

/// Caller-declared preconditions gating an operation.
///
/// Every field is optional and the declared predicates combine with AND.
/// The default value declares nothing and always passes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conditions {
    pub if_match: Option<ETagMatch>,
    pub if_none_match: Option<ETagMatch>,
    pub if_modified_since: Option<Timestamp>,
    pub if_unmodified_since: Option<Timestamp>,
}

impl Conditions {
    /// No preconditions.
    pub fn none() -> Self {
        Self::default()
    }

    /// Require some version to exist (`If-Match: *`).
    pub fn if_exists() -> Self {
        Self {
            if_match: Some(ETagMatch::Any),
            ..Self::default()
        }
    }

    /// Require that no version exists (`If-None-Match: *`), i.e. create-only.
    pub fn if_not_exists() -> Self {
        Self {
            if_none_match: Some(ETagMatch::Any),
            ..Self::default()
        }
    }

    /// Require the current version to carry `etag`.
    pub fn if_match(etag: ETag) -> Self {
        Self {
            if_match: Some(ETagMatch::Tag(etag)),
            ..Self::default()
        }
    }

    /// Require the current version not to carry `etag`.
    pub fn if_none_match(etag: ETag) -> Self {
        Self {
            if_none_match: Some(ETagMatch::Tag(etag)),
            ..Self::default()
        }
    }

    /// Add an `If-Modified-Since` predicate.
    pub fn modified_since(mut self, since: Timestamp) -> Self {
        self.if_modified_since = Some(since);
        self
    }

    /// Add an `If-Unmodified-Since` predicate.
    pub fn unmodified_since(mut self, since: Timestamp) -> Self {
        self.if_unmodified_since = Some(since);
        self
    }

    /// Returns `true` if no predicate is declared.
    pub fn is_empty(&self) -> bool {
        self.if_match.is_none()
            && self.if_none_match.is_none()
            && self.if_modified_since.is_none()
            && self.if_unmodified_since.is_none()
    }

    /// Returns `true` if a declared predicate can only hold when a version
    /// exists. Reads report absence as a precondition failure in that case.
    pub fn requires_existence(&self) -> bool {
        self.if_match.is_some() || self.if_modified_since.is_some()
    }
}
