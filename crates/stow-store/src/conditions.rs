//! Precondition evaluation.
//!
//! [`evaluate`] decides whether a set of declared [`Conditions`] holds
//! against the version an operation targets. It is pure: the engine calls it
//! while holding the object's lock and turns a [`Rejection`] into
//! [`StoreError::PreconditionFailed`](crate::StoreError::PreconditionFailed).
//!
//! When the object is absent, `If-Match` and `If-Modified-Since` fail while
//! `If-None-Match` and `If-Unmodified-Since` hold.

use std::fmt;

use stow_types::{Conditions, ETag, ETagMatch, Timestamp};

/// The stamps of the version a precondition is evaluated against.
#[derive(Clone, Copy, Debug)]
pub struct Observed<'a> {
    pub etag: &'a ETag,
    pub last_modified: Timestamp,
}

/// The first declared predicate that did not hold.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rejection {
    IfMatch(ETagMatch),
    IfNoneMatch(ETagMatch),
    IfModifiedSince(Timestamp),
    IfUnmodifiedSince(Timestamp),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IfMatch(m) => write!(f, "if-match {m}"),
            Self::IfNoneMatch(m) => write!(f, "if-none-match {m}"),
            Self::IfModifiedSince(t) => write!(f, "if-modified-since {}", t.to_rfc3339()),
            Self::IfUnmodifiedSince(t) => write!(f, "if-unmodified-since {}", t.to_rfc3339()),
        }
    }
}

/// Check every declared predicate against `current`, the targeted version,
/// or `None` if it does not exist.
pub fn evaluate(conditions: &Conditions, current: Option<Observed<'_>>) -> Result<(), Rejection> {
    if let Some(expected) = &conditions.if_match {
        let holds = match (expected, current) {
            (_, None) => false,
            (ETagMatch::Any, Some(_)) => true,
            (ETagMatch::Tag(tag), Some(v)) => v.etag == tag,
        };
        if !holds {
            return Err(Rejection::IfMatch(expected.clone()));
        }
    }

    if let Some(unexpected) = &conditions.if_none_match {
        let holds = match (unexpected, current) {
            (_, None) => true,
            (ETagMatch::Any, Some(_)) => false,
            (ETagMatch::Tag(tag), Some(v)) => v.etag != tag,
        };
        if !holds {
            return Err(Rejection::IfNoneMatch(unexpected.clone()));
        }
    }

    if let Some(since) = conditions.if_modified_since {
        if !current.is_some_and(|v| v.last_modified > since) {
            return Err(Rejection::IfModifiedSince(since));
        }
    }

    if let Some(since) = conditions.if_unmodified_since {
        if current.is_some_and(|v| v.last_modified > since) {
            return Err(Rejection::IfUnmodifiedSince(since));
        }
    }

    Ok(())
}
