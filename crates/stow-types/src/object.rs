use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::identity::{ContentHash, ETag, VersionId};

/// Wall-clock instant attached to every write.
pub type Timestamp = DateTime<Utc>;

/// User metadata attached to a version.
///
/// A `BTreeMap` keeps keys sorted, which is the order the ETag digest
/// consumes them in.
pub type Metadata = BTreeMap<String, String>;

/// The storage flavour of an object.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectType {
    #[default]
    Unknown,
    Block,
    Append,
    Page,
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Block => write!(f, "block"),
            Self::Append => write!(f, "append"),
            Self::Page => write!(f, "page"),
        }
    }
}

impl FromStr for ObjectType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unknown" => Ok(Self::Unknown),
            "block" => Ok(Self::Block),
            "append" => Ok(Self::Append),
            "page" => Ok(Self::Page),
            other => Err(TypeError::UnknownObjectType(other.to_string())),
        }
    }
}

/// The content of a version.
///
/// `None` marks a metadata-only object: the version exists and carries
/// metadata and stamps, but no bytes were written.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Payload {
    #[default]
    None,
    Bytes(Bytes),
}

impl Payload {
    /// Payload bytes, empty for `Payload::None`.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::None => &[],
            Self::Bytes(bytes) => bytes,
        }
    }

    /// Length in bytes.
    pub fn len(&self) -> u64 {
        self.as_bytes().len() as u64
    }

    /// Returns `true` if there are no payload bytes.
    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }

    /// Returns `true` for a metadata-only payload.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(data: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(data))
    }
}

impl From<Bytes> for Payload {
    fn from(data: Bytes) -> Self {
        Self::Bytes(data)
    }
}

impl From<&'static [u8]> for Payload {
    fn from(data: &'static [u8]) -> Self {
        Self::Bytes(Bytes::from_static(data))
    }
}

/// Content headers recorded with a write.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSettings {
    /// MIME type of the payload, empty when unknown.
    pub content_type: String,
    /// Transfer encoding of the payload (e.g. `gzip`), if any.
    pub content_encoding: Option<String>,
}

impl ContentSettings {
    /// Settings with the given content type and no encoding.
    pub fn with_type(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            content_encoding: None,
        }
    }
}

/// Result of a successful write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutResult {
    pub name: String,
    pub etag: ETag,
    pub version_id: VersionId,
    pub last_modified: Timestamp,
}

/// Observed shape of a single stored version, as returned by reads and
/// listings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDescriptor {
    /// Rendered object name (path) within its container.
    pub name: String,
    pub etag: ETag,
    pub version_id: VersionId,
    /// Present only when the caller asked for metadata.
    pub metadata: Option<Metadata>,
    pub creation_time: Timestamp,
    pub last_modified: Timestamp,
    pub object_type: ObjectType,
    pub content_length: u64,
    pub content_type: String,
    pub content_encoding: Option<String>,
    pub content_hash: ContentHash,
    /// Whether this version was the object's root when observed.
    pub is_root: bool,
}
