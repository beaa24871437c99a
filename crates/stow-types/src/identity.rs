use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Entity tag identifying one written version of an object.
///
/// ETags are opaque: equality is the only meaningful comparison. Two writes
/// of byte-identical payloads still produce different tags because the write
/// timestamp participates in the digest.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ETag(String);

impl ETag {
    /// Wrap an already-computed tag value.
    pub fn new(value: impl Into<String>) -> Result<Self, TypeError> {
        let value = value.into();
        if value.is_empty() {
            return Err(TypeError::Empty("etag"));
        }
        Ok(Self(value))
    }

    /// Hex-encode a digest into a tag.
    pub fn from_digest(digest: &[u8]) -> Self {
        Self(hex::encode(digest))
    }

    /// The tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short: String = self.0.chars().take(12).collect();
        write!(f, "ETag({short})")
    }
}

impl fmt::Display for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a single version within an object's version set.
///
/// Version ids are not sortable: ordering between versions must always use
/// the stored creation timestamp.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(String);

impl VersionId {
    /// Wrap an already-computed version id.
    pub fn new(value: impl Into<String>) -> Result<Self, TypeError> {
        let value = value.into();
        if value.is_empty() {
            return Err(TypeError::Empty("version id"));
        }
        Ok(Self(value))
    }

    /// Base64-encode a digest into a version id.
    pub fn from_digest(digest: &[u8]) -> Self {
        Self(STANDARD.encode(digest))
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VersionId({})", self.0)
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// SHA-256 digest of a version's payload bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Create a `ContentHash` from a pre-computed digest.
    pub fn from_digest(digest: [u8; 32]) -> Self {
        Self(digest)
    }

    /// The raw 32-byte digest.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_etag_is_rejected() {
        assert_eq!(ETag::new(""), Err(TypeError::Empty("etag")));
    }

    #[test]
    fn empty_version_id_is_rejected() {
        assert_eq!(VersionId::new(""), Err(TypeError::Empty("version id")));
    }

    #[test]
    fn etag_display_is_raw_value() {
        let tag = ETag::new("ABCDEF0123").unwrap();
        assert_eq!(tag.to_string(), "ABCDEF0123");
        assert_eq!(tag.as_str(), "ABCDEF0123");
    }

    #[test]
    fn etag_debug_is_truncated() {
        let tag = ETag::new("0123456789abcdef0123456789").unwrap();
        assert_eq!(format!("{tag:?}"), "ETag(0123456789ab)");
    }

    #[test]
    fn content_hash_hex_roundtrip() {
        let hash = ContentHash::from_digest([0xab; 32]);
        let parsed = ContentHash::from_hex(&hash.to_hex()).unwrap();
        assert_eq!(hash, parsed);
    }

    #[test]
    fn content_hash_rejects_short_input() {
        let err = ContentHash::from_hex("abcd").unwrap_err();
        assert_eq!(
            err,
            TypeError::InvalidLength {
                expected: 32,
                actual: 2
            }
        );
    }

    #[test]
    fn version_id_serializes_transparently() {
        let id = VersionId::new("q1w2e3==").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"q1w2e3==\"");
        let back: VersionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
