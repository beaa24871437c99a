use chrono::SecondsFormat;
use sha2::{Digest, Sha256};
use stow_types::{ContentHash, ETag, Metadata, Timestamp, VersionId};

/// Separator between `key=value` pairs in the metadata part of an ETag.
const METADATA_DELIMITER: &str = "|";

/// Derives the identity values stamped on a write.
///
/// All digests are SHA-256. The timestamp always enters as its ISO-8601 text
/// with nanosecond precision, so the derivation is reproducible from the
/// stored stamps alone.
pub struct StampHasher;

impl StampHasher {
    /// ISO-8601 text of a write timestamp.
    pub fn iso8601(timestamp: &Timestamp) -> String {
        timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
    }

    /// ETag over timestamp, payload and metadata, hex-encoded.
    ///
    /// Metadata is consumed as sorted `key=value` pairs joined by `|`;
    /// absent and empty metadata contribute nothing.
    pub fn etag(timestamp: &Timestamp, payload: &[u8], metadata: Option<&Metadata>) -> ETag {
        let mut hasher = Sha256::new();
        hasher.update(Self::iso8601(timestamp).as_bytes());
        hasher.update(payload);
        if let Some(metadata) = metadata {
            hasher.update(Self::metadata_text(metadata).as_bytes());
        }
        ETag::from_digest(&hasher.finalize())
    }

    /// Version id over the timestamp alone, base64-encoded.
    pub fn version_id(timestamp: &Timestamp) -> VersionId {
        let digest = Sha256::digest(Self::iso8601(timestamp).as_bytes());
        VersionId::from_digest(&digest)
    }

    /// Digest of the payload bytes.
    pub fn content_hash(payload: &[u8]) -> ContentHash {
        ContentHash::from_digest(Sha256::digest(payload).into())
    }

    fn metadata_text(metadata: &Metadata) -> String {
        metadata
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(METADATA_DELIMITER)
    }
}
