//! Payload codecs.

use serde::de::DeserializeOwned;
use serde::Serialize;
use stow_types::ContentSettings;

use crate::error::{SdkError, SdkResult};

/// Converts typed values to and from stored payload bytes.
///
/// The serializer also names the content it produces: its content type and
/// encoding are recorded on every version, and its extension becomes the
/// suffix of every object name.
pub trait ContentSerializer: Send + Sync {
    /// MIME type of serialized payloads.
    fn content_type(&self) -> &str;

    /// Content encoding, if payloads are compressed.
    fn content_encoding(&self) -> Option<&str> {
        None
    }

    /// Object name suffix, including the leading dot.
    fn extension(&self) -> &str;

    /// Append the serialized form of `value` to `out`.
    fn serialize<V: Serialize>(&self, value: &V, out: &mut Vec<u8>) -> SdkResult<()>;

    fn deserialize<V: DeserializeOwned>(&self, bytes: &[u8]) -> SdkResult<V>;

    /// Content settings recorded on each write.
    fn content_settings(&self) -> ContentSettings {
        ContentSettings {
            content_type: self.content_type().to_string(),
            content_encoding: self.content_encoding().map(str::to_string),
        }
    }
}

/// JSON payloads via `serde_json`.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonSerializer;

impl ContentSerializer for JsonSerializer {
    fn content_type(&self) -> &str {
        "application/json"
    }

    fn extension(&self) -> &str {
        ".json"
    }

    fn serialize<V: Serialize>(&self, value: &V, out: &mut Vec<u8>) -> SdkResult<()> {
        serde_json::to_writer(out, value).map_err(|e| SdkError::Serialization(e.to_string()))
    }

    fn deserialize<V: DeserializeOwned>(&self, bytes: &[u8]) -> SdkResult<V> {
        serde_json::from_slice(bytes).map_err(|e| SdkError::Serialization(e.to_string()))
    }
}
