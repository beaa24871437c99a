//! Typed facade for stow.
//!
//! Joins the key codec, a payload serializer and any [`ObjectBackend`] into
//! stores addressed by typed keys. This is the main entry point for
//! applications embedding stow.
//!
//! # Key Types
//!
//! - [`KeyedStore`] - Values addressed by a [`StructuredKey`] through a path template
//! - [`NamedObject`] - One value at a fixed name
//! - [`ContentSerializer`] - Payload codec; [`JsonSerializer`] by default
//! - [`BufferPool`] - Caller-owned serialization buffers shared across stores
//! - [`MetadataRecord`] - Typed struct carried in object metadata, see [`metadata_record!`]
//!
//! ```
//! use std::sync::Arc;
//! use stow_sdk::{KeyedStore, InMemoryBackend, ObjectBackend, StoreConfig};
//!
//! let backend: Arc<dyn ObjectBackend> =
//!     Arc::new(InMemoryBackend::with_config(StoreConfig::without_latency()).unwrap());
//! let orders: KeyedStore<(String, u32), serde_json::Value> =
//!     KeyedStore::json(backend, "orders", "orders/{k.0}/{k.1:D6}").unwrap();
//! assert_eq!(orders.name_of(&("acme".into(), 42)), "orders/acme/000042.json");
//! ```

pub mod error;
pub mod keyed;
pub mod metadata;
pub mod named;
pub mod pool;
pub mod serializer;

pub use error::{SdkError, SdkResult};
pub use keyed::{KeyedStore, Versioned};
pub use metadata::{from_metadata, to_metadata, MetadataField, MetadataRecord};
pub use named::NamedObject;
pub use pool::{BufferPool, PooledBuffer};
pub use serializer::{ContentSerializer, JsonSerializer};

// Re-export key types
pub use stow_keys::{
    structured_key, KeyMap, KeyMember, KeyValue, MemberKind, PartialKey, StructuredKey,
};
pub use stow_store::{InMemoryBackend, ListOptions, ObjectBackend, StoreConfig, StoreError};
pub use stow_types::{Conditions, ETag, Metadata, Payload, PutResult, VersionDescriptor, VersionId};
