use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use stow_keys::{KeyMap, PartialKey, StructuredKey};
use stow_store::{ListOptions, ObjectBackend, ObjectVersion, PutOptions};
use stow_types::{Conditions, Metadata, Payload, PutResult, VersionDescriptor, VersionId};
use tracing::debug;

use crate::error::{SdkError, SdkResult};
use crate::metadata::{self, MetadataRecord};
use crate::pool::BufferPool;
use crate::serializer::{ContentSerializer, JsonSerializer};

/// A decoded version: the value, if the version carries content, and its
/// stamps and metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct Versioned<V> {
    /// `None` for metadata-only (marker) versions.
    pub value: Option<V>,
    pub descriptor: VersionDescriptor,
}

/// Typed key-value store over one container of an [`ObjectBackend`].
///
/// Keys are rendered to object names through a [`KeyMap`] compiled once at
/// construction, with the serializer's extension as suffix. Values are
/// serialized into buffers borrowed from a caller-owned [`BufferPool`].
pub struct KeyedStore<K, V, S = JsonSerializer> {
    backend: Arc<dyn ObjectBackend>,
    container: String,
    keys: KeyMap<K>,
    serializer: S,
    pool: BufferPool,
    _value: PhantomData<fn() -> V>,
}

impl<K, V> KeyedStore<K, V, JsonSerializer>
where
    K: StructuredKey,
    V: Serialize + DeserializeOwned,
{
    /// A JSON store with a private buffer pool.
    pub fn json(
        backend: Arc<dyn ObjectBackend>,
        container: impl Into<String>,
        template: &str,
    ) -> SdkResult<Self> {
        Self::new(backend, container, template, JsonSerializer, BufferPool::new())
    }
}

impl<K, V, S> KeyedStore<K, V, S>
where
    K: StructuredKey,
    V: Serialize + DeserializeOwned,
    S: ContentSerializer,
{
    /// Compile `template` for `K` and bind it to `container`.
    ///
    /// Template errors surface here and never on later calls.
    pub fn new(
        backend: Arc<dyn ObjectBackend>,
        container: impl Into<String>,
        template: &str,
        serializer: S,
        pool: BufferPool,
    ) -> SdkResult<Self> {
        let keys = KeyMap::compile(template, serializer.extension())?;
        Ok(Self {
            backend,
            container: container.into(),
            keys,
            serializer,
            pool,
            _value: PhantomData,
        })
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn key_map(&self) -> &KeyMap<K> {
        &self.keys
    }

    pub fn serializer(&self) -> &S {
        &self.serializer
    }

    /// The object name `key` is stored under.
    pub fn name_of(&self, key: &K) -> String {
        self.keys.render(key)
    }

    // ---- Container ----

    /// Create the backing container. Returns `true` if it was created.
    pub async fn create_container(&self) -> SdkResult<bool> {
        Ok(self
            .backend
            .create_container_if_not_exists(&self.container)
            .await?)
    }

    /// Delete the backing container and everything in it.
    pub async fn delete_container(&self) -> SdkResult<bool> {
        Ok(self.backend.delete_container_if_exists(&self.container).await?)
    }

    // ---- Writes ----

    pub async fn put(&self, key: &K, value: &V) -> SdkResult<PutResult> {
        self.put_with(key, value, None, Conditions::none()).await
    }

    /// Write `value` as the new root version, gated by `conditions`.
    pub async fn put_with(
        &self,
        key: &K,
        value: &V,
        metadata: Option<Metadata>,
        conditions: Conditions,
    ) -> SdkResult<PutResult> {
        let payload = self.encode(value)?;
        self.write(key, payload, metadata, conditions).await
    }

    /// Write a metadata-only version with no content.
    pub async fn put_marker(
        &self,
        key: &K,
        metadata: Metadata,
        conditions: Conditions,
    ) -> SdkResult<PutResult> {
        self.write(key, Payload::None, Some(metadata), conditions).await
    }

    /// Write a marker whose metadata is `record`.
    pub async fn put_metadata_record<R: MetadataRecord>(
        &self,
        key: &K,
        record: &R,
        conditions: Conditions,
    ) -> SdkResult<PutResult> {
        let metadata = metadata::to_metadata(record)?;
        self.put_marker(key, metadata, conditions).await
    }

    async fn write(
        &self,
        key: &K,
        payload: Payload,
        metadata: Option<Metadata>,
        conditions: Conditions,
    ) -> SdkResult<PutResult> {
        let name = self.keys.render(key);
        let options = PutOptions {
            metadata,
            content: self.serializer.content_settings(),
            conditions,
        };
        Ok(self
            .backend
            .put(&self.container, &name, payload, options)
            .await?)
    }

    fn encode(&self, value: &V) -> SdkResult<Payload> {
        let mut buffer = self.pool.acquire();
        self.serializer.serialize(value, &mut buffer)?;
        Ok(Payload::from(Bytes::copy_from_slice(&buffer)))
    }

    // ---- Reads ----

    /// The current value of `key`, or `None` if it is absent or a marker.
    pub async fn get(&self, key: &K) -> SdkResult<Option<V>> {
        let found = self.get_with(key, None, &Conditions::none()).await?;
        Ok(found.and_then(|versioned| versioned.value))
    }

    /// Read the root version, or `version`, gated by `conditions`.
    pub async fn get_with(
        &self,
        key: &K,
        version: Option<&VersionId>,
        conditions: &Conditions,
    ) -> SdkResult<Option<Versioned<V>>> {
        let name = self.keys.render(key);
        let Some(found) = self
            .backend
            .get(&self.container, &name, version, conditions)
            .await?
        else {
            return Ok(None);
        };
        self.decode(found).map(Some)
    }

    /// Stamps and metadata of the root version, or `version`, without
    /// decoding its content.
    pub async fn get_metadata(
        &self,
        key: &K,
        version: Option<&VersionId>,
    ) -> SdkResult<Option<VersionDescriptor>> {
        let name = self.keys.render(key);
        let found = self
            .backend
            .get(&self.container, &name, version, &Conditions::none())
            .await?;
        Ok(found.map(|v| v.descriptor))
    }

    /// The metadata of the root version, or `version`, read as `R`.
    pub async fn get_metadata_record<R: MetadataRecord>(
        &self,
        key: &K,
        version: Option<&VersionId>,
    ) -> SdkResult<Option<R>> {
        let Some(descriptor) = self.get_metadata(key, version).await? else {
            return Ok(None);
        };
        let metadata = descriptor.metadata.unwrap_or_default();
        metadata::from_metadata(&metadata).map(Some)
    }

    pub async fn exists(&self, key: &K, version: Option<&VersionId>) -> SdkResult<bool> {
        let name = self.keys.render(key);
        Ok(self.backend.exists(&self.container, &name, version).await?)
    }

    fn decode(&self, found: ObjectVersion) -> SdkResult<Versioned<V>> {
        let value = match &found.payload {
            Payload::None => None,
            Payload::Bytes(bytes) => Some(self.serializer.deserialize(bytes)?),
        };
        Ok(Versioned {
            value,
            descriptor: found.descriptor,
        })
    }

    // ---- Mutations ----

    /// Delete every version of `key`.
    pub async fn delete(&self, key: &K) -> SdkResult<bool> {
        self.delete_with(key, None, &Conditions::none()).await
    }

    /// Delete the object, or one of its non-root versions.
    pub async fn delete_with(
        &self,
        key: &K,
        version: Option<&VersionId>,
        conditions: &Conditions,
    ) -> SdkResult<bool> {
        let name = self.keys.render(key);
        Ok(self
            .backend
            .delete(&self.container, &name, version, conditions)
            .await?)
    }

    /// Replace the metadata of the root version.
    pub async fn set_metadata(
        &self,
        key: &K,
        version: Option<&VersionId>,
        metadata: Metadata,
        conditions: &Conditions,
    ) -> SdkResult<()> {
        let name = self.keys.render(key);
        Ok(self
            .backend
            .set_metadata(&self.container, &name, version, metadata, conditions)
            .await?)
    }

    // ---- Enumeration ----

    /// List the keys under `partial` with their versions.
    ///
    /// The listing prefix is derived from `partial` and replaces
    /// `options.prefix`. Names the key map cannot parse are skipped.
    pub async fn enumerate(
        &self,
        partial: &PartialKey,
        mut options: ListOptions,
    ) -> SdkResult<Vec<(K, VersionDescriptor)>> {
        options.prefix = self.keys.render_prefix(partial)?;
        let listed = self.backend.enumerate(&self.container, &options).await?;
        let mut entries = Vec::with_capacity(listed.len());
        for descriptor in listed {
            match self.keys.parse(&descriptor.name) {
                Some(key) => entries.push((key, descriptor)),
                None => debug!(name = %descriptor.name, "skipping object outside key map"),
            }
        }
        Ok(entries)
    }

    /// Keys currently stored under `partial`, in name order.
    pub async fn keys(&self, partial: &PartialKey) -> SdkResult<Vec<K>> {
        let entries = self.enumerate(partial, ListOptions::default()).await?;
        Ok(entries.into_iter().map(|(key, _)| key).collect())
    }
}

impl<K: StructuredKey, V, S> fmt::Debug for KeyedStore<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedStore")
            .field("container", &self.container)
            .field("template", &self.keys.template())
            .field("suffix", &self.keys.suffix())
            .finish_non_exhaustive()
    }
}
