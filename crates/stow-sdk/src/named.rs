use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use stow_keys::PartialKey;
use stow_store::{ListOptions, ObjectBackend};
use stow_types::{Conditions, Metadata, PutResult, VersionDescriptor, VersionId};

use crate::error::SdkResult;
use crate::keyed::{KeyedStore, Versioned};
use crate::metadata::MetadataRecord;
use crate::pool::BufferPool;
use crate::serializer::{ContentSerializer, JsonSerializer};

/// A single object at a fixed name, such as a settings document.
///
/// The stored name is the given name followed by the serializer's
/// extension.
#[derive(Debug)]
pub struct NamedObject<V, S = JsonSerializer> {
    inner: KeyedStore<(), V, S>,
}

impl<V> NamedObject<V, JsonSerializer>
where
    V: Serialize + DeserializeOwned,
{
    pub fn json(
        backend: Arc<dyn ObjectBackend>,
        container: impl Into<String>,
        name: &str,
    ) -> SdkResult<Self> {
        Self::new(backend, container, name, JsonSerializer, BufferPool::new())
    }
}

impl<V, S> NamedObject<V, S>
where
    V: Serialize + DeserializeOwned,
    S: ContentSerializer,
{
    pub fn new(
        backend: Arc<dyn ObjectBackend>,
        container: impl Into<String>,
        name: &str,
        serializer: S,
        pool: BufferPool,
    ) -> SdkResult<Self> {
        let template = name.replace('{', "{{").replace('}', "}}");
        Ok(Self {
            inner: KeyedStore::new(backend, container, &template, serializer, pool)?,
        })
    }

    /// The stored object name, extension included.
    pub fn name(&self) -> String {
        self.inner.name_of(&())
    }

    pub fn container(&self) -> &str {
        self.inner.container()
    }

    pub async fn create_container(&self) -> SdkResult<bool> {
        self.inner.create_container().await
    }

    pub async fn put(&self, value: &V) -> SdkResult<PutResult> {
        self.inner.put(&(), value).await
    }

    pub async fn put_with(
        &self,
        value: &V,
        metadata: Option<Metadata>,
        conditions: Conditions,
    ) -> SdkResult<PutResult> {
        self.inner.put_with(&(), value, metadata, conditions).await
    }

    pub async fn put_marker(&self, metadata: Metadata, conditions: Conditions) -> SdkResult<PutResult> {
        self.inner.put_marker(&(), metadata, conditions).await
    }

    pub async fn put_metadata_record<R: MetadataRecord>(
        &self,
        record: &R,
        conditions: Conditions,
    ) -> SdkResult<PutResult> {
        self.inner.put_metadata_record(&(), record, conditions).await
    }

    pub async fn get(&self) -> SdkResult<Option<V>> {
        self.inner.get(&()).await
    }

    pub async fn get_with(
        &self,
        version: Option<&VersionId>,
        conditions: &Conditions,
    ) -> SdkResult<Option<Versioned<V>>> {
        self.inner.get_with(&(), version, conditions).await
    }

    pub async fn get_metadata(
        &self,
        version: Option<&VersionId>,
    ) -> SdkResult<Option<VersionDescriptor>> {
        self.inner.get_metadata(&(), version).await
    }

    pub async fn get_metadata_record<R: MetadataRecord>(
        &self,
        version: Option<&VersionId>,
    ) -> SdkResult<Option<R>> {
        self.inner.get_metadata_record(&(), version).await
    }

    pub async fn exists(&self, version: Option<&VersionId>) -> SdkResult<bool> {
        self.inner.exists(&(), version).await
    }

    pub async fn delete(&self) -> SdkResult<bool> {
        self.inner.delete(&()).await
    }

    pub async fn delete_with(
        &self,
        version: Option<&VersionId>,
        conditions: &Conditions,
    ) -> SdkResult<bool> {
        self.inner.delete_with(&(), version, conditions).await
    }

    pub async fn set_metadata(
        &self,
        version: Option<&VersionId>,
        metadata: Metadata,
        conditions: &Conditions,
    ) -> SdkResult<()> {
        self.inner.set_metadata(&(), version, metadata, conditions).await
    }

    /// Every stored version, oldest first.
    pub async fn versions(&self, include_metadata: bool) -> SdkResult<Vec<VersionDescriptor>> {
        let options = ListOptions {
            include_metadata,
            include_versions: true,
            ..ListOptions::default()
        };
        let listed = self.inner.enumerate(&PartialKey::None, options).await?;
        Ok(listed.into_iter().map(|(_, descriptor)| descriptor).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use stow_store::{InMemoryBackend, StoreConfig};

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Settings {
        retries: u32,
    }

    fn backend() -> Arc<dyn ObjectBackend> {
        Arc::new(InMemoryBackend::with_config(StoreConfig::without_latency()).unwrap())
    }

    async fn settings(name: &str) -> NamedObject<Settings> {
        let object = NamedObject::json(backend(), "config", name).unwrap();
        object.create_container().await.unwrap();
        object
    }

    #[tokio::test]
    async fn name_gets_extension() {
        let object = settings("app/settings").await;
        assert_eq!(object.name(), "app/settings.json");
    }

    #[tokio::test]
    async fn braces_in_name_are_literal() {
        let object = settings("{tenant}").await;
        assert_eq!(object.name(), "{tenant}.json");
        object.put(&Settings { retries: 1 }).await.unwrap();
        assert_eq!(object.versions(false).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn put_get_and_delete() {
        let object = settings("settings").await;
        assert_eq!(object.get().await.unwrap(), None);

        object.put(&Settings { retries: 3 }).await.unwrap();
        assert_eq!(object.get().await.unwrap(), Some(Settings { retries: 3 }));
        assert!(object.exists(None).await.unwrap());

        assert!(object.delete().await.unwrap());
        assert!(!object.exists(None).await.unwrap());
    }

    #[tokio::test]
    async fn versions_ignore_neighbouring_names() {
        let backend = backend();
        let a: NamedObject<Settings> =
            NamedObject::json(Arc::clone(&backend), "config", "settings").unwrap();
        let b: NamedObject<Settings> =
            NamedObject::json(backend, "config", "settings-old").unwrap();
        a.create_container().await.unwrap();

        let v1 = a.put(&Settings { retries: 1 }).await.unwrap();
        let v2 = a.put(&Settings { retries: 2 }).await.unwrap();
        b.put(&Settings { retries: 9 }).await.unwrap();

        let versions = a.versions(false).await.unwrap();
        let ids: Vec<_> = versions.iter().map(|d| d.version_id.clone()).collect();
        assert_eq!(ids, vec![v1.version_id, v2.version_id]);
    }

    #[tokio::test]
    async fn conditional_replace() {
        let object = settings("settings").await;
        let v1 = object
            .put_with(&Settings { retries: 1 }, None, Conditions::if_not_exists())
            .await
            .unwrap();
        let err = object
            .put_with(&Settings { retries: 2 }, None, Conditions::if_not_exists())
            .await
            .unwrap_err();
        assert!(err.is_precondition_failed());

        object
            .put_with(&Settings { retries: 2 }, None, Conditions::if_match(v1.etag))
            .await
            .unwrap();
        let current = object
            .get_with(None, &Conditions::none())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.value, Some(Settings { retries: 2 }));
        assert!(current.descriptor.is_root);
    }

    #[tokio::test]
    async fn marker_metadata_roundtrip() {
        let object = settings("lock").await;
        let mut metadata = Metadata::new();
        metadata.insert("owner".into(), "worker-1".into());
        object
            .put_marker(metadata.clone(), Conditions::if_not_exists())
            .await
            .unwrap();
        assert_eq!(object.get().await.unwrap(), None);

        let mut updated = Metadata::new();
        updated.insert("owner".into(), "worker-2".into());
        object
            .set_metadata(None, updated.clone(), &Conditions::if_exists())
            .await
            .unwrap();
        let d = object.get_metadata(None).await.unwrap().unwrap();
        assert_eq!(d.metadata, Some(updated));
    }

    crate::metadata_record! {
        #[derive(Debug, Default, PartialEq)]
        struct Lock {
            #[metadata(key = "owner")]
            owner: String,
            #[metadata(key = "generation", digits = 8)]
            generation: u64,
        }
    }

    #[tokio::test]
    async fn lock_record_roundtrip() {
        let object = settings("lock").await;
        let v1 = Lock {
            owner: "worker-1".into(),
            generation: 1,
        };
        object
            .put_metadata_record(&v1, Conditions::if_not_exists())
            .await
            .unwrap();
        assert_eq!(object.get_metadata_record::<Lock>(None).await.unwrap(), Some(v1));

        let raw = object.get_metadata(None).await.unwrap().unwrap().metadata.unwrap();
        assert_eq!(raw["generation"], "+00000001");
    }
}
