use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use async_trait::async_trait;
use stow_identity::{StampHasher, WriteClock};
use stow_types::{
    Conditions, Metadata, ObjectType, Payload, PutResult, VersionDescriptor, VersionId,
};
use tracing::{debug, info};

use crate::conditions::{evaluate, Observed, Rejection};
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::latency::LatencyModel;
use crate::names::validate_container_name;
use crate::traits::{ListOptions, ObjectBackend, ObjectVersion, PutOptions};

/// An immutable version as held by the engine.
///
/// `descriptor.is_root` is not maintained here; it is derived from the
/// version's position whenever a version is handed out.
#[derive(Debug)]
struct StoredVersion {
    descriptor: VersionDescriptor,
    payload: Payload,
}

impl StoredVersion {
    fn observed(&self) -> Observed<'_> {
        Observed {
            etag: &self.descriptor.etag,
            last_modified: self.descriptor.last_modified,
        }
    }

    fn describe(&self, is_root: bool, include_metadata: bool) -> VersionDescriptor {
        let mut descriptor = self.descriptor.clone();
        descriptor.is_root = is_root;
        if !include_metadata {
            descriptor.metadata = None;
        }
        descriptor
    }
}

/// The version set of one object, ordered by creation time. The last entry
/// is the root.
#[derive(Debug, Default)]
struct ObjectEntry {
    versions: Vec<Arc<StoredVersion>>,
}

impl ObjectEntry {
    fn root(&self) -> Option<&Arc<StoredVersion>> {
        self.versions.last()
    }

    fn position(&self, version: &VersionId) -> Option<usize> {
        self.versions
            .iter()
            .position(|v| &v.descriptor.version_id == version)
    }

    /// Resolve the root or a named version, with its root flag.
    fn resolve(&self, version: Option<&VersionId>) -> Option<(&Arc<StoredVersion>, bool)> {
        let last = self.versions.len().checked_sub(1)?;
        let index = match version {
            Some(id) => self.position(id)?,
            None => last,
        };
        Some((&self.versions[index], index == last))
    }
}

#[derive(Debug, Default)]
struct Container {
    objects: RwLock<BTreeMap<String, ObjectEntry>>,
}

fn poisoned<T>(e: PoisonError<T>) -> StoreError {
    StoreError::LockPoisoned(e.to_string())
}

fn rejected(name: &str, rejection: Rejection) -> StoreError {
    debug!(name, condition = %rejection, "precondition failed");
    StoreError::PreconditionFailed {
        name: name.to_string(),
        condition: rejection.to_string(),
    }
}

fn action_failed(name: &str, reason: &str) -> StoreError {
    debug!(name, reason, "action rejected");
    StoreError::ActionFailed {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

/// In-memory reference implementation of [`ObjectBackend`].
///
/// Reproduces the consistency model of a versioned object store within
/// process memory: optimistic concurrency through ETag preconditions,
/// append-only version sets, and root-version rules for delete and metadata
/// updates.
///
/// Each container guards its objects with its own `RwLock`, so every
/// mutation is atomic with respect to an object's version set. Write stamps
/// are taken from the shared [`WriteClock`] while that lock is held, which
/// keeps creation order and timestamp order identical. Simulated latency is
/// applied only after all locks are released.
pub struct InMemoryBackend {
    containers: RwLock<HashMap<String, Arc<Container>>>,
    clock: Arc<WriteClock>,
    latency: LatencyModel,
}

impl InMemoryBackend {
    /// Create an empty backend with default configuration.
    pub fn new() -> Self {
        Self::with_clock(StoreConfig::default(), Arc::new(WriteClock::new()))
    }

    /// Create an empty backend from a validated configuration.
    pub fn with_config(config: StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        Ok(Self::with_clock(config, Arc::new(WriteClock::new())))
    }

    /// Create an empty backend stamping writes from `clock`.
    pub fn with_clock(config: StoreConfig, clock: Arc<WriteClock>) -> Self {
        Self {
            containers: RwLock::new(HashMap::new()),
            clock,
            latency: LatencyModel::new(config.latency),
        }
    }

    /// Names of all containers, sorted.
    pub fn container_names(&self) -> StoreResult<Vec<String>> {
        let containers = self.containers.read().map_err(poisoned)?;
        let mut names: Vec<String> = containers.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    /// Number of objects in a container, or `None` if it does not exist.
    pub fn object_count(&self, container: &str) -> StoreResult<Option<usize>> {
        let Some(container) = self.find_container(container)? else {
            return Ok(None);
        };
        let objects = container.objects.read().map_err(poisoned)?;
        Ok(Some(objects.len()))
    }

    fn find_container(&self, name: &str) -> StoreResult<Option<Arc<Container>>> {
        let containers = self.containers.read().map_err(poisoned)?;
        Ok(containers.get(name).cloned())
    }

    fn container(&self, name: &str) -> StoreResult<Arc<Container>> {
        self.find_container(name)?
            .ok_or_else(|| StoreError::ContainerNotFound {
                name: name.to_string(),
            })
    }

    fn create_container(&self, name: &str) -> StoreResult<bool> {
        validate_container_name(name)?;
        let mut containers = self.containers.write().map_err(poisoned)?;
        if containers.contains_key(name) {
            return Ok(false);
        }
        containers.insert(name.to_string(), Arc::new(Container::default()));
        info!(container = name, "container created");
        Ok(true)
    }

    fn delete_container(&self, name: &str) -> StoreResult<bool> {
        let mut containers = self.containers.write().map_err(poisoned)?;
        let removed = containers.remove(name).is_some();
        if removed {
            info!(container = name, "container deleted");
        }
        Ok(removed)
    }

    fn object_exists(
        &self,
        container: &str,
        name: &str,
        version: Option<&VersionId>,
    ) -> StoreResult<bool> {
        let container = self.container(container)?;
        let objects = container.objects.read().map_err(poisoned)?;
        Ok(objects
            .get(name)
            .and_then(|entry| entry.resolve(version))
            .is_some())
    }

    fn write_version(
        &self,
        container: &str,
        name: &str,
        payload: Payload,
        options: PutOptions,
    ) -> StoreResult<PutResult> {
        let container = self.container(container)?;
        let mut objects = container.objects.write().map_err(poisoned)?;

        let root = objects.get(name).and_then(ObjectEntry::root);
        evaluate(&options.conditions, root.map(|v| v.observed()))
            .map_err(|r| rejected(name, r))?;

        let timestamp = self.clock.now();
        let bytes = payload.as_bytes();
        let etag = StampHasher::etag(&timestamp, bytes, options.metadata.as_ref());
        let version_id = StampHasher::version_id(&timestamp);

        let descriptor = VersionDescriptor {
            name: name.to_string(),
            etag: etag.clone(),
            version_id: version_id.clone(),
            metadata: options.metadata,
            creation_time: timestamp,
            last_modified: timestamp,
            object_type: ObjectType::Block,
            content_length: payload.len(),
            content_type: options.content.content_type,
            content_encoding: options.content.content_encoding,
            content_hash: StampHasher::content_hash(bytes),
            is_root: true,
        };

        objects
            .entry(name.to_string())
            .or_default()
            .versions
            .push(Arc::new(StoredVersion { descriptor, payload }));

        debug!(name, version_id = %version_id, etag = %etag, "version written");
        Ok(PutResult {
            name: name.to_string(),
            etag,
            version_id,
            last_modified: timestamp,
        })
    }

    fn read_version(
        &self,
        container: &str,
        name: &str,
        version: Option<&VersionId>,
        conditions: &Conditions,
    ) -> StoreResult<Option<ObjectVersion>> {
        let container = self.container(container)?;
        let objects = container.objects.read().map_err(poisoned)?;

        let resolved = objects.get(name).and_then(|entry| entry.resolve(version));
        evaluate(conditions, resolved.map(|(v, _)| v.observed())).map_err(|r| rejected(name, r))?;

        Ok(resolved.map(|(stored, is_root)| ObjectVersion {
            descriptor: stored.describe(is_root, true),
            payload: stored.payload.clone(),
        }))
    }

    fn remove(
        &self,
        container: &str,
        name: &str,
        version: Option<&VersionId>,
        conditions: &Conditions,
    ) -> StoreResult<bool> {
        let container = self.container(container)?;
        let mut objects = container.objects.write().map_err(poisoned)?;

        let root = objects.get(name).and_then(ObjectEntry::root);
        evaluate(conditions, root.map(|v| v.observed())).map_err(|r| rejected(name, r))?;

        let Some(version) = version else {
            let removed = objects.remove(name).is_some();
            if removed {
                debug!(name, "object deleted");
            }
            return Ok(removed);
        };

        let Some(entry) = objects.get_mut(name) else {
            return Ok(false);
        };
        if entry
            .root()
            .is_some_and(|root| &root.descriptor.version_id == version)
        {
            return Err(action_failed(name, "cannot delete the root version of an object"));
        }
        let Some(index) = entry.position(version) else {
            return Ok(false);
        };

        entry.versions.remove(index);
        if entry.versions.is_empty() {
            objects.remove(name);
        }
        debug!(name, version_id = %version, "version deleted");
        Ok(true)
    }

    fn replace_metadata(
        &self,
        container: &str,
        name: &str,
        version: Option<&VersionId>,
        metadata: Metadata,
        conditions: &Conditions,
    ) -> StoreResult<()> {
        let container = self.container(container)?;
        let mut objects = container.objects.write().map_err(poisoned)?;

        let Some(entry) = objects.get_mut(name) else {
            return Err(action_failed(name, "cannot set metadata because the object does not exist"));
        };
        evaluate(conditions, entry.root().map(|v| v.observed())).map_err(|r| rejected(name, r))?;

        let index = match version {
            Some(id) => entry
                .position(id)
                .ok_or_else(|| action_failed(name, "cannot set metadata on a missing version"))?,
            None => entry.versions.len().saturating_sub(1),
        };
        if index + 1 != entry.versions.len() {
            return Err(action_failed(name, "cannot set metadata on a non-root version"));
        }

        let current = &entry.versions[index];
        let mut descriptor = current.descriptor.clone();
        descriptor.metadata = Some(metadata);
        let replacement = StoredVersion {
            descriptor,
            payload: current.payload.clone(),
        };
        entry.versions[index] = Arc::new(replacement);

        debug!(name, "root metadata replaced");
        Ok(())
    }

    fn list(&self, container: &str, options: &ListOptions) -> StoreResult<Vec<VersionDescriptor>> {
        let Some(container) = self.find_container(container)? else {
            return Ok(Vec::new());
        };
        let objects = container.objects.read().map_err(poisoned)?;

        let mut listed = Vec::new();
        let prefix = options.prefix.as_str();
        let from = (Bound::Included(prefix), Bound::Unbounded);
        for (name, entry) in objects.range::<str, _>(from) {
            if !name.starts_with(prefix) {
                break;
            }
            let last = entry.versions.len().saturating_sub(1);
            let first = if options.include_versions { 0 } else { last };
            for (index, stored) in entry.versions.iter().enumerate().skip(first) {
                let descriptor = stored.describe(index == last, options.include_metadata);
                if options.matches(&descriptor) {
                    listed.push(descriptor);
                }
            }
        }
        Ok(listed)
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectBackend for InMemoryBackend {
    async fn create_container_if_not_exists(&self, container: &str) -> StoreResult<bool> {
        let started = Instant::now();
        let created = self.create_container(container)?;
        self.latency.settle(started, 0).await;
        Ok(created)
    }

    async fn delete_container_if_exists(&self, container: &str) -> StoreResult<bool> {
        let started = Instant::now();
        let deleted = self.delete_container(container)?;
        self.latency.settle(started, 0).await;
        Ok(deleted)
    }

    async fn exists(
        &self,
        container: &str,
        name: &str,
        version: Option<&VersionId>,
    ) -> StoreResult<bool> {
        let started = Instant::now();
        let exists = self.object_exists(container, name, version)?;
        self.latency.settle(started, 0).await;
        Ok(exists)
    }

    async fn put(
        &self,
        container: &str,
        name: &str,
        payload: Payload,
        options: PutOptions,
    ) -> StoreResult<PutResult> {
        let started = Instant::now();
        let bytes = payload.len();
        let result = self.write_version(container, name, payload, options)?;
        self.latency.settle(started, bytes).await;
        Ok(result)
    }

    async fn get(
        &self,
        container: &str,
        name: &str,
        version: Option<&VersionId>,
        conditions: &Conditions,
    ) -> StoreResult<Option<ObjectVersion>> {
        let started = Instant::now();
        let found = self.read_version(container, name, version, conditions)?;
        let bytes = found.as_ref().map_or(0, |v| v.descriptor.content_length);
        self.latency.settle(started, bytes).await;
        Ok(found)
    }

    async fn delete(
        &self,
        container: &str,
        name: &str,
        version: Option<&VersionId>,
        conditions: &Conditions,
    ) -> StoreResult<bool> {
        let started = Instant::now();
        let removed = self.remove(container, name, version, conditions)?;
        self.latency.settle(started, 0).await;
        Ok(removed)
    }

    async fn set_metadata(
        &self,
        container: &str,
        name: &str,
        version: Option<&VersionId>,
        metadata: Metadata,
        conditions: &Conditions,
    ) -> StoreResult<()> {
        let started = Instant::now();
        self.replace_metadata(container, name, version, metadata, conditions)?;
        self.latency.settle(started, 0).await;
        Ok(())
    }

    async fn enumerate(
        &self,
        container: &str,
        options: &ListOptions,
    ) -> StoreResult<Vec<VersionDescriptor>> {
        let started = Instant::now();
        let listed = self.list(container, options)?;
        self.latency.settle(started, 0).await;
        Ok(listed)
    }
}

impl std::fmt::Debug for InMemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.containers.read().map(|c| c.len()).unwrap_or_default();
        f.debug_struct("InMemoryBackend")
            .field("container_count", &count)
            .field("latency", self.latency.config())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use chrono::Duration;
    use stow_types::{ContentSettings, ETagMatch};

    const BOX: &str = "things";

    async fn backend() -> InMemoryBackend {
        let backend = InMemoryBackend::with_config(StoreConfig::without_latency()).unwrap();
        backend.create_container_if_not_exists(BOX).await.unwrap();
        backend
    }

    fn meta(pairs: &[(&str, &str)]) -> Metadata {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    async fn put(backend: &InMemoryBackend, name: &str, body: &'static [u8]) -> PutResult {
        backend
            .put(BOX, name, Payload::from(body), PutOptions::default())
            .await
            .unwrap()
    }

    async fn put_if(
        backend: &InMemoryBackend,
        name: &str,
        body: &'static [u8],
        conditions: Conditions,
    ) -> StoreResult<PutResult> {
        let options = PutOptions::default().with_conditions(conditions);
        backend.put(BOX, name, Payload::from(body), options).await
    }

    async fn get(backend: &InMemoryBackend, name: &str) -> Option<ObjectVersion> {
        backend.get(BOX, name, None, &Conditions::none()).await.unwrap()
    }

    async fn versions(backend: &InMemoryBackend, prefix: &str) -> Vec<VersionDescriptor> {
        let options = ListOptions {
            include_versions: true,
            include_metadata: true,
            ..ListOptions::with_prefix(prefix)
        };
        backend.enumerate(BOX, &options).await.unwrap()
    }

    // ---- containers ----

    #[tokio::test]
    async fn create_container_is_idempotent() {
        let backend = InMemoryBackend::with_config(StoreConfig::without_latency()).unwrap();
        assert!(backend.create_container_if_not_exists("alpha").await.unwrap());
        assert!(!backend.create_container_if_not_exists("alpha").await.unwrap());
        assert_eq!(backend.container_names().unwrap(), vec!["alpha".to_string()]);
    }

    #[tokio::test]
    async fn create_container_validates_name() {
        let backend = backend().await;
        let err = backend.create_container_if_not_exists("Bad_Name").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidContainerName { .. }));
    }

    #[tokio::test]
    async fn delete_container_removes_objects() {
        let backend = backend().await;
        put(&backend, "a", b"1").await;
        assert_eq!(backend.object_count(BOX).unwrap(), Some(1));

        assert!(backend.delete_container_if_exists(BOX).await.unwrap());
        assert!(!backend.delete_container_if_exists(BOX).await.unwrap());
        assert_eq!(backend.object_count(BOX).unwrap(), None);

        backend.create_container_if_not_exists(BOX).await.unwrap();
        assert!(get(&backend, "a").await.is_none());
    }

    #[tokio::test]
    async fn operations_on_missing_container_fail() {
        let backend = backend().await;
        let err = backend
            .put("missing", "a", Payload::None, PutOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ContainerNotFound { .. }));

        let err = backend
            .get("missing", "a", None, &Conditions::none())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ContainerNotFound { .. }));
    }

    #[tokio::test]
    async fn enumerate_missing_container_is_empty() {
        let backend = backend().await;
        let listed = backend
            .enumerate("missing", &ListOptions::default())
            .await
            .unwrap();
        assert!(listed.is_empty());
    }

    // ---- put / get ----

    #[tokio::test]
    async fn put_then_get_returns_content_and_stamps() {
        let backend = backend().await;
        let options = PutOptions::default()
            .with_metadata(meta(&[("owner", "ops")]))
            .with_content(ContentSettings::with_type("text/plain"));
        let result = backend
            .put(BOX, "notes/a.txt", Payload::from(&b"hello"[..]), options)
            .await
            .unwrap();

        let got = get(&backend, "notes/a.txt").await.unwrap();
        assert_eq!(got.payload.as_bytes(), b"hello");
        let d = got.descriptor;
        assert_eq!(d.name, "notes/a.txt");
        assert_eq!(d.etag, result.etag);
        assert_eq!(d.version_id, result.version_id);
        assert_eq!(d.last_modified, result.last_modified);
        assert_eq!(d.creation_time, result.last_modified);
        assert_eq!(d.metadata, Some(meta(&[("owner", "ops")])));
        assert_eq!(d.content_length, 5);
        assert_eq!(d.content_type, "text/plain");
        assert_eq!(d.object_type, ObjectType::Block);
        assert_eq!(d.content_hash, StampHasher::content_hash(b"hello"));
        assert!(d.is_root);
    }

    #[tokio::test]
    async fn etag_is_derived_from_stamp_payload_and_metadata() {
        let backend = backend().await;
        let metadata = meta(&[("a", "1")]);
        let result = backend
            .put(
                BOX,
                "x",
                Payload::from(&b"body"[..]),
                PutOptions::default().with_metadata(metadata.clone()),
            )
            .await
            .unwrap();
        assert_eq!(
            result.etag,
            StampHasher::etag(&result.last_modified, b"body", Some(&metadata))
        );
        assert_eq!(result.version_id, StampHasher::version_id(&result.last_modified));
    }

    #[tokio::test]
    async fn get_missing_object_is_none() {
        let backend = backend().await;
        assert!(get(&backend, "nope").await.is_none());
    }

    #[tokio::test]
    async fn two_puts_keep_both_versions() {
        let backend = backend().await;
        let v1 = put(&backend, "k", b"v1").await;
        let v2 = put(&backend, "k", b"v2").await;
        assert!(v2.last_modified > v1.last_modified);
        assert_ne!(v1.etag, v2.etag);

        let root = get(&backend, "k").await.unwrap();
        assert_eq!(root.payload.as_bytes(), b"v2");
        assert_eq!(root.descriptor.version_id, v2.version_id);

        let old = backend
            .get(BOX, "k", Some(&v1.version_id), &Conditions::none())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(old.payload.as_bytes(), b"v1");
        assert!(!old.descriptor.is_root);
        assert_eq!(versions(&backend, "k").await.len(), 2);
    }

    #[tokio::test]
    async fn identical_payloads_get_distinct_etags() {
        let backend = backend().await;
        let a = put(&backend, "k", b"same").await;
        let b = put(&backend, "k", b"same").await;
        assert_ne!(a.etag, b.etag);
        assert_ne!(a.version_id, b.version_id);
    }

    #[tokio::test]
    async fn sequential_writes_advance_the_root() {
        let backend = backend().await;
        let mut previous: Option<PutResult> = None;
        for i in 0..50u32 {
            let body = Bytes::from(i.to_string());
            let result = backend
                .put(BOX, "seq", Payload::from(body), PutOptions::default())
                .await
                .unwrap();
            if let Some(prev) = &previous {
                assert!(result.last_modified > prev.last_modified);
            }
            let root = get(&backend, "seq").await.unwrap();
            assert_eq!(root.descriptor.version_id, result.version_id);
            previous = Some(result);
        }
    }

    #[tokio::test]
    async fn marker_object_has_no_payload() {
        let backend = backend().await;
        backend
            .put(
                BOX,
                "marker",
                Payload::None,
                PutOptions::default().with_metadata(meta(&[("state", "done")])),
            )
            .await
            .unwrap();
        let got = get(&backend, "marker").await.unwrap();
        assert!(got.payload.is_none());
        assert_eq!(got.descriptor.content_length, 0);
        assert_eq!(got.descriptor.metadata, Some(meta(&[("state", "done")])));
    }

    // ---- preconditions on put ----

    #[tokio::test]
    async fn if_match_follows_the_root() {
        let backend = backend().await;
        let v1 = put(&backend, "k", b"v1").await;
        put_if(&backend, "k", b"v2", Conditions::if_match(v1.etag.clone()))
            .await
            .unwrap();

        let err = put_if(&backend, "k", b"v3", Conditions::if_match(v1.etag))
            .await
            .unwrap_err();
        assert!(err.is_precondition_failed());
        assert_eq!(versions(&backend, "k").await.len(), 2);
    }

    #[tokio::test]
    async fn if_not_exists_is_create_only() {
        let backend = backend().await;
        put_if(&backend, "k", b"v1", Conditions::if_not_exists())
            .await
            .unwrap();
        let err = put_if(&backend, "k", b"v2", Conditions::if_not_exists())
            .await
            .unwrap_err();
        assert!(err.is_precondition_failed());
        assert_eq!(versions(&backend, "k").await.len(), 1);
        assert_eq!(get(&backend, "k").await.unwrap().payload.as_bytes(), b"v1");
    }

    #[tokio::test]
    async fn if_exists_on_missing_object_fails() {
        let backend = backend().await;
        let err = put_if(&backend, "k", b"v1", Conditions::if_exists())
            .await
            .unwrap_err();
        match err {
            StoreError::PreconditionFailed { name, condition } => {
                assert_eq!(name, "k");
                assert_eq!(condition, "if-match *");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(backend.object_count(BOX).unwrap(), Some(0));
    }

    #[tokio::test]
    async fn if_none_match_tag_blocks_matching_root() {
        let backend = backend().await;
        let v1 = put(&backend, "k", b"v1").await;
        let err = put_if(&backend, "k", b"v2", Conditions::if_none_match(v1.etag.clone()))
            .await
            .unwrap_err();
        assert!(err.is_precondition_failed());

        put(&backend, "k", b"v2").await;
        put_if(&backend, "k", b"v3", Conditions::if_none_match(v1.etag))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn modification_time_predicates_on_put() {
        let backend = backend().await;
        let v1 = put(&backend, "k", b"v1").await;
        let before = v1.last_modified - Duration::seconds(1);

        put_if(&backend, "k", b"v2", Conditions::none().modified_since(before))
            .await
            .unwrap();
        let err = put_if(&backend, "k", b"v3", Conditions::none().unmodified_since(before))
            .await
            .unwrap_err();
        assert!(err.is_precondition_failed());
    }

    // ---- preconditions on get ----

    #[tokio::test]
    async fn get_if_exists_on_missing_object_fails() {
        let backend = backend().await;
        let err = backend
            .get(BOX, "k", None, &Conditions::if_exists())
            .await
            .unwrap_err();
        assert!(err.is_precondition_failed());
    }

    #[tokio::test]
    async fn get_not_modified_is_a_precondition_failure() {
        let backend = backend().await;
        let v1 = put(&backend, "k", b"v1").await;
        let conditions = Conditions::none().modified_since(v1.last_modified);
        let err = backend.get(BOX, "k", None, &conditions).await.unwrap_err();
        assert!(err.is_precondition_failed());
    }

    #[tokio::test]
    async fn get_evaluates_against_the_requested_version() {
        let backend = backend().await;
        let v1 = put(&backend, "k", b"v1").await;
        put(&backend, "k", b"v2").await;
        let conditions = Conditions {
            if_match: Some(ETagMatch::Tag(v1.etag.clone())),
            ..Conditions::default()
        };
        let got = backend
            .get(BOX, "k", Some(&v1.version_id), &conditions)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got.payload.as_bytes(), b"v1");

        let err = backend.get(BOX, "k", None, &conditions).await.unwrap_err();
        assert!(err.is_precondition_failed());
    }

    // ---- exists ----

    #[tokio::test]
    async fn exists_by_object_and_version() {
        let backend = backend().await;
        let v1 = put(&backend, "k", b"v1").await;
        assert!(backend.exists(BOX, "k", None).await.unwrap());
        assert!(backend.exists(BOX, "k", Some(&v1.version_id)).await.unwrap());

        let unknown = VersionId::new("bm90LWEtdmVyc2lvbg==").unwrap();
        assert!(!backend.exists(BOX, "k", Some(&unknown)).await.unwrap());
        assert!(!backend.exists(BOX, "other", None).await.unwrap());
    }

    // ---- delete ----

    #[tokio::test]
    async fn delete_whole_object() {
        let backend = backend().await;
        put(&backend, "k", b"v1").await;
        put(&backend, "k", b"v2").await;
        assert!(backend.delete(BOX, "k", None, &Conditions::none()).await.unwrap());
        assert!(!backend.exists(BOX, "k", None).await.unwrap());
        assert!(!backend.delete(BOX, "k", None, &Conditions::none()).await.unwrap());
    }

    #[tokio::test]
    async fn deleting_the_root_version_is_rejected() {
        let backend = backend().await;
        put(&backend, "k", b"v1").await;
        let v2 = put(&backend, "k", b"v2").await;

        let err = backend
            .delete(BOX, "k", Some(&v2.version_id), &Conditions::none())
            .await
            .unwrap_err();
        assert!(err.is_action_failed());
        assert_eq!(versions(&backend, "k").await.len(), 2);
    }

    #[tokio::test]
    async fn deleting_the_only_version_is_rejected() {
        let backend = backend().await;
        let v1 = put(&backend, "k", b"v1").await;
        let err = backend
            .delete(BOX, "k", Some(&v1.version_id), &Conditions::none())
            .await
            .unwrap_err();
        assert!(err.is_action_failed());
        assert!(backend.exists(BOX, "k", None).await.unwrap());
    }

    #[tokio::test]
    async fn delete_historical_version() {
        let backend = backend().await;
        let v1 = put(&backend, "k", b"v1").await;
        let v2 = put(&backend, "k", b"v2").await;

        assert!(backend
            .delete(BOX, "k", Some(&v1.version_id), &Conditions::none())
            .await
            .unwrap());
        let remaining = versions(&backend, "k").await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].version_id, v2.version_id);

        assert!(!backend
            .delete(BOX, "k", Some(&v1.version_id), &Conditions::none())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn delete_with_failing_precondition_keeps_object() {
        let backend = backend().await;
        let v1 = put(&backend, "k", b"v1").await;
        put(&backend, "k", b"v2").await;
        let err = backend
            .delete(BOX, "k", None, &Conditions::if_match(v1.etag))
            .await
            .unwrap_err();
        assert!(err.is_precondition_failed());
        assert_eq!(versions(&backend, "k").await.len(), 2);
    }

    // ---- set_metadata ----

    #[tokio::test]
    async fn set_metadata_on_root_keeps_stamps() {
        let backend = backend().await;
        let v1 = put(&backend, "k", b"v1").await;
        backend
            .set_metadata(BOX, "k", None, meta(&[("tag", "x")]), &Conditions::none())
            .await
            .unwrap();

        let got = get(&backend, "k").await.unwrap();
        assert_eq!(got.descriptor.metadata, Some(meta(&[("tag", "x")])));
        assert_eq!(got.descriptor.etag, v1.etag);
        assert_eq!(got.descriptor.version_id, v1.version_id);
        assert_eq!(got.descriptor.last_modified, v1.last_modified);
        assert_eq!(got.payload.as_bytes(), b"v1");
    }

    #[tokio::test]
    async fn set_metadata_by_root_version_id() {
        let backend = backend().await;
        let v1 = put(&backend, "k", b"v1").await;
        backend
            .set_metadata(BOX, "k", Some(&v1.version_id), meta(&[("a", "b")]), &Conditions::none())
            .await
            .unwrap();
        let got = get(&backend, "k").await.unwrap();
        assert_eq!(got.descriptor.metadata, Some(meta(&[("a", "b")])));
    }

    #[tokio::test]
    async fn set_metadata_on_historical_version_is_rejected() {
        let backend = backend().await;
        let v1 = backend
            .put(
                BOX,
                "k",
                Payload::from(&b"v1"[..]),
                PutOptions::default().with_metadata(meta(&[("n", "1")])),
            )
            .await
            .unwrap();
        put(&backend, "k", b"v2").await;

        let err = backend
            .set_metadata(BOX, "k", Some(&v1.version_id), meta(&[("n", "9")]), &Conditions::none())
            .await
            .unwrap_err();
        assert!(err.is_action_failed());

        let listed = versions(&backend, "k").await;
        assert_eq!(listed[0].metadata, Some(meta(&[("n", "1")])));
        assert_eq!(listed[1].metadata, None);
    }

    #[tokio::test]
    async fn set_metadata_on_missing_object_is_rejected() {
        let backend = backend().await;
        let err = backend
            .set_metadata(BOX, "nope", None, Metadata::new(), &Conditions::none())
            .await
            .unwrap_err();
        assert!(err.is_action_failed());
    }

    // ---- enumerate ----

    #[tokio::test]
    async fn enumerate_lists_roots_in_name_order() {
        let backend = backend().await;
        put(&backend, "items/b", b"1").await;
        put(&backend, "items/a", b"1").await;
        put(&backend, "items/a", b"2").await;
        put(&backend, "other/c", b"1").await;

        let listed = backend
            .enumerate(BOX, &ListOptions::with_prefix("items/"))
            .await
            .unwrap();
        let names: Vec<&str> = listed.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["items/a", "items/b"]);
        assert!(listed.iter().all(|d| d.is_root));
        assert!(listed.iter().all(|d| d.metadata.is_none()));
    }

    #[tokio::test]
    async fn enumerate_versions_oldest_first() {
        let backend = backend().await;
        let v1 = put(&backend, "k", b"1").await;
        let v2 = put(&backend, "k", b"2").await;
        let v3 = put(&backend, "k", b"3").await;

        let listed = versions(&backend, "").await;
        let ids: Vec<&VersionId> = listed.iter().map(|d| &d.version_id).collect();
        assert_eq!(ids, vec![&v1.version_id, &v2.version_id, &v3.version_id]);
        let roots: Vec<bool> = listed.iter().map(|d| d.is_root).collect();
        assert_eq!(roots, vec![false, false, true]);
    }

    #[tokio::test]
    async fn enumerate_includes_metadata_on_request() {
        let backend = backend().await;
        backend
            .put(
                BOX,
                "m",
                Payload::None,
                PutOptions::default().with_metadata(meta(&[("k", "v")])),
            )
            .await
            .unwrap();
        let options = ListOptions {
            include_metadata: true,
            ..ListOptions::default()
        };
        let listed = backend.enumerate(BOX, &options).await.unwrap();
        assert_eq!(listed[0].metadata, Some(meta(&[("k", "v")])));
    }

    #[tokio::test]
    async fn enumerate_filters_by_type_and_time() {
        let backend = backend().await;
        let first = put(&backend, "a", b"1").await;
        put(&backend, "b", b"1").await;

        let options = ListOptions {
            modified_since: Some(first.last_modified),
            ..ListOptions::default()
        };
        let listed = backend.enumerate(BOX, &options).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "b");

        let options = ListOptions {
            object_type: Some(ObjectType::Page),
            ..ListOptions::default()
        };
        assert!(backend.enumerate(BOX, &options).await.unwrap().is_empty());
    }

    // ---- concurrency ----

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writers_keep_version_sets_consistent() {
        let backend = Arc::new(backend().await);
        let mut handles = Vec::new();
        for task in 0..8 {
            let backend = Arc::clone(&backend);
            handles.push(tokio::spawn(async move {
                for i in 0..25 {
                    let body = Bytes::from(format!("{task}-{i}"));
                    backend
                        .put(BOX, "shared", Payload::from(body), PutOptions::default())
                        .await
                        .unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let listed = versions(&backend, "shared").await;
        assert_eq!(listed.len(), 200);
        for pair in listed.windows(2) {
            assert!(pair[0].creation_time < pair[1].creation_time);
        }
        let root = get(&backend, "shared").await.unwrap();
        assert_eq!(root.descriptor.version_id, listed[199].version_id);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_create_only_admits_one_writer() {
        let backend = Arc::new(backend().await);
        let mut handles = Vec::new();
        for _ in 0..16 {
            let backend = Arc::clone(&backend);
            handles.push(tokio::spawn(async move {
                put_if(&backend, "once", b"x", Conditions::if_not_exists()).await
            }));
        }
        let mut won = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => won += 1,
                Err(e) => assert!(e.is_precondition_failed()),
            }
        }
        assert_eq!(won, 1);
    }

    // ---- latency ----

    #[tokio::test]
    async fn latency_model_delays_operations() {
        let backend = InMemoryBackend::new();
        let started = Instant::now();
        backend.create_container_if_not_exists(BOX).await.unwrap();
        assert!(started.elapsed() >= std::time::Duration::from_millis(5));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = StoreConfig::default();
        config.latency.min_latency = config.latency.max_latency;
        let err = InMemoryBackend::with_config(config).unwrap_err();
        assert!(matches!(err, StoreError::InvalidConfig(_)));
    }

    #[test]
    fn debug_shows_container_count() {
        let backend = InMemoryBackend::with_config(StoreConfig::without_latency()).unwrap();
        let text = format!("{backend:?}");
        assert!(text.contains("container_count: 0"));
    }
}
