use async_trait::async_trait;
use stow_types::{
    Conditions, ContentSettings, Metadata, ObjectType, Payload, PutResult, Timestamp,
    VersionDescriptor, VersionId,
};

use crate::error::StoreResult;

/// Options of a single write.
#[derive(Clone, Debug, Default)]
pub struct PutOptions {
    pub metadata: Option<Metadata>,
    pub content: ContentSettings,
    pub conditions: Conditions,
}

impl PutOptions {
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_content(mut self, content: ContentSettings) -> Self {
        self.content = content;
        self
    }

    pub fn with_conditions(mut self, conditions: Conditions) -> Self {
        self.conditions = conditions;
        self
    }
}

/// Listing options for [`ObjectBackend::enumerate`].
///
/// Every filter is optional and they combine with AND.
#[derive(Clone, Debug, Default)]
pub struct ListOptions {
    /// Only objects whose name starts with this prefix.
    pub prefix: String,
    pub include_metadata: bool,
    /// List every version, oldest first, instead of only the root.
    pub include_versions: bool,
    pub object_type: Option<ObjectType>,
    /// Only versions last modified strictly after this instant.
    pub modified_since: Option<Timestamp>,
    /// Only versions last modified at or before this instant.
    pub unmodified_since: Option<Timestamp>,
}

impl ListOptions {
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    /// Check whether a listed version passes the type and time filters.
    pub fn matches(&self, descriptor: &VersionDescriptor) -> bool {
        if let Some(kind) = self.object_type {
            if descriptor.object_type != kind {
                return false;
            }
        }
        if let Some(since) = self.modified_since {
            if descriptor.last_modified <= since {
                return false;
            }
        }
        if let Some(since) = self.unmodified_since {
            if descriptor.last_modified > since {
                return false;
            }
        }
        true
    }
}

/// A resolved version with its content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectVersion {
    pub descriptor: VersionDescriptor,
    pub payload: Payload,
}

/// Versioned object storage backend.
///
/// The in-memory engine and network adapters implement this identically.
/// All implementations must satisfy these invariants:
/// - Each write creates an immutable version stamped with a unique ETag,
///   version id and strictly increasing timestamp.
/// - The root version of an object is its most recently created one.
/// - The root version cannot be deleted on its own, and only the root
///   version's metadata can be replaced.
/// - A failing precondition leaves the store unchanged and is reported as
///   [`StoreError::PreconditionFailed`](crate::StoreError::PreconditionFailed),
///   never as absence.
/// - Native "not modified" or "conflict" responses of a remote service are
///   translated into `PreconditionFailed`.
#[async_trait]
pub trait ObjectBackend: Send + Sync {
    /// Create a container. Returns `true` if it did not exist before.
    async fn create_container_if_not_exists(&self, container: &str) -> StoreResult<bool>;

    /// Delete a container and every object in it. Returns `true` if it
    /// existed.
    async fn delete_container_if_exists(&self, container: &str) -> StoreResult<bool>;

    /// Check whether an object has any version, or the given version.
    async fn exists(
        &self,
        container: &str,
        name: &str,
        version: Option<&VersionId>,
    ) -> StoreResult<bool>;

    /// Write a new root version. Preconditions are evaluated against the
    /// current root.
    async fn put(
        &self,
        container: &str,
        name: &str,
        payload: Payload,
        options: PutOptions,
    ) -> StoreResult<PutResult>;

    /// Read the root version, or the given version.
    ///
    /// Preconditions are evaluated against the resolved version. Returns
    /// `Ok(None)` when it does not exist and no declared predicate requires
    /// it to.
    async fn get(
        &self,
        container: &str,
        name: &str,
        version: Option<&VersionId>,
        conditions: &Conditions,
    ) -> StoreResult<Option<ObjectVersion>>;

    /// Delete the whole object, or one non-root version of it. Returns
    /// `true` if anything was removed.
    async fn delete(
        &self,
        container: &str,
        name: &str,
        version: Option<&VersionId>,
        conditions: &Conditions,
    ) -> StoreResult<bool>;

    /// Replace the metadata of the root version. Naming a historical version
    /// is an action failure.
    async fn set_metadata(
        &self,
        container: &str,
        name: &str,
        version: Option<&VersionId>,
        metadata: Metadata,
        conditions: &Conditions,
    ) -> StoreResult<()>;

    /// List versions in name order. A missing container lists as empty.
    async fn enumerate(
        &self,
        container: &str,
        options: &ListOptions,
    ) -> StoreResult<Vec<VersionDescriptor>>;
}
