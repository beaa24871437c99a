//! Error types for store operations.

use thiserror::Error;

/// Errors that can occur during store operations.
///
/// Precondition failures and action failures are deliberately separate
/// variants: the first means a caller-declared check did not hold, the second
/// that the request would break a structural rule of the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A declared `If-Match`, `If-None-Match`, `If-Modified-Since` or
    /// `If-Unmodified-Since` predicate did not hold.
    #[error("precondition failed for {name}: {condition}")]
    PreconditionFailed { name: String, condition: String },

    /// The operation is structurally disallowed, e.g. deleting the root
    /// version or updating metadata of a historical version.
    #[error("action failed for {name}: {reason}")]
    ActionFailed { name: String, reason: String },

    /// The named container does not exist.
    #[error("container not found: {name}")]
    ContainerNotFound { name: String },

    /// The container name is invalid.
    #[error("invalid container name: {name}: {reason}")]
    InvalidContainerName { name: String, reason: String },

    /// Transport failure reported by an external backend.
    #[error("backend error: {0}")]
    Backend(String),

    /// A lock guarding store state was poisoned by a panicking writer.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),

    /// Store configuration is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl StoreError {
    /// Returns `true` for [`StoreError::PreconditionFailed`].
    pub fn is_precondition_failed(&self) -> bool {
        matches!(self, Self::PreconditionFailed { .. })
    }

    /// Returns `true` for [`StoreError::ActionFailed`].
    pub fn is_action_failed(&self) -> bool {
        matches!(self, Self::ActionFailed { .. })
    }
}

/// Convenience type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
