//! Versioned object store engine for stow.
//!
//! This crate defines the [`ObjectBackend`] interface shared by every storage
//! backend and provides [`InMemoryBackend`], a reference implementation that
//! reproduces the consistency model of a versioned cloud object store in
//! process memory.
//!
//! # Semantics
//!
//! - Every write appends an immutable version; the most recent one is the
//!   root and represents the object's current state.
//! - Declared [`Conditions`](stow_types::Conditions) gate writes, reads,
//!   deletes and metadata updates. A failing predicate is always reported
//!   as [`StoreError::PreconditionFailed`].
//! - The root version cannot be deleted on its own and historical versions'
//!   metadata cannot be replaced; both are [`StoreError::ActionFailed`].
//! - [`LatencyModel`] adds simulated request and transfer time to every
//!   in-memory operation.

pub mod conditions;
pub mod config;
pub mod error;
pub mod latency;
pub mod memory;
pub mod names;
pub mod traits;

pub use conditions::{evaluate, Observed, Rejection};
pub use config::{LatencyConfig, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use latency::LatencyModel;
pub use memory::InMemoryBackend;
pub use traits::{ListOptions, ObjectBackend, ObjectVersion, PutOptions};
