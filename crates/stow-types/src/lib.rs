//! Foundation types for stow.
//!
//! This crate provides the data model shared by every other stow crate: the
//! identity values stamped on each write, the payload and metadata carried by
//! a version, the records returned from writes and listings, and the
//! precondition set a caller can declare on an operation.
//!
//! # Key Types
//!
//! - [`ETag`] - Opaque entity tag of one written version
//! - [`VersionId`] - Identifier of a version within an object
//! - [`Payload`] - Version content, or `None` for metadata-only objects
//! - [`Conditions`] - Match / none-match / modified-since preconditions
//! - [`PutResult`] - Stamps returned from a successful write
//! - [`VersionDescriptor`] - Observed shape of a stored version

pub mod conditions;
pub mod error;
pub mod identity;
pub mod object;

pub use conditions::{Conditions, ETagMatch};
pub use error::TypeError;
pub use identity::{ContentHash, ETag, VersionId};
pub use object::{
    ContentSettings, Metadata, ObjectType, Payload, PutResult, Timestamp, VersionDescriptor,
};
