//! Identity and clock for stow.
//!
//! Every accepted write is stamped with a timestamp from a [`WriteClock`] and
//! identified by values derived from it with [`StampHasher`]:
//!
//! - the **ETag** digests the timestamp, the payload, and the sorted metadata,
//!   so any change to one of them yields a new tag;
//! - the **version id** digests the timestamp alone.
//!
//! The clock never hands out the same instant twice, which makes both values
//! unique per write and keeps "latest version" well defined.

pub mod clock;
pub mod hasher;

pub use clock::WriteClock;
pub use hasher::StampHasher;
