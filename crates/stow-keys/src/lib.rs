//! Structured key codec for stow.
//!
//! A [`KeyMap`] is compiled once from a path template such as
//! `"items/{k.0:N}/{k.1}"` and a suffix such as `".json"`. It then renders
//! typed keys into object names, derives listing prefixes from partially
//! known keys, and parses object names back into keys.
//!
//! # Key Types
//!
//! - [`KeyMap`] - Compiled template for one key type
//! - [`StructuredKey`] - Scalars, tuples, `()` and [`structured_key!`] structs
//! - [`PartialKey`] - Leading members used for prefix derivation
//! - [`FormatSpec`] - Per-member format specifier
//!
//! Member types form a closed set ([`MemberKind`]): `Uuid`, `i32`, `i64`,
//! `u32`, `u64`, `f64`, `String` and `chrono::NaiveDate`.

pub mod error;
pub mod format;
pub mod key;
pub mod keymap;
pub mod member;
pub mod sortable;
mod template;

pub use error::{KeyMapError, KeyResult};
pub use format::{FormatSpec, UuidStyle, DEFAULT_DATE_FORMAT};
pub use key::{PartialKey, StructuredKey};
pub use keymap::{KeyMap, Segment};
pub use member::{KeyMember, KeyValue, MemberKind};
