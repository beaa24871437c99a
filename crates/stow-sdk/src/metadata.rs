//! Typed records carried in object metadata.
//!
//! Metadata is a flat string map. A [`MetadataRecord`] maps each of its
//! fields to one metadata key: numbers are written in sortable form with a
//! per-field count of major digits, dates as `%Y-%m-%d`, and everything else
//! in its plain textual form. Keys missing from the map read back as the
//! field's default value.
//!
//! ```
//! use stow_sdk::{metadata, metadata_record};
//!
//! metadata_record! {
//!     #[derive(Debug, Default, PartialEq)]
//!     pub struct Lease {
//!         #[metadata(key = "lease-owner")]
//!         pub owner: String,
//!         #[metadata(key = "lease-term", digits = 6)]
//!         pub term: u32,
//!     }
//! }
//!
//! let lease = Lease { owner: "worker-1".into(), term: 30 };
//! let map = metadata::to_metadata(&lease).unwrap();
//! assert_eq!(map["lease-term"], "+000030");
//! assert_eq!(metadata::from_metadata::<Lease>(&map).unwrap(), lease);
//! ```

use stow_keys::{FormatSpec, KeyValue, MemberKind};
use stow_types::Metadata;

use crate::error::{SdkError, SdkResult};

/// Major digits used for numeric fields that do not declare their own.
pub const DEFAULT_MAJOR_DIGITS: u32 = 15;

/// One field of a [`MetadataRecord`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MetadataField {
    /// Metadata key the field is stored under.
    pub key: &'static str,
    pub kind: MemberKind,
    /// Sortable major digits; ignored for non-numeric kinds.
    pub digits: u32,
}

impl MetadataField {
    /// The format the field's value is written in.
    pub fn format_spec(&self) -> SdkResult<FormatSpec> {
        let numeric = self.kind.is_integer() || self.kind == MemberKind::F64;
        let spec = numeric.then(|| format!("S{}", self.digits));
        Ok(FormatSpec::compile(self.kind, spec.as_deref())?)
    }
}

/// A struct stored field by field in object metadata.
///
/// Usually implemented with [`metadata_record!`](crate::metadata_record).
pub trait MetadataRecord: Sized {
    /// Fields in declaration order.
    const FIELDS: &'static [MetadataField];

    /// Field values in declaration order.
    fn to_values(&self) -> Vec<KeyValue>;

    /// Rebuild a record from values in declaration order. `None` marks a
    /// field absent from the metadata.
    fn from_values(values: Vec<Option<KeyValue>>) -> Option<Self>;
}

/// Encode `record` as a metadata map.
pub fn to_metadata<R: MetadataRecord>(record: &R) -> SdkResult<Metadata> {
    let mut metadata = Metadata::new();
    for (field, value) in R::FIELDS.iter().zip(record.to_values()) {
        let text = field.format_spec()?.format(&value);
        metadata.insert(field.key.to_string(), text);
    }
    Ok(metadata)
}

/// Decode a record from a metadata map. Keys not belonging to the record
/// are ignored.
pub fn from_metadata<R: MetadataRecord>(metadata: &Metadata) -> SdkResult<R> {
    let mut values = Vec::with_capacity(R::FIELDS.len());
    for field in R::FIELDS {
        let value = match metadata.get(field.key) {
            Some(text) => {
                let parsed = field.format_spec()?.parse(field.kind, text);
                Some(parsed.ok_or_else(|| SdkError::Metadata {
                    key: field.key.to_string(),
                    reason: format!("{text:?} is not a {} in stored form", field.kind),
                })?)
            }
            None => None,
        };
        values.push(value);
    }
    R::from_values(values).ok_or_else(|| SdkError::Metadata {
        key: R::FIELDS.first().map(|f| f.key).unwrap_or_default().to_string(),
        reason: "values do not match the record's fields".to_string(),
    })
}

/// Declare a struct that reads and writes object metadata.
///
/// Each field may carry `#[metadata(key = "...", digits = n)]`. The key
/// defaults to the field name and the digit count to
/// [`DEFAULT_MAJOR_DIGITS`]. Field types are the key member types and must
/// implement `Default`.
#[macro_export]
macro_rules! metadata_record {
    (@key $field:ident) => { stringify!($field) };
    (@key $field:ident $key:literal) => { $key };
    (@digits) => { $crate::metadata::DEFAULT_MAJOR_DIGITS };
    (@digits $digits:literal) => { $digits };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[metadata(key = $key:literal $(, digits = $digits:literal)?)])?
                $fvis:vis $field:ident : $ty:ty
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $($fvis $field: $ty),+
        }

        impl $crate::MetadataRecord for $name {
            const FIELDS: &'static [$crate::MetadataField] = &[$(
                $crate::MetadataField {
                    key: $crate::metadata_record!(@key $field $($key)?),
                    kind: <$ty as $crate::KeyMember>::KIND,
                    digits: $crate::metadata_record!(@digits $($($digits)?)?),
                }
            ),+];

            fn to_values(&self) -> ::std::vec::Vec<$crate::KeyValue> {
                ::std::vec![$($crate::KeyMember::to_value(&self.$field)),+]
            }

            fn from_values(
                values: ::std::vec::Vec<::std::option::Option<$crate::KeyValue>>,
            ) -> ::std::option::Option<Self> {
                let mut values = values.into_iter();
                let record = Self {
                    $($field: match values.next()? {
                        ::std::option::Option::Some(value) => {
                            <$ty as $crate::KeyMember>::from_value(value)?
                        }
                        ::std::option::Option::None => ::std::default::Default::default(),
                    }),+
                };
                values.next().is_none().then_some(record)
            }
        }
    };
}
