//! The closed set of types a key member may have.
//!
//! Each supported Rust type implements [`KeyMember`], which ties it to a
//! static [`MemberKind`] tag and converts it to and from the dynamic
//! [`KeyValue`] the codec renders and parses. There is no runtime type
//! inspection: the kind of every member is known when a template is
//! compiled.

use std::fmt;

use chrono::NaiveDate;
use uuid::Uuid;

/// Static type tag of a key member.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Uuid,
    I32,
    I64,
    U32,
    U64,
    F64,
    Str,
    Date,
}

impl MemberKind {
    /// Returns `true` for the integer kinds.
    pub fn is_integer(&self) -> bool {
        matches!(self, Self::I32 | Self::I64 | Self::U32 | Self::U64)
    }
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uuid => "uuid",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F64 => "f64",
            Self::Str => "string",
            Self::Date => "date",
        };
        f.write_str(name)
    }
}

/// A key member value with its kind attached.
#[derive(Clone, Debug, PartialEq)]
pub enum KeyValue {
    Uuid(Uuid),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F64(f64),
    Str(String),
    Date(NaiveDate),
}

impl KeyValue {
    /// The kind tag of this value.
    pub fn kind(&self) -> MemberKind {
        match self {
            Self::Uuid(_) => MemberKind::Uuid,
            Self::I32(_) => MemberKind::I32,
            Self::I64(_) => MemberKind::I64,
            Self::U32(_) => MemberKind::U32,
            Self::U64(_) => MemberKind::U64,
            Self::F64(_) => MemberKind::F64,
            Self::Str(_) => MemberKind::Str,
            Self::Date(_) => MemberKind::Date,
        }
    }

    /// Widened integer value, for the integer kinds.
    pub(crate) fn as_i128(&self) -> Option<i128> {
        match self {
            Self::I32(n) => Some(i128::from(*n)),
            Self::I64(n) => Some(i128::from(*n)),
            Self::U32(n) => Some(i128::from(*n)),
            Self::U64(n) => Some(i128::from(*n)),
            _ => None,
        }
    }

    /// Narrow an integer back into the given kind, if it fits.
    pub(crate) fn from_i128(kind: MemberKind, n: i128) -> Option<Self> {
        match kind {
            MemberKind::I32 => i32::try_from(n).ok().map(Self::I32),
            MemberKind::I64 => i64::try_from(n).ok().map(Self::I64),
            MemberKind::U32 => u32::try_from(n).ok().map(Self::U32),
            MemberKind::U64 => u64::try_from(n).ok().map(Self::U64),
            _ => None,
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uuid(u) => write!(f, "{}", u.hyphenated()),
            Self::I32(n) => write!(f, "{n}"),
            Self::I64(n) => write!(f, "{n}"),
            Self::U32(n) => write!(f, "{n}"),
            Self::U64(n) => write!(f, "{n}"),
            Self::F64(n) => write!(f, "{n}"),
            Self::Str(s) => f.write_str(s),
            Self::Date(d) => write!(f, "{}", d.format(crate::format::DEFAULT_DATE_FORMAT)),
        }
    }
}

/// A Rust type usable as a key member.
pub trait KeyMember: Sized {
    /// Static kind tag of the type.
    const KIND: MemberKind;

    /// Convert into the dynamic value the codec works with.
    fn to_value(&self) -> KeyValue;

    /// Convert back; `None` if the value has a different kind.
    fn from_value(value: KeyValue) -> Option<Self>;
}

macro_rules! impl_key_member {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(
            impl KeyMember for $ty {
                const KIND: MemberKind = MemberKind::$variant;

                fn to_value(&self) -> KeyValue {
                    KeyValue::$variant(self.clone())
                }

                fn from_value(value: KeyValue) -> Option<Self> {
                    match value {
                        KeyValue::$variant(v) => Some(v),
                        _ => None,
                    }
                }
            }
        )+
    };
}

impl_key_member! {
    Uuid => Uuid,
    i32 => I32,
    i64 => I64,
    u32 => U32,
    u64 => U64,
    f64 => F64,
    String => Str,
    NaiveDate => Date,
}
