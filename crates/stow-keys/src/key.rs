//! Key shapes a template can be compiled against.
//!
//! A key is either a single scalar member (`Uuid`, `i64`, `String`, ...), a
//! tuple of members, a named struct declared with [`structured_key!`], or
//! `()` for constant paths. [`PartialKey`] carries a leading run of members
//! used to derive listing prefixes.

use uuid::Uuid;

use chrono::NaiveDate;

use crate::member::{KeyMember, KeyValue, MemberKind};

/// A key type whose members the codec can render and reconstruct.
pub trait StructuredKey: Sized {
    /// Member kinds in declaration order.
    const KINDS: &'static [MemberKind];

    /// Member names usable as `{k.name}`. Empty for tuples and scalars.
    const NAMES: &'static [&'static str];

    /// Scalar keys are referenced whole (`{k}`); composite keys by member.
    const SCALAR: bool;

    /// The member values in declaration order.
    fn to_values(&self) -> Vec<KeyValue>;

    /// Rebuild a key from values in declaration order.
    fn from_values(values: Vec<KeyValue>) -> Option<Self>;
}

macro_rules! impl_scalar_key {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl StructuredKey for $ty {
                const KINDS: &'static [MemberKind] = &[<$ty as KeyMember>::KIND];
                const NAMES: &'static [&'static str] = &[];
                const SCALAR: bool = true;

                fn to_values(&self) -> Vec<KeyValue> {
                    vec![self.to_value()]
                }

                fn from_values(values: Vec<KeyValue>) -> Option<Self> {
                    let mut values = values.into_iter();
                    let key = <$ty as KeyMember>::from_value(values.next()?)?;
                    values.next().is_none().then_some(key)
                }
            }

            impl From<$ty> for PartialKey {
                fn from(value: $ty) -> Self {
                    PartialKey::Scalar(value.to_value())
                }
            }
        )+
    };
}

impl_scalar_key!(Uuid, i32, i64, u32, u64, f64, String, NaiveDate);

impl From<&str> for PartialKey {
    fn from(value: &str) -> Self {
        PartialKey::Scalar(KeyValue::Str(value.to_string()))
    }
}

impl StructuredKey for () {
    const KINDS: &'static [MemberKind] = &[];
    const NAMES: &'static [&'static str] = &[];
    const SCALAR: bool = false;

    fn to_values(&self) -> Vec<KeyValue> {
        Vec::new()
    }

    fn from_values(values: Vec<KeyValue>) -> Option<Self> {
        values.is_empty().then_some(())
    }
}

macro_rules! impl_tuple_key {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: KeyMember),+> StructuredKey for ($($name,)+) {
            const KINDS: &'static [MemberKind] = &[$($name::KIND),+];
            const NAMES: &'static [&'static str] = &[];
            const SCALAR: bool = false;

            fn to_values(&self) -> Vec<KeyValue> {
                vec![$(self.$idx.to_value()),+]
            }

            fn from_values(values: Vec<KeyValue>) -> Option<Self> {
                let mut values = values.into_iter();
                let key = ($($name::from_value(values.next()?)?,)+);
                values.next().is_none().then_some(key)
            }
        }

        impl<$($name: KeyMember),+> From<($($name,)+)> for PartialKey {
            fn from(prefix: ($($name,)+)) -> Self {
                PartialKey::Prefix(vec![$(prefix.$idx.to_value()),+])
            }
        }
    };
}

impl_tuple_key!(A: 0);
impl_tuple_key!(A: 0, B: 1);
impl_tuple_key!(A: 0, B: 1, C: 2);
impl_tuple_key!(A: 0, B: 1, C: 2, D: 3);
impl_tuple_key!(A: 0, B: 1, C: 2, D: 3, E: 4);
impl_tuple_key!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);

/// Declare a named struct usable as a composite key.
///
/// Fields may be referenced by name (`{k.tenant}`) or position (`{k.0}`).
///
/// ```
/// use stow_keys::{structured_key, KeyMap};
///
/// structured_key! {
///     #[derive(Debug, Clone, PartialEq)]
///     pub struct OrderKey {
///         pub customer: String,
///         pub number: u32,
///     }
/// }
///
/// let map = KeyMap::<OrderKey>::compile("orders/{k.customer}/{k.number:D6}", "").unwrap();
/// let key = OrderKey { customer: "acme".into(), number: 42 };
/// assert_eq!(map.render(&key), "orders/acme/000042");
/// ```
#[macro_export]
macro_rules! structured_key {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $($fvis:vis $field:ident : $ty:ty),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $($fvis $field: $ty),+
        }

        impl $crate::StructuredKey for $name {
            const KINDS: &'static [$crate::MemberKind] = &[$(<$ty as $crate::KeyMember>::KIND),+];
            const NAMES: &'static [&'static str] = &[$(stringify!($field)),+];
            const SCALAR: bool = false;

            fn to_values(&self) -> ::std::vec::Vec<$crate::KeyValue> {
                ::std::vec![$($crate::KeyMember::to_value(&self.$field)),+]
            }

            fn from_values(values: ::std::vec::Vec<$crate::KeyValue>) -> ::std::option::Option<Self> {
                let mut values = values.into_iter();
                let key = Self {
                    $($field: <$ty as $crate::KeyMember>::from_value(values.next()?)?),+
                };
                values.next().is_none().then_some(key)
            }
        }
    };
}

/// A leading subset of a key's members.
///
/// A bare scalar against a composite key acts as its first member.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum PartialKey {
    /// No members known; the prefix is the template's leading literal.
    #[default]
    None,
    Scalar(KeyValue),
    /// Members `0..n` in declaration order.
    Prefix(Vec<KeyValue>),
}

impl PartialKey {
    /// Every member of a complete key.
    pub fn full<K: StructuredKey>(key: &K) -> Self {
        Self::Prefix(key.to_values())
    }

    /// The known member values in declaration order.
    pub fn values(&self) -> &[KeyValue] {
        match self {
            Self::None => &[],
            Self::Scalar(value) => std::slice::from_ref(value),
            Self::Prefix(values) => values,
        }
    }
}
