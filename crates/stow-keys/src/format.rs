//! Per-member format specifiers.
//!
//! A specifier is the text after the colon in `{k.0:N}`. It is validated
//! against the member's kind when the template is compiled, so rendering
//! never has to report a bad specifier.
//!
//! | Kind            | Specifiers                                         |
//! |-----------------|----------------------------------------------------|
//! | uuid            | `N` simple, `D` hyphenated (default), `B` braced, `P` parenthesized |
//! | integers        | `D<n>` zero-padded, `x<n>`/`X<n>` hex, `S<n>` sortable |
//! | f64             | `F<n>` fixed decimals, `S<n>` sortable              |
//! | string          | none                                               |
//! | date            | any strftime pattern, default `%Y-%m-%d`           |

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::{KeyMapError, KeyResult};
use crate::member::{KeyValue, MemberKind};
use crate::sortable::{self, MAX_SORTABLE_DIGITS};

/// Date pattern used when a date member has no specifier.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Widest zero-padding or fixed-point precision accepted.
const MAX_WIDTH: usize = 64;

/// Textual form of a UUID member.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UuidStyle {
    Simple,
    Hyphenated,
    Braced,
    Parenthesized,
}

/// A compiled format specifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormatSpec {
    /// The kind's plain textual form.
    Default,
    Uuid(UuidStyle),
    ZeroPad(usize),
    Hex { upper: bool, width: usize },
    /// Sign-prefixed text with a fixed number of major digits.
    Sortable(u32),
    Fixed(usize),
    Date(String),
}

impl FormatSpec {
    /// Validate `spec` for a member of `kind`.
    pub fn compile(kind: MemberKind, spec: Option<&str>) -> KeyResult<Self> {
        let Some(spec) = spec else {
            return Ok(match kind {
                MemberKind::Date => Self::Date(DEFAULT_DATE_FORMAT.to_string()),
                _ => Self::Default,
            });
        };

        let compiled = match kind {
            MemberKind::Uuid => match spec {
                "N" | "n" => Some(Self::Uuid(UuidStyle::Simple)),
                "D" | "d" => Some(Self::Uuid(UuidStyle::Hyphenated)),
                "B" | "b" => Some(Self::Uuid(UuidStyle::Braced)),
                "P" | "p" => Some(Self::Uuid(UuidStyle::Parenthesized)),
                _ => None,
            },
            MemberKind::I32 | MemberKind::I64 | MemberKind::U32 | MemberKind::U64 => {
                Self::compile_integer(spec)
            }
            MemberKind::F64 => match split_width(spec) {
                Some(('F' | 'f', Some(precision))) if precision <= MAX_WIDTH => {
                    Some(Self::Fixed(precision))
                }
                Some(('S' | 's', Some(digits))) => Self::sortable(digits),
                _ => None,
            },
            MemberKind::Str => None,
            MemberKind::Date => {
                let valid = !StrftimeItems::new(spec).any(|item| matches!(item, Item::Error));
                valid.then(|| Self::Date(spec.to_string()))
            }
        };

        compiled.ok_or_else(|| KeyMapError::UnsupportedFormat {
            kind,
            spec: spec.to_string(),
        })
    }

    fn compile_integer(spec: &str) -> Option<Self> {
        let (head, width) = split_width(spec)?;
        if width.is_some_and(|w| w > MAX_WIDTH) {
            return None;
        }
        match head {
            'D' | 'd' => Some(Self::ZeroPad(width.unwrap_or(0))),
            'x' | 'X' => Some(Self::Hex {
                upper: head == 'X',
                width: width.unwrap_or(0),
            }),
            'S' | 's' => Self::sortable(width?),
            _ => None,
        }
    }

    fn sortable(digits: usize) -> Option<Self> {
        let digits = u32::try_from(digits).ok()?;
        (1..=MAX_SORTABLE_DIGITS)
            .contains(&digits)
            .then_some(Self::Sortable(digits))
    }

    /// Render a value. The value's kind must be the kind this spec was
    /// compiled for.
    pub fn format(&self, value: &KeyValue) -> String {
        match (self, value) {
            (Self::Uuid(style), KeyValue::Uuid(id)) => match style {
                UuidStyle::Simple => id.simple().to_string(),
                UuidStyle::Hyphenated => id.hyphenated().to_string(),
                UuidStyle::Braced => id.braced().to_string(),
                UuidStyle::Parenthesized => format!("({})", id.hyphenated()),
            },
            (Self::ZeroPad(width), v) => match v.as_i128() {
                Some(n) => format!("{n:0w$}", w = *width),
                None => v.to_string(),
            },
            (Self::Hex { upper, width }, v) => match twos_complement(v) {
                Some(bits) if *upper => format!("{bits:0w$X}", w = *width),
                Some(bits) => format!("{bits:0w$x}", w = *width),
                None => v.to_string(),
            },
            (Self::Sortable(digits), KeyValue::F64(n)) => {
                sortable::format_sortable_float(*n, *digits).unwrap_or_else(|| n.to_string())
            }
            (Self::Sortable(digits), v) => match v.as_i128() {
                Some(n) => sortable::format_sortable(n, *digits),
                None => v.to_string(),
            },
            (Self::Fixed(precision), KeyValue::F64(n)) => format!("{n:.p$}", p = *precision),
            (Self::Date(pattern), KeyValue::Date(d)) => d.format(pattern).to_string(),
            (_, v) => v.to_string(),
        }
    }

    /// Parse text rendered by this spec back into a value of `kind`.
    ///
    /// Only the exact text [`format`](Self::format) produces is accepted, so
    /// `05` or `+5` is not read as the integer `5`.
    pub fn parse(&self, kind: MemberKind, text: &str) -> Option<KeyValue> {
        let value = self.parse_lenient(kind, text)?;
        (self.format(&value) == text).then_some(value)
    }

    fn parse_lenient(&self, kind: MemberKind, text: &str) -> Option<KeyValue> {
        match kind {
            MemberKind::Uuid => parse_uuid(text).map(KeyValue::Uuid),
            MemberKind::I32 | MemberKind::I64 | MemberKind::U32 | MemberKind::U64 => {
                self.parse_integer(kind, text)
            }
            MemberKind::F64 => match self {
                Self::Sortable(digits) => sortable::parse_sortable_float(text, *digits),
                _ => text.parse().ok(),
            }
            .map(KeyValue::F64),
            MemberKind::Str => Some(KeyValue::Str(text.to_string())),
            MemberKind::Date => {
                let pattern = match self {
                    Self::Date(pattern) => pattern.as_str(),
                    _ => DEFAULT_DATE_FORMAT,
                };
                NaiveDate::parse_from_str(text, pattern)
                    .ok()
                    .map(KeyValue::Date)
            }
        }
    }

    fn parse_integer(&self, kind: MemberKind, text: &str) -> Option<KeyValue> {
        match self {
            Self::Hex { .. } => {
                let bits = u128::from_str_radix(text, 16).ok()?;
                match kind {
                    MemberKind::I32 => u32::try_from(bits).ok().map(|b| KeyValue::I32(b as i32)),
                    MemberKind::I64 => u64::try_from(bits).ok().map(|b| KeyValue::I64(b as i64)),
                    _ => KeyValue::from_i128(kind, i128::try_from(bits).ok()?),
                }
            }
            Self::Sortable(digits) => {
                KeyValue::from_i128(kind, sortable::parse_sortable(text, *digits)?)
            }
            _ => KeyValue::from_i128(kind, text.parse().ok()?),
        }
    }
}

/// Split `X12` into `('X', Some(12))`; `X` alone gives `('X', None)`.
fn split_width(spec: &str) -> Option<(char, Option<usize>)> {
    let mut chars = spec.chars();
    let head = chars.next()?;
    let rest = chars.as_str();
    if rest.is_empty() {
        return Some((head, None));
    }
    if !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((head, Some(rest.parse().ok()?)))
}

/// Hex renders signed members as their two's-complement bit pattern.
fn twos_complement(value: &KeyValue) -> Option<u128> {
    match value {
        KeyValue::I32(n) => Some(u128::from(*n as u32)),
        KeyValue::I64(n) => Some(u128::from(*n as u64)),
        KeyValue::U32(n) => Some(u128::from(*n)),
        KeyValue::U64(n) => Some(u128::from(*n)),
        _ => None,
    }
}

fn parse_uuid(text: &str) -> Option<Uuid> {
    let inner = text
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .unwrap_or(text);
    Uuid::parse_str(inner).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> Uuid {
        Uuid::parse_str("f812d24c-6543-4cd1-8452-395cb6d803b6").unwrap()
    }

    fn roundtrip(kind: MemberKind, spec: Option<&str>, value: KeyValue) -> String {
        let compiled = FormatSpec::compile(kind, spec).unwrap();
        let text = compiled.format(&value);
        assert_eq!(compiled.parse(kind, &text), Some(value), "text {text:?}");
        text
    }

    // ---- uuid ----

    #[test]
    fn uuid_styles() {
        let v = KeyValue::Uuid(id());
        assert_eq!(
            roundtrip(MemberKind::Uuid, Some("N"), v.clone()),
            "f812d24c65434cd18452395cb6d803b6"
        );
        assert_eq!(
            roundtrip(MemberKind::Uuid, None, v.clone()),
            "f812d24c-6543-4cd1-8452-395cb6d803b6"
        );
        assert_eq!(
            roundtrip(MemberKind::Uuid, Some("B"), v.clone()),
            "{f812d24c-6543-4cd1-8452-395cb6d803b6}"
        );
        assert_eq!(
            roundtrip(MemberKind::Uuid, Some("P"), v),
            "(f812d24c-6543-4cd1-8452-395cb6d803b6)"
        );
    }

    #[test]
    fn uuid_rejects_unknown_style() {
        let err = FormatSpec::compile(MemberKind::Uuid, Some("Q")).unwrap_err();
        assert_eq!(
            err,
            KeyMapError::UnsupportedFormat {
                kind: MemberKind::Uuid,
                spec: "Q".into()
            }
        );
    }

    // ---- integers ----

    #[test]
    fn zero_padding() {
        assert_eq!(roundtrip(MemberKind::I32, Some("D5"), KeyValue::I32(42)), "00042");
        assert_eq!(roundtrip(MemberKind::I32, Some("D5"), KeyValue::I32(-42)), "-0042");
        assert_eq!(roundtrip(MemberKind::U64, Some("D"), KeyValue::U64(7)), "7");
    }

    #[test]
    fn hex_uses_twos_complement_for_signed() {
        assert_eq!(roundtrip(MemberKind::I32, Some("x"), KeyValue::I32(-1)), "ffffffff");
        assert_eq!(roundtrip(MemberKind::U32, Some("X4"), KeyValue::U32(255)), "00FF");
        assert_eq!(
            roundtrip(MemberKind::I64, Some("x"), KeyValue::I64(i64::MIN)),
            "8000000000000000"
        );
    }

    #[test]
    fn sortable_integers() {
        assert_eq!(roundtrip(MemberKind::I64, Some("S6"), KeyValue::I64(15)), "+000015");
        assert_eq!(roundtrip(MemberKind::I64, Some("S6"), KeyValue::I64(-15)), "-999985");
    }

    #[test]
    fn sortable_requires_digit_count() {
        assert!(FormatSpec::compile(MemberKind::I32, Some("S")).is_err());
        assert!(FormatSpec::compile(MemberKind::I32, Some("S0")).is_err());
        assert!(FormatSpec::compile(MemberKind::I32, Some("S21")).is_err());
    }

    #[test]
    fn integer_rejects_foreign_specs() {
        assert!(FormatSpec::compile(MemberKind::I32, Some("N")).is_err());
        assert!(FormatSpec::compile(MemberKind::I32, Some("D5x")).is_err());
        assert!(FormatSpec::compile(MemberKind::U32, Some("F2")).is_err());
    }

    #[test]
    fn integer_parse_rejects_out_of_range() {
        let spec = FormatSpec::compile(MemberKind::U32, None).unwrap();
        assert_eq!(spec.parse(MemberKind::U32, "-1"), None);
        assert_eq!(spec.parse(MemberKind::U32, "4294967296"), None);
        assert_eq!(spec.parse(MemberKind::U32, ""), None);
    }

    // ---- floats, strings, dates ----

    #[test]
    fn fixed_point_floats() {
        let spec = FormatSpec::compile(MemberKind::F64, Some("F2")).unwrap();
        assert_eq!(spec.format(&KeyValue::F64(12.34567)), "12.35");
        assert_eq!(spec.parse(MemberKind::F64, "12.35"), Some(KeyValue::F64(12.35)));
        assert_eq!(roundtrip(MemberKind::F64, None, KeyValue::F64(0.1)), "0.1");
    }

    #[test]
    fn sortable_floats() {
        assert_eq!(roundtrip(MemberKind::F64, Some("S3"), KeyValue::F64(12.34)), "+012.34");
        assert_eq!(roundtrip(MemberKind::F64, Some("S3"), KeyValue::F64(-12.34)), "-987.66");
        assert_eq!(roundtrip(MemberKind::F64, Some("S4"), KeyValue::F64(7.0)), "+0007");
        assert!(FormatSpec::compile(MemberKind::F64, Some("S")).is_err());
        assert!(FormatSpec::compile(MemberKind::F64, Some("S21")).is_err());
    }

    // ---- canonical text ----

    #[test]
    fn parse_accepts_only_rendered_text() {
        let plain = FormatSpec::compile(MemberKind::I32, None).unwrap();
        assert_eq!(plain.parse(MemberKind::I32, "5"), Some(KeyValue::I32(5)));
        assert_eq!(plain.parse(MemberKind::I32, "05"), None);
        assert_eq!(plain.parse(MemberKind::I32, "+5"), None);

        let padded = FormatSpec::compile(MemberKind::I32, Some("D3")).unwrap();
        assert_eq!(padded.parse(MemberKind::I32, "005"), Some(KeyValue::I32(5)));
        assert_eq!(padded.parse(MemberKind::I32, "5"), None);

        let hex = FormatSpec::compile(MemberKind::U32, Some("x")).unwrap();
        assert_eq!(hex.parse(MemberKind::U32, "FF"), None);

        let fixed = FormatSpec::compile(MemberKind::F64, Some("F2")).unwrap();
        assert_eq!(fixed.parse(MemberKind::F64, "12.3"), None);
    }

    #[test]
    fn uuid_parse_requires_the_compiled_style() {
        let simple = FormatSpec::compile(MemberKind::Uuid, Some("N")).unwrap();
        assert_eq!(simple.parse(MemberKind::Uuid, "f812d24c-6543-4cd1-8452-395cb6d803b6"), None);
        assert_eq!(simple.parse(MemberKind::Uuid, "F812D24C65434CD18452395CB6D803B6"), None);
        assert_eq!(
            simple.parse(MemberKind::Uuid, "f812d24c65434cd18452395cb6d803b6"),
            Some(KeyValue::Uuid(id()))
        );
    }

    #[test]
    fn date_parse_requires_padding() {
        let spec = FormatSpec::compile(MemberKind::Date, None).unwrap();
        assert_eq!(spec.parse(MemberKind::Date, "2023-1-5"), None);
    }

    #[test]
    fn strings_take_no_specifier() {
        assert!(FormatSpec::compile(MemberKind::Str, Some("D")).is_err());
        assert_eq!(
            roundtrip(MemberKind::Str, None, KeyValue::Str("a b".into())),
            "a b"
        );
    }

    #[test]
    fn dates() {
        let d = NaiveDate::from_ymd_opt(2023, 11, 5).unwrap();
        assert_eq!(roundtrip(MemberKind::Date, None, KeyValue::Date(d)), "2023-11-05");
        assert_eq!(
            roundtrip(MemberKind::Date, Some("%Y/%m/%d"), KeyValue::Date(d)),
            "2023/11/05"
        );
        assert_eq!(
            roundtrip(MemberKind::Date, Some("%Y%m%d"), KeyValue::Date(d)),
            "20231105"
        );
    }

    #[test]
    fn date_rejects_bad_strftime() {
        assert!(FormatSpec::compile(MemberKind::Date, Some("%Q")).is_err());
    }
}
