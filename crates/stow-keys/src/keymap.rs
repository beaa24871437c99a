use std::fmt;
use std::marker::PhantomData;

use regex::Regex;

use crate::error::{KeyMapError, KeyResult};
use crate::format::FormatSpec;
use crate::key::{PartialKey, StructuredKey};
use crate::template::{self, Part};

/// One compiled piece of a key template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    /// The whole scalar key.
    Key(FormatSpec),
    /// Member `index` of a composite key.
    Member { index: usize, format: FormatSpec },
}

impl Segment {
    /// The key member this segment reads, if any.
    fn slot(&self) -> Option<(usize, &FormatSpec)> {
        match self {
            Self::Literal(_) => None,
            Self::Key(format) => Some((0, format)),
            Self::Member { index, format } => Some((*index, format)),
        }
    }
}

/// A compiled, bidirectional mapping between keys of type `K` and object
/// names.
///
/// Built once from a template and a suffix:
///
/// ```
/// use stow_keys::KeyMap;
/// use uuid::Uuid;
///
/// let map = KeyMap::<(Uuid, String)>::compile("items/{k.0:N}/{k.1}", ".json").unwrap();
/// let id = Uuid::parse_str("f812d24c-6543-4cd1-8452-395cb6d803b6").unwrap();
///
/// let name = map.render(&(id, "abc".to_string()));
/// assert_eq!(name, "items/f812d24c65434cd18452395cb6d803b6/abc.json");
/// assert_eq!(map.parse(&name), Some((id, "abc".to_string())));
/// assert_eq!(map.render_prefix(&(id,).into()).unwrap(), "items/f812d24c65434cd18452395cb6d803b6/");
/// ```
///
/// # Guarantees
///
/// - `parse(render(k)) == Some(k)` for every key whose formatted members
///   round-trip through their format specifiers.
/// - `render(k)` starts with `render_prefix(p)` whenever `p` is a leading
///   subset of `k`.
/// - The suffix is never part of a prefix.
pub struct KeyMap<K> {
    template: String,
    suffix: String,
    segments: Vec<Segment>,
    /// Segments before the suffix literal.
    body_len: usize,
    pattern: Regex,
    _key: PhantomData<fn() -> K>,
}

impl<K: StructuredKey> KeyMap<K> {
    /// Compile `template` for keys of type `K`, appending `suffix` to every
    /// rendered name. A blank suffix is ignored.
    pub fn compile(template: &str, suffix: &str) -> KeyResult<Self> {
        let shape = |reason: &str| KeyMapError::Shape {
            template: template.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        let mut referenced = vec![false; K::KINDS.len()];

        for part in template::lex(template)? {
            let segment = match part {
                Part::Literal(text) => Segment::Literal(text),
                Part::Expr { member: None, format } => {
                    if !K::SCALAR {
                        return Err(shape("a whole-key reference needs a scalar key type"));
                    }
                    referenced[0] = true;
                    Segment::Key(FormatSpec::compile(K::KINDS[0], format.as_deref())?)
                }
                Part::Expr {
                    member: Some(member),
                    format,
                } => {
                    if K::SCALAR {
                        return Err(shape("member access needs a composite key type"));
                    }
                    let index = resolve_member::<K>(&member)?;
                    referenced[index] = true;
                    Segment::Member {
                        index,
                        format: FormatSpec::compile(K::KINDS[index], format.as_deref())?,
                    }
                }
            };
            segments.push(segment);
        }

        let count = referenced.iter().filter(|r| **r).count();
        if count != referenced.len() {
            return Err(KeyMapError::ArityMismatch {
                expected: referenced.len(),
                referenced: count,
            });
        }

        let body_len = segments.len();
        let suffix = suffix.trim();
        if !suffix.is_empty() {
            segments.push(Segment::Literal(suffix.to_string()));
        }

        let mut source = String::from("(?s)^");
        for segment in &segments {
            match segment {
                Segment::Literal(text) => source.push_str(&regex::escape(text)),
                _ => source.push_str("(.*?)"),
            }
        }
        source.push('$');
        let pattern = Regex::new(&source).map_err(|e| KeyMapError::Pattern(e.to_string()))?;

        Ok(Self {
            template: template.to_string(),
            suffix: suffix.to_string(),
            segments,
            body_len,
            pattern,
            _key: PhantomData,
        })
    }

    /// Render the full object name of `key`, suffix included.
    pub fn render(&self, key: &K) -> String {
        let values = key.to_values();
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Key(format) => out.push_str(&format.format(&values[0])),
                Segment::Member { index, format } => {
                    out.push_str(&format.format(&values[*index]))
                }
            }
        }
        out
    }

    /// Render the longest name prefix determined by `partial`.
    ///
    /// Rendering stops at the first member reference whose value is not
    /// supplied; the literal text before it is included. The suffix is never
    /// emitted, even when every member is supplied.
    pub fn render_prefix(&self, partial: &PartialKey) -> KeyResult<String> {
        let values = partial.values();
        if values.len() > K::KINDS.len() {
            return Err(KeyMapError::ArityMismatch {
                expected: K::KINDS.len(),
                referenced: values.len(),
            });
        }
        for (index, (value, expected)) in values.iter().zip(K::KINDS).enumerate() {
            if value.kind() != *expected {
                return Err(KeyMapError::PartialKeyMismatch {
                    index,
                    expected: *expected,
                    actual: value.kind(),
                });
            }
        }

        let mut out = String::new();
        for segment in &self.segments[..self.body_len] {
            match (segment, segment.slot()) {
                (Segment::Literal(text), _) => out.push_str(text),
                (_, Some((index, format))) if index < values.len() => {
                    out.push_str(&format.format(&values[index]))
                }
                _ => break,
            }
        }
        Ok(out)
    }

    /// Reconstruct the key an object name was rendered from.
    ///
    /// Returns `None` when the name does not match the template, a captured
    /// member fails to parse, or a member referenced twice captures
    /// different values.
    pub fn parse(&self, name: &str) -> Option<K> {
        let captures = self.pattern.captures(name)?;
        let mut slots = vec![None; K::KINDS.len()];

        let references = self.segments.iter().filter_map(Segment::slot);
        for (group, (index, format)) in references.enumerate() {
            let text = captures.get(group + 1)?.as_str();
            let value = format.parse(K::KINDS[index], text)?;
            match &slots[index] {
                Some(existing) if *existing != value => return None,
                _ => slots[index] = Some(value),
            }
        }

        K::from_values(slots.into_iter().collect::<Option<Vec<_>>>()?)
    }

    /// The template this map was compiled from.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The trimmed suffix appended to rendered names.
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// The compiled segments, suffix literal included.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The anchored pattern used by [`KeyMap::parse`].
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

fn resolve_member<K: StructuredKey>(member: &str) -> KeyResult<usize> {
    let index = if member.bytes().all(|b| b.is_ascii_digit()) {
        member.parse::<usize>().ok()
    } else {
        K::NAMES.iter().position(|name| *name == member)
    };
    index
        .filter(|i| *i < K::KINDS.len())
        .ok_or_else(|| KeyMapError::UnknownMember {
            member: member.to_string(),
        })
}

impl<K> Clone for KeyMap<K> {
    fn clone(&self) -> Self {
        Self {
            template: self.template.clone(),
            suffix: self.suffix.clone(),
            segments: self.segments.clone(),
            body_len: self.body_len,
            pattern: self.pattern.clone(),
            _key: PhantomData,
        }
    }
}

impl<K> fmt::Debug for KeyMap<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMap")
            .field("template", &self.template)
            .field("suffix", &self.suffix)
            .field("pattern", &self.pattern.as_str())
            .finish()
    }
}
