//! Error types for key map compilation and prefix rendering.

use thiserror::Error;

use crate::member::MemberKind;

/// Errors raised by the key codec.
///
/// Every variant except [`KeyMapError::PartialKeyMismatch`] is reported by
/// [`KeyMap::compile`](crate::KeyMap::compile); rendering and parsing a
/// complete key never fail.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyMapError {
    /// The template is not a supported shape.
    #[error("unsupported key template shape in {template:?}: {reason}")]
    Shape { template: String, reason: String },

    /// A format specifier the member kind cannot honour.
    #[error("format specifier {spec:?} is not supported for {kind} members")]
    UnsupportedFormat { kind: MemberKind, spec: String },

    /// A member reference that the key type does not declare.
    #[error("key type has no member {member:?}")]
    UnknownMember { member: String },

    /// The template does not reference every member of the key.
    #[error("template references {referenced} of {expected} key members")]
    ArityMismatch { expected: usize, referenced: usize },

    /// A partial key value whose kind differs from the declared member.
    #[error("partial key member {index} is {actual}, expected {expected}")]
    PartialKeyMismatch {
        index: usize,
        expected: MemberKind,
        actual: MemberKind,
    },

    /// The generated matching pattern failed to compile.
    #[error("invalid matching pattern: {0}")]
    Pattern(String),
}

/// Convenience alias for key codec operations.
pub type KeyResult<T> = std::result::Result<T, KeyMapError>;
