use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("store error: {0}")]
    Store(#[from] stow_store::StoreError),

    #[error("key map error: {0}")]
    KeyMap(#[from] stow_keys::KeyMapError),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("metadata field {key}: {reason}")]
    Metadata { key: String, reason: String },
}

impl SdkError {
    /// Returns `true` if a declared precondition did not hold.
    pub fn is_precondition_failed(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_precondition_failed())
    }

    /// Returns `true` if the store refused a structurally disallowed action.
    pub fn is_action_failed(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_action_failed())
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
