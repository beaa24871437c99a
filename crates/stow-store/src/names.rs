//! Container name validation.
//!
//! Valid container names:
//! - Are 3 to 63 characters long
//! - Contain only lowercase ASCII letters, digits and `-`
//! - Start and end with a letter or digit
//! - Do not contain consecutive hyphens (`--`)

use crate::error::{StoreError, StoreResult};

const MIN_LEN: usize = 3;
const MAX_LEN: usize = 63;

/// Validate a container name, returning `Ok(())` if valid.
///
/// # Examples
///
/// ```
/// use stow_store::names::validate_container_name;
///
/// assert!(validate_container_name("orders").is_ok());
/// assert!(validate_container_name("tenant-42-archive").is_ok());
/// assert!(validate_container_name("Orders").is_err());
/// assert!(validate_container_name("a").is_err());
/// ```
pub fn validate_container_name(name: &str) -> StoreResult<()> {
    let invalid = |reason: String| StoreError::InvalidContainerName {
        name: name.to_string(),
        reason,
    };

    if !(MIN_LEN..=MAX_LEN).contains(&name.len()) {
        return Err(invalid(format!(
            "must be {MIN_LEN} to {MAX_LEN} characters long, got {}",
            name.len()
        )));
    }

    if let Some(ch) = name
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
    {
        return Err(invalid(format!("contains forbidden character: {ch:?}")));
    }

    if name.starts_with('-') || name.ends_with('-') {
        return Err(invalid("must start and end with a letter or digit".into()));
    }

    if name.contains("--") {
        return Err(invalid("must not contain consecutive hyphens '--'".into()));
    }

    Ok(())
}
