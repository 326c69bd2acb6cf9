//! Identity and naming rules
//!
//! Pure checks applied to descriptor names before any store interaction,
//! and the one-way derivation of draft names.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Suffix appended to a base name to form its draft name
pub const DRAFT_SUFFIX: &str = "_draft";

/// Which user-supplied field a naming check applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NameField {
    /// Model descriptor name
    Model,
    /// Owning project name
    Project,
    /// Target name of a clone
    TargetName,
}

impl Display for NameField {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Model => "model name",
            Self::Project => "project name",
            Self::TargetName => "new model name",
        };
        f.write_str(label)
    }
}

/// Naming rule violations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NamingError {
    /// Blank where a value is required
    #[error("{field} should not be empty")]
    Empty { field: NameField },

    /// Characters outside `[A-Za-z0-9_]`
    #[error("invalid {field} '{name}', only letters, numbers and underscore are supported")]
    Invalid { field: NameField, name: String },
}

/// Check a name against the allowed character set
///
/// Valid iff non-empty and every character is an ASCII letter, digit or `_`.
#[inline]
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Require a value to be non-blank
///
/// # Errors
/// Returns [`NamingError::Empty`] when `value` is empty or whitespace only.
pub fn require_non_empty(field: NameField, value: &str) -> Result<(), NamingError> {
    if value.trim().is_empty() {
        return Err(NamingError::Empty { field });
    }
    Ok(())
}

/// Validate a model or target name
///
/// # Errors
/// - [`NamingError::Empty`] if the name is blank
/// - [`NamingError::Invalid`] if it contains a disallowed character
pub fn validate_name(field: NameField, name: &str) -> Result<(), NamingError> {
    require_non_empty(field, name)?;
    if !is_valid_name(name) {
        return Err(NamingError::Invalid {
            field,
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Derive the draft name for a base name
#[inline]
#[must_use]
pub fn draft_name(base: &str) -> String {
    format!("{base}{DRAFT_SUFFIX}")
}
