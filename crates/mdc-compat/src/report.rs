//! Compatibility report and violation kinds

use mdc_model::ColumnRef;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

/// One reason an update would break already-built cubes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// A column used as a dimension is no longer a dimension
    DimensionRemoved {
        /// Offending column
        column: ColumnRef,
        /// Cubes relying on it
        cubes: BTreeSet<String>,
    },

    /// A column used as a filter or measure input is gone entirely
    ColumnRemoved {
        /// Offending column
        column: ColumnRef,
        /// Cubes relying on it
        cubes: BTreeSet<String>,
    },

    /// The root fact table changed
    RootChanged {
        /// Root of the stored descriptor
        original: String,
        /// Root of the candidate
        candidate: String,
    },

    /// Part of the original join graph is missing or altered
    JoinsNotPreserved {
        /// Nodes the original graph has, root included
        expected: usize,
        /// Nodes of the candidate matching the original graph
        matched: usize,
    },
}

impl Display for Violation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::DimensionRemoved { column, cubes } => {
                write!(f, "dimension column {column} is used by {cubes:?}")
            }
            Self::ColumnRemoved { column, cubes } => {
                write!(f, "column {column} is used by {cubes:?}")
            }
            Self::RootChanged {
                original,
                candidate,
            } => write!(f, "root fact table changed from {original} to {candidate}"),
            Self::JoinsNotPreserved { expected, matched } => write!(
                f,
                "join graph not preserved: {matched} of {expected} nodes match"
            ),
        }
    }
}

/// Outcome of a compatibility check
///
/// Compatible iff there are no violations; there is no partial success.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompatibilityReport {
    /// Name of the checked model
    pub model: String,

    /// Everything that breaks compatibility
    pub violations: Vec<Violation>,
}

impl CompatibilityReport {
    /// Create empty report for a model
    #[inline]
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            violations: Vec::new(),
        }
    }

    /// Record a violation
    #[inline]
    pub fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Check if the update is safe
    #[inline]
    #[must_use]
    pub fn is_compatible(&self) -> bool {
        self.violations.is_empty()
    }

    /// Human-readable violation lines
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(ToString::to_string).collect()
    }
}

impl Display for CompatibilityReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_compatible() {
            return write!(f, "model '{}' is compatible", self.model);
        }
        write!(f, "model '{}' is incompatible: {}", self.model, self.messages().join("; "))
    }
}
