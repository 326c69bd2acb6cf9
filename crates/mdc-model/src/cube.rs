//! Dependent artifacts (cubes)
//!
//! Cubes are pre-built against specific columns of a model. The catalog
//! never mutates them; it only aggregates what they rely upon.

use crate::column::ColumnRef;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Read-only view of a cube that references a model by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependentArtifact {
    /// Cube name
    pub name: String,

    /// Name of the referenced model
    pub model_name: String,

    /// Columns used as dimensions, derived ones included
    pub dimension_columns: BTreeSet<ColumnRef>,

    /// Every column the cube touches
    pub all_columns: BTreeSet<ColumnRef>,
}

impl DependentArtifact {
    /// Create cube view with no columns
    #[must_use]
    pub fn new(name: impl Into<String>, model_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model_name: model_name.into(),
            dimension_columns: BTreeSet::new(),
            all_columns: BTreeSet::new(),
        }
    }

    /// With dimension column (also recorded in `all_columns`)
    #[must_use]
    pub fn with_dimension(mut self, column: ColumnRef) -> Self {
        self.all_columns.insert(column.clone());
        self.dimension_columns.insert(column);
        self
    }

    /// With non-dimension column (filter, measure input)
    #[must_use]
    pub fn with_column(mut self, column: ColumnRef) -> Self {
        self.all_columns.insert(column);
        self
    }

    /// Columns used other than as dimensions
    pub fn other_columns(&self) -> impl Iterator<Item = &ColumnRef> + '_ {
        self.all_columns.difference(&self.dimension_columns)
    }
}

/// Columns relied upon by the cubes of one model
///
/// Each column maps to the names of the cubes relying on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnUsage {
    /// Columns used as dimensions
    pub dimension: BTreeMap<ColumnRef, BTreeSet<String>>,

    /// Columns used otherwise
    pub other: BTreeMap<ColumnRef, BTreeSet<String>>,
}

impl ColumnUsage {
    /// Aggregate usage across cubes
    pub fn aggregate<'a>(cubes: impl IntoIterator<Item = &'a DependentArtifact>) -> Self {
        let mut usage = Self::default();
        for cube in cubes {
            for col in &cube.dimension_columns {
                usage
                    .dimension
                    .entry(col.clone())
                    .or_default()
                    .insert(cube.name.clone());
            }
            for col in cube.other_columns() {
                usage
                    .other
                    .entry(col.clone())
                    .or_default()
                    .insert(cube.name.clone());
            }
        }
        usage
    }

    /// Set of columns used as dimensions
    #[must_use]
    pub fn dimension_columns(&self) -> BTreeSet<&ColumnRef> {
        self.dimension.keys().collect()
    }

    /// Set of columns used otherwise
    #[must_use]
    pub fn other_columns(&self) -> BTreeSet<&ColumnRef> {
        self.other.keys().collect()
    }

    /// Check if no cube relies on any column
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dimension.is_empty() && self.other.is_empty()
    }

    /// Merge both maps by column identity (`TABLE.COLUMN` → cube names)
    #[must_use]
    pub fn by_identity(&self) -> BTreeMap<String, BTreeSet<String>> {
        let mut merged: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (col, cubes) in self.dimension.iter().chain(&self.other) {
            merged
                .entry(col.identity())
                .or_default()
                .extend(cubes.iter().cloned());
        }
        merged
    }
}
