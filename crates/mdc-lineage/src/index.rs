//! Lineage index
//!
//! Provides [`LineageIndex`], mapping a lineage id to the names of every
//! record carrying it, so reconciliation does not scan the whole store.

use mdc_model::{LineageId, ModelDescriptor};
use std::collections::{BTreeMap, BTreeSet};

/// Index of record names by lineage id
///
/// Owned by the store state and guarded by its lock; cloning produces an
/// independent copy, which is how store checkpoints snapshot it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineageIndex {
    by_lineage: BTreeMap<LineageId, BTreeSet<String>>,
}

impl LineageIndex {
    /// Create empty index
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build index from a descriptor listing
    ///
    /// Descriptors without a lineage id are skipped.
    pub fn from_descriptors<'a>(descriptors: impl IntoIterator<Item = &'a ModelDescriptor>) -> Self {
        let mut index = Self::new();
        for desc in descriptors {
            if let Some(lineage) = desc.lineage_id {
                index.insert(lineage, &desc.name);
            }
        }
        index
    }

    /// Record that `name` carries `lineage`
    ///
    /// Returns `false` if the pair was already present.
    pub fn insert(&mut self, lineage: LineageId, name: &str) -> bool {
        self.by_lineage
            .entry(lineage)
            .or_default()
            .insert(name.to_string())
    }

    /// Forget `name` under `lineage`
    ///
    /// Returns `true` if the pair was present. Empty lineages are dropped.
    pub fn remove(&mut self, lineage: &LineageId, name: &str) -> bool {
        let Some(names) = self.by_lineage.get_mut(lineage) else {
            return false;
        };
        let removed = names.remove(name);
        if names.is_empty() {
            self.by_lineage.remove(lineage);
        }
        removed
    }

    /// Names carrying a lineage id, sorted
    #[must_use]
    pub fn names(&self, lineage: &LineageId) -> Vec<String> {
        self.by_lineage
            .get(lineage)
            .map(|names| names.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Check if any record carries the lineage id
    #[inline]
    #[must_use]
    pub fn contains(&self, lineage: &LineageId) -> bool {
        self.by_lineage.contains_key(lineage)
    }

    /// Number of distinct lineages
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_lineage.len()
    }

    /// Check if index is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_lineage.is_empty()
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        self.by_lineage.clear();
    }
}
