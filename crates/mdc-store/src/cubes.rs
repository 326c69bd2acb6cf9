//! In-memory cube registry

use async_trait::async_trait;
use dashmap::DashMap;
use mdc_model::{ColumnUsage, DependentArtifact, DependentArtifacts, StoreError};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Registered cubes, keyed by cube name
#[derive(Debug, Clone, Default)]
pub struct MemoryCubeRegistry {
    cubes: Arc<DashMap<String, DependentArtifact>>,
}

impl MemoryCubeRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a cube
    pub fn register(&self, cube: DependentArtifact) {
        tracing::debug!(cube = %cube.name, model = %cube.model_name, "registered cube");
        self.cubes.insert(cube.name.clone(), cube);
    }

    /// Remove a cube; returns it if present
    pub fn remove(&self, name: &str) -> Option<DependentArtifact> {
        self.cubes.remove(name).map(|(_, cube)| cube)
    }

    /// Cubes referencing a model
    #[must_use]
    pub fn cubes_of(&self, model_name: &str) -> Vec<DependentArtifact> {
        let mut cubes: Vec<_> = self
            .cubes
            .iter()
            .filter(|entry| entry.model_name == model_name)
            .map(|entry| entry.value().clone())
            .collect();
        cubes.sort_by(|a, b| a.name.cmp(&b.name));
        cubes
    }
}

#[async_trait]
impl DependentArtifacts for MemoryCubeRegistry {
    async fn used_columns(&self, model_name: &str) -> Result<ColumnUsage, StoreError> {
        Ok(ColumnUsage::aggregate(&self.cubes_of(model_name)))
    }

    async fn list_dependents(&self, model_name: &str) -> Result<BTreeSet<String>, StoreError> {
        Ok(self
            .cubes_of(model_name)
            .into_iter()
            .map(|cube| cube.name)
            .collect())
    }
}
