//! In-memory descriptor store
//!
//! Records are keyed by name, with a [`LineageIndex`] kept beside them.
//! Every create and update stamps a fresh logical version. Checkpoints
//! snapshot the whole state; rollback restores the snapshot.

use async_trait::async_trait;
use mdc_lineage::LineageIndex;
use mdc_model::{Checkpoint, DescriptorStore, LineageId, ModelDescriptor, StoreError};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
struct StoreState {
    records: BTreeMap<String, ModelDescriptor>,
    lineages: LineageIndex,
    clock: u64,
}

impl StoreState {
    fn next_stamp(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}

#[derive(Debug, Default)]
struct StoreInner {
    state: RwLock<StoreState>,
    checkpoint_open: AtomicBool,
}

/// Descriptor store held in memory
///
/// Cheap to clone; clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct MemoryDescriptorStore {
    inner: Arc<StoreInner>,
}

impl MemoryDescriptorStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.state.read().records.len()
    }

    /// Check if store holds no records
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.state.read().records.is_empty()
    }

    /// Check if a checkpoint is currently open
    #[must_use]
    pub fn has_open_checkpoint(&self) -> bool {
        self.inner.checkpoint_open.load(Ordering::Acquire)
    }

    /// Names of every record, sorted
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.inner.state.read().records.keys().cloned().collect()
    }
}

#[async_trait]
impl DescriptorStore for MemoryDescriptorStore {
    async fn list_descriptors(&self) -> Result<Vec<ModelDescriptor>, StoreError> {
        Ok(self.inner.state.read().records.values().cloned().collect())
    }

    async fn list_by_lineage(&self, lineage: &LineageId) -> Result<Vec<ModelDescriptor>, StoreError> {
        let state = self.inner.state.read();
        Ok(state
            .lineages
            .names(lineage)
            .iter()
            .filter_map(|name| state.records.get(name).cloned())
            .collect())
    }

    async fn get(&self, name: &str) -> Result<Option<ModelDescriptor>, StoreError> {
        Ok(self.inner.state.read().records.get(name).cloned())
    }

    async fn create(&self, mut descriptor: ModelDescriptor) -> Result<ModelDescriptor, StoreError> {
        let mut state = self.inner.state.write();
        if state.records.contains_key(&descriptor.name) {
            return Err(StoreError::Duplicate(descriptor.name));
        }

        descriptor.last_modified = state.next_stamp();
        if let Some(lineage) = descriptor.lineage_id {
            state.lineages.insert(lineage, &descriptor.name);
        }
        state
            .records
            .insert(descriptor.name.clone(), descriptor.clone());

        tracing::debug!(model = %descriptor.name, stamp = descriptor.last_modified, "created record");
        Ok(descriptor)
    }

    async fn update(&self, mut descriptor: ModelDescriptor) -> Result<ModelDescriptor, StoreError> {
        let mut state = self.inner.state.write();
        let previous_lineage = match state.records.get(&descriptor.name) {
            Some(existing) => existing.lineage_id,
            None => return Err(StoreError::NotFound(descriptor.name)),
        };

        descriptor.last_modified = state.next_stamp();
        if previous_lineage != descriptor.lineage_id {
            if let Some(old) = previous_lineage {
                state.lineages.remove(&old, &descriptor.name);
            }
            if let Some(new) = descriptor.lineage_id {
                state.lineages.insert(new, &descriptor.name);
            }
        }
        state
            .records
            .insert(descriptor.name.clone(), descriptor.clone());

        tracing::debug!(model = %descriptor.name, stamp = descriptor.last_modified, "updated record");
        Ok(descriptor)
    }

    async fn delete(&self, name: &str) -> Result<(), StoreError> {
        let mut state = self.inner.state.write();
        let removed = state
            .records
            .remove(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        if let Some(lineage) = removed.lineage_id {
            state.lineages.remove(&lineage, name);
        }

        tracing::debug!(model = name, "deleted record");
        Ok(())
    }

    async fn checkpoint(&self) -> Result<Box<dyn Checkpoint>, StoreError> {
        if self
            .inner
            .checkpoint_open
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(StoreError::CheckpointActive);
        }

        let snapshot = self.inner.state.read().clone();
        Ok(Box::new(MemoryCheckpoint {
            store: Arc::clone(&self.inner),
            snapshot: Some(snapshot),
        }))
    }
}

/// Checkpoint over a [`MemoryDescriptorStore`]
///
/// Dropping it without calling `close` or `rollback` keeps the writes,
/// same as `close`.
#[derive(Debug)]
pub struct MemoryCheckpoint {
    store: Arc<StoreInner>,
    snapshot: Option<StoreState>,
}

impl MemoryCheckpoint {
    fn finish(&mut self) -> Option<StoreState> {
        let snapshot = self.snapshot.take();
        self.store.checkpoint_open.store(false, Ordering::Release);
        snapshot
    }
}

#[async_trait]
impl Checkpoint for MemoryCheckpoint {
    async fn rollback(mut self: Box<Self>) -> Result<(), StoreError> {
        let snapshot = self
            .finish()
            .ok_or_else(|| StoreError::Backend("checkpoint already finished".to_string()))?;
        let mut state = self.store.state.write();
        // Stamps stay monotonic across rollbacks.
        let clock = state.clock;
        *state = snapshot;
        state.clock = clock;

        tracing::debug!(records = state.records.len(), "checkpoint rolled back");
        Ok(())
    }

    async fn close(mut self: Box<Self>) -> Result<(), StoreError> {
        self.finish();
        tracing::debug!("checkpoint closed");
        Ok(())
    }
}

impl Drop for MemoryCheckpoint {
    fn drop(&mut self) {
        if self.snapshot.is_some() {
            self.finish();
        }
    }
}
