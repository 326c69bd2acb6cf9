//! MDC Store
//!
//! In-memory implementations of the catalog's collaborators, used by the
//! test suite and by embedders that do not need durable storage.
//!
//! - [`MemoryDescriptorStore`]: descriptor records with checkpoint/rollback
//! - [`MemoryTableCatalog`]: physical tables for descriptor resolution
//! - [`MemoryCubeRegistry`]: cubes built on models
//! - [`MemoryAccessControl`]: per-model and per-project grants
//! - [`DerivedCache`]: moka-backed derived-result cache

#![warn(missing_docs)]

pub mod acl;
pub mod cache;
pub mod catalog;
pub mod cubes;
pub mod descriptor;

// Re-exports
pub use acl::MemoryAccessControl;
pub use cache::{CacheStats, DerivedCache, DerivedKey};
pub use catalog::MemoryTableCatalog;
pub use cubes::MemoryCubeRegistry;
pub use descriptor::{MemoryCheckpoint, MemoryDescriptorStore};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
