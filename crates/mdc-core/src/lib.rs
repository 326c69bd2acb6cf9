//! MDC Core - Model descriptor lifecycle
//!
//! The service that:
//! - Reconciles saves against the lineage's official and draft copies
//! - Rejects official updates that would break cubes built on the model
//! - Runs each save or drop in one store checkpoint, rolling back and
//!   invalidating derived caches on failure
//! - Drops, clones and lists models
//!
//! # Example
//!
//! ```rust
//! use mdc_core::{CatalogConfig, Collaborators, ModelService, SaveRequest};
//! use mdc_model::{ColumnRef, DimensionGroup, ModelDescriptor, Principal};
//! use mdc_store::{
//!     DerivedCache, MemoryAccessControl, MemoryCubeRegistry, MemoryDescriptorStore,
//!     MemoryTableCatalog,
//! };
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = MemoryTableCatalog::new().with_table("db.orders", &["region", "amount"]);
//! let service = ModelService::new(
//!     CatalogConfig::new(),
//!     Collaborators {
//!         store: Arc::new(MemoryDescriptorStore::new()),
//!         resolver: Arc::new(catalog),
//!         dependents: Arc::new(MemoryCubeRegistry::new()),
//!         caches: Arc::new(DerivedCache::default()),
//!         acl: Arc::new(MemoryAccessControl::new()),
//!     },
//! )?;
//!
//! let model = ModelDescriptor::new("sales", "db.orders")
//!     .with_dimension(DimensionGroup::new("orders", &["region"]))
//!     .with_measure(ColumnRef::new("orders", "amount"));
//! let saved = service
//!     .save_model(SaveRequest::new(model), &Principal::user("alice"))
//!     .await?;
//!
//! assert!(saved.created);
//! assert_eq!(saved.descriptor.owner.as_deref(), Some("alice"));
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod config;
pub mod error;
pub mod service;
pub mod state;
pub mod telemetry;
pub mod types;

// Re-exports for convenience
pub use config::{CacheConfig, CatalogConfig, ConfigError, LoggingConfig};
pub use error::{ModelError, Outcome};
pub use service::{Collaborators, ModelService};
pub use state::{allowed_transitions, validate_transition, SaveState, SaveTrace, TransitionError};
pub use telemetry::init_tracing;
pub use types::{ModelQuery, Page, SaveOutcome, SaveRequest};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with MDC Core
    pub use crate::{
        CatalogConfig, Collaborators, ModelError, ModelQuery, ModelService, Page, SaveOutcome,
        SaveRequest,
    };
    pub use mdc_model::{ModelDescriptor, Principal};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
