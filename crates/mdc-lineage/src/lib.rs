//! MDC Lineage
//!
//! Lineage tracking for model descriptors.
//!
//! # Overview
//!
//! - **LineageIndex**: lineage id → record names, kept beside the store
//! - **LineageReconciler**: decides which copies of a lineage survive a save
//!
//! # Example
//!
//! ```rust
//! use mdc_lineage::LineageReconciler;
//! use mdc_model::{LineageId, ModelDescriptor, ModelStatus};
//!
//! let lineage = LineageId::new();
//! let official = ModelDescriptor::new("sales", "db.orders").with_lineage(lineage);
//!
//! let plan = LineageReconciler::new()
//!     .plan(Some(lineage), "sales", ModelStatus::Official, &[official])
//!     .unwrap();
//! assert!(!plan.is_new());
//! ```

#![allow(missing_docs)]

pub mod index;
pub mod reconcile;

// Re-exports
pub use index::LineageIndex;
pub use reconcile::{LineageReconciler, ReconcileError, ReconcilePlan};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
