//! MDC Model
//!
//! Data model of the model descriptor catalog.
//!
//! # Core Concepts
//!
//! - [`ModelDescriptor`]: Versioned description of joins, dimensions and measures
//! - [`LineageId`]: Stable identity shared by the draft and official copies
//! - [`ColumnRef`]: `TABLE.COLUMN` reference through a table alias
//! - [`JoinTree`]: Resolved join graph with structural matching
//! - [`DependentArtifact`]: Read-only cube view and its [`ColumnUsage`]
//! - [`ports`]: Collaborator traits the catalog core drives
//!
//! # Example
//!
//! ```rust
//! use mdc_model::{ColumnRef, DimensionGroup, ModelDescriptor};
//!
//! let model = ModelDescriptor::new("sales", "db.orders")
//!     .with_dimension(DimensionGroup::new("orders", &["region"]))
//!     .with_measure(ColumnRef::new("orders", "amount"));
//!
//! assert_eq!(model.all_columns().len(), 2);
//! assert_eq!(model.join_tree().len(), 1);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod column;
mod cube;
mod descriptor;
mod join;
pub mod naming;
pub mod ports;

// Re-exports
pub use column::{ColumnRef, ColumnRefError};
pub use cube::{ColumnUsage, DependentArtifact};
pub use descriptor::{DimensionGroup, LineageId, ModelDescriptor, ModelStatus};
pub use join::{default_alias, JoinDesc, JoinTree, JoinType, LookupDesc};
pub use naming::{NameField, NamingError};
pub use ports::{
    AccessControl, AccessError, CacheInvalidator, CatalogResolver, Checkpoint,
    DependentArtifacts, DescriptorStore, Permission, Principal, Resolution, StoreError,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn descriptor_and_usage_integration() {
        let model = ModelDescriptor::new("sales", "db.orders")
            .with_lookup(LookupDesc::new(
                "db.customer",
                JoinDesc::inner(
                    ColumnRef::new("orders", "customer_id"),
                    ColumnRef::new("customer", "id"),
                ),
            ))
            .with_dimension(DimensionGroup::new("customer", &["segment"]));

        let cube = DependentArtifact::new("sales_cube", &model.name)
            .with_dimension(ColumnRef::new("customer", "segment"));
        let usage = ColumnUsage::aggregate([&cube]);

        for col in usage.dimension_columns() {
            assert!(model.dimension_columns().contains(col));
        }
    }

    #[test]
    fn draft_naming_integration() {
        let mut model = ModelDescriptor::new("sales", "db.orders");
        model.retarget(true);
        assert!(naming::is_valid_name(&model.name));
        assert!(model.name.ends_with(naming::DRAFT_SUFFIX));
    }
}
