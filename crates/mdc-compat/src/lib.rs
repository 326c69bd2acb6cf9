//! MDC Compat
//!
//! Structural compatibility between an official model and its update.
//!
//! An update is compatible when every column used by a cube keeps its role,
//! the root fact table is unchanged and the stored join graph is contained
//! in the new one.
//!
//! # Example
//!
//! ```rust
//! use mdc_compat::CompatibilityValidator;
//! use mdc_model::{ColumnUsage, DimensionGroup, ModelDescriptor};
//!
//! let stored = ModelDescriptor::new("sales", "db.orders")
//!     .with_dimension(DimensionGroup::new("orders", &["region"]));
//! let update = stored.clone().with_dimension(DimensionGroup::new("orders", &["channel"]));
//!
//! let report = CompatibilityValidator::new().check(&update, &stored, &ColumnUsage::default());
//! assert!(report.is_compatible());
//! ```

#![warn(missing_docs)]

pub mod report;
pub mod validator;

// Re-exports
pub use report::{CompatibilityReport, Violation};
pub use validator::{CompatibilityCheck, CompatibilityValidator};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use mdc_model::{ColumnRef, ColumnUsage, DependentArtifact, DimensionGroup, ModelDescriptor};
    use proptest::prelude::*;

    fn model(columns: &[String]) -> ModelDescriptor {
        let cols: Vec<&str> = columns.iter().map(String::as_str).collect();
        ModelDescriptor::new("sales", "db.orders").with_dimension(DimensionGroup::new("orders", &cols))
    }

    proptest! {
        #[test]
        fn superset_of_used_dimensions_is_compatible(
            used in proptest::collection::btree_set("[a-f]", 0..4),
            extra in proptest::collection::btree_set("[g-k]", 0..3),
        ) {
            let used: Vec<String> = used.into_iter().collect();
            let mut kept = used.clone();
            kept.extend(extra);

            let cube = used.iter().fold(DependentArtifact::new("c", "sales"), |cube, c| {
                cube.with_dimension(ColumnRef::new("orders", c))
            });
            let usage = ColumnUsage::aggregate([&cube]);

            let report = CompatibilityValidator::new().check(&model(&kept), &model(&used), &usage);
            prop_assert!(report.is_compatible());
        }

        #[test]
        fn dropping_any_used_dimension_is_incompatible(
            used in proptest::collection::btree_set("[a-f]", 1..5),
            drop_at in any::<prop::sample::Index>(),
        ) {
            let used: Vec<String> = used.into_iter().collect();
            let dropped = drop_at.index(used.len());
            let kept: Vec<String> = used
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != dropped)
                .map(|(_, c)| c.clone())
                .collect();

            let cube = used.iter().fold(DependentArtifact::new("c", "sales"), |cube, c| {
                cube.with_dimension(ColumnRef::new("orders", c))
            });
            let usage = ColumnUsage::aggregate([&cube]);

            let report = CompatibilityValidator::new().check(&model(&kept), &model(&used), &usage);
            prop_assert!(!report.is_compatible());
        }
    }
}
