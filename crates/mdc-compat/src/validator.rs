//! Structural compatibility validator
//!
//! Cubes are pre-built against specific columns and join paths of an
//! official model. An official update must keep every column they use in
//! the role they use it in, keep the root fact table, and keep every join
//! of the stored graph unchanged. New columns and joins may be added.

use crate::report::{CompatibilityReport, Violation};
use mdc_model::{
    CatalogResolver, ColumnUsage, DependentArtifacts, ModelDescriptor, Resolution, StoreError,
};

/// Result of [`CompatibilityValidator::validate`]
#[derive(Debug, Clone)]
pub struct CompatibilityCheck {
    /// Verdict on the resolved candidate
    pub report: CompatibilityReport,

    /// Candidate after re-binding against the table catalog
    pub resolution: Resolution,
}

/// Superset check of a candidate against the stored official descriptor
#[derive(Debug, Clone, Copy, Default)]
pub struct CompatibilityValidator;

impl CompatibilityValidator {
    /// Create new validator
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Check a candidate against the original and the cubes' column usage
    ///
    /// Every rule is evaluated so the report names all offending columns
    /// and joins, not just the first.
    #[must_use]
    pub fn check(
        &self,
        candidate: &ModelDescriptor,
        original: &ModelDescriptor,
        usage: &ColumnUsage,
    ) -> CompatibilityReport {
        let mut report = CompatibilityReport::new(&candidate.name);

        let dimension_cols = candidate.dimension_columns();
        let all_cols = candidate.all_columns();

        for (column, cubes) in &usage.dimension {
            if !dimension_cols.contains(column) {
                report.push(Violation::DimensionRemoved {
                    column: column.clone(),
                    cubes: cubes.clone(),
                });
            }
        }

        for (column, cubes) in &usage.other {
            if !all_cols.contains(column) {
                report.push(Violation::ColumnRemoved {
                    column: column.clone(),
                    cubes: cubes.clone(),
                });
            }
        }

        if !candidate
            .root_fact_table()
            .eq_ignore_ascii_case(original.root_fact_table())
        {
            report.push(Violation::RootChanged {
                original: original.root_fact_table().to_string(),
                candidate: candidate.root_fact_table().to_string(),
            });
        }

        let expected = original.join_table_count() + 1;
        let matched = candidate.join_tree().match_count(&original.join_tree());
        if matched != expected {
            report.push(Violation::JoinsNotPreserved { expected, matched });
        }

        if report.is_compatible() {
            tracing::debug!(model = %candidate.name, "update is compatible");
        } else {
            tracing::warn!(
                model = %candidate.name,
                violations = report.violations.len(),
                "update breaks dependent cubes"
            );
        }
        report
    }

    /// Re-resolve the candidate, read cube usage, then [`check`](Self::check)
    ///
    /// Binding errors do not fail the check; they are returned in the
    /// resolution for the caller to act on after persisting.
    ///
    /// # Errors
    /// Propagates collaborator failures.
    pub async fn validate(
        &self,
        candidate: ModelDescriptor,
        original: &ModelDescriptor,
        resolver: &dyn CatalogResolver,
        dependents: &dyn DependentArtifacts,
    ) -> Result<CompatibilityCheck, StoreError> {
        let resolution = resolver.resolve(candidate).await?;
        let usage = dependents.used_columns(&original.name).await?;
        let report = self.check(&resolution.descriptor, original, &usage);
        Ok(CompatibilityCheck { report, resolution })
    }
}
