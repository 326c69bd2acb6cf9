//! Error types for MDC Core
//!
//! Every rejection carries enough context (offending name, lineage id,
//! column or join mismatch) for the caller to act on it.

use crate::config::ConfigError;
use crate::state::TransitionError;
use mdc_compat::Violation;
use mdc_lineage::ReconcileError;
use mdc_model::{AccessError, LineageId, NameField, NamingError, StoreError};
use std::collections::BTreeSet;

/// Main catalog error type
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Name violates the character rule
    #[error("invalid {field} '{name}', only letters, numbers and underscore are supported")]
    InvalidName { field: NameField, name: String },

    /// Required name is blank
    #[error("{field} should not be empty")]
    EmptyName { field: NameField },

    /// Save would rename a lineage that has an official copy
    #[error("model lineage {lineage} cannot be renamed from '{from}' to '{to}' while an official copy exists")]
    IllegalRename {
        lineage: LineageId,
        from: String,
        to: String,
    },

    /// Official update would break cubes built on the model
    #[error("update of model '{model}' breaks dependent cubes: {}", describe(.violations))]
    IncompatibleUpdate {
        model: String,
        violations: Vec<Violation>,
    },

    /// Persisted descriptor does not bind to the table catalog
    #[error("model '{model}' is broken: {}", .errors.join("; "))]
    BrokenDescriptor { model: String, errors: Vec<String> },

    /// Model still referenced by cubes
    #[error("model '{model}' is referenced by cubes {dependents:?}")]
    ReferencedModel {
        model: String,
        dependents: BTreeSet<String>,
    },

    /// Access-control collaborator refused or failed
    #[error("authorization failed: {0}")]
    Authorization(#[from] AccessError),

    /// No model under that name
    #[error("model '{0}' not found")]
    ModelNotFound(String),

    /// Name already taken on create
    #[error("model name '{0}' already exists")]
    DuplicateModelName(String),

    /// Descriptor store failure
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Save state machine misuse
    #[error("state error: {0}")]
    State(#[from] TransitionError),
}

fn describe(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Coarse outcome class, for an API layer to map onto status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Malformed or conflicting request
    BadRequest,
    /// Caller lacks permission
    Forbidden,
    /// Target does not exist
    NotFound,
    /// Collaborator or internal failure
    Internal,
}

impl ModelError {
    /// Outcome class of this error
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        match self {
            Self::InvalidName { .. }
            | Self::EmptyName { .. }
            | Self::IllegalRename { .. }
            | Self::IncompatibleUpdate { .. }
            | Self::BrokenDescriptor { .. }
            | Self::ReferencedModel { .. }
            | Self::DuplicateModelName(_) => Outcome::BadRequest,
            Self::Authorization(AccessError::Denied { .. }) => Outcome::Forbidden,
            Self::ModelNotFound(_) => Outcome::NotFound,
            Self::Authorization(AccessError::Backend(_))
            | Self::Store(_)
            | Self::Config(_)
            | Self::State(_) => Outcome::Internal,
        }
    }

    /// Check if the error is raised before any checkpoint is opened
    #[inline]
    #[must_use]
    pub fn is_pre_transaction(&self) -> bool {
        matches!(
            self,
            Self::InvalidName { .. } | Self::EmptyName { .. } | Self::Config(_)
        )
    }
}

impl From<NamingError> for ModelError {
    fn from(err: NamingError) -> Self {
        match err {
            NamingError::Empty { field } => Self::EmptyName { field },
            NamingError::Invalid { field, name } => Self::InvalidName { field, name },
        }
    }
}

impl From<ReconcileError> for ModelError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::IllegalRename { lineage, from, to } => {
                Self::IllegalRename { lineage, from, to }
            }
            ReconcileError::Referenced { model, dependents } => {
                Self::ReferencedModel { model, dependents }
            }
            ReconcileError::Store(e) => Self::Store(e),
            ReconcileError::Access(e) => Self::Authorization(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdc_model::Permission;

    #[test]
    fn naming_errors_map_to_bad_request() {
        let err = ModelError::from(NamingError::Invalid {
            field: NameField::Model,
            name: "a-b".to_string(),
        });
        assert!(matches!(err, ModelError::InvalidName { .. }));
        assert_eq!(err.outcome(), Outcome::BadRequest);
        assert!(err.is_pre_transaction());
    }

    #[test]
    fn denial_maps_to_forbidden() {
        let err = ModelError::from(AccessError::Denied {
            principal: "bob".to_string(),
            model: "sales".to_string(),
            required: vec![Permission::Management],
        });
        assert_eq!(err.outcome(), Outcome::Forbidden);
        assert!(!err.is_pre_transaction());
    }

    #[test]
    fn reconcile_errors_keep_context() {
        let lineage = LineageId::new();
        let err = ModelError::from(ReconcileError::IllegalRename {
            lineage,
            from: "sales".to_string(),
            to: "sales_v2".to_string(),
        });

        let message = err.to_string();
        assert!(message.contains(&lineage.to_string()));
        assert!(message.contains("sales_v2"));
    }

    #[test]
    fn incompatible_update_lists_violations() {
        let err = ModelError::IncompatibleUpdate {
            model: "sales".to_string(),
            violations: vec![Violation::RootChanged {
                original: "DB.ORDERS".to_string(),
                candidate: "DB.ORDERS_V2".to_string(),
            }],
        };
        assert!(err.to_string().contains("root fact table changed"));
    }

    #[test]
    fn not_found_outcome() {
        assert_eq!(
            ModelError::ModelNotFound("x".to_string()).outcome(),
            Outcome::NotFound
        );
    }
}
