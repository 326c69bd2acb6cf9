//! Collaborator ports
//!
//! The catalog core drives external systems only through these traits:
//! the descriptor store and its checkpoints, the cube inventory, the table
//! catalog, derived-result caches and access control.

use crate::cube::ColumnUsage;
use crate::descriptor::{LineageId, ModelDescriptor};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

/// Errors raised by the descriptor store or other read collaborators
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No record under that name
    #[error("descriptor '{0}' not found")]
    NotFound(String),

    /// A record already holds that name
    #[error("descriptor '{0}' already exists")]
    Duplicate(String),

    /// A checkpoint is already open
    #[error("a checkpoint is already active")]
    CheckpointActive,

    /// Backend failure
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Errors raised by the access-control collaborator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    /// Principal lacks every accepted permission
    #[error("'{principal}' has no {required:?} permission on '{model}'")]
    Denied {
        principal: String,
        model: String,
        required: Vec<Permission>,
    },

    /// Backend failure
    #[error("access control backend error: {0}")]
    Backend(String),
}

/// Permission levels on a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Permission {
    /// Read access
    Read,
    /// Build and refresh dependents
    Operation,
    /// Edit the model
    Management,
    /// Full control
    Administration,
}

impl Permission {
    /// Permissions accepted for editing, dropping or pruning a model
    pub const EDIT: &'static [Permission] = &[Self::Administration, Self::Management];
}

impl Display for Permission {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Read => "READ",
            Self::Operation => "OPERATION",
            Self::Management => "MANAGEMENT",
            Self::Administration => "ADMINISTRATION",
        };
        f.write_str(label)
    }
}

/// Caller identity, passed explicitly into every mutating operation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    /// User name
    pub name: String,

    /// Whether the caller holds the admin role
    #[serde(default)]
    pub admin: bool,
}

impl Principal {
    /// Regular user
    #[must_use]
    pub fn user(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            admin: false,
        }
    }

    /// Admin user
    #[must_use]
    pub fn admin(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            admin: true,
        }
    }
}

/// Result of re-binding a descriptor against the table catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Descriptor after binding
    pub descriptor: ModelDescriptor,

    /// Binding errors; non-empty means the descriptor is broken
    pub errors: Vec<String>,
}

impl Resolution {
    /// Resolution with no errors
    #[must_use]
    pub fn clean(descriptor: ModelDescriptor) -> Self {
        Self {
            descriptor,
            errors: Vec::new(),
        }
    }

    /// Check if binding failed anywhere
    #[inline]
    #[must_use]
    pub fn is_broken(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Transaction handle over the descriptor store
///
/// Owned by exactly one operation; consumed by either `rollback` or `close`.
#[async_trait]
pub trait Checkpoint: Send {
    /// Undo every write made since the checkpoint was opened
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;

    /// Commit durably
    async fn close(self: Box<Self>) -> Result<(), StoreError>;
}

/// Persistent descriptor collection
#[async_trait]
pub trait DescriptorStore: Send + Sync {
    /// Snapshot of every descriptor, ordered by name
    async fn list_descriptors(&self) -> Result<Vec<ModelDescriptor>, StoreError>;

    /// Every descriptor sharing a lineage id
    async fn list_by_lineage(&self, lineage: &LineageId) -> Result<Vec<ModelDescriptor>, StoreError>;

    /// Descriptor by name
    async fn get(&self, name: &str) -> Result<Option<ModelDescriptor>, StoreError>;

    /// Create a record; fails with [`StoreError::Duplicate`] if the name is taken
    async fn create(&self, descriptor: ModelDescriptor) -> Result<ModelDescriptor, StoreError>;

    /// Overwrite the record of the same name in place
    async fn update(&self, descriptor: ModelDescriptor) -> Result<ModelDescriptor, StoreError>;

    /// Remove the record of that name
    async fn delete(&self, name: &str) -> Result<(), StoreError>;

    /// Open a checkpoint
    async fn checkpoint(&self) -> Result<Box<dyn Checkpoint>, StoreError>;
}

/// Read-only inventory of cubes
#[async_trait]
pub trait DependentArtifacts: Send + Sync {
    /// Columns relied upon by every cube of a model
    async fn used_columns(&self, model_name: &str) -> Result<ColumnUsage, StoreError>;

    /// Names of cubes referencing a model
    async fn list_dependents(&self, model_name: &str) -> Result<BTreeSet<String>, StoreError>;
}

/// Table catalog binding pass
#[async_trait]
pub trait CatalogResolver: Send + Sync {
    /// Re-bind column and table references of a descriptor
    async fn resolve(&self, descriptor: ModelDescriptor) -> Result<Resolution, StoreError>;
}

/// Downstream derived-result caches
pub trait CacheInvalidator: Send + Sync {
    /// Drop every derived entry
    fn invalidate_derived_caches(&self);
}

/// Authorization side effects
#[async_trait]
pub trait AccessControl: Send + Sync {
    /// Grant `permission` on a newly created model to its owner
    async fn init_acl(
        &self,
        model: &ModelDescriptor,
        owner: &Principal,
        permission: Permission,
    ) -> Result<(), AccessError>;

    /// Inherit project-level grants
    async fn inherit_acl(&self, model: &ModelDescriptor, project: &str) -> Result<(), AccessError>;

    /// Remove every entry of a model
    async fn clean_acl(&self, model: &ModelDescriptor) -> Result<(), AccessError>;

    /// Require the principal to hold at least one of `accepted`
    async fn authorize(
        &self,
        model: &ModelDescriptor,
        principal: &Principal,
        accepted: &[Permission],
    ) -> Result<(), AccessError>;

    /// Require the principal to own the model or hold an edit permission
    async fn authorize_edit(
        &self,
        model: &ModelDescriptor,
        principal: &Principal,
    ) -> Result<(), AccessError> {
        if model.owner.as_deref() == Some(principal.name.as_str()) {
            return Ok(());
        }
        self.authorize(model, principal, Permission::EDIT).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_display() {
        let err = StoreError::Duplicate("sales".to_string());
        assert_eq!(err.to_string(), "descriptor 'sales' already exists");
    }

    #[test]
    fn access_error_display() {
        let err = AccessError::Denied {
            principal: "ann".to_string(),
            model: "sales".to_string(),
            required: vec![Permission::Administration],
        };
        assert!(err.to_string().contains("'ann'"));
    }

    #[test]
    fn principal_constructors() {
        assert!(!Principal::user("ann").admin);
        assert!(Principal::admin("root").admin);
    }

    #[test]
    fn resolution_broken() {
        let model = ModelDescriptor::new("m", "t");
        assert!(!Resolution::clean(model.clone()).is_broken());

        let broken = Resolution {
            descriptor: model,
            errors: vec!["table T not found".to_string()],
        };
        assert!(broken.is_broken());
    }
}
