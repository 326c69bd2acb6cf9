//! In-memory access control
//!
//! Grants are kept per model name and per project. A higher permission
//! implies the lower ones (`Administration` ⊇ `Management` ⊇ `Operation` ⊇
//! `Read`). Admin principals pass every check.

use async_trait::async_trait;
use dashmap::DashMap;
use mdc_model::{AccessControl, AccessError, ModelDescriptor, Permission, Principal};
use std::collections::BTreeMap;
use std::sync::Arc;

type Grants = BTreeMap<String, Permission>;

/// Access-control entries held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryAccessControl {
    models: Arc<DashMap<String, Grants>>,
    projects: Arc<DashMap<String, Grants>>,
}

impl MemoryAccessControl {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant a permission on a project; inherited by models created in it
    pub fn grant_project(&self, project: &str, user: &str, permission: Permission) {
        self.projects
            .entry(project.to_string())
            .or_default()
            .insert(user.to_string(), permission);
    }

    /// Grant a permission on a model directly
    pub fn grant(&self, model: &str, user: &str, permission: Permission) {
        self.models
            .entry(model.to_string())
            .or_default()
            .insert(user.to_string(), permission);
    }

    /// Entries of a model, by user
    #[must_use]
    pub fn entries(&self, model: &str) -> Grants {
        self.models
            .get(model)
            .map(|grants| grants.clone())
            .unwrap_or_default()
    }

    /// Check if a model has any entry
    #[must_use]
    pub fn has_entries(&self, model: &str) -> bool {
        self.models.get(model).is_some_and(|grants| !grants.is_empty())
    }

    fn permission_of(&self, model: &str, user: &str) -> Option<Permission> {
        self.models.get(model).and_then(|grants| grants.get(user).copied())
    }
}

#[async_trait]
impl AccessControl for MemoryAccessControl {
    async fn init_acl(
        &self,
        model: &ModelDescriptor,
        owner: &Principal,
        permission: Permission,
    ) -> Result<(), AccessError> {
        self.grant(&model.name, &owner.name, permission);
        tracing::debug!(model = %model.name, owner = %owner.name, %permission, "initialized acl");
        Ok(())
    }

    async fn inherit_acl(&self, model: &ModelDescriptor, project: &str) -> Result<(), AccessError> {
        let Some(project_grants) = self.projects.get(project).map(|g| g.clone()) else {
            return Ok(());
        };

        let mut grants = self.models.entry(model.name.clone()).or_default();
        for (user, permission) in project_grants {
            grants
                .entry(user)
                .and_modify(|current| *current = (*current).max(permission))
                .or_insert(permission);
        }
        tracing::debug!(model = %model.name, project, "inherited project acl");
        Ok(())
    }

    async fn clean_acl(&self, model: &ModelDescriptor) -> Result<(), AccessError> {
        self.models.remove(&model.name);
        tracing::debug!(model = %model.name, "cleaned acl");
        Ok(())
    }

    async fn authorize(
        &self,
        model: &ModelDescriptor,
        principal: &Principal,
        accepted: &[Permission],
    ) -> Result<(), AccessError> {
        if principal.admin {
            return Ok(());
        }

        let granted = self.permission_of(&model.name, &principal.name);
        let allowed = granted.is_some_and(|g| accepted.iter().any(|required| g >= *required));
        if allowed {
            Ok(())
        } else {
            tracing::warn!(model = %model.name, principal = %principal.name, "access denied");
            Err(AccessError::Denied {
                principal: principal.name.clone(),
                model: model.name.clone(),
                required: accepted.to_vec(),
            })
        }
    }
}
