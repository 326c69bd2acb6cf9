//! Model service
//!
//! Entry point of the catalog. A save runs, inside one store checkpoint:
//!
//! 1. lineage reconciliation (illegal renames rejected before any write)
//! 2. the create path, or authorization plus the compatibility check
//! 3. stale-copy pruning and persistence
//! 4. re-resolution of the persisted descriptor
//! 5. access-control entries for a newly created official model
//!
//! Any failure after the checkpoint opens rolls it back and invalidates
//! derived caches exactly once before the error reaches the caller.

use crate::config::CatalogConfig;
use crate::error::ModelError;
use crate::state::{SaveState, SaveTrace};
use crate::types::{ModelQuery, Page, SaveOutcome, SaveRequest};
use mdc_compat::CompatibilityValidator;
use mdc_lineage::{LineageReconciler, ReconcilePlan};
use mdc_model::{
    naming, AccessControl, CacheInvalidator, CatalogResolver, Checkpoint, DependentArtifacts,
    DescriptorStore, LineageId, ModelDescriptor, ModelStatus, NameField, Permission, Principal,
    StoreError,
};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

/// External systems the service drives
#[derive(Clone)]
pub struct Collaborators {
    /// Descriptor records and checkpoints
    pub store: Arc<dyn DescriptorStore>,

    /// Table catalog binding
    pub resolver: Arc<dyn CatalogResolver>,

    /// Cube inventory
    pub dependents: Arc<dyn DependentArtifacts>,

    /// Derived-result caches
    pub caches: Arc<dyn CacheInvalidator>,

    /// Access control
    pub acl: Arc<dyn AccessControl>,
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

/// Record written by a save, before commit
struct Persisted {
    descriptor: ModelDescriptor,
    lineage: LineageId,
    created: bool,
    base_version: u64,
}

/// Lifecycle manager of model descriptors
///
/// Mutating operations through one service are serialized; each runs in
/// its own checkpoint.
#[derive(Debug)]
pub struct ModelService {
    config: CatalogConfig,
    deps: Collaborators,
    reconciler: LineageReconciler,
    validator: CompatibilityValidator,
    txn: Mutex<()>,
}

impl ModelService {
    /// Create new service
    ///
    /// # Errors
    /// Returns [`ModelError::Config`] if the configuration is invalid.
    pub fn new(config: CatalogConfig, deps: Collaborators) -> Result<Self, ModelError> {
        config.validate()?;
        Ok(Self {
            config,
            deps,
            reconciler: LineageReconciler::new(),
            validator: CompatibilityValidator::new(),
            txn: Mutex::new(()),
        })
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Save a descriptor as the official or draft copy of its lineage
    ///
    /// # Errors
    /// - `InvalidName` / `EmptyName` before any store interaction
    /// - `IllegalRename`, `IncompatibleUpdate`, `BrokenDescriptor`,
    ///   `ReferencedModel`, `DuplicateModelName`, `Authorization` or `Store`
    ///   after the checkpoint opened, in which case it has been rolled back
    pub async fn save_model(
        &self,
        request: SaveRequest,
        caller: &Principal,
    ) -> Result<SaveOutcome, ModelError> {
        let SaveRequest {
            mut descriptor,
            is_draft,
            project,
        } = request;

        naming::validate_name(NameField::Model, &descriptor.name)?;
        let project = project
            .or_else(|| descriptor.project.clone())
            .unwrap_or_else(|| self.config.default_project.clone());
        naming::require_non_empty(NameField::Project, &project)?;
        descriptor.project = Some(project);
        descriptor.retarget(is_draft);

        let _txn = self.txn.lock().await;
        let checkpoint = self.deps.store.checkpoint().await?;
        let mut trace = SaveTrace::start(&descriptor.name);
        let model = descriptor.name.clone();

        match self.save_in_checkpoint(descriptor, caller, &mut trace).await {
            Ok(persisted) => {
                if let Err(err) = self.commit(checkpoint, &model).await {
                    if persisted.created && persisted.descriptor.status.is_official() {
                        self.discard_acl(&persisted.descriptor).await;
                    }
                    return Err(err);
                }
                trace.advance(SaveState::Committed)?;
                tracing::info!(
                    model = %model,
                    lineage = %persisted.lineage,
                    created = persisted.created,
                    state = %trace.current(),
                    "model saved"
                );
                Ok(SaveOutcome {
                    descriptor: persisted.descriptor,
                    lineage: persisted.lineage,
                    created: persisted.created,
                    base_version: persisted.base_version,
                    trace: trace.into_states(),
                })
            }
            Err(err) => {
                tracing::warn!(model = %model, state = %trace.current(), error = %err, "save failed");
                trace.roll_back();
                self.abort(checkpoint, &model).await;
                tracing::debug!(model = %model, states = ?trace.states(), "save trace");
                Err(err)
            }
        }
    }

    async fn save_in_checkpoint(
        &self,
        mut descriptor: ModelDescriptor,
        caller: &Principal,
        trace: &mut SaveTrace,
    ) -> Result<Persisted, ModelError> {
        let plan = self
            .reconciler
            .reconcile(
                self.deps.store.as_ref(),
                descriptor.lineage_id,
                &descriptor.name,
                descriptor.status,
            )
            .await?;
        descriptor.lineage_id = Some(plan.lineage);
        descriptor.last_modified = plan.last_modified;

        let written = match &plan.predecessor {
            None => {
                trace.advance(SaveState::Creating)?;
                self.create_descriptor(descriptor, &plan, caller).await?
            }
            Some(predecessor) => {
                trace.advance(SaveState::Validating)?;
                self.update_descriptor(descriptor, predecessor, &plan, caller)
                    .await?
            }
        };

        trace.advance(SaveState::Persisting)?;
        let resolution = self.deps.resolver.resolve(written).await?;
        if resolution.is_broken() {
            return Err(ModelError::BrokenDescriptor {
                model: resolution.descriptor.name,
                errors: resolution.errors,
            });
        }
        if plan.is_new() && resolution.descriptor.status.is_official() {
            self.grant_owner(&resolution.descriptor, caller).await?;
        }

        Ok(Persisted {
            descriptor: resolution.descriptor,
            lineage: plan.lineage,
            created: plan.is_new(),
            base_version: plan.last_modified,
        })
    }

    async fn create_descriptor(
        &self,
        mut descriptor: ModelDescriptor,
        plan: &ReconcilePlan,
        caller: &Principal,
    ) -> Result<ModelDescriptor, ModelError> {
        self.prune(plan, caller).await?;

        if self.deps.store.get(&descriptor.name).await?.is_some() {
            return Err(ModelError::DuplicateModelName(descriptor.name));
        }

        descriptor.owner = Some(caller.name.clone());
        let created = self
            .deps
            .store
            .create(descriptor)
            .await
            .map_err(|e| match e {
                StoreError::Duplicate(name) => ModelError::DuplicateModelName(name),
                other => ModelError::Store(other),
            })?;

        tracing::debug!(model = %created.name, lineage = %plan.lineage, "created record");
        Ok(created)
    }

    async fn update_descriptor(
        &self,
        mut descriptor: ModelDescriptor,
        predecessor: &ModelDescriptor,
        plan: &ReconcilePlan,
        caller: &Principal,
    ) -> Result<ModelDescriptor, ModelError> {
        self.deps.acl.authorize_edit(predecessor, caller).await?;

        if descriptor.status.is_official() {
            let check = self
                .validator
                .validate(
                    descriptor.clone(),
                    predecessor,
                    self.deps.resolver.as_ref(),
                    self.deps.dependents.as_ref(),
                )
                .await?;
            if !check.report.is_compatible() {
                return Err(ModelError::IncompatibleUpdate {
                    model: descriptor.name,
                    violations: check.report.violations,
                });
            }
        }

        self.prune(plan, caller).await?;

        descriptor.owner.clone_from(&predecessor.owner);
        let updated = self.deps.store.update(descriptor).await?;
        tracing::debug!(
            model = %updated.name,
            lineage = %plan.lineage,
            base_version = plan.last_modified,
            "updated record"
        );
        Ok(updated)
    }

    async fn prune(&self, plan: &ReconcilePlan, caller: &Principal) -> Result<(), ModelError> {
        self.reconciler
            .prune(
                plan,
                caller,
                self.deps.store.as_ref(),
                self.deps.dependents.as_ref(),
                self.deps.acl.as_ref(),
            )
            .await?;
        Ok(())
    }

    /// Write the first entries of a new official model
    ///
    /// Runs last in the checkpoint. Entries are keyed by name and survive a
    /// store rollback, so a failed grant cleans up before returning.
    async fn grant_owner(&self, model: &ModelDescriptor, caller: &Principal) -> Result<(), ModelError> {
        let acl = self.deps.acl.as_ref();
        acl.clean_acl(model).await?;

        let granted = match acl.init_acl(model, caller, Permission::Administration).await {
            Ok(()) => match model.project.as_deref() {
                Some(project) => acl.inherit_acl(model, project).await,
                None => Ok(()),
            },
            failed => failed,
        };
        if let Err(err) = granted {
            self.discard_acl(model).await;
            return Err(err.into());
        }
        Ok(())
    }

    async fn discard_acl(&self, model: &ModelDescriptor) {
        if let Err(err) = self.deps.acl.clean_acl(model).await {
            tracing::error!(model = %model.name, error = %err, "acl cleanup failed");
        }
    }

    async fn commit(&self, checkpoint: Box<dyn Checkpoint>, model: &str) -> Result<(), ModelError> {
        if let Err(err) = checkpoint.close().await {
            tracing::error!(model, error = %err, "checkpoint close failed");
            self.deps.caches.invalidate_derived_caches();
            return Err(err.into());
        }
        Ok(())
    }

    async fn abort(&self, checkpoint: Box<dyn Checkpoint>, model: &str) {
        if let Err(err) = checkpoint.rollback().await {
            tracing::error!(model, error = %err, "rollback failed");
        }
        self.deps.caches.invalidate_derived_caches();
        tracing::info!(model, state = %SaveState::RolledBack, "rolled back");
    }

    /// Drop a model by name
    ///
    /// # Errors
    /// - `ModelNotFound` if no record has that name
    /// - `Authorization` unless the caller owns the model, is an admin or
    ///   holds an edit permission
    /// - `ReferencedModel` while any cube references the model
    pub async fn drop_model_by_name(
        &self,
        name: &str,
        caller: &Principal,
    ) -> Result<ModelDescriptor, ModelError> {
        naming::require_non_empty(NameField::Model, name)?;

        let _txn = self.txn.lock().await;
        let model = self
            .deps
            .store
            .get(name)
            .await?
            .ok_or_else(|| ModelError::ModelNotFound(name.to_string()))?;
        self.deps.acl.authorize_edit(&model, caller).await?;

        let dependents = self.deps.dependents.list_dependents(name).await?;
        if !dependents.is_empty() {
            return Err(ModelError::ReferencedModel {
                model: name.to_string(),
                dependents,
            });
        }

        let checkpoint = self.deps.store.checkpoint().await?;
        match self.drop_in_checkpoint(&model).await {
            Ok(()) => {
                self.commit(checkpoint, name).await?;
                tracing::info!(model = name, lineage = ?model.lineage_id, "model dropped");
                Ok(model)
            }
            Err(err) => {
                tracing::warn!(model = name, error = %err, "drop failed");
                self.abort(checkpoint, name).await;
                Err(err)
            }
        }
    }

    async fn drop_in_checkpoint(&self, model: &ModelDescriptor) -> Result<(), ModelError> {
        self.deps.store.delete(&model.name).await?;
        self.deps.acl.clean_acl(model).await?;
        Ok(())
    }

    /// Copy an existing model under a new name, as a new official lineage
    ///
    /// # Errors
    /// - `EmptyName` for a blank project, source or new name
    /// - `InvalidName` for a malformed new name
    /// - `ModelNotFound` if the source does not exist
    /// - any error of [`save_model`](Self::save_model)
    pub async fn clone_model(
        &self,
        source: &str,
        new_name: &str,
        project: &str,
        caller: &Principal,
    ) -> Result<SaveOutcome, ModelError> {
        naming::require_non_empty(NameField::Project, project)?;
        naming::require_non_empty(NameField::Model, source)?;
        naming::validate_name(NameField::TargetName, new_name)?;

        let mut copy = self
            .deps
            .store
            .get(source)
            .await?
            .ok_or_else(|| ModelError::ModelNotFound(source.to_string()))?;
        copy.name = new_name.to_string();
        copy.lineage_id = None;
        copy.last_modified = 0;
        copy.status = ModelStatus::Official;
        copy.owner = None;

        tracing::debug!(source, model = new_name, project, "cloning model");
        self.save_model(SaveRequest::new(copy).with_project(project), caller)
            .await
    }

    /// Check if no record holds a name
    ///
    /// # Errors
    /// Propagates store failures.
    pub async fn check_name_availability(&self, name: &str) -> Result<bool, ModelError> {
        Ok(self.deps.store.get(name).await?.is_none())
    }

    /// Get a model by name
    ///
    /// # Errors
    /// Returns `ModelNotFound` if no record has that name.
    pub async fn get_model(&self, name: &str) -> Result<ModelDescriptor, ModelError> {
        self.deps
            .store
            .get(name)
            .await?
            .ok_or_else(|| ModelError::ModelNotFound(name.to_string()))
    }

    /// Columns of a model used by cubes, by `TABLE.COLUMN`, with the cubes
    /// using each
    ///
    /// # Errors
    /// Propagates collaborator failures.
    pub async fn used_columns(
        &self,
        model: &str,
    ) -> Result<BTreeMap<String, BTreeSet<String>>, ModelError> {
        Ok(self.deps.dependents.used_columns(model).await?.by_identity())
    }

    /// List models, most recently modified first
    ///
    /// # Errors
    /// Propagates store failures.
    pub async fn list_models(&self, query: &ModelQuery) -> Result<Page<ModelDescriptor>, ModelError> {
        let page_size = query.page_size.unwrap_or(self.config.page_size).max(1);
        let mut models: Vec<_> = self
            .deps
            .store
            .list_descriptors()
            .await?
            .into_iter()
            .filter(|m| query.matches(m))
            .collect();
        models.sort_by(|a, b| {
            b.last_modified
                .cmp(&a.last_modified)
                .then_with(|| a.name.cmp(&b.name))
        });

        Ok(Page::slice(models, query.page, page_size))
    }
}
