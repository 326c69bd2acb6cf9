//! Lineage reconciliation
//!
//! Decides, for a descriptor about to be saved, which existing copies of
//! its lineage are kept, which are stale, and whether the save is an
//! illegal rename. Planning is pure; [`LineageReconciler::prune`] then
//! performs the deletions the plan calls for.

use mdc_model::{
    AccessControl, AccessError, DependentArtifacts, DescriptorStore, LineageId, ModelDescriptor,
    ModelStatus, Principal, StoreError,
};
use std::collections::BTreeSet;

/// Reconciliation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    /// A lineage with an official copy cannot be renamed by a plain save
    #[error("model lineage {lineage} cannot be renamed from '{from}' to '{to}' while an official copy exists")]
    IllegalRename {
        lineage: LineageId,
        from: String,
        to: String,
    },

    /// A stale copy is still referenced by cubes
    #[error("model '{model}' is still referenced by {dependents:?}")]
    Referenced {
        model: String,
        dependents: BTreeSet<String>,
    },

    /// Store failure
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Access-control failure while cleaning a stale copy
    #[error("access control error: {0}")]
    Access(#[from] AccessError),
}

/// Outcome of planning a save against the existing copies of its lineage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Lineage of the save (freshly assigned when the candidate had none)
    pub lineage: LineageId,

    /// Whether the lineage id was assigned by this plan
    pub assigned: bool,

    /// Same-slot record with the same name; overwritten in place
    pub predecessor: Option<ModelDescriptor>,

    /// Official copy of the lineage, if any; never deleted here
    pub official_anchor: Option<ModelDescriptor>,

    /// Records to delete before persisting
    pub stale: Vec<ModelDescriptor>,

    /// Version stamp to carry into the candidate
    pub last_modified: u64,
}

impl ReconcilePlan {
    /// Check if the save creates a new record for its (lineage, status) slot
    #[inline]
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.predecessor.is_none()
    }

    /// Names of the stale records
    #[must_use]
    pub fn stale_names(&self) -> Vec<&str> {
        self.stale.iter().map(|d| d.name.as_str()).collect()
    }
}

/// Lineage reconciler
///
/// The only component allowed to delete records sharing a lineage id.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineageReconciler;

impl LineageReconciler {
    /// Create new reconciler
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Plan a save of `name` with `status` against the copies of `lineage`
    ///
    /// `existing` should hold every record sharing the lineage id; records
    /// of other lineages are ignored.
    ///
    /// # Errors
    /// Returns [`ReconcileError::IllegalRename`] when a same-status copy
    /// exists under another name and the lineage has an official copy.
    pub fn plan(
        &self,
        lineage: Option<LineageId>,
        name: &str,
        status: ModelStatus,
        existing: &[ModelDescriptor],
    ) -> Result<ReconcilePlan, ReconcileError> {
        let Some(lineage) = lineage else {
            let lineage = LineageId::new();
            tracing::debug!(%lineage, model = name, "assigned new lineage");
            return Ok(ReconcilePlan {
                lineage,
                assigned: true,
                predecessor: None,
                official_anchor: None,
                stale: Vec::new(),
                last_modified: 0,
            });
        };

        let mut predecessor = None;
        let mut official_anchor = None;
        let mut renamed_from: Option<String> = None;
        let mut stale = Vec::new();

        for model in existing.iter().filter(|m| m.lineage_id == Some(lineage)) {
            let same_status = model.status == status;
            let mut keep = false;

            if same_status && model.name != name {
                renamed_from.get_or_insert_with(|| model.name.clone());
            }
            if same_status && model.name == name {
                predecessor = Some(model.clone());
                keep = true;
            }
            if model.status.is_official() {
                official_anchor = Some(model.clone());
                keep = true;
            }
            if !keep {
                stale.push(model.clone());
            }
        }

        if let (Some(_), Some(from)) = (&official_anchor, renamed_from) {
            tracing::warn!(%lineage, from = %from, to = name, "rejected rename of official lineage");
            return Err(ReconcileError::IllegalRename {
                lineage,
                from,
                to: name.to_string(),
            });
        }

        let last_modified = predecessor.as_ref().map_or(0, |p| p.last_modified);
        tracing::debug!(
            %lineage,
            model = name,
            new = predecessor.is_none(),
            stale = stale.len(),
            "planned reconciliation"
        );

        Ok(ReconcilePlan {
            lineage,
            assigned: false,
            predecessor,
            official_anchor,
            stale,
            last_modified,
        })
    }

    /// Read the lineage's copies from the store and plan the save
    ///
    /// # Errors
    /// Propagates store failures and [`ReconcileError::IllegalRename`].
    pub async fn reconcile(
        &self,
        store: &dyn DescriptorStore,
        lineage: Option<LineageId>,
        name: &str,
        status: ModelStatus,
    ) -> Result<ReconcilePlan, ReconcileError> {
        let existing = match lineage {
            Some(id) => store.list_by_lineage(&id).await?,
            None => Vec::new(),
        };
        self.plan(lineage, name, status, &existing)
    }

    /// Delete the stale records of a plan on behalf of `caller`
    ///
    /// Every stale record is checked before the first deletion, so a
    /// failing check deletes nothing. The caller must own or hold an edit
    /// permission on each stale copy, or on the lineage's official copy.
    /// A stale copy still referenced by cubes fails the save. Each deleted
    /// record has its access-control entries cleaned.
    ///
    /// # Errors
    /// - [`ReconcileError::Access`] if the caller may not remove a stale copy
    /// - [`ReconcileError::Referenced`] if a stale copy still has cubes
    /// - Store or access-control failures
    pub async fn prune(
        &self,
        plan: &ReconcilePlan,
        caller: &Principal,
        store: &dyn DescriptorStore,
        dependents: &dyn DependentArtifacts,
        acl: &dyn AccessControl,
    ) -> Result<usize, ReconcileError> {
        for model in &plan.stale {
            authorize_removal(plan, model, caller, acl).await?;
            let cubes = dependents.list_dependents(&model.name).await?;
            if !cubes.is_empty() {
                return Err(ReconcileError::Referenced {
                    model: model.name.clone(),
                    dependents: cubes,
                });
            }
        }

        for model in &plan.stale {
            store.delete(&model.name).await?;
            acl.clean_acl(model).await?;
            tracing::info!(lineage = %plan.lineage, model = %model.name, "dropped stale copy");
        }

        Ok(plan.stale.len())
    }
}

async fn authorize_removal(
    plan: &ReconcilePlan,
    model: &ModelDescriptor,
    caller: &Principal,
    acl: &dyn AccessControl,
) -> Result<(), ReconcileError> {
    let denied = match acl.authorize_edit(model, caller).await {
        Ok(()) => return Ok(()),
        Err(err) => err,
    };
    if let Some(anchor) = &plan.official_anchor {
        if acl.authorize_edit(anchor, caller).await.is_ok() {
            return Ok(());
        }
    }
    tracing::warn!(
        lineage = %plan.lineage,
        model = %model.name,
        principal = %caller.name,
        "stale copy removal denied"
    );
    Err(denied.into())
}
