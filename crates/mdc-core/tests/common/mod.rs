//! Wiring shared by the integration tests

#![allow(dead_code)]

use mdc_core::{CatalogConfig, Collaborators, ModelError, ModelService, SaveOutcome, SaveRequest};
use mdc_model::{ModelDescriptor, Principal};
use mdc_test_utils::Harness;
use std::sync::Arc;

pub fn collaborators(harness: &Harness) -> Collaborators {
    Collaborators {
        store: Arc::new(harness.store.clone()),
        resolver: Arc::new(harness.catalog.clone()),
        dependents: Arc::new(harness.cubes.clone()),
        caches: Arc::new(harness.cache.clone()),
        acl: Arc::new(harness.acl.clone()),
    }
}

pub fn service(harness: &Harness) -> ModelService {
    service_with(harness, CatalogConfig::new())
}

pub fn service_with(harness: &Harness, config: CatalogConfig) -> ModelService {
    ModelService::new(config, collaborators(harness)).unwrap()
}

pub fn alice() -> Principal {
    Principal::user("alice")
}

pub fn bob() -> Principal {
    Principal::user("bob")
}

/// Official save as alice
pub async fn save(service: &ModelService, model: ModelDescriptor) -> Result<SaveOutcome, ModelError> {
    service.save_model(SaveRequest::new(model), &alice()).await
}

/// Draft save as alice
pub async fn save_draft(
    service: &ModelService,
    model: ModelDescriptor,
) -> Result<SaveOutcome, ModelError> {
    service.save_model(SaveRequest::draft(model), &alice()).await
}

/// Candidate for the next save of a saved record, under its base name
pub fn next_version(saved: &SaveOutcome) -> ModelDescriptor {
    let mut candidate = saved.descriptor.clone();
    if let Some(base) = candidate.name.strip_suffix(mdc_model::naming::DRAFT_SUFFIX) {
        candidate.name = base.to_string();
    }
    candidate
}
