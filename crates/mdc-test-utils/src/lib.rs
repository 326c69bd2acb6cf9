//! Testing utilities for the MDC workspace
//!
//! Shared fixtures: a small retail table catalog, a sales model over it,
//! cube views, and a harness holding one of each in-memory collaborator.

#![allow(missing_docs)]

use mdc_model::{ColumnRef, DependentArtifact, DimensionGroup, JoinDesc, LookupDesc, ModelDescriptor};
use mdc_store::{
    DerivedCache, MemoryAccessControl, MemoryCubeRegistry, MemoryDescriptorStore,
    MemoryTableCatalog,
};

pub fn col(reference: &str) -> ColumnRef {
    reference.parse().unwrap()
}

/// `db.orders` with `db.customer` and `db.product` lookups
pub fn orders_catalog() -> MemoryTableCatalog {
    MemoryTableCatalog::new()
        .with_table(
            "db.orders",
            &["id", "customer_id", "product_id", "region", "order_date", "amount", "quantity"],
        )
        .with_table("db.customer", &["id", "segment", "nation"])
        .with_table("db.product", &["id", "category", "brand"])
}

pub fn customer_lookup() -> LookupDesc {
    LookupDesc::new(
        "db.customer",
        JoinDesc::inner(col("orders.customer_id"), col("customer.id")),
    )
}

pub fn product_lookup() -> LookupDesc {
    LookupDesc::new(
        "db.product",
        JoinDesc::inner(col("orders.product_id"), col("product.id")),
    )
}

/// Unsaved official model that binds cleanly to [`orders_catalog`]
pub fn sales_model(name: &str) -> ModelDescriptor {
    ModelDescriptor::new(name, "db.orders")
        .with_lookup(customer_lookup())
        .with_lookup(product_lookup())
        .with_dimension(DimensionGroup::new("orders", &["region", "order_date"]))
        .with_dimension(DimensionGroup::new("customer", &["segment"]))
        .with_dimension(DimensionGroup::new("product", &["category"]))
        .with_measure(col("orders.amount"))
        .with_measure(col("orders.quantity"))
}

/// Cube over `model` using the given dimension columns
pub fn cube_using(name: &str, model: &str, dimensions: &[&str]) -> DependentArtifact {
    dimensions
        .iter()
        .fold(DependentArtifact::new(name, model), |cube, dim| {
            cube.with_dimension(col(dim))
        })
}

/// One of each in-memory collaborator; clones share state
#[derive(Debug, Clone)]
pub struct Harness {
    pub store: MemoryDescriptorStore,
    pub catalog: MemoryTableCatalog,
    pub cubes: MemoryCubeRegistry,
    pub acl: MemoryAccessControl,
    pub cache: DerivedCache,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            store: MemoryDescriptorStore::new(),
            catalog: orders_catalog(),
            cubes: MemoryCubeRegistry::new(),
            acl: MemoryAccessControl::new(),
            cache: DerivedCache::default(),
        }
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
