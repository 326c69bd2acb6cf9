//! In-memory table catalog
//!
//! Binds a descriptor's table and column references to known physical
//! tables. Every reference that does not bind becomes a resolution error.

use async_trait::async_trait;
use mdc_model::{default_alias, CatalogResolver, ColumnRef, ModelDescriptor, Resolution, StoreError};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// Physical tables and their columns
#[derive(Debug, Clone, Default)]
pub struct MemoryTableCatalog {
    tables: Arc<RwLock<BTreeMap<String, BTreeSet<String>>>>,
}

impl MemoryTableCatalog {
    /// Create empty catalog
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With table
    #[must_use]
    pub fn with_table(self, table: &str, columns: &[&str]) -> Self {
        self.add_table(table, columns);
        self
    }

    /// Register or replace a table
    pub fn add_table(&self, table: &str, columns: &[&str]) {
        let columns = columns.iter().map(|c| c.to_ascii_uppercase()).collect();
        self.tables.write().insert(table.to_ascii_uppercase(), columns);
    }

    /// Remove a table; returns `true` if it existed
    pub fn drop_table(&self, table: &str) -> bool {
        self.tables.write().remove(&table.to_ascii_uppercase()).is_some()
    }

    /// Check if a table is known
    #[must_use]
    pub fn contains_table(&self, table: &str) -> bool {
        self.tables.read().contains_key(&table.to_ascii_uppercase())
    }

    fn binding_errors(&self, descriptor: &ModelDescriptor) -> Vec<String> {
        let tables = self.tables.read();
        let mut errors = Vec::new();
        // alias -> physical table, only for tables that exist
        let mut aliases: HashMap<String, String> = HashMap::new();

        let fact = descriptor.fact_table.to_ascii_uppercase();
        if tables.contains_key(&fact) {
            aliases.insert(default_alias(&fact), fact);
        } else {
            errors.push(format!("fact table {fact} not found"));
        }

        for lookup in &descriptor.lookups {
            let table = lookup.table.to_ascii_uppercase();
            if tables.contains_key(&table) {
                aliases.insert(lookup.alias(), table);
            } else {
                errors.push(format!("lookup table {table} not found"));
            }
        }

        let mut check = |column: &ColumnRef| match aliases.get(column.table()) {
            Some(table) => {
                let known = tables
                    .get(table)
                    .is_some_and(|cols| cols.contains(column.column()));
                if !known {
                    errors.push(format!("column {column} not found in {table}"));
                }
            }
            None => errors.push(format!("column {column} references unknown alias")),
        };

        for lookup in &descriptor.lookups {
            lookup
                .join
                .foreign_key
                .iter()
                .chain(&lookup.join.primary_key)
                .for_each(&mut check);
        }
        descriptor.dimension_columns().iter().for_each(&mut check);
        descriptor.measures.iter().for_each(&mut check);

        errors
    }
}

#[async_trait]
impl CatalogResolver for MemoryTableCatalog {
    async fn resolve(&self, descriptor: ModelDescriptor) -> Result<Resolution, StoreError> {
        let errors = self.binding_errors(&descriptor);
        if !errors.is_empty() {
            tracing::debug!(model = %descriptor.name, errors = errors.len(), "descriptor does not bind");
        }
        Ok(Resolution { descriptor, errors })
    }
}
