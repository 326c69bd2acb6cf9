//! Model descriptors
//!
//! Provides [`ModelDescriptor`], the versioned entity managed by the
//! catalog, together with its lineage identity and publication status.

use crate::column::ColumnRef;
use crate::join::{JoinTree, LookupDesc};
use crate::naming::draft_name;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Stable identifier tying the draft and official copies of one model
///
/// Assigned once, on first save, and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineageId(pub Uuid);

impl LineageId {
    /// Generate a fresh lineage id
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LineageId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for LineageId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LineageId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Publication state of a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ModelStatus {
    /// Promoted copy; stored without a status marker
    #[default]
    Official,
    /// Work-in-progress copy stored under `<name>_draft`
    Draft,
}

impl ModelStatus {
    /// Marker stored for drafts
    pub const DRAFT_MARKER: &'static str = "DRAFT";

    /// Status for a save request
    #[inline]
    #[must_use]
    pub fn from_draft_flag(is_draft: bool) -> Self {
        if is_draft {
            Self::Draft
        } else {
            Self::Official
        }
    }

    /// Check if official
    #[inline]
    #[must_use]
    pub fn is_official(&self) -> bool {
        matches!(self, Self::Official)
    }

    /// Check if draft
    #[inline]
    #[must_use]
    pub fn is_draft(&self) -> bool {
        matches!(self, Self::Draft)
    }
}

impl Display for ModelStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Official => f.write_str("OFFICIAL"),
            Self::Draft => f.write_str(Self::DRAFT_MARKER),
        }
    }
}

/// Serde adapter: drafts carry `"DRAFT"`, anything else is official
mod status_marker {
    use super::ModelStatus;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(status: &ModelStatus, s: S) -> Result<S::Ok, S::Error> {
        match status {
            ModelStatus::Draft => s.serialize_some(ModelStatus::DRAFT_MARKER),
            ModelStatus::Official => s.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<ModelStatus, D::Error> {
        let marker = Option::<String>::deserialize(d)?;
        Ok(match marker.as_deref() {
            Some(ModelStatus::DRAFT_MARKER) => ModelStatus::Draft,
            _ => ModelStatus::Official,
        })
    }
}

/// Dimension group: columns of one table usable as dimensions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionGroup {
    /// Table alias
    pub table: String,

    /// Column names within the table
    pub columns: Vec<String>,
}

impl DimensionGroup {
    /// Create dimension group
    #[must_use]
    pub fn new(table: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            table: table.into(),
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
        }
    }

    /// Column references covered by this group
    pub fn column_refs(&self) -> impl Iterator<Item = ColumnRef> + '_ {
        self.columns.iter().map(|c| ColumnRef::new(&self.table, c))
    }
}

/// Versioned, named model descriptor
///
/// Describes how physical tables join and which columns are dimensions and
/// measures. Its serialized form is the document exchanged with callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Lineage id; `None` until the first save
    #[serde(rename = "uuid", default, skip_serializing_if = "Option::is_none")]
    pub lineage_id: Option<LineageId>,

    /// Model name (`<base>_draft` for drafts)
    pub name: String,

    /// Publication status
    #[serde(
        default,
        with = "status_marker",
        skip_serializing_if = "ModelStatus::is_official"
    )]
    pub status: ModelStatus,

    /// Logical version stamp; `0` means not yet persisted under this name
    #[serde(default)]
    pub last_modified: u64,

    /// Owner recorded at creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    /// Owning project
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    /// Free-form description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Root fact table of the join graph
    pub fact_table: String,

    /// Lookup joins
    #[serde(default)]
    pub lookups: Vec<LookupDesc>,

    /// Dimension groups, in declaration order
    #[serde(default)]
    pub dimensions: Vec<DimensionGroup>,

    /// Columns usable as measures
    #[serde(rename = "metrics", default)]
    pub measures: Vec<ColumnRef>,
}

impl ModelDescriptor {
    /// Create an unsaved official descriptor
    #[must_use]
    pub fn new(name: impl Into<String>, fact_table: impl Into<String>) -> Self {
        Self {
            lineage_id: None,
            name: name.into(),
            status: ModelStatus::Official,
            last_modified: 0,
            owner: None,
            project: None,
            description: String::new(),
            fact_table: fact_table.into(),
            lookups: Vec::new(),
            dimensions: Vec::new(),
            measures: Vec::new(),
        }
    }

    /// With lineage id
    #[inline]
    #[must_use]
    pub fn with_lineage(mut self, lineage: LineageId) -> Self {
        self.lineage_id = Some(lineage);
        self
    }

    /// With status
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: ModelStatus) -> Self {
        self.status = status;
        self
    }

    /// With lookup join
    #[inline]
    #[must_use]
    pub fn with_lookup(mut self, lookup: LookupDesc) -> Self {
        self.lookups.push(lookup);
        self
    }

    /// With dimension group
    #[inline]
    #[must_use]
    pub fn with_dimension(mut self, group: DimensionGroup) -> Self {
        self.dimensions.push(group);
        self
    }

    /// With measure column
    #[inline]
    #[must_use]
    pub fn with_measure(mut self, column: ColumnRef) -> Self {
        self.measures.push(column);
        self
    }

    /// With project
    #[inline]
    #[must_use]
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Check if draft
    #[inline]
    #[must_use]
    pub fn is_draft(&self) -> bool {
        self.status.is_draft()
    }

    /// Root fact table
    #[inline]
    #[must_use]
    pub fn root_fact_table(&self) -> &str {
        &self.fact_table
    }

    /// Number of lookup tables joined to the fact table
    #[inline]
    #[must_use]
    pub fn join_table_count(&self) -> usize {
        self.lookups.len()
    }

    /// Resolved join tree
    #[must_use]
    pub fn join_tree(&self) -> JoinTree {
        JoinTree::build(&self.fact_table, &self.lookups)
    }

    /// All columns covered by the dimension groups
    #[must_use]
    pub fn dimension_columns(&self) -> BTreeSet<ColumnRef> {
        self.dimensions
            .iter()
            .flat_map(DimensionGroup::column_refs)
            .collect()
    }

    /// Dimension columns plus measures
    #[must_use]
    pub fn all_columns(&self) -> BTreeSet<ColumnRef> {
        let mut cols = self.dimension_columns();
        cols.extend(self.measures.iter().cloned());
        cols
    }

    /// Re-target this descriptor at a save slot
    ///
    /// A draft save renames to `<name>_draft` and marks the status; an
    /// official save clears the marker.
    pub fn retarget(&mut self, is_draft: bool) {
        if is_draft {
            self.name = draft_name(&self.name);
        }
        self.status = ModelStatus::from_draft_flag(is_draft);
    }
}
