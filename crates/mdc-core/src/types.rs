//! Request and result types of the model service

use crate::state::SaveState;
use mdc_model::{LineageId, ModelDescriptor};
use serde::{Deserialize, Serialize};

/// Request to save a descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveRequest {
    /// Candidate descriptor, named by its base name
    pub descriptor: ModelDescriptor,

    /// Save as the lineage's draft copy
    #[serde(default)]
    pub is_draft: bool,

    /// Owning project; falls back to the descriptor's, then the default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

impl SaveRequest {
    /// Official save of a descriptor
    #[inline]
    #[must_use]
    pub fn new(descriptor: ModelDescriptor) -> Self {
        Self {
            descriptor,
            is_draft: false,
            project: None,
        }
    }

    /// Draft save of a descriptor
    #[inline]
    #[must_use]
    pub fn draft(descriptor: ModelDescriptor) -> Self {
        Self {
            is_draft: true,
            ..Self::new(descriptor)
        }
    }

    /// With project
    #[inline]
    #[must_use]
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }
}

/// Result of a successful save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    /// Descriptor as persisted
    pub descriptor: ModelDescriptor,

    /// Lineage of the saved record
    pub lineage: LineageId,

    /// Whether the create path was taken
    pub created: bool,

    /// Version stamp carried over from the predecessor (`0` when created)
    pub base_version: u64,

    /// States the save went through
    pub trace: Vec<SaveState>,
}

/// Model listing filter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelQuery {
    /// Exact name, compared case-insensitively
    pub name: Option<String>,

    /// Owning project
    pub project: Option<String>,

    /// Zero-based page index
    pub page: usize,

    /// Page size; the configured size when absent
    pub page_size: Option<usize>,
}

impl ModelQuery {
    /// Query for every model
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With name filter
    #[inline]
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// With project filter
    #[inline]
    #[must_use]
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// With page index and size
    #[inline]
    #[must_use]
    pub fn with_page(mut self, page: usize, page_size: usize) -> Self {
        self.page = page;
        self.page_size = Some(page_size);
        self
    }

    /// Check if a descriptor passes the filters
    #[must_use]
    pub fn matches(&self, descriptor: &ModelDescriptor) -> bool {
        let name_ok = self
            .name
            .as_deref()
            .map_or(true, |n| descriptor.name.eq_ignore_ascii_case(n));
        let project_ok = self
            .project
            .as_deref()
            .map_or(true, |p| descriptor.project.as_deref() == Some(p));
        name_ok && project_ok
    }
}

/// One page of a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    /// Items of this page
    pub items: Vec<T>,

    /// Number of items across all pages
    pub total: usize,

    /// Zero-based page index
    pub page: usize,

    /// Page size used
    pub page_size: usize,
}

impl<T> Page<T> {
    /// Slice one page out of a full, ordered result
    ///
    /// The offset is clamped, so a page past the end is empty.
    #[must_use]
    pub fn slice(all: Vec<T>, page: usize, page_size: usize) -> Self {
        let total = all.len();
        let offset = page.saturating_mul(page_size).min(total);
        let items = all.into_iter().skip(offset).take(page_size).collect();
        Self {
            items,
            total,
            page,
            page_size,
        }
    }
}
