//! Column references
//!
//! Provides [`ColumnRef`], a `TABLE.COLUMN` pair naming one physical column
//! through the table alias used inside a model descriptor.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Reference to a column through its table alias
///
/// Identifiers are stored upper-cased so that `orders.region` and
/// `ORDERS.REGION` compare equal, matching how the table catalog binds names.
///
/// # Examples
/// - `ORDERS.REGION`
/// - `CUSTOMER.NATION_KEY`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ColumnRef {
    table: String,
    column: String,
}

impl ColumnRef {
    /// Create reference from table alias and column name
    #[inline]
    #[must_use]
    pub fn new(table: impl AsRef<str>, column: impl AsRef<str>) -> Self {
        Self {
            table: table.as_ref().to_ascii_uppercase(),
            column: column.as_ref().to_ascii_uppercase(),
        }
    }

    /// Table alias
    #[inline]
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Column name
    #[inline]
    #[must_use]
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Identity string (`TABLE.COLUMN`)
    #[inline]
    #[must_use]
    pub fn identity(&self) -> String {
        self.to_string()
    }

    /// Check whether this column belongs to the given table alias
    #[inline]
    #[must_use]
    pub fn belongs_to(&self, table: &str) -> bool {
        self.table.eq_ignore_ascii_case(table)
    }
}

impl Display for ColumnRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

impl FromStr for ColumnRef {
    type Err = ColumnRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (table, column) = s
            .split_once('.')
            .ok_or_else(|| ColumnRefError::MissingTable(s.to_string()))?;

        for part in [table, column] {
            if part.is_empty() {
                return Err(ColumnRefError::EmptyPart(s.to_string()));
            }
            if part.contains(|c: char| !c.is_ascii_alphanumeric() && c != '_') {
                return Err(ColumnRefError::InvalidPart(part.to_string()));
            }
        }

        Ok(Self::new(table, column))
    }
}

impl TryFrom<String> for ColumnRef {
    type Error = ColumnRefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ColumnRef> for String {
    fn from(value: ColumnRef) -> Self {
        value.to_string()
    }
}

/// Errors related to column references
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColumnRefError {
    /// No `TABLE.` qualifier
    #[error("column reference '{0}' is not qualified by a table")]
    MissingTable(String),

    /// Empty table or column part
    #[error("column reference '{0}' has an empty part")]
    EmptyPart(String),

    /// Invalid characters
    #[error("invalid identifier: {0} (must be alphanumeric or underscore)")]
    InvalidPart(String),
}
