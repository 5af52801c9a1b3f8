//! Column types and table schemas.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The declared type of a table column.
///
/// Source columns carry one of these in the table schema; computed columns
/// derive theirs through type resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// 64-bit signed integer
    Integer,
    /// 64-bit floating point number
    Float,
    /// UTF-8 string
    String,
    /// Boolean value (true/false)
    Boolean,
    /// Calendar date (YYYY-MM-DD)
    Date,
    /// Date and time of day (YYYY-MM-DD HH:MM:SS)
    DateTime,
}

impl ColumnType {
    /// Type name used in error messages and schema output.
    pub fn type_name(&self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::String => "string",
            ColumnType::Boolean => "boolean",
            ColumnType::Date => "date",
            ColumnType::DateTime => "datetime",
        }
    }

    /// True for types usable in arithmetic operations.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }

    /// Numeric promotion over a pair: float wins over integer.
    pub fn promote(self, other: ColumnType) -> ColumnType {
        if self == ColumnType::Float || other == ColumnType::Float {
            ColumnType::Float
        } else {
            ColumnType::Integer
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Mapping from column name to declared type.
///
/// Immutable for the duration of a compilation; a schema change (column set
/// or column type) invalidates every formula compiled against it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    columns: HashMap<String, ColumnType>,
}

impl TableSchema {
    /// Build a schema from (name, type) pairs.
    pub fn new(columns: impl IntoIterator<Item = (String, ColumnType)>) -> Self {
        TableSchema {
            columns: columns.into_iter().collect(),
        }
    }

    /// Declared type of `name`, if the column exists.
    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.columns.get(name).copied()
    }

    /// True if the schema declares a column called `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Number of declared columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// True when no columns are declared.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterate over (name, type) entries in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ColumnType)> {
        self.columns.iter()
    }
}
