//! Read-only columnar batches consumed and produced by the evaluator.

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;

use super::schema::ColumnType;
use crate::gridexpr::formula::execution::types::CellValue;

/// A typed array of cell values with first-class nulls.
///
/// Every slot holds a [`CellValue`] whose variant matches the column's
/// declared type, or [`CellValue::Null`]. Columns are read-only for the
/// duration of an evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    column_type: ColumnType,
    values: Vec<CellValue>,
}

impl Column {
    /// Create a column of the given type from pre-tagged values.
    ///
    /// Values must already match `column_type` or be `Null`; this is the
    /// constructor the evaluator uses for output columns.
    pub fn from_values(column_type: ColumnType, values: Vec<CellValue>) -> Self {
        Column {
            column_type,
            values,
        }
    }

    /// Integer column from optional values (`None` becomes NULL).
    pub fn integers(values: Vec<Option<i64>>) -> Self {
        Column {
            column_type: ColumnType::Integer,
            values: values
                .into_iter()
                .map(|v| v.map_or(CellValue::Null, CellValue::Integer))
                .collect(),
        }
    }

    /// Float column from optional values.
    pub fn floats(values: Vec<Option<f64>>) -> Self {
        Column {
            column_type: ColumnType::Float,
            values: values
                .into_iter()
                .map(|v| v.map_or(CellValue::Null, CellValue::Float))
                .collect(),
        }
    }

    /// String column from optional values.
    pub fn strings(values: Vec<Option<&str>>) -> Self {
        Column {
            column_type: ColumnType::String,
            values: values
                .into_iter()
                .map(|v| v.map_or(CellValue::Null, |s| CellValue::String(s.to_string())))
                .collect(),
        }
    }

    /// Boolean column from optional values.
    pub fn booleans(values: Vec<Option<bool>>) -> Self {
        Column {
            column_type: ColumnType::Boolean,
            values: values
                .into_iter()
                .map(|v| v.map_or(CellValue::Null, CellValue::Boolean))
                .collect(),
        }
    }

    /// Date column from optional values.
    pub fn dates(values: Vec<Option<NaiveDate>>) -> Self {
        Column {
            column_type: ColumnType::Date,
            values: values
                .into_iter()
                .map(|v| v.map_or(CellValue::Null, CellValue::Date))
                .collect(),
        }
    }

    /// DateTime column from optional values.
    pub fn datetimes(values: Vec<Option<NaiveDateTime>>) -> Self {
        Column {
            column_type: ColumnType::DateTime,
            values: values
                .into_iter()
                .map(|v| v.map_or(CellValue::Null, CellValue::DateTime))
                .collect(),
        }
    }

    /// The column's declared type.
    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the column holds no rows.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at `row`; `Null` past the end.
    pub fn value(&self, row: usize) -> &CellValue {
        self.values.get(row).unwrap_or(&CellValue::Null)
    }

    /// All values in row order.
    pub fn values(&self) -> &[CellValue] {
        &self.values
    }
}

/// A set of equally-sized named columns, addressable by row index.
///
/// Inputs to [`compute_columns`](crate::gridexpr::formula::compute_columns)
/// are read-only; the batch is never mutated by evaluation.
#[derive(Debug, Clone, Default)]
pub struct ColumnBatch {
    columns: HashMap<String, Column>,
    num_rows: usize,
}

impl ColumnBatch {
    /// Create an empty batch.
    pub fn new() -> Self {
        ColumnBatch::default()
    }

    /// Insert a column under `name`.
    ///
    /// The first insertion fixes the batch's row count; later columns must
    /// match it. Mismatched lengths are a caller bug and panic in debug
    /// builds only.
    pub fn insert(&mut self, name: &str, column: Column) {
        if self.columns.is_empty() {
            self.num_rows = column.len();
        }
        debug_assert_eq!(column.len(), self.num_rows, "column {} length mismatch", name);
        self.columns.insert(name.to_string(), column);
    }

    /// Column named `name`, if present.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Number of rows shared by every column.
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Iterate over (name, column) entries in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Column)> {
        self.columns.iter()
    }
}
