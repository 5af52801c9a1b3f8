//! # gridexpr
//!
//! An embedded formula language that derives computed columns over typed
//! tabular data. An expression is a short text string referencing existing
//! columns, literals, and a fixed library of functions; `gridexpr`
//! type-checks it against the table's schema, compiles it once, and
//! evaluates it per row to produce a new column.
//!
//! ## Features
//!
//! - **Typed value system**: integer, float, string, boolean, date and
//!   datetime columns with first-class NULL (no in-band sentinels)
//! - **Batch validation**: many expressions validated in one call; failures
//!   are reported as diagnostics and never block the rest of the batch
//! - **Strict null rules**: arithmetic propagates NULL, division and modulo
//!   by zero produce NULL, `NULL == NULL` is true
//! - **Closed function catalog**: a fixed, independently testable registry
//!   of scalar and variadic functions with explicit type-promotion rules
//! - **Restricted imperative subset**: variable declarations, fixed-size
//!   arrays for multi-value returns, conditionals, statement sequences
//!
//! ## Quick Start
//!
//! ```rust
//! use gridexpr::gridexpr::table::{Column, ColumnBatch, ColumnType, TableSchema};
//! use gridexpr::gridexpr::formula::compute_columns;
//!
//! let schema = TableSchema::new([
//!     ("price".to_string(), ColumnType::Float),
//!     ("qty".to_string(), ColumnType::Integer),
//! ]);
//!
//! let mut batch = ColumnBatch::new();
//! batch.insert("price", Column::floats(vec![Some(1.5), None, Some(4.25)]));
//! batch.insert("qty", Column::integers(vec![Some(2), Some(3), Some(4)]));
//!
//! let result = compute_columns(&schema, &batch, &["//total\n\"price\" * \"qty\""]);
//! let total = &result.output_columns["total"];
//! assert_eq!(total.len(), 3);
//! ```

// Allow certain clippy warnings for development
#![allow(clippy::collapsible_if)]
#![allow(clippy::large_enum_variant)]
#![allow(clippy::result_large_err)]

pub mod gridexpr;

// Re-export the common surface at the crate root for convenience.
pub use crate::gridexpr::formula::{
    compute_columns, validate_expressions, CompiledFormula, ComputedColumns, Diagnostic,
    ExpressionValidation, FormulaError, FormulaResult,
};
pub use crate::gridexpr::table::{CellValue, Column, ColumnBatch, ColumnType, TableSchema};
