/*!
Table-side data model: column types, schemas, and columnar batches.

The formula engine never owns table storage; it consumes an immutable
[`TableSchema`] at compile time and a read-only [`ColumnBatch`] at
evaluation time. Output columns are produced in the same [`Column`]
representation so hosts can feed them back into filtering and sorting.
*/

pub mod column;
pub mod schema;

pub use column::{Column, ColumnBatch};
pub use schema::{ColumnType, TableSchema};

pub use crate::gridexpr::formula::execution::types::CellValue;
