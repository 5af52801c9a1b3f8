/*!
Formula execution: the value type, built-in function bodies, and the
row-wise evaluator.

Everything here is pure and synchronous. Input columns are read-only for
the duration of an evaluation and scratch state is private to a row, so a
compiled formula may be evaluated concurrently over disjoint row ranges
with no coordination.
*/

pub mod evaluator;
pub mod functions;
pub mod types;

pub use evaluator::ExpressionEvaluator;
pub use functions::BuiltinFunctions;
pub use types::CellValue;
