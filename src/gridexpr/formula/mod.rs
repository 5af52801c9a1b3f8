/*!
# Formula Language

The expression language for computed columns. A formula is a short text
string referencing existing columns, literals, and a fixed library of
functions. Compilation runs in three phases over the same immutable
schema:

1. **Parse** - [`parser`] turns the text into an AST, capturing an
   optional `//name` output directive.
2. **Resolve** - [`validation`] walks the AST against the schema and the
   function [`catalog`], producing a resolved output type or a diagnostic.
3. **Evaluate** - [`execution`] runs the compiled formula row-wise over a
   read-only column batch.

Batch entry points ([`validate_expressions`], [`compute_columns`]) never
fail as a whole: each submitted expression lands either in the expression
schema or in the error map, and one failing expression does not block the
others.
*/

pub mod ast;
pub mod catalog;
pub mod compile;
pub mod error;
pub mod execution;
pub mod parser;
pub mod validation;

pub use compile::{
    compute_columns, validate_expressions, CompiledFormula, ComputedColumns, ExpressionValidation,
};
pub use error::{Diagnostic, FormulaError, FormulaResult};
