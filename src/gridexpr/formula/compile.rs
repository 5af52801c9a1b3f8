/*!
Compilation and the batch entry points.

A [`CompiledFormula`] is an AST plus its resolved output type and the
column bindings captured at compile time. It is immutable once produced
and may be evaluated many times - and concurrently - as the underlying
column data changes, as long as the schema it was compiled against is
unchanged. [`CompiledFormula::matches_schema`] is the cheap staleness
check hosts run after a schema edit.

The batch functions implement the external contract: every submitted
expression lands in exactly one of `expression_schema` (keyed by its
output name) or `errors` (keyed by its raw text), and nothing here ever
panics or returns a top-level error for malformed input.
*/

use std::collections::HashMap;

use super::ast::{Expr, ParsedFormula};
use super::error::{Diagnostic, FormulaError, FormulaResult};
use super::execution::evaluator::ExpressionEvaluator;
use super::parser::parse;
use super::validation::TypeResolver;
use crate::gridexpr::table::column::{Column, ColumnBatch};
use crate::gridexpr::table::schema::{ColumnType, TableSchema};

/// A formula compiled against one schema: AST, resolved output type, and
/// the referenced column bindings.
#[derive(Debug, Clone)]
pub struct CompiledFormula {
    text: String,
    alias: Option<String>,
    body: Expr,
    output_type: ColumnType,
    referenced: Vec<(String, ColumnType)>,
}

impl CompiledFormula {
    /// Parse and type-resolve `text` against `schema`.
    pub fn compile(text: &str, schema: &TableSchema) -> FormulaResult<Self> {
        let parsed = parse(text)?;
        let mut resolver = TypeResolver::new(schema);
        let output_type = resolver.resolve(&parsed)?;
        let referenced = resolver
            .referenced_columns()
            .map(|(name, ty)| (name.clone(), *ty))
            .collect();
        let ParsedFormula { alias, body } = parsed;
        Ok(CompiledFormula {
            text: text.to_string(),
            alias,
            body,
            output_type,
            referenced,
        })
    }

    /// The name this formula's output column is published under: the
    /// `//name` directive when present, otherwise the raw expression text.
    pub fn output_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.text)
    }

    /// Raw expression text as submitted.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Resolved output column type.
    pub fn output_type(&self) -> ColumnType {
        self.output_type
    }

    /// Columns the formula reads, with the types it was compiled against.
    pub fn referenced_columns(&self) -> &[(String, ColumnType)] {
        &self.referenced
    }

    /// True when `schema` still declares every referenced column with the
    /// type this formula was compiled against. A false result means the
    /// formula is stale and must be recompiled.
    pub fn matches_schema(&self, schema: &TableSchema) -> bool {
        self.referenced
            .iter()
            .all(|(name, ty)| schema.column_type(name) == Some(*ty))
    }

    /// Evaluate over every row of `batch`, producing the output column.
    pub fn evaluate(&self, batch: &ColumnBatch) -> FormulaResult<Column> {
        ExpressionEvaluator::evaluate_column(&self.body, self.output_type, batch)
    }

    /// Evaluate a contiguous row range of `batch`.
    ///
    /// Workers may split a batch into disjoint ranges and evaluate them
    /// concurrently against the same compiled formula.
    pub fn evaluate_rows(
        &self,
        batch: &ColumnBatch,
        rows: std::ops::Range<usize>,
    ) -> FormulaResult<Column> {
        ExpressionEvaluator::evaluate_rows(&self.body, self.output_type, batch, rows)
    }
}

/// Result of validating a batch of expressions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpressionValidation {
    /// Output name -> resolved type, for every expression that compiled
    pub expression_schema: HashMap<String, ColumnType>,
    /// Raw expression text -> diagnostic, for every expression that failed
    pub errors: HashMap<String, Diagnostic>,
}

/// Result of compiling and evaluating a batch of expressions.
#[derive(Debug, Clone, Default)]
pub struct ComputedColumns {
    /// Output name -> materialized column
    pub output_columns: HashMap<String, Column>,
    /// Output name -> resolved type
    pub expression_schema: HashMap<String, ColumnType>,
    /// Raw expression text -> diagnostic
    pub errors: HashMap<String, Diagnostic>,
}

/// Validate a batch of expressions against a schema.
///
/// Never fails as a whole: each expression lands in the expression schema
/// or the error map, and failures do not block other expressions.
pub fn validate_expressions(
    schema: &TableSchema,
    expressions: &[impl AsRef<str>],
) -> ExpressionValidation {
    let mut result = ExpressionValidation::default();

    for text in expressions {
        let text = text.as_ref();
        match CompiledFormula::compile(text, schema) {
            Ok(formula) => {
                result
                    .expression_schema
                    .insert(formula.output_name().to_string(), formula.output_type());
            }
            Err(error) => {
                log::debug!("expression '{}' failed to compile: {}", text, error);
                result
                    .errors
                    .insert(text.to_string(), Diagnostic::from_error(&error));
            }
        }
    }

    result
}

/// Compile and evaluate a batch of expressions over a column batch.
///
/// Same per-expression independence as [`validate_expressions`], plus a
/// materialized output column for every expression that compiled.
pub fn compute_columns(
    schema: &TableSchema,
    batch: &ColumnBatch,
    expressions: &[impl AsRef<str>],
) -> ComputedColumns {
    let mut result = ComputedColumns::default();

    for text in expressions {
        let text = text.as_ref();
        let formula = match CompiledFormula::compile(text, schema) {
            Ok(formula) => formula,
            Err(error) => {
                log::debug!("expression '{}' failed to compile: {}", text, error);
                result
                    .errors
                    .insert(text.to_string(), Diagnostic::from_error(&error));
                continue;
            }
        };

        match formula.evaluate(batch) {
            Ok(column) => {
                let name = formula.output_name().to_string();
                result
                    .expression_schema
                    .insert(name.clone(), formula.output_type());
                result.output_columns.insert(name, column);
            }
            Err(error) => {
                // The resolver accepted this expression; an evaluation
                // failure means the batch disagrees with the schema.
                log::warn!("expression '{}' failed to evaluate: {}", text, error);
                result
                    .errors
                    .insert(text.to_string(), Diagnostic::from_error(&error));
            }
        }
    }

    result
}

impl From<FormulaError> for Diagnostic {
    fn from(error: FormulaError) -> Self {
        Diagnostic::from_error(&error)
    }
}
