/*!
Row-wise formula evaluation.

Executes a resolved AST against a read-only [`ColumnBatch`], one row at a
time. Each row gets a private scratch scope holding scalar variables and
fixed-size array slots; array slots reset to `Null` between rows so an
unmatched `find` on row N never leaks offsets from row N-1. Statements in
a block run strictly in textual order for their side effects.

The resolver has already accepted the expression, so any type mismatch
observed here is a defect in the calling sequence (e.g. a batch whose
column types differ from the schema the formula was compiled against) and
is reported as an execution error, never silently tolerated.
*/

use std::collections::HashMap;

use super::functions::{find_offsets, BuiltinFunctions};
use super::types::CellValue;
use crate::gridexpr::formula::ast::{BinaryOperator, Expr, LiteralValue, UnaryOperator};
use crate::gridexpr::formula::catalog::{find_function, FunctionKind};
use crate::gridexpr::formula::error::{FormulaError, FormulaResult};
use crate::gridexpr::table::column::{Column, ColumnBatch};
use crate::gridexpr::table::schema::ColumnType;

/// Per-row scratch storage for variables.
#[derive(Debug, Default)]
struct RowScope {
    scalars: HashMap<String, CellValue>,
    arrays: HashMap<String, Vec<CellValue>>,
}

impl RowScope {
    fn reset(&mut self) {
        self.scalars.clear();
        self.arrays.clear();
    }
}

/// Evaluates resolved expressions against column batches.
pub struct ExpressionEvaluator;

impl ExpressionEvaluator {
    /// Evaluate a resolved expression over every row of `batch`,
    /// materializing an output column of `output_type`.
    pub fn evaluate_column(
        expr: &Expr,
        output_type: ColumnType,
        batch: &ColumnBatch,
    ) -> FormulaResult<Column> {
        Self::evaluate_rows(expr, output_type, batch, 0..batch.num_rows())
    }

    /// Evaluate over a contiguous row range.
    ///
    /// Scratch state is private to this call, so disjoint ranges of the
    /// same batch may be evaluated concurrently with no coordination.
    pub fn evaluate_rows(
        expr: &Expr,
        output_type: ColumnType,
        batch: &ColumnBatch,
        rows: std::ops::Range<usize>,
    ) -> FormulaResult<Column> {
        let mut values = Vec::with_capacity(rows.len());
        let mut scope = RowScope::default();

        for row in rows {
            scope.reset();
            let value = Self::evaluate_cell(expr, batch, row, &mut scope)?;
            values.push(value.cast_to(output_type));
        }

        Ok(Column::from_values(output_type, values))
    }

    /// Evaluate one row.
    fn evaluate_cell(
        expr: &Expr,
        batch: &ColumnBatch,
        row: usize,
        scope: &mut RowScope,
    ) -> FormulaResult<CellValue> {
        match expr {
            Expr::Literal(literal) => Ok(Self::literal_value(literal)),
            Expr::Column(name) => {
                let column = batch.column(name).ok_or_else(|| {
                    FormulaError::execution_error(format!(
                        "column \"{}\" is missing from the batch",
                        name
                    ))
                })?;
                Ok(column.value(row).clone())
            }
            Expr::UnaryOp { op, expr } => {
                let value = Self::evaluate_cell(expr, batch, row, scope)?;
                match (op, value) {
                    (_, CellValue::Null) => Ok(CellValue::Null),
                    (UnaryOperator::Plus, value) => Ok(value),
                    (UnaryOperator::Minus, CellValue::Integer(i)) => Ok(CellValue::Integer(-i)),
                    (UnaryOperator::Minus, CellValue::Float(f)) => Ok(CellValue::Float(-f)),
                    (UnaryOperator::Minus, other) => Err(FormulaError::execution_error(
                        format!("cannot negate {}", other.type_name()),
                    )),
                }
            }
            Expr::BinaryOp { left, op, right } => {
                Self::evaluate_binary(left, *op, right, batch, row, scope)
            }
            Expr::Function { name, args } => {
                Self::evaluate_call(name, args, batch, row, scope)
            }
            Expr::VarDecl { name, size, init } => match (size, init) {
                (Some(len), _) => {
                    scope
                        .arrays
                        .insert(name.clone(), vec![CellValue::Null; *len]);
                    Ok(CellValue::Null)
                }
                (None, Some(init)) => {
                    let value = Self::evaluate_cell(init, batch, row, scope)?;
                    scope.scalars.insert(name.clone(), value.clone());
                    Ok(value)
                }
                (None, None) => {
                    scope.scalars.insert(name.clone(), CellValue::Null);
                    Ok(CellValue::Null)
                }
            },
            Expr::VarRef(name) => scope
                .scalars
                .get(name)
                .cloned()
                .ok_or_else(|| {
                    FormulaError::execution_error(format!("variable '{}' has no slot", name))
                }),
            Expr::Index { name, index } => {
                let slots = scope.arrays.get(name).ok_or_else(|| {
                    FormulaError::execution_error(format!("array '{}' has no slot", name))
                })?;
                slots.get(*index).cloned().ok_or_else(|| {
                    FormulaError::execution_error(format!(
                        "index {} out of bounds for array '{}'",
                        index, name
                    ))
                })
            }
            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition = Self::evaluate_cell(condition, batch, row, scope)?;
                match condition.truthy() {
                    None if condition.is_null() => Ok(CellValue::Null),
                    None => Err(FormulaError::execution_error(format!(
                        "condition evaluated to {}",
                        condition.type_name()
                    ))),
                    Some(true) => Self::evaluate_cell(then_branch, batch, row, scope),
                    Some(false) => Self::evaluate_cell(else_branch, batch, row, scope),
                }
            }
            Expr::Block(statements) => {
                let mut last = CellValue::Null;
                for statement in statements {
                    last = Self::evaluate_cell(statement, batch, row, scope)?;
                }
                Ok(last)
            }
        }
    }

    fn literal_value(literal: &LiteralValue) -> CellValue {
        match literal {
            LiteralValue::String(s) => CellValue::String(s.clone()),
            LiteralValue::Integer(i) => CellValue::Integer(*i),
            LiteralValue::Float(f) => CellValue::Float(*f),
            LiteralValue::Boolean(b) => CellValue::Boolean(*b),
            LiteralValue::Null => CellValue::Null,
        }
    }

    fn evaluate_binary(
        left: &Expr,
        op: BinaryOperator,
        right: &Expr,
        batch: &ColumnBatch,
        row: usize,
        scope: &mut RowScope,
    ) -> FormulaResult<CellValue> {
        // Two column references of different declared types compare to a
        // fixed result for every row, independent of the values.
        if op.is_equality() {
            if let (Expr::Column(l), Expr::Column(r)) = (left, right) {
                let lt = Self::batch_column_type(batch, l)?;
                let rt = Self::batch_column_type(batch, r)?;
                if lt != rt {
                    return Ok(CellValue::Boolean(op == BinaryOperator::NotEqual));
                }
            }
        }

        let lhs = Self::evaluate_cell(left, batch, row, scope)?;
        let rhs = Self::evaluate_cell(right, batch, row, scope)?;

        match op {
            BinaryOperator::Add => lhs.add(&rhs),
            BinaryOperator::Subtract => lhs.subtract(&rhs),
            BinaryOperator::Multiply => lhs.multiply(&rhs),
            BinaryOperator::Divide => lhs.divide(&rhs),
            BinaryOperator::Modulo => lhs.modulo(&rhs),
            BinaryOperator::Power => lhs.power(&rhs),
            BinaryOperator::Equal => Ok(CellValue::Boolean(lhs.equals(&rhs))),
            BinaryOperator::NotEqual => Ok(CellValue::Boolean(!lhs.equals(&rhs))),
            BinaryOperator::LessThan
            | BinaryOperator::LessThanOrEqual
            | BinaryOperator::GreaterThan
            | BinaryOperator::GreaterThanOrEqual => match lhs.compare(&rhs)? {
                None => Ok(CellValue::Null),
                Some(ordering) => {
                    let holds = match op {
                        BinaryOperator::LessThan => ordering.is_lt(),
                        BinaryOperator::LessThanOrEqual => ordering.is_le(),
                        BinaryOperator::GreaterThan => ordering.is_gt(),
                        _ => ordering.is_ge(),
                    };
                    Ok(CellValue::Boolean(holds))
                }
            },
            BinaryOperator::And
            | BinaryOperator::Or
            | BinaryOperator::Xor
            | BinaryOperator::Nand
            | BinaryOperator::Nor => Self::evaluate_connective(op, &lhs, &rhs),
        }
    }

    /// Word connectives over truthy-coerced operands; `Null` propagates.
    fn evaluate_connective(
        op: BinaryOperator,
        lhs: &CellValue,
        rhs: &CellValue,
    ) -> FormulaResult<CellValue> {
        if lhs.is_null() || rhs.is_null() {
            return Ok(CellValue::Null);
        }
        let (a, b) = match (lhs.truthy(), rhs.truthy()) {
            (Some(a), Some(b)) => (a, b),
            _ => {
                return Err(FormulaError::execution_error(format!(
                    "operator {} over {} and {}",
                    op,
                    lhs.type_name(),
                    rhs.type_name()
                )));
            }
        };
        let result = match op {
            BinaryOperator::And => a && b,
            BinaryOperator::Or => a || b,
            BinaryOperator::Xor => a != b,
            BinaryOperator::Nand => !(a && b),
            BinaryOperator::Nor => !(a || b),
            _ => unreachable!("connective operators only"),
        };
        Ok(CellValue::Boolean(result))
    }

    fn evaluate_call(
        name: &str,
        args: &[Expr],
        batch: &ColumnBatch,
        row: usize,
        scope: &mut RowScope,
    ) -> FormulaResult<CellValue> {
        let def = find_function(name).ok_or_else(|| {
            FormulaError::execution_error(format!("unknown function '{}'", name))
        })?;

        if def.kind == FunctionKind::Find {
            return Self::evaluate_find(args, batch, row, scope);
        }

        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(Self::evaluate_cell(arg, batch, row, scope)?);
        }
        BuiltinFunctions::evaluate(def.kind, &values)
    }

    /// `find(subject, pattern, out)`: search for the first occurrence and
    /// write the start/last character offsets into the array variable. On
    /// a miss (or a `Null` subject) the slots keep their per-row `Null`
    /// reset value.
    fn evaluate_find(
        args: &[Expr],
        batch: &ColumnBatch,
        row: usize,
        scope: &mut RowScope,
    ) -> FormulaResult<CellValue> {
        let subject = Self::evaluate_cell(&args[0], batch, row, scope)?;
        let pattern = match &args[1] {
            Expr::Literal(LiteralValue::String(p)) => p,
            other => {
                return Err(FormulaError::execution_error(format!(
                    "find pattern must be a string literal, got {:?}",
                    other
                )));
            }
        };
        let out = match &args[2] {
            Expr::VarRef(name) => name,
            other => {
                return Err(FormulaError::execution_error(format!(
                    "find output must be an array variable, got {:?}",
                    other
                )));
            }
        };

        let subject = match subject {
            CellValue::Null => return Ok(CellValue::Null),
            CellValue::String(s) => s,
            other => {
                return Err(FormulaError::execution_error(format!(
                    "find subject evaluated to {}",
                    other.type_name()
                )));
            }
        };

        match find_offsets(&subject, pattern)? {
            Some((start, last)) => {
                let slots = scope.arrays.get_mut(out).ok_or_else(|| {
                    FormulaError::execution_error(format!("array '{}' has no slot", out))
                })?;
                slots[0] = CellValue::Float(start as f64);
                slots[1] = CellValue::Float(last as f64);
                Ok(CellValue::Boolean(true))
            }
            None => Ok(CellValue::Boolean(false)),
        }
    }

    fn batch_column_type(batch: &ColumnBatch, name: &str) -> FormulaResult<ColumnType> {
        batch
            .column(name)
            .map(|c| c.column_type())
            .ok_or_else(|| {
                FormulaError::execution_error(format!(
                    "column \"{}\" is missing from the batch",
                    name
                ))
            })
    }
}
