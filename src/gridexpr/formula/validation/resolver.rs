/*!
Type resolution for parsed formulas.

Walks the AST against the table schema and the function catalog,
checking every operator and call contract and inferring variable types
from declarations and initializers. The resolver answers one question -
what column type does this formula produce - and fails the expression as
a unit otherwise.

Notable rules:

- equality between two *column references* of different declared types
  is accepted (it evaluates to a constant), while every other cross-type
  equality is an error;
- the variadic connectives `mand`/`mor` require boolean arguments even
  though the binary connectives accept truthy numerics;
- `match`/`find` patterns and `order` candidate lists must be string
  literals, so patterns bind once at compile time.
*/

use std::collections::BTreeMap;
use std::collections::HashMap;

use crate::gridexpr::formula::ast::{
    BinaryOperator, Expr, LiteralValue, ParsedFormula, UnaryOperator,
};
use crate::gridexpr::formula::catalog::{find_function, ArgSpec};
use crate::gridexpr::formula::error::{FormulaError, FormulaResult};
use crate::gridexpr::table::schema::{ColumnType, TableSchema};

/// Variable bindings introduced by `var` statements.
#[derive(Debug, Clone, PartialEq)]
enum VarBinding {
    /// Scalar variable; the type is known once initialized
    Scalar(Option<ColumnType>),
    /// Fixed-size array variable
    Array(usize),
}

/// Resolves a parsed formula to its output column type.
pub struct TypeResolver<'a> {
    schema: &'a TableSchema,
    vars: HashMap<String, VarBinding>,
    referenced: BTreeMap<String, ColumnType>,
}

impl<'a> TypeResolver<'a> {
    pub fn new(schema: &'a TableSchema) -> Self {
        TypeResolver {
            schema,
            vars: HashMap::new(),
            referenced: BTreeMap::new(),
        }
    }

    /// Resolve the formula's output type; fails the expression as a unit.
    pub fn resolve(&mut self, formula: &ParsedFormula) -> FormulaResult<ColumnType> {
        match self.resolve_expr(&formula.body)? {
            Some(ty) => Ok(ty),
            None => Err(FormulaError::type_error(
                "expression does not produce a typed value",
            )),
        }
    }

    /// Columns the formula read, with their declared types. Valid after
    /// a successful [`resolve`](Self::resolve).
    pub fn referenced_columns(&self) -> impl Iterator<Item = (&String, &ColumnType)> {
        self.referenced.iter()
    }

    /// Resolve one node. `None` marks the untyped `null` literal and
    /// value-less statements (bare declarations).
    fn resolve_expr(&mut self, expr: &Expr) -> FormulaResult<Option<ColumnType>> {
        match expr {
            Expr::Literal(literal) => Ok(literal_type(literal)),
            Expr::Column(name) => {
                let ty = self.schema.column_type(name).ok_or_else(|| {
                    FormulaError::type_error(format!("unknown column \"{}\"", name))
                })?;
                self.referenced.insert(name.clone(), ty);
                Ok(Some(ty))
            }
            Expr::UnaryOp { op, expr } => self.resolve_unary(*op, expr),
            Expr::BinaryOp { left, op, right } => self.resolve_binary(left, *op, right),
            Expr::Function { name, args } => self.resolve_call(name, args),
            Expr::VarDecl { name, size, init } => self.resolve_var_decl(name, *size, init),
            Expr::VarRef(name) => self.resolve_var_ref(name),
            Expr::Index { name, index } => self.resolve_index(name, *index),
            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => self.resolve_conditional(condition, then_branch, else_branch),
            Expr::Block(statements) => {
                let mut last = None;
                for statement in statements {
                    last = self.resolve_expr(statement)?;
                }
                Ok(last)
            }
        }
    }

    fn resolve_unary(&mut self, op: UnaryOperator, expr: &Expr) -> FormulaResult<Option<ColumnType>> {
        let ty = self.resolve_expr(expr)?;
        match ty {
            Some(t) if t.is_numeric() => Ok(Some(t)),
            _ => Err(FormulaError::type_error(format!(
                "unary {} requires a numeric operand",
                match op {
                    UnaryOperator::Plus => "+",
                    UnaryOperator::Minus => "-",
                }
            ))),
        }
    }

    fn resolve_binary(
        &mut self,
        left: &Expr,
        op: BinaryOperator,
        right: &Expr,
    ) -> FormulaResult<Option<ColumnType>> {
        if op.is_equality() {
            return self.resolve_equality(left, right);
        }

        let lhs = self.resolve_expr(left)?;
        let rhs = self.resolve_expr(right)?;

        if op.is_arithmetic() {
            return match (lhs, rhs) {
                (Some(l), Some(r)) if l.is_numeric() && r.is_numeric() => {
                    if matches!(op, BinaryOperator::Divide | BinaryOperator::Power) {
                        Ok(Some(ColumnType::Float))
                    } else {
                        Ok(Some(l.promote(r)))
                    }
                }
                _ => Err(FormulaError::type_error(format!(
                    "operator {} requires numeric operands",
                    op
                ))),
            };
        }

        if op.is_ordering() {
            return match (lhs, rhs) {
                (Some(l), Some(r)) if l.is_numeric() && r.is_numeric() => {
                    Ok(Some(ColumnType::Boolean))
                }
                (Some(l), Some(r)) if l == r => Ok(Some(ColumnType::Boolean)),
                _ => Err(FormulaError::type_error(format!(
                    "operator {} requires comparable operands of one type",
                    op
                ))),
            };
        }

        // Word connectives: boolean or truthy-coercible numeric operands.
        for side in [lhs, rhs] {
            match side {
                Some(ColumnType::Boolean) => {}
                Some(t) if t.is_numeric() => {}
                _ => {
                    return Err(FormulaError::type_error(format!(
                        "operator {} requires boolean or numeric operands",
                        op
                    )));
                }
            }
        }
        Ok(Some(ColumnType::Boolean))
    }

    /// `==`/`!=` typing. Mismatched *column references* are accepted -
    /// they evaluate to a fixed boolean regardless of row content - while
    /// any other cross-type pairing outside numeric promotion fails.
    fn resolve_equality(&mut self, left: &Expr, right: &Expr) -> FormulaResult<Option<ColumnType>> {
        let lhs = self.resolve_expr(left)?;
        let rhs = self.resolve_expr(right)?;

        if matches!(left, Expr::Column(_)) && matches!(right, Expr::Column(_)) {
            return Ok(Some(ColumnType::Boolean));
        }

        match (lhs, rhs) {
            (None, _) | (_, None) => Ok(Some(ColumnType::Boolean)),
            (Some(l), Some(r)) if l == r => Ok(Some(ColumnType::Boolean)),
            (Some(l), Some(r)) if l.is_numeric() && r.is_numeric() => {
                Ok(Some(ColumnType::Boolean))
            }
            (Some(l), Some(r)) => Err(FormulaError::type_error(format!(
                "cannot compare {} with {}",
                l, r
            ))),
        }
    }

    fn resolve_call(&mut self, name: &str, args: &[Expr]) -> FormulaResult<Option<ColumnType>> {
        let def = find_function(name).ok_or_else(|| {
            FormulaError::type_error(format!("unknown function '{}'", name))
        })?;

        let mut specs = Vec::with_capacity(args.len());
        for arg in args {
            specs.push(self.resolve_arg(arg)?);
        }
        def.result_type(&specs).map(Some)
    }

    /// Resolve one call argument into the shape the catalog checks:
    /// its type, its literal value when it is a bare literal, and its
    /// declared length when it names an array variable.
    fn resolve_arg(&mut self, arg: &Expr) -> FormulaResult<ArgSpec> {
        match arg {
            Expr::Literal(literal) => Ok(ArgSpec {
                ty: literal_type(literal),
                literal: Some(literal.clone()),
                array_len: None,
            }),
            Expr::VarRef(name) => match self.vars.get(name) {
                Some(VarBinding::Array(len)) => Ok(ArgSpec {
                    ty: None,
                    literal: None,
                    array_len: Some(*len),
                }),
                _ => {
                    let ty = self.resolve_expr(arg)?;
                    Ok(ArgSpec {
                        ty,
                        literal: None,
                        array_len: None,
                    })
                }
            },
            _ => {
                let ty = self.resolve_expr(arg)?;
                Ok(ArgSpec {
                    ty,
                    literal: None,
                    array_len: None,
                })
            }
        }
    }

    fn resolve_var_decl(
        &mut self,
        name: &str,
        size: Option<usize>,
        init: &Option<Box<Expr>>,
    ) -> FormulaResult<Option<ColumnType>> {
        if self.vars.contains_key(name) {
            return Err(FormulaError::type_error(format!(
                "variable '{}' is already declared",
                name
            )));
        }
        if self.schema.contains(name) {
            // Shadowing a column name would make "x" vs x ambiguous to a
            // reader even though the grammar keeps them distinct.
            log::debug!("variable '{}' shadows a column of the same name", name);
        }

        match (size, init) {
            (Some(len), None) => {
                self.vars.insert(name.to_string(), VarBinding::Array(len));
                Ok(None)
            }
            (None, Some(init)) => {
                let ty = self.resolve_expr(init)?;
                let ty = ty.ok_or_else(|| {
                    FormulaError::type_error(format!(
                        "variable '{}' cannot be initialized from an untyped expression",
                        name
                    ))
                })?;
                self.vars
                    .insert(name.to_string(), VarBinding::Scalar(Some(ty)));
                Ok(Some(ty))
            }
            (None, None) => {
                self.vars.insert(name.to_string(), VarBinding::Scalar(None));
                Ok(None)
            }
            (Some(_), Some(_)) => Err(FormulaError::type_error(format!(
                "array variable '{}' cannot take an initializer",
                name
            ))),
        }
    }

    fn resolve_var_ref(&mut self, name: &str) -> FormulaResult<Option<ColumnType>> {
        match self.vars.get(name) {
            Some(VarBinding::Scalar(Some(ty))) => Ok(Some(*ty)),
            Some(VarBinding::Scalar(None)) => Err(FormulaError::type_error(format!(
                "variable '{}' is used before it has a value",
                name
            ))),
            Some(VarBinding::Array(_)) => Err(FormulaError::type_error(format!(
                "array variable '{}' must be read with an index",
                name
            ))),
            None => Err(FormulaError::type_error(format!(
                "variable '{}' is not declared",
                name
            ))),
        }
    }

    fn resolve_index(&mut self, name: &str, index: usize) -> FormulaResult<Option<ColumnType>> {
        match self.vars.get(name) {
            Some(VarBinding::Array(len)) => {
                if index >= *len {
                    Err(FormulaError::type_error(format!(
                        "index {} is out of bounds for '{}[{}]'",
                        index, name, len
                    )))
                } else {
                    // Array slots hold offsets written by find; they read
                    // back as floats.
                    Ok(Some(ColumnType::Float))
                }
            }
            Some(_) => Err(FormulaError::type_error(format!(
                "'{}' is not an array variable",
                name
            ))),
            None => Err(FormulaError::type_error(format!(
                "variable '{}' is not declared",
                name
            ))),
        }
    }

    fn resolve_conditional(
        &mut self,
        condition: &Expr,
        then_branch: &Expr,
        else_branch: &Expr,
    ) -> FormulaResult<Option<ColumnType>> {
        match self.resolve_expr(condition)? {
            Some(ColumnType::Boolean) => {}
            Some(t) if t.is_numeric() => {}
            _ => {
                return Err(FormulaError::type_error(
                    "conditional requires a boolean or numeric condition",
                ));
            }
        }

        let then_ty = self.resolve_expr(then_branch)?;
        let else_ty = self.resolve_expr(else_branch)?;
        match (then_ty, else_ty) {
            (Some(t), Some(e)) if t == e => Ok(Some(t)),
            (Some(t), Some(e)) if t.is_numeric() && e.is_numeric() => Ok(Some(t.promote(e))),
            (Some(t), None) => Ok(Some(t)),
            (None, Some(e)) => Ok(Some(e)),
            (None, None) => Ok(None),
            (Some(t), Some(e)) => Err(FormulaError::type_error(format!(
                "conditional arms have incompatible types {} and {}",
                t, e
            ))),
        }
    }
}

/// Syntactic type of a literal; `None` for `null`.
fn literal_type(literal: &LiteralValue) -> Option<ColumnType> {
    match literal {
        LiteralValue::String(_) => Some(ColumnType::String),
        LiteralValue::Integer(_) => Some(ColumnType::Integer),
        LiteralValue::Float(_) => Some(ColumnType::Float),
        LiteralValue::Boolean(_) => Some(ColumnType::Boolean),
        LiteralValue::Null => None,
    }
}
