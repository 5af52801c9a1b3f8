/*!
# Formula Abstract Syntax Tree

AST produced by the parser and consumed by the type resolver and the
evaluator. Nodes are immutable and owned exclusively by the compiled
formula they belong to; nothing is shared across expressions.

A formula is a sequence of statements separated by `;`. Non-final
statements exist for their bindings and side effects (declaring variables,
filling a fixed-size array through `find`); the final statement's value
becomes the output column. A leading `//name` line is not part of the tree
- the parser strips it into [`ParsedFormula::alias`].
*/

use std::fmt;

/// A parsed formula: the root expression plus the optional output name
/// taken from a leading `//name` directive line.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFormula {
    /// Output name from the directive, if one was present
    pub alias: Option<String>,
    /// Root of the expression tree (a `Block` when multi-statement)
    pub body: Expr,
}

/// Expression tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value: `'abc'`, `42`, `1.5`, `True`, `null`
    Literal(LiteralValue),
    /// Column reference: `"price"`
    Column(String),
    /// Unary operation: `-expr`, `+expr`
    UnaryOp { op: UnaryOperator, expr: Box<Expr> },
    /// Binary operation: `expr op expr`
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },
    /// Function call: `name(args...)`
    Function { name: String, args: Vec<Expr> },
    /// Variable declaration: `var x;`, `var x[2];`, `var x := expr;`
    VarDecl {
        name: String,
        /// Fixed array size for `var x[n];` declarations
        size: Option<usize>,
        /// Initializer for `var x := expr;` declarations
        init: Option<Box<Expr>>,
    },
    /// Scalar variable read: `x`
    VarRef(String),
    /// Array element read with a literal index: `x[1]`
    Index { name: String, index: usize },
    /// Two-armed conditional: `if (c) a; else b;` or `c ? a : b`
    Conditional {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    /// Statement sequence; evaluates to the last statement's value
    Block(Vec<Expr>),
}

/// Literal values in formula text.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::String(s) => write!(f, "'{}'", s),
            LiteralValue::Integer(i) => write!(f, "{}", i),
            LiteralValue::Float(v) => write!(f, "{}", v),
            LiteralValue::Boolean(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            LiteralValue::Null => write!(f, "null"),
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,

    // Boolean connectives
    And,
    Or,
    Xor,
    Nand,
    Nor,
}

impl BinaryOperator {
    /// True for `+ - * / % ^`.
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Add
                | BinaryOperator::Subtract
                | BinaryOperator::Multiply
                | BinaryOperator::Divide
                | BinaryOperator::Modulo
                | BinaryOperator::Power
        )
    }

    /// True for `== !=`.
    pub fn is_equality(&self) -> bool {
        matches!(self, BinaryOperator::Equal | BinaryOperator::NotEqual)
    }

    /// True for `< <= > >=`.
    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            BinaryOperator::LessThan
                | BinaryOperator::LessThanOrEqual
                | BinaryOperator::GreaterThan
                | BinaryOperator::GreaterThanOrEqual
        )
    }

    /// True for the word connectives `and or xor nand nor`.
    pub fn is_connective(&self) -> bool {
        matches!(
            self,
            BinaryOperator::And
                | BinaryOperator::Or
                | BinaryOperator::Xor
                | BinaryOperator::Nand
                | BinaryOperator::Nor
        )
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Power => "^",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessThanOrEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterThanOrEqual => ">=",
            BinaryOperator::And => "and",
            BinaryOperator::Or => "or",
            BinaryOperator::Xor => "xor",
            BinaryOperator::Nand => "nand",
            BinaryOperator::Nor => "nor",
        };
        write!(f, "{}", symbol)
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Plus,
    Minus,
}
