/*!
# Formula Error Handling

Error types for formula compilation and evaluation. Two classes reach the
caller through the diagnostic channel:

- **Parse errors**: malformed token streams, with the 0-based line of the
  offending token inside the (possibly multi-line) expression text.
- **Type errors**: well-formed ASTs whose operand or argument types violate
  an operator's or function's contract. Every type failure surfaces with a
  single fixed message so hosts can match on it; the detailed reason is
  kept on the error value for logging.

Neither class is ever raised across the batch API: a failing expression is
reported as a [`Diagnostic`] and excluded from the expression schema, and
other expressions in the batch proceed.

Execution errors exist for conditions the type system permits but the
evaluator cannot honor (a column batch missing a bound column, a scratch
array read out of bounds). They indicate a defect in the calling sequence
rather than in the expression text.
*/

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed message reported for every type-resolution failure.
pub const TYPE_ERROR_MESSAGE: &str = "Type Error - inputs do not resolve to a valid expression.";

/// Errors produced while compiling or evaluating a formula.
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaError {
    /// Lexical or grammatical error in the expression text.
    ParseError {
        /// Human-readable description of the failure
        message: String,
        /// 0-based line of the offending token within the expression text
        line: usize,
    },

    /// Operand or argument types violate an operator/function contract.
    ///
    /// The `detail` field carries the specific reason for logs; the
    /// diagnostic surface always shows [`TYPE_ERROR_MESSAGE`].
    TypeError {
        /// Internal description of which rule failed
        detail: String,
    },

    /// Runtime condition outside the expression's contract, e.g. a column
    /// batch that does not carry a bound column.
    ExecutionError {
        /// Description of the failure
        message: String,
    },
}

impl FormulaError {
    /// Create a parse error at a 0-based line.
    pub fn parse_error(message: impl Into<String>, line: usize) -> Self {
        FormulaError::ParseError {
            message: message.into(),
            line,
        }
    }

    /// Create a type error with an internal detail message.
    pub fn type_error(detail: impl Into<String>) -> Self {
        FormulaError::TypeError {
            detail: detail.into(),
        }
    }

    /// Create an execution error.
    pub fn execution_error(message: impl Into<String>) -> Self {
        FormulaError::ExecutionError {
            message: message.into(),
        }
    }
}

impl fmt::Display for FormulaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaError::ParseError { message, line } => {
                write!(f, "Parse error at line {}: {}", line, message)
            }
            FormulaError::TypeError { detail } => {
                write!(f, "{} ({})", TYPE_ERROR_MESSAGE, detail)
            }
            FormulaError::ExecutionError { message } => {
                write!(f, "Execution error: {}", message)
            }
        }
    }
}

impl std::error::Error for FormulaError {}

/// Result type for formula operations.
pub type FormulaResult<T> = Result<T, FormulaError>;

/// A reported compilation failure, addressed to the failing token inside
/// the expression text.
///
/// `column` is currently always 0; `line` is 0-based. Serializes for hosts
/// that relay validation results across an embedding boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Column of the failing token (0 when unknown)
    pub column: usize,
    /// 0-based line of the failing token within the expression text
    pub line: usize,
    /// Fixed text for type errors; parser-specific text for syntax errors
    pub error_message: String,
}

impl Diagnostic {
    /// Map a compile failure onto the diagnostic surface.
    ///
    /// Type errors collapse to the fixed message; parse errors keep their
    /// own message and line.
    pub fn from_error(error: &FormulaError) -> Self {
        match error {
            FormulaError::ParseError { message, line } => Diagnostic {
                column: 0,
                line: *line,
                error_message: message.clone(),
            },
            FormulaError::TypeError { .. } => Diagnostic {
                column: 0,
                line: 0,
                error_message: TYPE_ERROR_MESSAGE.to_string(),
            },
            FormulaError::ExecutionError { message } => Diagnostic {
                column: 0,
                line: 0,
                error_message: message.clone(),
            },
        }
    }
}
