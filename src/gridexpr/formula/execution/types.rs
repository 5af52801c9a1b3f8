/*!
Core value type for formula evaluation.

[`CellValue`] is the tagged union flowing through the evaluator: one
variant per column type plus a first-class `Null`. Null is a value, not a
sentinel - no NaN-as-null, no empty-string-as-null - which keeps the
propagation rules explicit:

- arithmetic, string operations, and most functions produce `Null` when
  any input is `Null`;
- division and modulo by a true zero produce `Null`, never an infinity,
  NaN, or error;
- equality treats two `Null`s as equal and a single `Null` as unequal to
  everything.
*/

use chrono::{NaiveDate, NaiveDateTime};
use std::cmp::Ordering;
use std::fmt;

use crate::gridexpr::formula::error::{FormulaError, FormulaResult};
use crate::gridexpr::table::schema::ColumnType;

/// A value in a single table cell or intermediate expression slot.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Missing value
    Null,
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit floating point number
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Boolean value
    Boolean(bool),
    /// Calendar date
    Date(NaiveDate),
    /// Date and time of day
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// Type name for error messages and debugging.
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Null => "null",
            CellValue::Integer(_) => "integer",
            CellValue::Float(_) => "float",
            CellValue::String(_) => "string",
            CellValue::Boolean(_) => "boolean",
            CellValue::Date(_) => "date",
            CellValue::DateTime(_) => "datetime",
        }
    }

    /// The column type this value inhabits; `None` for `Null`.
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            CellValue::Null => None,
            CellValue::Integer(_) => Some(ColumnType::Integer),
            CellValue::Float(_) => Some(ColumnType::Float),
            CellValue::String(_) => Some(ColumnType::String),
            CellValue::Boolean(_) => Some(ColumnType::Boolean),
            CellValue::Date(_) => Some(ColumnType::Date),
            CellValue::DateTime(_) => Some(ColumnType::DateTime),
        }
    }

    /// True for the `Null` variant.
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// True for integer and float values.
    pub fn is_numeric(&self) -> bool {
        matches!(self, CellValue::Integer(_) | CellValue::Float(_))
    }

    /// Numeric value as `f64`; `None` for non-numerics.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Truthiness for connective operands: booleans as-is, numerics by
    /// nonzero test. `None` for `Null` and for types with no truthiness
    /// rule (the resolver rejects those before evaluation).
    pub fn truthy(&self) -> Option<bool> {
        match self {
            CellValue::Boolean(b) => Some(*b),
            CellValue::Integer(i) => Some(*i != 0),
            CellValue::Float(f) => Some(*f != 0.0),
            _ => None,
        }
    }

    /// Widen this value into `target` when materializing an output column.
    ///
    /// The only real conversion is integer-to-float; everything else
    /// already matches its resolved type. `Null` survives unchanged.
    pub fn cast_to(self, target: ColumnType) -> CellValue {
        match (self, target) {
            (CellValue::Integer(i), ColumnType::Float) => CellValue::Float(i as f64),
            (value, _) => value,
        }
    }

    /// Add two values with numeric promotion; `Null` propagates.
    pub fn add(&self, other: &CellValue) -> FormulaResult<CellValue> {
        match (self, other) {
            (CellValue::Integer(a), CellValue::Integer(b)) => Ok(CellValue::Integer(a + b)),
            (CellValue::Float(a), CellValue::Float(b)) => Ok(CellValue::Float(a + b)),
            (CellValue::Integer(a), CellValue::Float(b)) => Ok(CellValue::Float(*a as f64 + b)),
            (CellValue::Float(a), CellValue::Integer(b)) => Ok(CellValue::Float(a + *b as f64)),
            (CellValue::Null, _) | (_, CellValue::Null) => Ok(CellValue::Null),
            _ => Err(self.binary_type_defect("add", other)),
        }
    }

    /// Subtract with numeric promotion; `Null` propagates.
    pub fn subtract(&self, other: &CellValue) -> FormulaResult<CellValue> {
        match (self, other) {
            (CellValue::Integer(a), CellValue::Integer(b)) => Ok(CellValue::Integer(a - b)),
            (CellValue::Float(a), CellValue::Float(b)) => Ok(CellValue::Float(a - b)),
            (CellValue::Integer(a), CellValue::Float(b)) => Ok(CellValue::Float(*a as f64 - b)),
            (CellValue::Float(a), CellValue::Integer(b)) => Ok(CellValue::Float(a - *b as f64)),
            (CellValue::Null, _) | (_, CellValue::Null) => Ok(CellValue::Null),
            _ => Err(self.binary_type_defect("subtract", other)),
        }
    }

    /// Multiply with numeric promotion; `Null` propagates.
    pub fn multiply(&self, other: &CellValue) -> FormulaResult<CellValue> {
        match (self, other) {
            (CellValue::Integer(a), CellValue::Integer(b)) => Ok(CellValue::Integer(a * b)),
            (CellValue::Float(a), CellValue::Float(b)) => Ok(CellValue::Float(a * b)),
            (CellValue::Integer(a), CellValue::Float(b)) => Ok(CellValue::Float(*a as f64 * b)),
            (CellValue::Float(a), CellValue::Integer(b)) => Ok(CellValue::Float(a * *b as f64)),
            (CellValue::Null, _) | (_, CellValue::Null) => Ok(CellValue::Null),
            _ => Err(self.binary_type_defect("multiply", other)),
        }
    }

    /// Divide, always producing a float. Division by a true zero yields
    /// `Null` for that row; `Null` operands propagate.
    pub fn divide(&self, other: &CellValue) -> FormulaResult<CellValue> {
        match (self.as_f64(), other.as_f64()) {
            (Some(_), Some(b)) if b == 0.0 => Ok(CellValue::Null),
            (Some(a), Some(b)) => Ok(CellValue::Float(a / b)),
            _ => match (self, other) {
                (CellValue::Null, _) | (_, CellValue::Null) => Ok(CellValue::Null),
                _ => Err(self.binary_type_defect("divide", other)),
            },
        }
    }

    /// Remainder with numeric promotion. Modulo by a true zero yields
    /// `Null` for that row; `Null` operands propagate.
    pub fn modulo(&self, other: &CellValue) -> FormulaResult<CellValue> {
        match (self, other) {
            (CellValue::Null, _) | (_, CellValue::Null) => Ok(CellValue::Null),
            (CellValue::Integer(a), CellValue::Integer(b)) => {
                if *b == 0 {
                    Ok(CellValue::Null)
                } else {
                    Ok(CellValue::Integer(a % b))
                }
            }
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(_), Some(b)) if b == 0.0 => Ok(CellValue::Null),
                (Some(a), Some(b)) => Ok(CellValue::Float(a % b)),
                _ => Err(self.binary_type_defect("modulo", other)),
            },
        }
    }

    /// Exponentiation, always producing a float; `Null` propagates.
    pub fn power(&self, other: &CellValue) -> FormulaResult<CellValue> {
        match (self, other) {
            (CellValue::Null, _) | (_, CellValue::Null) => Ok(CellValue::Null),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => Ok(CellValue::Float(a.powf(b))),
                _ => Err(self.binary_type_defect("power", other)),
            },
        }
    }

    /// Value equality for `==`.
    ///
    /// `Null == Null` is true and `Null == v` is false, diverging from
    /// propagate-on-null. Mixed integer/float operands compare as floats
    /// (literal coercion); the constant-false rule for two column
    /// references of different declared types is applied by the evaluator
    /// before values are ever read.
    pub fn equals(&self, other: &CellValue) -> bool {
        match (self, other) {
            (CellValue::Null, CellValue::Null) => true,
            (CellValue::Null, _) | (_, CellValue::Null) => false,
            (CellValue::Integer(a), CellValue::Integer(b)) => a == b,
            (CellValue::Float(a), CellValue::Float(b)) => a == b,
            (CellValue::Integer(a), CellValue::Float(b)) => (*a as f64) == *b,
            (CellValue::Float(a), CellValue::Integer(b)) => *a == (*b as f64),
            (CellValue::String(a), CellValue::String(b)) => a == b,
            (CellValue::Boolean(a), CellValue::Boolean(b)) => a == b,
            (CellValue::Date(a), CellValue::Date(b)) => a == b,
            (CellValue::DateTime(a), CellValue::DateTime(b)) => a == b,
            _ => false,
        }
    }

    /// Ordering comparison for `<` `<=` `>` `>=`.
    ///
    /// Numerics promote; strings compare lexicographically, dates
    /// chronologically. `None` when either side is `Null` (the comparison
    /// result is `Null` for that row).
    pub fn compare(&self, other: &CellValue) -> FormulaResult<Option<Ordering>> {
        match (self, other) {
            (CellValue::Null, _) | (_, CellValue::Null) => Ok(None),
            (CellValue::Integer(a), CellValue::Integer(b)) => Ok(Some(a.cmp(b))),
            (CellValue::Float(a), CellValue::Float(b)) => Ok(a.partial_cmp(b)),
            (CellValue::Integer(a), CellValue::Float(b)) => Ok((*a as f64).partial_cmp(b)),
            (CellValue::Float(a), CellValue::Integer(b)) => Ok(a.partial_cmp(&(*b as f64))),
            (CellValue::String(a), CellValue::String(b)) => Ok(Some(a.cmp(b))),
            (CellValue::Boolean(a), CellValue::Boolean(b)) => Ok(Some(a.cmp(b))),
            (CellValue::Date(a), CellValue::Date(b)) => Ok(Some(a.cmp(b))),
            (CellValue::DateTime(a), CellValue::DateTime(b)) => Ok(Some(a.cmp(b))),
            _ => Err(self.binary_type_defect("compare", other)),
        }
    }

    /// Clean display string, SQL-like: dates in ISO form, `NULL` for null.
    pub fn to_display_string(&self) -> String {
        match self {
            CellValue::Null => "NULL".to_string(),
            CellValue::Integer(i) => i.to_string(),
            CellValue::Float(f) => f.to_string(),
            CellValue::String(s) => s.clone(),
            CellValue::Boolean(b) => b.to_string(),
            CellValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            CellValue::DateTime(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    fn binary_type_defect(&self, op: &str, other: &CellValue) -> FormulaError {
        FormulaError::execution_error(format!(
            "cannot {} {} and {}",
            op,
            self.type_name(),
            other.type_name()
        ))
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}
