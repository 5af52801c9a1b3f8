/*!
# Function Catalog

The closed registry of built-in formula functions. Each entry declares its
arity range, the rule its argument types must satisfy, its result-type
rule, and (implicitly, by kind) its null-propagation behavior. The catalog
is a capability set: the parser and evaluator never look functions up
anywhere else, and the type rules here are unit-testable without either.

Variadic numeric functions (`min`, `max`, `avg`, `sum`) share a single
descriptor with an explicit promotion rule over the resolved argument
types - the result is float exactly when some argument is float - rather
than per-arity overloads.
*/

use std::collections::HashMap;
use std::sync::LazyLock;

use super::ast::LiteralValue;
use super::error::{FormulaError, FormulaResult};
use super::execution::functions::cached_regex;
use crate::gridexpr::table::schema::ColumnType;

/// Evaluator dispatch tag; one per built-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Min,
    Max,
    Avg,
    Sum,
    Pow,
    Logn,
    Root,
    Trunc,
    Deg2Rad,
    Rad2Deg,
    IsNull,
    IsNotNull,
    PercentOf,
    Bucket,
    Length,
    Order,
    Upper,
    Lower,
    Concat,
    Match,
    Find,
    Mand,
    Mor,
    Inrange,
    Iclamp,
    Today,
    Now,
}

/// Categories of built-in functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionCategory {
    /// Numeric operations (min, pow, bucket, ...)
    Numeric,
    /// String operations (concat, upper, order, match, find, ...)
    String,
    /// Boolean combinators (mand, mor) and null tests
    Boolean,
    /// Date/time constants (today, now)
    DateTime,
}

/// A built-in function descriptor.
#[derive(Debug, Clone, Copy)]
pub struct FunctionDef {
    /// Function name as written in formula text
    pub name: &'static str,
    /// Evaluator dispatch tag
    pub kind: FunctionKind,
    /// Minimum accepted argument count
    pub min_args: usize,
    /// Maximum accepted argument count; `None` for variadic
    pub max_args: Option<usize>,
    /// Category for catalog organization
    pub category: FunctionCategory,
}

/// What the type resolver knows about one resolved argument.
#[derive(Debug, Clone)]
pub struct ArgSpec {
    /// Resolved type; `None` for the `null` literal
    pub ty: Option<ColumnType>,
    /// The literal value, when the argument is a bare literal
    pub literal: Option<LiteralValue>,
    /// Declared length, when the argument names a fixed-size array variable
    pub array_len: Option<usize>,
}

impl ArgSpec {
    /// A plain typed argument (column, computed expression, variable).
    pub fn typed(ty: ColumnType) -> Self {
        ArgSpec {
            ty: Some(ty),
            literal: None,
            array_len: None,
        }
    }

    fn is_numeric(&self) -> bool {
        self.ty.is_some_and(|t| t.is_numeric())
    }
}

/// The closed set of built-in functions.
pub static BUILTIN_FUNCTIONS: &[FunctionDef] = &[
    FunctionDef {
        name: "min",
        kind: FunctionKind::Min,
        min_args: 1,
        max_args: None,
        category: FunctionCategory::Numeric,
    },
    FunctionDef {
        name: "max",
        kind: FunctionKind::Max,
        min_args: 1,
        max_args: None,
        category: FunctionCategory::Numeric,
    },
    FunctionDef {
        name: "avg",
        kind: FunctionKind::Avg,
        min_args: 1,
        max_args: None,
        category: FunctionCategory::Numeric,
    },
    FunctionDef {
        name: "sum",
        kind: FunctionKind::Sum,
        min_args: 1,
        max_args: None,
        category: FunctionCategory::Numeric,
    },
    FunctionDef {
        name: "pow",
        kind: FunctionKind::Pow,
        min_args: 2,
        max_args: Some(2),
        category: FunctionCategory::Numeric,
    },
    FunctionDef {
        name: "logn",
        kind: FunctionKind::Logn,
        min_args: 2,
        max_args: Some(2),
        category: FunctionCategory::Numeric,
    },
    FunctionDef {
        name: "root",
        kind: FunctionKind::Root,
        min_args: 2,
        max_args: Some(2),
        category: FunctionCategory::Numeric,
    },
    FunctionDef {
        name: "trunc",
        kind: FunctionKind::Trunc,
        min_args: 1,
        max_args: Some(1),
        category: FunctionCategory::Numeric,
    },
    FunctionDef {
        name: "deg2rad",
        kind: FunctionKind::Deg2Rad,
        min_args: 1,
        max_args: Some(1),
        category: FunctionCategory::Numeric,
    },
    FunctionDef {
        name: "rad2deg",
        kind: FunctionKind::Rad2Deg,
        min_args: 1,
        max_args: Some(1),
        category: FunctionCategory::Numeric,
    },
    FunctionDef {
        name: "is_null",
        kind: FunctionKind::IsNull,
        min_args: 1,
        max_args: Some(1),
        category: FunctionCategory::Boolean,
    },
    FunctionDef {
        name: "is_not_null",
        kind: FunctionKind::IsNotNull,
        min_args: 1,
        max_args: Some(1),
        category: FunctionCategory::Boolean,
    },
    FunctionDef {
        name: "percent_of",
        kind: FunctionKind::PercentOf,
        min_args: 2,
        max_args: Some(2),
        category: FunctionCategory::Numeric,
    },
    FunctionDef {
        name: "bucket",
        kind: FunctionKind::Bucket,
        min_args: 2,
        max_args: Some(2),
        category: FunctionCategory::Numeric,
    },
    FunctionDef {
        name: "length",
        kind: FunctionKind::Length,
        min_args: 1,
        max_args: Some(1),
        category: FunctionCategory::String,
    },
    FunctionDef {
        name: "order",
        kind: FunctionKind::Order,
        min_args: 2,
        max_args: None,
        category: FunctionCategory::String,
    },
    FunctionDef {
        name: "upper",
        kind: FunctionKind::Upper,
        min_args: 1,
        max_args: Some(1),
        category: FunctionCategory::String,
    },
    FunctionDef {
        name: "lower",
        kind: FunctionKind::Lower,
        min_args: 1,
        max_args: Some(1),
        category: FunctionCategory::String,
    },
    FunctionDef {
        name: "concat",
        kind: FunctionKind::Concat,
        min_args: 1,
        max_args: None,
        category: FunctionCategory::String,
    },
    FunctionDef {
        name: "match",
        kind: FunctionKind::Match,
        min_args: 2,
        max_args: Some(2),
        category: FunctionCategory::String,
    },
    FunctionDef {
        name: "find",
        kind: FunctionKind::Find,
        min_args: 3,
        max_args: Some(3),
        category: FunctionCategory::String,
    },
    FunctionDef {
        name: "mand",
        kind: FunctionKind::Mand,
        min_args: 2,
        max_args: None,
        category: FunctionCategory::Boolean,
    },
    FunctionDef {
        name: "mor",
        kind: FunctionKind::Mor,
        min_args: 2,
        max_args: None,
        category: FunctionCategory::Boolean,
    },
    FunctionDef {
        name: "inrange",
        kind: FunctionKind::Inrange,
        min_args: 3,
        max_args: Some(3),
        category: FunctionCategory::Numeric,
    },
    FunctionDef {
        name: "iclamp",
        kind: FunctionKind::Iclamp,
        min_args: 3,
        max_args: Some(3),
        category: FunctionCategory::Numeric,
    },
    FunctionDef {
        name: "today",
        kind: FunctionKind::Today,
        min_args: 0,
        max_args: Some(0),
        category: FunctionCategory::DateTime,
    },
    FunctionDef {
        name: "now",
        kind: FunctionKind::Now,
        min_args: 0,
        max_args: Some(0),
        category: FunctionCategory::DateTime,
    },
];

/// Cached name lookup table for O(1) access.
static FUNCTION_LOOKUP: LazyLock<HashMap<&'static str, &'static FunctionDef>> =
    LazyLock::new(|| {
        let mut map = HashMap::new();
        for def in BUILTIN_FUNCTIONS {
            map.insert(def.name, def);
        }
        map
    });

/// Find a function by name.
pub fn find_function(name: &str) -> Option<&'static FunctionDef> {
    FUNCTION_LOOKUP.get(name).copied()
}

/// All functions in a category.
pub fn functions_in_category(category: FunctionCategory) -> Vec<&'static FunctionDef> {
    BUILTIN_FUNCTIONS
        .iter()
        .filter(|f| f.category == category)
        .collect()
}

impl FunctionDef {
    /// Check a call's resolved arguments and produce the result type.
    ///
    /// This is the whole of a function's compile-time contract: arity,
    /// per-slot accepted types, and the result rule (fixed, promoted over
    /// the variadic arguments, or tied to one argument's type).
    pub fn result_type(&self, args: &[ArgSpec]) -> FormulaResult<ColumnType> {
        self.check_arity(args.len())?;

        match self.kind {
            FunctionKind::Min | FunctionKind::Max | FunctionKind::Avg | FunctionKind::Sum => {
                self.require_all_numeric(args)?;
                Ok(promote_all(args))
            }
            FunctionKind::Pow => {
                self.require_all_numeric(args)?;
                Ok(promote_all(args))
            }
            FunctionKind::Logn | FunctionKind::Root => {
                self.require_all_numeric(args)?;
                Ok(ColumnType::Float)
            }
            FunctionKind::Trunc => {
                self.require_all_numeric(args)?;
                Ok(args[0].ty.expect("checked numeric"))
            }
            FunctionKind::Deg2Rad | FunctionKind::Rad2Deg => {
                self.require_all_numeric(args)?;
                Ok(ColumnType::Float)
            }
            FunctionKind::IsNull | FunctionKind::IsNotNull => {
                // Any value, including the null literal, may be tested.
                Ok(ColumnType::Boolean)
            }
            FunctionKind::PercentOf => {
                self.require_all_numeric(args)?;
                Ok(ColumnType::Float)
            }
            FunctionKind::Bucket => {
                self.require_all_numeric(args)?;
                Ok(args[0].ty.expect("checked numeric"))
            }
            FunctionKind::Length => {
                self.require_string(&args[0], 0)?;
                Ok(ColumnType::Float)
            }
            FunctionKind::Order => {
                self.require_string(&args[0], 0)?;
                for (idx, arg) in args.iter().enumerate().skip(1) {
                    match &arg.literal {
                        Some(LiteralValue::String(_)) => {}
                        _ => {
                            return Err(self.arg_error(idx, "a string literal"));
                        }
                    }
                }
                Ok(ColumnType::Float)
            }
            FunctionKind::Upper | FunctionKind::Lower => {
                self.require_string(&args[0], 0)?;
                Ok(ColumnType::String)
            }
            FunctionKind::Concat => {
                for (idx, arg) in args.iter().enumerate() {
                    self.require_string(arg, idx)?;
                }
                Ok(ColumnType::String)
            }
            FunctionKind::Match => {
                self.require_string(&args[0], 0)?;
                self.require_pattern(&args[1], 1)?;
                Ok(ColumnType::Boolean)
            }
            FunctionKind::Find => {
                self.require_string(&args[0], 0)?;
                self.require_pattern(&args[1], 1)?;
                match args[2].array_len {
                    Some(len) if len >= 2 => Ok(ColumnType::Boolean),
                    Some(_) => Err(self.arg_error(2, "an array of at least two elements")),
                    None => Err(self.arg_error(2, "a declared array variable")),
                }
            }
            FunctionKind::Mand | FunctionKind::Mor => {
                for (idx, arg) in args.iter().enumerate() {
                    if arg.ty != Some(ColumnType::Boolean) {
                        return Err(self.arg_error(idx, "a boolean expression"));
                    }
                }
                Ok(ColumnType::Boolean)
            }
            FunctionKind::Inrange => {
                self.require_all_numeric(args)?;
                Ok(ColumnType::Boolean)
            }
            FunctionKind::Iclamp => {
                self.require_all_numeric(args)?;
                Ok(args[1].ty.expect("checked numeric"))
            }
            FunctionKind::Today => Ok(ColumnType::Date),
            FunctionKind::Now => Ok(ColumnType::DateTime),
        }
    }

    fn check_arity(&self, count: usize) -> FormulaResult<()> {
        let too_few = count < self.min_args;
        let too_many = self.max_args.is_some_and(|max| count > max);
        if too_few || too_many {
            return Err(FormulaError::type_error(format!(
                "{} takes {} argument(s), {} given",
                self.name,
                match self.max_args {
                    Some(max) if max == self.min_args => format!("{}", self.min_args),
                    Some(max) => format!("{}..{}", self.min_args, max),
                    None => format!("{}+", self.min_args),
                },
                count
            )));
        }
        Ok(())
    }

    fn require_all_numeric(&self, args: &[ArgSpec]) -> FormulaResult<()> {
        for (idx, arg) in args.iter().enumerate() {
            if !arg.is_numeric() {
                return Err(self.arg_error(idx, "a numeric expression"));
            }
        }
        Ok(())
    }

    fn require_string(&self, arg: &ArgSpec, idx: usize) -> FormulaResult<()> {
        if arg.ty != Some(ColumnType::String) {
            return Err(self.arg_error(idx, "a string expression"));
        }
        Ok(())
    }

    /// Patterns must be string literals so they can be compiled once at
    /// bind time; an invalid regex is a compile failure, not a row error.
    fn require_pattern(&self, arg: &ArgSpec, idx: usize) -> FormulaResult<()> {
        match &arg.literal {
            Some(LiteralValue::String(pattern)) => {
                cached_regex(pattern).map_err(|_| {
                    FormulaError::type_error(format!(
                        "{} argument {} is not a valid pattern",
                        self.name, idx
                    ))
                })?;
                Ok(())
            }
            _ => Err(self.arg_error(idx, "a string literal pattern")),
        }
    }

    fn arg_error(&self, idx: usize, wanted: &str) -> FormulaError {
        FormulaError::type_error(format!(
            "{} argument {} must be {}",
            self.name, idx, wanted
        ))
    }
}

/// Float if any argument resolved to float, else integer.
fn promote_all(args: &[ArgSpec]) -> ColumnType {
    if args.iter().any(|a| a.ty == Some(ColumnType::Float)) {
        ColumnType::Float
    } else {
        ColumnType::Integer
    }
}
