/*!
Built-in function implementations.

Row-wise bodies for every function in the catalog. All arguments arrive
already evaluated as [`CellValue`]s; the default null rule (any `Null`
input produces a `Null` result) is applied per function, with the
documented exceptions (`is_null`/`is_not_null` test nullness instead of
propagating it, `percent_of` maps a zero denominator to `Null`).

`find` is the one function with an output-array side effect; the
evaluator owns the scratch array and calls [`find_offsets`] directly,
so it does not appear in [`BuiltinFunctions::evaluate`].
*/

use chrono::Utc;
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use super::types::CellValue;
use crate::gridexpr::formula::catalog::FunctionKind;
use crate::gridexpr::formula::error::{FormulaError, FormulaResult};

/// Global cache of compiled patterns shared by `match` and `find`.
static REGEX_CACHE: OnceLock<Mutex<HashMap<String, Arc<Regex>>>> = OnceLock::new();

/// Patterns a single schema can reference are bounded in practice; the
/// cap only guards against pathological hosts.
const MAX_REGEX_CACHE_SIZE: usize = 1000;

/// Get or compile a pattern, caching the compiled form.
///
/// Validation compiles every pattern through this cache at resolve time,
/// so evaluation never recompiles and never sees an invalid pattern.
pub fn cached_regex(pattern: &str) -> FormulaResult<Arc<Regex>> {
    let cache = REGEX_CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    let mut guard = cache.lock().expect("regex cache poisoned");

    if let Some(existing) = guard.get(pattern) {
        return Ok(Arc::clone(existing));
    }

    let compiled = Regex::new(pattern).map_err(|e| {
        FormulaError::execution_error(format!("invalid pattern '{}': {}", pattern, e))
    })?;
    let compiled = Arc::new(compiled);

    if guard.len() >= MAX_REGEX_CACHE_SIZE {
        guard.clear();
    }
    guard.insert(pattern.to_string(), Arc::clone(&compiled));
    Ok(compiled)
}

/// Anchored variant of a pattern for full-string matching.
fn anchored(pattern: &str) -> String {
    format!("^(?:{})$", pattern)
}

/// Unanchored search for the first occurrence of `pattern` in `subject`.
///
/// Returns 0-based character offsets `(start, last)` where `last` is the
/// offset of the match's final character; an empty match reports its
/// start offset in both slots.
pub fn find_offsets(subject: &str, pattern: &str) -> FormulaResult<Option<(usize, usize)>> {
    let re = cached_regex(pattern)?;
    match re.find(subject) {
        Some(m) => {
            let start = subject[..m.start()].chars().count();
            let len = m.as_str().chars().count();
            let last = if len == 0 { start } else { start + len - 1 };
            Ok(Some((start, last)))
        }
        None => Ok(None),
    }
}

/// Provides built-in formula function implementations.
pub struct BuiltinFunctions;

impl BuiltinFunctions {
    /// Evaluate a catalog function over already-evaluated arguments.
    ///
    /// Arity and argument types were checked at resolve time; violations
    /// reaching this point are defects, reported as execution errors.
    pub fn evaluate(kind: FunctionKind, args: &[CellValue]) -> FormulaResult<CellValue> {
        match kind {
            FunctionKind::Min => Self::fold_numeric(args, f64::min, i64::min),
            FunctionKind::Max => Self::fold_numeric(args, f64::max, i64::max),
            FunctionKind::Avg => Self::avg(args),
            FunctionKind::Sum => Self::sum(args),
            FunctionKind::Pow => Self::pow(args),
            FunctionKind::Logn => Self::float_binary(args, |x, base| x.ln() / base.ln()),
            FunctionKind::Root => Self::float_binary(args, |x, n| x.powf(1.0 / n)),
            FunctionKind::Trunc => Self::trunc(args),
            FunctionKind::Deg2Rad => Self::float_unary(args, f64::to_radians),
            FunctionKind::Rad2Deg => Self::float_unary(args, f64::to_degrees),
            FunctionKind::IsNull => Ok(CellValue::Boolean(args[0].is_null())),
            FunctionKind::IsNotNull => Ok(CellValue::Boolean(!args[0].is_null())),
            FunctionKind::PercentOf => Self::percent_of(args),
            FunctionKind::Bucket => Self::bucket(args),
            FunctionKind::Length => Self::length(args),
            FunctionKind::Order => Self::order(args),
            FunctionKind::Upper => Self::string_unary(args, |s| s.to_uppercase()),
            FunctionKind::Lower => Self::string_unary(args, |s| s.to_lowercase()),
            FunctionKind::Concat => Self::concat(args),
            FunctionKind::Match => Self::regex_match(args),
            FunctionKind::Mand => Self::mand_mor(args, true),
            FunctionKind::Mor => Self::mand_mor(args, false),
            FunctionKind::Inrange => Self::inrange(args),
            FunctionKind::Iclamp => Self::iclamp(args),
            FunctionKind::Today => Ok(CellValue::Date(Utc::now().date_naive())),
            FunctionKind::Now => Ok(CellValue::DateTime(Utc::now().naive_utc())),
            FunctionKind::Find => Err(FormulaError::execution_error(
                "find is evaluated against its output array",
            )),
        }
    }

    /// Row-wise fold for min/max: float when any argument is float.
    fn fold_numeric(
        args: &[CellValue],
        float_op: fn(f64, f64) -> f64,
        int_op: fn(i64, i64) -> i64,
    ) -> FormulaResult<CellValue> {
        if args.iter().any(CellValue::is_null) {
            return Ok(CellValue::Null);
        }
        if args.iter().any(|a| matches!(a, CellValue::Float(_))) {
            let mut acc = Self::numeric_f64(&args[0])?;
            for arg in &args[1..] {
                acc = float_op(acc, Self::numeric_f64(arg)?);
            }
            Ok(CellValue::Float(acc))
        } else {
            let mut acc = Self::numeric_i64(&args[0])?;
            for arg in &args[1..] {
                acc = int_op(acc, Self::numeric_i64(arg)?);
            }
            Ok(CellValue::Integer(acc))
        }
    }

    fn sum(args: &[CellValue]) -> FormulaResult<CellValue> {
        if args.iter().any(CellValue::is_null) {
            return Ok(CellValue::Null);
        }
        if args.iter().any(|a| matches!(a, CellValue::Float(_))) {
            let mut acc = 0.0;
            for arg in args {
                acc += Self::numeric_f64(arg)?;
            }
            Ok(CellValue::Float(acc))
        } else {
            let mut acc = 0i64;
            for arg in args {
                acc += Self::numeric_i64(arg)?;
            }
            Ok(CellValue::Integer(acc))
        }
    }

    /// Row-wise mean. All-integer argument lists stay integer, truncating
    /// toward zero.
    fn avg(args: &[CellValue]) -> FormulaResult<CellValue> {
        match Self::sum(args)? {
            CellValue::Null => Ok(CellValue::Null),
            CellValue::Float(total) => Ok(CellValue::Float(total / args.len() as f64)),
            CellValue::Integer(total) => Ok(CellValue::Integer(total / args.len() as i64)),
            other => Err(FormulaError::execution_error(format!(
                "avg over non-numeric {}",
                other.type_name()
            ))),
        }
    }

    fn pow(args: &[CellValue]) -> FormulaResult<CellValue> {
        if args.iter().any(CellValue::is_null) {
            return Ok(CellValue::Null);
        }
        let base = Self::numeric_f64(&args[0])?;
        let exponent = Self::numeric_f64(&args[1])?;
        let result = base.powf(exponent);
        if args.iter().all(|a| matches!(a, CellValue::Integer(_))) {
            Ok(CellValue::Integer(result as i64))
        } else {
            Ok(CellValue::Float(result))
        }
    }

    fn trunc(args: &[CellValue]) -> FormulaResult<CellValue> {
        match &args[0] {
            CellValue::Null => Ok(CellValue::Null),
            CellValue::Integer(i) => Ok(CellValue::Integer(*i)),
            CellValue::Float(f) => Ok(CellValue::Float(f.trunc())),
            other => Err(Self::numeric_defect(other)),
        }
    }

    fn percent_of(args: &[CellValue]) -> FormulaResult<CellValue> {
        if args.iter().any(CellValue::is_null) {
            return Ok(CellValue::Null);
        }
        let x = Self::numeric_f64(&args[0])?;
        let y = Self::numeric_f64(&args[1])?;
        if y == 0.0 {
            Ok(CellValue::Null)
        } else {
            Ok(CellValue::Float((x / y) * 100.0))
        }
    }

    /// Round down to the nearest multiple of the quantum, keeping the
    /// subject's numeric type.
    fn bucket(args: &[CellValue]) -> FormulaResult<CellValue> {
        if args.iter().any(CellValue::is_null) {
            return Ok(CellValue::Null);
        }
        let x = Self::numeric_f64(&args[0])?;
        let quantum = Self::numeric_f64(&args[1])?;
        if quantum == 0.0 {
            return Ok(CellValue::Null);
        }
        let bucketed = (x / quantum).floor() * quantum;
        match &args[0] {
            CellValue::Integer(_) => Ok(CellValue::Integer(bucketed as i64)),
            _ => Ok(CellValue::Float(bucketed)),
        }
    }

    fn length(args: &[CellValue]) -> FormulaResult<CellValue> {
        match &args[0] {
            CellValue::Null => Ok(CellValue::Null),
            CellValue::String(s) => Ok(CellValue::Float(s.chars().count() as f64)),
            other => Err(Self::string_defect(other)),
        }
    }

    /// 0-based index of the subject within the literal list; misses map to
    /// the list length.
    fn order(args: &[CellValue]) -> FormulaResult<CellValue> {
        if args.iter().any(CellValue::is_null) {
            return Ok(CellValue::Null);
        }
        let subject = Self::string_ref(&args[0])?;
        let candidates = &args[1..];
        for (idx, candidate) in candidates.iter().enumerate() {
            if Self::string_ref(candidate)? == subject {
                return Ok(CellValue::Float(idx as f64));
            }
        }
        Ok(CellValue::Float(candidates.len() as f64))
    }

    fn concat(args: &[CellValue]) -> FormulaResult<CellValue> {
        if args.iter().any(CellValue::is_null) {
            return Ok(CellValue::Null);
        }
        let mut out = String::new();
        for arg in args {
            out.push_str(Self::string_ref(arg)?);
        }
        Ok(CellValue::String(out))
    }

    /// Anchored full-string match: the pattern must consume the entire
    /// subject, so a plain literal pattern matches only the identical
    /// string.
    fn regex_match(args: &[CellValue]) -> FormulaResult<CellValue> {
        if args.iter().any(CellValue::is_null) {
            return Ok(CellValue::Null);
        }
        let subject = Self::string_ref(&args[0])?;
        let pattern = Self::string_ref(&args[1])?;
        let re = cached_regex(&anchored(pattern))?;
        Ok(CellValue::Boolean(re.is_match(subject)))
    }

    /// N-ary AND (`all = true`) / OR (`all = false`) over boolean
    /// arguments; `Null` propagates.
    fn mand_mor(args: &[CellValue], all: bool) -> FormulaResult<CellValue> {
        if args.iter().any(CellValue::is_null) {
            return Ok(CellValue::Null);
        }
        let mut result = all;
        for arg in args {
            let value = match arg {
                CellValue::Boolean(b) => *b,
                other => {
                    return Err(FormulaError::execution_error(format!(
                        "boolean argument expected, got {}",
                        other.type_name()
                    )))
                }
            };
            if all {
                result = result && value;
            } else {
                result = result || value;
            }
        }
        Ok(CellValue::Boolean(result))
    }

    fn inrange(args: &[CellValue]) -> FormulaResult<CellValue> {
        if args.iter().any(CellValue::is_null) {
            return Ok(CellValue::Null);
        }
        let lo = Self::numeric_f64(&args[0])?;
        let x = Self::numeric_f64(&args[1])?;
        let hi = Self::numeric_f64(&args[2])?;
        Ok(CellValue::Boolean(lo <= x && x <= hi))
    }

    /// Clamp the subject into `[lo, hi]`, keeping the subject's type.
    fn iclamp(args: &[CellValue]) -> FormulaResult<CellValue> {
        if args.iter().any(CellValue::is_null) {
            return Ok(CellValue::Null);
        }
        let lo = Self::numeric_f64(&args[0])?;
        let x = Self::numeric_f64(&args[1])?;
        let hi = Self::numeric_f64(&args[2])?;
        let clamped = x.max(lo).min(hi);
        match &args[1] {
            CellValue::Integer(_) => Ok(CellValue::Integer(clamped as i64)),
            _ => Ok(CellValue::Float(clamped)),
        }
    }

    fn float_unary(args: &[CellValue], op: fn(f64) -> f64) -> FormulaResult<CellValue> {
        match &args[0] {
            CellValue::Null => Ok(CellValue::Null),
            value => Ok(CellValue::Float(op(Self::numeric_f64(value)?))),
        }
    }

    fn float_binary(args: &[CellValue], op: fn(f64, f64) -> f64) -> FormulaResult<CellValue> {
        if args.iter().any(CellValue::is_null) {
            return Ok(CellValue::Null);
        }
        Ok(CellValue::Float(op(
            Self::numeric_f64(&args[0])?,
            Self::numeric_f64(&args[1])?,
        )))
    }

    fn string_unary(args: &[CellValue], op: fn(&str) -> String) -> FormulaResult<CellValue> {
        match &args[0] {
            CellValue::Null => Ok(CellValue::Null),
            CellValue::String(s) => Ok(CellValue::String(op(s))),
            other => Err(Self::string_defect(other)),
        }
    }

    fn numeric_f64(value: &CellValue) -> FormulaResult<f64> {
        value.as_f64().ok_or_else(|| Self::numeric_defect(value))
    }

    fn numeric_i64(value: &CellValue) -> FormulaResult<i64> {
        match value {
            CellValue::Integer(i) => Ok(*i),
            other => Err(Self::numeric_defect(other)),
        }
    }

    fn string_ref(value: &CellValue) -> FormulaResult<&str> {
        match value {
            CellValue::String(s) => Ok(s),
            other => Err(Self::string_defect(other)),
        }
    }

    fn numeric_defect(value: &CellValue) -> FormulaError {
        FormulaError::execution_error(format!(
            "numeric argument expected, got {}",
            value.type_name()
        ))
    }

    fn string_defect(value: &CellValue) -> FormulaError {
        FormulaError::execution_error(format!(
            "string argument expected, got {}",
            value.type_name()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Vec<CellValue> {
        values.iter().map(|&v| CellValue::Integer(v)).collect()
    }

    #[test]
    fn test_min_max_keep_integer_when_all_integer() {
        assert_eq!(
            BuiltinFunctions::evaluate(FunctionKind::Min, &ints(&[3, 1, 2])).unwrap(),
            CellValue::Integer(1)
        );
        assert_eq!(
            BuiltinFunctions::evaluate(
                FunctionKind::Max,
                &[CellValue::Integer(3), CellValue::Float(3.5)]
            )
            .unwrap(),
            CellValue::Float(3.5)
        );
    }

    #[test]
    fn test_null_argument_nulls_the_row() {
        assert_eq!(
            BuiltinFunctions::evaluate(
                FunctionKind::Sum,
                &[CellValue::Integer(1), CellValue::Null]
            )
            .unwrap(),
            CellValue::Null
        );
        assert_eq!(
            BuiltinFunctions::evaluate(FunctionKind::Upper, &[CellValue::Null]).unwrap(),
            CellValue::Null
        );
    }

    #[test]
    fn test_is_null_never_propagates() {
        assert_eq!(
            BuiltinFunctions::evaluate(FunctionKind::IsNull, &[CellValue::Null]).unwrap(),
            CellValue::Boolean(true)
        );
        assert_eq!(
            BuiltinFunctions::evaluate(FunctionKind::IsNotNull, &[CellValue::Null]).unwrap(),
            CellValue::Boolean(false)
        );
    }

    #[test]
    fn test_percent_of_zero_denominator() {
        assert_eq!(
            BuiltinFunctions::evaluate(
                FunctionKind::PercentOf,
                &[CellValue::Integer(1), CellValue::Integer(0)]
            )
            .unwrap(),
            CellValue::Null
        );
        assert_eq!(
            BuiltinFunctions::evaluate(
                FunctionKind::PercentOf,
                &[CellValue::Integer(1), CellValue::Integer(3)]
            )
            .unwrap(),
            CellValue::Float(100.0 / 3.0)
        );
    }

    #[test]
    fn test_bucket_quantum() {
        let cases = [
            (2.25, 0.0),
            (2.0, 0.0),
            (3.5, 2.5),
            (16.5, 15.0),
            (28.0, 27.5),
            (8.0, 7.5),
        ];
        for (input, expected) in cases {
            assert_eq!(
                BuiltinFunctions::evaluate(
                    FunctionKind::Bucket,
                    &[CellValue::Float(input), CellValue::Float(2.5)]
                )
                .unwrap(),
                CellValue::Float(expected),
                "bucket({}, 2.5)",
                input
            );
        }
    }

    #[test]
    fn test_order_miss_is_list_length() {
        let args = vec![
            CellValue::String("hhs".to_string()),
            CellValue::String("deeeeef".to_string()),
            CellValue::String("fg".to_string()),
        ];
        assert_eq!(
            BuiltinFunctions::evaluate(FunctionKind::Order, &args).unwrap(),
            CellValue::Float(2.0)
        );
    }

    #[test]
    fn test_match_is_anchored() {
        let matched = BuiltinFunctions::evaluate(
            FunctionKind::Match,
            &[
                CellValue::String("ABC".to_string()),
                CellValue::String("A".to_string()),
            ],
        )
        .unwrap();
        assert_eq!(matched, CellValue::Boolean(false));

        let matched = BuiltinFunctions::evaluate(
            FunctionKind::Match,
            &[
                CellValue::String("ABC".to_string()),
                CellValue::String("ABC".to_string()),
            ],
        )
        .unwrap();
        assert_eq!(matched, CellValue::Boolean(true));
    }

    #[test]
    fn test_find_offsets_character_positions() {
        assert_eq!(
            find_offsets("1234567", "[0-9]{7}").unwrap(),
            Some((0, 6))
        );
        assert_eq!(find_offsets("abc123", "[0-9]{7}").unwrap(), None);
        // empty match reports the start offset in both slots
        assert_eq!(find_offsets("", ".*").unwrap(), Some((0, 0)));
        assert_eq!(find_offsets("ab", ".*").unwrap(), Some((0, 1)));
    }

    #[test]
    fn test_avg_integer_truncates() {
        assert_eq!(
            BuiltinFunctions::evaluate(FunctionKind::Avg, &ints(&[1, 2, 2])).unwrap(),
            CellValue::Integer(1)
        );
        assert_eq!(
            BuiltinFunctions::evaluate(
                FunctionKind::Avg,
                &[CellValue::Integer(1), CellValue::Float(2.0)]
            )
            .unwrap(),
            CellValue::Float(1.5)
        );
    }
}
