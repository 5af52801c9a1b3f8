/*!
# Numeric Expression Tests

Tests for numeric operators and functions: unary/binary arithmetic with
null propagation, division and modulo by zero, cross-type comparison
semantics, and the numeric function library (min, max, avg, sum, pow,
logn, root, trunc, deg2rad, rad2deg, percent_of, bucket, inrange,
iclamp). Tests both type resolution and per-row execution.
*/

use gridexpr::{
    compute_columns, validate_expressions, CellValue, Column, ColumnBatch, ColumnType, TableSchema,
};

const EPSILON: f64 = 1e-9;

fn numeric_schema() -> TableSchema {
    TableSchema::new([
        ("a".to_string(), ColumnType::Integer),
        ("b".to_string(), ColumnType::Float),
        ("c".to_string(), ColumnType::Integer),
        ("d".to_string(), ColumnType::Float),
    ])
}

fn numeric_batch() -> ColumnBatch {
    let mut batch = ColumnBatch::new();
    batch.insert("a", Column::integers(vec![Some(1), Some(2), Some(3), Some(4)]));
    batch.insert(
        "b",
        Column::floats(vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)]),
    );
    batch.insert("c", Column::integers(vec![Some(1), Some(0), Some(1), Some(0)]));
    batch.insert(
        "d",
        Column::floats(vec![Some(1.0), Some(0.0), Some(3.0), Some(0.0)]),
    );
    batch
}

fn output<'a>(
    result: &'a gridexpr::ComputedColumns,
    expr: &str,
) -> &'a [CellValue] {
    result
        .output_columns
        .get(expr)
        .unwrap_or_else(|| panic!("no output column for {}", expr))
        .values()
}

fn floats(values: &[CellValue]) -> Vec<f64> {
    values
        .iter()
        .map(|v| match v {
            CellValue::Float(f) => *f,
            CellValue::Integer(i) => *i as f64,
            other => panic!("expected numeric value, got {:?}", other),
        })
        .collect()
}

fn booleans(values: &[CellValue]) -> Vec<bool> {
    values
        .iter()
        .map(|v| match v {
            CellValue::Boolean(b) => *b,
            other => panic!("expected boolean value, got {:?}", other),
        })
        .collect()
}

fn assert_float_eq(actual: &[f64], expected: &[f64], expr: &str) {
    assert_eq!(actual.len(), expected.len(), "{} row count", expr);
    for (idx, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            (a - e).abs() < EPSILON,
            "{} row {}: {} != {}",
            expr,
            idx,
            a,
            e
        );
    }
}

#[test]
fn test_unary_operators() {
    let schema = numeric_schema();
    let batch = numeric_batch();
    let result = compute_columns(&schema, &batch, &["+\"a\"", "-\"a\"", "-\"b\"", "+\"b\""]);

    assert!(result.errors.is_empty());
    assert_eq!(
        output(&result, "+\"a\""),
        &[
            CellValue::Integer(1),
            CellValue::Integer(2),
            CellValue::Integer(3),
            CellValue::Integer(4)
        ]
    );
    assert_eq!(
        output(&result, "-\"a\""),
        &[
            CellValue::Integer(-1),
            CellValue::Integer(-2),
            CellValue::Integer(-3),
            CellValue::Integer(-4)
        ]
    );
    assert_float_eq(
        &floats(output(&result, "-\"b\"")),
        &[-1.0, -2.0, -3.0, -4.0],
        "-\"b\"",
    );
}

#[test]
fn test_unary_minus_is_zero_minus() {
    // -x == 0 - x for every row, for both numeric types
    let schema = numeric_schema();
    let batch = numeric_batch();
    let result = compute_columns(&schema, &batch, &["-\"a\"", "0 - \"a\"", "-\"b\"", "0 - \"b\""]);

    assert_eq!(output(&result, "-\"a\""), output(&result, "0 - \"a\""));
    assert_eq!(output(&result, "-\"b\""), output(&result, "0 - \"b\""));
}

#[test]
fn test_binary_arithmetic_types() {
    let schema = numeric_schema();
    let result = validate_expressions(
        &schema,
        &[
            "\"a\" + \"c\"",
            "\"a\" + \"b\"",
            "\"a\" * \"c\"",
            "\"a\" - \"c\"",
            "\"a\" % \"c\"",
            "\"a\" / \"c\"",
            "\"a\" ^ \"c\"",
        ],
    );

    assert!(result.errors.is_empty());
    assert_eq!(result.expression_schema["\"a\" + \"c\""], ColumnType::Integer);
    assert_eq!(result.expression_schema["\"a\" + \"b\""], ColumnType::Float);
    assert_eq!(result.expression_schema["\"a\" * \"c\""], ColumnType::Integer);
    assert_eq!(result.expression_schema["\"a\" - \"c\""], ColumnType::Integer);
    assert_eq!(result.expression_schema["\"a\" % \"c\""], ColumnType::Integer);
    // division and exponentiation always resolve to float
    assert_eq!(result.expression_schema["\"a\" / \"c\""], ColumnType::Float);
    assert_eq!(result.expression_schema["\"a\" ^ \"c\""], ColumnType::Float);
}

#[test]
fn test_divide_by_zero_is_null() {
    let schema = TableSchema::new([
        ("a".to_string(), ColumnType::Integer),
        ("b".to_string(), ColumnType::Integer),
        ("c".to_string(), ColumnType::Float),
    ]);
    let mut batch = ColumnBatch::new();
    batch.insert("a", Column::integers(vec![Some(1), Some(2), Some(3), Some(4)]));
    batch.insert("b", Column::integers(vec![Some(0), Some(0), Some(0), Some(0)]));
    batch.insert(
        "c",
        Column::floats(vec![Some(1.5), Some(2.123), Some(3.125), Some(4.123809)]),
    );

    let result = compute_columns(&schema, &batch, &["\"a\" / \"b\"", "\"c\" / \"b\""]);
    assert_eq!(output(&result, "\"a\" / \"b\""), vec![CellValue::Null; 4]);
    assert_eq!(output(&result, "\"c\" / \"b\""), vec![CellValue::Null; 4]);
}

#[test]
fn test_modulo_by_zero_is_null() {
    let schema = TableSchema::new([
        ("a".to_string(), ColumnType::Integer),
        ("b".to_string(), ColumnType::Integer),
        ("c".to_string(), ColumnType::Float),
    ]);
    let mut batch = ColumnBatch::new();
    batch.insert("a", Column::integers(vec![Some(1), Some(2), Some(3), Some(4)]));
    batch.insert("b", Column::integers(vec![Some(0), Some(0), Some(0), Some(0)]));
    batch.insert(
        "c",
        Column::floats(vec![Some(1.5), Some(2.123), Some(3.125), Some(4.123809)]),
    );

    let result = compute_columns(&schema, &batch, &["\"a\" % \"b\"", "\"c\" % \"b\""]);
    assert_eq!(output(&result, "\"a\" % \"b\""), vec![CellValue::Null; 4]);
    assert_eq!(output(&result, "\"c\" % \"b\""), vec![CellValue::Null; 4]);
}

#[test]
fn test_cross_type_column_comparison_is_constant() {
    // integer and float columns with equal numeric values still compare
    // unequal, for every row
    let schema = numeric_schema();
    let batch = numeric_batch();
    let result = compute_columns(&schema, &batch, &["\"a\" == \"b\"", "\"a\" != \"b\""]);

    assert_eq!(
        booleans(output(&result, "\"a\" == \"b\"")),
        vec![false, false, false, false]
    );
    assert_eq!(
        booleans(output(&result, "\"a\" != \"b\"")),
        vec![true, true, true, true]
    );
}

#[test]
fn test_same_type_column_comparison_is_elementwise() {
    let schema = numeric_schema();
    let batch = numeric_batch();
    let result = compute_columns(
        &schema,
        &batch,
        &["\"a\" == \"c\"", "\"a\" != \"c\"", "\"b\" == \"d\"", "\"b\" != \"d\""],
    );

    assert_eq!(
        booleans(output(&result, "\"a\" == \"c\"")),
        vec![true, false, false, false]
    );
    assert_eq!(
        booleans(output(&result, "\"a\" != \"c\"")),
        vec![false, true, true, true]
    );
    assert_eq!(
        booleans(output(&result, "\"b\" == \"d\"")),
        vec![true, false, true, false]
    );
    assert_eq!(
        booleans(output(&result, "\"b\" != \"d\"")),
        vec![false, true, false, true]
    );
}

#[test]
fn test_null_equality() {
    let schema = TableSchema::new([
        ("x".to_string(), ColumnType::Integer),
        ("y".to_string(), ColumnType::Integer),
    ]);
    let mut batch = ColumnBatch::new();
    batch.insert("x", Column::integers(vec![None, None, Some(1)]));
    batch.insert("y", Column::integers(vec![None, Some(1), None]));

    let result = compute_columns(&schema, &batch, &["\"x\" == \"y\"", "\"x\" != \"y\""]);
    // Null == Null is true; Null against a value is false
    assert_eq!(
        booleans(output(&result, "\"x\" == \"y\"")),
        vec![true, false, false]
    );
    assert_eq!(
        booleans(output(&result, "\"x\" != \"y\"")),
        vec![false, true, true]
    );
}

#[test]
fn test_ordering_comparisons_promote_numerics() {
    let schema = numeric_schema();
    let batch = numeric_batch();
    let result = compute_columns(&schema, &batch, &["\"a\" > 0.5 or \"d\" < 0.5"]);
    assert_eq!(
        booleans(output(&result, "\"a\" > 0.5 or \"d\" < 0.5")),
        vec![true, true, true, true]
    );
}

#[test]
fn test_min_max() {
    let schema = numeric_schema();
    let mut batch = ColumnBatch::new();
    batch.insert("a", Column::integers(vec![Some(1), Some(2), Some(3), Some(4)]));
    batch.insert(
        "b",
        Column::floats(vec![Some(1.5), Some(2.5), Some(3.5), Some(4.5)]),
    );
    batch.insert("c", Column::integers(vec![Some(0); 4]));
    batch.insert("d", Column::floats(vec![Some(0.0); 4]));

    let expressions = [
        "min(1)",
        "min(\"a\")",
        "min(\"a\", -10, -10.001)",
        "min(\"b\", 0.00000000001, -10, -100, -100.1)",
        "min(\"a\", \"b\")",
        "max(\"a\", 10, 20, 0.1, 0.00000001)",
        "max(\"b\", -1, -100, 100)",
        "max(2000000000000.11, 2000000000000.1)",
    ];
    let result = compute_columns(&schema, &batch, &expressions);
    assert!(result.errors.is_empty());

    // all-integer argument lists stay integer; any float promotes
    assert_eq!(result.expression_schema["min(1)"], ColumnType::Integer);
    assert_eq!(result.expression_schema["min(\"a\")"], ColumnType::Integer);
    assert_eq!(
        result.expression_schema["min(\"a\", -10, -10.001)"],
        ColumnType::Float
    );
    assert_eq!(
        result.expression_schema["min(\"a\", \"b\")"],
        ColumnType::Float
    );

    assert_eq!(
        output(&result, "min(1)"),
        vec![CellValue::Integer(1); 4]
    );
    assert_eq!(
        output(&result, "min(\"a\")"),
        &[
            CellValue::Integer(1),
            CellValue::Integer(2),
            CellValue::Integer(3),
            CellValue::Integer(4)
        ]
    );
    assert_float_eq(
        &floats(output(&result, "min(\"a\", -10, -10.001)")),
        &[-10.001; 4],
        "min with float literal",
    );
    assert_float_eq(
        &floats(output(&result, "min(\"b\", 0.00000000001, -10, -100, -100.1)")),
        &[-100.1; 4],
        "min variadic",
    );
    assert_float_eq(
        &floats(output(&result, "min(\"a\", \"b\")")),
        &[1.0, 2.0, 3.0, 4.0],
        "min of two columns",
    );
    assert_float_eq(
        &floats(output(&result, "max(\"a\", 10, 20, 0.1, 0.00000001)")),
        &[20.0; 4],
        "max variadic",
    );
    assert_float_eq(
        &floats(output(&result, "max(\"b\", -1, -100, 100)")),
        &[100.0; 4],
        "max with bounds",
    );
    assert_float_eq(
        &floats(output(&result, "max(2000000000000.11, 2000000000000.1)")),
        &[2000000000000.11; 4],
        "max of close floats",
    );
}

#[test]
fn test_avg_and_sum() {
    let schema = numeric_schema();
    let mut batch = ColumnBatch::new();
    batch.insert("a", Column::integers(vec![Some(1), Some(2), Some(3), Some(4)]));
    batch.insert(
        "b",
        Column::floats(vec![Some(1.5), Some(2.5), Some(3.5), Some(4.5)]),
    );
    batch.insert("c", Column::integers(vec![Some(0); 4]));
    batch.insert("d", Column::floats(vec![Some(0.0); 4]));

    let result = compute_columns(
        &schema,
        &batch,
        &[
            "sum(\"a\", 10, 20, 30, 40, \"a\")",
            "sum(\"b\", 3, 4, 5, \"b\")",
            "avg(\"b\", 3, 4, 5, \"b\")",
            "avg(\"a\", 3.0, \"a\")",
        ],
    );
    assert!(result.errors.is_empty());

    assert_eq!(
        output(&result, "sum(\"a\", 10, 20, 30, 40, \"a\")"),
        &[
            CellValue::Integer(102),
            CellValue::Integer(104),
            CellValue::Integer(106),
            CellValue::Integer(108)
        ]
    );
    assert_float_eq(
        &floats(output(&result, "sum(\"b\", 3, 4, 5, \"b\")")),
        &[15.0, 17.0, 19.0, 21.0],
        "float sum",
    );
    assert_float_eq(
        &floats(output(&result, "avg(\"b\", 3, 4, 5, \"b\")")),
        &[3.0, 3.4, 3.8, 4.2],
        "float avg",
    );
    assert_float_eq(
        &floats(output(&result, "avg(\"a\", 3.0, \"a\")")),
        &[5.0 / 3.0, 7.0 / 3.0, 3.0, 11.0 / 3.0],
        "avg promoted by float literal",
    );
}

#[test]
fn test_pow_logn_root() {
    let schema = numeric_schema();
    let mut batch = ColumnBatch::new();
    batch.insert(
        "a",
        Column::integers(vec![Some(100), Some(200), Some(300), Some(400)]),
    );
    batch.insert(
        "b",
        Column::floats(vec![Some(100.5), Some(200.5), Some(300.5), Some(400.5)]),
    );
    batch.insert("c", Column::integers(vec![Some(0); 4]));
    batch.insert("d", Column::floats(vec![Some(0.0); 4]));

    let result = compute_columns(
        &schema,
        &batch,
        &["pow(\"a\", 1)", "logn(\"a\", 5)", "logn(\"b\", 3)", "root(\"a\", 5)"],
    );
    assert!(result.errors.is_empty());

    assert_eq!(
        output(&result, "pow(\"a\", 1)"),
        &[
            CellValue::Integer(100),
            CellValue::Integer(200),
            CellValue::Integer(300),
            CellValue::Integer(400)
        ]
    );
    assert_float_eq(
        &floats(output(&result, "logn(\"a\", 5)")),
        &[100.0, 200.0, 300.0, 400.0]
            .map(|x: f64| x.ln() / 5f64.ln()),
        "logn of integers",
    );
    assert_float_eq(
        &floats(output(&result, "logn(\"b\", 3)")),
        &[100.5, 200.5, 300.5, 400.5].map(|x: f64| x.ln() / 3f64.ln()),
        "logn of floats",
    );
    assert_float_eq(
        &floats(output(&result, "root(\"a\", 5)")),
        &[100.0, 200.0, 300.0, 400.0].map(|x: f64| x.powf(0.2)),
        "fifth root",
    );
}

#[test]
fn test_trunc_and_angle_conversions() {
    let schema = numeric_schema();
    let mut batch = ColumnBatch::new();
    batch.insert("a", Column::integers(vec![Some(30), Some(60), Some(90), Some(120)]));
    batch.insert(
        "b",
        Column::floats(vec![Some(1.5), Some(2.5), Some(3.5), Some(4.5)]),
    );
    batch.insert("c", Column::integers(vec![Some(0); 4]));
    batch.insert("d", Column::floats(vec![Some(0.0); 4]));

    let result = compute_columns(
        &schema,
        &batch,
        &["trunc(\"b\")", "deg2rad(\"a\")", "rad2deg(deg2rad(\"a\"))"],
    );
    assert!(result.errors.is_empty());

    assert_eq!(result.expression_schema["trunc(\"b\")"], ColumnType::Float);
    assert_float_eq(
        &floats(output(&result, "trunc(\"b\")")),
        &[1.0, 2.0, 3.0, 4.0],
        "trunc toward zero",
    );
    assert_float_eq(
        &floats(output(&result, "deg2rad(\"a\")")),
        &[30.0, 60.0, 90.0, 120.0].map(|x: f64| x.to_radians()),
        "deg2rad",
    );
    assert_float_eq(
        &floats(output(&result, "rad2deg(deg2rad(\"a\"))")),
        &[30.0, 60.0, 90.0, 120.0],
        "rad2deg round trip",
    );
}

#[test]
fn test_is_null_and_conditionals() {
    let schema = numeric_schema();
    let mut batch = ColumnBatch::new();
    batch.insert("a", Column::integers(vec![Some(1), None, None, Some(4)]));
    batch.insert(
        "b",
        Column::floats(vec![None, Some(2.5), None, Some(4.5)]),
    );
    batch.insert("c", Column::integers(vec![Some(0); 4]));
    batch.insert("d", Column::floats(vec![Some(0.0); 4]));

    let result = compute_columns(
        &schema,
        &batch,
        &[
            "is_null(\"a\")",
            "is_not_null(\"b\")",
            "if(is_null(\"a\")) 100; else 0;",
            "if(is_not_null(\"b\")) 100; else 0;",
        ],
    );
    assert!(result.errors.is_empty());

    assert_eq!(
        booleans(output(&result, "is_null(\"a\")")),
        vec![false, true, true, false]
    );
    assert_eq!(
        booleans(output(&result, "is_not_null(\"b\")")),
        vec![false, true, false, true]
    );
    assert_eq!(
        output(&result, "if(is_null(\"a\")) 100; else 0;"),
        &[
            CellValue::Integer(0),
            CellValue::Integer(100),
            CellValue::Integer(100),
            CellValue::Integer(0)
        ]
    );
    assert_eq!(
        output(&result, "if(is_not_null(\"b\")) 100; else 0;"),
        &[
            CellValue::Integer(0),
            CellValue::Integer(100),
            CellValue::Integer(0),
            CellValue::Integer(100)
        ]
    );
}

#[test]
fn test_percent_of() {
    let schema = numeric_schema();
    let mut batch = ColumnBatch::new();
    batch.insert(
        "a",
        Column::integers(vec![Some(100), Some(200), Some(300), Some(400)]),
    );
    batch.insert(
        "b",
        Column::floats(vec![Some(100.5), Some(200.5), Some(300.5), Some(400.5)]),
    );
    batch.insert("c", Column::integers(vec![Some(0); 4]));
    batch.insert("d", Column::floats(vec![Some(0.0); 4]));

    let result = compute_columns(
        &schema,
        &batch,
        &["percent_of(\"a\", 500)", "percent_of(\"a\", \"b\")", "percent_of(1, 3)", "percent_of(\"a\", \"c\")"],
    );
    assert!(result.errors.is_empty());

    assert_float_eq(
        &floats(output(&result, "percent_of(\"a\", 500)")),
        &[20.0, 40.0, 60.0, 80.0],
        "percent of literal",
    );
    assert_float_eq(
        &floats(output(&result, "percent_of(\"a\", \"b\")")),
        &[
            100.0 / 100.5 * 100.0,
            200.0 / 200.5 * 100.0,
            300.0 / 300.5 * 100.0,
            400.0 / 400.5 * 100.0,
        ],
        "percent of column",
    );
    assert_float_eq(
        &floats(output(&result, "percent_of(1, 3)")),
        &[100.0 / 3.0; 4],
        "percent of constants",
    );
    // zero denominator is Null, not an error or infinity
    assert_eq!(
        output(&result, "percent_of(\"a\", \"c\")"),
        vec![CellValue::Null; 4]
    );
}

#[test]
fn test_bucket() {
    let schema = numeric_schema();
    let mut batch = ColumnBatch::new();
    batch.insert(
        "a",
        Column::integers(vec![Some(15), Some(15), Some(35), Some(40), Some(1250), Some(1255)]),
    );
    batch.insert(
        "b",
        Column::floats(vec![
            Some(2.25),
            Some(2.0),
            Some(3.5),
            Some(16.5),
            Some(28.0),
            Some(8.0),
        ]),
    );
    batch.insert("c", Column::integers(vec![Some(0); 6]));
    batch.insert("d", Column::floats(vec![Some(0.0); 6]));

    let result = compute_columns(
        &schema,
        &batch,
        &["bucket(\"a\", 5)", "bucket(\"b\", 2.5)", "bucket(\"b\", 10)"],
    );
    assert!(result.errors.is_empty());

    // bucket keeps the subject's type
    assert_eq!(result.expression_schema["bucket(\"a\", 5)"], ColumnType::Integer);
    assert_eq!(result.expression_schema["bucket(\"b\", 2.5)"], ColumnType::Float);

    assert_eq!(
        output(&result, "bucket(\"a\", 5)"),
        &[
            CellValue::Integer(15),
            CellValue::Integer(15),
            CellValue::Integer(35),
            CellValue::Integer(40),
            CellValue::Integer(1250),
            CellValue::Integer(1255)
        ]
    );
    assert_float_eq(
        &floats(output(&result, "bucket(\"b\", 2.5)")),
        &[0.0, 0.0, 2.5, 15.0, 27.5, 7.5],
        "bucket float quantum",
    );
    assert_float_eq(
        &floats(output(&result, "bucket(\"b\", 10)")),
        &[0.0, 0.0, 0.0, 10.0, 20.0, 0.0],
        "bucket integer quantum",
    );
}

#[test]
fn test_inrange_and_iclamp() {
    let schema = numeric_schema();
    let mut batch = ColumnBatch::new();
    batch.insert(
        "a",
        Column::integers(vec![Some(10), Some(15), Some(20), Some(30)]),
    );
    batch.insert(
        "b",
        Column::floats(vec![Some(10.5), Some(15.5), Some(20.5), Some(30.5)]),
    );
    batch.insert("c", Column::integers(vec![Some(0); 4]));
    batch.insert("d", Column::floats(vec![Some(0.0); 4]));

    let result = compute_columns(
        &schema,
        &batch,
        &["inrange(9, \"b\", 20)", "iclamp(10, \"a\", 20)", "iclamp(10, \"b\", 20)"],
    );
    assert!(result.errors.is_empty());

    assert_eq!(
        booleans(output(&result, "inrange(9, \"b\", 20)")),
        vec![true, true, false, false]
    );
    assert_eq!(
        output(&result, "iclamp(10, \"a\", 20)"),
        &[
            CellValue::Integer(10),
            CellValue::Integer(15),
            CellValue::Integer(20),
            CellValue::Integer(20)
        ]
    );
    assert_float_eq(
        &floats(output(&result, "iclamp(10, \"b\", 20)")),
        &[10.5, 15.5, 20.0, 20.0],
        "iclamp floats",
    );
}

#[test]
fn test_boolean_connectives() {
    let schema = TableSchema::new([
        ("u".to_string(), ColumnType::Boolean),
        ("z".to_string(), ColumnType::Boolean),
        ("n".to_string(), ColumnType::Integer),
    ]);
    let mut batch = ColumnBatch::new();
    batch.insert(
        "u",
        Column::booleans(vec![Some(false), Some(true), Some(false), Some(true)]),
    );
    batch.insert("z", Column::booleans(vec![Some(false); 4]));
    batch.insert("n", Column::integers(vec![Some(0), Some(1), Some(2), Some(0)]));

    let result = compute_columns(
        &schema,
        &batch,
        &[
            "\"u\" and \"u\"",
            "\"u\" and \"z\"",
            "\"u\" or \"z\"",
            "\"u\" xor \"u\"",
            "\"u\" xor \"z\"",
            "\"u\" nand \"u\"",
            "\"u\" nor \"z\"",
            "0 and 0",
            "1 and 100",
            "True and False",
            "0 or 1",
            "False nor False",
            "\"n\" and 1",
        ],
    );
    assert!(result.errors.is_empty());

    assert_eq!(
        booleans(output(&result, "\"u\" and \"u\"")),
        vec![false, true, false, true]
    );
    assert_eq!(
        booleans(output(&result, "\"u\" and \"z\"")),
        vec![false, false, false, false]
    );
    assert_eq!(
        booleans(output(&result, "\"u\" or \"z\"")),
        vec![false, true, false, true]
    );
    assert_eq!(
        booleans(output(&result, "\"u\" xor \"u\"")),
        vec![false, false, false, false]
    );
    assert_eq!(
        booleans(output(&result, "\"u\" xor \"z\"")),
        vec![false, true, false, true]
    );
    assert_eq!(
        booleans(output(&result, "\"u\" nand \"u\"")),
        vec![true, false, true, false]
    );
    assert_eq!(
        booleans(output(&result, "\"u\" nor \"z\"")),
        vec![true, false, true, false]
    );
    assert_eq!(booleans(output(&result, "0 and 0")), vec![false; 4]);
    assert_eq!(booleans(output(&result, "1 and 100")), vec![true; 4]);
    assert_eq!(booleans(output(&result, "True and False")), vec![false; 4]);
    assert_eq!(booleans(output(&result, "0 or 1")), vec![true; 4]);
    assert_eq!(booleans(output(&result, "False nor False")), vec![true; 4]);
    // nonzero integers are truthy
    assert_eq!(
        booleans(output(&result, "\"n\" and 1")),
        vec![false, true, true, false]
    );
}

#[test]
fn test_mand_mor() {
    let schema = TableSchema::new([
        ("u".to_string(), ColumnType::Boolean),
        ("z".to_string(), ColumnType::Boolean),
    ]);
    let mut batch = ColumnBatch::new();
    batch.insert(
        "u",
        Column::booleans(vec![Some(false), Some(true), Some(false), Some(true)]),
    );
    batch.insert("z", Column::booleans(vec![Some(false); 4]));

    let result = compute_columns(
        &schema,
        &batch,
        &[
            "mand(\"u\" and \"u\", \"u\" and \"z\", \"z\" and \"z\")",
            "mand(True, True, True, True)",
            "mand(is_null(null), is_not_null(null))",
            "mor(\"u\" and \"u\", \"u\" and \"z\", \"z\" and \"z\")",
            "mor(False, False, False)",
            "mor(False, True, False)",
        ],
    );
    assert!(result.errors.is_empty());

    assert_eq!(
        booleans(output(
            &result,
            "mand(\"u\" and \"u\", \"u\" and \"z\", \"z\" and \"z\")"
        )),
        vec![false; 4]
    );
    assert_eq!(
        booleans(output(&result, "mand(True, True, True, True)")),
        vec![true; 4]
    );
    assert_eq!(
        booleans(output(&result, "mand(is_null(null), is_not_null(null))")),
        vec![false; 4]
    );
    assert_eq!(
        booleans(output(
            &result,
            "mor(\"u\" and \"u\", \"u\" and \"z\", \"z\" and \"z\")"
        )),
        vec![false, true, false, true]
    );
    assert_eq!(
        booleans(output(&result, "mor(False, False, False)")),
        vec![false; 4]
    );
    assert_eq!(
        booleans(output(&result, "mor(False, True, False)")),
        vec![true; 4]
    );
}

#[test]
fn test_mand_mor_reject_non_boolean_inputs() {
    let schema = TableSchema::new([
        ("w".to_string(), ColumnType::Integer),
        ("x".to_string(), ColumnType::Float),
        ("y".to_string(), ColumnType::String),
    ]);

    for expr in [
        "mand(\"w\", \"x\", \"y\")",
        "mand(100, 200, 300)",
        "mand('a', 'b', 'cdef')",
        "mor(\"w\", \"x\", \"y\")",
        "mor(100, 200, 300)",
        "mor('a', 'b', 'cdef')",
    ] {
        let result = validate_expressions(&schema, &[expr]);
        assert!(
            result.expression_schema.is_empty(),
            "{} must not resolve",
            expr
        );
        let diagnostic = result.errors.get(expr).expect("diagnostic present");
        assert_eq!(diagnostic.column, 0);
        assert_eq!(diagnostic.line, 0);
        assert_eq!(
            diagnostic.error_message,
            "Type Error - inputs do not resolve to a valid expression."
        );
    }
}

#[test]
fn test_power_operator() {
    let schema = numeric_schema();
    let mut batch = ColumnBatch::new();
    batch.insert("a", Column::integers(vec![Some(2), Some(3), Some(4), Some(5)]));
    batch.insert("b", Column::floats(vec![Some(2.0); 4]));
    batch.insert("c", Column::integers(vec![Some(0); 4]));
    batch.insert("d", Column::floats(vec![Some(0.0); 4]));

    let result = compute_columns(&schema, &batch, &["\"a\" ^ 2", "\"b\" ^ \"a\""]);
    assert!(result.errors.is_empty());

    assert_float_eq(
        &floats(output(&result, "\"a\" ^ 2")),
        &[4.0, 9.0, 16.0, 25.0],
        "integer base power",
    );
    assert_float_eq(
        &floats(output(&result, "\"b\" ^ \"a\"")),
        &[4.0, 8.0, 16.0, 32.0],
        "float base power",
    );
}
