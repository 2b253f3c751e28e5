use crate::engine::core::column::{is_valid_name, ColumnPage, Columns};
use crate::engine::types::{ScalarType, Value};

#[test]
fn heterogeneous_appends_fill_with_nulls() {
    let mut nc = Columns::new();

    // Fill level 1
    assert_ne!(0, nc.append("a", Value::I32(1), ScalarType::Int32));
    assert_ne!(0, nc.append("b", Value::I32(2), ScalarType::Int32));
    assert_eq!(0, nc.append("123", Value::I32(2), ScalarType::Int32)); // Invalid
    assert_eq!(0, nc.append("x", Value::Null, ScalarType::Unsupported));
    assert_eq!(1, nc.max());
    assert_eq!(2, nc.last_row().len());
    nc.fill_nulls();

    // Fill level 2
    assert_ne!(0, nc.append("a", Value::I32(1), ScalarType::Int32));
    assert_ne!(0, nc.append("c", Value::Str("hi".into()), ScalarType::String));
    assert_eq!(2, nc.max());
    nc.fill_nulls();

    // Fill level 3
    assert_ne!(0, nc.append("b", Value::I32(1), ScalarType::Int32));
    assert_ne!(0, nc.append("c", Value::Str("hi".into()), ScalarType::String));
    assert_ne!(0, nc.append("d", Value::F64(1.5), ScalarType::Float64));
    assert_eq!(3, nc.max());
    nc.fill_nulls();

    // Must have 3 levels with nulls in the middle
    let ColumnPage::Integer(a) = nc.get("a").unwrap().as_page() else {
        panic!("a is an integer column");
    };
    assert_eq!(vec![1, 1, 0], a.ints);
    assert_eq!(vec![false, false, true], a.nulls);

    let ColumnPage::Integer(b) = nc.get("b").unwrap().as_page() else {
        panic!("b is an integer column");
    };
    assert_eq!(vec![2, 0, 1], b.ints);
    assert_eq!(vec![false, true, false], b.nulls);

    let ColumnPage::Varchar(c) = nc.get("c").unwrap().as_page() else {
        panic!("c is a varchar column");
    };
    assert_eq!(vec![0x68, 0x69, 0x68, 0x69], c.bytes);
    assert_eq!(vec![0, 2, 2], c.sizes);
    assert_eq!(vec![true, false, false], c.nulls);

    let ColumnPage::Double(d) = nc.get("d").unwrap().as_page() else {
        panic!("d is a double column");
    };
    assert_eq!(vec![0.0, 0.0, 1.5], d.doubles);
    assert_eq!(vec![true, true, false], d.nulls);

    assert_eq!(4, nc.last_row().len());
}

#[test]
fn invalid_name_is_rejected_without_mutation() {
    let mut columns = Columns::new();
    assert_ne!(0, columns.append("ok", Value::I64(1), ScalarType::Int64));
    let max_before = columns.max();

    assert_eq!(
        0,
        columns.append("/api/v1", Value::Str("x".into()), ScalarType::String)
    );
    assert_eq!(max_before, columns.max());
    assert_eq!(1, columns.len());
}

#[test]
fn fill_nulls_levels_every_column_to_max() {
    let mut columns = Columns::new();
    columns.append("a", Value::I64(1), ScalarType::Int64);
    columns.fill_nulls();
    columns.append("a", Value::I64(2), ScalarType::Int64);
    columns.append("b", Value::Str("x".into()), ScalarType::String);
    columns.append("c", Value::Bool(true), ScalarType::Bool);
    columns.fill_nulls();

    let max = columns.max();
    for (_, column) in columns.iter() {
        assert_eq!(max, column.count());
    }
}

#[test]
fn mismatched_value_records_a_null() {
    let mut columns = Columns::new();
    columns.append("n", Value::I64(1), ScalarType::Int64);
    // A string arriving on an int64 column becomes a null, not a panic.
    assert_ne!(
        0,
        columns.append("n", Value::Str("oops".into()), ScalarType::Int64)
    );

    let col = columns.get("n").unwrap();
    assert_eq!(2, col.count());
    assert_eq!(Value::Null, col.value_at(1));
}

#[test]
fn with_schema_creates_empty_typed_columns() {
    let mut schema = crate::engine::types::Schema::new();
    schema.insert("a", ScalarType::Int64);
    schema.insert("b", ScalarType::Timestamp);

    let columns = Columns::with_schema(&schema);
    assert_eq!(2, columns.len());
    assert_eq!(ScalarType::Int64, columns.get("a").unwrap().kind());
    assert_eq!(ScalarType::Timestamp, columns.get("b").unwrap().kind());
    assert_eq!(0, columns.max());
}

#[test]
fn name_validation() {
    assert!(is_valid_name("hi"));
    assert!(!is_valid_name("/api/v1/eta/nearby/"));
    assert!(!is_valid_name("15ffe3ca0ba2bef00000010955e2d54c"));
    assert!(is_valid_name("b3802fb30f58430ca7fa8c6e04cb8c76"));
    assert!(is_valid_name("server"));
    assert!(is_valid_name("_underscore"));
    assert!(!is_valid_name(""));
}
