use crate::engine::core::block::{Computed, JsonPayload, Row};
use crate::engine::types::{ScalarType, Value};

#[test]
fn json_payload_serializes_the_whole_row() {
    let column = JsonPayload::new("data");
    assert_eq!("data", column.name());
    assert_eq!(ScalarType::Json, column.kind());

    let mut row = Row::new();
    row.set("a", Value::Str("hello".into()));
    row.set("n", Value::I64(5));

    let Value::Json(bytes) = column.apply(&row) else {
        panic!("expected a JSON value");
    };
    let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(serde_json::json!({"a": "hello", "n": 5}), parsed);
}

#[test]
fn json_payload_of_empty_row_is_an_empty_object() {
    let column = JsonPayload::new("data");
    let Value::Json(bytes) = column.apply(&Row::new()) else {
        panic!("expected a JSON value");
    };
    assert_eq!(b"{}".to_vec(), bytes);
}
