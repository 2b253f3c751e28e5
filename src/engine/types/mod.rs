use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use arrow_schema::{DataType, TimeUnit};
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value as JsonValue};

/// The scalar types a column can carry. `Unsupported` values are silently
/// dropped at append time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    String,
    Int32,
    Int64,
    Float64,
    Bool,
    Timestamp,
    Json,
    Unsupported,
}

impl ScalarType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarType::String => "VARCHAR",
            ScalarType::Int32 => "INTEGER",
            ScalarType::Int64 => "BIGINT",
            ScalarType::Float64 => "DOUBLE",
            ScalarType::Bool => "BOOLEAN",
            ScalarType::Timestamp => "TIMESTAMP",
            ScalarType::Json => "JSON",
            ScalarType::Unsupported => "UNSUPPORTED",
        }
    }

    pub fn to_arrow_data_type(&self) -> DataType {
        match self {
            ScalarType::String | ScalarType::Json => DataType::LargeUtf8,
            ScalarType::Int32 => DataType::Int32,
            ScalarType::Int64 => DataType::Int64,
            ScalarType::Float64 => DataType::Float64,
            ScalarType::Bool => DataType::Boolean,
            ScalarType::Timestamp => DataType::Timestamp(TimeUnit::Millisecond, None),
            ScalarType::Unsupported => DataType::Null,
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScalarType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VARCHAR" | "STRING" => Ok(ScalarType::String),
            "INTEGER" | "INT32" => Ok(ScalarType::Int32),
            "BIGINT" | "INT64" => Ok(ScalarType::Int64),
            "DOUBLE" | "FLOAT64" => Ok(ScalarType::Float64),
            "BOOLEAN" | "BOOL" => Ok(ScalarType::Bool),
            "TIMESTAMP" => Ok(ScalarType::Timestamp),
            "JSON" => Ok(ScalarType::Json),
            _ => Err(()),
        }
    }
}

/// Unix instant carried as whole seconds plus a nanosecond remainder.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: u32,
}

impl Timestamp {
    pub fn new(seconds: i64, nanos: u32) -> Self {
        Self { seconds, nanos }
    }

    pub fn from_nanos(nanos: i64) -> Self {
        Self {
            seconds: nanos.div_euclid(1_000_000_000),
            nanos: nanos.rem_euclid(1_000_000_000) as u32,
        }
    }

    pub fn as_nanos(&self) -> i64 {
        self.seconds
            .saturating_mul(1_000_000_000)
            .saturating_add(self.nanos as i64)
    }

    pub fn as_millis(&self) -> i64 {
        self.seconds
            .saturating_mul(1_000)
            .saturating_add((self.nanos / 1_000_000) as i64)
    }

    pub fn now() -> Self {
        Self::from_nanos(crate::shared::time::unix_nanos())
    }
}

/// A dynamically typed scalar as it arrives from ingest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Str(String),
    I32(i32),
    I64(i64),
    F64(f64),
    Bool(bool),
    Ts(Timestamp),
    Json(Vec<u8>),
}

impl Value {
    /// The column type this value would create; `None` for nulls.
    pub fn kind(&self) -> Option<ScalarType> {
        match self {
            Value::Null => None,
            Value::Str(_) => Some(ScalarType::String),
            Value::I32(_) => Some(ScalarType::Int32),
            Value::I64(_) => Some(ScalarType::Int64),
            Value::F64(_) => Some(ScalarType::Float64),
            Value::Bool(_) => Some(ScalarType::Bool),
            Value::Ts(_) => Some(ScalarType::Timestamp),
            Value::Json(_) => Some(ScalarType::Json),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Value::Ts(ts) => Some(*ts),
            Value::I64(nanos) => Some(Timestamp::from_nanos(*nanos)),
            _ => None,
        }
    }

    /// Stringified form used for partition values: numerics render base-10,
    /// bytes as utf-8, nulls as the empty string.
    pub fn partition_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Str(s) => s.clone(),
            Value::I32(i) => i.to_string(),
            Value::I64(i) => i.to_string(),
            Value::F64(f) => f.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Ts(ts) => ts.as_nanos().to_string(),
            Value::Json(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        }
    }

    pub fn from_json(value: JsonValue) -> Value {
        match value {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(num) => {
                if let Some(i) = num.as_i64() {
                    Value::I64(i)
                } else if let Some(f) = num.as_f64() {
                    Value::F64(f)
                } else {
                    Value::Str(num.to_string())
                }
            }
            JsonValue::String(s) => Value::Str(s),
            JsonValue::Array(_) | JsonValue::Object(_) => {
                Value::Json(serde_json::to_vec(&value).unwrap_or_default())
            }
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Str(s) => JsonValue::String(s.clone()),
            Value::I32(i) => JsonValue::Number(Number::from(*i)),
            Value::I64(i) => JsonValue::Number(Number::from(*i)),
            Value::F64(f) => Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Ts(ts) => JsonValue::Number(Number::from(ts.as_nanos())),
            Value::Json(bytes) => serde_json::from_slice(bytes)
                .unwrap_or_else(|_| JsonValue::String(String::from_utf8_lossy(bytes).into_owned())),
        }
    }
}

/// An ordered mapping from column name to scalar type. Iteration order is
/// sorted by name, which is the one deterministic column ordering used by
/// the block codec, the merger and the wire pages alike.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema(BTreeMap<String, ScalarType>);

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, typ: ScalarType) {
        self.0.insert(name.into(), typ);
    }

    pub fn get(&self, name: &str) -> Option<ScalarType> {
        self.0.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Column names in sorted order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|s| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ScalarType)> {
        self.0.iter()
    }

    /// Name-wise merge of two schemas. Fails when a shared name maps to two
    /// different types.
    pub fn union(&self, other: &Schema) -> Option<Schema> {
        let mut merged = self.clone();
        for (name, typ) in other.iter() {
            match merged.get(name) {
                Some(existing) if existing != *typ => return None,
                Some(_) => {}
                None => merged.insert(name.clone(), *typ),
            }
        }
        Some(merged)
    }
}

impl FromIterator<(String, ScalarType)> for Schema {
    fn from_iter<T: IntoIterator<Item = (String, ScalarType)>>(iter: T) -> Self {
        Schema(iter.into_iter().collect())
    }
}

/// Best-effort coercion of a string into a typed value: base-10 integers,
/// floats and RFC-3339 timestamps. Any parse failure yields `None` and the
/// caller treats the value as null.
pub fn try_parse(input: &str, typ: ScalarType) -> Option<Value> {
    match typ {
        ScalarType::String => Some(Value::Str(input.to_owned())),
        ScalarType::Int32 => input.parse::<i32>().ok().map(Value::I32),
        ScalarType::Int64 => input.parse::<i64>().ok().map(Value::I64),
        ScalarType::Float64 => input.parse::<f64>().ok().map(Value::F64),
        ScalarType::Bool => input.parse::<bool>().ok().map(Value::Bool),
        ScalarType::Timestamp => DateTime::parse_from_rfc3339(input)
            .ok()
            .map(|dt| Value::Ts(Timestamp::new(dt.timestamp(), dt.timestamp_subsec_nanos()))),
        ScalarType::Json | ScalarType::Unsupported => None,
    }
}
