use serde::{Deserialize, Serialize};

use crate::engine::core::column::page::{
    BigintPage, BooleanPage, ColumnPage, DoublePage, IntegerPage, TimestampPage, VarcharPage,
};
use crate::engine::types::{ScalarType, Timestamp, Value};

/// An appendable, nullable, typed vector of values. Appending a null (or a
/// value of the wrong type) records a null marker alongside the type's zero
/// value, so every row index holds exactly one slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Column {
    Varchar(VarcharColumn),
    Int32(Int32Column),
    Int64(Int64Column),
    Float64(Float64Column),
    Bool(BoolColumn),
    Timestamp(TimestampColumn),
    Json(JsonColumn),
}

impl Column {
    /// Creates an empty column of the given type; `Unsupported` has no
    /// column representation.
    pub fn new(typ: ScalarType) -> Option<Column> {
        match typ {
            ScalarType::String => Some(Column::Varchar(VarcharColumn::default())),
            ScalarType::Int32 => Some(Column::Int32(Int32Column::default())),
            ScalarType::Int64 => Some(Column::Int64(Int64Column::default())),
            ScalarType::Float64 => Some(Column::Float64(Float64Column::default())),
            ScalarType::Bool => Some(Column::Bool(BoolColumn::default())),
            ScalarType::Timestamp => Some(Column::Timestamp(TimestampColumn::default())),
            ScalarType::Json => Some(Column::Json(JsonColumn::default())),
            ScalarType::Unsupported => None,
        }
    }

    pub fn kind(&self) -> ScalarType {
        match self {
            Column::Varchar(_) => ScalarType::String,
            Column::Int32(_) => ScalarType::Int32,
            Column::Int64(_) => ScalarType::Int64,
            Column::Float64(_) => ScalarType::Float64,
            Column::Bool(_) => ScalarType::Bool,
            Column::Timestamp(_) => ScalarType::Timestamp,
            Column::Json(_) => ScalarType::Json,
        }
    }

    /// Appends a value, returning the number of bytes added. A value whose
    /// type does not match the column records a null instead.
    pub fn append(&mut self, value: Value) -> usize {
        match self {
            Column::Varchar(col) => match value {
                Value::Str(s) => col.push(Some(s.as_bytes())),
                _ => col.push(None),
            },
            Column::Int32(col) => match value {
                Value::I32(v) => col.push(Some(v)),
                _ => col.push(None),
            },
            Column::Int64(col) => match value {
                Value::I64(v) => col.push(Some(v)),
                _ => col.push(None),
            },
            Column::Float64(col) => match value {
                Value::F64(v) => col.push(Some(v)),
                _ => col.push(None),
            },
            Column::Bool(col) => match value {
                Value::Bool(v) => col.push(Some(v)),
                _ => col.push(None),
            },
            Column::Timestamp(col) => match value {
                Value::Ts(ts) => col.push(Some(ts)),
                _ => col.push(None),
            },
            Column::Json(col) => match value {
                Value::Json(bytes) => col.push(Some(&bytes)),
                _ => col.push(None),
            },
        }
    }

    pub fn count(&self) -> usize {
        match self {
            Column::Varchar(col) => col.nulls.len(),
            Column::Int32(col) => col.nulls.len(),
            Column::Int64(col) => col.nulls.len(),
            Column::Float64(col) => col.nulls.len(),
            Column::Bool(col) => col.nulls.len(),
            Column::Timestamp(col) => col.nulls.len(),
            Column::Json(col) => col.nulls.len(),
        }
    }

    /// The value at the given row index; `Null` when the slot is null or
    /// out of range.
    pub fn value_at(&self, row: usize) -> Value {
        if row >= self.count() {
            return Value::Null;
        }
        match self {
            Column::Varchar(col) => col.value_at(row),
            Column::Int32(col) => {
                if col.nulls[row] {
                    Value::Null
                } else {
                    Value::I32(col.values[row])
                }
            }
            Column::Int64(col) => {
                if col.nulls[row] {
                    Value::Null
                } else {
                    Value::I64(col.values[row])
                }
            }
            Column::Float64(col) => {
                if col.nulls[row] {
                    Value::Null
                } else {
                    Value::F64(col.values[row])
                }
            }
            Column::Bool(col) => {
                if col.nulls[row] {
                    Value::Null
                } else {
                    Value::Bool(col.values[row])
                }
            }
            Column::Timestamp(col) => {
                if col.nulls[row] {
                    Value::Null
                } else {
                    Value::Ts(Timestamp::new(col.seconds[row], col.nanos[row] as u32))
                }
            }
            Column::Json(col) => col.value_at(row),
        }
    }

    /// The most recently appended value.
    pub fn last(&self) -> Value {
        match self.count() {
            0 => Value::Null,
            n => self.value_at(n - 1),
        }
    }

    /// Approximate heap footprint; monotone nondecreasing under appends.
    pub fn size_bytes(&self) -> usize {
        match self {
            Column::Varchar(col) => col.bytes.len() + col.sizes.len() * 4 + col.nulls.len(),
            Column::Int32(col) => col.values.len() * 4 + col.nulls.len(),
            Column::Int64(col) => col.values.len() * 8 + col.nulls.len(),
            Column::Float64(col) => col.values.len() * 8 + col.nulls.len(),
            Column::Bool(col) => col.values.len() + col.nulls.len(),
            Column::Timestamp(col) => col.seconds.len() * 16 + col.nulls.len(),
            Column::Json(col) => col.bytes.len() + col.sizes.len() * 4 + col.nulls.len(),
        }
    }

    /// The wire view of this column, usable as one query response page.
    /// JSON renders as varchar on the wire.
    pub fn as_page(&self) -> ColumnPage {
        match self {
            Column::Varchar(col) => ColumnPage::Varchar(VarcharPage {
                bytes: col.bytes.clone(),
                sizes: col.sizes.clone(),
                nulls: col.nulls.clone(),
            }),
            Column::Int32(col) => ColumnPage::Integer(IntegerPage {
                ints: col.values.clone(),
                nulls: col.nulls.clone(),
            }),
            Column::Int64(col) => ColumnPage::Bigint(BigintPage {
                longs: col.values.clone(),
                nulls: col.nulls.clone(),
            }),
            Column::Float64(col) => ColumnPage::Double(DoublePage {
                doubles: col.values.clone(),
                nulls: col.nulls.clone(),
            }),
            Column::Bool(col) => ColumnPage::Boolean(BooleanPage {
                booleans: col.values.clone(),
                nulls: col.nulls.clone(),
            }),
            Column::Timestamp(col) => {
                let timestamps = col
                    .seconds
                    .iter()
                    .zip(col.nanos.iter())
                    .map(|(s, n)| Timestamp::new(*s, *n as u32).as_millis())
                    .collect();
                ColumnPage::Timestamp(TimestampPage {
                    timestamps,
                    nulls: col.nulls.clone(),
                })
            }
            Column::Json(col) => ColumnPage::Varchar(VarcharPage {
                bytes: col.bytes.clone(),
                sizes: col.sizes.clone(),
                nulls: col.nulls.clone(),
            }),
        }
    }
}

/// Contiguous byte payload plus per-row sizes and null flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VarcharColumn {
    pub(crate) bytes: Vec<u8>,
    pub(crate) sizes: Vec<i32>,
    pub(crate) nulls: Vec<bool>,
}

impl VarcharColumn {
    fn push(&mut self, value: Option<&[u8]>) -> usize {
        match value {
            Some(bytes) => {
                self.bytes.extend_from_slice(bytes);
                self.sizes.push(bytes.len() as i32);
                self.nulls.push(false);
                5 + bytes.len()
            }
            None => {
                self.sizes.push(0);
                self.nulls.push(true);
                5
            }
        }
    }

    fn value_at(&self, row: usize) -> Value {
        if self.nulls[row] {
            return Value::Null;
        }
        let (start, len) = self.offset_of(row);
        Value::Str(String::from_utf8_lossy(&self.bytes[start..start + len]).into_owned())
    }

    fn offset_of(&self, row: usize) -> (usize, usize) {
        let start: usize = self.sizes[..row].iter().map(|s| *s as usize).sum();
        (start, self.sizes[row] as usize)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Int32Column {
    pub(crate) values: Vec<i32>,
    pub(crate) nulls: Vec<bool>,
}

impl Int32Column {
    fn push(&mut self, value: Option<i32>) -> usize {
        self.values.push(value.unwrap_or_default());
        self.nulls.push(value.is_none());
        5
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Int64Column {
    pub(crate) values: Vec<i64>,
    pub(crate) nulls: Vec<bool>,
}

impl Int64Column {
    fn push(&mut self, value: Option<i64>) -> usize {
        self.values.push(value.unwrap_or_default());
        self.nulls.push(value.is_none());
        9
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Float64Column {
    pub(crate) values: Vec<f64>,
    pub(crate) nulls: Vec<bool>,
}

impl Float64Column {
    fn push(&mut self, value: Option<f64>) -> usize {
        self.values.push(value.unwrap_or_default());
        self.nulls.push(value.is_none());
        9
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoolColumn {
    pub(crate) values: Vec<bool>,
    pub(crate) nulls: Vec<bool>,
}

impl BoolColumn {
    fn push(&mut self, value: Option<bool>) -> usize {
        self.values.push(value.unwrap_or_default());
        self.nulls.push(value.is_none());
        2
    }
}

/// Two parallel vectors: whole seconds and the nanosecond remainder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimestampColumn {
    pub(crate) seconds: Vec<i64>,
    pub(crate) nanos: Vec<i64>,
    pub(crate) nulls: Vec<bool>,
}

impl TimestampColumn {
    fn push(&mut self, value: Option<Timestamp>) -> usize {
        let ts = value.unwrap_or_default();
        self.seconds.push(ts.seconds);
        self.nanos.push(ts.nanos as i64);
        self.nulls.push(value.is_none());
        17
    }
}

/// Opaque JSON payloads, stored like varchar rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonColumn {
    pub(crate) bytes: Vec<u8>,
    pub(crate) sizes: Vec<i32>,
    pub(crate) nulls: Vec<bool>,
}

impl JsonColumn {
    fn push(&mut self, value: Option<&[u8]>) -> usize {
        match value {
            Some(bytes) => {
                self.bytes.extend_from_slice(bytes);
                self.sizes.push(bytes.len() as i32);
                self.nulls.push(false);
                5 + bytes.len()
            }
            None => {
                self.sizes.push(0);
                self.nulls.push(true);
                5
            }
        }
    }

    fn value_at(&self, row: usize) -> Value {
        if self.nulls[row] {
            return Value::Null;
        }
        let start: usize = self.sizes[..row].iter().map(|s| *s as usize).sum();
        let len = self.sizes[row] as usize;
        Value::Json(self.bytes[start..start + len].to_vec())
    }
}
