use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::engine::core::column::Column;
use crate::engine::types::{ScalarType, Schema, Value};

static NAME_EXPR: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[A-Za-z_][A-Za-z0-9_]*$").expect("valid name expression"));

/// Validates the name of a column.
pub fn is_valid_name(name: &str) -> bool {
    NAME_EXPR.is_match(name)
}

/// A set of named columns discovered lazily as values arrive. Columns may
/// grow unevenly between rows of heterogeneous shape; `fill_nulls` levels
/// them back to a rectangle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Columns(BTreeMap<String, Column>);

impl Columns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initializes one empty column per schema entry.
    pub fn with_schema(schema: &Schema) -> Self {
        let mut columns = BTreeMap::new();
        for (name, typ) in schema.iter() {
            if let Some(column) = Column::new(*typ) {
                columns.insert(name.clone(), column);
            }
        }
        Columns(columns)
    }

    /// Adds a value under a column name, returning the bytes added.
    ///
    /// Invalid names and `Unsupported` types are dropped (returning 0, no
    /// mutation). A name first seen at row index r > 0 creates a column
    /// pre-padded with r-1 nulls so the append lands at the current max.
    pub fn append(&mut self, name: &str, value: Value, typ: ScalarType) -> usize {
        if !is_valid_name(name) {
            return 0;
        }

        if let Some(column) = self.0.get_mut(name) {
            return column.append(value);
        }

        if typ == ScalarType::Unsupported {
            return 0;
        }

        let Some(mut column) = Column::new(typ) else {
            return 0;
        };

        let mut size = 0;
        let until = self.max().saturating_sub(1);
        for _ in 0..until {
            size += column.append(Value::Null);
        }

        size += column.append(value);
        self.0.insert(name.to_owned(), column);
        size
    }

    /// The maximum row count across all columns.
    pub fn max(&self) -> usize {
        self.0.values().map(Column::count).max().unwrap_or(0)
    }

    /// Appends nulls onto every column shorter than the max; afterwards all
    /// columns have equal length.
    pub fn fill_nulls(&mut self) -> usize {
        let max = self.max();
        let mut size = 0;
        for column in self.0.values_mut() {
            let delta = max - column.count();
            for _ in 0..delta {
                size += column.append(Value::Null);
            }
        }
        size
    }

    /// The last value of every column, keyed by name.
    pub fn last_row(&self) -> BTreeMap<String, Value> {
        self.0
            .iter()
            .map(|(name, column)| (name.clone(), column.last()))
            .collect()
    }

    /// The space required by the whole set, in bytes.
    pub fn size_bytes(&self) -> usize {
        self.0.values().map(Column::size_bytes).sum()
    }

    /// The schema observed so far.
    pub fn schema(&self) -> Schema {
        self.0
            .iter()
            .map(|(name, column)| (name.clone(), column.kind()))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&Column> {
        self.0.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, column: Column) {
        self.0.insert(name.into(), column);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Column)> {
        self.0.iter()
    }

    pub(crate) fn into_inner(self) -> BTreeMap<String, Column> {
        self.0
    }

    pub(crate) fn from_inner(columns: BTreeMap<String, Column>) -> Self {
        Columns(columns)
    }
}
