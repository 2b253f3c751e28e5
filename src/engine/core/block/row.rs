use std::collections::BTreeMap;
use std::sync::Arc;

use crate::engine::core::block::Computed;
use crate::engine::core::column::Columns;
use crate::engine::types::{try_parse, Schema, Value};

/// A mutable scratch row used during ingest: a schema plus a name → value
/// map. Rows never outlive the request that produced them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    schema: Schema,
    values: BTreeMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a value, recording its type in the row schema. Nulls keep the
    /// slot but add no schema entry.
    pub fn set(&mut self, name: &str, value: Value) {
        if let Some(kind) = value.kind() {
            self.schema.insert(name, kind);
        }
        self.values.insert(name.to_owned(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Produces a new row with the filter schema applied and computed
    /// columns appended; the input row is not mutated.
    ///
    /// With a filter: only filtered names survive, and a value whose type
    /// differs from the filter's is coerced through `try_parse` when it is a
    /// string, or dropped otherwise. Computed columns are admitted only when
    /// the filter names them.
    pub fn transform(&self, computed: &[Arc<dyn Computed>], filter: Option<&Schema>) -> Row {
        let mut out = Row::new();

        match filter {
            None => {
                for (name, value) in &self.values {
                    out.set(name, value.clone());
                }
            }
            Some(filter) => {
                for (name, target) in filter.iter() {
                    let Some(value) = self.values.get(name) else {
                        continue;
                    };
                    match value.kind() {
                        Some(kind) if kind == *target => out.set(name, value.clone()),
                        _ => {
                            if let Some(parsed) =
                                value.as_str().and_then(|s| try_parse(s, *target))
                            {
                                out.set(name, parsed);
                            }
                        }
                    }
                }
            }
        }

        for column in computed {
            if let Some(filter) = filter {
                if !filter.contains(column.name()) {
                    continue;
                }
            }
            let value = column.apply(self);
            out.set(column.name(), value);
        }

        out
    }

    /// Appends every value of this row to the column set, returning the
    /// bytes added. The caller levels the set with `fill_nulls` afterwards.
    pub fn append_to(&self, columns: &mut Columns) -> usize {
        let mut size = 0;
        for (name, value) in &self.values {
            let Some(typ) = self.schema.get(name).or_else(|| value.kind()) else {
                continue;
            };
            size += columns.append(name, value.clone(), typ);
        }
        size
    }
}
