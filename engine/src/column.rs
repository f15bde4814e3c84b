//! Field descriptors and hydration from storage rows.
//!
//! The storage layer hands over a row of typed column values; the engine never
//! queries storage itself.

use crate::{
    clock::{Clock, SystemClock},
    error::Result,
    kind::RecordKind,
    Record,
};
use serde_json::Value;
use std::collections::HashMap;

/// Declared primitive type of a column, used to tell booleans from text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    Text,
    Boolean,
}

/// A field a record kind knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub primitive: PrimitiveType,
    /// Bookkeeping; a record holding only internal fields is not valid.
    pub internal: bool,
    /// Hidden from user-facing values.
    pub system: bool,
}

impl Column {
    /// Bookkeeping text column, hidden from users.
    pub const fn internal(name: &'static str) -> Self {
        Self {
            name,
            primitive: PrimitiveType::Text,
            internal: true,
            system: true,
        }
    }

    /// Bookkeeping boolean column, hidden from users.
    pub const fn internal_flag(name: &'static str) -> Self {
        Self {
            name,
            primitive: PrimitiveType::Boolean,
            internal: true,
            system: true,
        }
    }

    /// Hidden from users but counts as content.
    pub const fn system(name: &'static str) -> Self {
        Self {
            name,
            primitive: PrimitiveType::Text,
            internal: false,
            system: true,
        }
    }

    /// User data mirrored into its own column.
    pub const fn user(name: &'static str) -> Self {
        Self {
            name,
            primitive: PrimitiveType::Text,
            internal: false,
            system: false,
        }
    }
}

/// A typed cell value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnValue {
    Null,
    Text(String),
    Integer(i64),
}

impl ColumnValue {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ColumnValue::Integer(i) => Some(*i),
            ColumnValue::Text(s) => s.trim().parse().ok(),
            ColumnValue::Null => None,
        }
    }

    pub fn as_text(&self) -> Option<String> {
        match self {
            ColumnValue::Text(s) => Some(s.clone()),
            ColumnValue::Integer(i) => Some(i.to_string()),
            ColumnValue::Null => None,
        }
    }
}

/// One row handed over by the storage layer.
pub trait StorageRow {
    /// Value of a column, `None` if the row has no such column.
    fn column_value(&self, name: &str) -> Option<ColumnValue>;
}

/// In-memory row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapRow {
    columns: HashMap<String, ColumnValue>,
}

impl MapRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style column setter.
    pub fn with(mut self, name: impl Into<String>, value: ColumnValue) -> Self {
        self.columns.insert(name.into(), value);
        self
    }

    pub fn with_text(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(name, ColumnValue::Text(value.into()))
    }

    pub fn with_integer(self, name: impl Into<String>, value: i64) -> Self {
        self.with(name, ColumnValue::Integer(value))
    }
}

impl StorageRow for MapRow {
    fn column_value(&self, name: &str) -> Option<ColumnValue> {
        self.columns.get(name).cloned()
    }
}

impl Record {
    /// Build a record of `kind` from a storage row.
    pub fn hydrate(row: &dyn StorageRow, kind: &dyn RecordKind) -> Result<Self> {
        Self::hydrate_with_clock(row, kind, &SystemClock)
    }

    /// Parse the kind's content column, then overlay every other declared
    /// column present in the row. Boolean columns read `1` as true, and a
    /// `histories` column holding JSON text is expanded into an array.
    pub fn hydrate_with_clock(
        row: &dyn StorageRow,
        kind: &dyn RecordKind,
        clock: &dyn Clock,
    ) -> Result<Self> {
        let content_column = kind.content_column();
        let content = row
            .column_value(content_column)
            .and_then(|value| value.as_text())
            .unwrap_or_default();
        let mut record = Self::from_json_with_clock(&content, clock)?;

        for column in kind.columns() {
            if column.name == content_column {
                continue;
            }
            let Some(value) = row.column_value(column.name) else {
                continue;
            };
            match (column.primitive, value) {
                (_, ColumnValue::Null) => record.put(column.name, Value::Null),
                (PrimitiveType::Boolean, value) => {
                    record.put(column.name, value.as_integer() == Some(1))
                }
                (PrimitiveType::Text, value) => record.put(column.name, value.as_text()),
            }
        }

        record.normalize_stored_histories()?;
        Ok(record)
    }
}
