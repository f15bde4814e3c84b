//! Immutable record snapshots.
//!
//! The history diff never reads a live [`Record`]; it compares two frozen
//! snapshots: the current state and the copy stored at the last sync.

use crate::{
    error::{Error, Result},
    keys,
    record::{display_value, json_type_name},
    Fields, Record,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A read-only copy of a record's fields.
///
/// Unlike [`Record`], loading a snapshot applies no defaults: it is exactly
/// what was stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordSnapshot {
    fields: Fields,
}

impl RecordSnapshot {
    pub fn from_fields(fields: Fields) -> Self {
        Self { fields }
    }

    /// Load a stored snapshot. Blank text is an empty snapshot.
    pub fn from_json(json: &str) -> Result<Self> {
        let trimmed = json.trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }

        match serde_json::from_str::<Value>(trimmed)? {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(Error::NotAnObject(json_type_name(&other).to_string())),
        }
    }

    /// The same snapshot minus one field.
    pub fn without(mut self, key: &str) -> Self {
        self.fields.shift_remove(key);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Field names in insertion order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// The string form of a field used when diffing.
    pub fn display_value(&self, key: &str) -> String {
        display_value(self.fields.get(key))
    }

    /// The sync cutoff, in its string form (`""` when absent).
    pub fn last_synced_at(&self) -> String {
        self.display_value(keys::LAST_SYNCED_AT)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Thaw into an editable record. Normalization and defaults apply.
    pub fn into_record(self) -> Record {
        Record::from_fields(self.fields)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.fields).map_err(|e| Error::Serialize(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.fields).map_err(|e| Error::Serialize(e.to_string()))
    }
}

impl From<&Record> for RecordSnapshot {
    fn from(record: &Record) -> Self {
        Self {
            fields: record.fields().clone(),
        }
    }
}

impl From<Record> for RecordSnapshot {
    fn from(record: Record) -> Self {
        Self {
            fields: record.into_fields(),
        }
    }
}
