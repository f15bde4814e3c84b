//! The JSON-backed record and its write-normalization rules.
//!
//! A [`Record`] is an ordered map of field name to JSON value. Every write goes
//! through [`Record::put`], which trims strings and turns empty strings, empty
//! arrays and `null` into "field absent". Presence of a key therefore always
//! means the field has meaningful content.

use crate::{
    actor::ActorContext,
    clock::{Clock, SystemClock},
    error::{Error, Result},
    history::{histories_from_value, HistoryEntry},
    keys,
    reconcile::HistoryReconciler,
    snapshot::RecordSnapshot,
    Fields,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// Number of trailing characters of the unique id shown to people.
pub const SHORT_ID_LENGTH: usize = 7;

/// Generate a fresh, globally unique record id.
pub fn new_unique_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Apply the write rules to a value.
///
/// Returns `None` when the value must be stored as "absent".
pub fn normalize(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else if trimmed.len() == s.len() {
                Some(Value::String(s))
            } else {
                Some(Value::String(trimmed.to_string()))
            }
        }
        Value::Array(items) if items.is_empty() => None,
        other => Some(other),
    }
}

/// External string form of a field value, as compared by the history diff.
///
/// Absent and `null` read as `""`, strings as their content, anything else as
/// compact JSON.
pub fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A domain record (case, enquiry, ...) stored as a JSON object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: Fields,
}

impl Record {
    /// Create an empty, unsynced record stamped with the current time.
    pub fn new() -> Self {
        Self::with_clock(&SystemClock)
    }

    /// Create an empty, unsynced record stamped by `clock`.
    ///
    /// No unique id is assigned; kinds that want one eagerly add it.
    pub fn with_clock(clock: &dyn Clock) -> Self {
        let mut record = Self {
            fields: Fields::new(),
        };
        record.set_synced(false);
        record.put(keys::CREATED_AT, clock.now_text());
        record
    }

    /// Parse a record from JSON text. Blank input is an empty object.
    pub fn from_json(content: &str) -> Result<Self> {
        Self::from_json_with_clock(content, &SystemClock)
    }

    /// Parse a record from JSON text, reading "now" from `clock`.
    pub fn from_json_with_clock(content: &str, clock: &dyn Clock) -> Result<Self> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Ok(Self::from_fields_with_clock(Fields::new(), clock));
        }

        match serde_json::from_str::<Value>(trimmed)? {
            Value::Object(fields) => Ok(Self::from_fields_with_clock(fields, clock)),
            other => Err(Error::NotAnObject(json_type_name(&other).to_string())),
        }
    }

    /// Build a record from an already-parsed object.
    pub fn from_fields(fields: Fields) -> Self {
        Self::from_fields_with_clock(fields, &SystemClock)
    }

    /// Build a record from an already-parsed object, reading "now" from `clock`.
    ///
    /// Every field is written through [`Record::put`], then `created_at`,
    /// `synced` and `unique_identifier` are filled in when missing.
    pub fn from_fields_with_clock(fields: Fields, clock: &dyn Clock) -> Self {
        let mut record = Self {
            fields: Fields::with_capacity(fields.len()),
        };
        for (key, value) in fields {
            record.put(key, value);
        }

        if !record.contains(keys::CREATED_AT) {
            record.put(keys::CREATED_AT, clock.now_text());
        }
        if !record.contains(keys::SYNCED) {
            record.set_synced(false);
        }
        record.generate_unique_id();
        record
    }

    /// Parse `content` and claim it for `owner` under the given id.
    pub fn owned(id: impl Into<String>, owner: impl Into<String>, content: &str) -> Result<Self> {
        Self::owned_with_clock(id, owner, content, &SystemClock)
    }

    /// [`Record::owned`] with an explicit clock.
    pub fn owned_with_clock(
        id: impl Into<String>,
        owner: impl Into<String>,
        content: &str,
        clock: &dyn Clock,
    ) -> Result<Self> {
        let mut record = Self::from_json_with_clock(content, clock)?;
        record.set_unique_id(id);
        // a blank id normalizes away; never leave the record without one
        record.generate_unique_id();
        record.set_created_by(owner);
        if !record.contains(keys::SYNCED) {
            record.set_synced(false);
        }
        Ok(record)
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Write a field, normalizing blank values to "absent".
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        match normalize(value.into()) {
            Some(value) => {
                self.fields.insert(key, value);
            }
            None => {
                self.fields.shift_remove(&key);
            }
        }
    }

    /// Write any serializable value.
    ///
    /// Values that cannot be represented as JSON are dropped and logged; the
    /// prior value, if any, is kept.
    pub fn put_serialized<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) {
        match serde_json::to_value(value) {
            Ok(value) => self.put(key, value),
            Err(err) => {
                tracing::error!(field = key, error = %err, "dropping unrepresentable write");
            }
        }
    }

    /// Remove a field, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.shift_remove(key)
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Read a string field. Non-string values read as absent.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.fields.get(key)? {
            Value::String(s) => Some(s),
            other => {
                tracing::debug!(
                    field = key,
                    found = json_type_name(other),
                    "expected a string field"
                );
                None
            }
        }
    }

    /// The string form of a field used when diffing.
    pub fn display_value(&self, key: &str) -> String {
        display_value(self.fields.get(key))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// All field names in insertion order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
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

    pub fn into_fields(self) -> Fields {
        self.fields
    }

    // ------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------

    pub fn unique_id(&self) -> Option<&str> {
        self.get_str(keys::UNIQUE_ID)
    }

    pub fn set_unique_id(&mut self, id: impl Into<String>) {
        self.put(keys::UNIQUE_ID, id.into());
    }

    /// Assign a fresh unique id unless one is already present.
    ///
    /// A numeric or boolean id is kept in its text form; any other
    /// non-string value is replaced.
    pub fn generate_unique_id(&mut self) {
        let replacement = match self.fields.get(keys::UNIQUE_ID) {
            Some(Value::String(_)) => None,
            Some(value @ (Value::Number(_) | Value::Bool(_))) => Some(display_value(Some(value))),
            _ => Some(new_unique_id()),
        };
        if let Some(id) = replacement {
            self.set_unique_id(id);
        }
    }

    pub fn internal_id(&self) -> Option<&str> {
        self.get_str(keys::INTERNAL_ID)
    }

    pub fn revision_id(&self) -> Option<&str> {
        self.get_str(keys::REVISION_ID)
    }

    /// True until the storage layer assigns an internal id.
    pub fn is_new(&self) -> bool {
        !self.contains(keys::INTERNAL_ID)
    }

    /// Last [`SHORT_ID_LENGTH`] characters of the unique id, for display only.
    pub fn short_id(&self) -> Option<String> {
        let id = self.unique_id()?;
        let length = id.chars().count();
        if length > SHORT_ID_LENGTH {
            Some(id.chars().skip(length - SHORT_ID_LENGTH).collect())
        } else {
            Some(id.to_string())
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle fields
    // ------------------------------------------------------------------

    pub fn created_at(&self) -> Option<&str> {
        self.get_str(keys::CREATED_AT)
    }

    pub fn last_updated_at(&self) -> Option<&str> {
        self.get_str(keys::LAST_UPDATED_AT)
    }

    pub fn set_last_updated_at(&mut self, at: impl Into<String>) {
        self.put(keys::LAST_UPDATED_AT, at.into());
    }

    pub fn last_synced_at(&self) -> Option<&str> {
        self.get_str(keys::LAST_SYNCED_AT)
    }

    pub fn created_by(&self) -> Option<&str> {
        self.get_str(keys::CREATED_BY)
    }

    pub fn set_created_by(&mut self, owner: impl Into<String>) {
        self.put(keys::CREATED_BY, owner.into());
    }

    pub fn created_organisation(&self) -> Option<&str> {
        self.get_str(keys::CREATED_ORGANISATION)
    }

    pub fn set_organisation(&mut self, organisation: impl Into<String>) {
        self.put(keys::CREATED_ORGANISATION, organisation.into());
    }

    /// Display name, `""` when unset.
    pub fn name(&self) -> &str {
        self.get_str(keys::NAME).unwrap_or("")
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.put(keys::NAME, name.into());
    }

    /// Whether the current state has been uploaded. Absent reads as `false`.
    pub fn is_synced(&self) -> bool {
        match self.fields.get(keys::SYNCED) {
            Some(Value::Bool(synced)) => *synced,
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    pub fn set_synced(&mut self, synced: bool) {
        self.put(keys::SYNCED, synced);
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    /// The stored history entries, oldest first.
    pub fn histories(&self) -> Result<Vec<HistoryEntry>> {
        histories_from_value(self.fields.get(keys::HISTORIES))
    }

    /// Replace the stored history. An empty list removes the field.
    pub fn set_histories(&mut self, entries: &[HistoryEntry]) {
        self.put_serialized(keys::HISTORIES, entries);
    }

    /// Expand a `histories` field stored as JSON text into a JSON array.
    pub fn normalize_stored_histories(&mut self) -> Result<()> {
        let text = match self.fields.get(keys::HISTORIES) {
            Some(Value::String(text)) => text.clone(),
            _ => return Ok(()),
        };

        let parsed: Value = serde_json::from_str(&text)?;
        if !parsed.is_array() {
            return Err(Error::InvalidHistory(format!(
                "stored histories must be an array, got {}",
                json_type_name(&parsed)
            )));
        }
        self.put(keys::HISTORIES, parsed);
        Ok(())
    }

    /// Fold edits made since `previous` into the record's pending history
    /// entry and store the result back on the record.
    ///
    /// The `histories` field itself is left out of the diff, otherwise every
    /// fold would record the previous fold.
    pub fn fold_history(
        &mut self,
        previous: &RecordSnapshot,
        actor: &ActorContext,
        clock: &dyn Clock,
    ) -> Result<()> {
        let existing = self.histories()?;
        let current = self.snapshot().without(keys::HISTORIES);
        let folded = HistoryReconciler::new(actor, clock).reconcile(&current, previous, existing)?;
        self.set_histories(&folded);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Conversion
    // ------------------------------------------------------------------

    /// Freeze the current state for diffing.
    pub fn snapshot(&self) -> RecordSnapshot {
        RecordSnapshot::from(self)
    }

    /// Serialize to JSON text in insertion order.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.fields).map_err(|e| Error::Serialize(e.to_string()))
    }

    /// Serialize to indented JSON text.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.fields).map_err(|e| Error::Serialize(e.to_string()))
    }
}

impl Default for Record {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for Record {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_json(s)
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Fields::deserialize(deserializer).map(Self::from_fields)
    }
}
