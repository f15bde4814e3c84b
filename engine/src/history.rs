//! Per-field audit entries stored under a record's `histories` key.

use crate::{
    actor::ActorContext,
    clock::{parse_timestamp, Clock},
    error::{Error, Result},
    record::{display_value, json_type_name},
    Fields,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const DATETIME: &str = "datetime";
pub const USER_NAME: &str = "user_name";
pub const USER_ORGANISATION: &str = "user_organisation";
pub const CHANGES: &str = "changes";

/// Old and new string form of one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    #[serde(default, deserialize_with = "lenient_text")]
    pub from: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub to: String,
}

impl FieldChange {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        let pair = value.as_object()?;
        Some(Self::new(
            display_value(pair.get("from")),
            display_value(pair.get("to")),
        ))
    }

    fn into_value(self) -> Value {
        let mut pair = Fields::new();
        pair.insert("from".to_string(), Value::String(self.from));
        pair.insert("to".to_string(), Value::String(self.to));
        Value::Object(pair)
    }
}

/// One audit entry: when, who, and which fields moved from what to what.
///
/// The entry is kept as the JSON object it was loaded from. Only the keys the
/// engine writes (`datetime`, `user_name`, `user_organisation` and individual
/// `changes` pairs) are ever touched; everything else round-trips verbatim,
/// in its stored order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryEntry {
    fields: Fields,
}

impl HistoryEntry {
    /// An unattributed entry with no changes yet.
    pub fn new(datetime: impl Into<String>) -> Self {
        let mut fields = Fields::new();
        fields.insert(DATETIME.to_string(), Value::String(datetime.into()));
        Self { fields }
    }

    pub fn from_fields(fields: Fields) -> Self {
        Self { fields }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::InvalidHistory(e.to_string()))
    }

    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(Error::InvalidHistory(format!(
                "expected an object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn into_fields(self) -> Fields {
        self.fields
    }

    /// `datetime` in its string form (`""` when absent).
    pub fn datetime(&self) -> String {
        display_value(self.fields.get(DATETIME))
    }

    pub fn user_name(&self) -> String {
        display_value(self.fields.get(USER_NAME))
    }

    pub fn user_organisation(&self) -> String {
        display_value(self.fields.get(USER_ORGANISATION))
    }

    /// Parsed `datetime`. Absent or malformed text is an error.
    pub fn timestamp(&self) -> Result<DateTime<Utc>> {
        parse_timestamp(DATETIME, &self.datetime())
    }

    /// The `{from, to}` pair recorded for `field`.
    ///
    /// Stored values that are not a pair object read as `None`.
    pub fn change(&self, field: &str) -> Option<FieldChange> {
        self.changes()?.get(field).and_then(FieldChange::from_value)
    }

    /// Names of every field with a stored change, in stored order.
    pub fn changed_fields(&self) -> impl Iterator<Item = &str> {
        self.changes()
            .into_iter()
            .flat_map(|changes| changes.keys().map(String::as_str))
    }

    pub fn has_changes(&self) -> bool {
        self.changes().is_some_and(|changes| !changes.is_empty())
    }

    /// Set the pair for `field`, replacing any earlier one in place.
    pub fn record_change(
        &mut self,
        field: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) {
        if !matches!(self.fields.get(CHANGES), Some(Value::Object(_))) {
            self.fields
                .insert(CHANGES.to_string(), Value::Object(Fields::new()));
        }
        if let Some(Value::Object(changes)) = self.fields.get_mut(CHANGES) {
            changes.insert(field.into(), FieldChange::new(from, to).into_value());
        }
    }

    /// Stamp the actor and restamp `datetime` with the current time.
    pub fn attribute(&mut self, actor: &ActorContext, clock: &dyn Clock) {
        self.fields.insert(
            USER_NAME.to_string(),
            Value::String(actor.user_name.clone()),
        );
        self.fields.insert(
            USER_ORGANISATION.to_string(),
            Value::String(actor.user_organisation.clone()),
        );
        self.fields
            .insert(DATETIME.to_string(), Value::String(clock.now_text()));
    }

    fn changes(&self) -> Option<&Fields> {
        self.fields.get(CHANGES).and_then(Value::as_object)
    }
}

/// A history element as handed to the reconciler: already structured, or raw
/// JSON (an object, or JSON text of one).
#[derive(Debug, Clone, PartialEq)]
pub enum HistorySource {
    Entry(HistoryEntry),
    Raw(Value),
}

impl HistorySource {
    pub fn into_entry(self) -> Result<HistoryEntry> {
        match self {
            HistorySource::Entry(entry) => Ok(entry),
            HistorySource::Raw(Value::String(text)) => HistoryEntry::from_json(&text),
            HistorySource::Raw(value @ Value::Object(_)) => HistoryEntry::from_value(value),
            HistorySource::Raw(other) => Err(Error::InvalidHistory(format!(
                "expected an object, got {}",
                json_type_name(&other)
            ))),
        }
    }
}

impl From<HistoryEntry> for HistorySource {
    fn from(entry: HistoryEntry) -> Self {
        HistorySource::Entry(entry)
    }
}

impl From<Value> for HistorySource {
    fn from(value: Value) -> Self {
        HistorySource::Raw(value)
    }
}

impl From<&str> for HistorySource {
    fn from(text: &str) -> Self {
        HistorySource::Raw(Value::String(text.to_string()))
    }
}

impl From<String> for HistorySource {
    fn from(text: String) -> Self {
        HistorySource::Raw(Value::String(text))
    }
}

/// Turn a mixed sequence into structured entries, preserving order.
pub fn materialize<I, H>(sources: I) -> Result<Vec<HistoryEntry>>
where
    I: IntoIterator<Item = H>,
    H: Into<HistorySource>,
{
    sources
        .into_iter()
        .map(|source| source.into().into_entry())
        .collect()
}

/// Read a stored `histories` value. Absent or `null` is an empty history.
pub fn histories_from_value(value: Option<&Value>) -> Result<Vec<HistoryEntry>> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => materialize(items.iter().cloned()),
        Some(Value::String(text)) => {
            match serde_json::from_str(text).map_err(|e| Error::InvalidHistory(e.to_string()))? {
                Value::Array(items) => materialize(items),
                other => Err(Error::InvalidHistory(format!(
                    "expected an array of entries, got {}",
                    json_type_name(&other)
                ))),
            }
        }
        Some(other) => Err(Error::InvalidHistory(format!(
            "expected an array of entries, got {}",
            json_type_name(other)
        ))),
    }
}

fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(display_value(value.as_ref()))
}
