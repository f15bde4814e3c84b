//! Record kinds: per-kind field classification, identity policy and match
//! lookups layered over the one concrete [`Record`] type.

mod child;
mod enquiry;

pub use child::Child;
pub use enquiry::Enquiry;

use crate::{
    clock::Clock,
    column::Column,
    keys,
    matches::MatchLookups,
    record::new_unique_id,
    Fields, Record,
};

/// Default storage column holding the record's JSON document.
pub const CONTENT_COLUMN: &str = "content";

/// Capabilities a record kind supplies.
pub trait RecordKind {
    /// Short lowercase name, e.g. `"enquiry"`.
    fn name(&self) -> &'static str;

    /// Every field this kind declares, with its storage type and class.
    fn columns(&self) -> &'static [Column];

    fn content_column(&self) -> &'static str {
        CONTENT_COLUMN
    }

    fn internal_fields(&self) -> Vec<&'static str> {
        self.columns()
            .iter()
            .filter(|c| c.internal)
            .map(|c| c.name)
            .collect()
    }

    fn system_fields(&self) -> Vec<&'static str> {
        self.columns()
            .iter()
            .filter(|c| c.system)
            .map(|c| c.name)
            .collect()
    }

    /// Whether a fresh record gets its unique id at construction.
    fn eager_unique_id(&self) -> bool {
        false
    }

    /// Sync endpoint for this kind.
    fn api_path(&self) -> Option<&'static str> {
        None
    }

    /// Request parameter wrapping the record on upload.
    fn api_parameter(&self) -> Option<&'static str> {
        None
    }

    /// True iff the record holds at least one non-internal field.
    fn is_valid(&self, record: &Record) -> bool {
        let internal = self.internal_fields();
        record.field_names().any(|name| !internal.contains(&name))
    }

    /// The record's fields without this kind's system fields.
    fn values(&self, record: &Record) -> Fields {
        let system = self.system_fields();
        record
            .fields()
            .iter()
            .filter(|(name, _)| !system.contains(&name.as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    fn create_unique_id(&self) -> String {
        new_unique_id()
    }

    /// A blank record of this kind.
    fn new_record(&self, clock: &dyn Clock) -> Record {
        let mut record = Record::with_clock(clock);
        if self.eager_unique_id() {
            record.set_unique_id(self.create_unique_id());
        }
        record
    }

    fn confirmed_matches(&self, _record: &Record, _lookups: &MatchLookups<'_>) -> Vec<Record> {
        Vec::new()
    }

    fn potential_matches(&self, _record: &Record, _lookups: &MatchLookups<'_>) -> Vec<Record> {
        Vec::new()
    }
}

const BASE_COLUMNS: &[Column] = &[
    Column::internal(keys::INTERNAL_ID),
    Column::internal(keys::REVISION_ID),
    Column::internal(CONTENT_COLUMN),
    Column::internal(keys::UNIQUE_ID),
    Column::internal(keys::CREATED_AT),
    Column::internal(keys::LAST_UPDATED_AT),
    Column::internal(keys::LAST_SYNCED_AT),
    Column::internal(keys::CREATED_BY),
    Column::internal(keys::CREATED_ORGANISATION),
    Column::internal_flag(keys::SYNCED),
    Column::internal(keys::HISTORIES),
];

/// A record with no kind-specific behaviour.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseKind;

impl RecordKind for BaseKind {
    fn name(&self) -> &'static str {
        "record"
    }

    fn columns(&self) -> &'static [Column] {
        BASE_COLUMNS
    }
}

/// Look up a built-in kind by its [`RecordKind::name`].
pub fn kind_by_name(name: &str) -> Option<&'static dyn RecordKind> {
    match name {
        "record" => Some(&BaseKind),
        "enquiry" => Some(&Enquiry),
        "child" => Some(&Child),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use serde_json::json;

    #[test]
    fn kinds_by_name() {
        for name in ["record", "enquiry", "child"] {
            assert_eq!(kind_by_name(name).map(|k| k.name()), Some(name));
        }
        assert!(kind_by_name("photo").is_none());
    }

    #[test]
    fn base_kind_defers_unique_id() {
        let record = BaseKind.new_record(&SystemClock);
        assert!(record.unique_id().is_none());
        assert!(!record.is_synced());
    }

    #[test]
    fn bookkeeping_only_record_is_invalid() {
        let record = Record::from_json(r#"{"_id": "1", "histories": []}"#).unwrap();
        assert!(!BaseKind.is_valid(&record));
    }

    #[test]
    fn any_user_field_makes_it_valid() {
        let record = Record::from_json(r#"{"name": "Amy"}"#).unwrap();
        assert!(BaseKind.is_valid(&record));
    }

    #[test]
    fn values_strip_reserved_keys() {
        let record = Record::from_json(r#"{"_id": "1", "name": "Amy", "age": 4}"#).unwrap();
        let values = BaseKind.values(&record);
        assert_eq!(serde_json::Value::Object(values), json!({"name": "Amy", "age": 4}));
    }

    #[test]
    fn base_kind_has_no_api() {
        assert_eq!(BaseKind.api_path(), None);
        assert_eq!(BaseKind.api_parameter(), None);
        assert!(BASE_COLUMNS.iter().all(|c| keys::RESERVED.contains(&c.name) || c.name == CONTENT_COLUMN));
    }
}
