use super::{RecordKind, CONTENT_COLUMN};
use crate::{column::Column, keys, matches::MatchLookups, Record};

const CHILD_COLUMNS: &[Column] = &[
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
    Column::system(keys::ATTACHMENTS),
    Column::user(keys::NAME),
];

/// A case record for a registered child. The unique id is assigned lazily.
#[derive(Debug, Clone, Copy, Default)]
pub struct Child;

impl RecordKind for Child {
    fn name(&self) -> &'static str {
        "child"
    }

    fn columns(&self) -> &'static [Column] {
        CHILD_COLUMNS
    }

    fn api_path(&self) -> Option<&'static str> {
        Some("/api/children")
    }

    fn api_parameter(&self) -> Option<&'static str> {
        Some("child")
    }

    fn confirmed_matches(&self, record: &Record, lookups: &MatchLookups<'_>) -> Vec<Record> {
        lookups.by_status(record, true)
    }

    fn potential_matches(&self, record: &Record, lookups: &MatchLookups<'_>) -> Vec<Record> {
        lookups.by_status(record, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::column::MapRow;

    #[test]
    fn unique_id_is_lazy() {
        let mut record = Child.new_record(&SystemClock);
        assert!(record.unique_id().is_none());
        record.generate_unique_id();
        assert!(record.unique_id().is_some());
    }

    #[test]
    fn name_column_is_user_data() {
        let row = MapRow::new()
            .with_text("content", "{}")
            .with_text("name", "Kato");
        let record = Record::hydrate(&row, &Child).unwrap();

        assert!(Child.is_valid(&record));
        assert_eq!(Child.values(&record).get("name"), Some(&serde_json::json!("Kato")));
    }

    #[test]
    fn api_metadata() {
        assert_eq!(Child.api_path(), Some("/api/children"));
        assert_eq!(Child.api_parameter(), Some("child"));
    }
}
