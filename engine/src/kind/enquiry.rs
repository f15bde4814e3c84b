use super::{RecordKind, CONTENT_COLUMN};
use crate::{
    clock::Clock, column::Column, column::StorageRow, error::Result, keys, matches::MatchLookups,
    Record,
};

const ENQUIRY_COLUMNS: &[Column] = &[
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
    Column::user(Enquiry::ENQUIRER_NAME),
];

/// An enquiry: a report from someone looking for a missing child.
///
/// Enquiries get their unique id eagerly and match against case records.
#[derive(Debug, Clone, Copy, Default)]
pub struct Enquiry;

impl Enquiry {
    pub const FORM_NAME: &'static str = "Enquiries";
    pub const ENQUIRER_NAME: &'static str = "enquirer_name";

    /// A blank enquiry with a unique id already assigned.
    pub fn create(clock: &dyn Clock) -> Record {
        Enquiry.new_record(clock)
    }

    /// A new enquiry entered by `created_by`.
    pub fn with_content(content: &str, created_by: &str, clock: &dyn Clock) -> Result<Record> {
        let mut record = Record::from_json_with_clock(content, clock)?;
        record.set_created_by(created_by);
        record.set_last_updated_at(clock.now_text());
        Ok(record)
    }

    /// An enquiry loaded from its stored JSON, with `histories` expanded if it
    /// was stored as text.
    pub fn from_stored(json: &str, clock: &dyn Clock) -> Result<Record> {
        let mut record = Record::from_json_with_clock(json, clock)?;
        record.normalize_stored_histories()?;
        Ok(record)
    }

    pub fn hydrate(row: &dyn StorageRow, clock: &dyn Clock) -> Result<Record> {
        Record::hydrate_with_clock(row, &Enquiry, clock)
    }
}

impl RecordKind for Enquiry {
    fn name(&self) -> &'static str {
        "enquiry"
    }

    fn columns(&self) -> &'static [Column] {
        ENQUIRY_COLUMNS
    }

    fn eager_unique_id(&self) -> bool {
        true
    }

    fn api_path(&self) -> Option<&'static str> {
        Some("/api/enquiries")
    }

    fn api_parameter(&self) -> Option<&'static str> {
        Some("enquiry")
    }

    fn confirmed_matches(&self, record: &Record, lookups: &MatchLookups<'_>) -> Vec<Record> {
        lookups.by_status(record, true)
    }

    fn potential_matches(&self, record: &Record, lookups: &MatchLookups<'_>) -> Vec<Record> {
        lookups.by_status(record, false)
    }
}
