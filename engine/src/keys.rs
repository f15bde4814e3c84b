//! Stored JSON keys shared by every record kind.

/// Storage-assigned row id. Absent until the record is first persisted.
pub const INTERNAL_ID: &str = "_id";
/// Revision stamped by the server after a successful sync.
pub const REVISION_ID: &str = "_rev";
/// Client-generated id, stable for the life of the record.
pub const UNIQUE_ID: &str = "unique_identifier";
pub const CREATED_AT: &str = "created_at";
pub const LAST_UPDATED_AT: &str = "last_updated_at";
/// Cutoff between uploaded and pending history entries.
pub const LAST_SYNCED_AT: &str = "last_synced_at";
pub const CREATED_BY: &str = "created_by";
pub const CREATED_ORGANISATION: &str = "created_organisation";
pub const SYNCED: &str = "synced";
pub const NAME: &str = "name";
pub const HISTORIES: &str = "histories";
pub const ATTACHMENTS: &str = "_attachments";

/// Bookkeeping keys every record may carry.
pub const RESERVED: &[&str] = &[
    INTERNAL_ID,
    REVISION_ID,
    UNIQUE_ID,
    CREATED_AT,
    LAST_UPDATED_AT,
    LAST_SYNCED_AT,
    CREATED_BY,
    CREATED_ORGANISATION,
    SYNCED,
    HISTORIES,
];
