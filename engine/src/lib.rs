//! # Casebook Engine
//!
//! Versioned JSON records with field-level change history, for offline-first
//! case management (case records, enquiries).
//!
//! Records are edited locally, synced periodically, and must keep an audit
//! trail of what changed and when. This crate holds the pure core of that:
//! no storage, no network, no global state.
//!
//! ## Design Principles
//!
//! - **No IO**: storage rows, match repositories and the session are
//!   collaborators passed in by the caller
//! - **Deterministic**: time and actor are injected ([`Clock`], [`ActorContext`])
//! - **Forgiving writes**: blank values normalize away; unrepresentable writes
//!   are logged and dropped
//! - **Strict audit**: a corrupt sync cutoff fails reconciliation instead of
//!   silently losing history
//!
//! ## Core Concepts
//!
//! ### Records
//!
//! A [`Record`] is an ordered JSON object. Every write goes through
//! [`Record::put`]: strings are trimmed, and empty strings, empty arrays and
//! `null` remove the field. Reserved keys (see [`keys`]) carry identity and
//! lifecycle: `_id` (present once persisted), `unique_identifier` (client
//! generated, the sync key), `synced`, `created_at`, `histories`, ...
//!
//! Multi-valued fields are edited with [`Record::add_to_array_field`] and
//! [`Record::remove_from_array_field`], which keep set semantics.
//!
//! ### History
//!
//! Each [`HistoryEntry`] records a timestamp, the actor, and a `{from, to}`
//! pair per changed field. [`HistoryReconciler`] compares the current
//! [`RecordSnapshot`] with the snapshot stored at the last sync and folds the
//! differences into the first entry newer than `last_synced_at`.
//!
//! ### Record kinds
//!
//! [`RecordKind`] supplies per-kind field classification, identity policy and
//! match lookups: [`BaseKind`], [`Enquiry`], [`Child`].
//!
//! ## Quick Start
//!
//! ```rust
//! use casebook_engine::{ActorContext, FixedClock, HistoryEntry, Record, RecordSnapshot};
//! use chrono::{TimeZone, Utc};
//!
//! let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap());
//! let actor = ActorContext::new("worker", "NGO");
//!
//! // State stored at the last sync
//! let previous = RecordSnapshot::from_json(
//!     r#"{"name": "Amy", "last_synced_at": "2024-06-01 11:00:00"}"#,
//! ).unwrap();
//!
//! // Local edits since then, with one pending history entry
//! let mut record = Record::from_json_with_clock(r#"{"name": "Amy"}"#, &clock).unwrap();
//! record.set_name("Amy K.");
//! record.set_histories(&[HistoryEntry::new("2024-06-01 11:50:00")]);
//!
//! record.fold_history(&previous, &actor, &clock).unwrap();
//!
//! let histories = record.histories().unwrap();
//! assert_eq!(histories[0].change("name").unwrap().to, "Amy K.");
//! assert_eq!(histories[0].user_name(), "worker");
//! ```
//!
//! ## FFI
//!
//! The [`ffi`] module provides C-compatible functions for use from mobile
//! platforms. All data is exchanged as JSON strings.

pub mod actor;
pub mod array_field;
pub mod clock;
pub mod column;
pub mod error;
pub mod ffi;
pub mod history;
pub mod keys;
pub mod kind;
pub mod matches;
pub mod reconcile;
pub mod record;
pub mod snapshot;

// Re-export main types at crate root
pub use actor::{ActorContext, SessionContext};
pub use clock::{format_timestamp, parse_timestamp, Clock, FixedClock, SystemClock, DEFAULT_FORMAT};
pub use column::{Column, ColumnValue, MapRow, PrimitiveType, StorageRow};
pub use error::{Error, Result};
pub use history::{FieldChange, HistoryEntry, HistorySource};
pub use kind::{kind_by_name, BaseKind, Child, Enquiry, RecordKind};
pub use matches::{ids_from_matches, MatchLookups, MatchRef, MatchRepository, RecordResolver};
pub use reconcile::{reconcile_history, HistoryReconciler};
pub use record::{new_unique_id, Record, SHORT_ID_LENGTH};
pub use snapshot::RecordSnapshot;

/// Type aliases for clarity
pub type Fields = serde_json::Map<String, serde_json::Value>;
pub type RecordId = String;
