//! End-to-end scenarios for casebook-engine: construction, the sync history
//! cycle, and record kinds working together.

use casebook_engine::{
    keys, reconcile_history, ActorContext, Clock, Enquiry, FieldChange, FixedClock,
    HistoryEntry, MapRow, Record, RecordKind, RecordSnapshot,
};
use chrono::{Duration, TimeZone, Utc};
use serde_json::json;

fn clock() -> FixedClock {
    FixedClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap())
}

fn actor() -> ActorContext {
    ActorContext::new("field_worker", "UNICEF")
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn empty_record_defaults() {
    let record = Record::from_json_with_clock("{}", &clock()).unwrap();

    assert!(!record.is_synced());
    assert_eq!(record.created_at(), Some("2024-06-01 12:00:00"));
    assert!(record.unique_id().is_some_and(|id| !id.is_empty()));
    assert!(record.is_new());
}

#[test]
fn stored_record_is_not_new() {
    let row = MapRow::new()
        .with_text("content", r#"{"enquirer_name": "Kato"}"#)
        .with_text(keys::INTERNAL_ID, "row-1")
        .with_integer(keys::SYNCED, 1);

    let enquiry = Enquiry::hydrate(&row, &clock()).unwrap();
    assert!(!enquiry.is_new());
    assert!(enquiry.is_synced());
    assert_eq!(enquiry.get_str("enquirer_name"), Some("Kato"));
}

#[test]
fn identity_survives_storage_roundtrip() {
    let record = Record::from_json(r#"{"name": "Amy", "age": 7}"#).unwrap();
    let stored = record.to_json().unwrap();

    let reloaded = Record::from_json(&stored).unwrap();
    assert_eq!(reloaded.unique_id(), record.unique_id());
    assert_eq!(reloaded.to_json().unwrap(), stored);
}

// ============================================================================
// Sync history cycle
// ============================================================================

#[test]
fn pending_entry_collects_rename() {
    let clock = clock();
    let now = clock.now();
    let previous = RecordSnapshot::from_fields(
        json!({
            "name": "Amy",
            "synced": false,
            "last_synced_at": casebook_engine::format_timestamp(now - Duration::hours(1)),
        })
        .as_object()
        .cloned()
        .unwrap(),
    );

    let mut record = Record::from_json_with_clock(r#"{"name": "Amy", "synced": false}"#, &clock).unwrap();
    record.set_name("Amy K.");

    let pending = HistoryEntry::new(casebook_engine::format_timestamp(now - Duration::minutes(10)));
    let result = reconcile_history(&record.snapshot(), &previous, vec![pending], &actor(), &clock).unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].change("name"), Some(FieldChange::new("Amy", "Amy K.")));
    assert_eq!(result[0].user_name(), "field_worker");
    assert_eq!(result[0].user_organisation(), "UNICEF");
    assert_eq!(result[0].datetime(), "2024-06-01 12:00:00");
}

#[test]
fn never_synced_leaves_histories_alone() {
    let previous = RecordSnapshot::from_json(r#"{"name": "Amy"}"#).unwrap();
    let current = RecordSnapshot::from_json(r#"{"name": "Amy K."}"#).unwrap();
    let existing = vec![HistoryEntry::new("2024-06-01 11:50:00")];

    let result =
        reconcile_history(&current, &previous, existing.clone(), &actor(), &clock()).unwrap();
    assert_eq!(result, existing);
}

#[test]
fn full_sync_cycle_on_enquiry() {
    let mut clock = clock();

    // Created offline and synced once
    let mut enquiry = Enquiry::with_content(
        r#"{"enquirer_name": "Kato", "location": "Gulu"}"#,
        "field_worker",
        &clock,
    )
    .unwrap();
    enquiry.put(keys::LAST_SYNCED_AT, clock.now_text());
    enquiry.set_synced(true);
    let at_sync = enquiry.snapshot();

    // Edited later, with a pending entry opened for the edit
    clock.advance(Duration::minutes(30));
    enquiry.put("location", "Kitgum");
    enquiry.add_to_array_field("languages", "Acholi").unwrap();
    enquiry.set_synced(false);
    enquiry.set_histories(&[HistoryEntry::new(clock.now_text())]);

    clock.advance(Duration::minutes(5));
    enquiry.fold_history(&at_sync, &actor(), &clock).unwrap();

    let histories = enquiry.histories().unwrap();
    assert_eq!(histories.len(), 1);
    let entry = &histories[0];
    assert_eq!(entry.change("location"), Some(FieldChange::new("Gulu", "Kitgum")));
    assert_eq!(entry.change("languages"), Some(FieldChange::new("", r#"["Acholi"]"#)));
    assert_eq!(entry.change("synced"), Some(FieldChange::new("true", "false")));
    assert!(entry.change("enquirer_name").is_none());
    assert!(entry.change("histories").is_none());
    assert_eq!(entry.datetime(), "2024-06-01 12:35:00");

    assert!(Enquiry.is_valid(&enquiry));
    assert!(!Enquiry.values(&enquiry).contains_key(keys::HISTORIES));
}

// ============================================================================
// Multi-valued fields
// ============================================================================

#[test]
fn removing_from_absent_array_creates_nothing() {
    let mut record = Record::from_json(r#"{"name": "Amy"}"#).unwrap();
    let before = record.clone();

    record.remove_from_array_field("tags", "x").unwrap();
    assert_eq!(record, before);
    assert!(!record.contains("tags"));
}

#[test]
fn removing_last_value_drops_the_field() {
    let mut record = Record::new();
    record.add_to_array_field("tags", "x").unwrap();
    record.remove_from_array_field("tags", "x").unwrap();
    assert!(!record.contains("tags"));
}
