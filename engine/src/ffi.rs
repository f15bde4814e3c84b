//! FFI layer for mobile embedding.
//!
//! This module provides C-compatible functions that can be called from Kotlin,
//! Swift or Dart. All data crosses the boundary as JSON strings and every call
//! is stateless: records go in as JSON and come back as JSON.
//!
//! # Memory Management
//!
//! - Strings returned by `casebook_*` functions are allocated by Rust
//! - Caller must free them with `casebook_string_free`
//!
//! # Error Handling
//!
//! Functions return JSON with either:
//! - `{"ok": <result>}` on success
//! - `{"error": "<message>"}` on failure

use crate::{keys, kind::kind_by_name, ActorContext, Record, RecordSnapshot, SystemClock};
use serde_json::Value;
use std::ffi::{c_char, CStr, CString};

/// Result wrapper for FFI responses.
#[derive(serde::Serialize)]
#[serde(untagged)]
enum FfiResult<T: serde::Serialize> {
    Ok { ok: T },
    Err { error: String },
}

impl<T: serde::Serialize> FfiResult<T> {
    fn ok(value: T) -> Self {
        FfiResult::Ok { ok: value }
    }

    fn err(message: impl Into<String>) -> Self {
        FfiResult::Err {
            error: message.into(),
        }
    }

    fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|e| format!(r#"{{"error":"serialization failed: {}"}}"#, e))
    }
}

/// Convert a Rust string to a C string pointer.
/// Caller must free with `casebook_string_free`.
fn to_c_string(s: String) -> *mut c_char {
    match CString::new(s) {
        Ok(cs) => cs.into_raw(),
        Err(_) => CString::new(r#"{"error":"string contained null bytes"}"#)
            .unwrap_or_default()
            .into_raw(),
    }
}

/// Convert a C string pointer to a Rust string.
/// Returns None if pointer is null or invalid UTF-8.
unsafe fn from_c_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

fn error_response(message: impl Into<String>) -> *mut c_char {
    to_c_string(FfiResult::<()>::err(message).to_json())
}

fn respond<T: serde::Serialize>(result: crate::Result<T>) -> *mut c_char {
    match result {
        Ok(value) => to_c_string(FfiResult::ok(value).to_json()),
        Err(e) => error_response(e.to_string()),
    }
}

// ============================================================================
// Records
// ============================================================================

/// Construct a record from JSON content (null or blank for an empty record).
///
/// # Returns
/// JSON string: `{"ok": Record}` or `{"error": "message"}`
///
/// # Safety
/// - `content` must be a valid null-terminated C string or null
/// - Caller must free the returned string with `casebook_string_free`
#[no_mangle]
pub unsafe extern "C" fn casebook_record_new(content: *const c_char) -> *mut c_char {
    let content = from_c_string(content).unwrap_or_default();
    respond(Record::from_json(&content))
}

/// Write a field through the normalization rules.
///
/// # Arguments
/// - `record_json`: JSON string of the record
/// - `key`: field name
/// - `value_json`: JSON text of the new value (`""` or `[]` remove the field)
///
/// # Returns
/// JSON string: `{"ok": Record}` or `{"error": "message"}`
///
/// # Safety
/// - All arguments must be valid null-terminated C strings or null
/// - Caller must free the returned string with `casebook_string_free`
#[no_mangle]
pub unsafe extern "C" fn casebook_record_put(
    record_json: *const c_char,
    key: *const c_char,
    value_json: *const c_char,
) -> *mut c_char {
    let (mut record, key, value) = match parse_field_call(record_json, key, value_json) {
        Ok(parts) => parts,
        Err(response) => return response,
    };
    record.put(key, value);
    respond(Ok(record))
}

/// Add an element to an array field unless already present.
///
/// # Safety
/// Same contract as `casebook_record_put`.
#[no_mangle]
pub unsafe extern "C" fn casebook_array_add(
    record_json: *const c_char,
    key: *const c_char,
    element_json: *const c_char,
) -> *mut c_char {
    let (mut record, key, element) = match parse_field_call(record_json, key, element_json) {
        Ok(parts) => parts,
        Err(response) => return response,
    };
    respond(record.add_to_array_field(&key, element).map(|_| record))
}

/// Remove the first matching element from an array field.
///
/// # Safety
/// Same contract as `casebook_record_put`.
#[no_mangle]
pub unsafe extern "C" fn casebook_array_remove(
    record_json: *const c_char,
    key: *const c_char,
    element_json: *const c_char,
) -> *mut c_char {
    let (mut record, key, element) = match parse_field_call(record_json, key, element_json) {
        Ok(parts) => parts,
        Err(response) => return response,
    };
    respond(record.remove_from_array_field(&key, element).map(|_| record))
}

unsafe fn parse_field_call(
    record_json: *const c_char,
    key: *const c_char,
    value_json: *const c_char,
) -> Result<(Record, String, Value), *mut c_char> {
    let record_str = from_c_string(record_json).ok_or_else(|| error_response("invalid record JSON"))?;
    let key = from_c_string(key).ok_or_else(|| error_response("invalid key"))?;
    let value_str = from_c_string(value_json).ok_or_else(|| error_response("invalid value JSON"))?;

    let record = Record::from_json(&record_str).map_err(|e| error_response(e.to_string()))?;
    let value: Value = serde_json::from_str(&value_str)
        .map_err(|e| error_response(format!("parse error: {}", e)))?;

    Ok((record, key, value))
}

/// Short display id of a record.
///
/// # Returns
/// JSON string: `{"ok": "1234567"}`, `{"ok": null}` or `{"error": "message"}`
///
/// # Safety
/// - `record_json` must be a valid null-terminated C string or null
/// - Caller must free the returned string with `casebook_string_free`
#[no_mangle]
pub unsafe extern "C" fn casebook_short_id(record_json: *const c_char) -> *mut c_char {
    let record_str = match from_c_string(record_json) {
        Some(s) => s,
        None => return error_response("invalid record JSON"),
    };
    respond(Record::from_json(&record_str).map(|record| record.short_id()))
}

/// User-visible values of a record of the named kind (`record`, `enquiry`,
/// `child`).
///
/// # Safety
/// - Both arguments must be valid null-terminated C strings or null
/// - Caller must free the returned string with `casebook_string_free`
#[no_mangle]
pub unsafe extern "C" fn casebook_record_values(
    kind: *const c_char,
    record_json: *const c_char,
) -> *mut c_char {
    let kind = match from_c_string(kind).as_deref().and_then(kind_by_name) {
        Some(k) => k,
        None => return error_response("unknown record kind"),
    };
    let record_str = match from_c_string(record_json) {
        Some(s) => s,
        None => return error_response("invalid record JSON"),
    };
    respond(Record::from_json(&record_str).map(|record| kind.values(&record)))
}

// ============================================================================
// History
// ============================================================================

/// Fold edits since the last sync into the pending history entry.
///
/// # Arguments
/// - `current_json`: JSON of the record as it is now (its `histories` field
///   is not diffed)
/// - `previous_json`: JSON of the record as stored at the last sync
/// - `histories_json`: JSON array of history entries (null for none)
/// - `user_name`, `user_organisation`: actor attribution
///
/// # Returns
/// JSON string: `{"ok": [HistoryEntry, ...]}` or `{"error": "message"}`
///
/// # Safety
/// - All arguments must be valid null-terminated C strings or null
/// - Caller must free the returned string with `casebook_string_free`
#[no_mangle]
pub unsafe extern "C" fn casebook_reconcile_history(
    current_json: *const c_char,
    previous_json: *const c_char,
    histories_json: *const c_char,
    user_name: *const c_char,
    user_organisation: *const c_char,
) -> *mut c_char {
    let current = match from_c_string(current_json) {
        Some(s) => s,
        None => return error_response("invalid current JSON"),
    };
    let previous = match from_c_string(previous_json) {
        Some(s) => s,
        None => return error_response("invalid previous JSON"),
    };
    let histories: Vec<Value> = match from_c_string(histories_json) {
        None => Vec::new(),
        Some(s) if s.trim().is_empty() => Vec::new(),
        Some(s) => match serde_json::from_str(&s) {
            Ok(h) => h,
            Err(e) => return error_response(format!("parse error: {}", e)),
        },
    };
    let actor = ActorContext::new(
        from_c_string(user_name).unwrap_or_default(),
        from_c_string(user_organisation).unwrap_or_default(),
    );

    let result = RecordSnapshot::from_json(&current).and_then(|current| {
        let current = current.without(keys::HISTORIES);
        let previous = RecordSnapshot::from_json(&previous)?;
        crate::reconcile_history(&current, &previous, histories, &actor, &SystemClock)
    });
    respond(result)
}

// ============================================================================
// Memory & Metadata
// ============================================================================

/// Free a string allocated by the engine.
///
/// # Safety
/// - `s` must be a valid pointer from a `casebook_*` function
/// - Must not be called twice on the same pointer
#[no_mangle]
pub unsafe extern "C" fn casebook_string_free(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

/// Get the engine version.
///
/// # Returns
/// Static string pointer (do not free)
#[no_mangle]
pub extern "C" fn casebook_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
