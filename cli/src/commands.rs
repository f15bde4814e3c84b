//! Command implementations. Each command reads its inputs from files and
//! returns the JSON value to print.

use crate::config::Config;
use crate::error::{CliError, Result};
use casebook_engine::{
    history::histories_from_value, keys, kind_by_name, reconcile_history, Clock, Record,
    RecordSnapshot,
};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    New { content: Option<String> },
    ShortId { record: String },
    Reconcile {
        current: String,
        previous: String,
        histories: Option<String>,
    },
    Values { kind: String, record: String },
}

pub const USAGE: &str = "casebook new [content.json]
casebook short-id <record.json>
casebook reconcile <current.json> <previous.json> [histories.json]
casebook values <kind> <record.json>";

impl Command {
    /// Parse arguments, excluding the program name.
    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let rest = args.get(1..).unwrap_or_default();

        let command = match (args.first().map(String::as_str), rest) {
            (Some("new"), []) => Command::New { content: None },
            (Some("new"), [content]) => Command::New {
                content: Some(content.clone()),
            },
            (Some("short-id"), [record]) => Command::ShortId {
                record: record.clone(),
            },
            (Some("reconcile"), [current, previous]) => Command::Reconcile {
                current: current.clone(),
                previous: previous.clone(),
                histories: None,
            },
            (Some("reconcile"), [current, previous, histories]) => Command::Reconcile {
                current: current.clone(),
                previous: previous.clone(),
                histories: Some(histories.clone()),
            },
            (Some("values"), [kind, record]) => Command::Values {
                kind: kind.clone(),
                record: record.clone(),
            },
            _ => return Err(CliError::Usage(USAGE.to_string())),
        };
        Ok(command)
    }

    pub fn run(&self, config: &Config, clock: &dyn Clock) -> Result<Value> {
        match self {
            Command::New { content } => new_record(content.as_deref(), config, clock),
            Command::ShortId { record } => short_id(record, clock),
            Command::Reconcile {
                current,
                previous,
                histories,
            } => reconcile(current, previous, histories.as_deref(), config, clock),
            Command::Values { kind, record } => values(kind, record, clock),
        }
    }
}

fn read(path: impl AsRef<Path>) -> Result<String> {
    Ok(fs::read_to_string(path)?)
}

/// Create a record owned by the configured user.
pub fn new_record(content: Option<&str>, config: &Config, clock: &dyn Clock) -> Result<Value> {
    let content = match content {
        Some(path) => read(path)?,
        None => String::new(),
    };

    let mut record = Record::from_json_with_clock(&content, clock)?;
    if record.created_by().is_none() && !config.user_name.is_empty() {
        record.set_created_by(config.user_name.clone());
    }
    if record.created_organisation().is_none() && !config.user_org.is_empty() {
        record.set_organisation(config.user_org.clone());
    }

    tracing::info!(unique_id = ?record.unique_id(), "created record");
    Ok(Value::Object(record.into_fields()))
}

pub fn short_id(path: &str, clock: &dyn Clock) -> Result<Value> {
    let record = Record::from_json_with_clock(&read(path)?, clock)?;
    let mut out = serde_json::Map::new();
    out.insert(keys::UNIQUE_ID.to_string(), json!(record.unique_id()));
    out.insert("short_id".to_string(), json!(record.short_id()));
    Ok(Value::Object(out))
}

/// Fold the edits since the last sync into the pending history entry.
///
/// Without a histories file the histories stored on the current record are
/// used.
pub fn reconcile(
    current: &str,
    previous: &str,
    histories: Option<&str>,
    config: &Config,
    clock: &dyn Clock,
) -> Result<Value> {
    let current = RecordSnapshot::from_json(&read(current)?)?;
    let previous = RecordSnapshot::from_json(&read(previous)?)?;

    let existing = match histories {
        Some(path) => {
            let raw: Value = serde_json::from_str(&read(path)?)?;
            histories_from_value(Some(&raw))?
        }
        None => histories_from_value(current.get(keys::HISTORIES))?,
    };

    let current = current.without(keys::HISTORIES);
    let actor = config.actor();
    let folded = reconcile_history(&current, &previous, existing, &actor, clock)?;

    tracing::info!(entries = folded.len(), "reconciled history");
    Ok(serde_json::to_value(folded)?)
}

/// A record's fields minus the system fields of `kind`.
pub fn values(kind: &str, path: &str, clock: &dyn Clock) -> Result<Value> {
    let kind = kind_by_name(kind)
        .ok_or_else(|| CliError::Usage(format!("unknown record kind '{}'", kind)))?;
    let record = Record::from_json_with_clock(&read(path)?, clock)?;

    if !kind.is_valid(&record) {
        tracing::warn!(kind = kind.name(), "record has no user fields");
    }
    Ok(Value::Object(kind.values(&record)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use casebook_engine::{parse_timestamp, FixedClock};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn fixed(text: &str) -> FixedClock {
        FixedClock::new(parse_timestamp("now", text).unwrap())
    }

    fn file_with(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn path(file: &NamedTempFile) -> String {
        file.path().to_string_lossy().into_owned()
    }

    fn worker() -> Config {
        Config {
            user_name: "worker".into(),
            user_org: "NGO".into(),
            pretty: false,
        }
    }

    #[test]
    fn parses_commands() {
        assert_eq!(
            Command::parse(["new"]).unwrap(),
            Command::New { content: None }
        );
        assert_eq!(
            Command::parse(["reconcile", "a.json", "b.json"]).unwrap(),
            Command::Reconcile {
                current: "a.json".into(),
                previous: "b.json".into(),
                histories: None,
            }
        );
        assert_eq!(
            Command::parse(["values", "enquiry", "r.json"]).unwrap(),
            Command::Values {
                kind: "enquiry".into(),
                record: "r.json".into(),
            }
        );
    }

    #[test]
    fn rejects_bad_arguments() {
        for args in [vec![], vec!["short-id"], vec!["frobnicate", "x"], vec!["new", "a", "b"]] {
            assert!(matches!(Command::parse(args), Err(CliError::Usage(_))));
        }
    }

    #[test]
    fn new_record_is_owned_and_unsynced() {
        let clock = fixed("2024-06-01 12:00:00");
        let content = file_with(r#"{"name": "  Amy  "}"#);

        let value = new_record(Some(&path(&content)), &worker(), &clock).unwrap();
        assert_eq!(value["name"], "Amy");
        assert_eq!(value["created_by"], "worker");
        assert_eq!(value["created_organisation"], "NGO");
        assert_eq!(value["created_at"], "2024-06-01 12:00:00");
        assert_eq!(value["synced"], false);
        assert!(value["unique_identifier"].is_string());
    }

    #[test]
    fn new_record_without_content() {
        let value = new_record(None, &Config::default(), &FixedClock::default()).unwrap();
        assert!(value.get("created_by").is_none());
        assert!(value["unique_identifier"].is_string());
    }

    #[test]
    fn short_id_is_last_seven() {
        let record = file_with(r#"{"unique_identifier": "abcdef-1234567"}"#);
        let value = short_id(&path(&record), &FixedClock::default()).unwrap();
        assert_eq!(value["short_id"], "1234567");
    }

    #[test]
    fn reconcile_uses_stored_histories() {
        let clock = fixed("2024-06-01 12:00:00");
        let current = file_with(
            r#"{"name": "Amy K.", "histories": [{"datetime": "2024-06-01 11:50:00", "changes": {}}]}"#,
        );
        let previous = file_with(r#"{"name": "Amy", "last_synced_at": "2024-06-01 11:00:00"}"#);

        let value = reconcile(&path(&current), &path(&previous), None, &worker(), &clock).unwrap();
        let entry = &value[0];
        assert_eq!(entry["changes"]["name"]["from"], "Amy");
        assert_eq!(entry["changes"]["name"]["to"], "Amy K.");
        assert_eq!(entry["user_name"], "worker");
        assert_eq!(entry["datetime"], "2024-06-01 12:00:00");
        assert!(entry["changes"].get("histories").is_none());
    }

    #[test]
    fn reconcile_with_explicit_histories_file() {
        let clock = fixed("2024-06-01 12:00:00");
        let current = file_with(r#"{"age": 8}"#);
        let previous = file_with(r#"{"age": 7, "last_synced_at": "2024-06-01 11:00:00"}"#);
        let histories = file_with(r#"[{"datetime": "2024-06-01 10:00:00"}, {"datetime": "2024-06-01 11:30:00"}]"#);

        let value = reconcile(
            &path(&current),
            &path(&previous),
            Some(&path(&histories)),
            &worker(),
            &clock,
        )
        .unwrap();
        assert_eq!(value[0], json!({"datetime": "2024-06-01 10:00:00"}));
        assert_eq!(value[1]["changes"]["age"]["to"], "8");
    }

    #[test]
    fn reconcile_rejects_corrupt_cutoff() {
        let current = file_with(r#"{"age": 8}"#);
        let previous = file_with(r#"{"last_synced_at": "yesterday"}"#);
        let histories = file_with(r#"[{"datetime": "2024-06-01 11:30:00"}]"#);

        let err = reconcile(
            &path(&current),
            &path(&previous),
            Some(&path(&histories)),
            &worker(),
            &FixedClock::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CliError::Engine(_)));
    }

    #[test]
    fn values_strip_system_fields() {
        let record = file_with(r#"{"_id": "1", "enquirer_name": "Kato", "_attachments": {}}"#);
        let value = values("enquiry", &path(&record), &FixedClock::default()).unwrap();
        assert_eq!(value, json!({"enquirer_name": "Kato"}));
    }

    #[test]
    fn values_unknown_kind() {
        let record = file_with("{}");
        assert!(matches!(
            values("photo", &path(&record), &FixedClock::default()),
            Err(CliError::Usage(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            short_id("/nonexistent/record.json", &FixedClock::default()),
            Err(CliError::Io(_))
        ));
    }
}
