//! Cross-kind match lookups (enquiry ↔ case record).
//!
//! Matching itself lives outside the engine. Record kinds only consume two
//! narrow collaborators: one that lists match references for a record, and one
//! that resolves ids into records.

use crate::{error::Result, Record, RecordId};
use serde::{Deserialize, Serialize};

/// A reference from one record to a record it may describe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRef {
    /// Internal id of the matched record
    pub target_id: RecordId,
    /// Whether a person has confirmed the match
    pub confirmed: bool,
}

impl MatchRef {
    pub fn confirmed(target_id: impl Into<RecordId>) -> Self {
        Self {
            target_id: target_id.into(),
            confirmed: true,
        }
    }

    pub fn potential(target_id: impl Into<RecordId>) -> Self {
        Self {
            target_id: target_id.into(),
            confirmed: false,
        }
    }
}

/// Lists match references for a record.
pub trait MatchRepository {
    fn find_related(&self, record: &Record) -> Result<Vec<MatchRef>>;
}

/// Loads records by internal id.
pub trait RecordResolver {
    fn resolve_by_ids(&self, ids: &[RecordId]) -> Result<Vec<Record>>;
}

/// The collaborators a record kind needs to answer match queries.
#[derive(Clone, Copy)]
pub struct MatchLookups<'a> {
    pub matches: &'a dyn MatchRepository,
    pub resolver: &'a dyn RecordResolver,
}

impl<'a> MatchLookups<'a> {
    pub fn new(matches: &'a dyn MatchRepository, resolver: &'a dyn RecordResolver) -> Self {
        Self { matches, resolver }
    }

    /// Records matched to `record` with the given confirmation status.
    ///
    /// Lookup failures degrade to an empty list.
    pub fn by_status(&self, record: &Record, confirmed: bool) -> Vec<Record> {
        match self.try_by_status(record, confirmed) {
            Ok(records) => records,
            Err(err) => {
                tracing::warn!(
                    record = record.unique_id().unwrap_or_default(),
                    confirmed,
                    error = %err,
                    "match lookup failed"
                );
                Vec::new()
            }
        }
    }

    fn try_by_status(&self, record: &Record, confirmed: bool) -> Result<Vec<Record>> {
        let related = self.matches.find_related(record)?;
        let ids = ids_from_matches(related.iter().filter(|m| m.confirmed == confirmed));
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.resolver.resolve_by_ids(&ids)
    }
}

/// Target ids of `matches`, in order.
pub fn ids_from_matches<'m>(matches: impl IntoIterator<Item = &'m MatchRef>) -> Vec<RecordId> {
    matches.into_iter().map(|m| m.target_id.clone()).collect()
}
