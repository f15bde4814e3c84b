//! History reconciliation: fold edits made since the last sync into the
//! pending history entry.
//!
//! # Algorithm
//!
//! 1. Materialize the existing history into structured entries
//! 2. Read `last_synced_at` from the previous snapshot; if blank, stop
//! 3. Find the first entry (in stored order) dated strictly after the cutoff
//! 4. For every field of the current snapshot whose string form differs from
//!    the previous snapshot, write a `{from, to}` pair into that entry
//! 5. Attribute the entry to the actor and restamp it with "now"
//!
//! At most one entry changes per call. When no entry is pending, nothing is
//! recorded and no entry is synthesized.

use crate::{
    actor::ActorContext,
    clock::{parse_timestamp, Clock},
    error::Result,
    history::{materialize, HistoryEntry, HistorySource},
    keys,
    snapshot::RecordSnapshot,
};

/// Reconciles a record's history against its last-synced snapshot.
pub struct HistoryReconciler<'a> {
    actor: &'a ActorContext,
    clock: &'a dyn Clock,
}

impl<'a> HistoryReconciler<'a> {
    /// Create a reconciler attributing changes to `actor` at `clock`'s time.
    pub fn new(actor: &'a ActorContext, clock: &'a dyn Clock) -> Self {
        Self { actor, clock }
    }

    /// Return `existing` with live differences folded into the first entry
    /// newer than `previous`'s `last_synced_at`.
    ///
    /// A malformed cutoff or entry `datetime` fails the whole call.
    pub fn reconcile<I, H>(
        &self,
        current: &RecordSnapshot,
        previous: &RecordSnapshot,
        existing: I,
    ) -> Result<Vec<HistoryEntry>>
    where
        I: IntoIterator<Item = H>,
        H: Into<HistorySource>,
    {
        let mut histories = materialize(existing)?;

        let cutoff_text = previous.last_synced_at();
        if cutoff_text.is_empty() {
            return Ok(histories);
        }
        let cutoff = parse_timestamp(keys::LAST_SYNCED_AT, &cutoff_text)?;

        for entry in histories.iter_mut() {
            if entry.timestamp()? > cutoff {
                let changed = self.fold_into(entry, current, previous);
                tracing::debug!(
                    changed,
                    cutoff = %cutoff_text,
                    "folded field changes into pending history entry"
                );
                break;
            }
        }

        Ok(histories)
    }

    fn fold_into(
        &self,
        entry: &mut HistoryEntry,
        current: &RecordSnapshot,
        previous: &RecordSnapshot,
    ) -> usize {
        let mut changed = 0;
        for name in current.field_names() {
            let new_value = current.display_value(name);
            let old_value = previous.display_value(name);
            if old_value != new_value {
                entry.record_change(name, old_value, new_value);
                changed += 1;
            }
        }
        entry.attribute(self.actor, self.clock);
        changed
    }
}

/// Free-function form of [`HistoryReconciler::reconcile`].
pub fn reconcile_history<I, H>(
    current: &RecordSnapshot,
    previous: &RecordSnapshot,
    existing: I,
    actor: &ActorContext,
    clock: &dyn Clock,
) -> Result<Vec<HistoryEntry>>
where
    I: IntoIterator<Item = H>,
    H: Into<HistorySource>,
{
    HistoryReconciler::new(actor, clock).reconcile(current, previous, existing)
}
