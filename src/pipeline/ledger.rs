//! Outcome ledger: terminal state of every accepted input, shared by all stage workers.
//!
//! Each mutation takes the lock for the duration of one record. An item whose transform
//! expanded into several artifacts is settled through an [`ItemTicket`] once its last
//! artifact has been written (or has failed).

use log::warn;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::StageFailure;
use crate::types::{FailureRecord, ItemKey, PipelineOutcome};

/// Called with the number of newly settled items (always 1 today).
pub type ProgressFn = Arc<dyn Fn(usize) + Send + Sync>;

#[derive(Default)]
struct LedgerState {
    settled: HashSet<usize>,
    succeeded: Vec<ItemKey>,
    failures: Vec<FailureRecord>,
}

pub struct OutcomeLedger {
    accepted: usize,
    state: Mutex<LedgerState>,
    on_settled: Option<ProgressFn>,
}

impl OutcomeLedger {
    pub fn new(accepted: usize, on_settled: Option<ProgressFn>) -> Self {
        Self {
            accepted,
            state: Mutex::new(LedgerState::default()),
            on_settled,
        }
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a successful end-to-end item. Returns false if the item was already settled.
    pub fn record_success(&self, key: &ItemKey) -> bool {
        let inserted = {
            let mut state = self.lock();
            let inserted = state.settled.insert(key.index);
            if inserted {
                state.succeeded.push(key.clone());
            }
            inserted
        };
        self.after_settle(inserted, key);
        inserted
    }

    /// Record the terminal failure of an item. Returns false if the item was already settled.
    pub fn record_failure(&self, failure: StageFailure) -> bool {
        let key = failure.item.clone();
        let inserted = {
            let mut state = self.lock();
            let inserted = state.settled.insert(key.index);
            if inserted {
                state.failures.push(failure.into_record());
            }
            inserted
        };
        self.after_settle(inserted, &key);
        inserted
    }

    fn after_settle(&self, inserted: bool, key: &ItemKey) {
        if !inserted {
            warn!("item {} settled twice; keeping the first record", key);
            return;
        }
        if let Some(cb) = &self.on_settled {
            cb(1);
        }
    }

    pub fn settled_count(&self) -> usize {
        self.lock().settled.len()
    }

    /// Copy the recorded state into an outcome. Records are sorted by submission index.
    pub fn snapshot(&self) -> PipelineOutcome {
        let state = self.lock();
        let mut succeeded = state.succeeded.clone();
        let mut failures = state.failures.clone();
        drop(state);
        succeeded.sort_by_key(|k| k.index);
        failures.sort_by_key(|f| f.item.index);
        PipelineOutcome {
            accepted: self.accepted,
            succeeded,
            failures,
            ..PipelineOutcome::default()
        }
    }
}

/// Shared by all artifacts expanded from one input.
#[derive(Debug)]
pub struct ItemTicket {
    key: ItemKey,
    remaining: AtomicUsize,
    first_failure: Mutex<Option<StageFailure>>,
}

impl ItemTicket {
    /// `fan_out` must be the number of artifacts that will settle against this ticket (>= 1).
    pub fn new(key: ItemKey, fan_out: usize) -> Self {
        Self {
            key,
            remaining: AtomicUsize::new(fan_out),
            first_failure: Mutex::new(None),
        }
    }

    pub fn key(&self) -> &ItemKey {
        &self.key
    }

    /// Settle one artifact. The first failure wins; the item is recorded in the ledger when
    /// the last artifact settles.
    pub fn settle(&self, failure: Option<StageFailure>, ledger: &OutcomeLedger) {
        if let Some(f) = failure {
            let mut slot = self
                .first_failure
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if slot.is_none() {
                *slot = Some(f);
            }
        }
        if self.remaining.fetch_sub(1, Ordering::AcqRel) != 1 {
            return;
        }
        let failure = self
            .first_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match failure {
            Some(f) => {
                ledger.record_failure(f);
            }
            None => {
                ledger.record_success(&self.key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureCause;
    use crate::types::{FailureKind, Stage};
    use std::io;

    fn write_failure(key: &ItemKey, msg: &str) -> StageFailure {
        StageFailure::new(
            key.clone(),
            Stage::Write,
            FailureCause::Write(io::Error::other(msg.to_string())),
        )
    }

    #[test]
    fn duplicate_settle_is_ignored() {
        let ledger = OutcomeLedger::new(1, None);
        let key = ItemKey::new(0, "a.cs");
        assert!(ledger.record_success(&key));
        assert!(!ledger.record_success(&key));
        assert!(!ledger.record_failure(write_failure(&key, "late")));
        let outcome = ledger.snapshot();
        assert_eq!(outcome.succeeded_count(), 1);
        assert_eq!(outcome.failed_count(), 0);
        assert!(outcome.is_fully_accounted());
    }

    #[test]
    fn ticket_settles_on_last_artifact() {
        let ledger = OutcomeLedger::new(1, None);
        let key = ItemKey::new(0, "a.cs");
        let ticket = ItemTicket::new(key, 3);
        ticket.settle(None, &ledger);
        ticket.settle(None, &ledger);
        assert_eq!(ledger.settled_count(), 0);
        ticket.settle(None, &ledger);
        assert_eq!(ledger.settled_count(), 1);
        assert_eq!(ledger.snapshot().succeeded_count(), 1);
    }

    #[test]
    fn ticket_keeps_first_failure_only() {
        let ledger = OutcomeLedger::new(1, None);
        let key = ItemKey::new(4, "b.cs");
        let ticket = ItemTicket::new(key.clone(), 3);
        ticket.settle(Some(write_failure(&key, "first")), &ledger);
        ticket.settle(None, &ledger);
        ticket.settle(Some(write_failure(&key, "second")), &ledger);
        let outcome = ledger.snapshot();
        assert_eq!(outcome.failed_count(), 1);
        assert_eq!(outcome.failures[0].kind, FailureKind::WriteFailure);
        assert!(outcome.failures[0].message.contains("first"));
    }

    #[test]
    fn progress_callback_fires_once_per_item() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let ledger = OutcomeLedger::new(
            2,
            Some(Arc::new(move |n| {
                seen.fetch_add(n, Ordering::SeqCst);
            })),
        );
        ledger.record_success(&ItemKey::new(0, "a"));
        ledger.record_success(&ItemKey::new(0, "a"));
        ledger.record_failure(write_failure(&ItemKey::new(1, "b"), "x"));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn outcome_is_sorted_by_index() {
        let ledger = OutcomeLedger::new(3, None);
        ledger.record_success(&ItemKey::new(2, "c"));
        ledger.record_success(&ItemKey::new(0, "a"));
        ledger.record_success(&ItemKey::new(1, "b"));
        let indices: Vec<_> = ledger
            .snapshot()
            .succeeded
            .iter()
            .map(|k| k.index)
            .collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }
}
