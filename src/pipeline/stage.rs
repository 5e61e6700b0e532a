//! Generic stage runner: a fixed pool of `limit` worker threads draining one bounded queue.
//!
//! The pool size is the concurrency cap. Each worker owns a clone of the downstream sender,
//! so the downstream queue closes exactly when the last worker of this stage exits, which
//! happens only after the inbound queue was closed and drained.

use crossbeam_channel::{Receiver, Sender};
use log::{debug, error, warn};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};

use crate::error::{FailureCause, PipelineError, StageFailure};
use crate::types::{Artifact, ItemKey, Stage, StageReport};

use super::cancel::CancelToken;
use super::ledger::OutcomeLedger;

/// An input unit entering the read or transform stage.
#[derive(Debug)]
pub struct WorkItem<T> {
    pub key: ItemKey,
    pub payload: T,
}

impl<T> WorkItem<T> {
    pub fn new(key: ItemKey, payload: T) -> Self {
        Self { key, payload }
    }
}

/// Anything that can travel through a stage and be settled against the ledger.
pub trait Tracked: Send + 'static {
    fn key(&self) -> &ItemKey;

    /// The unit function succeeded and `emitted` outputs were forwarded downstream.
    fn on_success(&self, emitted: usize, ledger: &OutcomeLedger);

    /// The unit function failed (or was skipped) for this unit.
    fn on_failure(&self, failure: StageFailure, ledger: &OutcomeLedger);
}

impl<T: Send + 'static> Tracked for WorkItem<T> {
    fn key(&self) -> &ItemKey {
        &self.key
    }

    fn on_success(&self, emitted: usize, ledger: &OutcomeLedger) {
        // Nothing went downstream, so the item is done here.
        if emitted == 0 {
            ledger.record_success(&self.key);
        }
    }

    fn on_failure(&self, failure: StageFailure, ledger: &OutcomeLedger) {
        ledger.record_failure(failure);
    }
}

impl Tracked for Artifact {
    fn key(&self) -> &ItemKey {
        self.ticket.key()
    }

    fn on_success(&self, _emitted: usize, ledger: &OutcomeLedger) {
        self.ticket.settle(None, ledger);
    }

    fn on_failure(&self, failure: StageFailure, ledger: &OutcomeLedger) {
        self.ticket.settle(Some(failure), ledger);
    }
}

/// Shared state every stage worker needs.
#[derive(Clone)]
pub struct StageContext {
    pub ledger: Arc<OutcomeLedger>,
    pub cancel: CancelToken,
}

#[derive(Default)]
struct StageCounters {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
}

impl StageCounters {
    fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Running stage. Join it after its inbound queue has been closed.
pub struct StageHandle {
    stage: Stage,
    limit: usize,
    workers: Vec<JoinHandle<()>>,
    counters: Arc<StageCounters>,
}

impl StageHandle {
    /// Wait for every worker to exit and report the stage counters.
    pub fn join(self) -> StageReport {
        for h in self.workers {
            if h.join().is_err() {
                error!("{} worker exited abnormally", self.stage);
            }
        }
        StageReport {
            stage: self.stage,
            limit: self.limit,
            completed: self.counters.completed.load(Ordering::SeqCst),
            failed: self.counters.failed.load(Ordering::SeqCst),
            peak_in_flight: self.counters.peak.load(Ordering::SeqCst),
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn worker_loop<I, O, F>(
    stage: Stage,
    inbound: Receiver<I>,
    outbound: Sender<O>,
    ctx: StageContext,
    unit: Arc<F>,
    counters: Arc<StageCounters>,
) where
    I: Tracked,
    O: Send + 'static,
    F: Fn(&I) -> Result<Vec<O>, FailureCause> + Send + Sync + 'static,
{
    while let Ok(item) = inbound.recv() {
        if ctx.cancel.is_cancelled() {
            counters.failed.fetch_add(1, Ordering::Relaxed);
            let failure = StageFailure::new(item.key().clone(), stage, FailureCause::Cancelled);
            item.on_failure(failure, &ctx.ledger);
            continue;
        }

        counters.enter();
        let result = catch_unwind(AssertUnwindSafe(|| unit(&item)))
            .unwrap_or_else(|payload| Err(FailureCause::Panicked(panic_message(payload))));
        counters.exit();

        match result {
            Ok(outputs) => {
                counters.completed.fetch_add(1, Ordering::Relaxed);
                let emitted = outputs.len();
                for out in outputs {
                    if outbound.send(out).is_err() {
                        error!("{}: downstream closed while forwarding {}", stage, item.key());
                        break;
                    }
                }
                debug!("{}: {} done ({} forwarded)", stage, item.key(), emitted);
                item.on_success(emitted, &ctx.ledger);
            }
            Err(cause) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                warn!("{}: {} failed: {}", stage, item.key(), cause);
                let failure = StageFailure::new(item.key().clone(), stage, cause);
                item.on_failure(failure, &ctx.ledger);
            }
        }
    }
    drop(outbound);
}

/// Spawn `limit` workers for `stage`. Every worker drains `inbound`, applies `unit`, and
/// forwards each returned output individually on `outbound`.
///
/// Failures are recorded through [`Tracked::on_failure`] and never stop the stage.
/// The caller must drop its own clones of `outbound` for the downstream queue to close.
pub fn spawn_stage<I, O, F>(
    stage: Stage,
    limit: usize,
    inbound: Receiver<I>,
    outbound: Sender<O>,
    ctx: StageContext,
    unit: F,
) -> Result<StageHandle, PipelineError>
where
    I: Tracked,
    O: Send + 'static,
    F: Fn(&I) -> Result<Vec<O>, FailureCause> + Send + Sync + 'static,
{
    if limit == 0 {
        return Err(PipelineError::InvalidBudget { stage, value: limit });
    }
    let unit = Arc::new(unit);
    let counters = Arc::new(StageCounters::default());
    let mut workers = Vec::with_capacity(limit);
    for worker_id in 0..limit {
        let inbound = inbound.clone();
        let outbound = outbound.clone();
        let ctx = ctx.clone();
        let unit = Arc::clone(&unit);
        let counters = Arc::clone(&counters);
        let handle = thread::Builder::new()
            .name(format!("{}-{}-{}", env!("CARGO_PKG_NAME"), stage, worker_id))
            .spawn(move || worker_loop(stage, inbound, outbound, ctx, unit, counters))
            .map_err(|source| PipelineError::Spawn { stage, source })?;
        workers.push(handle);
    }
    debug!("{}: {} workers started", stage, limit);
    Ok(StageHandle {
        stage,
        limit,
        workers,
        counters,
    })
}
