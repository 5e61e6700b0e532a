//! Public and internal types for the stubsmith API and pipeline.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::PipelineError;
use crate::pipeline::ledger::ItemTicket;
use crate::pipeline::retry::RetryPolicy;

/// Identity of one accepted input: submission index plus the path it was given as.
///
/// Every unit of work derived from an input carries its key so failures can be
/// attributed to the originating file no matter which stage they happen in.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ItemKey {
    pub index: usize,
    pub path: PathBuf,
}

impl ItemKey {
    pub fn new(index: usize, path: impl Into<PathBuf>) -> Self {
        Self {
            index,
            path: path.into(),
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.index, self.path.display())
    }
}

/// The three fixed stages of the pipeline, in data-flow order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Read,
    Transform,
    Write,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Read, Stage::Transform, Stage::Write];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Read => "read",
            Stage::Transform => "transform",
            Stage::Write => "write",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-stage concurrency caps, fixed for the lifetime of one run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ConcurrencyBudget {
    pub read: usize,
    pub transform: usize,
    pub write: usize,
}

impl ConcurrencyBudget {
    pub fn new(read: usize, transform: usize, write: usize) -> Self {
        Self {
            read,
            transform,
            write,
        }
    }

    /// Same cap for every stage.
    pub fn uniform(limit: usize) -> Self {
        Self::new(limit, limit, limit)
    }

    pub fn limit(&self, stage: Stage) -> usize {
        match stage {
            Stage::Read => self.read,
            Stage::Transform => self.transform,
            Stage::Write => self.write,
        }
    }

    /// Every cap must be at least 1.
    pub fn validate(&self) -> Result<(), PipelineError> {
        for stage in Stage::ALL {
            let value = self.limit(stage);
            if value == 0 {
                return Err(PipelineError::InvalidBudget { stage, value });
            }
        }
        Ok(())
    }
}

/// One output of the transform: a file name (relative to the output directory) and its body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedFile {
    pub name: String,
    pub body: String,
}

impl GeneratedFile {
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
        }
    }
}

/// Unit of data flowing from the transform stage to the write stage.
///
/// Artifacts expanded from the same input share one ticket; the input is settled
/// once the last of them has been written or has failed.
#[derive(Debug)]
pub struct Artifact {
    pub destination: PathBuf,
    pub content: String,
    pub(crate) ticket: Arc<ItemTicket>,
}

impl Artifact {
    pub fn key(&self) -> &ItemKey {
        self.ticket.key()
    }
}

/// Report for one artifact that reached disk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WrittenArtifact {
    pub item: ItemKey,
    pub destination: PathBuf,
    pub bytes: usize,
    /// blake3 of the written content, hex encoded.
    pub digest: String,
}

/// Classification of an item-level failure record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum FailureKind {
    ReadFailure,
    TransformFailure,
    WriteFailure,
    Cancelled,
}

impl FailureKind {
    pub fn for_stage(stage: Stage) -> Self {
        match stage {
            Stage::Read => FailureKind::ReadFailure,
            Stage::Transform => FailureKind::TransformFailure,
            Stage::Write => FailureKind::WriteFailure,
        }
    }
}

/// Terminal failure of one input: which item, which stage, and why.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub item: ItemKey,
    pub stage: Stage,
    pub kind: FailureKind,
    pub message: String,
}

/// Per-stage counters collected when a stage's workers are joined.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    pub limit: usize,
    /// Unit executions that returned successfully.
    pub completed: usize,
    /// Unit executions that failed, panicked, or were skipped due to cancellation.
    pub failed: usize,
    /// Highest number of unit executions observed running at once.
    pub peak_in_flight: usize,
}

/// Aggregate result of one pipeline run. Accounts for every accepted input exactly once.
#[derive(Clone, Debug, Default, Serialize)]
pub struct PipelineOutcome {
    pub accepted: usize,
    pub succeeded: Vec<ItemKey>,
    pub failures: Vec<FailureRecord>,
    pub artifacts: Vec<WrittenArtifact>,
    pub stages: Vec<StageReport>,
    pub cancelled: bool,
    pub elapsed_ms: u64,
}

impl PipelineOutcome {
    pub fn succeeded_count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }

    /// True when successes plus failures cover every accepted input.
    pub fn is_fully_accounted(&self) -> bool {
        self.succeeded.len() + self.failures.len() == self.accepted
    }

    pub fn failures_of(&self, kind: FailureKind) -> impl Iterator<Item = &FailureRecord> {
        self.failures.iter().filter(move |f| f.kind == kind)
    }

    pub fn stage_report(&self, stage: Stage) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.stage == stage)
    }
}

/// Full options (CLI and config file). The library entry point only needs
/// `output_dir`, `budget`, and `retry`.
#[derive(Clone, Debug)]
pub struct Opts {
    /// Directory generated files are written to.
    pub output_dir: PathBuf,
    /// Per-stage concurrency caps.
    pub budget: ConcurrencyBudget,
    /// Retry policy for read and write failures.
    pub retry: RetryPolicy,
    /// Extension used when expanding directory inputs.
    pub extension: String,
    /// Fail the process when any input failed.
    pub strict: bool,
    /// Debug logging and progress bar.
    pub verbose: bool,
    /// Print the outcome as JSON on stdout.
    pub json: bool,
}

impl Default for Opts {
    fn default() -> Self {
        let limit = crate::utils::config::default_stage_limit();
        Self {
            output_dir: PathBuf::from("."),
            budget: ConcurrencyBudget::uniform(limit),
            retry: RetryPolicy::default(),
            extension: crate::utils::config::DEFAULT_EXTENSION.to_string(),
            strict: false,
            verbose: false,
            json: false,
        }
    }
}
