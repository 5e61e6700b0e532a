//! Error types: run-level configuration failures and item-level stage failures.

use std::io;
use thiserror::Error;

use crate::types::{FailureKind, FailureRecord, ItemKey, Stage};

/// Run-level failure. Surfaced before any stage starts; no item is processed.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no input files were given")]
    EmptyInput,

    #[error("{stage} concurrency must be at least 1 (got {value})")]
    InvalidBudget { stage: Stage, value: usize },

    #[error("failed to spawn {stage} worker thread")]
    Spawn {
        stage: Stage,
        #[source]
        source: io::Error,
    },
}

/// Failure of the transform collaborator for one document.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("malformed source near line {line}")]
    Malformed { line: usize },

    #[error("parser unavailable: {0}")]
    Grammar(String),
}

/// Why one item failed at one stage.
#[derive(Debug, Error)]
pub enum FailureCause {
    #[error("read failed: {0}")]
    Read(#[source] io::Error),

    #[error("transform failed: {0}")]
    Transform(#[from] TransformError),

    #[error("write failed: {0}")]
    Write(#[source] io::Error),

    #[error("cancelled before processing")]
    Cancelled,

    #[error("worker panicked: {0}")]
    Panicked(String),
}

/// A failure attributed to an item and the stage it happened in.
#[derive(Debug)]
pub struct StageFailure {
    pub item: ItemKey,
    pub stage: Stage,
    pub cause: FailureCause,
}

impl StageFailure {
    pub fn new(item: ItemKey, stage: Stage, cause: FailureCause) -> Self {
        Self { item, stage, cause }
    }

    pub fn kind(&self) -> FailureKind {
        match self.cause {
            FailureCause::Cancelled => FailureKind::Cancelled,
            _ => FailureKind::for_stage(self.stage),
        }
    }

    pub fn into_record(self) -> FailureRecord {
        FailureRecord {
            kind: self.kind(),
            message: self.cause.to_string(),
            item: self.item,
            stage: self.stage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_follows_stage_unless_cancelled() {
        let key = ItemKey::new(0, "a.cs");
        let f = StageFailure::new(
            key.clone(),
            Stage::Transform,
            FailureCause::Panicked("boom".into()),
        );
        assert_eq!(f.kind(), FailureKind::TransformFailure);

        let f = StageFailure::new(key, Stage::Write, FailureCause::Cancelled);
        assert_eq!(f.kind(), FailureKind::Cancelled);
    }

    #[test]
    fn record_keeps_cause_message() {
        let f = StageFailure::new(
            ItemKey::new(3, "missing.cs"),
            Stage::Read,
            FailureCause::Read(io::Error::new(io::ErrorKind::NotFound, "no such file")),
        );
        let record = f.into_record();
        assert_eq!(record.kind, FailureKind::ReadFailure);
        assert_eq!(record.item.index, 3);
        assert!(record.message.contains("no such file"));
    }
}
