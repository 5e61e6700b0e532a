//! Queues between the stages. Each queue is bounded by the concurrency cap of the stage that
//! consumes it, so a saturated stage blocks its producers.

use crossbeam_channel::{Receiver, Sender, bounded};
use std::path::PathBuf;

use crate::types::{Artifact, ConcurrencyBudget, WrittenArtifact};

use super::stage::WorkItem;

/// Channel endpoints for one run. The source thread gets `path_tx`; each stage gets its
/// inbound receiver and outbound sender; the caller keeps `report_rx`.
pub struct PipelineChannels {
    pub path_tx: Sender<WorkItem<PathBuf>>,
    pub path_rx: Receiver<WorkItem<PathBuf>>,
    pub doc_tx: Sender<WorkItem<String>>,
    pub doc_rx: Receiver<WorkItem<String>>,
    pub artifact_tx: Sender<Artifact>,
    pub artifact_rx: Receiver<Artifact>,
    pub report_tx: Sender<WrittenArtifact>,
    pub report_rx: Receiver<WrittenArtifact>,
}

pub fn create_pipeline_channels(budget: &ConcurrencyBudget) -> PipelineChannels {
    let (path_tx, path_rx) = bounded(budget.read.max(1));
    let (doc_tx, doc_rx) = bounded(budget.transform.max(1));
    let (artifact_tx, artifact_rx) = bounded(budget.write.max(1));
    let (report_tx, report_rx) = bounded(budget.write.max(1));
    PipelineChannels {
        path_tx,
        path_rx,
        doc_tx,
        doc_rx,
        artifact_tx,
        artifact_rx,
        report_tx,
        report_rx,
    }
}
