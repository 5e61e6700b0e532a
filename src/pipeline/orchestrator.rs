use log::{debug, error, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::engine::hashing::digest_hex;
use crate::error::{FailureCause, PipelineError};
use crate::generate::StubGenerator;
use crate::types::{Artifact, ConcurrencyBudget, PipelineOutcome, Stage, WrittenArtifact};

use super::cancel::CancelToken;
use super::context::create_pipeline_channels;
use super::ledger::{ItemTicket, OutcomeLedger, ProgressFn};
use super::ports::{ArtifactWriter, FsReader, FsWriter, SourceReader, Transform};
use super::retry::{RetryPolicy, retry_io};
use super::stage::{StageContext, WorkItem, spawn_stage};
use super::walk::{keys_for, spawn_source_thread};

/// Read → transform → write over a fixed batch of inputs, each stage capped by its budget.
///
/// A pipeline is reusable: every [`Pipeline::run`] builds fresh queues and workers.
pub struct Pipeline {
    reader: Arc<dyn SourceReader>,
    transform: Arc<dyn Transform>,
    writer: Arc<dyn ArtifactWriter>,
    retry: RetryPolicy,
    cancel: CancelToken,
    on_settled: Option<ProgressFn>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(StubGenerator)
    }
}

impl Pipeline {
    /// Filesystem reader and writer around `transform`; no retries.
    pub fn new(transform: impl Transform + 'static) -> Self {
        Self {
            reader: Arc::new(FsReader),
            transform: Arc::new(transform),
            writer: Arc::new(FsWriter),
            retry: RetryPolicy::none(),
            cancel: CancelToken::new(),
            on_settled: None,
        }
    }

    pub fn with_reader(mut self, reader: impl SourceReader + 'static) -> Self {
        self.reader = Arc::new(reader);
        self
    }

    pub fn with_writer(mut self, writer: impl ArtifactWriter + 'static) -> Self {
        self.writer = Arc::new(writer);
        self
    }

    /// Retries apply to the read and write stages only.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// `f` is called once per input as soon as it reaches its terminal state.
    pub fn with_progress(mut self, f: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.on_settled = Some(Arc::new(f));
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Process every path and return once each one has been written or has failed.
    ///
    /// Fails fast, before any stage starts, on an empty input list or a zero budget.
    /// Item-level failures never fail the run; they are reported in the outcome.
    pub fn run(
        &self,
        paths: &[PathBuf],
        output_dir: &Path,
        budget: ConcurrencyBudget,
    ) -> Result<PipelineOutcome, PipelineError> {
        if paths.is_empty() {
            return Err(PipelineError::EmptyInput);
        }
        budget.validate()?;
        let start = Instant::now();
        info!(
            "Generating from {} inputs into {} (read={}, transform={}, write={})",
            paths.len(),
            output_dir.display(),
            budget.read,
            budget.transform,
            budget.write
        );

        let ledger = Arc::new(OutcomeLedger::new(paths.len(), self.on_settled.clone()));
        let ctx = StageContext {
            ledger: Arc::clone(&ledger),
            cancel: self.cancel.clone(),
        };
        let channels = create_pipeline_channels(&budget);

        // Downstream first, so a spawn failure leaves no admitted item behind.
        let writer = Arc::clone(&self.writer);
        let retry = self.retry;
        let cancel = self.cancel.clone();
        let write_stage = spawn_stage(
            Stage::Write,
            budget.write,
            channels.artifact_rx,
            channels.report_tx,
            ctx.clone(),
            move |artifact: &Artifact| {
                let what = artifact.destination.display().to_string();
                retry_io(&retry, &cancel, &what, || {
                    writer.write(&artifact.destination, &artifact.content)
                })
                .map_err(FailureCause::Write)?;
                Ok(vec![WrittenArtifact {
                    item: artifact.key().clone(),
                    destination: artifact.destination.clone(),
                    bytes: artifact.content.len(),
                    digest: digest_hex(artifact.content.as_bytes()),
                }])
            },
        )?;

        let transform = Arc::clone(&self.transform);
        let out_dir = output_dir.to_path_buf();
        let transform_stage = spawn_stage(
            Stage::Transform,
            budget.transform,
            channels.doc_rx,
            channels.artifact_tx,
            ctx.clone(),
            move |doc: &WorkItem<String>| {
                let files = transform.transform(&doc.payload)?;
                if files.is_empty() {
                    return Ok(Vec::new());
                }
                let ticket = Arc::new(ItemTicket::new(doc.key.clone(), files.len()));
                Ok(files
                    .into_iter()
                    .map(|f| Artifact {
                        destination: out_dir.join(&f.name),
                        content: f.body,
                        ticket: Arc::clone(&ticket),
                    })
                    .collect())
            },
        )?;

        let reader = Arc::clone(&self.reader);
        let retry = self.retry;
        let cancel = self.cancel.clone();
        let read_stage = spawn_stage(
            Stage::Read,
            budget.read,
            channels.path_rx,
            channels.doc_tx,
            ctx.clone(),
            move |item: &WorkItem<PathBuf>| {
                let what = item.payload.display().to_string();
                let content = retry_io(&retry, &cancel, &what, || reader.read(&item.payload))
                    .map_err(FailureCause::Read)?;
                Ok(vec![WorkItem::new(item.key.clone(), content)])
            },
        )?;

        let source = spawn_source_thread(channels.path_tx, keys_for(paths), ctx)?;

        // The report queue closes once the last writer exits.
        let mut artifacts: Vec<WrittenArtifact> = channels.report_rx.iter().collect();

        let submitted = source.join().unwrap_or_else(|_| {
            error!("source thread panicked");
            0
        });
        debug!("source: {} of {} inputs submitted", submitted, paths.len());
        let stages = vec![read_stage.join(), transform_stage.join(), write_stage.join()];

        let mut outcome = ledger.snapshot();
        artifacts.sort_by(|a, b| {
            (a.item.index, &a.destination).cmp(&(b.item.index, &b.destination))
        });
        outcome.artifacts = artifacts;
        outcome.stages = stages;
        outcome.cancelled = self.cancel.is_cancelled();
        outcome.elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        if !outcome.is_fully_accounted() {
            error!(
                "accounting mismatch: {} accepted, {} succeeded, {} failed",
                outcome.accepted,
                outcome.succeeded_count(),
                outcome.failed_count()
            );
        }
        info!(
            "Done in {} ms: {} succeeded, {} failed, {} files written",
            outcome.elapsed_ms,
            outcome.succeeded_count(),
            outcome.failed_count(),
            outcome.artifacts.len()
        );
        Ok(outcome)
    }
}

/// Run the stub generator over `paths` with the filesystem reader and writer.
pub fn run_pipeline(
    paths: &[PathBuf],
    output_dir: &Path,
    read: usize,
    transform: usize,
    write: usize,
) -> Result<PipelineOutcome, PipelineError> {
    Pipeline::default().run(
        paths,
        output_dir,
        ConcurrencyBudget::new(read, transform, write),
    )
}
