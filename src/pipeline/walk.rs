//! Item source: expands user inputs into an ordered path list and feeds the read stage.

use crossbeam_channel::Sender;
use log::{debug, error, warn};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use walkdir::WalkDir;

use crate::error::{FailureCause, PipelineError, StageFailure};
use crate::types::{ItemKey, Stage};

use super::stage::{StageContext, WorkItem};

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

/// Expand inputs: directories are walked for files with `extension` (sorted per directory),
/// everything else is passed through as given, including paths that do not exist.
/// Missing files are not filtered here; they surface later as read failures.
pub fn expand_inputs(inputs: &[PathBuf], extension: &str) -> Vec<PathBuf> {
    let extension = extension.trim_start_matches('.');
    let mut out = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            out.push(input.clone());
            continue;
        }
        let mut found: Vec<PathBuf> = Vec::new();
        for entry in WalkDir::new(input).follow_links(false) {
            match entry {
                Ok(e) if e.file_type().is_file() && has_extension(e.path(), extension) => {
                    found.push(e.into_path());
                }
                Ok(_) => {}
                Err(err) => warn!("Skipping unreadable path under {}: {}", input.display(), err),
            }
        }
        found.sort();
        debug!(
            "{}: {} .{} files",
            input.display(),
            found.len(),
            extension
        );
        out.extend(found);
    }
    out
}

/// Build the keys for a run, in submission order.
pub fn keys_for(paths: &[PathBuf]) -> Vec<ItemKey> {
    paths
        .iter()
        .enumerate()
        .map(|(i, p)| ItemKey::new(i, p.clone()))
        .collect()
}

/// Submit every key to the read stage, then drop `path_tx` to close its queue.
/// After cancellation the remaining keys are recorded as cancelled instead of submitted.
/// Returns the number of keys actually submitted.
pub fn run_source_loop(
    path_tx: Sender<WorkItem<PathBuf>>,
    keys: Vec<ItemKey>,
    ctx: StageContext,
) -> usize {
    let mut submitted = 0_usize;
    for key in keys {
        if ctx.cancel.is_cancelled() {
            ctx.ledger
                .record_failure(StageFailure::new(key, Stage::Read, FailureCause::Cancelled));
            continue;
        }
        let path = key.path.clone();
        if let Err(err) = path_tx.send(WorkItem::new(key, path)) {
            let key = err.into_inner().key;
            error!("read queue closed before {} was submitted", key);
            ctx.ledger
                .record_failure(StageFailure::new(key, Stage::Read, FailureCause::Cancelled));
            continue;
        }
        submitted += 1;
    }
    drop(path_tx);
    submitted
}

pub fn spawn_source_thread(
    path_tx: Sender<WorkItem<PathBuf>>,
    keys: Vec<ItemKey>,
    ctx: StageContext,
) -> Result<JoinHandle<usize>, PipelineError> {
    thread::Builder::new()
        .name(format!("{}-source", env!("CARGO_PKG_NAME")))
        .spawn(move || run_source_loop(path_tx, keys, ctx))
        .map_err(|source| PipelineError::Spawn {
            stage: Stage::Read,
            source,
        })
}
