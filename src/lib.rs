//! Stubsmith: concurrent MSTest stub generation through a bounded
//! read → transform → write pipeline

pub mod engine;
pub mod error;
pub mod generate;
pub mod pipeline;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use error::{FailureCause, PipelineError, StageFailure, TransformError};
pub use generate::{StubGenerator, generate_stubs};
pub use pipeline::{CancelToken, Pipeline, RetryPolicy, run_pipeline};
pub use types::*;

use log::debug;
use std::path::PathBuf;

/// Result alias used by the application layer
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Generate stubs for `inputs` with `opts`: directories are expanded with `opts.extension`,
/// then every file goes through the pipeline with `opts.budget` and `opts.retry`.
///
/// Item failures are in the returned outcome; only configuration problems
/// (no inputs, a zero budget) are errors.
pub fn generate_dir(inputs: &[PathBuf], opts: &Opts) -> Result<PipelineOutcome> {
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_uppercase(),
        opts
    );
    let paths = pipeline::expand_inputs(inputs, &opts.extension);
    let outcome = Pipeline::default()
        .with_retry(opts.retry)
        .run(&paths, &opts.output_dir, opts.budget)?;
    Ok(outcome)
}
