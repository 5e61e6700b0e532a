//! CLI command handler: expand inputs, run the pipeline, report.

use anyhow::{Context, Result};
use kdam::Animation;
use log::{debug, warn};
use std::path::Path;

use crate::Opts;
use crate::engine::arg_parser::Cli;
use crate::engine::hashing::verify_artifacts;
use crate::engine::progress::{
    ProgressBarConfig, create_progress_bar, finish_progress_bar, progress_callback,
};
use crate::engine::report::{outcome_json, print_summary};
use crate::engine::tools::resolve_output_dir;
use crate::pipeline::{CancelToken, Pipeline, check_outcome, expand_inputs};
use crate::utils::stubsmith_toml::{LoadedConfig, apply_file_to_opts, load_stubsmith_toml};
use crate::utils::{setup_logging, warn_if_over_fd_limit};

/// Defaults, then the config file, then CLI flags.
///
/// An implicit config file that does not parse is skipped; its error comes back
/// alongside the options so it can be logged once the logger is set up.
pub fn resolve_opts(cli: &Cli, cwd: &Path) -> Result<(Opts, Option<anyhow::Error>)> {
    let mut opts = Opts::default();
    let mut ignored = None;
    match load_stubsmith_toml(cli.config.as_deref(), cwd)? {
        LoadedConfig::File(file) => apply_file_to_opts(&file, &mut opts),
        LoadedConfig::Unparsable(e) => ignored = Some(e),
        LoadedConfig::Absent => {}
    }
    if let Some(ref dir) = cli.output_dir {
        opts.output_dir = dir.clone();
    }
    if let Some(n) = cli.read {
        opts.budget.read = n;
    }
    if let Some(n) = cli.transform {
        opts.budget.transform = n;
    }
    if let Some(n) = cli.write {
        opts.budget.write = n;
    }
    if let Some(n) = cli.retries {
        opts.retry.max_retries = n;
    }
    if let Some(ref ext) = cli.ext {
        opts.extension = ext.clone();
    }
    if let Some(strict) = cli.strict {
        opts.strict = strict;
    }
    if let Some(verbose) = cli.verbose {
        opts.verbose = verbose;
    }
    opts.json = cli.json;
    Ok((opts, ignored))
}

fn install_interrupt_handler(cancel: &CancelToken) {
    let cancel = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        warn!("Interrupted; finishing in-flight files and skipping the rest");
        cancel.cancel();
    }) {
        warn!("Could not install Ctrl-C handler: {}", e);
    }
}

/// Generate stubs for every input and report the outcome.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("current directory")?;
    let (opts, ignored_config) = resolve_opts(cli, &cwd)?;
    setup_logging(opts.verbose);
    if let Some(e) = ignored_config {
        warn!("Ignoring config file: {:#}", e);
    }
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_uppercase(),
        opts
    );

    let inputs = expand_inputs(&cli.inputs, &opts.extension);
    let output_dir = resolve_output_dir(&opts.output_dir);
    warn_if_over_fd_limit(opts.budget.read, opts.budget.write);

    let cancel = CancelToken::new();
    install_interrupt_handler(&cancel);
    let mut pipeline = Pipeline::default()
        .with_retry(opts.retry)
        .with_cancel_token(cancel);

    let bar = (opts.verbose && !opts.json).then(|| {
        create_progress_bar(ProgressBarConfig::new(
            inputs.len(),
            "Generating",
            Animation::Classic,
        ))
    });
    if let Some(cb) = progress_callback(&bar) {
        pipeline = pipeline.with_progress(cb);
    }

    let outcome = pipeline
        .run(&inputs, &output_dir, opts.budget)
        .context("stub generation")?;
    if let Some(ref bar) = bar {
        finish_progress_bar(bar, outcome.succeeded_count() + outcome.failed_count());
    }
    if opts.verbose {
        let stale = verify_artifacts(&outcome.artifacts);
        for path in &stale {
            warn!("{} does not match the content written this run", path.display());
        }
        debug!("verified {} written files", outcome.artifacts.len() - stale.len());
    }

    if opts.json {
        println!("{}", outcome_json(&outcome)?);
    } else {
        print_summary(&outcome, &output_dir, opts.verbose);
    }
    check_outcome(&opts, &outcome)
}
