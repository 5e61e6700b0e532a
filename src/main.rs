//! Stubsmith CLI: generate MSTest skeletons for C# files and directories.

use anyhow::Result;
use clap::Parser;
use std::time::Instant;
use stubsmith::engine::arg_parser::Cli;
use stubsmith::engine::handle_run;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
