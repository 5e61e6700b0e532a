//! Engine module: CLI surface, hashing, progress and reporting

pub mod arg_parser;
pub mod cli;
pub mod hashing;
pub mod progress;
pub mod report;
pub mod tools;

pub use arg_parser::Cli;
pub use cli::{handle_run, resolve_opts};
pub use hashing::{digest_file, digest_hex, verify_artifacts};
pub use tools::resolve_output_dir;
