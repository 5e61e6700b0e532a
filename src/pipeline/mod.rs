//! Pipeline components: bounded stages, queues, item accounting, collaborators.

pub mod cancel;
pub mod context;
pub mod error_handler;
pub mod ledger;
pub mod orchestrator;
pub mod ports;
pub mod retry;
pub mod stage;
pub mod walk;

pub use cancel::CancelToken;
pub use context::{PipelineChannels, create_pipeline_channels};
pub use error_handler::check_outcome;
pub use ledger::{ItemTicket, OutcomeLedger, ProgressFn};
pub use orchestrator::{Pipeline, run_pipeline};
pub use ports::{ArtifactWriter, FsReader, FsWriter, SourceReader, Transform};
pub use retry::{RetryPolicy, is_transient, retry_io};
pub use stage::{StageContext, StageHandle, Tracked, WorkItem, spawn_stage};
pub use walk::{expand_inputs, keys_for, run_source_loop, spawn_source_thread};
