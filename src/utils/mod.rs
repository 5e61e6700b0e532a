pub mod config;
pub mod fd_limit;
pub mod logger;
pub(crate) mod stubsmith_toml;

pub use config::*;
pub use fd_limit::{FDS_PER_WORKER, max_open_fds, warn_if_over_fd_limit};
pub use logger::{Colors, setup_logging};
