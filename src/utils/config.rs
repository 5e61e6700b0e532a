//! Application configuration constants.
//! Defaults and thresholds in one place.

use std::sync::OnceLock;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    config_filename: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                config_filename: format!(".{pkg}.toml"),
            }
        })
    }

    /// Config file looked up in the current directory when `--config` is not given.
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }
}

// ---- Stage limits ----

/// Bounds for the default per-stage limit.
pub struct StageLimitConsts;

impl StageLimitConsts {
    pub const MIN: usize = 1;
    pub const MAX: usize = 8;
}

/// Default limit for every stage: available parallelism clamped to
/// [`StageLimitConsts::MIN`]..=[`StageLimitConsts::MAX`].
pub fn default_stage_limit() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(StageLimitConsts::MIN)
        .clamp(StageLimitConsts::MIN, StageLimitConsts::MAX)
}

// ---- Retry ----

/// Backoff defaults for read and write retries.
pub struct RetryConsts;

impl RetryConsts {
    /// Retries after the first attempt. 0 = exactly one attempt.
    pub const MAX_RETRIES: u32 = 0;
    pub const BASE_DELAY_MS: u64 = 50;
    pub const MAX_DELAY_MS: u64 = 2_000;
}

// ---- Hashing ----

/// Buffer size for digesting files on disk.
pub struct HashingConsts;

impl HashingConsts {
    /// 64 KB; generated files are small.
    pub const READ_CHUNK_SIZE: usize = 64 * 1024;
}

// ---- Inputs ----

/// Extension used when expanding directory inputs.
pub const DEFAULT_EXTENSION: &str = "cs";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limit_is_clamped() {
        let n = default_stage_limit();
        assert!((StageLimitConsts::MIN..=StageLimitConsts::MAX).contains(&n));
        assert_eq!(PackagePaths::get().config_filename(), ".stubsmith.toml");
    }
}
