//! Bounded retry with exponential backoff for the read and write stages.
//!
//! Transform failures are never retried: malformed content stays malformed.

use log::debug;
use std::io;
use std::time::Duration;

use super::cancel::CancelToken;

/// Retry configuration. `max_retries` counts attempts after the first one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Delay before the first retry. Subsequent delays double.
    pub base_delay: Duration,
    /// Cap on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: crate::utils::config::RetryConsts::MAX_RETRIES,
            base_delay: Duration::from_millis(crate::utils::config::RetryConsts::BASE_DELAY_MS),
            max_delay: Duration::from_millis(crate::utils::config::RetryConsts::MAX_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// Exactly one attempt.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Delay before retry number `attempt` (0-indexed): `base * 2^attempt`, capped.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        // Checked shift so attempts >= 32 saturate instead of overflowing.
        let multiplier = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(multiplier)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Errors that will not go away by trying again.
pub fn is_transient(err: &io::Error) -> bool {
    !matches!(
        err.kind(),
        io::ErrorKind::NotFound
            | io::ErrorKind::PermissionDenied
            | io::ErrorKind::InvalidInput
            | io::ErrorKind::InvalidData
            | io::ErrorKind::Unsupported
            | io::ErrorKind::IsADirectory
            | io::ErrorKind::NotADirectory
    )
}

/// Run `op` until it succeeds, fails permanently, runs out of retries, or the token is cancelled.
/// The last error is returned on failure.
pub fn retry_io<T, F>(
    policy: &RetryPolicy,
    cancel: &CancelToken,
    what: &str,
    mut op: F,
) -> io::Result<T>
where
    F: FnMut() -> io::Result<T>,
{
    let mut attempt = 0u32;
    loop {
        match op() {
            Ok(v) => return Ok(v),
            Err(e) if attempt < policy.max_retries && is_transient(&e) => {
                let delay = policy.delay_for_attempt(attempt);
                debug!(
                    "{}: attempt {} failed ({}), retrying in {:?}",
                    what,
                    attempt + 1,
                    e,
                    delay
                );
                if cancel.wait_timeout(delay) {
                    return Err(e);
                }
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
