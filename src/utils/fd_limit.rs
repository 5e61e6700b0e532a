//! File descriptor limit check for the read and write budgets (Unix).

/// File descriptors a read or write worker holds at once (source or temp file, plus slack).
pub const FDS_PER_WORKER: usize = 2;

/// Fraction of the process FD limit the pipeline may use.
const FD_LIMIT_FRACTION: f64 = 0.8;

/// Soft limit for open file descriptors, or `None` if unavailable (e.g. Windows).
#[cfg(unix)]
pub fn max_open_fds() -> Option<u64> {
    use std::mem::MaybeUninit;
    let mut rlim = MaybeUninit::<libc::rlimit>::uninit();
    if unsafe { libc::getrlimit(libc::RLIMIT_NOFILE, rlim.as_mut_ptr()) } != 0 {
        return None;
    }
    let rlim = unsafe { rlim.assume_init() };
    let cur = rlim.rlim_cur;
    // RLIM_INFINITY: no practical limit
    if cur == libc::RLIM_INFINITY || cur > i64::MAX as u64 {
        return None;
    }
    Some(cur)
}

#[cfg(not(unix))]
pub fn max_open_fds() -> Option<u64> {
    None
}

/// Descriptors the pipeline may use: ~80% of `limit`.
pub fn usable_fds(limit: u64) -> usize {
    (limit as f64 * FD_LIMIT_FRACTION) as usize
}

/// `Some(usable)` when `read + write` workers could exhaust the descriptor budget.
pub fn fd_budget_exceeded(read: usize, write: usize, limit: Option<u64>) -> Option<usize> {
    let usable = usable_fds(limit?);
    let needed = read.saturating_add(write).saturating_mul(FDS_PER_WORKER);
    (needed > usable).then_some(usable)
}

/// Warn (budgets are left unchanged) when the read and write pools are too large for the FD limit.
pub fn warn_if_over_fd_limit(read: usize, write: usize) {
    if let Some(usable) = fd_budget_exceeded(read, write, max_open_fds()) {
        log::warn!(
            "read={} + write={} workers may need more than {} file descriptors (80% of the limit); \
             consider lowering the budgets or raising `ulimit -n`",
            read,
            write,
            usable
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_against_limit() {
        assert_eq!(fd_budget_exceeded(4, 4, Some(1024)), None);
        assert_eq!(fd_budget_exceeded(400, 200, Some(1024)), Some(819));
        assert_eq!(fd_budget_exceeded(10_000, 10_000, None), None);
    }
}
