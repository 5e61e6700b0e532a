//! Progress bar for settled inputs (verbose CLI runs).

use kdam::{Animation, Bar, BarExt};
use std::sync::{Arc, Mutex};

pub type ProgressBar = Arc<Mutex<Bar>>;

/// Configuration for creating a progress bar
pub struct ProgressBarConfig {
    pub total: usize,
    pub desc: &'static str,
    pub animation: Animation,
}

impl ProgressBarConfig {
    pub fn new(total: usize, desc: &'static str, animation: Animation) -> Self {
        Self {
            total,
            desc,
            animation,
        }
    }
}

pub fn create_progress_bar(config: ProgressBarConfig) -> ProgressBar {
    Arc::new(Mutex::new(kdam::tqdm!(
        total = config.total,
        desc = config.desc,
        animation = config.animation,
        unit = " files"
    )))
}

/// Uses try_lock so a stage worker never blocks on the bar; a skipped update is
/// caught up by the final refresh.
pub fn update_progress_bar(pb: &ProgressBar, n: usize) {
    if let Ok(mut pb) = pb.try_lock() {
        let _ = pb.update(n);
    }
}

/// Set the bar to `done` and redraw (after the run, so skipped updates are not lost).
pub fn finish_progress_bar(pb: &ProgressBar, done: usize) {
    if let Ok(mut bar) = pb.lock() {
        let _ = bar.update_to(done);
        let _ = bar.refresh();
        eprintln!();
    }
}

/// Callback for [`Pipeline::with_progress`](crate::pipeline::Pipeline::with_progress).
pub fn progress_callback(
    bar: &Option<ProgressBar>,
) -> Option<impl Fn(usize) + Send + Sync + 'static> {
    bar.as_ref().map(|bar| {
        let bar = Arc::clone(bar);
        move |n: usize| update_progress_bar(&bar, n)
    })
}
