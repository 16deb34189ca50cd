//! Progress bar utilities for displaying import status

use kdam::{Animation, Bar, BarExt};
use std::sync::{Arc, Mutex};

// Progress bar type alias
pub type ProgressBar = Arc<Mutex<Bar>>;

/// Configuration for creating a progress bar
pub struct ProgressBarConfig {
    pub total: usize,
    pub desc: &'static str,
    pub animation: Animation,
}

impl ProgressBarConfig {
    /// Create a new progress bar configuration
    pub fn new(total: usize, desc: &'static str, animation: Animation) -> Self {
        Self {
            total,
            desc,
            animation,
        }
    }
}

/// Create a progress bar with the given configuration
pub fn create_progress_bar(config: ProgressBarConfig) -> ProgressBar {
    Arc::new(Mutex::new(kdam::tqdm!(
        total = config.total,
        desc = config.desc,
        animation = config.animation,
        unit = " entries"
    )))
}

/// Update progress bar if available.
/// Uses try_lock so a contended bar skips the update instead of blocking.
pub fn update_progress_bar(pb: &ProgressBar, n: usize) {
    if let Ok(mut pb) = pb.try_lock() {
        let _ = pb.update(n);
    }
}

/// Move the bar to its final position and end the line.
pub fn finish_progress_bar(pb: &ProgressBar) {
    if let Ok(mut bar) = pb.lock() {
        let _ = bar.refresh();
        eprintln!();
    }
}

/// Optional bar: `Some` only when `enabled`.
pub fn setup_progress(enabled: bool, total: usize) -> Option<ProgressBar> {
    enabled.then(|| {
        create_progress_bar(ProgressBarConfig::new(
            total,
            "Importing",
            Animation::Classic,
        ))
    })
}
