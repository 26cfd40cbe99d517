//! Progress display for batch operations over many files

use crate::io::configuration::PROGRESS_BAR_WIDTH;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::LazyLock;

static BATCH_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template(&format!(
            "[{{elapsed_precise}}] {{msg}} [{{bar:{PROGRESS_BAR_WIDTH}.cyan/blue}}] {{pos}}/{{len}}"
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

/// Single progress bar shared by the workers of a batch
///
/// `advance` may be called from any thread.
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a visible progress bar for `total` items
    pub fn new(total: usize, label: &str) -> Self {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(BATCH_STYLE.clone());
        bar.set_message(label.to_string());
        Self { bar }
    }

    /// Create a progress tracker that never draws
    pub fn hidden(total: usize) -> Self {
        let bar = ProgressBar::hidden();
        bar.set_length(total as u64);
        Self { bar }
    }

    /// Record one finished item
    pub fn advance(&self) {
        self.bar.inc(1);
    }

    /// Number of finished items
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Total number of items
    pub fn length(&self) -> Option<u64> {
        self.bar.length()
    }

    /// Stop the bar, leaving `message` in place of the label
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}
