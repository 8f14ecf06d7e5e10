use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::info;
use std::time::Instant;

use crate::types::RunSummary;

/// Running counts for a batch operation, optionally drawn as a progress bar
pub struct ProgressTracker {
    operation: &'static str,
    bar: ProgressBar,
    summary: RunSummary,
    start_time: Instant,
}

impl ProgressTracker {
    /// Create a tracker for `total` items; the bar is hidden unless `visible`
    pub fn new(operation: &'static str, total: usize, visible: bool) -> Self {
        let bar = ProgressBar::new(total as u64);
        if visible {
            if let Ok(style) =
                ProgressStyle::default_bar().template("{wide_bar} {pos}/{len} ({percent}%) | {msg}")
            {
                bar.set_style(style.progress_chars("█▓▒░ "));
            }
        } else {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        }
        bar.set_message(operation);

        Self {
            operation,
            bar,
            summary: RunSummary::default(),
            start_time: Instant::now(),
        }
    }

    pub fn updated(&mut self) {
        self.summary.updated += 1;
        self.advance();
    }

    pub fn skipped(&mut self) {
        self.summary.skipped += 1;
        self.advance();
    }

    pub fn failed(&mut self) {
        self.summary.failed += 1;
        self.advance();
    }

    fn advance(&mut self) {
        self.summary.processed += 1;
        self.bar.inc(1);
        self.bar.set_message(format!(
            "{} | {} updated, {} skipped, {} failed",
            self.operation, self.summary.updated, self.summary.skipped, self.summary.failed
        ));
    }

    /// Close the bar and log the final summary
    pub fn finish(self) -> RunSummary {
        self.bar.finish_and_clear();
        info!(
            "{} complete in {:.1}s: {}",
            self.operation,
            self.start_time.elapsed().as_secs_f64(),
            self.summary
        );
        self.summary
    }
}
