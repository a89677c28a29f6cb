//! Terminal progress bar for render runs.

use indicatif::{ProgressBar, ProgressStyle};
use tilepyramid::progress::ProgressSink;

/// Progress sink drawing an `indicatif` bar.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    /// Creates a hidden-length bar; the length is set when the run starts.
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("[{bar:40.cyan/blue}] {pos}/{len} tiles ({percent}%) {eta} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("▉▊▋▌▍▎▏ "),
        );
        Self { bar }
    }
}

impl ProgressSink for BarProgress {
    fn set_total(&self, total: u64) {
        self.bar.set_length(total);
        self.bar.set_message("Rendering");
    }

    fn add_progress(&self, tiles: u64) {
        self.bar.inc(tiles);
    }

    fn finish(&self) {
        self.bar.finish_with_message("Done");
    }
}
