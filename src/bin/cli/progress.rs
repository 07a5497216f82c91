//! Progress bar rendering for CLI operations.

use indicatif::{ProgressBar, ProgressStyle};
use varc::ProgressReporter;

/// Per-entry progress bar for batch operations.
pub struct CliProgress {
    bar: ProgressBar,
    quiet: bool,
}

impl CliProgress {
    /// Creates a progress display; hidden entirely in quiet mode.
    pub fn new(quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new(0);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{bar:40}] {pos}/{len} {wide_msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=> "),
            );
            pb
        };
        Self { bar, quiet }
    }

    /// Finishes the bar and clears it from the terminal.
    pub fn finish(&self) {
        if !self.quiet {
            self.bar.finish_and_clear();
        }
    }
}

/// Shortens a path to at most `max_chars` characters, keeping the tail.
/// Counts characters rather than bytes so multibyte paths never split
/// mid-character.
fn truncate_front(path: &str, max_chars: usize) -> String {
    let count = path.chars().count();
    if count <= max_chars {
        return path.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let tail: String = path.chars().skip(count - keep).collect();
    format!("...{}", tail)
}

impl ProgressReporter for CliProgress {
    fn on_start(&mut self, total_entries: u64, _total_bytes: u64) {
        self.bar.set_length(total_entries);
    }

    fn on_entry(
        &mut self,
        current: u64,
        _total: u64,
        _bytes_done: u64,
        _bytes_total: u64,
        path: &str,
    ) {
        self.bar.set_position(current);
        self.bar.set_message(truncate_front(path, 40));
    }

    fn on_finish(&mut self) {
        self.bar.finish_and_clear();
    }
}
