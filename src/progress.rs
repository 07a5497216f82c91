//! Progress reporting for batch archive operations.
//!
//! Batch operations (`add_files`, `extract_all`, `verify`) report progress
//! once per processed entry. Callbacks are synchronous and fire on whatever
//! thread runs the operation; the library itself never creates threads.
//!
//! # Example
//!
//! ```rust,ignore
//! use varc::progress::progress_fn;
//!
//! let mut progress = progress_fn(|current, total, _, _, path| {
//!     println!("[{}/{}] {}", current, total, path);
//! });
//! archive.extract_all_with_progress("./out", None, &options, &mut progress)?;
//! ```

/// Progress reporting trait for batch archive operations.
///
/// All methods have no-op defaults, so implementors only override what they
/// display.
pub trait ProgressReporter {
    /// Called once before a batch starts, with the entry count and the
    /// total number of bytes the batch will process.
    fn on_start(&mut self, total_entries: u64, total_bytes: u64) {
        let _ = (total_entries, total_bytes);
    }

    /// Called after each processed entry.
    ///
    /// `current` is the 1-based index of the entry just processed,
    /// `bytes_done`/`bytes_total` track cumulative payload bytes, and
    /// `path` names the entry.
    fn on_entry(
        &mut self,
        current: u64,
        total: u64,
        bytes_done: u64,
        bytes_total: u64,
        path: &str,
    ) {
        let _ = (current, total, bytes_done, bytes_total, path);
    }

    /// Called once when the batch completes, successfully or not.
    fn on_finish(&mut self) {}
}

/// A reporter that ignores all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {}

/// Wraps a closure as a [`ProgressReporter`].
///
/// The closure receives `(current, total, bytes_done, bytes_total, path)`
/// per processed entry.
pub fn progress_fn<F>(f: F) -> FnProgress<F>
where
    F: FnMut(u64, u64, u64, u64, &str),
{
    FnProgress { f }
}

/// Adapter returned by [`progress_fn`].
pub struct FnProgress<F> {
    f: F,
}

impl<F> ProgressReporter for FnProgress<F>
where
    F: FnMut(u64, u64, u64, u64, &str),
{
    fn on_entry(
        &mut self,
        current: u64,
        total: u64,
        bytes_done: u64,
        bytes_total: u64,
        path: &str,
    ) {
        (self.f)(current, total, bytes_done, bytes_total, path);
    }
}
