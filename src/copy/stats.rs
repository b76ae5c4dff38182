//! Counters collected while rewriting copied assets.
//!
//! Each stage records what it did here as it goes. At the end of a run
//! [`CopyStats::log_summary`] prints one line per non-zero counter.

use std::{
    path::Path,
    sync::atomic::{AtomicUsize, Ordering},
};

/// Statistics for one copy run.
///
/// The pipeline is single-threaded, but the counters only need `&self`, so
/// the stats can be shared between the rewriter and the index builder.
#[derive(Debug, Default)]
pub struct CopyStats {
    files_scanned: AtomicUsize,
    tokens_remapped: AtomicUsize,
    tokens_left: AtomicUsize,
    blocks_severed: AtomicUsize,
    script_lines_skipped: AtomicUsize,
    binary_files_skipped: AtomicUsize,
    files_without_identifier: AtomicUsize,
}

impl CopyStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_file_scanned(&self) {
        self.files_scanned.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a reference token whose identifier was swapped for the copy's.
    pub fn record_remapped(&self, count: usize) {
        self.tokens_remapped.fetch_add(count, Ordering::Relaxed);
    }

    /// Records reference tokens that point outside the copied set.
    pub fn record_left_unchanged(&self, count: usize) {
        self.tokens_left.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_severed(&self, count: usize) {
        self.blocks_severed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_script_line(&self) {
        self.script_lines_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_binary_file(&self, path: &Path) {
        self.binary_files_skipped.fetch_add(1, Ordering::Relaxed);

        if log::log_enabled!(log::Level::Debug) {
            log::debug!("Skipping non-text file {}", path.display());
        }
    }

    pub fn record_missing_identifier(&self, path: &Path) {
        self.files_without_identifier.fetch_add(1, Ordering::Relaxed);
        log::warn!("No identifier known for {}, skipping it", path.display());
    }

    pub fn files_scanned(&self) -> usize {
        self.files_scanned.load(Ordering::Relaxed)
    }

    pub fn tokens_remapped(&self) -> usize {
        self.tokens_remapped.load(Ordering::Relaxed)
    }

    pub fn tokens_left(&self) -> usize {
        self.tokens_left.load(Ordering::Relaxed)
    }

    pub fn blocks_severed(&self) -> usize {
        self.blocks_severed.load(Ordering::Relaxed)
    }

    pub fn script_lines_skipped(&self) -> usize {
        self.script_lines_skipped.load(Ordering::Relaxed)
    }

    pub fn binary_files_skipped(&self) -> usize {
        self.binary_files_skipped.load(Ordering::Relaxed)
    }

    pub fn files_without_identifier(&self) -> usize {
        self.files_without_identifier.load(Ordering::Relaxed)
    }

    /// Logs a summary of everything that was counted.
    pub fn log_summary(&self) {
        let scanned = self.files_scanned();
        let remapped = self.tokens_remapped();
        let left = self.tokens_left();
        let severed = self.blocks_severed();
        let script = self.script_lines_skipped();
        let binary = self.binary_files_skipped();
        let missing = self.files_without_identifier();

        log::info!("Scanned {scanned} file(s)");

        if remapped > 0 || left > 0 {
            log::info!(
                "Remapped {remapped} reference(s), left {left} pointing outside the copy"
            );
        }

        if severed > 0 {
            log::info!("Severed {severed} reference(s)");
        }

        if script > 0 {
            log::info!("Kept {script} script reference line(s) as they were");
        }

        if binary > 0 {
            log::info!("Skipped {binary} non-text file(s)");
        }

        if missing > 0 {
            log::warn!(
                "{missing} file(s) had no identifier and were left out of the mapping. \
                 Use --verbose to see which."
            );
        }
    }
}
