//! The copy pipeline.
//!
//! A run goes through the same stages in both modes:
//!
//! 1. [`collect_paths`] turns the host's selection into a [`CopyPlan`].
//! 2. [`clone_assets`] copies every pair, then the host is committed once so
//!    the copies get identifiers of their own.
//! 3. Hard mode only: [`build_index`] builds the identifier tables and the
//!    old identifier to new identifier mapping.
//! 4. Every content file in the copies is rewritten, remapping references in
//!    hard mode and severing them in safe mode.
//! 5. The host is committed again so it picks up the rewritten files.
//!
//! All state for a run lives in a [`CopySession`] and is dropped with it.

pub mod cloner;
pub mod collect;
pub mod index;
pub mod naming;
pub mod stats;

use std::{
    fmt, io,
    path::{Path, PathBuf},
};

use memofs::Vfs;
use thiserror::Error;

use crate::{
    host::AssetHost,
    rewrite::{
        rewrite_tree, HardRewriter, LineRewriter, RewriteErrorPolicy, RewriteFailure,
        RewriteSummary, SafeRewriter, DEFAULT_NULL_REFERENCE, DEFAULT_SCRIPT_MARKER,
    },
    walk::AssetFilter,
};

pub use self::cloner::{clone_assets, CopyError};
pub use self::collect::{collect_paths, AssetKind, CollectError, CopyPair, CopyPlan};
pub use self::index::{
    build_index, correlate, DuplicatePolicy, IdentifierIndex, IdentifierTable, IndexError,
    MappingEntry, MappingTable,
};
pub use self::naming::{ClonedName, DEFAULT_CLONE_SUFFIX};
pub use self::stats::CopyStats;

/// Everything that can be tuned about a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyOptions {
    pub suffix: String,
    pub filter: AssetFilter,
    pub script_marker: String,
    pub null_reference: String,
    pub on_rewrite_error: RewriteErrorPolicy,
    pub duplicate_identifiers: DuplicatePolicy,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            suffix: DEFAULT_CLONE_SUFFIX.to_owned(),
            filter: AssetFilter::default(),
            script_marker: DEFAULT_SCRIPT_MARKER.to_owned(),
            null_reference: DEFAULT_NULL_REFERENCE.to_owned(),
            on_rewrite_error: RewriteErrorPolicy::default(),
            duplicate_identifiers: DuplicatePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyMode {
    /// References between copied assets are pointed at the copies.
    Hard,
    /// Every reference in the copies is replaced with a null reference.
    Safe,
}

impl fmt::Display for CopyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CopyMode::Hard => write!(f, "hard copy"),
            CopyMode::Safe => write!(f, "safe copy"),
        }
    }
}

#[derive(Debug, Error)]
pub enum CloneError {
    #[error(transparent)]
    Collect {
        #[from]
        source: CollectError,
    },

    #[error(transparent)]
    Copy {
        #[from]
        source: CopyError,
    },

    #[error("failed to commit changes to the asset host")]
    Commit {
        copied: Vec<CopyPair>,
        #[source]
        source: io::Error,
    },

    #[error("failed to map the copies back to their sources")]
    Index {
        copied: Vec<CopyPair>,
        #[source]
        source: IndexError,
    },

    #[error("failed to enumerate the copied files")]
    Scan {
        copied: Vec<CopyPair>,
        #[source]
        source: io::Error,
    },
}

impl CloneError {
    /// Pairs whose copies were already made when the run failed. They are
    /// left on disk.
    pub fn copied(&self) -> &[CopyPair] {
        match self {
            CloneError::Collect { .. } => &[],
            CloneError::Copy { source } => source.completed.as_slice(),
            CloneError::Commit { copied, .. }
            | CloneError::Index { copied, .. }
            | CloneError::Scan { copied, .. } => copied.as_slice(),
        }
    }
}

/// A failure after the copies were made, before it is paired with them.
enum Unfinished {
    Commit(io::Error),
    Index(IndexError),
    Scan(io::Error),
}

impl Unfinished {
    fn with_copied(self, copied: Vec<CopyPair>) -> CloneError {
        match self {
            Unfinished::Commit(source) => CloneError::Commit { copied, source },
            Unfinished::Index(source) => CloneError::Index { copied, source },
            Unfinished::Scan(source) => CloneError::Scan { copied, source },
        }
    }
}

/// What a run did.
#[derive(Debug)]
pub struct CopyReport {
    pub mode: CopyMode,
    pub copied: Vec<CopyPair>,
    /// Empty in safe mode.
    pub mapping: MappingTable,
    pub rewritten: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub failures: Vec<RewriteFailure>,
    pub aborted: bool,
    pub stats: CopyStats,
}

impl CopyReport {
    fn new(mode: CopyMode, copied: Vec<CopyPair>, mapping: MappingTable, stats: CopyStats) -> Self {
        Self {
            mode,
            copied,
            mapping,
            rewritten: Vec::new(),
            unchanged: Vec::new(),
            skipped: Vec::new(),
            failures: Vec::new(),
            aborted: false,
            stats,
        }
    }

    fn with_summary(mut self, summary: RewriteSummary) -> Self {
        self.rewritten = summary.rewritten;
        self.unchanged = summary.unchanged;
        self.skipped = summary.skipped;
        self.failures = summary.failures;
        self.aborted = summary.aborted;
        self
    }

    /// True when every copied file was processed without a failure.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && !self.aborted
    }

    pub fn is_empty(&self) -> bool {
        self.copied.is_empty()
    }
}

/// The state of one copy run, threaded through every stage.
pub struct CopySession<'a, H: AssetHost + ?Sized> {
    vfs: &'a Vfs,
    host: &'a mut H,
    options: &'a CopyOptions,
    stats: CopyStats,
}

impl<'a, H: AssetHost + ?Sized> CopySession<'a, H> {
    pub fn new(vfs: &'a Vfs, host: &'a mut H, options: &'a CopyOptions) -> Self {
        Self {
            vfs,
            host,
            options,
            stats: CopyStats::new(),
        }
    }

    pub fn run(self, mode: CopyMode) -> Result<CopyReport, CloneError> {
        let Self {
            vfs,
            host,
            options,
            stats,
        } = self;

        let plan = collect_paths(&*host, &options.suffix)?;
        if plan.is_empty() {
            log::info!("Nothing is selected, there is nothing to copy");
            return Ok(CopyReport::new(mode, Vec::new(), MappingTable::default(), stats));
        }

        log::info!("Starting {mode} of {} item(s)", plan.len());

        let copied = clone_assets(&mut *host, &plan)?;

        match finish(vfs, &mut *host, &plan, options, mode, &stats) {
            Ok((mapping, summary)) => {
                stats.log_summary();
                Ok(CopyReport::new(mode, copied, mapping, stats).with_summary(summary))
            }
            Err(failure) => {
                log::error!(
                    "{} item(s) were copied before the run failed",
                    copied.len()
                );
                Err(failure.with_copied(copied))
            }
        }
    }
}

/// Everything after the physical copies: identifiers, mapping and rewrite.
fn finish<H: AssetHost + ?Sized>(
    vfs: &Vfs,
    host: &mut H,
    plan: &CopyPlan,
    options: &CopyOptions,
    mode: CopyMode,
    stats: &CopyStats,
) -> Result<(MappingTable, RewriteSummary), Unfinished> {
    host.commit_and_rescan().map_err(Unfinished::Commit)?;

    let destinations = plan.destinations();

    let (mapping, summary) = match mode {
        CopyMode::Hard => {
            let index = build_index(
                vfs,
                &*host,
                plan,
                &options.filter,
                options.duplicate_identifiers,
                stats,
            )
            .map_err(Unfinished::Index)?;

            let summary = rewrite(
                vfs,
                &destinations,
                options,
                &HardRewriter::new(&index.mapping),
                stats,
            )?;

            (index.mapping, summary)
        }
        CopyMode::Safe => {
            let rewriter = SafeRewriter::new(&options.script_marker, &options.null_reference);
            let summary = rewrite(vfs, &destinations, options, &rewriter, stats)?;

            (MappingTable::default(), summary)
        }
    };

    host.commit_and_rescan().map_err(Unfinished::Commit)?;

    Ok((mapping, summary))
}

fn rewrite<R: LineRewriter + ?Sized>(
    vfs: &Vfs,
    destinations: &[&Path],
    options: &CopyOptions,
    rewriter: &R,
    stats: &CopyStats,
) -> Result<RewriteSummary, Unfinished> {
    rewrite_tree(
        vfs,
        destinations,
        &options.filter,
        rewriter,
        options.on_rewrite_error,
        stats,
    )
    .map_err(Unfinished::Scan)
}

/// Copies the selected folders and points references between the copied
/// assets at the copies. References to anything outside the selection are
/// kept.
pub fn hard_copy<H: AssetHost + ?Sized>(
    vfs: &Vfs,
    host: &mut H,
    options: &CopyOptions,
) -> Result<CopyReport, CloneError> {
    CopySession::new(vfs, host, options).run(CopyMode::Hard)
}

/// Copies the selected files and severs every reference inside the copies,
/// except script bindings.
pub fn safe_copy<H: AssetHost + ?Sized>(
    vfs: &Vfs,
    host: &mut H,
    options: &CopyOptions,
) -> Result<CopyReport, CloneError> {
    CopySession::new(vfs, host, options).run(CopyMode::Safe)
}
