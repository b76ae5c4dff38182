//! Rewrites reference tokens inside copied asset files.
//!
//! Rewriting is line based. A [`LineRewriter`] sees one line at a time,
//! without its terminator, and the surrounding machinery puts terminators back
//! exactly as they were. Files are only written when a line actually changed,
//! and writes go through [`Vfs::write_atomic`].

mod hard;
pub mod scanner;
mod safe;

pub use hard::HardRewriter;
pub use safe::{SafeRewriter, DEFAULT_NULL_REFERENCE, DEFAULT_SCRIPT_MARKER};

use std::{
    borrow::Cow,
    io,
    path::{Path, PathBuf},
};

use memofs::Vfs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    copy::stats::CopyStats,
    guid::split_line_ending,
    walk::{content_files, AssetFilter},
};

/// Transforms a single line of asset text.
pub trait LineRewriter {
    /// Returns the line unchanged as `Cow::Borrowed` when there was nothing to
    /// rewrite.
    fn rewrite_line<'a>(&self, line: &'a str, stats: &CopyStats) -> Cow<'a, str>;
}

/// What to do with the rest of the batch once a file fails to rewrite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RewriteErrorPolicy {
    #[default]
    Abort,
    Continue,
}

#[derive(Debug, Error)]
#[error("failed to rewrite {}", .path.display())]
pub struct RewriteFailure {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Rewritten,
    Unchanged,
    /// The file is not UTF-8 text and was left alone.
    SkippedBinary,
}

/// Result of rewriting every file under a set of roots.
#[derive(Debug, Default)]
pub struct RewriteSummary {
    pub rewritten: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub failures: Vec<RewriteFailure>,
    /// Set when a failure stopped the batch early.
    pub aborted: bool,
}

/// Applies `rewriter` to every line of `text`, keeping line endings and the
/// presence or absence of a final newline.
pub fn rewrite_text<'a, R: LineRewriter + ?Sized>(
    text: &'a str,
    rewriter: &R,
    stats: &CopyStats,
) -> Cow<'a, str> {
    let mut output: Option<String> = None;
    let mut consumed = 0;

    for piece in text.split_inclusive('\n') {
        let (line, ending) = split_line_ending(piece);
        let rewritten = rewriter.rewrite_line(line, stats);

        if let Some(buffer) = output.as_mut() {
            buffer.push_str(&rewritten);
            buffer.push_str(ending);
        } else if let Cow::Owned(new_line) = rewritten {
            let mut buffer = String::with_capacity(text.len());
            buffer.push_str(&text[..consumed]);
            buffer.push_str(&new_line);
            buffer.push_str(ending);
            output = Some(buffer);
        }

        consumed += piece.len();
    }

    match output {
        Some(buffer) => Cow::Owned(buffer),
        None => Cow::Borrowed(text),
    }
}

/// Rewrites one file in place.
pub fn rewrite_file<R: LineRewriter + ?Sized>(
    vfs: &Vfs,
    path: &Path,
    rewriter: &R,
    stats: &CopyStats,
) -> io::Result<FileOutcome> {
    let contents = vfs.read(path)?;
    stats.record_file_scanned();

    let Ok(text) = std::str::from_utf8(&contents) else {
        stats.record_binary_file(path);
        return Ok(FileOutcome::SkippedBinary);
    };

    match rewrite_text(text, rewriter, stats) {
        Cow::Borrowed(_) => Ok(FileOutcome::Unchanged),
        Cow::Owned(new_text) => {
            vfs.write_atomic(path, new_text)?;
            log::debug!("Rewrote {}", path.display());
            Ok(FileOutcome::Rewritten)
        }
    }
}

/// Rewrites every content file below `roots`, in path order.
///
/// Failing to enumerate the roots is an error. Failing to rewrite a single
/// file is recorded in the summary, and `policy` decides whether the
/// remaining files are still attempted.
pub fn rewrite_tree<P, R>(
    vfs: &Vfs,
    roots: &[P],
    filter: &AssetFilter,
    rewriter: &R,
    policy: RewriteErrorPolicy,
    stats: &CopyStats,
) -> io::Result<RewriteSummary>
where
    P: AsRef<Path>,
    R: LineRewriter + ?Sized,
{
    let files = content_files(vfs, roots, filter)?;
    let mut summary = RewriteSummary::default();

    for path in files {
        match rewrite_file(vfs, &path, rewriter, stats) {
            Ok(FileOutcome::Rewritten) => summary.rewritten.push(path),
            Ok(FileOutcome::Unchanged) => summary.unchanged.push(path),
            Ok(FileOutcome::SkippedBinary) => summary.skipped.push(path),
            Err(source) => {
                log::error!("Could not rewrite {}: {source}", path.display());
                summary.failures.push(RewriteFailure { path, source });

                if policy == RewriteErrorPolicy::Abort {
                    summary.aborted = true;
                    break;
                }
            }
        }
    }

    Ok(summary)
}
