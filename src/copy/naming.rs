//! The naming transform that turns a source path into its clone's path.
//!
//! The suffix is inserted into the last path component:
//! - files get it before their extension: `f.asset` -> `f (Clone).asset`
//! - directories get it at the end of their name: `A` -> `A (Clone)`
//!
//! Every [`ClonedName`] remembers exactly where the suffix went, so mapping a
//! path inside the clone back to the source never has to search for the
//! suffix text. A source tree that already contains the suffix in some of its
//! names therefore round-trips without ambiguity.

use std::path::{Path, PathBuf};

pub const DEFAULT_CLONE_SUFFIX: &str = " (Clone)";

/// A destination path together with the position of the inserted suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClonedName {
    parent: PathBuf,
    /// File name of the destination, suffix included.
    name: String,
    /// Byte offset in `name` where the suffix starts.
    insertion: usize,
    suffix_len: usize,
}

impl ClonedName {
    /// Applies the naming transform to `source`.
    ///
    /// Returns `None` if `source` has no final component or that component is
    /// not valid UTF-8.
    pub fn new(source: &Path, suffix: &str, is_dir: bool) -> Option<Self> {
        let name = source.file_name()?.to_str()?;
        let parent = source.parent().unwrap_or(Path::new("")).to_path_buf();

        let insertion = if is_dir {
            name.len()
        } else {
            stem_len(name)
        };

        let mut cloned = String::with_capacity(name.len() + suffix.len());
        cloned.push_str(&name[..insertion]);
        cloned.push_str(suffix);
        cloned.push_str(&name[insertion..]);

        Some(Self {
            parent,
            name: cloned,
            insertion,
            suffix_len: suffix.len(),
        })
    }

    /// The full destination path.
    pub fn destination(&self) -> PathBuf {
        self.parent.join(&self.name)
    }

    /// The destination's file name, suffix included.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The inserted suffix.
    pub fn suffix(&self) -> &str {
        &self.name[self.insertion..self.insertion + self.suffix_len]
    }

    /// The source's file name, recovered by cutting the suffix back out.
    pub fn source_name(&self) -> String {
        let mut original = String::with_capacity(self.name.len() - self.suffix_len);
        original.push_str(&self.name[..self.insertion]);
        original.push_str(&self.name[self.insertion + self.suffix_len..]);
        original
    }

    /// The source path this name was derived from.
    pub fn source(&self) -> PathBuf {
        self.parent.join(self.source_name())
    }

    /// Maps a path at or below the destination back to the corresponding path
    /// at or below the source. Paths outside the destination yield `None`.
    pub fn to_source(&self, path: &Path) -> Option<PathBuf> {
        let relative = path.strip_prefix(self.destination()).ok()?;

        if relative.as_os_str().is_empty() {
            Some(self.source())
        } else {
            Some(self.source().join(relative))
        }
    }
}

/// Length of the part of `name` before its extension, following the same rule
/// as `Path::file_stem`: the last `.` splits, unless it is the first
/// character.
fn stem_len(name: &str) -> usize {
    match name.rfind('.') {
        Some(0) | None => name.len(),
        Some(dot) => dot,
    }
}
