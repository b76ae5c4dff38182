//! Enumerates the content files of asset trees.

use std::{
    collections::BTreeSet,
    io,
    path::{Path, PathBuf},
};

use memofs::Vfs;

pub const DEFAULT_META_EXTENSION: &str = "meta";
pub const DEFAULT_HIDDEN_PREFIX: &str = ".";

/// Decides which paths inside an asset tree are content the host tracks.
///
/// Sidecar metadata files and hidden files are never content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFilter {
    meta_extension: String,
    hidden_prefix: String,
}

impl Default for AssetFilter {
    fn default() -> Self {
        Self::new(DEFAULT_META_EXTENSION, DEFAULT_HIDDEN_PREFIX)
    }
}

impl AssetFilter {
    pub fn new(meta_extension: impl Into<String>, hidden_prefix: impl Into<String>) -> Self {
        let meta_extension = meta_extension.into();
        Self {
            meta_extension: meta_extension.trim_start_matches('.').to_owned(),
            hidden_prefix: hidden_prefix.into(),
        }
    }

    pub fn meta_extension(&self) -> &str {
        &self.meta_extension
    }

    /// Returns whether `path` is a sidecar metadata file.
    pub fn is_sidecar(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == self.meta_extension)
    }

    /// Returns whether the last component of `path` marks it as hidden.
    pub fn is_hidden(&self, path: &Path) -> bool {
        if self.hidden_prefix.is_empty() {
            return false;
        }

        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(&self.hidden_prefix))
    }

    pub fn is_content(&self, path: &Path) -> bool {
        !self.is_sidecar(path) && !self.is_hidden(path)
    }

    /// The sidecar file that belongs to `asset`, e.g. `f.asset.meta` for
    /// `f.asset`.
    pub fn sidecar_path(&self, asset: &Path) -> PathBuf {
        let mut name = asset.as_os_str().to_owned();
        name.push(".");
        name.push(&self.meta_extension);
        PathBuf::from(name)
    }
}

/// Collects every content file below `roots`, recursing into directories.
///
/// A root that is itself a file contributes only itself. Hidden directories
/// are not descended into. The result is deduplicated and sorted, so the same
/// tree always produces the same sequence.
pub fn content_files<P: AsRef<Path>>(
    vfs: &Vfs,
    roots: &[P],
    filter: &AssetFilter,
) -> io::Result<Vec<PathBuf>> {
    let mut found = BTreeSet::new();

    for root in roots {
        collect(vfs, root.as_ref(), filter, &mut found)?;
    }

    Ok(found.into_iter().collect())
}

fn collect(
    vfs: &Vfs,
    path: &Path,
    filter: &AssetFilter,
    found: &mut BTreeSet<PathBuf>,
) -> io::Result<()> {
    let metadata = vfs.metadata(path)?;

    if metadata.is_file() {
        if filter.is_content(path) {
            found.insert(path.to_path_buf());
        }
        return Ok(());
    }

    for entry in vfs.read_dir(path)? {
        let entry = entry?;
        let child = entry.path();

        if filter.is_hidden(child) {
            log::trace!("Skipping hidden path {}", child.display());
            continue;
        }

        collect(vfs, child, filter, found)?;
    }

    Ok(())
}
