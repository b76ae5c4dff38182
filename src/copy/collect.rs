//! Turns the host's selection into a list of source/destination pairs.

use std::{
    collections::HashSet,
    io,
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::host::AssetHost;

use super::naming::ClonedName;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    File,
    Directory,
}

/// One item to copy, with the destination computed by the naming transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyPair {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub kind: AssetKind,
    pub name: ClonedName,
}

impl CopyPair {
    pub fn new(source: PathBuf, kind: AssetKind, suffix: &str) -> Option<Self> {
        let name = ClonedName::new(&source, suffix, kind == AssetKind::Directory)?;
        Some(Self {
            destination: name.destination(),
            source,
            kind,
            name,
        })
    }
}

/// Index-aligned sources and destinations for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyPlan {
    pairs: Vec<CopyPair>,
}

impl CopyPlan {
    pub fn pairs(&self) -> &[CopyPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn sources(&self) -> Vec<&Path> {
        self.pairs.iter().map(|pair| pair.source.as_path()).collect()
    }

    pub fn destinations(&self) -> Vec<&Path> {
        self.pairs
            .iter()
            .map(|pair| pair.destination.as_path())
            .collect()
    }

    /// Maps a path inside one of the destinations back to the path it was
    /// copied from. When destinations are nested, the innermost one is used.
    pub fn logical_path(&self, destination_path: &Path) -> Option<PathBuf> {
        self.pairs
            .iter()
            .filter(|pair| destination_path.starts_with(&pair.destination))
            .max_by_key(|pair| pair.destination.components().count())
            .and_then(|pair| pair.name.to_source(destination_path))
    }
}

impl FromIterator<CopyPair> for CopyPlan {
    fn from_iter<I: IntoIterator<Item = CopyPair>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("cannot derive a destination name for {}", .path.display())]
    InvalidName { path: PathBuf },

    #[error("{} is not inside the asset folder", .path.display())]
    OutsideAssets { path: PathBuf },

    #[error("{} is inside {}, which is also selected", .path.display(), .parent.display())]
    NestedSelection { path: PathBuf, parent: PathBuf },

    #[error("failed to resolve the selection")]
    Io(#[from] io::Error),
}

/// Resolves the host's selection and computes where each item is copied to.
///
/// Selecting the same item twice copies it once; the first occurrence decides
/// its position in the plan. Items outside the host's assets, and items inside
/// another selected item, make the whole selection invalid.
pub fn collect_paths<H: AssetHost + ?Sized>(
    host: &H,
    suffix: &str,
) -> Result<CopyPlan, CollectError> {
    let selection = host.resolve_selection()?;
    let mut seen = HashSet::with_capacity(selection.len());
    let mut sources = Vec::with_capacity(selection.len());

    for source in selection {
        if !seen.insert(source.clone()) {
            log::debug!("{} was selected more than once", source.display());
            continue;
        }

        if !host.is_asset(&source) {
            return Err(CollectError::OutsideAssets { path: source });
        }

        sources.push(source);
    }

    if let Some((path, parent)) = find_nested(&sources) {
        return Err(CollectError::NestedSelection { path, parent });
    }

    let mut pairs = Vec::with_capacity(sources.len());

    for source in sources {
        let kind = if host.is_directory(&source)? {
            AssetKind::Directory
        } else {
            AssetKind::File
        };

        let pair = CopyPair::new(source.clone(), kind, suffix)
            .ok_or(CollectError::InvalidName { path: source })?;

        log::trace!(
            "Planned {} -> {}",
            pair.source.display(),
            pair.destination.display()
        );
        pairs.push(pair);
    }

    Ok(CopyPlan { pairs })
}

/// Finds a selected item that lives inside another selected item.
fn find_nested(sources: &[PathBuf]) -> Option<(PathBuf, PathBuf)> {
    sources.iter().find_map(|path| {
        sources
            .iter()
            .find(|parent| *parent != path && path.starts_with(parent))
            .map(|parent| (path.clone(), parent.clone()))
    })
}
