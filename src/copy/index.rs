//! Builds the identifier tables for the sources and their copies, and joins
//! them into the old identifier to new identifier mapping.

use std::{
    collections::{btree_map::Entry, BTreeMap, HashMap},
    io,
    path::{Path, PathBuf},
};

use memofs::Vfs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    guid::Guid,
    host::AssetHost,
    walk::{content_files, AssetFilter},
};

use super::{collect::CopyPlan, stats::CopyStats};

/// What to do when two different paths on the same side of the copy report
/// the same identifier, or two copies map back to the same source path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DuplicatePolicy {
    /// Keep the path that sorts first, warn about the rest.
    #[default]
    FirstWins,
    /// Fail the run.
    Reject,
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error(
        "{} and {} share the identifier {guid}",
        .first.display(),
        .second.display()
    )]
    DuplicateIdentifier {
        guid: Guid,
        first: PathBuf,
        second: PathBuf,
    },

    #[error(
        "{} and {} were both copied from {}",
        .first.display(),
        .second.display(),
        .key.display()
    )]
    DuplicateKey {
        key: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("failed to enumerate copied assets")]
    Io(#[from] io::Error),
}

/// Identifier to path lookup for one side of the copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifierTable {
    by_guid: BTreeMap<Guid, PathBuf>,
    by_path: BTreeMap<PathBuf, Guid>,
}

impl IdentifierTable {
    /// Asks the host for the identifier of every file in `files`.
    ///
    /// `files` is expected to be deduplicated and sorted, which is what
    /// [`content_files`] produces; "first" in [`DuplicatePolicy::FirstWins`]
    /// means first in that order.
    pub fn from_host<H: AssetHost + ?Sized>(
        host: &H,
        files: &[PathBuf],
        policy: DuplicatePolicy,
        stats: &CopyStats,
    ) -> Result<Self, IndexError> {
        let mut table = Self::default();

        for path in files {
            let Some(guid) = host.identifier_for_path(path) else {
                stats.record_missing_identifier(path);
                continue;
            };

            match table.by_guid.entry(guid) {
                Entry::Vacant(entry) => {
                    table.by_path.insert(path.clone(), entry.key().clone());
                    entry.insert(path.clone());
                }
                Entry::Occupied(entry) => match policy {
                    DuplicatePolicy::FirstWins => {
                        log::warn!(
                            "{} has the same identifier as {}, ignoring it",
                            path.display(),
                            entry.get().display()
                        );
                    }
                    DuplicatePolicy::Reject => {
                        return Err(IndexError::DuplicateIdentifier {
                            guid: entry.key().clone(),
                            first: entry.get().clone(),
                            second: path.clone(),
                        });
                    }
                },
            }
        }

        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.by_guid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_guid.is_empty()
    }

    pub fn path_of(&self, guid: &str) -> Option<&Path> {
        self.by_guid.get(guid).map(PathBuf::as_path)
    }

    pub fn identifier_of(&self, path: &Path) -> Option<&Guid> {
        self.by_path.get(path)
    }

    /// Entries ordered by identifier.
    pub fn iter(&self) -> impl Iterator<Item = (&Guid, &Path)> {
        self.by_guid.iter().map(|(guid, path)| (guid, path.as_path()))
    }
}

/// One copied asset: where it came from and both of its identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    /// The source path the copy was made from.
    pub key: PathBuf,
    pub source: Guid,
    pub destination: Guid,
}

/// The old identifier to new identifier mapping, ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingTable {
    entries: Vec<MappingEntry>,
    by_source: HashMap<Guid, usize>,
}

impl MappingTable {
    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The new identifier for a source identifier, if that asset was copied.
    pub fn lookup(&self, source: &str) -> Option<&Guid> {
        self.by_source
            .get(source)
            .map(|&index| &self.entries[index].destination)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MappingEntry> {
        self.entries.iter()
    }
}

impl FromIterator<MappingEntry> for MappingTable {
    /// Sorts the entries by key. If a source identifier appears more than
    /// once, lookups use the entry with the smallest key. [`correlate`] never
    /// produces such a table.
    fn from_iter<I: IntoIterator<Item = MappingEntry>>(iter: I) -> Self {
        let mut entries: Vec<MappingEntry> = iter.into_iter().collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));

        let mut by_source = HashMap::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            by_source.entry(entry.source.clone()).or_insert(index);
        }

        Self { entries, by_source }
    }
}

/// Joins the destination table with the source table.
///
/// Each destination path is mapped back to the path it was copied from and
/// looked up in the source table. Files that exist on only one side get no
/// entry. Destinations are visited in path order, so when two of them map
/// back to the same key under [`DuplicatePolicy::FirstWins`], the one whose
/// path sorts first is kept.
pub fn correlate(
    sources: &IdentifierTable,
    destinations: &IdentifierTable,
    plan: &CopyPlan,
    policy: DuplicatePolicy,
) -> Result<MappingTable, IndexError> {
    let mut by_key: BTreeMap<PathBuf, (&Path, MappingEntry)> = BTreeMap::new();

    for (path, destination) in &destinations.by_path {
        let Some(key) = plan.logical_path(path) else {
            continue;
        };
        let Some(source) = sources.identifier_of(&key) else {
            continue;
        };

        match by_key.entry(key) {
            Entry::Vacant(entry) => {
                log::trace!("{} maps {} -> {}", entry.key().display(), source, destination);
                let mapped = MappingEntry {
                    key: entry.key().clone(),
                    source: source.clone(),
                    destination: destination.clone(),
                };
                entry.insert((path.as_path(), mapped));
            }
            Entry::Occupied(entry) => {
                let (first, _) = entry.get();
                match policy {
                    DuplicatePolicy::FirstWins => {
                        log::warn!(
                            "{} and {} were both copied from {}, ignoring the second",
                            first.display(),
                            path.display(),
                            entry.key().display()
                        );
                    }
                    DuplicatePolicy::Reject => {
                        return Err(IndexError::DuplicateKey {
                            key: entry.key().clone(),
                            first: first.to_path_buf(),
                            second: path.clone(),
                        });
                    }
                }
            }
        }
    }

    Ok(by_key.into_values().map(|(_, mapped)| mapped).collect())
}

/// Both identifier tables and the mapping derived from them.
#[derive(Debug, Clone, Default)]
pub struct IdentifierIndex {
    pub sources: IdentifierTable,
    pub destinations: IdentifierTable,
    pub mapping: MappingTable,
}

/// Scans the sources and destinations of `plan` and correlates them. Only
/// meaningful after the host has been committed and rescanned.
pub fn build_index<H: AssetHost + ?Sized>(
    vfs: &Vfs,
    host: &H,
    plan: &CopyPlan,
    filter: &AssetFilter,
    policy: DuplicatePolicy,
    stats: &CopyStats,
) -> Result<IdentifierIndex, IndexError> {
    let source_files = content_files(vfs, &plan.sources(), filter)?;
    let destination_files = content_files(vfs, &plan.destinations(), filter)?;

    let sources = IdentifierTable::from_host(host, &source_files, policy, stats)?;
    let destinations = IdentifierTable::from_host(host, &destination_files, policy, stats)?;
    let mapping = correlate(&sources, &destinations, plan, policy)?;

    log::debug!(
        "Indexed {} source and {} destination identifiers, {} mapped",
        sources.len(),
        destinations.len(),
        mapping.len()
    );

    Ok(IdentifierIndex {
        sources,
        destinations,
        mapping,
    })
}
