//! The asset host: the thing that owns the asset store and hands out
//! identifiers.
//!
//! The copy pipeline only ever talks to the host through [`AssetHost`].
//! [`MetaFileHost`] implements it for a project on a [`Vfs`] where every
//! asset `x` has a sidecar `x.meta` carrying a `guid:` line.

use std::{
    collections::{HashMap, HashSet},
    io,
    path::{Path, PathBuf},
};

use memofs::{IoResultExt, Vfs};

use crate::{
    guid::{parse_sidecar_guid, replace_sidecar_guid, Guid},
    walk::AssetFilter,
};

/// The directory below the project that holds the assets.
pub const DEFAULT_ASSET_DIR: &str = "Assets";

const NEW_SIDECAR_HEADER: &str = "fileFormatVersion: 2\n";

/// Everything the copy pipeline needs from the surrounding asset host.
pub trait AssetHost {
    /// The paths currently selected for copying, resolved to canonical form.
    fn resolve_selection(&self) -> io::Result<Vec<PathBuf>>;

    fn is_directory(&self, path: &Path) -> io::Result<bool>;

    /// Whether `path` is an asset this host tracks. The root of the asset
    /// store is not an asset itself.
    fn is_asset(&self, path: &Path) -> bool;

    /// Copies a file or a whole directory tree, sidecars included.
    fn copy(&mut self, from: &Path, to: &Path) -> io::Result<()>;

    /// Flushes pending changes and rebuilds the path to identifier index.
    /// Freshly copied assets only receive their own identifiers here.
    fn commit_and_rescan(&mut self) -> io::Result<()>;

    fn identifier_for_path(&self, path: &Path) -> Option<Guid>;
}

/// An [`AssetHost`] backed by sidecar metadata files on a [`Vfs`].
///
/// Everything below the asset directory is an asset; the asset directory
/// itself is not. Selections are resolved relative to the project directory.
///
/// On every rescan, assets without a sidecar, and copied assets whose sidecar
/// still carries an identifier already owned by another asset, are given a
/// newly generated identifier which is written back to their sidecar.
pub struct MetaFileHost<'a> {
    vfs: &'a Vfs,
    project_dir: PathBuf,
    asset_root: PathBuf,
    filter: AssetFilter,
    selection: Vec<PathBuf>,
    identifiers: HashMap<PathBuf, Guid>,
    /// Destinations copied since the last commit.
    pending: Vec<PathBuf>,
    generator: Box<dyn FnMut() -> Guid + 'a>,
}

impl<'a> MetaFileHost<'a> {
    /// Opens the project in `project_dir` whose assets live in `asset_dir`,
    /// and indexes the identifiers that are already on disk. Nothing is
    /// written until the first commit.
    pub fn new(
        vfs: &'a Vfs,
        project_dir: &Path,
        asset_dir: impl AsRef<Path>,
        filter: AssetFilter,
    ) -> io::Result<Self> {
        let project_dir = vfs.canonicalize(project_dir)?;
        let asset_root = vfs.canonicalize(project_dir.join(asset_dir))?;

        let mut host = Self {
            vfs,
            project_dir,
            asset_root,
            filter,
            selection: Vec::new(),
            identifiers: HashMap::new(),
            pending: Vec::new(),
            generator: Box::new(Guid::generate),
        };

        host.identifiers = host.read_identifiers()?;
        log::debug!(
            "Indexed {} asset identifiers under {}",
            host.identifiers.len(),
            host.asset_root.display()
        );

        Ok(host)
    }

    /// Sets the paths that [`AssetHost::resolve_selection`] reports. Relative
    /// paths are taken relative to the project directory.
    pub fn with_selection<I, P>(mut self, selection: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.selection = selection.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the source of new identifiers. Useful for predictable output.
    pub fn with_generator(mut self, generator: impl FnMut() -> Guid + 'a) -> Self {
        self.generator = Box::new(generator);
        self
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn asset_root(&self) -> &Path {
        &self.asset_root
    }

    /// Every asset below the asset root, in a stable order.
    fn assets(&self) -> io::Result<Vec<PathBuf>> {
        let mut assets = Vec::new();
        self.collect_assets(&self.asset_root, &mut assets)?;
        Ok(assets)
    }

    fn collect_assets(&self, dir: &Path, assets: &mut Vec<PathBuf>) -> io::Result<()> {
        for entry in self.vfs.read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();

            if !self.filter.is_content(path) {
                continue;
            }

            assets.push(path.to_path_buf());

            if self.vfs.metadata(path)?.is_dir() {
                self.collect_assets(path, assets)?;
            }
        }

        Ok(())
    }

    fn sidecar_guid(&self, asset: &Path) -> io::Result<Option<Guid>> {
        let sidecar = self.filter.sidecar_path(asset);

        match self.vfs.read(&sidecar).with_not_found()? {
            Some(contents) => Ok(parse_sidecar_guid(&String::from_utf8_lossy(&contents))),
            None => Ok(None),
        }
    }

    fn read_identifiers(&self) -> io::Result<HashMap<PathBuf, Guid>> {
        let mut identifiers = HashMap::new();

        for asset in self.assets()? {
            if let Some(guid) = self.sidecar_guid(&asset)? {
                identifiers.insert(asset, guid);
            }
        }

        Ok(identifiers)
    }

    fn is_pending(&self, path: &Path) -> bool {
        self.pending.iter().any(|root| path.starts_with(root))
    }

    fn write_sidecar(&self, asset: &Path, guid: &Guid) -> io::Result<()> {
        let sidecar = self.filter.sidecar_path(asset);

        let contents = match self.vfs.read(&sidecar).with_not_found()? {
            Some(existing) => replace_sidecar_guid(&String::from_utf8_lossy(&existing), guid),
            None => replace_sidecar_guid(NEW_SIDECAR_HEADER, guid),
        };

        self.vfs.write_atomic(&sidecar, contents)
    }

    fn copy_recursive(&self, from: &Path, to: &Path) -> io::Result<()> {
        if self.vfs.metadata(from)?.is_dir() {
            self.vfs.create_dir(to)?;

            for entry in self.vfs.read_dir(from)? {
                let entry = entry?;
                let child = entry.path();
                let name = child.file_name().ok_or_else(|| {
                    io::Error::other(format!("{} has no file name", child.display()))
                })?;

                self.copy_recursive(child, &to.join(name))?;
            }
        } else {
            let contents = self.vfs.read(from)?;
            self.vfs.write(to, contents.as_slice())?;
        }

        Ok(())
    }
}

impl AssetHost for MetaFileHost<'_> {
    fn resolve_selection(&self) -> io::Result<Vec<PathBuf>> {
        self.selection
            .iter()
            .map(|path| {
                let path = if path.is_absolute() {
                    path.clone()
                } else {
                    self.project_dir.join(path)
                };
                self.vfs.canonicalize(path)
            })
            .collect()
    }

    fn is_directory(&self, path: &Path) -> io::Result<bool> {
        Ok(self.vfs.metadata(path)?.is_dir())
    }

    fn is_asset(&self, path: &Path) -> bool {
        path != self.asset_root && path.starts_with(&self.asset_root)
    }

    fn copy(&mut self, from: &Path, to: &Path) -> io::Result<()> {
        if self.vfs.exists(to)? {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", to.display()),
            ));
        }

        log::debug!("Copying {} to {}", from.display(), to.display());
        self.copy_recursive(from, to)?;

        let from_sidecar = self.filter.sidecar_path(from);
        let to_sidecar = self.filter.sidecar_path(to);
        if self.vfs.exists(&from_sidecar)? && !self.vfs.exists(&to_sidecar)? {
            let contents = self.vfs.read(&from_sidecar)?;
            self.vfs.write(&to_sidecar, contents.as_slice())?;
        }

        self.pending.push(to.to_path_buf());
        Ok(())
    }

    fn commit_and_rescan(&mut self) -> io::Result<()> {
        let assets = self.assets()?;

        // Assets that existed before the copy claim their identifiers first,
        // so a duplicated sidecar always loses to its original.
        let (copied, existing): (Vec<_>, Vec<_>) =
            assets.into_iter().partition(|path| self.is_pending(path));

        let mut claimed = HashSet::new();
        let mut identifiers = HashMap::new();
        let mut assigned = 0;

        for asset in existing.into_iter().chain(copied) {
            let current = self.sidecar_guid(&asset)?;

            let guid = match current {
                Some(guid) if claimed.insert(guid.clone()) => guid,
                previous => {
                    let fresh = loop {
                        let candidate = (self.generator)();
                        if claimed.insert(candidate.clone()) {
                            break candidate;
                        }
                    };

                    match &previous {
                        Some(old) => log::debug!(
                            "Reassigning {} from {} to {}",
                            asset.display(),
                            old,
                            fresh
                        ),
                        None => log::debug!("Assigning {} to {}", fresh, asset.display()),
                    }

                    self.write_sidecar(&asset, &fresh)?;
                    assigned += 1;
                    fresh
                }
            };

            identifiers.insert(asset, guid);
        }

        log::info!(
            "Rescanned {} assets, assigned {} new identifier(s)",
            identifiers.len(),
            assigned
        );

        self.identifiers = identifiers;
        self.pending.clear();
        Ok(())
    }

    fn identifier_for_path(&self, path: &Path) -> Option<Guid> {
        self.identifiers.get(path).cloned()
    }
}
