use std::collections::{BTreeSet, HashMap};
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::{DirEntry, Metadata, ReadDir, VfsBackend, VfsSnapshot};

/// In-memory filesystem that can be used as a VFS backend.
///
/// Internally reference counted to enable giving a copy to
/// [`Vfs`](struct.Vfs.html) and keeping the original to inspect or mutate
/// the filesystem's state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFs {
    inner: Arc<Mutex<InMemoryFsInner>>,
}

impl InMemoryFs {
    /// Create a new empty `InMemoryFs`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a [`VfsSnapshot`](enum.VfsSnapshot.html) into a subtree of the
    /// in-memory filesystem. Missing parent directories are created.
    ///
    /// This function will return an error if the operations required to apply
    /// the snapshot result in errors, like trying to create a file inside a
    /// file.
    pub fn load_snapshot<P: Into<PathBuf>>(
        &mut self,
        path: P,
        snapshot: VfsSnapshot,
    ) -> io::Result<()> {
        let path = path.into();
        let mut inner = self.inner.lock().unwrap();

        if let Some(parent) = parent_of(&path) {
            inner.create_dir_all(parent)?;
        }

        inner.load_snapshot(path, snapshot)
    }
}

#[derive(Debug, Default)]
struct InMemoryFsInner {
    entries: HashMap<PathBuf, Entry>,
}

#[derive(Debug)]
enum Entry {
    File { contents: Vec<u8> },
    Dir { children: BTreeSet<PathBuf> },
}

/// Like `Path::parent`, but treats the empty parent of a bare relative name as
/// no parent at all.
fn parent_of(path: &Path) -> Option<&Path> {
    path.parent()
        .filter(|parent| !parent.as_os_str().is_empty())
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("path {} not found", path.display()),
    )
}

fn already_exists(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("path {} already exists", path.display()),
    )
}

fn not_a_directory(path: &Path) -> io::Error {
    io::Error::other(format!("{} is not a directory", path.display()))
}

impl InMemoryFsInner {
    fn load_snapshot(&mut self, path: PathBuf, snapshot: VfsSnapshot) -> io::Result<()> {
        if let Some(parent) = parent_of(&path) {
            self.link_child(parent, &path)?;
        }

        match snapshot {
            VfsSnapshot::File { contents } => {
                self.entries.insert(path, Entry::File { contents });
            }
            VfsSnapshot::Dir { children } => {
                self.entries.insert(
                    path.clone(),
                    Entry::Dir {
                        children: BTreeSet::new(),
                    },
                );

                for (name, child) in children {
                    self.load_snapshot(path.join(name), child)?;
                }
            }
        }

        Ok(())
    }

    fn link_child(&mut self, parent: &Path, child: &Path) -> io::Result<()> {
        match self.entries.get_mut(parent) {
            Some(Entry::Dir { children }) => {
                children.insert(child.to_path_buf());
                Ok(())
            }
            Some(Entry::File { .. }) => Err(not_a_directory(parent)),
            None => Err(not_found(parent)),
        }
    }

    fn unlink_child(&mut self, child: &Path) {
        if let Some(parent) = parent_of(child) {
            if let Some(Entry::Dir { children }) = self.entries.get_mut(parent) {
                children.remove(child);
            }
        }
    }

    fn create_dir_all(&mut self, path: &Path) -> io::Result<()> {
        match self.entries.get(path) {
            Some(Entry::Dir { .. }) => return Ok(()),
            Some(Entry::File { .. }) => return Err(already_exists(path)),
            None => {}
        }

        if let Some(parent) = parent_of(path) {
            self.create_dir_all(parent)?;
            self.link_child(parent, path)?;
        }

        self.entries.insert(
            path.to_path_buf(),
            Entry::Dir {
                children: BTreeSet::new(),
            },
        );

        Ok(())
    }

    fn write(&mut self, path: &Path, data: &[u8]) -> io::Result<()> {
        if let Some(Entry::Dir { .. }) = self.entries.get(path) {
            return Err(io::Error::other(format!(
                "{} is a directory",
                path.display()
            )));
        }

        if let Some(parent) = parent_of(path) {
            self.link_child(parent, path)?;
        }

        self.entries.insert(
            path.to_path_buf(),
            Entry::File {
                contents: data.to_owned(),
            },
        );

        Ok(())
    }
}

/// Resolves `.` and `..` components without consulting the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }

    normalized
}

impl VfsBackend for InMemoryFs {
    fn read(&mut self, path: &Path) -> io::Result<Vec<u8>> {
        let inner = self.inner.lock().unwrap();

        match inner.entries.get(path) {
            Some(Entry::File { contents }) => Ok(contents.clone()),
            Some(Entry::Dir { .. }) => Err(io::Error::other(format!(
                "{} is a directory",
                path.display()
            ))),
            None => Err(not_found(path)),
        }
    }

    fn write(&mut self, path: &Path, data: &[u8]) -> io::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.write(path, data)
    }

    fn write_atomic(&mut self, path: &Path, data: &[u8]) -> io::Result<()> {
        // A single locked insert is already atomic for every observer.
        let mut inner = self.inner.lock().unwrap();
        inner.write(path, data)
    }

    fn exists(&mut self, path: &Path) -> io::Result<bool> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.entries.contains_key(path))
    }

    fn read_dir(&mut self, path: &Path) -> io::Result<ReadDir> {
        let inner = self.inner.lock().unwrap();

        match inner.entries.get(path) {
            Some(Entry::Dir { children }) => {
                let iter = children
                    .clone()
                    .into_iter()
                    .map(|path| Ok(DirEntry { path }));

                Ok(ReadDir {
                    inner: Box::new(iter),
                })
            }
            Some(Entry::File { .. }) => Err(not_a_directory(path)),
            None => Err(not_found(path)),
        }
    }

    fn create_dir(&mut self, path: &Path) -> io::Result<()> {
        let mut inner = self.inner.lock().unwrap();

        if inner.entries.contains_key(path) {
            return Err(already_exists(path));
        }

        if let Some(parent) = parent_of(path) {
            inner.link_child(parent, path)?;
        }

        inner.entries.insert(
            path.to_path_buf(),
            Entry::Dir {
                children: BTreeSet::new(),
            },
        );

        Ok(())
    }

    fn metadata(&mut self, path: &Path) -> io::Result<Metadata> {
        let inner = self.inner.lock().unwrap();

        match inner.entries.get(path) {
            Some(Entry::File { .. }) => Ok(Metadata { is_file: true }),
            Some(Entry::Dir { .. }) => Ok(Metadata { is_file: false }),
            None => Err(not_found(path)),
        }
    }

    fn remove_file(&mut self, path: &Path) -> io::Result<()> {
        let mut inner = self.inner.lock().unwrap();

        match inner.entries.get(path) {
            Some(Entry::File { .. }) => {
                inner.entries.remove(path);
                inner.unlink_child(path);
                Ok(())
            }
            Some(Entry::Dir { .. }) => Err(io::Error::other(format!(
                "{} is a directory",
                path.display()
            ))),
            None => Err(not_found(path)),
        }
    }

    fn canonicalize(&mut self, path: &Path) -> io::Result<PathBuf> {
        let normalized = normalize(path);
        let inner = self.inner.lock().unwrap();

        if inner.entries.contains_key(&normalized) {
            Ok(normalized)
        } else {
            Err(not_found(path))
        }
    }
}
