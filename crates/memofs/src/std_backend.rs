use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use crate::{DirEntry, Metadata, ReadDir, VfsBackend};

/// `VfsBackend` that uses `std::fs`.
#[derive(Debug, Default)]
pub struct StdBackend {
    _private: (),
}

impl StdBackend {
    pub fn new() -> StdBackend {
        StdBackend { _private: () }
    }
}

impl VfsBackend for StdBackend {
    fn read(&mut self, path: &Path) -> io::Result<Vec<u8>> {
        fs_err::read(path)
    }

    fn write(&mut self, path: &Path, data: &[u8]) -> io::Result<()> {
        fs_err::write(path, data)
    }

    fn write_atomic(&mut self, path: &Path, data: &[u8]) -> io::Result<()> {
        // The temporary file must live in the same directory as the target so
        // the final rename never crosses a filesystem boundary.
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(|err| {
            io::Error::new(
                err.kind(),
                format!(
                    "failed to create temporary file next to {}: {}",
                    path.display(),
                    err
                ),
            )
        })?;

        temp.write_all(data)?;
        temp.as_file().sync_all()?;

        if let Ok(existing) = fs_err::metadata(path) {
            // Best effort: keep the original file's permissions on the
            // replacement.
            let _ = fs_err::set_permissions(temp.path(), existing.permissions());
        }

        temp.persist(path).map_err(|err| {
            log::trace!(
                "Failed to move temporary file over {}: {}",
                path.display(),
                err.error
            );
            err.error
        })?;

        Ok(())
    }

    fn exists(&mut self, path: &Path) -> io::Result<bool> {
        std::fs::exists(path)
    }

    fn read_dir(&mut self, path: &Path) -> io::Result<ReadDir> {
        let entries: Result<Vec<_>, _> = fs_err::read_dir(path)?.collect();
        let mut entries = entries?;

        entries.sort_by_cached_key(|entry| entry.file_name());

        let inner = entries
            .into_iter()
            .map(|entry| Ok(DirEntry { path: entry.path() }));

        Ok(ReadDir {
            inner: Box::new(inner),
        })
    }

    fn create_dir(&mut self, path: &Path) -> io::Result<()> {
        fs_err::create_dir(path)
    }

    fn remove_file(&mut self, path: &Path) -> io::Result<()> {
        fs_err::remove_file(path)
    }

    fn metadata(&mut self, path: &Path) -> io::Result<Metadata> {
        let inner = fs_err::metadata(path)?;

        Ok(Metadata {
            is_file: inner.is_file(),
        })
    }

    fn canonicalize(&mut self, path: &Path) -> io::Result<PathBuf> {
        fs_err::canonicalize(path)
    }
}
