use std::path::{Path, PathBuf};

use libassetclone::{guid::parse_sidecar_guid, Guid};
use tempfile::{tempdir, TempDir};

/// A throwaway project on the real filesystem with an `Assets` folder.
pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let dir = tempdir().expect("Couldn't create temporary directory");
        fs_err::create_dir(dir.path().join("Assets")).unwrap();
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn assets(&self) -> PathBuf {
        self.path().join("Assets")
    }

    /// Writes a file below `Assets` without a sidecar.
    pub fn file(&self, relative: &str, contents: impl AsRef<[u8]>) -> &Self {
        let path = self.assets().join(relative);
        if let Some(parent) = path.parent() {
            fs_err::create_dir_all(parent).unwrap();
        }
        fs_err::write(path, contents).unwrap();
        self
    }

    /// Writes a file below `Assets` with a sidecar carrying `guid`.
    pub fn asset(&self, relative: &str, contents: impl AsRef<[u8]>, guid: &str) -> &Self {
        self.file(relative, contents);
        self.file(&format!("{relative}.meta"), sidecar(guid))
    }

    /// Creates a folder below `Assets` with a sidecar carrying `guid`.
    pub fn folder(&self, relative: &str, guid: &str) -> &Self {
        fs_err::create_dir_all(self.assets().join(relative)).unwrap();
        self.file(&format!("{relative}.meta"), sidecar(guid))
    }

    pub fn read(&self, relative: &str) -> String {
        fs_err::read_to_string(self.assets().join(relative)).unwrap()
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.assets().join(relative).exists()
    }

    /// The identifier in the sidecar of `relative`.
    pub fn guid_of(&self, relative: &str) -> Guid {
        parse_sidecar_guid(&self.read(&format!("{relative}.meta")))
            .unwrap_or_else(|| panic!("{relative} has no identifier"))
    }
}

pub fn sidecar(guid: &str) -> String {
    format!("fileFormatVersion: 2\nguid: {guid}\nDefaultImporter:\n  userData: \n")
}
