use std::{
    io,
    path::{Path, PathBuf},
};

use libassetclone::{
    copy::{CollectError, CopyStats, DuplicatePolicy, IndexError},
    hard_copy,
    rewrite::{rewrite_tree, HardRewriter, RewriteErrorPolicy},
    walk::AssetFilter,
    AssetHost, CloneError, CopyOptions, CopyReport, Guid, MetaFileHost,
};
use memofs::Vfs;
use pretty_assertions::assert_eq;

use crate::clone_test::{
    io_util::{list_tree, read_tree},
    project::TestProject,
};

fn run_hard_copy(project: &TestProject, selection: &[&str]) -> Result<CopyReport, CloneError> {
    let vfs = Vfs::new_default();
    let mut host = MetaFileHost::new(&vfs, project.path(), "Assets", AssetFilter::default())
        .expect("Couldn't open test project")
        .with_selection(selection.iter().map(PathBuf::from));

    hard_copy(&vfs, &mut host, &CopyOptions::default())
}

/// A level folder whose prefab points at a material in the same folder, a
/// shader in a nested folder and a texture outside the folder.
fn level_project() -> TestProject {
    let project = TestProject::new();
    project
        .asset("tex.png", [0x89, b'P', b'N', b'G', 0xff, 0x00], "tex00001")
        .folder("Level", "lvl00001")
        .asset(
            "Level/prefab.prefab",
            "Prefab:\n\
             \x20 m_Material: {fileID: 2100000, guid: mat00001, type: 2}\n\
             \x20 m_Icon: {fileID: 2800000, guid: tex00001, type: 3}\n",
            "pre00001",
        )
        .asset(
            "Level/mat.mat",
            "Material:\n\
             \x20 m_Shader: {fileID: 4800000, guid: shd00001, type: 3}\n\
             \x20 m_Parent: {fileID: 0}\n",
            "mat00001",
        )
        .folder("Level/Sub", "sub00001")
        .asset("Level/Sub/s.shader", "Shader \"Custom/S\" {}\n", "shd00001")
        .asset("Level/icon.png", [0x89, b'P', b'N', b'G', 0xff, 0x01], "ico00001");
    project
}

#[test]
fn copies_point_at_each_other() {
    let project = level_project();

    let report = run_hard_copy(&project, &["Assets/Level"]).unwrap();

    assert!(report.is_success());
    assert_eq!(report.copied.len(), 1);

    let new_material = project.guid_of("Level (Clone)/mat.mat");
    let new_shader = project.guid_of("Level (Clone)/Sub/s.shader");
    assert_ne!(new_material, Guid::new("mat00001"));
    assert_ne!(new_shader, Guid::new("shd00001"));

    assert_eq!(
        project.read("Level (Clone)/prefab.prefab"),
        format!(
            "Prefab:\n\
             \x20 m_Material: {{fileID: 2100000, guid: {new_material}, type: 2}}\n\
             \x20 m_Icon: {{fileID: 2800000, guid: tex00001, type: 3}}\n"
        )
    );
    assert_eq!(
        project.read("Level (Clone)/mat.mat"),
        format!(
            "Material:\n\
             \x20 m_Shader: {{fileID: 4800000, guid: {new_shader}, type: 3}}\n\
             \x20 m_Parent: {{fileID: 0}}\n"
        )
    );

    assert_eq!(report.mapping.lookup("mat00001"), Some(&new_material));
    assert_eq!(report.mapping.lookup("tex00001"), None);
    assert_eq!(report.stats.tokens_remapped(), 2);
}

#[test]
fn originals_are_untouched() {
    let project = level_project();
    let before = project.read("Level/prefab.prefab");

    run_hard_copy(&project, &["Assets/Level"]).unwrap();

    assert_eq!(project.read("Level/prefab.prefab"), before);
    assert_eq!(project.guid_of("Level/mat.mat"), Guid::new("mat00001"));
    assert_eq!(project.guid_of("Level"), Guid::new("lvl00001"));
}

#[test]
fn copy_has_the_same_shape() {
    let project = level_project();

    let report = run_hard_copy(&project, &["Assets/Level"]).unwrap();

    assert_eq!(
        list_tree(&project.assets().join("Level (Clone)")),
        list_tree(&project.assets().join("Level"))
    );
    assert!(project.exists("Level (Clone).meta"));
    assert_eq!(report.skipped.len(), 1);
    assert!(report.skipped[0].ends_with("Level (Clone)/icon.png"));
    assert_eq!(
        fs_err::read(project.assets().join("Level (Clone)/icon.png")).unwrap(),
        vec![0x89, b'P', b'N', b'G', 0xff, 0x01]
    );
}

#[test]
fn sidecars_of_copies_keep_their_other_lines() {
    let project = level_project();

    run_hard_copy(&project, &["Assets/Level"]).unwrap();

    let guid = project.guid_of("Level (Clone)/mat.mat");
    assert_eq!(
        project.read("Level (Clone)/mat.mat.meta"),
        format!("fileFormatVersion: 2\nguid: {guid}\nDefaultImporter:\n  userData: \n")
    );
}

#[test]
fn selected_folders_are_remapped_together() {
    let project = TestProject::new();
    project
        .folder("A", "fold000a")
        .asset(
            "A/a.asset",
            "m_Other: {fileID: 11400000, guid: b0000001, type: 2}\n",
            "a0000001",
        )
        .folder("B", "fold000b")
        .asset(
            "B/b.asset",
            "m_Other: {fileID: 11400000, guid: a0000001, type: 2}\n",
            "b0000001",
        );

    let report = run_hard_copy(&project, &["Assets/A", "Assets/B"]).unwrap();

    assert_eq!(report.copied.len(), 2);

    let new_a = project.guid_of("A (Clone)/a.asset");
    let new_b = project.guid_of("B (Clone)/b.asset");
    assert_eq!(
        project.read("A (Clone)/a.asset"),
        format!("m_Other: {{fileID: 11400000, guid: {new_b}, type: 2}}\n")
    );
    assert_eq!(
        project.read("B (Clone)/b.asset"),
        format!("m_Other: {{fileID: 11400000, guid: {new_a}, type: 2}}\n")
    );
}

#[test]
fn rewriting_again_changes_nothing() {
    let project = level_project();

    let report = run_hard_copy(&project, &["Assets/Level"]).unwrap();
    let after_copy = project.read("Level (Clone)/prefab.prefab");

    let destinations: Vec<_> = report.copied.iter().map(|pair| &pair.destination).collect();

    let vfs = Vfs::new_default();
    let stats = CopyStats::new();
    let summary = rewrite_tree(
        &vfs,
        &destinations,
        &AssetFilter::default(),
        &HardRewriter::new(&report.mapping),
        RewriteErrorPolicy::Abort,
        &stats,
    )
    .unwrap();

    assert!(summary.rewritten.is_empty());
    assert_eq!(project.read("Level (Clone)/prefab.prefab"), after_copy);
    assert_eq!(stats.tokens_remapped(), 0);
}

#[test]
fn existing_copy_is_refused() {
    let project = level_project();
    project.folder("Level (Clone)", "taken001");

    let err = run_hard_copy(&project, &["Assets/Level"]).unwrap_err();

    match err {
        CloneError::Copy { source } => {
            assert!(source.completed.is_empty());
            assert_eq!(source.source.kind(), std::io::ErrorKind::AlreadyExists);
        }
        other => panic!("expected a copy failure, got {other:?}"),
    }
    assert!(!project.exists("Level (Clone)/mat.mat"));
}

#[test]
fn references_outside_the_selection_are_kept() {
    let project = TestProject::new();
    project.folder("Plain", "plain001").asset(
        "Plain/notes.asset",
        "m_Ref: {fileID: 7, guid: elsewhere, type: 2}\n",
        "notes001",
    );

    let report = run_hard_copy(&project, &["Assets/Plain"]).unwrap();

    assert_eq!(report.mapping.len(), 1);
    assert_eq!(report.stats.tokens_left(), 1);
    assert_eq!(
        project.read("Plain (Clone)/notes.asset"),
        "m_Ref: {fileID: 7, guid: elsewhere, type: 2}\n"
    );
    assert_eq!(report.unchanged.len(), 1);
}

#[test]
fn nested_selection_changes_nothing() {
    let project = level_project();
    let before = read_tree(project.path());

    let err = run_hard_copy(&project, &["Assets/Level", "Assets/Level/Sub"]).unwrap_err();

    match &err {
        CloneError::Collect {
            source: CollectError::NestedSelection { path, parent },
        } => {
            assert!(path.ends_with("Level/Sub"));
            assert!(parent.ends_with("Level"));
        }
        other => panic!("expected a nested selection, got {other:?}"),
    }
    assert!(err.copied().is_empty());
    assert_eq!(read_tree(project.path()), before);
}

#[test]
fn selection_outside_the_assets_changes_nothing() {
    let project = level_project();
    let other = project.path().join("Other").join("A");
    fs_err::create_dir_all(&other).unwrap();
    fs_err::write(other.join("g.asset"), "m_Ref: {fileID: 1, guid: g0000002}\n").unwrap();
    fs_err::write(other.join("g.asset.meta"), "guid: g0000002\n").unwrap();
    let before = read_tree(project.path());

    for selection in ["Other/A", "Assets"] {
        let err = run_hard_copy(&project, &[selection]).unwrap_err();

        match err {
            CloneError::Collect {
                source: CollectError::OutsideAssets { path },
            } => assert!(path.ends_with(selection)),
            other => panic!("expected a selection outside the assets, got {other:?}"),
        }
        assert_eq!(read_tree(project.path()), before);
    }
}

/// Host that reports the identifier of `target` for `alias` as well.
struct SharedIdentifier<'a> {
    inner: MetaFileHost<'a>,
    alias: PathBuf,
    target: PathBuf,
}

impl AssetHost for SharedIdentifier<'_> {
    fn resolve_selection(&self) -> io::Result<Vec<PathBuf>> {
        self.inner.resolve_selection()
    }

    fn is_directory(&self, path: &Path) -> io::Result<bool> {
        self.inner.is_directory(path)
    }

    fn is_asset(&self, path: &Path) -> bool {
        self.inner.is_asset(path)
    }

    fn copy(&mut self, from: &Path, to: &Path) -> io::Result<()> {
        self.inner.copy(from, to)
    }

    fn commit_and_rescan(&mut self) -> io::Result<()> {
        self.inner.commit_and_rescan()
    }

    fn identifier_for_path(&self, path: &Path) -> Option<Guid> {
        if path == self.alias {
            self.inner.identifier_for_path(&self.target)
        } else {
            self.inner.identifier_for_path(path)
        }
    }
}

fn run_with_shared_identifier(
    vfs: &Vfs,
    project: &TestProject,
    policy: DuplicatePolicy,
) -> Result<CopyReport, CloneError> {
    let inner = MetaFileHost::new(vfs, project.path(), "Assets", AssetFilter::default())
        .expect("Couldn't open test project")
        .with_selection(["Assets/Level"]);
    let level = inner.asset_root().join("Level");
    let mut host = SharedIdentifier {
        alias: level.join("mat.mat"),
        target: level.join("prefab.prefab"),
        inner,
    };

    let options = CopyOptions {
        duplicate_identifiers: policy,
        ..CopyOptions::default()
    };
    hard_copy(vfs, &mut host, &options)
}

#[test]
fn rejected_duplicate_identifier_reports_the_copies() {
    let project = level_project();
    let vfs = Vfs::new_default();

    let err = run_with_shared_identifier(&vfs, &project, DuplicatePolicy::Reject).unwrap_err();

    match &err {
        CloneError::Index {
            source: IndexError::DuplicateIdentifier { guid, .. },
            ..
        } => assert_eq!(guid, &Guid::new("pre00001")),
        other => panic!("expected a duplicate identifier, got {other:?}"),
    }

    let copied: Vec<&Path> = err
        .copied()
        .iter()
        .map(|pair| pair.destination.as_path())
        .collect();
    assert_eq!(copied.len(), 1);
    assert!(copied[0].ends_with("Level (Clone)"));

    // The copy exists but was never rewritten.
    assert_eq!(
        project.read("Level (Clone)/prefab.prefab"),
        project.read("Level/prefab.prefab")
    );
}

#[test]
fn duplicate_identifier_first_wins_by_default() {
    let project = level_project();
    let vfs = Vfs::new_default();

    let report =
        run_with_shared_identifier(&vfs, &project, DuplicatePolicy::FirstWins).unwrap();

    assert!(report.is_success());
    assert!(report.mapping.lookup("mat00001").is_none());
    assert!(report.mapping.lookup("pre00001").is_some());
}
