use std::path::PathBuf;

use libassetclone::{
    safe_copy, walk::AssetFilter, CloneError, CopyOptions, CopyReport, Guid, MetaFileHost,
};
use memofs::Vfs;
use pretty_assertions::assert_eq;

use crate::clone_test::project::TestProject;

fn run_safe_copy(
    project: &TestProject,
    selection: &[&str],
    options: &CopyOptions,
) -> Result<CopyReport, CloneError> {
    let vfs = Vfs::new_default();
    let mut host = MetaFileHost::new(&vfs, project.path(), "Assets", AssetFilter::default())
        .expect("Couldn't open test project")
        .with_selection(selection.iter().map(PathBuf::from));

    safe_copy(&vfs, &mut host, options)
}

const MATERIAL: &str = "\
Material:
  m_Name: Rock
  m_Script: {fileID: 11500000, guid: scr00001, type: 3}
  m_Texture: {fileID: 2800000, guid: tex00001, type: 3}
  m_Pair: [{fileID: 1, guid: aaa}, {fileID: 2, guid: bbb, type: 2}]
  m_Empty: {fileID: 0}
";

#[test]
fn severs_everything_but_the_script() {
    let project = TestProject::new();
    project.asset("rock.mat", MATERIAL, "rock0001");

    let report = run_safe_copy(&project, &["Assets/rock.mat"], &CopyOptions::default()).unwrap();

    assert!(report.is_success());
    assert!(report.mapping.is_empty());
    insta::assert_snapshot!(project.read("rock (Clone).mat"), @r"
    Material:
      m_Name: Rock
      m_Script: {fileID: 11500000, guid: scr00001, type: 3}
      m_Texture: {fileID: 0}
      m_Pair: [{fileID: 0}, {fileID: 0}]
      m_Empty: {fileID: 0}
    ");

    assert_eq!(report.stats.blocks_severed(), 3);
    assert_eq!(report.stats.script_lines_skipped(), 1);
    assert_eq!(project.read("rock.mat"), MATERIAL);
}

#[test]
fn copy_gets_its_own_identifier() {
    let project = TestProject::new();
    project.asset("rock.mat", MATERIAL, "rock0001");

    run_safe_copy(&project, &["Assets/rock.mat"], &CopyOptions::default()).unwrap();

    assert_eq!(project.guid_of("rock.mat"), Guid::new("rock0001"));
    assert_ne!(project.guid_of("rock (Clone).mat"), Guid::new("rock0001"));
}

#[test]
fn windows_line_endings_are_kept() {
    let project = TestProject::new();
    project.asset(
        "crlf.asset",
        "m_Script: {fileID: 1, guid: s, type: 3}\r\nm_Mesh: {fileID: 2, guid: m, type: 3}\r\n",
        "crlf0001",
    );

    run_safe_copy(&project, &["Assets/crlf.asset"], &CopyOptions::default()).unwrap();

    assert_eq!(
        project.read("crlf (Clone).asset"),
        "m_Script: {fileID: 1, guid: s, type: 3}\r\nm_Mesh: {fileID: 0}\r\n"
    );
}

#[test]
fn binary_files_are_copied_verbatim() {
    let project = TestProject::new();
    let bytes = [0x89, b'P', b'N', b'G', 0xff, 0xfe, b'{', b'}'];
    project.asset("tex.png", bytes, "tex00001");

    let report = run_safe_copy(&project, &["Assets/tex.png"], &CopyOptions::default()).unwrap();

    assert!(report.is_success());
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.stats.binary_files_skipped(), 1);
    assert_eq!(
        fs_err::read(project.assets().join("tex (Clone).png")).unwrap(),
        bytes
    );
}

#[test]
fn custom_marker_and_null_reference() {
    let project = TestProject::new();
    project.asset(
        "custom.asset",
        "m_Behaviour: {fileID: 1, guid: keep, type: 3}\nm_Mesh: {fileID: 2, guid: drop, type: 3}\n",
        "custom01",
    );

    let options = CopyOptions {
        suffix: "_copy".to_owned(),
        script_marker: "m_Behaviour".to_owned(),
        null_reference: "{}".to_owned(),
        ..CopyOptions::default()
    };
    run_safe_copy(&project, &["Assets/custom.asset"], &options).unwrap();

    assert_eq!(
        project.read("custom_copy.asset"),
        "m_Behaviour: {fileID: 1, guid: keep, type: 3}\nm_Mesh: {}\n"
    );
}

#[test]
fn several_files_at_once() {
    let project = TestProject::new();
    project
        .asset("one.asset", "m_A: {fileID: 1, guid: x}\n", "one00001")
        .asset("Deep/two.asset", "m_B: {fileID: 1, guid: y}\n", "two00001");

    let report = run_safe_copy(
        &project,
        &["Assets/one.asset", "Assets/Deep/two.asset"],
        &CopyOptions::default(),
    )
    .unwrap();

    assert_eq!(report.copied.len(), 2);
    assert_eq!(report.rewritten.len(), 2);
    assert_eq!(project.read("one (Clone).asset"), "m_A: {fileID: 0}\n");
    assert_eq!(project.read("Deep/two (Clone).asset"), "m_B: {fileID: 0}\n");
}
