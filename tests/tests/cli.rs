use std::process::Output;

use libassetclone::config::CONFIG_FILE_NAME;

use crate::clone_test::{
    io_util::{assetclone_command, read_tree},
    project::TestProject,
};

fn run(project: &TestProject, args: &[&str]) -> Output {
    let output = assetclone_command()
        .current_dir(project.path())
        .arg("--color")
        .arg("never")
        .args(args)
        .output()
        .expect("Couldn't spawn assetclone");

    if !output.status.success() {
        eprintln!("stdout: {}", String::from_utf8_lossy(&output.stdout));
        eprintln!("stderr: {}", String::from_utf8_lossy(&output.stderr));
    }

    output
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).replace('\\', "/")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn prefab_project() -> TestProject {
    let project = TestProject::new();
    project.folder("A", "fold0001").asset(
        "A/f.asset",
        "m_Prefab: {fileID: 1, guid: abc123, type: 2}\n",
        "abc123",
    );
    project
}

#[test]
fn hard_copy_command() {
    let project = prefab_project();

    let output = run(&project, &["hard-copy", "Assets/A"]);

    assert!(output.status.success());
    let stdout = stdout(&output);
    assert!(stdout.contains("Copied Assets/A to Assets/A (Clone)"), "{stdout}");
    assert!(stdout.contains("Finished hard copy: 1 rewritten"), "{stdout}");

    let new_guid = project.guid_of("A (Clone)/f.asset");
    assert_eq!(
        project.read("A (Clone)/f.asset"),
        format!("m_Prefab: {{fileID: 1, guid: {new_guid}, type: 2}}\n")
    );
}

#[test]
fn hard_copy_lists_the_mapping() {
    let project = prefab_project();

    let output = run(&project, &["hard-copy", "--list", "Assets/A"]);

    assert!(output.status.success());
    let new_guid = project.guid_of("A (Clone)/f.asset");
    let stdout = stdout(&output);
    assert!(
        stdout.contains(&format!("Mapped Assets/A/f.asset: abc123 -> {new_guid}")),
        "{stdout}"
    );
    assert!(stdout.contains("Rewrote Assets/A (Clone)/f.asset"), "{stdout}");
}

#[test]
fn hard_copy_refuses_files() {
    let project = prefab_project();
    let before = read_tree(project.path());

    let output = run(&project, &["hard-copy", "Assets/A/f.asset"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("hard-copy only copies folders"));
    assert_eq!(read_tree(project.path()), before);
}

#[test]
fn safe_copy_refuses_folders() {
    let project = prefab_project();

    let output = run(&project, &["safe-copy", "Assets/A"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("safe-copy only copies files"));
    assert!(!project.exists("A (Clone)"));
}

#[test]
fn nothing_selected() {
    let project = prefab_project();
    let before = read_tree(project.path());

    let output = run(&project, &["safe-copy"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("Nothing to copy"));
    assert_eq!(read_tree(project.path()), before);
}

#[test]
fn project_config_is_used() {
    let project = TestProject::new();
    project.asset(
        "mat.mat",
        "m_Texture: {fileID: 2800000, guid: tex00001, type: 3}\n",
        "mat00001",
    );
    fs_err::write(
        project.path().join(CONFIG_FILE_NAME),
        r#"{ suffix: "_copy", nullReference: "{fileID: 0, guid: 0}" }"#,
    )
    .unwrap();

    let output = run(&project, &["safe-copy", "Assets/mat.mat"]);

    assert!(output.status.success());
    assert_eq!(
        project.read("mat_copy.mat"),
        "m_Texture: {fileID: 0, guid: 0}\n"
    );
}

#[test]
fn suffix_flag_overrides_config() {
    let project = prefab_project();
    fs_err::write(
        project.path().join(CONFIG_FILE_NAME),
        r#"{ suffix: "_copy" }"#,
    )
    .unwrap();

    let output = run(&project, &["hard-copy", "--suffix", " Variant", "Assets/A"]);

    assert!(output.status.success());
    assert!(project.exists("A Variant/f.asset"));
    assert!(!project.exists("A_copy"));
}

#[test]
fn invalid_config_is_reported() {
    let project = prefab_project();
    fs_err::write(project.path().join(CONFIG_FILE_NAME), "{ suffx: 1 }").unwrap();

    let output = run(&project, &["hard-copy", "Assets/A"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains(CONFIG_FILE_NAME));
    assert!(!project.exists("A (Clone)"));
}

#[test]
fn selection_is_relative_to_the_project() {
    let project = prefab_project();
    let elsewhere = tempfile::tempdir().unwrap();

    let output = assetclone_command()
        .current_dir(elsewhere.path())
        .arg("--color")
        .arg("never")
        .arg("hard-copy")
        .arg("--project")
        .arg(project.path())
        .arg("Assets/A")
        .output()
        .expect("Couldn't spawn assetclone");

    assert!(output.status.success(), "{}", stderr(&output));
    assert!(project.exists("A (Clone)/f.asset"));
    assert_eq!(fs_err::read_dir(elsewhere.path()).unwrap().count(), 0);
}

#[test]
fn selection_outside_the_assets_is_refused() {
    let project = prefab_project();
    let other = project.path().join("Other").join("B");
    fs_err::create_dir_all(&other).unwrap();
    fs_err::write(other.join("b.asset"), "m_Ref: {fileID: 1, guid: abc123}\n").unwrap();
    let before = read_tree(project.path());

    let output = run(&project, &["hard-copy", "Other/B"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("is not inside the asset folder"));
    assert_eq!(read_tree(project.path()), before);
}
