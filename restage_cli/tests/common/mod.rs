//! Shared test utilities for restage CLI integration tests.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use git2::{IndexAddOption, Repository};
use tempfile::TempDir;

/// Get a Command for the restage binary with no configuration leaking in
/// from the environment.
///
/// # Panics
///
/// Panics if the restage binary cannot be found.
#[allow(deprecated)]
pub fn restage_cmd() -> Command {
    let mut cmd = Command::cargo_bin("restage").expect("restage binary should exist");
    for var in [
        "RESTAGE_BACKEND",
        "RESTAGE_GIT_BIN",
        "RESTAGE_TRANSFORM_BIN",
        "RESTAGE_TIMEOUT",
        "RESTAGE_VERBOSE",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

/// Create a repository with one commit containing `README.md`.
pub fn init_repo() -> TempDir {
    let temp = TempDir::new().expect("create temp dir");
    let repo = Repository::init(temp.path()).expect("init repo");
    fs::write(temp.path().join("README.md"), "# fixture\n").expect("write README");

    let mut index = repo.index().expect("open index");
    index
        .add_all(["*"], IndexAddOption::DEFAULT, None)
        .expect("add files");
    index.write().expect("write index");
    let tree_id = index.write_tree().expect("write tree");
    let tree = repo.find_tree(tree_id).expect("find tree");
    let signature = git2::Signature::now("Test User", "test@example.com").expect("signature");
    repo.commit(Some("HEAD"), &signature, &signature, "Initial commit", &tree, &[])
        .expect("commit");
    temp
}

/// Write `contents` to `relative` and add it to the index.
pub fn stage_file(root: &Path, relative: &str, contents: &str) {
    fs::write(root.join(relative), contents).expect("write file");
    let repo = Repository::open(root).expect("open repo");
    let mut index = repo.index().expect("open index");
    index.add_path(Path::new(relative)).expect("stage file");
    index.write().expect("write index");
}

/// Contents of `relative` as currently recorded in the index.
pub fn staged_content(root: &Path, relative: &str) -> String {
    let repo = Repository::open(root).expect("open repo");
    let mut index = repo.index().expect("open index");
    index.read(true).expect("reload index");
    let entry = index.get_path(Path::new(relative), 0).expect("entry staged");
    let blob = repo.find_blob(entry.id).expect("find blob");
    String::from_utf8_lossy(blob.content()).into_owned()
}
