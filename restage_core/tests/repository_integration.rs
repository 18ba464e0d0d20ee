use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::process::Command;

use git2::{IndexAddOption, Repository as GitRepository};
use restage_core::{
    classify, Classification, Error, GitCli, IndexState, Pipeline, Repository, RepositoryAccess,
    Result, Snapshot, SnapshotPhase, TransformOutput, WorktreeState,
};
use tempfile::TempDir;

#[test]
fn snapshot_flags_untracked_and_ignored_entries() -> Result<()> {
    let temp = TempDir::new().expect("tempdir");
    let git_repo = GitRepository::init(temp.path()).map_err(Error::from)?;

    write_file(temp.path().join(".gitignore"), "*.log\n");
    commit_all(&git_repo, "ignore logs")?;
    write_file(temp.path().join("build.log"), "noise\n");
    write_file(temp.path().join("notes/todo.txt"), "later\n");

    let repo = Repository::open(temp.path())?;
    let snapshot = Snapshot::capture(&repo, SnapshotPhase::Before)?;

    let log = snapshot.get("build.log").expect("ignored entry listed");
    assert!(log.ignored);
    assert_eq!(classify(log), Classification::Ignored);

    let todo = snapshot.get("notes/todo.txt").expect("untracked entry listed");
    assert!(todo.untracked);
    assert_eq!(classify(todo), Classification::UntrackedOnly);

    Ok(())
}

#[test]
fn snapshot_separates_index_and_worktree_state() -> Result<()> {
    let temp = TempDir::new().expect("tempdir");
    let git_repo = GitRepository::init(temp.path()).map_err(Error::from)?;

    write_file(temp.path().join("file.txt"), "one\n");
    commit_all(&git_repo, "initial")?;

    write_file(temp.path().join("file.txt"), "one\ntwo\n");
    stage_path(&git_repo, "file.txt")?;
    write_file(temp.path().join("file.txt"), "one\ntwo\nthree\n");

    let repo = Repository::open(temp.path())?;
    let entries = repo.status_entries()?;

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].index, IndexState::Modified);
    assert_eq!(entries[0].worktree, WorktreeState::Modified);
    assert_eq!(classify(&entries[0]), Classification::PartiallyStaged);

    Ok(())
}

#[test]
fn staged_rename_reports_original_path() -> Result<()> {
    let temp = TempDir::new().expect("tempdir");
    let git_repo = GitRepository::init(temp.path()).map_err(Error::from)?;

    write_file(temp.path().join("old.txt"), "stable content\n");
    commit_all(&git_repo, "initial")?;

    fs::rename(temp.path().join("old.txt"), temp.path().join("new.txt")).expect("rename");
    let mut index = git_repo.index().map_err(Error::from)?;
    index
        .remove_path(Path::new("old.txt"))
        .map_err(Error::from)?;
    index.add_path(Path::new("new.txt")).map_err(Error::from)?;
    index.write().map_err(Error::from)?;

    let repo = Repository::open(temp.path())?;
    let entries = repo.status_entries()?;

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].path, "new.txt");
    assert_eq!(entries[0].original_path.as_deref(), Some("old.txt"));
    assert_eq!(entries[0].index, IndexState::Renamed);
    assert_eq!(classify(&entries[0]), Classification::FullyStaged);

    Ok(())
}

#[test]
fn index_removal_of_kept_file_is_flagged_untracked() -> Result<()> {
    let temp = TempDir::new().expect("tempdir");
    let git_repo = GitRepository::init(temp.path()).map_err(Error::from)?;

    write_file(temp.path().join("kept.txt"), "keep me\n");
    commit_all(&git_repo, "initial")?;
    untrack_path(&git_repo, "kept.txt")?;

    let repo = Repository::open(temp.path())?;
    let snapshot = Snapshot::capture(&repo, SnapshotPhase::Before)?;

    assert_eq!(snapshot.len(), 1);
    let kept = snapshot.get("kept.txt").expect("kept.txt listed");
    assert_eq!(kept.index, IndexState::Deleted);
    assert!(kept.untracked);
    assert_eq!(classify(kept), Classification::FullyStaged);

    Ok(())
}

#[test]
fn git_cli_folds_index_removal_of_kept_file() -> Result<()> {
    if !git_available() {
        return Ok(());
    }

    let temp = TempDir::new().expect("tempdir");
    let git_repo = GitRepository::init(temp.path()).map_err(Error::from)?;

    write_file(temp.path().join("kept.txt"), "keep me\n");
    commit_all(&git_repo, "initial")?;
    untrack_path(&git_repo, "kept.txt")?;
    write_file(temp.path().join("a.txt"), "body\n");
    stage_path(&git_repo, "a.txt")?;

    let cli = GitCli::open(temp.path())?;
    let before = Snapshot::capture(&cli, SnapshotPhase::Before)?;
    let kept = before.get("kept.txt").expect("kept.txt listed once");
    assert_eq!(kept.index, IndexState::Deleted);
    assert!(kept.untracked);
    assert_eq!(classes(&cli)?, classes(&Repository::open(temp.path())?)?);

    let rewrite = |root: &Path| -> Result<TransformOutput> {
        write_file(root.join("a.txt"), "// header\nbody\n");
        Ok(TransformOutput::succeeded())
    };
    let report = Pipeline::new(&cli).run(&rewrite)?;

    assert_eq!(report.reconciliation.result.repaired, vec!["a.txt"]);
    assert!(report.reconciliation.result.deleted.is_empty());

    Ok(())
}

#[test]
fn repository_open_discovers_from_nested_path() -> Result<()> {
    let temp = TempDir::new().expect("tempdir");
    GitRepository::init(temp.path()).map_err(Error::from)?;
    let nested = temp.path().join("nested/deeper");
    fs::create_dir_all(&nested).expect("nested dirs");

    let repo = Repository::open(&nested)?;
    let repo_root = repo.root().canonicalize().expect("canonical root");
    let expected_root = temp.path().canonicalize().expect("canonical temp path");
    assert_eq!(repo_root, expected_root);

    Ok(())
}

#[test]
fn repository_open_rejects_bare_repository() {
    let temp = TempDir::new().expect("tempdir");
    let bare_path = temp.path().join("bare.git");
    GitRepository::init_bare(&bare_path).expect("bare repo");

    let err = Repository::open(&bare_path);
    assert!(matches!(err, Err(Error::BareRepository { .. })));
}

#[test]
fn git_cli_matches_libgit2_classification() -> Result<()> {
    if !git_available() {
        return Ok(());
    }

    let temp = TempDir::new().expect("tempdir");
    let git_repo = GitRepository::init(temp.path()).map_err(Error::from)?;

    write_file(temp.path().join(".gitignore"), "*.log\n");
    write_file(temp.path().join("kept.txt"), "kept\n");
    write_file(temp.path().join("edited.txt"), "before\n");
    commit_all(&git_repo, "initial")?;

    write_file(temp.path().join("edited.txt"), "before\nafter\n");
    write_file(temp.path().join("added.txt"), "new\n");
    stage_path(&git_repo, "edited.txt")?;
    stage_path(&git_repo, "added.txt")?;
    write_file(temp.path().join("added.txt"), "new\nand changed\n");
    write_file(temp.path().join("loose.txt"), "untracked\n");
    write_file(temp.path().join("debug.log"), "ignored\n");

    let native = Repository::open(temp.path())?;
    let cli = GitCli::open(temp.path())?;

    let expected = BTreeMap::from([
        ("added.txt".to_owned(), Classification::PartiallyStaged),
        ("debug.log".to_owned(), Classification::Ignored),
        ("edited.txt".to_owned(), Classification::FullyStaged),
        ("loose.txt".to_owned(), Classification::UntrackedOnly),
    ]);
    assert_eq!(classes(&native)?, expected);
    assert_eq!(classes(&cli)?, expected);

    Ok(())
}

#[test]
fn git_cli_pipeline_restages_rewritten_file() -> Result<()> {
    if !git_available() {
        return Ok(());
    }

    let temp = TempDir::new().expect("tempdir");
    let git_repo = GitRepository::init(temp.path()).map_err(Error::from)?;

    write_file(temp.path().join("README.md"), "# repo\n");
    commit_all(&git_repo, "initial")?;
    write_file(temp.path().join("src/main.rs"), "fn main() {}\n");
    stage_path(&git_repo, "src/main.rs")?;

    let cli = GitCli::open(temp.path())?;
    let rewrite = |root: &Path| -> Result<TransformOutput> {
        write_file(root.join("src/main.rs"), "// header\nfn main() {}\n");
        Ok(TransformOutput::succeeded())
    };
    let report = Pipeline::new(&cli).run(&rewrite)?;

    assert_eq!(report.reconciliation.result.repaired, vec!["src/main.rs"]);
    let entries = cli.status_entries()?;
    let main = entries
        .iter()
        .find(|entry| entry.path == "src/main.rs")
        .expect("main.rs listed");
    assert_eq!(classify(main), Classification::FullyStaged);

    Ok(())
}

#[test]
fn git_cli_rejects_non_repository() {
    if !git_available() {
        return;
    }

    let temp = TempDir::new().expect("tempdir");
    let err = GitCli::open(temp.path());
    assert!(matches!(err, Err(Error::NotARepository { .. })));
}

#[test]
fn git_cli_rejects_bare_repository() {
    if !git_available() {
        return;
    }

    let temp = TempDir::new().expect("tempdir");
    let bare_path = temp.path().join("bare.git");
    GitRepository::init_bare(&bare_path).expect("bare repo");

    let err = GitCli::open(&bare_path);
    assert!(matches!(err, Err(Error::BareRepository { .. })));
}

fn classes(access: &dyn RepositoryAccess) -> Result<BTreeMap<String, Classification>> {
    Ok(access
        .status_entries()?
        .into_iter()
        .map(|entry| {
            let class = classify(&entry);
            (entry.path, class)
        })
        .collect())
}

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

fn commit_all(repo: &GitRepository, message: &str) -> Result<()> {
    let mut index = repo.index().map_err(Error::from)?;
    index
        .add_all(["*"], IndexAddOption::DEFAULT, None)
        .map_err(Error::from)?;
    index.write().map_err(Error::from)?;
    let tree_id = index.write_tree().map_err(Error::from)?;
    let tree = repo.find_tree(tree_id).map_err(Error::from)?;
    let signature = git2::Signature::now("Test User", "test@example.com").map_err(Error::from)?;

    let parents = match repo.head() {
        Ok(head) => vec![head.peel_to_commit().map_err(Error::from)?],
        Err(_) => Vec::new(),
    };
    let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
    repo.commit(
        Some("HEAD"),
        &signature,
        &signature,
        message,
        &tree,
        &parent_refs,
    )
    .map_err(Error::from)?;
    Ok(())
}

fn stage_path(repo: &GitRepository, path: &str) -> Result<()> {
    let mut index = repo.index().map_err(Error::from)?;
    index.read(true).map_err(Error::from)?;
    index.add_path(Path::new(path)).map_err(Error::from)?;
    index.write().map_err(Error::from)
}

fn untrack_path(repo: &GitRepository, path: &str) -> Result<()> {
    let mut index = repo.index().map_err(Error::from)?;
    index.read(true).map_err(Error::from)?;
    index.remove_path(Path::new(path)).map_err(Error::from)?;
    index.write().map_err(Error::from)
}

fn write_file(path: impl AsRef<Path>, contents: &str) {
    fs::create_dir_all(
        path.as_ref()
            .parent()
            .expect("path should have a parent directory"),
    )
    .expect("create directories");
    fs::write(path, contents).expect("write file");
}
