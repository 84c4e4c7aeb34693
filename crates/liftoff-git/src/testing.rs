//! Repository fixtures shared by the unit tests

use std::path::Path;

use git2::{Repository, Signature};
use tempfile::TempDir;

use crate::repository::GitRepo;

/// Repository with one commit containing `file.txt`
pub fn setup_repo() -> (TempDir, GitRepo) {
    let temp = TempDir::new().unwrap();
    Repository::init(temp.path()).unwrap();
    let repo = GitRepo::open(temp.path()).unwrap();
    commit_file(&repo, "file.txt", "content", "Initial commit");
    (temp, repo)
}

/// Write `path` and commit it on HEAD
pub fn commit_file(repo: &GitRepo, path: &str, content: &str, message: &str) -> git2::Oid {
    let inner = repo.inner();
    let workdir = inner.workdir().unwrap();
    let full = workdir.join(path);
    std::fs::create_dir_all(full.parent().unwrap()).unwrap();
    std::fs::write(&full, content).unwrap();

    let mut index = inner.index().unwrap();
    index.add_path(Path::new(path)).unwrap();
    index.write().unwrap();
    let tree = inner.find_tree(index.write_tree().unwrap()).unwrap();

    let sig = Signature::now("Test", "test@example.com").unwrap();
    let parent = inner.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
    inner
        .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap()
}

/// Clone `origin` so the checked-out branch tracks `origin/<branch>`
pub fn clone_of(origin: &Path) -> (TempDir, GitRepo) {
    let temp = TempDir::new().unwrap();
    Repository::clone(origin.to_str().unwrap(), temp.path()).unwrap();
    let repo = GitRepo::open(temp.path()).unwrap();
    (temp, repo)
}
