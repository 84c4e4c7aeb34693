//! Commit history and release commits

use chrono::{TimeZone, Utc};
use git2::{IndexAddOption, Oid, Sort};
use tracing::{debug, info, instrument};

use liftoff_core::error::GitError;
use liftoff_core::types::PackageContext;

use crate::repository::{GitRepo, Result};
use crate::types::GitCommit;

impl GitRepo {
    /// All commits reachable from HEAD since `tag`, or all history when `tag` is empty
    #[instrument(skip(self))]
    pub fn commits_since_tag(&self, tag: &str) -> Result<Vec<GitCommit>> {
        let head = match self.repo.head() {
            Ok(head) => head.peel_to_commit()?,
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push(head.id())?;

        if !tag.is_empty() {
            let target = self
                .repo
                .find_reference(&format!("refs/tags/{}", tag))?
                .peel_to_commit()?;
            revwalk.hide(target.id())?;
        }

        let mut commits = Vec::new();
        for oid in revwalk {
            commits.push(self.read_commit(oid?)?);
        }

        debug!(count = commits.len(), "collected commits");
        Ok(commits)
    }

    fn read_commit(&self, oid: Oid) -> Result<GitCommit> {
        let commit = self.repo.find_commit(oid)?;

        let message = commit.summary().unwrap_or("(no message)").to_string();
        let date = Utc
            .timestamp_opt(commit.time().seconds(), 0)
            .single()
            .unwrap_or_else(Utc::now);

        let tree = commit.tree()?;
        let parent_tree = match commit.parent(0) {
            Ok(parent) => Some(parent.tree()?),
            Err(_) => None,
        };
        let diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;

        let files = diff
            .deltas()
            .filter_map(|delta| {
                delta
                    .new_file()
                    .path()
                    .or_else(|| delta.old_file().path())
                    .map(|p| p.to_string_lossy().replace('\\', "/"))
            })
            .collect();

        let mut info = GitCommit::new(oid.to_string(), message, date).with_files(files);
        if let Some(body) = commit.body() {
            info = info.with_body(body.trim());
        }
        Ok(info)
    }

    /// Stage the package directory and commit it with the templated message.
    ///
    /// `${packageName}` and `${version}` in `template` are substituted.
    /// Returns the new commit hash.
    #[instrument(skip(self, pkg, template), fields(package = %pkg.name))]
    pub fn commit_changes(&self, pkg: &PackageContext, template: &str) -> Result<String> {
        let version = pkg.new_version.as_ref().ok_or_else(|| GitError::VersionRequired {
            package: pkg.name.clone(),
        })?;

        let dir = self.relative_path(&pkg.path);
        let pathspecs = if dir.is_empty() {
            vec!["*".to_string()]
        } else {
            vec![dir.clone(), format!("{}/*", dir)]
        };

        let mut index = self.repo.index()?;
        index.add_all(pathspecs.iter(), IndexAddOption::DEFAULT, None)?;
        index.update_all(pathspecs.iter(), None)?;
        index.write()?;
        let tree = self.repo.find_tree(index.write_tree()?)?;

        let message = template
            .replace("${packageName}", &pkg.name)
            .replace("${version}", version);

        let sig = self.signature()?;
        let parent = match self.repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => None,
            Err(e) => return Err(e.into()),
        };
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        let oid = self
            .repo
            .commit(Some("HEAD"), &sig, &sig, &message, &tree, &parents)?;

        info!(commit = %oid, dir = %dir, message = %message, "committed release");
        Ok(oid.to_string())
    }
}
