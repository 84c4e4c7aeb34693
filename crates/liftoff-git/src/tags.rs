//! Tag operations

use tracing::{debug, info, instrument, warn};

use liftoff_core::error::GitError;
use liftoff_core::types::PackageContext;

use crate::repository::{GitRepo, Result};

/// Pick the last tag, in list order, that contains `package_name` or starts
/// with `prefix`. Returns an empty string when nothing matches.
pub fn select_last_tag(tags: &[String], package_name: &str, prefix: Option<&str>) -> String {
    tags.iter()
        .rev()
        .find(|tag| {
            tag.contains(package_name)
                || prefix.is_some_and(|p| !p.is_empty() && tag.starts_with(p))
        })
        .cloned()
        .unwrap_or_default()
}

impl GitRepo {
    /// Tag names in refname order, as `git tag --list` prints them
    pub fn tag_names(&self) -> Result<Vec<String>> {
        let names = self.repo.tag_names(None)?;
        let mut tags: Vec<String> = names.iter().flatten().map(|s| s.to_string()).collect();
        tags.sort();
        Ok(tags)
    }

    /// Latest release tag for a package, or an empty string if there is none
    #[instrument(skip(self))]
    pub fn get_last_tag(&self, package_name: &str, prefix: Option<&str>) -> Result<String> {
        let tags = self.tag_names()?;
        let tag = select_last_tag(&tags, package_name, prefix);
        debug!(tag = %tag, candidates = tags.len(), "resolved last tag");
        Ok(tag)
    }

    /// Whether a tag exists
    pub fn tag_exists(&self, name: &str) -> Result<bool> {
        match self.repo.find_reference(&format!("refs/tags/{}", name)) {
            Ok(_) => Ok(true),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(false),
            Err(e) => Err(GitError::Git2(e)),
        }
    }

    /// Annotation message of a tag, `None` for lightweight tags
    pub fn tag_message(&self, name: &str) -> Result<Option<String>> {
        let reference = self.repo.find_reference(&format!("refs/tags/{}", name))?;
        match reference.peel_to_tag() {
            Ok(tag) => Ok(tag.message().map(|m| m.trim_end().to_string())),
            Err(_) => Ok(None),
        }
    }

    /// Create the annotated release tag `{prefix}{name}@{newVersion}` at HEAD.
    ///
    /// An existing tag is replaced only when `force` is set.
    #[instrument(skip(self, pkg), fields(package = %pkg.name, force))]
    pub fn create_tag(
        &self,
        pkg: &PackageContext,
        prefix: Option<&str>,
        remote: &str,
        force: bool,
    ) -> Result<String> {
        let name = pkg.tag_name(prefix).ok_or_else(|| GitError::VersionRequired {
            package: pkg.name.clone(),
        })?;

        if self.tag_exists(&name)? {
            if !force {
                return Err(GitError::TagExists {
                    tag: name,
                    remote: remote.to_string(),
                });
            }
            warn!(tag = %name, "tag exists, recreating due to force");
            self.delete_tag(&name)?;
        }

        let head = self.head_commit()?;
        let sig = self.signature()?;
        let message = format!("Release {}", name);
        self.repo
            .tag(&name, head.as_object(), &sig, &message, false)?;

        info!(tag = %name, commit = %head.id(), "created tag");
        Ok(name)
    }

    /// Delete a tag
    #[instrument(skip(self))]
    pub fn delete_tag(&self, name: &str) -> Result<()> {
        self.repo.tag_delete(name)?;
        info!(name, "deleted tag");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{commit_file, setup_repo};

    fn tags(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_select_last_tag_by_position() {
        let list = tags(&["my-package@1.0.0", "my-package@1.1.0", "other-package@2.0.0"]);
        assert_eq!(select_last_tag(&list, "my-package", None), "my-package@1.1.0");
        assert_eq!(select_last_tag(&[], "my-package", None), "");
    }

    #[test]
    fn test_select_last_tag_position_not_version() {
        let list = tags(&["pkg@1.10.0", "pkg@1.9.0"]);
        assert_eq!(select_last_tag(&list, "pkg", None), "pkg@1.9.0");
    }

    #[test]
    fn test_select_last_tag_prefix() {
        let list = tags(&["release/2024-01", "v1.0.0"]);
        assert_eq!(select_last_tag(&list, "my-package", Some("release/")), "release/2024-01");
        assert_eq!(select_last_tag(&list, "my-package", Some("")), "");
    }

    #[test]
    fn test_get_last_tag_from_repo() {
        let (_temp, repo) = setup_repo();
        let head = repo.head_commit().unwrap();
        for name in ["my-package@1.1.0", "my-package@1.0.0", "other-package@2.0.0"] {
            repo.inner()
                .tag_lightweight(name, head.as_object(), false)
                .unwrap();
        }

        assert_eq!(repo.get_last_tag("my-package", None).unwrap(), "my-package@1.1.0");
        assert_eq!(repo.get_last_tag("missing", None).unwrap(), "");
    }

    #[test]
    fn test_create_tag_requires_version() {
        let (_temp, repo) = setup_repo();
        let pkg = PackageContext::new("pkg1", "/repo/pkg1", "1.0.0");
        let err = repo.create_tag(&pkg, None, "origin", false).unwrap_err();
        assert!(matches!(err, GitError::VersionRequired { .. }));
    }

    #[test]
    fn test_create_tag_message() {
        let (_temp, repo) = setup_repo();
        let pkg = PackageContext::new("pkg1", "/repo/pkg1", "1.0.0").with_new_version("2.0.0");

        let name = repo.create_tag(&pkg, None, "origin", false).unwrap();
        assert_eq!(name, "pkg1@2.0.0");
        assert_eq!(
            repo.tag_message(&name).unwrap().as_deref(),
            Some("Release pkg1@2.0.0")
        );
    }

    #[test]
    fn test_create_tag_exists_without_force() {
        let (_temp, repo) = setup_repo();
        let pkg = PackageContext::new("pkg1", "/repo/pkg1", "1.0.0").with_new_version("2.0.0");
        repo.create_tag(&pkg, None, "origin", false).unwrap();

        let err = repo.create_tag(&pkg, None, "origin", false).unwrap_err();
        assert!(matches!(err, GitError::TagExists { ref tag, .. } if tag == "pkg1@2.0.0"));
        assert!(err.to_string().contains("git tag -d pkg1@2.0.0"));
    }

    #[test]
    fn test_create_tag_force_recreates() {
        let (_temp, repo) = setup_repo();
        let pkg = PackageContext::new("pkg1", "/repo/pkg1", "1.0.0").with_new_version("2.0.0");
        repo.create_tag(&pkg, Some("v/"), "origin", false).unwrap();

        let new_head = commit_file(&repo, "other.txt", "x", "chore: move head");
        let name = repo.create_tag(&pkg, Some("v/"), "origin", true).unwrap();

        assert_eq!(name, "v/pkg1@2.0.0");
        let target = repo
            .inner()
            .find_reference("refs/tags/v/pkg1@2.0.0")
            .unwrap()
            .peel_to_commit()
            .unwrap()
            .id();
        assert_eq!(target, new_head);
        assert_eq!(
            repo.tag_message(&name).unwrap().as_deref(),
            Some("Release v/pkg1@2.0.0")
        );
    }
}
