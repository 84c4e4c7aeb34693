//! Release type inference from commit messages

use tracing::debug;

use liftoff_core::types::ReleaseType;

/// Marker that forces a major release wherever it appears in a message
pub const BREAKING_CHANGE_MARKER: &str = "BREAKING CHANGE";

/// Infer the release type from full commit messages.
///
/// `major` if any message mentions a breaking change, `minor` if any starts
/// with `feat`, otherwise `patch`. No messages also yields `patch`.
pub fn infer_release_type<I, S>(messages: I) -> ReleaseType
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut release_type = ReleaseType::Patch;
    let mut count = 0usize;

    for message in messages {
        count += 1;
        let message = message.as_ref();
        if message.contains(BREAKING_CHANGE_MARKER) {
            release_type = ReleaseType::Major;
            break;
        }
        if message.trim_start().starts_with("feat") {
            release_type = release_type.max(ReleaseType::Minor);
        }
    }

    debug!(commits = count, release_type = %release_type, "inferred release type");
    release_type
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breaking_change_anywhere() {
        let messages = [
            "fix: typo",
            "refactor: api\n\nBREAKING CHANGE: removed the v1 client",
            "feat: add thing",
        ];
        assert_eq!(infer_release_type(messages), ReleaseType::Major);
    }

    #[test]
    fn test_feature() {
        assert_eq!(
            infer_release_type(["fix: a", "feat(ui): add button"]),
            ReleaseType::Minor
        );
    }

    #[test]
    fn test_default_patch() {
        assert_eq!(infer_release_type(["chore: deps", "docs: readme"]), ReleaseType::Patch);
        assert_eq!(infer_release_type(Vec::<String>::new()), ReleaseType::Patch);
    }

    #[test]
    fn test_feat_must_lead() {
        assert_eq!(infer_release_type(["fix: feat flag parsing"]), ReleaseType::Patch);
    }
}
