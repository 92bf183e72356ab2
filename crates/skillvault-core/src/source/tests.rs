//! Tests for the source module.

use super::*;
use crate::error::VaultError;
use crate::types::ResourceKind;

fn resolve(url: &str) -> Address {
    AddressResolver::default().resolve(url).unwrap()
}

fn assert_invalid(url: &str) {
    let err = AddressResolver::default().resolve(url).unwrap_err();
    assert!(
        matches!(err, VaultError::InvalidAddress { .. }),
        "expected InvalidAddress for {url}, got {err:?}"
    );
}

mod repo_address_tests {
    use super::*;

    #[test]
    fn resolve_repo_root() {
        let address = resolve("https://github.com/acme/tools");

        assert_eq!(address.owner, "acme");
        assert_eq!(address.repo, "tools");
        assert_eq!(address.kind, ResourceKind::Repo);
        assert_eq!(address.branch, "main");
        assert_eq!(address.label, "acme/tools");
        assert_eq!(address.relative_path, None);
        assert_eq!(address.unit_name, None);
    }

    #[test]
    fn resolve_repo_with_trailing_slash() {
        let address = resolve("https://github.com/acme/tools/");
        assert_eq!(address.kind, ResourceKind::Repo);
        assert_eq!(address.label, "acme/tools");
    }

    #[test]
    fn resolve_strips_git_suffix() {
        let address = resolve("https://github.com/acme/tools.git");
        assert_eq!(address.repo, "tools");
        assert_eq!(address.clone_url(), "https://github.com/acme/tools.git");
    }

    #[test]
    fn resolve_ignores_query_and_fragment() {
        let address = resolve("https://github.com/acme/tools?tab=readme#install");
        assert_eq!(address.kind, ResourceKind::Repo);
        assert_eq!(address.repo, "tools");
        assert_eq!(address.label, "acme/tools");
    }

    #[test]
    fn tree_without_path_is_repo_on_that_branch() {
        let address = resolve("https://github.com/acme/tools/tree/develop");
        assert_eq!(address.kind, ResourceKind::Repo);
        assert_eq!(address.branch, "develop");
        assert_eq!(address.relative_path, None);
        assert_eq!(address.label, "acme/tools");
    }

    #[test]
    fn bare_tree_marker_defaults_branch() {
        let address = resolve("https://github.com/acme/tools/tree/");
        assert_eq!(address.kind, ResourceKind::Repo);
        assert_eq!(address.branch, "main");
    }

    #[test]
    fn unknown_third_segment_falls_back_to_repo() {
        // Deliberately lenient: pages like /issues or /pulls resolve to the repo.
        let address = resolve("https://github.com/acme/tools/issues/42");
        assert_eq!(address.kind, ResourceKind::Repo);
        assert_eq!(address.branch, "main");
        assert_eq!(address.relative_path, None);
        assert_eq!(address.label, "acme/tools");
    }

    #[test]
    fn host_match_is_case_insensitive() {
        let address = resolve("https://GitHub.com/acme/tools");
        assert_eq!(address.host, "github.com");
    }

    #[test]
    fn custom_host_resolver() {
        let resolver = AddressResolver::new("git.example.org");
        let address = resolver
            .resolve("http://git.example.org/team/kit/tree/main/a")
            .unwrap();
        assert_eq!(address.kind, ResourceKind::Folder);
        assert_eq!(address.clone_url(), "http://git.example.org/team/kit.git");
        assert!(resolver.resolve("https://github.com/team/kit").is_err());
    }
}

mod folder_address_tests {
    use super::*;

    #[test]
    fn resolve_tree_folder() {
        let address = resolve("https://github.com/acme/tools/tree/main/skills/foo");

        assert_eq!(address.kind, ResourceKind::Folder);
        assert_eq!(address.branch, "main");
        assert_eq!(address.relative_path.as_deref(), Some("skills/foo"));
        assert_eq!(address.label, "acme/tools/foo");
        assert_eq!(address.unit_name, None);
    }

    #[test]
    fn resolve_tree_folder_on_other_branch() {
        let address = resolve("https://github.com/acme/tools/tree/v2/a/b/c/");
        assert_eq!(address.branch, "v2");
        assert_eq!(address.relative_path.as_deref(), Some("a/b/c"));
        assert_eq!(address.label, "acme/tools/c");
    }

    #[test]
    fn percent_decoding_is_per_segment() {
        let address = resolve("https://github.com/acme/tools/tree/main/my%20skills/a%2Fb");
        // The encoded slash stays inside its own segment.
        assert_eq!(address.relative_path.as_deref(), Some("my skills/a/b"));
        assert_eq!(address.label, "acme/tools/a/b");

        let address = resolve("https://github.com/acme/tools/tree/main/my%20skills/foo");
        assert_eq!(address.relative_path.as_deref(), Some("my skills/foo"));
        assert_eq!(address.label, "acme/tools/foo");
    }
}

mod file_address_tests {
    use super::*;

    #[test]
    fn resolve_marker_file() {
        let address = resolve("https://github.com/acme/tools/blob/main/skills/foo/SKILL.md");

        assert_eq!(address.kind, ResourceKind::File);
        assert_eq!(address.relative_path.as_deref(), Some("skills/foo/SKILL.md"));
        assert_eq!(address.unit_name.as_deref(), Some("foo"));
        assert_eq!(address.unit_folder_path.as_deref(), Some("skills/foo"));
        assert_eq!(address.label, "acme/tools/foo");
        assert!(address.is_marker_file());
        assert_eq!(address.parent_folder().as_deref(), Some("skills/foo"));
    }

    #[test]
    fn marker_file_at_root_uses_repo_name() {
        let address = resolve("https://github.com/acme/tools/blob/main/SKILL.md");

        assert_eq!(address.unit_name.as_deref(), Some("tools"));
        assert_eq!(address.unit_folder_path.as_deref(), Some("."));
        assert_eq!(address.label, "acme/tools/tools");
        assert_eq!(address.parent_folder(), None);
    }

    #[test]
    fn lowercase_marker_is_a_plain_file() {
        let address = resolve("https://github.com/acme/tools/blob/main/docs/skill.md");

        assert_eq!(address.kind, ResourceKind::File);
        assert_eq!(address.unit_name, None);
        assert_eq!(address.unit_folder_path, None);
        assert_eq!(address.label, "acme/tools/skill.md");
        assert!(!address.is_marker_file());
    }

    #[test]
    fn regular_file() {
        let address = resolve("https://github.com/acme/tools/blob/dev/README.md");
        assert_eq!(address.branch, "dev");
        assert_eq!(address.relative_path.as_deref(), Some("README.md"));
        assert_eq!(address.label, "acme/tools/README.md");
    }

    #[test]
    fn blob_without_path_is_invalid() {
        assert_invalid("https://github.com/acme/tools/blob/main");
        assert_invalid("https://github.com/acme/tools/blob");
    }
}

mod invalid_address_tests {
    use super::*;

    #[test]
    fn rejects_wrong_host() {
        assert_invalid("https://gitlab.com/acme/tools");
    }

    #[test]
    fn rejects_non_http_scheme() {
        assert_invalid("ftp://github.com/acme/tools");
        assert_invalid("git@github.com:acme/tools.git");
    }

    #[test]
    fn rejects_missing_repo_segment() {
        assert_invalid("https://github.com/acme");
        assert_invalid("https://github.com/");
        assert_invalid("https://github.com/acme//");
    }

    #[test]
    fn rejects_empty_interior_segment() {
        assert_invalid("https://github.com//acme/tools");
        assert_invalid("https://github.com/acme//tools");
        assert_invalid("https://github.com/acme/tools/tree//skills");
    }

    #[test]
    fn rejects_garbage() {
        assert_invalid("not a url");
        assert_invalid("");
    }
}
