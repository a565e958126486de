/*============================================================
  Synavera Project: Infostamp
  Module: infostamp::version
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Derive the dev version string of an installed snapshot
    from its tag history, degrading to a fallback string.

  Security / Safety Notes:
    Read-only; delegates repository access to infostamp::git.

  Dependencies:
    regex for tag parsing, chrono for the datestamp.

  Operational Scope:
    Called once per stamped package before descriptor files
    are patched.

  Revision History:
    2026-10-18 COD  Implemented branch-scoped tag resolution.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Resolution never aborts the caller
    - Branch-scoped matching with explicit fallback
============================================================*/

use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use regex::Regex;
use serde::Serialize;

use crate::git::describe_tags;
use crate::logger::Logger;

/// Outcome of resolving one package's version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedVersion {
    pub version: String,
    pub branch: String,
    pub datestamp: i64,
}

/// How `git describe` is invoked.
#[derive(Debug, Clone)]
pub struct DescribeOptions {
    pub binary: String,
    pub timeout: Duration,
}

impl Default for DescribeOptions {
    fn default() -> Self {
        Self {
            binary: "git".into(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Resolve the version of the tree at `install_path` on `branch_prefix`.
///
/// Any failure to describe or match a tag yields `fallback` unchanged.
pub async fn resolve(
    install_path: &Path,
    branch_prefix: &str,
    fallback: &str,
    options: &DescribeOptions,
    logger: &Logger,
) -> ResolvedVersion {
    let version = match describe_tags(&options.binary, install_path, options.timeout).await {
        Ok(description) => match version_from_description(&description, branch_prefix) {
            Some(version) => {
                logger.debug(
                    "RESOLVE",
                    format!("{description} on {branch_prefix} resolved to {version}"),
                );
                version
            }
            None => {
                logger.debug(
                    "RESOLVE",
                    format!("Tag {description} is not on {branch_prefix}; using {fallback}"),
                );
                fallback.to_string()
            }
        },
        Err(err) => {
            logger.debug(
                "RESOLVE",
                format!(
                    "No tag history in {} ({err}); using {fallback}",
                    install_path.display()
                ),
            );
            fallback.to_string()
        }
    };

    ResolvedVersion {
        version,
        branch: branch_prefix.to_string(),
        datestamp: Utc::now().timestamp(),
    }
}

/// Turn a tag description into a dev version, or `None` when the tag is off-branch.
///
/// `9.x-1.5` gives `9.x-1.5+0-dev`; `9.x-1.5-3-gabcdef1` gives `9.x-1.5+3-dev`.
pub fn version_from_description(description: &str, branch_prefix: &str) -> Option<String> {
    if branch_prefix.is_empty() {
        return None;
    }
    let pattern = format!(
        r"^({}\.\d+(?:-[A-Za-z][A-Za-z0-9]*)?)(?:-(\d+)-g[0-9A-Fa-f]{{7,40}})?$",
        regex::escape(branch_prefix)
    );
    // The prefix is escaped, so the pattern always compiles.
    let re = Regex::new(&pattern).ok()?;
    let caps = re.captures(description.trim())?;

    let tag = &caps[1];
    let distance = caps.get(2).map_or("0", |m| m.as_str());
    Some(format!("{tag}+{distance}-dev"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command as StdCommand;

    #[test]
    fn tagged_tip_gets_zero_distance() {
        assert_eq!(
            version_from_description("9.x-1.5", "9.x-1").as_deref(),
            Some("9.x-1.5+0-dev")
        );
    }

    #[test]
    fn commits_past_tag_are_counted() {
        assert_eq!(
            version_from_description("9.x-1.5-3-gABCDEF1", "9.x-1").as_deref(),
            Some("9.x-1.5+3-dev")
        );
    }

    #[test]
    fn prerelease_label_is_kept() {
        assert_eq!(
            version_from_description("8.x-2.0-beta3-12-g0a1b2c3d", "8.x-2").as_deref(),
            Some("8.x-2.0-beta3+12-dev")
        );
        assert_eq!(
            version_from_description("8.x-2.0-rc1", "8.x-2").as_deref(),
            Some("8.x-2.0-rc1+0-dev")
        );
    }

    #[test]
    fn other_branches_never_match() {
        assert_eq!(version_from_description("8.x-2.0", "9.x-1"), None);
        assert_eq!(version_from_description("9.x-10.0", "9.x-1"), None);
        assert_eq!(version_from_description("9.x-1.x", "9.x-1"), None);
        assert_eq!(version_from_description("v9.x-1.5", "9.x-1"), None);
    }

    #[test]
    fn prefix_is_matched_literally() {
        assert_eq!(version_from_description("9yx-1.5", "9.x-1"), None);
    }

    #[tokio::test]
    async fn directory_without_history_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = resolve(
            dir.path(),
            "9.x-1",
            "9.x-1.x-dev",
            &DescribeOptions::default(),
            &Logger::silent(),
        )
        .await;
        assert_eq!(resolved.version, "9.x-1.x-dev");
        assert_eq!(resolved.branch, "9.x-1");
        assert!(resolved.datestamp > 1_700_000_000);
    }

    #[tokio::test]
    async fn missing_git_binary_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let options = DescribeOptions {
            binary: "infostamp-no-such-git-binary".into(),
            timeout: Duration::from_secs(1),
        };
        let resolved = resolve(dir.path(), "9.x-1", "9.x-1.x-dev", &options, &Logger::silent()).await;
        assert_eq!(resolved.version, "9.x-1.x-dev");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn hung_describe_falls_back_within_timeout() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("slow-git");
        std::fs::write(&script, "#!/bin/sh\nexec sleep 30\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let options = DescribeOptions {
            binary: script.to_string_lossy().into_owned(),
            timeout: Duration::from_secs(1),
        };
        let started = std::time::Instant::now();
        let resolved = resolve(dir.path(), "9.x-1", "9.x-1.x-dev", &options, &Logger::silent()).await;
        assert_eq!(resolved.version, "9.x-1.x-dev");
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    fn git(dir: &Path, args: &[&str]) -> bool {
        StdCommand::new("git")
            .args(args)
            .current_dir(dir)
            .env("GIT_AUTHOR_NAME", "infostamp")
            .env("GIT_AUTHOR_EMAIL", "infostamp@example.invalid")
            .env("GIT_COMMITTER_NAME", "infostamp")
            .env("GIT_COMMITTER_EMAIL", "infostamp@example.invalid")
            .output()
            .map(|out| out.status.success())
            .unwrap_or(false)
    }

    #[tokio::test]
    async fn commits_after_tag_resolve_from_real_repository() {
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path();
        // Skip where git is unavailable.
        if !git(repo, &["init", "--quiet"]) {
            return;
        }
        std::fs::write(repo.join("a.txt"), "a").unwrap();
        assert!(git(repo, &["add", "."]));
        assert!(git(repo, &["commit", "--quiet", "--no-gpg-sign", "-m", "one"]));
        assert!(git(repo, &["tag", "9.x-1.5"]));

        let options = DescribeOptions::default();
        let resolved = resolve(repo, "9.x-1", "9.x-1.x-dev", &options, &Logger::silent()).await;
        assert_eq!(resolved.version, "9.x-1.5+0-dev");

        for n in 0..2 {
            std::fs::write(repo.join("a.txt"), format!("a{n}")).unwrap();
            assert!(git(repo, &["commit", "--quiet", "--no-gpg-sign", "-am", "more"]));
        }
        let resolved = resolve(repo, "9.x-1", "9.x-1.x-dev", &options, &Logger::silent()).await;
        assert_eq!(resolved.version, "9.x-1.5+2-dev");

        let resolved = resolve(repo, "8.x-2", "8.x-2.x-dev", &options, &Logger::silent()).await;
        assert_eq!(resolved.version, "8.x-2.x-dev");
    }

    #[tokio::test]
    async fn package_nested_in_site_repository_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let site = dir.path();
        if !git(site, &["init", "--quiet"]) {
            return;
        }
        let package = site.join("modules").join("views_bulk");
        std::fs::create_dir_all(&package).unwrap();
        std::fs::write(package.join("views_bulk.info.yml"), "name: Views Bulk\n").unwrap();
        assert!(git(site, &["add", "."]));
        assert!(git(site, &["commit", "--quiet", "--no-gpg-sign", "-m", "site"]));
        assert!(git(site, &["tag", "9.x-1.5"]));

        let options = DescribeOptions::default();
        let resolved = resolve(&package, "9.x-1", "9.x-1.x-dev", &options, &Logger::silent()).await;
        assert_eq!(resolved.version, "9.x-1.x-dev");

        let resolved = resolve(site, "9.x-1", "9.x-1.x-dev", &options, &Logger::silent()).await;
        assert_eq!(resolved.version, "9.x-1.5+0-dev");
    }
}
