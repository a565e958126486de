/*============================================================
  Synavera Project: Infostamp
  Module: infostamp::git
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Query git for the nearest reachable tag of an installed
    source tree.

  Security / Safety Notes:
    Runs `git describe` with user privileges inside the
    package directory; nothing is written to the repository.

  Dependencies:
    tokio::process for async command execution,
    tokio::time for the bounded wait.

  Operational Scope:
    Feeds tag descriptions to the version resolver.

  Revision History:
    2026-10-18 COD  Crafted git describe integration.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Deterministic command invocation with explicit checks
    - Bounded waits on external processes
============================================================*/

use std::io;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

use crate::error::{InfostampError, Result};

/// Run `git describe --tags` in `repo` and return the first stdout line.
///
/// `repo` must be the top level of its own work tree; a package directory
/// nested inside a site repository is reported as untracked instead of
/// being described through the parent. Empty output is reported as a
/// command failure so callers see a single "no tag" shape. Children are
/// killed when `limit` elapses.
pub async fn describe_tags(binary: &str, repo: &Path, limit: Duration) -> Result<String> {
    let command = format!("{binary} describe --tags");
    timeout(limit, describe_in_own_tree(binary, repo))
        .await
        .map_err(|_| InfostampError::Timeout {
            command,
            after: limit,
        })?
}

async fn describe_in_own_tree(binary: &str, repo: &Path) -> Result<String> {
    let toplevel = first_line(binary, repo, &["rev-parse", "--show-toplevel"]).await?;
    if !same_directory(Path::new(&toplevel), repo) {
        return Err(InfostampError::Untracked {
            path: repo.to_path_buf(),
        });
    }
    first_line(binary, repo, &["describe", "--tags"]).await
}

async fn first_line(binary: &str, repo: &Path, args: &[&str]) -> Result<String> {
    let command = format!("{binary} {}", args.join(" "));
    let output = Command::new(binary)
        .args(args)
        .current_dir(repo)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|err| map_spawn_error(err, binary))?;

    if !output.status.success() {
        return Err(InfostampError::CommandFailure {
            command,
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let stdout = String::from_utf8(output.stdout).map_err(|err| {
        InfostampError::Serialization(format!("{command} emitted invalid UTF-8: {err}"))
    })?;

    match stdout.lines().next().map(str::trim) {
        Some(line) if !line.is_empty() => Ok(line.to_string()),
        _ => Err(InfostampError::CommandFailure {
            command,
            status: 0,
            stderr: "empty output".into(),
        }),
    }
}

fn same_directory(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn map_spawn_error(err: io::Error, command: &str) -> InfostampError {
    if err.kind() == io::ErrorKind::NotFound {
        InfostampError::CommandMissing {
            command: command.into(),
        }
    } else {
        InfostampError::Runtime(format!("Failed to spawn {command}: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_binary_is_reported_as_command_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = describe_tags(
            "infostamp-no-such-git-binary",
            dir.path(),
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, InfostampError::CommandMissing { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn hung_binary_is_cut_off_with_timeout() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("slow-git");
        std::fs::write(&script, "#!/bin/sh\nexec sleep 30\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let started = std::time::Instant::now();
        let err = describe_tags(
            script.to_str().unwrap(),
            dir.path(),
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, InfostampError::Timeout { .. }), "{err}");
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
