/*============================================================
  Synavera Project: Infostamp
  Module: infostamp::error
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Central error taxonomy for version resolution, descriptor
    patching and configuration loading.

  Security / Safety Notes:
    Errors carry paths and command names only; descriptor
    contents are never echoed into diagnostics.

  Dependencies:
    thiserror for ergonomic error definitions.

  Operational Scope:
    Propagated through every module; the binary entry point
    maps each category to a stable exit code.

  Revision History:
    2026-10-18 COD  Established Infostamp error definitions.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Explicit error taxonomy with actionable context
    - Stable exit codes for operational tooling
============================================================*/

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use thiserror::Error;

/// Result alias for Infostamp operations.
pub type Result<T> = std::result::Result<T, InfostampError>;

/// High-level error domains surfaced by Infostamp.
#[derive(Debug, Error)]
pub enum InfostampError {
    #[error("Required command `{command}` not found in PATH")]
    CommandMissing { command: String },
    #[error("Command `{command}` failed with status {status}: {stderr}")]
    CommandFailure {
        command: String,
        status: i32,
        stderr: String,
    },
    #[error("Command `{command}` timed out after {}s", .after.as_secs())]
    Timeout { command: String, after: Duration },
    #[error("{} is not the top level of a git work tree", .path.display())]
    Untracked { path: PathBuf },
    #[error("Configuration: {0}")]
    Config(String),
    #[error("Serialization: {0}")]
    Serialization(String),
    #[error("Filesystem: {0}")]
    Filesystem(String),
    #[error("Runtime: {0}")]
    Runtime(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl InfostampError {
    /// Map error category to a deterministic exit code.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            InfostampError::CommandMissing { .. } => ExitCode::from(10),
            InfostampError::CommandFailure { .. } => ExitCode::from(11),
            InfostampError::Timeout { .. } => ExitCode::from(12),
            InfostampError::Untracked { .. } => ExitCode::from(13),
            InfostampError::Config(_) => ExitCode::from(20),
            InfostampError::Serialization(_) => ExitCode::from(31),
            InfostampError::Filesystem(_) => ExitCode::from(40),
            InfostampError::Io(_) => ExitCode::from(41),
            InfostampError::Runtime(_) => ExitCode::from(50),
        }
    }
}
