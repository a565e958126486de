/*============================================================
  Synavera Project: Infostamp
  Module: infostamp::logger
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1
  ------------------------------------------------------------
  Purpose:
    Structured diagnostics for stamping runs plus the plain
    progress channel operators see during installs.

  Security / Safety Notes:
    Log lines name packages and paths only. Log files are
    opened append-only.

  Dependencies:
    chrono for UTC timestamps, std::sync::Mutex for the sink.

  Operational Scope:
    Shared by the resolver, patcher and pipeline. Progress
    lines go to stdout, diagnostics to stderr and the log file.

  Revision History:
    2026-10-18 COD  Adapted Synavera logger for Infostamp.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Append-only logging with UTC timestamps
    - Deterministic formatting for auditability
============================================================*/

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{SecondsFormat, Utc};

use crate::error::{InfostampError, Result};

/// Severity of a diagnostic entry.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    fn always_shown(self) -> bool {
        matches!(self, LogLevel::Warn | LogLevel::Error)
    }
}

pub struct Logger {
    sink: Option<Mutex<BufWriter<File>>>,
    path: Option<PathBuf>,
    verbose: bool,
    quiet_progress: bool,
}

impl Logger {
    /// Build a logger writing to stderr and, when `path` is set, to an append-only file.
    pub fn new(path: Option<PathBuf>, verbose: bool) -> Result<Self> {
        let sink = match path.as_deref() {
            Some(file_path) => Some(Mutex::new(BufWriter::new(open_log(file_path)?))),
            None => None,
        };

        Ok(Self {
            sink,
            path,
            verbose,
            quiet_progress: false,
        })
    }

    /// Logger that drops progress lines and only surfaces warnings; used by tests.
    #[cfg(test)]
    pub fn silent() -> Self {
        Self {
            sink: None,
            path: None,
            verbose: false,
            quiet_progress: true,
        }
    }

    pub fn log<S: AsRef<str>>(&self, level: LogLevel, code: &str, message: S) {
        let line = format!(
            "{} [{}] [{}] {}",
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            level.as_str(),
            code,
            message.as_ref()
        );

        if self.verbose || level.always_shown() {
            eprintln!("{line}");
        }
        self.append(&line);
    }

    pub fn info<S: AsRef<str>>(&self, code: &str, message: S) {
        self.log(LogLevel::Info, code, message);
    }

    pub fn warn<S: AsRef<str>>(&self, code: &str, message: S) {
        self.log(LogLevel::Warn, code, message);
    }

    pub fn error<S: AsRef<str>>(&self, code: &str, message: S) {
        self.log(LogLevel::Error, code, message);
    }

    pub fn debug<S: AsRef<str>>(&self, code: &str, message: S) {
        self.log(LogLevel::Debug, code, message);
    }

    /// Operator-facing progress line, printed verbatim on stdout and mirrored to the log file.
    pub fn announce<S: AsRef<str>>(&self, message: S) {
        if !self.quiet_progress {
            println!("{}", message.as_ref());
        }
        self.append(&format!(
            "{} [{}] [{}] {}",
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            LogLevel::Info.as_str(),
            "PROGRESS",
            message.as_ref().trim()
        ));
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Flush buffered entries to the log file.
    pub fn finalize(&self) -> Result<()> {
        if let Some(sink) = &self.sink {
            let mut guard = sink
                .lock()
                .map_err(|_| InfostampError::Runtime("Log sink mutex poisoned".into()))?;
            guard.flush().map_err(|err| {
                InfostampError::Filesystem(format!(
                    "Failed to flush log file {}: {err}",
                    self.path().map(|p| p.display().to_string()).unwrap_or_default()
                ))
            })?;
        }
        Ok(())
    }

    fn append(&self, line: &str) {
        let Some(sink) = &self.sink else {
            return;
        };
        if let Ok(mut guard) = sink.lock() {
            if writeln!(guard, "{line}").is_err() {
                eprintln!(
                    "{} [{}] [LOGGER] Failed to write to log file",
                    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
                    LogLevel::Error.as_str()
                );
            }
        }
    }
}

fn open_log(file_path: &Path) -> Result<File> {
    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent).map_err(|err| {
            InfostampError::Filesystem(format!(
                "Failed to create log directory {}: {err}",
                parent.display()
            ))
        })?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(file_path)
        .map_err(|err| {
            InfostampError::Filesystem(format!(
                "Failed to open log file {}: {err}",
                file_path.display()
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_land_in_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("run.log");
        let logger = Logger::new(Some(path.clone()), false).unwrap();

        logger.debug("RESOLVE", "no tags");
        logger.announce("  - Generating metadata for views_bulk");
        logger.finalize().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[DEBUG] [RESOLVE] no tags"));
        assert!(contents.contains("[INFO] [PROGRESS] - Generating metadata for views_bulk"));
    }
}
