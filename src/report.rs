/*============================================================
  Synavera Project: Infostamp
  Module: infostamp::report
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Persist a machine-readable record of one stamping run for
    install pipelines that audit generated metadata.

  Security / Safety Notes:
    Written to operator-chosen paths only; no descriptor
    contents are included.

  Dependencies:
    serde_json for serialization, chrono for timestamps.

  Operational Scope:
    Emitted when `--report` is given on the command line.

  Revision History:
    2026-10-18 COD  Adapted manifest writer into run report.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Explicit attribution of generator and mode
============================================================*/

use std::fs::File;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::error::{InfostampError, Result};
use crate::package::PackageContext;
use crate::stamp::StampOutcome;

#[derive(Debug, Serialize)]
pub struct ReportDocument<'a> {
    pub metadata: ReportMetadata,
    pub package: &'a PackageContext,
    pub outcome: &'a StampOutcome,
}

#[derive(Debug, Serialize)]
pub struct ReportMetadata {
    pub generated_at: String,
    pub generated_by: String,
    pub dry_run: bool,
}

impl<'a> ReportDocument<'a> {
    pub fn new(package: &'a PackageContext, outcome: &'a StampOutcome, dry_run: bool) -> Self {
        Self {
            metadata: ReportMetadata {
                generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
                generated_by: concat!("infostamp ", env!("CARGO_PKG_VERSION")).to_string(),
                dry_run,
            },
            package,
            outcome,
        }
    }
}

/// Write the report as pretty JSON, creating parent directories.
pub fn write_report(document: &ReportDocument<'_>, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|err| {
            InfostampError::Filesystem(format!(
                "Failed to create report directory {}: {err}",
                parent.display()
            ))
        })?;
    }
    let file = File::create(path).map_err(|err| {
        InfostampError::Filesystem(format!(
            "Failed to create report file {}: {err}",
            path.display()
        ))
    })?;
    serde_json::to_writer_pretty(file, document).map_err(|err| {
        InfostampError::Serialization(format!(
            "Failed to write report {}: {err}",
            path.display()
        ))
    })?;
    Ok(())
}
