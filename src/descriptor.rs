/*============================================================
  Synavera Project: Infostamp
  Module: infostamp::descriptor
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Render metadata blocks and rewrite descriptor files so
    they carry the resolved project, version and datestamp.

  Security / Safety Notes:
    Rewrites files in place under the package install root
    only. Content is transformed in memory and written once.

  Dependencies:
    glob for file name matching, regex for field stripping,
    chrono for the provenance date.

  Operational Scope:
    Applied to every `.info` / `.info.yml` file of a package
    after its version has been resolved.

  Revision History:
    2026-10-18 COD  Authored descriptor patcher.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Single-write rewrites, no partial-failure window
    - Per-file failures reported, remaining files processed
============================================================*/

use std::fs;
use std::path::{Path, PathBuf};

use chrono::DateTime;
use glob::Pattern;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::error::{InfostampError, Result};
use crate::logger::Logger;

static STRUCTURED_OWNED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:version|project)[ \t]*:.*(?:\r?\n|$)")
        .expect("structured field pattern is valid")
});

static LEGACY_OWNED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:version|project)[ \t]*=.*(?:\r?\n|$)")
        .expect("legacy field pattern is valid")
});

/// Descriptor syntax family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptorFormat {
    /// Flat `key = "value"` files named `*.info`.
    Legacy,
    /// YAML `key: "value"` files named `*.info.yml`.
    Structured,
}

impl DescriptorFormat {
    /// Cores up to 7 ship `.info` files; later cores use `.info.yml`.
    pub fn for_core(core_major: &str) -> Self {
        match core_major.parse::<u32>() {
            Ok(major) if major <= 7 => DescriptorFormat::Legacy,
            _ => DescriptorFormat::Structured,
        }
    }

    pub fn file_glob(self) -> &'static str {
        match self {
            DescriptorFormat::Legacy => "*.info",
            DescriptorFormat::Structured => "*.info.yml",
        }
    }

    /// Substring marking a file that already carries generated metadata.
    pub fn exclude_marker(self) -> &'static str {
        match self {
            DescriptorFormat::Legacy => "datestamp =",
            DescriptorFormat::Structured => "datestamp:",
        }
    }

    fn comment_prefix(self) -> char {
        match self {
            DescriptorFormat::Legacy => ';',
            DescriptorFormat::Structured => '#',
        }
    }

    fn owned_fields(self) -> &'static Regex {
        match self {
            DescriptorFormat::Legacy => &*LEGACY_OWNED,
            DescriptorFormat::Structured => &*STRUCTURED_OWNED,
        }
    }
}

/// Generated metadata for one package, ready to be appended to descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataBlock {
    pub format: DescriptorFormat,
    pub project: String,
    pub version: String,
    pub datestamp: i64,
    pub core: Option<String>,
    pub tool: String,
}

impl MetadataBlock {
    /// Block for `.info.yml` files. Core 8 descriptors still declare `core`.
    pub fn structured(project: &str, version: &str, datestamp: i64, core_major: &str, tool: &str) -> Self {
        Self {
            format: DescriptorFormat::Structured,
            project: project.to_string(),
            version: version.to_string(),
            datestamp,
            core: (core_major == "8").then(|| "8.x".to_string()),
            tool: tool.to_string(),
        }
    }

    /// Block for `.info` files; `core` is derived from the version, or from
    /// `core_major` when the version has no leading numeral.
    pub fn legacy(project: &str, version: &str, datestamp: i64, core_major: &str, tool: &str) -> Self {
        let core = legacy_core(version).unwrap_or_else(|| format!("{core_major}.x"));
        Self {
            format: DescriptorFormat::Legacy,
            project: project.to_string(),
            version: version.to_string(),
            datestamp,
            core: Some(core),
            tool: tool.to_string(),
        }
    }

    pub fn for_core(project: &str, version: &str, datestamp: i64, core_major: &str, tool: &str) -> Self {
        match DescriptorFormat::for_core(core_major) {
            DescriptorFormat::Legacy => Self::legacy(project, version, datestamp, core_major, tool),
            DescriptorFormat::Structured => {
                Self::structured(project, version, datestamp, core_major, tool)
            }
        }
    }

    /// Render the block text, newline-terminated, without the leading blank line.
    pub fn render(&self) -> String {
        let date = DateTime::from_timestamp(self.datestamp, 0)
            .map(|at| at.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "1970-01-01".to_string());

        let mut out = format!(
            "{} Information added by {} on {date}\n",
            self.format.comment_prefix(),
            self.tool
        );
        let datestamp = self.datestamp.to_string();
        let fields: Vec<(&str, &str)> = match self.format {
            DescriptorFormat::Structured => {
                let mut fields = vec![
                    ("project", self.project.as_str()),
                    ("version", self.version.as_str()),
                ];
                if let Some(core) = &self.core {
                    fields.push(("core", core.as_str()));
                }
                fields.push(("datestamp", datestamp.as_str()));
                fields
            }
            DescriptorFormat::Legacy => {
                let mut fields = vec![("version", self.version.as_str())];
                if let Some(core) = &self.core {
                    fields.push(("core", core.as_str()));
                }
                fields.push(("project", self.project.as_str()));
                fields.push(("datestamp", datestamp.as_str()));
                fields
            }
        };

        for (key, value) in fields {
            let line = match self.format {
                DescriptorFormat::Structured => format!("{key}: \"{value}\"\n"),
                DescriptorFormat::Legacy => format!("{key} = \"{value}\"\n"),
            };
            out.push_str(&line);
        }
        out
    }
}

/// `"9.1.0"` gives `"9.x"`; `None` when the version does not start with a digit.
pub fn legacy_core(version: &str) -> Option<String> {
    let digits: String = version.chars().take_while(char::is_ascii_digit).collect();
    (!digits.is_empty()).then(|| format!("{digits}.x"))
}

/// Drop every author-declared `version` / `project` line, wherever it sits.
pub fn strip_owned_fields(contents: &str, format: DescriptorFormat) -> String {
    format.owned_fields().replace_all(contents, "").into_owned()
}

/// Final contents of a descriptor: owned fields removed, block appended after a blank line.
///
/// Files using CRLF keep CRLF for the appended lines.
pub fn stamp_contents(contents: &str, block: &MetadataBlock) -> String {
    let eol = if contents.contains("\r\n") { "\r\n" } else { "\n" };
    let mut out = strip_owned_fields(contents, block.format);
    if !out.is_empty() && !out.ends_with('\n') {
        out.push_str(eol);
    }
    out.push_str(eol);
    out.push_str(&block.render().replace('\n', eol));
    out
}

/// Counters for one patch pass.
#[derive(Debug, Default, Clone, Serialize)]
pub struct PatchReport {
    pub patched: usize,
    pub skipped: usize,
    pub failed: Vec<PathBuf>,
}

/// Patch every file under `directory` whose name matches `file_glob` and that
/// does not already contain `exclude_marker`.
pub fn patch(
    directory: &Path,
    file_glob: &str,
    exclude_marker: &str,
    block: &MetadataBlock,
    logger: &Logger,
) -> Result<PatchReport> {
    if !directory.is_dir() {
        return Err(InfostampError::Filesystem(format!(
            "Install path {} is not a readable directory",
            directory.display()
        )));
    }
    let pattern = Pattern::new(file_glob).map_err(|err| {
        InfostampError::Config(format!("Invalid descriptor pattern `{file_glob}`: {err}"))
    })?;

    let mut candidates = Vec::new();
    collect_matching(directory, &pattern, logger, &mut candidates)?;
    candidates.sort();

    let mut report = PatchReport::default();
    for path in candidates {
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) => {
                logger.warn(
                    "PATCH",
                    format!("Cannot read {}: {err}", path.display()),
                );
                report.failed.push(path);
                continue;
            }
        };

        if contents.contains(exclude_marker) {
            logger.debug(
                "PATCH",
                format!("{} already stamped; leaving untouched", path.display()),
            );
            report.skipped += 1;
            continue;
        }

        match fs::write(&path, stamp_contents(&contents, block)) {
            Ok(()) => {
                logger.debug("PATCH", format!("Stamped {}", path.display()));
                report.patched += 1;
            }
            Err(err) => {
                logger.warn(
                    "PATCH",
                    format!("Cannot write {}: {err}", path.display()),
                );
                report.failed.push(path);
            }
        }
    }

    Ok(report)
}

/// Recursive walk; hidden entries (`.git`, editor dot files) are never descended or matched.
fn collect_matching(
    dir: &Path,
    pattern: &Pattern,
    logger: &Logger,
    found: &mut Vec<PathBuf>,
) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|err| {
        InfostampError::Filesystem(format!("Failed to list {}: {err}", dir.display()))
    })?;

    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') {
            continue;
        }

        let file_type = entry.file_type()?;
        let path = entry.path();
        if file_type.is_dir() {
            if let Err(err) = collect_matching(&path, pattern, logger, found) {
                logger.warn("SCAN", format!("Skipping {}: {err}", path.display()));
            }
        } else if file_type.is_file() && pattern.matches(&name) {
            found.push(path);
        }
    }
    Ok(())
}
