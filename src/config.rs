/*============================================================
  Synavera Project: Infostamp
  Module: infostamp::config
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Load operator configuration and derive the core major
    version context shared by every stamping operation.

  Security / Safety Notes:
    Reads a single TOML file from operator-controlled paths;
    no values are executed apart from the git binary name.

  Dependencies:
    serde + toml for parsing, dirs for XDG locations,
    regex for repository URL inspection.

  Operational Scope:
    Loaded once per run by the binary entry point and threaded
    explicitly into the pipeline.

  Revision History:
    2026-10-18 COD  Authored Infostamp configuration layer.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Defaults usable without any config file present
    - Validation at load time with explicit errors
============================================================*/

use std::path::{Path, PathBuf};
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::error::{InfostampError, Result};

const CONFIG_DIR: &str = "infostamp";
const CONFIG_FILE: &str = "config.toml";
const DEFAULT_CORE: &str = "9";
const DEFAULT_TOOL_NAME: &str = "infostamp";

static CORE_FROM_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"packages\.drupal\.org/(\d+)").expect("core URL pattern is valid")
});

/// Top-level configuration document.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InfostampConfig {
    /// Core major used when neither `--core` nor a repository URL decides it.
    pub default_core: String,
    /// Repository URLs inspected for a `packages.drupal.org/<N>` endpoint.
    pub repositories: Vec<String>,
    pub log_dir: Option<PathBuf>,
    pub git: GitConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    pub binary: String,
    /// Seconds allowed for `git describe` before falling back.
    pub describe_timeout: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Name written into the provenance comment of every block.
    pub tool_name: String,
}

impl Default for InfostampConfig {
    fn default() -> Self {
        Self {
            default_core: DEFAULT_CORE.to_string(),
            repositories: Vec::new(),
            log_dir: None,
            git: GitConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            binary: "git".to_string(),
            describe_timeout: 10,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            tool_name: DEFAULT_TOOL_NAME.to_string(),
        }
    }
}

impl InfostampConfig {
    /// Load from an explicit path, or from the XDG location when none is given.
    ///
    /// An explicit path must exist; the XDG file is optional.
    pub fn load_from_optional_path(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(explicit) => Self::load(explicit)?,
            None => match default_config_path() {
                Some(candidate) if candidate.is_file() => Self::load(&candidate)?,
                _ => Self::default(),
            },
        };
        config.validate()?;
        Ok(config)
    }

    fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            InfostampError::Config(format!(
                "Failed to read config file {}: {err}",
                path.display()
            ))
        })?;
        Self::from_toml(&raw).map_err(|err| match err {
            InfostampError::Config(msg) => {
                InfostampError::Config(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|err| InfostampError::Config(err.to_string()))
    }

    fn validate(&self) -> Result<()> {
        if self.git.binary.trim().is_empty() {
            return Err(InfostampError::Config("git.binary must not be empty".into()));
        }
        if self.git.describe_timeout == 0 {
            return Err(InfostampError::Config(
                "git.describe_timeout must be at least one second".into(),
            ));
        }
        parse_core(&self.default_core)?;
        Ok(())
    }

    pub fn describe_timeout(&self) -> Duration {
        Duration::from_secs(self.git.describe_timeout)
    }

    pub fn log_dir(&self) -> Option<PathBuf> {
        self.log_dir.clone()
    }

    /// Decide the core major for this run: explicit override, then configured
    /// and CLI repository URLs, then `default_core`.
    pub fn core_major(&self, explicit: Option<&str>, extra_urls: &[String]) -> Result<String> {
        if let Some(core) = explicit {
            return parse_core(core);
        }
        let urls = extra_urls.iter().chain(self.repositories.iter());
        if let Some(core) = detect_core_major(urls) {
            return Ok(core);
        }
        parse_core(&self.default_core)
    }
}

/// Extract the major from the first URL of the form `…packages.drupal.org/<N>…`.
pub fn detect_core_major<I, S>(urls: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    urls.into_iter().find_map(|url| {
        CORE_FROM_URL
            .captures(url.as_ref())
            .map(|caps| caps[1].to_string())
    })
}

fn parse_core(value: &str) -> Result<String> {
    let trimmed = value.trim().trim_end_matches(".x");
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        Ok(trimmed.to_string())
    } else {
        Err(InfostampError::Config(format!(
            "Core major `{value}` is not a number"
        )))
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}
