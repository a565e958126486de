/*============================================================
  Synavera Project: Infostamp
  Module: infostamp::package
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Per-package context handed over by the install event and
    the naming rules derived from it (project, branch prefix,
    fallback dev version).

  Security / Safety Notes:
    Pure data and string derivation; no I/O performed here.

  Dependencies:
    serde for report serialization.

  Operational Scope:
    Built once per installed package and dropped after the
    stamping pass completes.

  Revision History:
    2026-10-18 COD  Introduced PackageContext.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Clear data contracts between modules
============================================================*/

use std::path::PathBuf;

use serde::Serialize;

const STAMPED_TYPE_PREFIX: &str = "drupal-";
const DEV_PREFIX: &str = "dev-";
const VENDOR_PREFIX: &str = "drupal/";

/// Author-declared metadata from the package's `extra.drupal` section.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtraMetadata {
    pub version: Option<String>,
    pub datestamp: Option<i64>,
}

/// Everything known about one installed package for the duration of a run.
#[derive(Debug, Clone, Serialize)]
pub struct PackageContext {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub pretty_version: String,
    pub install_path: PathBuf,
    pub core_major: String,
    pub extra: ExtraMetadata,
}

impl PackageContext {
    /// Only Drupal extensions installed from a `dev-` branch carry generated metadata.
    pub fn is_stampable(&self) -> bool {
        self.kind.starts_with(STAMPED_TYPE_PREFIX) && self.pretty_version.starts_with(DEV_PREFIX)
    }

    /// Project machine name: the package name without its `drupal/` vendor.
    pub fn project(&self) -> &str {
        self.name
            .strip_prefix(VENDOR_PREFIX)
            .unwrap_or(&self.name)
    }

    /// Release line this snapshot belongs to, e.g. `dev-1.x` on core 9 gives `9.x-1`.
    pub fn branch_prefix(&self) -> String {
        let branch = self
            .pretty_version
            .strip_prefix(DEV_PREFIX)
            .unwrap_or(&self.pretty_version);
        let branch = branch.strip_suffix(".x").unwrap_or(branch);

        if is_core_qualified(branch) {
            branch.to_string()
        } else {
            format!("{}.x-{branch}", self.core_major)
        }
    }

    /// Version used when tag history cannot be resolved, e.g. `9.x-1.x-dev`.
    pub fn fallback_version(&self) -> String {
        format!("{}.x-dev", self.branch_prefix())
    }

    /// The author-declared version override, ignoring blank values.
    pub fn version_override(&self) -> Option<&str> {
        self.extra
            .version
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

/// `8.x-2` style branches already name their core line.
fn is_core_qualified(branch: &str) -> bool {
    match branch.split_once(".x-") {
        Some((core, rest)) => {
            !core.is_empty() && core.chars().all(|c| c.is_ascii_digit()) && !rest.is_empty()
        }
        None => false,
    }
}

#[cfg(test)]
pub(crate) fn sample(pretty_version: &str, core: &str) -> PackageContext {
    PackageContext {
        name: "drupal/views_bulk".into(),
        kind: "drupal-module".into(),
        pretty_version: pretty_version.into(),
        install_path: PathBuf::from("/srv/site/modules/contrib/views_bulk"),
        core_major: core.into(),
        extra: ExtraMetadata::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_dev_branch_is_qualified_with_core() {
        let ctx = sample("dev-1.x", "9");
        assert_eq!(ctx.branch_prefix(), "9.x-1");
        assert_eq!(ctx.fallback_version(), "9.x-1.x-dev");
    }

    #[test]
    fn core_qualified_branch_kept_as_is() {
        let ctx = sample("dev-8.x-2.x", "9");
        assert_eq!(ctx.branch_prefix(), "8.x-2");
        assert_eq!(ctx.fallback_version(), "8.x-2.x-dev");
    }

    #[test]
    fn project_strips_vendor_only_when_drupal() {
        let mut ctx = sample("dev-1.x", "9");
        assert_eq!(ctx.project(), "views_bulk");
        ctx.name = "acme/views_bulk".into();
        assert_eq!(ctx.project(), "acme/views_bulk");
    }

    #[test]
    fn eligibility_requires_drupal_type_and_dev_version() {
        let mut ctx = sample("dev-1.x", "9");
        assert!(ctx.is_stampable());
        ctx.pretty_version = "1.4.0".into();
        assert!(!ctx.is_stampable());
        ctx.pretty_version = "dev-1.x".into();
        ctx.kind = "library".into();
        assert!(!ctx.is_stampable());
    }

    #[test]
    fn blank_override_is_ignored() {
        let mut ctx = sample("dev-1.x", "9");
        ctx.extra.version = Some("  ".into());
        assert_eq!(ctx.version_override(), None);
        ctx.extra.version = Some("9.x-1.0".into());
        assert_eq!(ctx.version_override(), Some("9.x-1.0"));
    }
}
