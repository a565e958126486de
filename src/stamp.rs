/*============================================================
  Synavera Project: Infostamp
  Module: infostamp::stamp
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Per-package stamping pass: eligibility, version
    resolution, block rendering and descriptor patching.

  Security / Safety Notes:
    Touches files only under the package install path and
    only outside dry-run mode.

  Dependencies:
    chrono for override-free datestamps, serde for reporting.

  Operational Scope:
    Invoked once per installed or updated package by the
    binary entry point.

  Revision History:
    2026-10-18 COD  Composed resolver and patcher pipeline.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Core context passed explicitly, no shared state
    - Silent fallback for versions, loud failure for paths
============================================================*/

use chrono::Utc;
use serde::Serialize;

use crate::descriptor::{patch, MetadataBlock, PatchReport};
use crate::error::Result;
use crate::logger::Logger;
use crate::package::PackageContext;
use crate::version::{resolve, DescribeOptions, ResolvedVersion};

/// Run-wide knobs for the stamping pass.
#[derive(Debug, Clone)]
pub struct StampSettings {
    pub describe: DescribeOptions,
    pub tool_name: String,
    pub dry_run: bool,
}

/// What happened to one package.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StampOutcome {
    Skipped {
        reason: String,
    },
    Stamped {
        resolved: ResolvedVersion,
        block: MetadataBlock,
        /// `None` in dry-run mode.
        patch: Option<PatchReport>,
    },
}

/// Generate and inject metadata for `ctx`.
pub async fn generate_metadata(
    ctx: &PackageContext,
    settings: &StampSettings,
    logger: &Logger,
) -> Result<StampOutcome> {
    if !ctx.is_stampable() {
        let reason = format!(
            "{} ({} {}) is not a Drupal dev snapshot",
            ctx.name, ctx.kind, ctx.pretty_version
        );
        logger.debug("SKIP", &reason);
        return Ok(StampOutcome::Skipped { reason });
    }

    let project = ctx.project();
    logger.announce(format!("  - Generating metadata for {project}"));

    let branch = ctx.branch_prefix();
    let mut resolved = match ctx.version_override() {
        Some(version) => {
            logger.debug("RESOLVE", format!("{project} declares version {version}"));
            ResolvedVersion {
                version: version.to_string(),
                branch,
                datestamp: Utc::now().timestamp(),
            }
        }
        None => {
            let fallback = ctx.fallback_version();
            resolve(&ctx.install_path, &branch, &fallback, &settings.describe, logger).await
        }
    };
    if let Some(datestamp) = ctx.extra.datestamp {
        resolved.datestamp = datestamp;
    }

    let block = MetadataBlock::for_core(
        project,
        &resolved.version,
        resolved.datestamp,
        &ctx.core_major,
        &settings.tool_name,
    );

    if settings.dry_run {
        logger.info(
            "DRYRUN",
            format!("{project} would receive version {}", resolved.version),
        );
        return Ok(StampOutcome::Stamped {
            resolved,
            block,
            patch: None,
        });
    }

    let report = patch(
        &ctx.install_path,
        block.format.file_glob(),
        block.format.exclude_marker(),
        &block,
        logger,
    )?;

    logger.info(
        "STAMP",
        format!(
            "{project} {}: patched={} skipped={} failed={}",
            resolved.version,
            report.patched,
            report.skipped,
            report.failed.len()
        ),
    );
    if !report.failed.is_empty() {
        logger.warn(
            "STAMP",
            format!(
                "{} descriptor(s) of {project} could not be updated",
                report.failed.len()
            ),
        );
    }

    Ok(StampOutcome::Stamped {
        resolved,
        block,
        patch: Some(report),
    })
}
