/*============================================================
  Synavera Project: Infostamp
  Module: infostamp::main
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Entry point for Infostamp. Takes the package context an
    install/update event carries, resolves the snapshot's dev
    version and stamps it into the package descriptors.

  Security / Safety Notes:
    Operates within user privileges. Executes `git describe`
    and rewrites descriptor files under the install path only.

  Dependencies:
    clap for CLI parsing, chrono for session stamps.

  Operational Scope:
    Invoked by package-manager hooks after a Drupal extension
    is installed or updated from a dev branch.

  Revision History:
    2026-10-18 COD  Authored Infostamp runtime.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Result-first error handling with deterministic exits
    - Structured logging following Synavera cadence
    - Configurable execution via CLI and config file
============================================================*/

mod config;
mod descriptor;
mod error;
mod git;
mod logger;
mod package;
mod report;
mod stamp;
mod version;

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Utc;
use clap::{ArgAction, Parser};

use config::InfostampConfig;
use error::Result;
use logger::Logger;
use package::{ExtraMetadata, PackageContext};
use report::{write_report, ReportDocument};
use stamp::{generate_metadata, StampOutcome, StampSettings};
use version::DescribeOptions;

/// Command-line arguments for Infostamp.
#[derive(Debug, Parser)]
#[command(
    name = "infostamp",
    version,
    about = "Stamp version metadata into descriptors of Drupal dev snapshots"
)]
struct Cli {
    /// Package name as declared by the package manager, e.g. `drupal/token`.
    #[arg(long)]
    name: String,
    /// Package type, e.g. `drupal-module`.
    #[arg(long = "type", value_name = "TYPE")]
    kind: String,
    /// Pretty version of the installed package, e.g. `dev-1.x`.
    #[arg(long, value_name = "VERSION")]
    pretty_version: String,
    /// Directory the package was installed into.
    #[arg(long, value_name = "PATH")]
    install_path: PathBuf,
    /// Core major version; detected from repository URLs when omitted.
    #[arg(long, value_name = "MAJOR")]
    core: Option<String>,
    /// Repository URL consulted for core detection.
    #[arg(long = "repository-url", value_name = "URL", action = ArgAction::Append)]
    repository_urls: Vec<String>,
    /// Author-declared version (`extra.drupal.version`).
    #[arg(long, value_name = "VERSION")]
    extra_version: Option<String>,
    /// Author-declared datestamp (`extra.drupal.datestamp`).
    #[arg(long, value_name = "EPOCH")]
    extra_datestamp: Option<i64>,
    /// Override configuration file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Explicit log file path.
    #[arg(long, value_name = "PATH")]
    log: Option<PathBuf>,
    /// Write a JSON report of the run.
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,
    /// Resolve and render without touching any file.
    #[arg(long, action = ArgAction::SetTrue)]
    dry_run: bool,
    /// Enable verbose logging to stderr.
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("[infostamp] {}", err);
            err.exit_code()
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = InfostampConfig::load_from_optional_path(cli.config.as_deref())?;
    let core_major = config.core_major(cli.core.as_deref(), &cli.repository_urls)?;

    let session_stamp = Utc::now().format("%Y-%m-%d_%H-%M-%S").to_string();
    let log_path = cli.log.clone().or_else(|| {
        config
            .log_dir()
            .map(|dir| dir.join(format!("infostamp_{session_stamp}.log")))
    });
    let logger = Logger::new(log_path, cli.verbose)?;
    logger.debug("INIT", format!("Core context {core_major}.x"));

    let install_path = if cli.install_path.is_absolute() {
        cli.install_path.clone()
    } else {
        std::env::current_dir()?.join(&cli.install_path)
    };

    let ctx = PackageContext {
        name: cli.name,
        kind: cli.kind,
        pretty_version: cli.pretty_version,
        install_path,
        core_major,
        extra: ExtraMetadata {
            version: cli.extra_version,
            datestamp: cli.extra_datestamp,
        },
    };

    let settings = StampSettings {
        describe: DescribeOptions {
            binary: config.git.binary.clone(),
            timeout: config.describe_timeout(),
        },
        tool_name: config.output.tool_name.clone(),
        dry_run: cli.dry_run,
    };

    let outcome = match generate_metadata(&ctx, &settings, &logger).await {
        Ok(outcome) => outcome,
        Err(err) => {
            logger.error("STAMP", format!("{}: {err}", ctx.name));
            logger.finalize()?;
            return Err(err);
        }
    };

    if cli.dry_run {
        print_dry_run(&outcome);
    }

    if let Some(path) = cli.report.as_deref() {
        write_report(&ReportDocument::new(&ctx, &outcome, cli.dry_run), path)?;
        logger.info("REPORT", format!("Report written to {}", path.display()));
    }

    logger.finalize()?;
    Ok(ExitCode::SUCCESS)
}

fn print_dry_run(outcome: &StampOutcome) {
    match outcome {
        StampOutcome::Skipped { reason } => println!("→ Dry-run. Skipped: {reason}"),
        StampOutcome::Stamped { block, .. } => {
            println!(
                "→ Dry-run. {} files would receive:",
                block.format.file_glob()
            );
            print!("{}", block.render());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn repeated_repository_urls_accumulate() {
        let cli = Cli::try_parse_from([
            "infostamp",
            "--name",
            "drupal/token",
            "--type",
            "drupal-module",
            "--pretty-version",
            "dev-1.x",
            "--install-path",
            "web/modules/contrib/token",
            "--repository-url",
            "https://asset-packagist.org",
            "--repository-url",
            "https://packages.drupal.org/8",
        ])
        .unwrap();
        assert_eq!(cli.repository_urls.len(), 2);
        assert_eq!(cli.kind, "drupal-module");
        assert!(!cli.dry_run);
    }

    #[test]
    fn missing_install_path_flag_is_rejected() {
        let err = Cli::try_parse_from(["infostamp", "--name", "drupal/token"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
