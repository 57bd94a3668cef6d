//! # comply-cli
//!
//! Binary entry point for beacon-comply.
//!
//! This crate provides:
//! - CLI argument parsing using `clap`
//! - Configuration loading, flag overrides and validation
//! - Fixture acquisition from a local tree or a remote archive
//! - Streaming of case results and the process exit contract

mod archive;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use comply_client::HttpBeaconClient;
use comply_core::config::TARGET_ENV;
use comply_core::report::{format_case, format_summary};
use comply_core::{ComplyConfig, RunSummary, Scheduler, load_fixtures};
use std::io::{IsTerminal, stdout};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Default configuration file, read when present.
const DEFAULT_CONFIG: &str = "comply.yml";

/// Color output mode for terminal display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorMode {
    /// Automatically detect if stdout is a TTY
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl ColorMode {
    /// Returns true if colors should be used based on mode and terminal detection.
    fn should_use_colors(self) -> bool {
        match self {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => stdout().is_terminal(),
        }
    }
}

/// beacon-comply - Conformance test runner for the Ethereum beacon-node API
#[derive(Parser, Debug)]
#[command(name = "beacon-comply", version, about)]
struct Cli {
    /// Path to configuration file [default: comply.yml, if present]
    #[arg(short, long)]
    config: Option<PathBuf>,

    // ─────────────────────────────────────────────────────────────────────────
    // Fixture source
    // ─────────────────────────────────────────────────────────────────────────
    /// Path to a directory tree with test cases
    #[arg(long, alias = "testsRoot")]
    tests_root: Option<PathBuf>,

    /// URL of a ZIP file containing a directory tree with test cases
    #[arg(long, alias = "testsRemote")]
    tests_remote: Option<String>,

    /// Directory where archives are downloaded and unpacked
    #[arg(long, alias = "outDir")]
    out_dir: Option<PathBuf>,

    // ─────────────────────────────────────────────────────────────────────────
    // Execution
    // ─────────────────────────────────────────────────────────────────────────
    /// URL of the node under test, e.g. http://localhost:5051
    #[arg(long)]
    target: Option<String>,

    /// Deadline for the run, e.g. 3600s, 1.5h, 1h30m, 500ms
    ///
    /// Units: ns, us, ms, s, m, h. Counted from the first case launch, so
    /// fetching and unpacking remote fixtures is not included.
    #[arg(long)]
    timeout: Option<String>,

    /// Only run cases whose route starts with this prefix, e.g. /eth/v1/node
    #[arg(long)]
    subset: Option<String>,

    /// Exit 0 even when cases fail
    #[arg(long, alias = "failSilent")]
    fail_silent: bool,

    /// Delay between readiness polls, e.g. 500ms
    #[arg(long, alias = "pollInterval")]
    poll_interval: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // Output
    // ─────────────────────────────────────────────────────────────────────────
    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Color output mode (auto, always, never)
    #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
    color: ColorMode,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the result stream.
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let use_colors = cli.color.should_use_colors();
    let config = load_config(cli)?;

    let warnings = config
        .validate()
        .context("Configuration validation failed")?;
    for warning in &warnings {
        eprintln!("{warning}");
    }

    let summary = run(&config, use_colors).await?;
    let exit_code = exit_code(&summary, config.fail_silent);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}

/// File config, then CLI flags, then the environment for the target.
fn load_config(cli: Cli) -> Result<ComplyConfig> {
    let mut config = match &cli.config {
        Some(path) => ComplyConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG);
            if default_path.exists() {
                ComplyConfig::from_file(&default_path)
                    .with_context(|| format!("Failed to load config from {:?}", default_path))?
            } else {
                debug!("No {} found, using defaults", DEFAULT_CONFIG);
                ComplyConfig::default()
            }
        }
    };

    apply_overrides(&mut config, cli);
    config.resolve_target(std::env::var(TARGET_ENV).ok());
    Ok(config)
}

fn apply_overrides(config: &mut ComplyConfig, cli: Cli) {
    if let Some(target) = cli.target {
        config.target = Some(target);
    }
    if let Some(root) = cli.tests_root {
        config.tests_root = Some(root);
    }
    if let Some(remote) = cli.tests_remote {
        config.tests_remote = Some(remote);
    }
    if let Some(dir) = cli.out_dir {
        config.out_dir = dir;
    }
    if let Some(timeout) = cli.timeout {
        config.timeout = timeout;
    }
    if let Some(subset) = cli.subset {
        config.subset = subset;
    }
    if let Some(poll) = cli.poll_interval {
        config.poll_interval = poll;
    }
    if cli.fail_silent {
        config.fail_silent = true;
    }
}

/// Local tree when configured, otherwise the unpacked remote archive.
async fn fixture_root(config: &ComplyConfig) -> Result<PathBuf> {
    if let Some(root) = &config.tests_root {
        return Ok(root.clone());
    }
    let remote = config
        .tests_remote
        .as_deref()
        .context("No fixture source configured")?;
    archive::load_remote(remote, &config.out_dir)
        .await
        .with_context(|| format!("Failed to fetch fixtures from {remote}"))
}

async fn run(config: &ComplyConfig, use_colors: bool) -> Result<RunSummary> {
    let timeout = config.timeout_duration()?;
    let poll_interval = config.poll_interval_duration()?;

    let root = fixture_root(config).await?;
    let cases = load_fixtures(&root)
        .with_context(|| format!("Failed to load fixtures from {}", root.display()))?;
    info!(count = cases.len(), root = %root.display(), "Loaded fixtures");

    let client = HttpBeaconClient::from_url(config.target_url()?)
        .context("Failed to create target client")?;
    let scheduler = Scheduler::new(Arc::new(client), timeout)
        .with_subset(config.subset.clone())
        .with_poll_interval(poll_interval);

    let cancel = scheduler.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling outstanding cases...");
            cancel.cancel();
        }
    });

    let specs = cases.into_iter().map(|loaded| loaded.spec).collect();
    let summary = scheduler
        .run(specs, |case| println!("{}", format_case(case, use_colors)))
        .await;
    println!("{}", format_summary(&summary, use_colors));
    Ok(summary)
}

/// 0 when every executed case succeeded or failures are silenced, 1 otherwise.
fn exit_code(summary: &RunSummary, fail_silent: bool) -> i32 {
    if summary.has_failures() && !fail_silent {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["beacon-comply"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    #[test]
    fn test_exit_code() {
        let clean = RunSummary {
            passed: 3,
            failed: 0,
            skipped: 2,
        };
        let failing = RunSummary {
            passed: 3,
            failed: 1,
            skipped: 0,
        };
        assert_eq!(exit_code(&clean, false), 0);
        assert_eq!(exit_code(&failing, false), 1);
        assert_eq!(exit_code(&failing, true), 0);
    }

    #[test]
    fn test_flags_override_config() {
        let mut config = ComplyConfig {
            target: Some("http://from-file:5051".to_string()),
            timeout: "1h".to_string(),
            ..ComplyConfig::default()
        };
        let cli = parse(&[
            "--target",
            "http://from-flag:5051",
            "--subset",
            "/eth/v1/node",
            "--fail-silent",
        ]);
        apply_overrides(&mut config, cli);

        assert_eq!(config.target.as_deref(), Some("http://from-flag:5051"));
        assert_eq!(config.subset, "/eth/v1/node");
        assert_eq!(config.timeout, "1h");
        assert!(config.fail_silent);
    }

    #[test]
    fn test_camel_case_aliases() {
        let cli = parse(&[
            "--testsRoot",
            "/fixtures",
            "--outDir",
            "/out",
            "--failSilent",
            "--pollInterval",
            "250ms",
        ]);
        assert_eq!(cli.tests_root, Some(PathBuf::from("/fixtures")));
        assert_eq!(cli.out_dir, Some(PathBuf::from("/out")));
        assert!(cli.fail_silent);
        assert_eq!(cli.poll_interval.as_deref(), Some("250ms"));
    }

    #[tokio::test]
    async fn test_local_root_wins_over_remote() {
        let config = ComplyConfig {
            tests_root: Some(PathBuf::from("/fixtures")),
            tests_remote: Some("http://127.0.0.1:9/never-fetched.zip".to_string()),
            ..ComplyConfig::default()
        };
        assert_eq!(
            fixture_root(&config).await.unwrap(),
            PathBuf::from("/fixtures")
        );
    }

    #[test]
    fn test_color_mode_explicit() {
        assert!(ColorMode::Always.should_use_colors());
        assert!(!ColorMode::Never.should_use_colors());
    }
}
