//! Analyze command implementation

use anyhow::{Context, Result};
use console::style;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::{ProjectConfig, UserConfig};
use crate::discovery::collect_targets;
use crate::models::{BatchReport, Severity};
use crate::pipeline::Analyzer;
use crate::reporters::{report_with_format, OutputFormat};
use crate::scoring::RoundingMode;

/// Command-line overrides for one `analyze` run
#[derive(Debug, Default)]
pub struct AnalyzeOptions {
    pub paths: Vec<PathBuf>,
    pub format: Option<String>,
    pub output: Option<PathBuf>,
    /// `Some(true)` forces advisory on, `Some(false)` forces it off
    pub advisory: Option<bool>,
    pub advisory_backend: Option<String>,
    pub advisory_timeout: Option<u64>,
    pub fail_on: Option<String>,
    pub rounding: Option<RoundingMode>,
    pub disable_rule: Vec<String>,
}

/// Run the analyze command
pub fn run(config: ProjectConfig, options: AnalyzeOptions) -> Result<()> {
    let (config, format, fail_on) = resolve(config, &options)?;

    let files = collect_targets(&options.paths)?;
    if files.is_empty() {
        warn!("No Dockerfiles or YAML manifests found");
    }
    info!("Scanning {} files", files.len());

    let user = UserConfig::load()?;
    let analyzer = Analyzer::from_config(&config, &user);
    let report = analyzer.analyze_paths(&files);

    let rendered = report_with_format(&report, format)?;
    match &options.output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            eprintln!(
                "{} Report written to {}",
                style("✓").green(),
                path.display()
            );
        }
        None => print!("{}", rendered),
    }

    check_fail_threshold(fail_on, &report);
    Ok(())
}

/// Merge CLI flags over the project config; flags win
fn resolve(
    mut config: ProjectConfig,
    options: &AnalyzeOptions,
) -> Result<(ProjectConfig, OutputFormat, Option<Severity>)> {
    if let Some(rounding) = options.rounding {
        config.scoring.rounding = rounding;
    }
    config
        .rules
        .disabled
        .extend(options.disable_rule.iter().cloned());
    if let Some(enabled) = options.advisory {
        config.advisory.enabled = enabled;
    }
    if let Some(backend) = &options.advisory_backend {
        config.advisory.backend = Some(backend.clone());
    }
    if let Some(secs) = options.advisory_timeout {
        config.advisory.timeout_secs = secs;
    }

    let format: OutputFormat = options
        .format
        .as_deref()
        .or(config.defaults.format.as_deref())
        .unwrap_or("text")
        .parse()?;

    let fail_on = options
        .fail_on
        .as_deref()
        .or(config.defaults.fail_on.as_deref())
        .map(str::parse::<Severity>)
        .transpose()
        .context("Invalid fail_on severity")?;

    Ok((config, format, fail_on))
}

/// Exit with code 1 if a rule finding reaches the threshold
fn check_fail_threshold(fail_on: Option<Severity>, report: &BatchReport) {
    if let Some(threshold) = fail_on {
        if report.has_findings_at_or_above(threshold) {
            eprintln!("Failing due to --fail-on={} threshold", threshold.as_str().to_lowercase());
            std::process::exit(1);
        }
    }
}
