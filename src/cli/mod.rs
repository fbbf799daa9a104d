//! CLI command definitions and handlers

mod analyze;
mod fix;
mod rules;

use crate::config::{load_config_file, load_project_config, ProjectConfig, UserConfig};
use crate::scoring::RoundingMode;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use std::path::{Path, PathBuf};

pub use analyze::AnalyzeOptions;
pub use fix::FixOptions;

/// containerguard - security checks and hardening for container build files
#[derive(Parser, Debug)]
#[command(name = "containerguard")]
#[command(
    version,
    about = "Scan Dockerfiles and Kubernetes Pod manifests for security misconfigurations and write hardened copies",
    after_help = "\
Examples:
  containerguard analyze Dockerfile             Score a single Dockerfile
  containerguard analyze . --format json        Scan a directory, JSON output
  containerguard analyze . --fail-on high       Exit code 1 on HIGH findings (CI mode)
  containerguard fix Dockerfile                 Write fixed_Dockerfile next to it
  containerguard fix k8s/ --dry-run             Show which fixes would apply
  containerguard rules                          List the rule catalog"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Project config file (default: ./containerguard.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze Dockerfiles and manifests and print a risk report
    #[command(after_help = "\
Examples:
  containerguard analyze .                            Scan the current directory
  containerguard analyze Dockerfile k8s/pod.yaml      Scan specific files
  containerguard analyze . --format csv -o report.csv Export findings as CSV
  containerguard analyze . --advisory                 Add LLM suggestions (needs an API key)
  containerguard analyze . --rounding half-even       Banker's rounding for .5 scores")]
    Analyze {
        /// Files or directories to scan
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Output format: text, txt, csv, json
        #[arg(long, short = 'f', value_parser = ["text", "txt", "csv", "json"])]
        format: Option<String>,

        /// Output file path (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Ask the configured LLM for extra suggestions
        #[arg(long, conflicts_with = "no_advisory")]
        advisory: bool,

        /// Never call the LLM, even if enabled in config
        #[arg(long)]
        no_advisory: bool,

        /// Advisory backend: openai, anthropic, ollama
        #[arg(long)]
        advisory_backend: Option<String>,

        /// Advisory request timeout in seconds
        #[arg(long)]
        advisory_timeout: Option<u64>,

        /// Exit with code 1 if findings at or above this severity exist
        #[arg(long, value_parser = ["high", "medium", "low"])]
        fail_on: Option<String>,

        /// Tie-break for scores landing on .5: half-up, half-even
        #[arg(long)]
        rounding: Option<RoundingMode>,

        /// Skip a rule by id (repeatable), see `containerguard rules`
        #[arg(long)]
        disable_rule: Vec<String>,
    },

    /// Write hardened copies of Dockerfiles and manifests
    #[command(after_help = "\
Examples:
  containerguard fix Dockerfile                  Writes fixed_Dockerfile
  containerguard fix . --output-dir hardened/    Write fixed_* files elsewhere
  containerguard fix Dockerfile --stdout         Print the fixed text
  containerguard fix Dockerfile --in-place       Overwrite the original")]
    Fix {
        /// Files or directories to fix
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Directory for fixed_* files (default: next to each input)
        #[arg(long, conflicts_with_all = ["in_place", "stdout"])]
        output_dir: Option<PathBuf>,

        /// Overwrite inputs instead of writing fixed_* copies
        #[arg(long, conflicts_with = "stdout")]
        in_place: bool,

        /// Print the fixed text instead of writing files (single input only)
        #[arg(long)]
        stdout: bool,

        /// List the fixes that would apply without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// List the rule catalog
    Rules,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show version info
    Version,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write an example containerguard.toml (or the user key file with --user)
    Init {
        /// Create ~/.config/containerguard/config.toml for API keys instead
        #[arg(long)]
        user: bool,

        /// Overwrite an existing containerguard.toml
        #[arg(long)]
        force: bool,
    },
    /// Show the effective configuration and config paths
    Show,
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Analyze {
            paths,
            format,
            output,
            advisory,
            no_advisory,
            advisory_backend,
            advisory_timeout,
            fail_on,
            rounding,
            disable_rule,
        } => {
            let config = load_settings(cli.config.as_deref())?;
            let advisory = if advisory {
                Some(true)
            } else if no_advisory {
                Some(false)
            } else {
                None
            };
            analyze::run(
                config,
                AnalyzeOptions {
                    paths,
                    format,
                    output,
                    advisory,
                    advisory_backend,
                    advisory_timeout,
                    fail_on,
                    rounding,
                    disable_rule,
                },
            )
        }

        Commands::Fix {
            paths,
            output_dir,
            in_place,
            stdout,
            dry_run,
        } => fix::run(FixOptions {
            paths,
            output_dir,
            in_place,
            stdout,
            dry_run,
        }),

        Commands::Rules => {
            let config = load_settings(cli.config.as_deref())?;
            rules::run(&config)
        }

        Commands::Config { action } => run_config_action(action, cli.config.as_deref()),

        Commands::Version => {
            println!("containerguard {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Project config from `--config` or the working directory
fn load_settings(explicit: Option<&Path>) -> Result<ProjectConfig> {
    match explicit {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Ok(load_config_file(path))
        }
        None => {
            let cwd = std::env::current_dir().context("Failed to read current directory")?;
            Ok(load_project_config(&cwd))
        }
    }
}

fn project_config_target(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(crate::config::PROJECT_CONFIG_FILE))
}

fn run_config_action(action: ConfigAction, explicit: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Init { user: true, .. } => {
            let path = UserConfig::init_user_config()?;
            println!(
                "{} User config at: {}",
                style("✓").green(),
                path.display()
            );
            println!("\nAdd your API key there, or set one of:");
            println!("  export OPENAI_API_KEY=sk-...");
            println!("  export ANTHROPIC_API_KEY=sk-ant-...");
            Ok(())
        }
        ConfigAction::Init { user: false, force } => {
            let path = project_config_target(explicit);
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            std::fs::write(&path, crate::config::EXAMPLE_CONFIG)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("{} Created {}", style("✓").green(), path.display());
            Ok(())
        }
        ConfigAction::Show => show_config(explicit),
    }
}

fn show_config(explicit: Option<&Path>) -> Result<()> {
    let project_path = project_config_target(explicit);
    let config = load_settings(explicit)?;
    let user = UserConfig::load()?;

    println!("{}", style("Config paths:").bold());
    let status = |exists: bool| if exists { "✓" } else { "(not found)" };
    println!(
        "  Project: {} {}",
        project_path.display(),
        status(project_path.exists())
    );
    if let Some(user_path) = UserConfig::user_config_path() {
        println!(
            "  User:    {} {}",
            user_path.display(),
            status(user_path.exists())
        );
    }

    println!("\n{}", style("Effective project config:").bold());
    print!("{}", config.to_toml()?);

    println!("\n{}", style("API keys:").bold());
    for backend in [
        crate::advisory::LlmBackend::OpenAi,
        crate::advisory::LlmBackend::Anthropic,
    ] {
        let key_status = if user.api_key(backend).is_some() {
            style("configured").green()
        } else {
            style("not set").dim()
        };
        println!("  {}: {}", backend.env_key(), key_status);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_analyze() {
        let cli = Cli::try_parse_from([
            "containerguard",
            "analyze",
            "Dockerfile",
            "--format",
            "json",
            "--fail-on",
            "high",
            "--rounding",
            "half-even",
            "--disable-rule",
            "apt-cache",
            "--disable-rule",
            "missing-healthcheck",
        ])
        .unwrap();

        match cli.command {
            Commands::Analyze {
                paths,
                format,
                fail_on,
                rounding,
                disable_rule,
                ..
            } => {
                assert_eq!(paths, vec![PathBuf::from("Dockerfile")]);
                assert_eq!(format.as_deref(), Some("json"));
                assert_eq!(fail_on.as_deref(), Some("high"));
                assert_eq!(rounding, Some(RoundingMode::HalfEven));
                assert_eq!(disable_rule, vec!["apt-cache", "missing-healthcheck"]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_defaults_to_current_dir() {
        let cli = Cli::try_parse_from(["containerguard", "fix"]).unwrap();
        match cli.command {
            Commands::Fix { paths, dry_run, .. } => {
                assert_eq!(paths, vec![PathBuf::from(".")]);
                assert!(!dry_run);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.log_level, "warn");
    }

    #[test]
    fn test_cli_rejects_conflicting_fix_modes() {
        assert!(Cli::try_parse_from(["containerguard", "fix", "--in-place", "--stdout"]).is_err());
        assert!(
            Cli::try_parse_from(["containerguard", "fix", "--output-dir", "x", "--in-place"])
                .is_err()
        );
    }

    #[test]
    fn test_cli_rejects_advisory_conflict() {
        assert!(
            Cli::try_parse_from(["containerguard", "analyze", "--advisory", "--no-advisory"])
                .is_err()
        );
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["containerguard", "analyze", "-f", "pdf"]).is_err());
    }

    #[test]
    fn test_load_settings_missing_explicit_file() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(load_settings(Some(&dir.path().join("nope.toml"))).is_err());
    }
}
