//! Project-level configuration support
//!
//! Loads `containerguard.toml` from the working directory or an explicit
//! `--config` path.
//!
//! # Configuration Format
//!
//! ```toml
//! # containerguard.toml
//!
//! [scoring]
//! rounding = "half-up"   # or "half-even"
//!
//! [rules]
//! disabled = ["missing-healthcheck", "apt-cache"]
//!
//! [advisory]
//! enabled = false
//! backend = "openai"     # openai, anthropic, ollama
//! model = "gpt-4o-mini"
//! timeout_secs = 30
//!
//! [defaults]
//! format = "text"
//! fail_on = "high"
//! ```

use crate::scoring::RoundingMode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// File name looked up in the working directory
pub const PROJECT_CONFIG_FILE: &str = "containerguard.toml";

/// Advisory timeout when none is configured
pub const DEFAULT_ADVISORY_TIMEOUT_SECS: u64 = 30;

/// Example written by `containerguard config init`
pub const EXAMPLE_CONFIG: &str = r#"# containerguard project configuration

[scoring]
# Tie-break for scores landing exactly on .5: "half-up" (default) or "half-even"
rounding = "half-up"

[rules]
# Rule ids to skip, see `containerguard rules`
disabled = []

[advisory]
# Ask an LLM for extra hardening suggestions (never affects the score)
enabled = false
# backend = "openai"      # openai, anthropic, ollama
# model = "gpt-4o-mini"
# timeout_secs = 30

[defaults]
# format = "text"         # text, txt, csv, json
# fail_on = "high"        # exit 1 when a finding at or above this level exists
"#;

/// Top-level project configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub scoring: ScoringConfig,
    pub rules: RulesConfig,
    pub advisory: AdvisoryConfig,
    pub defaults: CliDefaults,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub rounding: RoundingMode,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Rule ids removed from the catalog before analysis
    pub disabled: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdvisoryConfig {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Endpoint override for self-hosted OpenAI-compatible servers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            backend: None,
            model: None,
            api_url: None,
            timeout_secs: DEFAULT_ADVISORY_TIMEOUT_SECS,
        }
    }
}

/// Default CLI flags that can be set in project config
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CliDefaults {
    /// Default output format (text, txt, csv, json)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Default `--fail-on` severity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fail_on: Option<String>,
}

impl ProjectConfig {
    /// Parse a TOML document
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize back to TOML for `config show`
    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Load `containerguard.toml` from `dir`, falling back to defaults
pub fn load_project_config(dir: &Path) -> ProjectConfig {
    load_config_file(&dir.join(PROJECT_CONFIG_FILE))
}

/// Load a specific config file
///
/// A missing file yields defaults. A file that cannot be read or parsed is
/// reported with a warning and also yields defaults.
pub fn load_config_file(path: &Path) -> ProjectConfig {
    if !path.exists() {
        debug!("No project config at {}, using defaults", path.display());
        return ProjectConfig::default();
    }

    match load_toml_config(path) {
        Ok(config) => {
            debug!("Loaded project config from {}", path.display());
            config
        }
        Err(e) => {
            warn!("Failed to load {}: {}", path.display(), e);
            ProjectConfig::default()
        }
    }
}

fn load_toml_config(path: &Path) -> anyhow::Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)?;
    ProjectConfig::from_toml(&content)
}
