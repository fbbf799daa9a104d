//! Configuration module for containerguard
//!
//! This module handles:
//! - Project-level configuration (containerguard.toml)
//! - User-level API keys (~/.config/containerguard/config.toml)

mod project_config;
mod user_config;

pub use project_config::{
    load_config_file, load_project_config, AdvisoryConfig, CliDefaults, ProjectConfig,
    RulesConfig, ScoringConfig, DEFAULT_ADVISORY_TIMEOUT_SECS, EXAMPLE_CONFIG,
    PROJECT_CONFIG_FILE,
};
pub use user_config::{AiKeys, UserConfig};
