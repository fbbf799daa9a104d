//! Optional LLM advisory enrichment
//!
//! An external advisor reads the raw document and answers with free-text
//! hardening suggestions, one per line. `AdvisoryAdapter` turns those lines
//! into findings with keyword-based severities and swallows every failure:
//! a missing key, a timeout or a garbled response all yield zero findings,
//! and the rule-based score never depends on this module.
//!
//! # Environment Variables
//!
//! - `OPENAI_API_KEY`: OpenAI backend (default)
//! - `ANTHROPIC_API_KEY`: Anthropic backend
//! - `OLLAMA_MODEL`: model for a local Ollama server (no key)
//!
//! # Example
//!
//! ```rust,ignore
//! use containerguard::advisory::{AdvisoryAdapter, AiClient, AiConfig, LlmAdvisor};
//!
//! let client = AiClient::from_config(AiConfig::default(), None)?;
//! let adapter = AdvisoryAdapter::new(LlmAdvisor::new(client));
//! let extra = adapter.findings(&dockerfile);
//! ```

mod client;

pub use client::{AiClient, AiConfig, LlmBackend, Message, Role};

use crate::models::{Finding, Severity};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur while talking to an advisor
#[derive(Error, Debug)]
pub enum AdvisoryError {
    #[error("Missing API key: {env_var} not set. Get your key at {signup_url}")]
    MissingApiKey { env_var: String, signup_url: String },

    #[error("API request failed: {0}")]
    Transport(String),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

pub type AdvisoryResult<T> = Result<T, AdvisoryError>;

/// Fixed instruction sent with every advisory request
pub const SYSTEM_INSTRUCTION: &str =
    "You're a container security expert. Provide recommendations.";

/// Message attached to every advisory finding
pub const ADVISORY_MESSAGE: &str = "Advisory suggestion";

/// Source of free-text suggestions for a document
pub trait Advisor: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Raw suggestion lines for `document`
    fn suggest(&self, document: &str) -> AdvisoryResult<Vec<String>>;
}

/// Advisor backed by a chat-completion API
pub struct LlmAdvisor {
    client: AiClient,
}

impl LlmAdvisor {
    pub fn new(client: AiClient) -> Self {
        Self { client }
    }

    fn prompt(document: &str) -> String {
        format!(
            "Analyze this Dockerfile or Kubernetes YAML and give 3 security hardening suggestions:\n\n{document}"
        )
    }
}

impl Advisor for LlmAdvisor {
    fn name(&self) -> &str {
        self.client.model()
    }

    fn suggest(&self, document: &str) -> AdvisoryResult<Vec<String>> {
        let response = self
            .client
            .generate(vec![Message::user(Self::prompt(document))], Some(SYSTEM_INSTRUCTION))?;
        Ok(response.trim().lines().map(str::to_string).collect())
    }
}

/// Severity implied by the wording of a suggestion
pub fn classify(suggestion: &str) -> Severity {
    let lower = suggestion.to_lowercase();
    if lower.contains("root") || lower.contains("password") {
        Severity::High
    } else if lower.contains("version") {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// One finding per non-empty line, list markers stripped
pub fn findings_from_lines<S: AsRef<str>>(lines: &[S]) -> Vec<Finding> {
    lines
        .iter()
        .map(|line| line.as_ref().trim_matches(|c| c == '-' || c == ' ').trim())
        .filter(|text| !text.is_empty())
        .map(|text| Finding::new(classify(text), ADVISORY_MESSAGE, text))
        .collect()
}

/// Failure-proof boundary around an `Advisor`
pub struct AdvisoryAdapter {
    advisor: Box<dyn Advisor>,
}

impl AdvisoryAdapter {
    pub fn new(advisor: impl Advisor + 'static) -> Self {
        Self {
            advisor: Box::new(advisor),
        }
    }

    pub fn advisor_name(&self) -> &str {
        self.advisor.name()
    }

    /// Advisory findings for `document`; empty on any failure
    pub fn findings(&self, document: &str) -> Vec<Finding> {
        match self.advisor.suggest(document) {
            Ok(lines) => {
                let findings = findings_from_lines(&lines);
                debug!(
                    "Advisor {} returned {} suggestions",
                    self.advisor.name(),
                    findings.len()
                );
                findings
            }
            Err(e) => {
                warn!("Advisor {} unavailable, skipping: {}", self.advisor.name(), e);
                Vec::new()
            }
        }
    }
}
