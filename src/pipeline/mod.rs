//! Analysis pipeline
//!
//! Ties the pieces together for one document or a batch of files:
//! 1. Evaluate the rule catalog
//! 2. Score the tally
//! 3. Remediate the text
//! 4. Optionally ask the advisor for extra suggestions
//!
//! Files in a batch are read and analyzed in parallel. A file that cannot be
//! read becomes a `FileFailure` and never aborts the batch.

use crate::advisory::{AdvisoryAdapter, AiClient, AiConfig, LlmAdvisor, LlmBackend};
use crate::config::{ProjectConfig, UserConfig};
use crate::models::{BatchReport, FileFailure, FileReport, ScanResult};
use crate::remediation::{Remediation, RemediationEngine};
use crate::rules::{RuleCatalog, RuleEngine};
use crate::scoring::Scorer;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Analysis of a single document with its remediated text
#[derive(Debug, Clone)]
pub struct DocumentAnalysis {
    pub result: ScanResult,
    pub fixed: String,
}

/// Rule engine, scorer, remediation and optional advisor in one place
#[derive(Default)]
pub struct Analyzer {
    engine: RuleEngine,
    scorer: Scorer,
    remediator: RemediationEngine,
    advisory: Option<AdvisoryAdapter>,
}

impl Analyzer {
    pub fn new(catalog: RuleCatalog, scorer: Scorer, remediator: RemediationEngine) -> Self {
        Self {
            engine: RuleEngine::new(catalog),
            scorer,
            remediator,
            advisory: None,
        }
    }

    /// Attach an advisor; its findings land in `ScanResult::advisories`
    pub fn with_advisory(mut self, adapter: AdvisoryAdapter) -> Self {
        self.advisory = Some(adapter);
        self
    }

    /// Build from project settings and user API keys
    ///
    /// An advisory section that cannot be turned into a client (unknown
    /// backend, missing key) disables advisory with a warning.
    pub fn from_config(config: &ProjectConfig, user: &UserConfig) -> Self {
        let catalog = RuleCatalog::builtin().without(&config.rules.disabled);
        let analyzer = Self::new(
            catalog,
            Scorer::new(config.scoring.rounding),
            RemediationEngine::builtin(),
        );

        if !config.advisory.enabled {
            return analyzer;
        }

        match build_advisor(config, user) {
            Ok(advisor) => {
                info!("Advisory enabled via {}", advisor.backend_label);
                analyzer.with_advisory(AdvisoryAdapter::new(advisor.inner))
            }
            Err(e) => {
                warn!("Advisory disabled: {}", e);
                analyzer
            }
        }
    }

    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    pub fn has_advisory(&self) -> bool {
        self.advisory.is_some()
    }

    /// Rule findings, tally and score. Never consults the advisor.
    pub fn analyze(&self, document: &str) -> ScanResult {
        let (findings, tally) = self.engine.evaluate(document);
        let score = self.scorer.score(&tally);
        ScanResult {
            findings,
            tally,
            score,
            advisories: Vec::new(),
        }
    }

    pub fn remediate(&self, document: &str) -> String {
        self.remediator.remediate(document)
    }

    pub fn remediate_with_changes(&self, document: &str) -> Remediation {
        self.remediator.remediate_with_changes(document)
    }

    /// Full treatment: rules, score, fixed text and advisory findings
    pub fn analyze_document(&self, document: &str) -> DocumentAnalysis {
        let mut result = self.analyze(document);
        if let Some(adapter) = &self.advisory {
            result.advisories = adapter.findings(document);
        }
        DocumentAnalysis {
            result,
            fixed: self.remediate(document),
        }
    }

    /// Analyze every file in parallel
    pub fn analyze_paths(&self, paths: &[PathBuf]) -> BatchReport {
        let outcomes: Vec<Result<FileReport, FileFailure>> =
            paths.par_iter().map(|path| self.analyze_file(path)).collect();

        let mut files = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(report) => files.push(report),
                Err(failure) => failures.push(failure),
            }
        }

        info!(
            "Analyzed {} files ({} failed)",
            files.len(),
            failures.len()
        );
        BatchReport::new(files, failures)
    }

    fn analyze_file(&self, path: &Path) -> Result<FileReport, FileFailure> {
        let document = std::fs::read_to_string(path).map_err(|e| {
            warn!("Skipping {}: {}", path.display(), e);
            FileFailure {
                path: path.to_path_buf(),
                error: e.to_string(),
            }
        })?;

        let analysis = self.analyze_document(&document);
        debug!(
            "{}: {} findings, score {}",
            path.display(),
            analysis.result.findings.len(),
            analysis.result.score
        );
        Ok(FileReport {
            path: path.to_path_buf(),
            result: analysis.result,
            fixed: analysis.fixed,
        })
    }
}

struct BuiltAdvisor {
    inner: LlmAdvisor,
    backend_label: String,
}

fn build_advisor(config: &ProjectConfig, user: &UserConfig) -> anyhow::Result<BuiltAdvisor> {
    let backend = match config.advisory.backend.as_deref() {
        Some(name) => name.parse::<LlmBackend>()?,
        None => LlmBackend::default(),
    };

    let model = config
        .advisory
        .model
        .clone()
        .or_else(|| match backend {
            LlmBackend::Ollama => user.ollama_model().map(str::to_string),
            _ => None,
        });

    let ai_config = AiConfig {
        backend,
        model,
        api_url: config.advisory.api_url.clone(),
        timeout: Duration::from_secs(config.advisory.timeout_secs),
        ..Default::default()
    };
    let client = AiClient::from_config(ai_config, user.api_key(backend))?;
    let backend_label = format!("{} ({})", backend, client.model());

    Ok(BuiltAdvisor {
        inner: LlmAdvisor::new(client),
        backend_label,
    })
}
