//! Behavioral properties of the rule engine, scorer and remediation,
//! exercised through the public library API.

use containerguard::advisory::{Advisor, AdvisoryAdapter, AdvisoryError, AdvisoryResult};
use containerguard::models::{ScoreTally, Severity};
use containerguard::pipeline::Analyzer;
use containerguard::remediation::RemediationEngine;
use containerguard::rules::RuleEngine;
use containerguard::scoring::{RoundingMode, Scorer, MAX_SCORE};

const POD_WITHOUT_CONTEXT: &str = "\
apiVersion: v1
kind: Pod
metadata:
  name: api
spec:
  containers:
    - name: api
      image: registry.local/api:2.3.1
";

const POD_MISSING_NON_ROOT: &str = "\
apiVersion: v1
kind: Pod
spec:
  containers:
    - name: api
      securityContext:
        readOnlyRootFilesystem: true
        allowPrivilegeEscalation: false
";

fn kubernetes_findings(document: &str) -> Vec<(Severity, String)> {
    let (findings, _) = RuleEngine::default().evaluate(document);
    findings
        .into_iter()
        .filter(|f| f.message.starts_with("Kubernetes"))
        .map(|f| (f.severity, f.message))
        .collect()
}

#[test]
fn score_is_monotonic_and_bounded() {
    for mode in [RoundingMode::HalfUp, RoundingMode::HalfEven] {
        let scorer = Scorer::new(mode);
        let mut previous = 0;
        for high in 0..10 {
            let score = scorer.score(&ScoreTally::new(high, 0, 0));
            assert!(score >= previous);
            assert!(score <= MAX_SCORE);
            previous = score;
        }
    }
}

#[test]
fn score_endpoints() {
    let scorer = Scorer::default();
    assert_eq!(scorer.score(&ScoreTally::new(0, 0, 0)), 0);
    assert_eq!(scorer.score(&ScoreTally::new(6, 0, 0)), 10);
}

#[test]
fn root_user_yields_one_high_and_is_remediated() {
    let document = "FROM alpine:3.18\nUSER root\nHEALTHCHECK CMD true\n";
    let (findings, _) = RuleEngine::default().evaluate(document);
    let root: Vec<_> = findings
        .iter()
        .filter(|f| f.message == "Runs as root user")
        .collect();
    assert_eq!(root.len(), 1);
    assert_eq!(root[0].severity, Severity::High);

    let fixed = RemediationEngine::default().remediate(document);
    assert!(!fixed.contains("USER root"));
}

#[test]
fn pod_without_security_context_reports_only_the_block() {
    let found = kubernetes_findings(POD_WITHOUT_CONTEXT);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].0, Severity::High);
    assert!(found[0].1.contains("securityContext"));
}

#[test]
fn pod_missing_only_run_as_non_root() {
    let found = kubernetes_findings(POD_MISSING_NON_ROOT);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].0, Severity::Medium);
    assert!(found[0].1.contains("runAsNonRoot"));
}

#[test]
fn tally_sums_to_finding_count() {
    let analyzer = Analyzer::default();
    for document in [
        "",
        "FROM ubuntu:latest\nUSER root\nADD . /app\nEXPOSE 80\n",
        POD_WITHOUT_CONTEXT,
        POD_MISSING_NON_ROOT,
    ] {
        let result = analyzer.analyze(document);
        assert_eq!(result.tally.total(), result.findings.len());
    }
}

#[test]
fn every_remediation_step_is_idempotent() {
    let documents = [
        "FROM ubuntu:latest\nUSER root\nENV DB_PASSWORD=x\nADD . /app\nRUN apt-get install -y git\nEXPOSE 80",
        POD_WITHOUT_CONTEXT,
        "",
    ];
    for step in RemediationEngine::builtin().steps() {
        for document in documents {
            let once = step.apply(document);
            assert_eq!(step.apply(&once), once, "step {} not idempotent", step.id);
        }
    }
}

#[test]
fn remediation_reduces_risk() {
    let analyzer = Analyzer::default();
    let document = "FROM ubuntu:latest\nUSER root\nENV DB_PASSWORD=x\nADD . /app\nRUN apt-get install -y git\nEXPOSE 80\n";
    let before = analyzer.analyze(document);
    let after = analyzer.analyze(&analyzer.remediate(document));
    assert!(after.score < before.score);
    assert_eq!(after.tally.high, 0);
}

struct Unreachable;

impl Advisor for Unreachable {
    fn name(&self) -> &str {
        "unreachable"
    }

    fn suggest(&self, _document: &str) -> AdvisoryResult<Vec<String>> {
        Err(AdvisoryError::Transport("timed out".into()))
    }
}

struct Canned;

impl Advisor for Canned {
    fn name(&self) -> &str {
        "canned"
    }

    fn suggest(&self, _document: &str) -> AdvisoryResult<Vec<String>> {
        Ok(vec![
            "- Avoid running as root".into(),
            String::new(),
            "- Pin the base image version".into(),
            "- Use multi-stage builds".into(),
        ])
    }
}

#[test]
fn advisory_failure_changes_nothing() {
    let document = "FROM ubuntu:latest\nUSER root\n";
    let baseline = Analyzer::default().analyze_document(document).result;
    let with_failure = Analyzer::default()
        .with_advisory(AdvisoryAdapter::new(Unreachable))
        .analyze_document(document)
        .result;

    assert!(with_failure.advisories.is_empty());
    assert_eq!(with_failure.score, baseline.score);
    assert_eq!(with_failure.findings, baseline.findings);
}

#[test]
fn advisory_lines_become_classified_findings() {
    let result = Analyzer::default()
        .with_advisory(AdvisoryAdapter::new(Canned))
        .analyze_document("FROM alpine:3.18\n")
        .result;

    let severities: Vec<_> = result.advisories.iter().map(|f| f.severity).collect();
    assert_eq!(severities, vec![Severity::High, Severity::Medium, Severity::Low]);
    assert_eq!(result.advisories[0].suggestion, "Avoid running as root");
    assert_eq!(result.tally.total(), result.findings.len());
}
