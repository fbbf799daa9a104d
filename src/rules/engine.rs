//! Rule engine
//!
//! Walks the catalog in order against the raw document text. Each matching
//! simple rule contributes exactly one finding and one tally increment, no
//! matter how often its pattern occurs. A gated group only descends into its
//! children when the gate holds.

use crate::models::{Finding, ScoreTally};
use crate::rules::base::{Rule, RuleKind};
use crate::rules::catalog::RuleCatalog;
use tracing::{debug, trace};

/// Evaluates an immutable rule catalog against documents
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    catalog: RuleCatalog,
}

impl RuleEngine {
    pub fn new(catalog: RuleCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    /// Run every rule against `document`.
    ///
    /// Never fails: malformed or empty input only changes which rules match.
    pub fn evaluate(&self, document: &str) -> (Vec<Finding>, ScoreTally) {
        let mut findings = Vec::new();
        let mut tally = ScoreTally::default();
        evaluate_rules(self.catalog.rules(), document, &mut findings, &mut tally);
        debug!(
            "Evaluated {} bytes: {} findings ({} high, {} medium, {} low)",
            document.len(),
            findings.len(),
            tally.high,
            tally.medium,
            tally.low
        );
        (findings, tally)
    }
}

fn evaluate_rules(
    rules: &[Rule],
    document: &str,
    findings: &mut Vec<Finding>,
    tally: &mut ScoreTally,
) {
    for rule in rules {
        match &rule.kind {
            RuleKind::Simple { predicate, outcome } => {
                if predicate.is_match(document) {
                    trace!("Rule {} matched", rule.id);
                    findings.push(outcome.to_finding());
                    tally.record(outcome.severity);
                }
            }
            RuleKind::Gated { gate, children, .. } => {
                if gate.is_match(document) {
                    trace!("Gate {} open", rule.id);
                    evaluate_rules(children, document, findings, tally);
                }
            }
        }
    }
}
