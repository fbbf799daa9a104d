//! Rule building blocks
//!
//! - `Predicate`: a presence/absence test against the whole document text
//! - `Rule`: either a simple predicate with an outcome, or a gated group of
//!   nested rules that only run when the gate holds
//! - `Outcome`: the severity, message and suggestion a matching rule reports

use crate::models::{Finding, Severity};
use regex::Regex;

/// Text test evaluated against an entire document
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Literal substring is present
    Contains(&'static str),
    /// Regex matches somewhere in the document
    Matches(Regex),
    /// Inner predicate does not hold
    Not(Box<Predicate>),
    /// At least one inner predicate holds
    Any(Vec<Predicate>),
    /// Every inner predicate holds
    All(Vec<Predicate>),
}

impl Predicate {
    pub fn contains(needle: &'static str) -> Self {
        Predicate::Contains(needle)
    }

    /// Literal substring is absent
    pub fn absent(needle: &'static str) -> Self {
        Predicate::Not(Box::new(Predicate::Contains(needle)))
    }

    pub fn matches(pattern: &Regex) -> Self {
        Predicate::Matches(pattern.clone())
    }

    pub fn any(predicates: Vec<Predicate>) -> Self {
        Predicate::Any(predicates)
    }

    pub fn all(predicates: Vec<Predicate>) -> Self {
        Predicate::All(predicates)
    }

    pub fn is_match(&self, document: &str) -> bool {
        match self {
            Predicate::Contains(needle) => document.contains(needle),
            Predicate::Matches(re) => re.is_match(document),
            Predicate::Not(inner) => !inner.is_match(document),
            Predicate::Any(inner) => inner.iter().any(|p| p.is_match(document)),
            Predicate::All(inner) => inner.iter().all(|p| p.is_match(document)),
        }
    }
}

/// What a matching simple rule reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub severity: Severity,
    pub message: &'static str,
    pub suggestion: &'static str,
}

impl Outcome {
    pub const fn new(severity: Severity, message: &'static str, suggestion: &'static str) -> Self {
        Self {
            severity,
            message,
            suggestion,
        }
    }

    pub fn to_finding(&self) -> Finding {
        Finding::new(self.severity, self.message, self.suggestion)
    }
}

#[derive(Debug, Clone)]
pub enum RuleKind {
    /// Reports `outcome` once when `predicate` holds
    Simple { predicate: Predicate, outcome: Outcome },
    /// Evaluates `children` in order only when `gate` holds
    Gated {
        gate: Predicate,
        description: &'static str,
        children: Vec<Rule>,
    },
}

/// A catalog entry with a stable kebab-case id
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: &'static str,
    pub kind: RuleKind,
}

impl Rule {
    pub fn simple(id: &'static str, predicate: Predicate, outcome: Outcome) -> Self {
        Self {
            id,
            kind: RuleKind::Simple { predicate, outcome },
        }
    }

    pub fn gated(
        id: &'static str,
        description: &'static str,
        gate: Predicate,
        children: Vec<Rule>,
    ) -> Self {
        Self {
            id,
            kind: RuleKind::Gated {
                gate,
                description,
                children,
            },
        }
    }

    pub fn description(&self) -> &'static str {
        match &self.kind {
            RuleKind::Simple { outcome, .. } => outcome.message,
            RuleKind::Gated { description, .. } => *description,
        }
    }

    /// Severity reported by a simple rule; `None` for groups
    pub fn severity(&self) -> Option<Severity> {
        match &self.kind {
            RuleKind::Simple { outcome, .. } => Some(outcome.severity),
            RuleKind::Gated { .. } => None,
        }
    }

    pub fn children(&self) -> &[Rule] {
        match &self.kind {
            RuleKind::Simple { .. } => &[],
            RuleKind::Gated { children, .. } => children,
        }
    }
}
