//! Core data models for containerguard
//!
//! These models are shared by the rule engine, the scorer, the advisory
//! adapter and every reporter.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Severity levels for findings, ordered by risk (`High > Medium > Low`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// All severities, most severe first
    pub const ALL: [Severity; 3] = [Severity::High, Severity::Medium, Severity::Low];

    /// Weight of one finding of this severity in the risk score
    pub fn weight(&self) -> u32 {
        match self {
            Severity::High => 4,
            Severity::Medium => 2,
            Severity::Low => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            _ => Err(anyhow::anyhow!(
                "Unknown severity '{}'. Valid severities: high, medium, low",
                s
            )),
        }
    }
}

/// One reported issue. Findings have no identity beyond their fields;
/// duplicates are kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub message: String,
    pub suggestion: String,
}

impl Finding {
    pub fn new(severity: Severity, message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }
}

/// Per-severity finding counts from one scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreTally {
    #[serde(rename = "HIGH")]
    pub high: usize,
    #[serde(rename = "MEDIUM")]
    pub medium: usize,
    #[serde(rename = "LOW")]
    pub low: usize,
}

impl ScoreTally {
    pub fn new(high: usize, medium: usize, low: usize) -> Self {
        Self { high, medium, low }
    }

    pub fn from_findings(findings: &[Finding]) -> Self {
        let mut tally = Self::default();
        for f in findings {
            tally.record(f.severity);
        }
        tally
    }

    /// Count one more finding at `severity`
    pub fn record(&mut self, severity: Severity) {
        match severity {
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
        }
    }

    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }

    pub fn total(&self) -> usize {
        self.high + self.medium + self.low
    }

    /// Weighted points (4 per HIGH, 2 per MEDIUM, 1 per LOW)
    pub fn points(&self) -> u64 {
        Severity::ALL
            .iter()
            .map(|s| self.get(*s) as u64 * u64::from(s.weight()))
            .sum()
    }

    pub fn merge(&mut self, other: &ScoreTally) {
        self.high += other.high;
        self.medium += other.medium;
        self.low += other.low;
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Result of analyzing one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    /// Rule findings in catalog order
    pub findings: Vec<Finding>,
    /// Breakdown of `findings` by severity
    pub tally: ScoreTally,
    /// Risk score in `0..=10`
    pub score: u8,
    /// Findings from the optional external advisor. Not scored, not tallied.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub advisories: Vec<Finding>,
}

impl ScanResult {
    /// Highest severity among rule findings
    pub fn max_severity(&self) -> Option<Severity> {
        self.findings.iter().map(|f| f.severity).max()
    }

    /// Rule findings followed by advisory findings
    pub fn all_findings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().chain(self.advisories.iter())
    }
}

/// Analysis and remediation of one input file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub result: ScanResult,
    /// Remediated document text
    #[serde(skip)]
    pub fixed: String,
}

/// A file that could not be analyzed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Overall risk band for a batch, from the average score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBand {
    Low,
    Moderate,
    High,
}

impl RiskBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=2 => RiskBand::Low,
            3..=6 => RiskBand::Moderate,
            _ => RiskBand::High,
        }
    }
}

impl std::fmt::Display for RiskBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskBand::Low => write!(f, "low"),
            RiskBand::Moderate => write!(f, "moderate"),
            RiskBand::High => write!(f, "high"),
        }
    }
}

/// Results for a whole batch of files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub files: Vec<FileReport>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FileFailure>,
    /// Combined tally of rule findings across all files
    pub tally: ScoreTally,
    /// Integer mean of per-file scores (0 when nothing was analyzed)
    pub average_score: u8,
    pub risk: RiskBand,
}

impl BatchReport {
    pub fn new(files: Vec<FileReport>, failures: Vec<FileFailure>) -> Self {
        let mut tally = ScoreTally::default();
        for file in &files {
            tally.merge(&file.result.tally);
        }
        let average_score = if files.is_empty() {
            0
        } else {
            let sum: usize = files.iter().map(|f| f.result.score as usize).sum();
            (sum / files.len()) as u8
        };
        Self {
            generated_at: chrono::Utc::now(),
            files,
            failures,
            tally,
            average_score,
            risk: RiskBand::from_score(average_score),
        }
    }

    /// Every finding (rule and advisory) across the batch, in file order
    pub fn all_findings(&self) -> impl Iterator<Item = &Finding> {
        self.files.iter().flat_map(|f| f.result.all_findings())
    }

    /// Whether any rule finding is at or above `threshold`
    pub fn has_findings_at_or_above(&self, threshold: Severity) -> bool {
        self.files
            .iter()
            .flat_map(|f| f.result.findings.iter())
            .any(|f| f.severity >= threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(score: u8, findings: Vec<Finding>) -> ScanResult {
        ScanResult {
            tally: ScoreTally::from_findings(&findings),
            findings,
            score,
            advisories: vec![],
        }
    }

    fn file(name: &str, score: u8, findings: Vec<Finding>) -> FileReport {
        FileReport {
            path: PathBuf::from(name),
            result: result(score, findings),
            fixed: String::new(),
        }
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
        assert_eq!(Severity::ALL[0], Severity::High);
    }

    #[test]
    fn test_severity_parse_and_display() {
        assert_eq!("HIGH".parse::<Severity>().unwrap(), Severity::High);
        assert_eq!("medium".parse::<Severity>().unwrap(), Severity::Medium);
        assert!("critical".parse::<Severity>().is_err());
        assert_eq!(Severity::Low.to_string(), "LOW");
    }

    #[test]
    fn test_tally_from_findings() {
        let findings = vec![
            Finding::new(Severity::High, "a", "x"),
            Finding::new(Severity::High, "a", "x"),
            Finding::new(Severity::Low, "b", "y"),
        ];
        let tally = ScoreTally::from_findings(&findings);
        assert_eq!(tally, ScoreTally::new(2, 0, 1));
        assert_eq!(tally.total(), findings.len());
        assert_eq!(tally.points(), 9);
    }

    #[test]
    fn test_tally_serializes_uppercase_keys() {
        let json = serde_json::to_value(ScoreTally::new(1, 2, 3)).unwrap();
        assert_eq!(json["HIGH"], 1);
        assert_eq!(json["MEDIUM"], 2);
        assert_eq!(json["LOW"], 3);
    }

    #[test]
    fn test_risk_band_thresholds() {
        assert_eq!(RiskBand::from_score(0), RiskBand::Low);
        assert_eq!(RiskBand::from_score(2), RiskBand::Low);
        assert_eq!(RiskBand::from_score(3), RiskBand::Moderate);
        assert_eq!(RiskBand::from_score(6), RiskBand::Moderate);
        assert_eq!(RiskBand::from_score(7), RiskBand::High);
        assert_eq!(RiskBand::from_score(10), RiskBand::High);
    }

    #[test]
    fn test_batch_average_is_floor_of_mean() {
        let batch = BatchReport::new(
            vec![
                file("a", 3, vec![Finding::new(Severity::Medium, "m", "s")]),
                file("b", 4, vec![Finding::new(Severity::High, "h", "s")]),
            ],
            vec![],
        );
        assert_eq!(batch.average_score, 3);
        assert_eq!(batch.risk, RiskBand::Moderate);
        assert_eq!(batch.tally, ScoreTally::new(1, 1, 0));
    }

    #[test]
    fn test_empty_batch() {
        let batch = BatchReport::new(vec![], vec![]);
        assert_eq!(batch.average_score, 0);
        assert_eq!(batch.risk, RiskBand::Low);
        assert!(!batch.has_findings_at_or_above(Severity::Low));
    }

    #[test]
    fn test_fail_threshold_ignores_advisories() {
        let mut report = file("a", 0, vec![Finding::new(Severity::Low, "l", "s")]);
        report.result.advisories = vec![Finding::new(Severity::High, "Advisory suggestion", "x")];
        let batch = BatchReport::new(vec![report], vec![]);
        assert!(batch.has_findings_at_or_above(Severity::Low));
        assert!(!batch.has_findings_at_or_above(Severity::Medium));
        assert_eq!(batch.all_findings().count(), 2);
    }
}
