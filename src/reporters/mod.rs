//! Output reporters for containerguard results
//!
//! Supports multiple output formats:
//! - `text` - Terminal output with colors and a severity bar chart
//! - `txt` - One `LEVEL | message | suggestion` line per finding
//! - `csv` - `Level,Message,Suggestion` with RFC 4180 quoting
//! - `json` - Machine-readable JSON of the whole batch

mod csv;
mod json;
mod text;
mod txt;

use crate::models::BatchReport;
use anyhow::{anyhow, Result};
use std::str::FromStr;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Txt,
    Csv,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "terminal" => Ok(OutputFormat::Text),
            "txt" | "plain" => Ok(OutputFormat::Txt),
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow!(
                "Unknown format '{}'. Valid formats: text, txt, csv, json",
                s
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Txt => write!(f, "txt"),
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Render a batch report in the specified format
pub fn report(report: &BatchReport, format: &str) -> Result<String> {
    let fmt = OutputFormat::from_str(format)?;
    report_with_format(report, fmt)
}

/// Render a batch report using an OutputFormat enum
pub fn report_with_format(report: &BatchReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => text::render(report),
        OutputFormat::Txt => txt::render(report),
        OutputFormat::Csv => csv::render(report),
        OutputFormat::Json => json::render(report),
    }
}

/// Get the recommended file extension for a format
pub fn file_extension(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::Text | OutputFormat::Txt => "txt",
        OutputFormat::Csv => "csv",
        OutputFormat::Json => "json",
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::path::PathBuf;

    /// A two-file batch with rule and advisory findings
    pub(crate) fn test_report() -> BatchReport {
        use crate::models::{FileFailure, FileReport, Finding, ScanResult, ScoreTally, Severity};

        let findings = vec![
            Finding::new(
                Severity::High,
                "Runs as root user",
                "Use non-root user (CIS Docker Benchmark 4.1, OWASP A3)",
            ),
            Finding::new(
                Severity::Low,
                "No HEALTHCHECK defined",
                "Define a HEALTHCHECK for better container reliability (OWASP A10)",
            ),
        ];
        let risky = FileReport {
            path: PathBuf::from("app/Dockerfile"),
            result: ScanResult {
                tally: ScoreTally::from_findings(&findings),
                findings,
                score: 2,
                advisories: vec![Finding::new(
                    Severity::Medium,
                    "Advisory suggestion",
                    "Pin package versions, e.g. \"curl=7.88\"",
                )],
            },
            fixed: String::new(),
        };
        let clean = FileReport {
            path: PathBuf::from("k8s/pod.yaml"),
            result: ScanResult {
                findings: vec![],
                tally: ScoreTally::default(),
                score: 0,
                advisories: vec![],
            },
            fixed: String::new(),
        };

        BatchReport::new(
            vec![risky, clean],
            vec![FileFailure {
                path: PathBuf::from("broken/Dockerfile"),
                error: "permission denied".into(),
            }],
        )
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(OutputFormat::from_str("text").unwrap(), OutputFormat::Text);
        assert_eq!(OutputFormat::from_str("TXT").unwrap(), OutputFormat::Txt);
        assert_eq!(OutputFormat::from_str("csv").unwrap(), OutputFormat::Csv);
        assert_eq!(OutputFormat::from_str("JSON").unwrap(), OutputFormat::Json);
        assert!(OutputFormat::from_str("pdf").is_err());
    }

    #[test]
    fn test_every_format_renders() {
        let report = test_report();
        for format in [
            OutputFormat::Text,
            OutputFormat::Txt,
            OutputFormat::Csv,
            OutputFormat::Json,
        ] {
            let out = report_with_format(&report, format).unwrap();
            assert!(!out.is_empty(), "{format} rendered nothing");
        }
        assert!(super::report(&report, "bogus").is_err());
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension(OutputFormat::Csv), "csv");
        assert_eq!(file_extension(OutputFormat::Json), "json");
        assert_eq!(file_extension(OutputFormat::Txt), "txt");
    }
}
