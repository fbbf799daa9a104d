//! Text (terminal) reporter with colors and formatting

use crate::models::{BatchReport, FileReport, Finding, RiskBand, Severity};
use anyhow::Result;

/// Severity colors
fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::High => "\x1b[91m",   // Light red
        Severity::Medium => "\x1b[33m", // Yellow
        Severity::Low => "\x1b[34m",    // Blue
    }
}

fn risk_color(risk: RiskBand) -> &'static str {
    match risk {
        RiskBand::Low => "\x1b[32m",
        RiskBand::Moderate => "\x1b[33m",
        RiskBand::High => "\x1b[31m",
    }
}

/// Reset ANSI color
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// Width of the longest bar in the tally chart
const BAR_WIDTH: usize = 30;

/// Severity tag
fn severity_tag(severity: Severity) -> &'static str {
    match severity {
        Severity::High => "[H]",
        Severity::Medium => "[M]",
        Severity::Low => "[L]",
    }
}

/// Render report as formatted terminal output
pub fn render(report: &BatchReport) -> Result<String> {
    let mut out = String::new();

    // Header
    let risk_c = risk_color(report.risk);
    out.push_str(&format!("\n{BOLD}containerguard report{RESET}\n"));
    out.push_str(&format!(
        "{DIM}──────────────────────────────────────{RESET}\n"
    ));
    out.push_str(&format!(
        "Average score: {BOLD}{}/10{RESET}  Risk: {risk_c}{BOLD}{}{RESET}  Files: {}",
        report.average_score,
        report.risk,
        report.files.len()
    ));
    if !report.failures.is_empty() {
        out.push_str(&format!("  Failed: {}", report.failures.len()));
    }
    out.push_str("\n\n");

    // Tally chart
    out.push_str(&format!(
        "{BOLD}FINDINGS{RESET} ({} total)\n",
        report.tally.total()
    ));
    out.push_str(&render_tally_chart(report));
    out.push('\n');

    for file in &report.files {
        out.push_str(&render_file(file));
    }

    if !report.failures.is_empty() {
        out.push_str(&format!("{BOLD}SKIPPED{RESET}\n"));
        for failure in &report.failures {
            out.push_str(&format!(
                "  {}  {DIM}{}{RESET}\n",
                failure.path.display(),
                failure.error
            ));
        }
        out.push('\n');
    }

    if report.tally.is_empty() && !report.files.is_empty() {
        out.push_str(&format!("{DIM}No issues found.{RESET}\n"));
    } else if !report.tally.is_empty() {
        out.push_str(&format!(
            "{DIM}Run `containerguard fix` to write hardened copies.{RESET}\n"
        ));
    }

    Ok(out)
}

fn render_tally_chart(report: &BatchReport) -> String {
    let max = Severity::ALL
        .iter()
        .map(|s| report.tally.get(*s))
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for severity in Severity::ALL {
        let count = report.tally.get(severity);
        let len = bar_length(count, max);
        out.push_str(&format!(
            "  {:<6}  {}{}{RESET} {}\n",
            severity.as_str(),
            severity_color(severity),
            "█".repeat(len),
            count
        ));
    }
    out
}

/// Bar length scaled so the largest count fills `BAR_WIDTH`
fn bar_length(count: usize, max: usize) -> usize {
    if max == 0 || count == 0 {
        return 0;
    }
    (count * BAR_WIDTH / max).max(1)
}

fn render_file(file: &FileReport) -> String {
    let result = &file.result;
    let mut out = format!(
        "{BOLD}{}{RESET}  score {}/10\n",
        file.path.display(),
        result.score
    );

    if result.findings.is_empty() && result.advisories.is_empty() {
        out.push_str(&format!("  {DIM}clean{RESET}\n\n"));
        return out;
    }

    for finding in &result.findings {
        out.push_str(&render_finding(finding, ""));
    }
    for finding in &result.advisories {
        out.push_str(&render_finding(finding, "advisory "));
    }
    out.push('\n');
    out
}

fn render_finding(finding: &Finding, prefix: &str) -> String {
    let sev_c = severity_color(finding.severity);
    format!(
        "  {sev_c}{}{RESET} {DIM}{prefix}{RESET}{}\n      {DIM}→ {}{RESET}\n",
        severity_tag(finding.severity),
        finding.message,
        finding.suggestion
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporters::tests::test_report;

    #[test]
    fn test_render_contains_summary() {
        let out = render(&test_report()).unwrap();
        assert!(out.contains("containerguard report"));
        assert!(out.contains("1/10"));
        assert!(out.contains("low"));
        assert!(out.contains("Failed: 1"));
        assert!(out.contains("(2 total)"));
    }

    #[test]
    fn test_render_lists_files_and_findings() {
        let out = render(&test_report()).unwrap();
        assert!(out.contains("app/Dockerfile"));
        assert!(out.contains("Runs as root user"));
        assert!(out.contains("advisory "));
        assert!(out.contains("k8s/pod.yaml"));
        assert!(out.contains("clean"));
        assert!(out.contains("broken/Dockerfile"));
        assert!(out.contains("permission denied"));
    }

    #[test]
    fn test_bar_length() {
        assert_eq!(bar_length(0, 0), 0);
        assert_eq!(bar_length(0, 5), 0);
        assert_eq!(bar_length(5, 5), BAR_WIDTH);
        assert_eq!(bar_length(1, 1000), 1);
        assert_eq!(bar_length(2, 4), BAR_WIDTH / 2);
    }

    #[test]
    fn test_chart_has_every_severity() {
        let chart = render_tally_chart(&test_report());
        let lines: Vec<&str> = chart.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("HIGH"));
        assert!(lines[1].contains("MEDIUM"));
        assert!(lines[2].contains("LOW"));
        assert!(lines[1].ends_with(" 0"));
    }

    #[test]
    fn test_empty_batch() {
        let report = BatchReport::new(vec![], vec![]);
        let out = render(&report).unwrap();
        assert!(out.contains("Files: 0"));
        assert!(!out.contains("No issues found"));
    }
}
