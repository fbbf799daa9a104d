//! Plain text export, one `LEVEL | message | suggestion` line per finding
//!
//! Rule findings come first for each file, then advisory findings.

use crate::models::BatchReport;
use anyhow::Result;

pub fn render(report: &BatchReport) -> Result<String> {
    let mut out = String::new();
    for finding in report.all_findings() {
        out.push_str(&format!(
            "{} | {} | {}\n",
            finding.severity, finding.message, finding.suggestion
        ));
    }
    Ok(out)
}
