//! JSON reporter
//!
//! Outputs the full BatchReport as pretty-printed JSON for piping to jq or
//! CI tooling.

use crate::models::BatchReport;
use anyhow::Result;

/// Render report as JSON
pub fn render(report: &BatchReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}
