//! CSV export with a `Level,Message,Suggestion` header
//!
//! Fields containing a comma, quote or line break are quoted and inner
//! quotes doubled (RFC 4180). Rows end with CRLF.

use crate::models::BatchReport;
use anyhow::Result;

const HEADER: [&str; 3] = ["Level", "Message", "Suggestion"];

pub fn render(report: &BatchReport) -> Result<String> {
    let mut out = String::new();
    push_row(&mut out, &HEADER);
    for finding in report.all_findings() {
        push_row(
            &mut out,
            &[
                finding.severity.as_str(),
                finding.message.as_str(),
                finding.suggestion.as_str(),
            ],
        );
    }
    Ok(out)
}

fn push_row(out: &mut String, fields: &[&str]) {
    let row: Vec<String> = fields.iter().map(|f| escape_field(f)).collect();
    out.push_str(&row.join(","));
    out.push_str("\r\n");
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporters::tests::test_report;

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a, b"), "\"a, b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_csv_render() {
        let out = render(&test_report()).unwrap();
        let rows: Vec<&str> = out.split("\r\n").filter(|r| !r.is_empty()).collect();
        assert_eq!(rows[0], "Level,Message,Suggestion");
        assert_eq!(rows.len(), 4);
        assert_eq!(
            rows[1],
            "HIGH,Runs as root user,\"Use non-root user (CIS Docker Benchmark 4.1, OWASP A3)\""
        );
        assert_eq!(
            rows[3],
            "MEDIUM,Advisory suggestion,\"Pin package versions, e.g. \"\"curl=7.88\"\"\""
        );
    }

    #[test]
    fn test_csv_header_only_when_empty() {
        let report = crate::models::BatchReport::new(vec![], vec![]);
        assert_eq!(render(&report).unwrap(), "Level,Message,Suggestion\r\n");
    }
}
