//! Rules command: print the rule catalog as a tree

use anyhow::Result;
use console::style;

use crate::config::ProjectConfig;
use crate::models::Severity;
use crate::rules::{CatalogEntry, RuleCatalog};

pub fn run(config: &ProjectConfig) -> Result<()> {
    let catalog = RuleCatalog::builtin();
    let disabled: Vec<&str> = config.rules.disabled.iter().map(String::as_str).collect();

    println!("{}", style("Rule catalog").bold());
    for entry in catalog.entries() {
        let line = format_entry(&entry);
        if disabled.contains(&entry.id) {
            println!("{}  {}", style(line).dim(), style("(disabled)").dim());
        } else {
            println!("{}", line);
        }
    }
    Ok(())
}

fn format_entry(entry: &CatalogEntry) -> String {
    let indent = "  ".repeat(entry.depth + 1);
    let severity = entry.severity.map(|s| s.as_str()).unwrap_or("group");
    let id_width = 30usize.saturating_sub(indent.len());
    format!(
        "{indent}{:<id_width$} {:<6}  {}",
        entry.id, severity, entry.description
    )
}
