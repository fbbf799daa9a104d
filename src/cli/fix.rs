//! Fix command implementation
//!
//! Runs the remediation steps over each input and writes the hardened text
//! to `fixed_<name>`, an output directory, the original file or stdout.

use anyhow::{bail, Context, Result};
use console::style;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::discovery::collect_targets;
use crate::remediation::RemediationEngine;

/// Prefix for remediated copies
pub const FIXED_PREFIX: &str = "fixed_";

#[derive(Debug, Default)]
pub struct FixOptions {
    pub paths: Vec<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub in_place: bool,
    pub stdout: bool,
    pub dry_run: bool,
}

/// Run the fix command
pub fn run(options: FixOptions) -> Result<()> {
    let files: Vec<PathBuf> = collect_targets(&options.paths)?
        .into_iter()
        .filter(|path| {
            let is_output = file_name(path).starts_with(FIXED_PREFIX);
            if is_output {
                debug!("Skipping previous output {}", path.display());
            }
            !is_output
        })
        .collect();

    if files.is_empty() {
        bail!("No Dockerfiles or YAML manifests found");
    }
    if options.stdout && files.len() > 1 {
        bail!(
            "--stdout needs exactly one input, got {} files",
            files.len()
        );
    }
    if let Some(dir) = &options.output_dir {
        if !options.dry_run {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
    }

    let engine = RemediationEngine::builtin();
    for path in &files {
        let original = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let remediation = engine.remediate_with_changes(&original);

        if options.dry_run {
            if remediation.is_unchanged() {
                println!("{}: {}", path.display(), style("nothing to fix").dim());
            } else {
                println!(
                    "{}: {}",
                    path.display(),
                    style(remediation.applied.join(", ")).yellow()
                );
            }
            continue;
        }

        if options.stdout {
            print!("{}", remediation.fixed);
            continue;
        }

        if options.in_place && remediation.is_unchanged() {
            println!("{} {} already hardened", style("·").dim(), path.display());
            continue;
        }

        let destination = destination_for(path, &options);
        fs::write(&destination, &remediation.fixed)
            .with_context(|| format!("Failed to write {}", destination.display()))?;
        println!(
            "{} {} ({} fixes)",
            style("✓").green(),
            destination.display(),
            remediation.applied.len()
        );
    }

    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Where the fixed copy of `path` goes
fn destination_for(path: &Path, options: &FixOptions) -> PathBuf {
    if options.in_place {
        return path.to_path_buf();
    }
    let name = format!("{}{}", FIXED_PREFIX, file_name(path));
    match &options.output_dir {
        Some(dir) => dir.join(name),
        None => path
            .parent()
            .map(|parent| parent.join(&name))
            .unwrap_or_else(|| PathBuf::from(&name)),
    }
}
