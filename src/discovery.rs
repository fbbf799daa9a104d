//! Input discovery
//!
//! Explicit file arguments are taken as-is. Directories are walked with
//! `.gitignore`, `.ignore` and `.containerguardignore` rules applied and
//! filtered down to container build files and YAML manifests.

use anyhow::{bail, Result};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extra ignore file honored while walking directories
pub const IGNORE_FILENAME: &str = ".containerguardignore";

const MANIFEST_EXTENSIONS: &[&str] = &["yaml", "yml"];

/// Whether `path` looks like a Dockerfile or a Kubernetes manifest
pub fn is_candidate(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };

    if name == "Dockerfile" || name.starts_with("Dockerfile.") {
        return true;
    }

    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("dockerfile") => true,
        Some(ext) => MANIFEST_EXTENSIONS.contains(&ext),
        None => false,
    }
}

/// Expand CLI arguments into the sorted, de-duplicated list of files to scan
pub fn collect_targets(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            let found = walk_dir(path);
            debug!("Found {} candidate files under {}", found.len(), path.display());
            files.extend(found);
        } else if path.exists() {
            files.push(path.clone());
        } else {
            bail!("Path does not exist: {}", path.display());
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

fn walk_dir(root: &Path) -> Vec<PathBuf> {
    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(true)
        .git_ignore(true)
        .git_global(false)
        .git_exclude(true)
        .require_git(false)
        .add_custom_ignore_filename(IGNORE_FILENAME);

    builder
        .build()
        .flatten()
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file() && is_candidate(path))
        .collect()
}
