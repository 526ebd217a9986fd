//! Source file discovery and workspace loading
//!
//! Directories are walked with one `**/*.{ext}` glob per configured
//! extension. Dotfiles, dot directories and excluded directory names are
//! skipped; files named explicitly on the command line are always loaded.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};
use glob::glob;
use thalo_core::Workspace;
use thalo_validate::WorkspaceSettings;
use tracing::{debug, warn};

/// A file read from disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Workspace filename, the path as given without a leading `./`
    pub name: String,
    pub text: String,
}

/// Expand files and directories into a sorted, deduplicated file list
pub fn discover(paths: &[PathBuf], settings: &WorkspaceSettings) -> Result<Vec<PathBuf>> {
    let mut found = BTreeSet::new();

    for path in paths {
        if path.is_file() {
            found.insert(path.clone());
            continue;
        }
        if !path.is_dir() {
            bail!("Path not found: {}", path.display());
        }

        for extension in &settings.extensions {
            let pattern = path.join(format!("**/*.{}", extension)).display().to_string();
            for entry in glob(&pattern).with_context(|| format!("Invalid glob pattern: {}", pattern))? {
                match entry {
                    Ok(file) if is_excluded(path, &file, &settings.exclude) => {}
                    Ok(file) => {
                        found.insert(file);
                    }
                    Err(err) => warn!(error = %err, "skipping unreadable path"),
                }
            }
        }
    }

    Ok(found.into_iter().collect())
}

fn is_excluded(root: &Path, file: &Path, exclude: &[String]) -> bool {
    let relative = file.strip_prefix(root).unwrap_or(file);
    relative.components().any(|component| match component {
        Component::Normal(name) => {
            let name = name.to_string_lossy();
            name.starts_with('.') || exclude.iter().any(|e| e.as_str() == name.as_ref())
        }
        _ => false,
    })
}

fn display_name(path: &Path) -> String {
    path.strip_prefix("./").unwrap_or(path).display().to_string()
}

/// Read every discovered file
///
/// Files that are not valid UTF-8 or cannot be read are skipped with a
/// warning.
pub fn load(paths: &[PathBuf], settings: &WorkspaceSettings) -> Result<Vec<SourceFile>> {
    let mut files = Vec::new();
    for path in discover(paths, settings)? {
        match fs::read_to_string(&path) {
            Ok(text) => files.push(SourceFile {
                name: display_name(&path),
                path,
                text,
            }),
            Err(err) => warn!(path = %path.display(), error = %err, "skipping file"),
        }
    }
    debug!(count = files.len(), "loaded source files");
    Ok(files)
}

/// Add every file to a fresh workspace
pub fn build_workspace(files: &[SourceFile]) -> Result<Workspace> {
    let mut workspace = Workspace::new();
    for file in files {
        workspace
            .add_document(&file.text, &file.name)
            .with_context(|| format!("Failed to load {}", file.path.display()))?;
    }
    Ok(workspace)
}
