//! Batch upgrade over state files
//!
//! Files are independent, so they are upgraded in parallel; each file's own
//! chain runs sequentially inside [`UpgradeChain::resolve`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use rayon::prelude::*;
use stateup_engine::{MigrationPath, UpgradeChain};
use stateup_schema::Diagnostics;

use crate::document::StateDocument;

/// Outcome for one file
#[derive(Debug, Clone)]
pub struct FileReport {
    /// File read
    pub source: PathBuf,
    /// Upgraded document, `None` on failure
    pub document: Option<StateDocument>,
    /// Diagnostics from the chain
    pub diagnostics: Diagnostics,
    /// Steps applied
    pub path: MigrationPath,
}

impl FileReport {
    /// Whether the file was upgraded without errors
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.document.is_some() && !self.diagnostics.has_error()
    }
}

/// Read, resolve and convert one file
///
/// # Errors
/// Returns error for I/O or document format problems; upgrade problems are
/// reported in [`FileReport::diagnostics`] instead.
pub fn upgrade_file(chain: &UpgradeChain, source: &Path) -> anyhow::Result<FileReport> {
    let bytes = std::fs::read(source)
        .with_context(|| format!("failed to read '{}'", source.display()))?;
    let document = StateDocument::from_slice(&bytes)
        .with_context(|| format!("in '{}'", source.display()))?;

    let resolution = chain.resolve(&document.to_versioned()?);
    let upgraded = resolution
        .state
        .as_ref()
        .map(StateDocument::from_versioned)
        .transpose()?;

    tracing::debug!(file = %source.display(), path = %resolution.path, "processed state file");
    Ok(FileReport {
        source: source.to_path_buf(),
        document: upgraded,
        diagnostics: resolution.diagnostics,
        path: resolution.path,
    })
}

/// Upgrade every file in parallel, keeping input order in the result
pub fn upgrade_files(
    chain: &UpgradeChain,
    sources: &[PathBuf],
) -> Vec<(PathBuf, anyhow::Result<FileReport>)> {
    sources
        .par_iter()
        .map(|source| (source.clone(), upgrade_file(chain, source)))
        .collect()
}

/// Where the upgraded copy of `source` goes inside `out_dir`
#[must_use]
pub fn output_path(out_dir: &Path, source: &Path) -> PathBuf {
    match source.file_name() {
        Some(name) => out_dir.join(name),
        None => out_dir.join("state.json"),
    }
}

/// Write an upgraded document into `out_dir`
///
/// # Errors
/// Returns error if the document cannot be written
pub fn write_document(out_dir: &Path, report: &FileReport) -> anyhow::Result<Option<PathBuf>> {
    let Some(document) = &report.document else {
        return Ok(None);
    };
    let target = output_path(out_dir, &report.source);
    let text = document.to_pretty_string()?;
    std::fs::write(&target, text)
        .with_context(|| format!("failed to write '{}'", target.display()))?;
    Ok(Some(target))
}

/// Write every successful report into `out_dir`, keeping input order
///
/// Reports whose targets coincide with another report's are not written;
/// each of them gets an error instead of overwriting the other.
pub fn write_documents(
    out_dir: &Path,
    reports: &[FileReport],
) -> Vec<(PathBuf, anyhow::Result<Option<PathBuf>>)> {
    let mut claims: HashMap<PathBuf, usize> = HashMap::new();
    for report in reports.iter().filter(|report| report.document.is_some()) {
        *claims.entry(output_path(out_dir, &report.source)).or_default() += 1;
    }

    reports
        .iter()
        .map(|report| {
            let target = output_path(out_dir, &report.source);
            let result = match claims.get(&target) {
                Some(&count) if count > 1 && report.document.is_some() => {
                    tracing::warn!(file = %report.source.display(), target = %target.display(), count, "output collision");
                    Err(anyhow::anyhow!(
                        "output '{}' would be written by {count} inputs",
                        target.display()
                    ))
                }
                _ => write_document(out_dir, report),
            };
            (report.source.clone(), result)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_keeps_file_name() {
        assert_eq!(
            output_path(Path::new("/out"), Path::new("/in/state-1.json")),
            PathBuf::from("/out/state-1.json")
        );
        assert_eq!(
            output_path(Path::new("/out"), Path::new("/")),
            PathBuf::from("/out/state.json")
        );
    }

    #[test]
    fn same_file_name_collides() {
        assert_eq!(
            output_path(Path::new("/out"), Path::new("/a/state.json")),
            output_path(Path::new("/out"), Path::new("/b/state.json"))
        );
    }
}
