use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const DATA_FILE_EXTENSION: &str = "json";

/// Recursively collect the absolute paths of all `.json` files under `root`.
///
/// Symlinks are followed. Paths are sorted so that reruns visit files in the
/// same order.
pub fn discover_json_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        bail!("Data directory {} does not exist", root.display());
    }
    let root = root
        .canonicalize()
        .with_context(|| format!("Error resolving path: {}", root.display()))?;

    let mut files = Vec::new();
    for entry in WalkDir::new(&root).follow_links(true) {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_json = entry
            .path()
            .extension()
            .map(|ext| ext == DATA_FILE_EXTENSION)
            .unwrap_or(false);
        if is_json {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}
