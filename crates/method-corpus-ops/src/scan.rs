//! Source enumeration inside a working copy.

use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

/// A source file found in a working copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// `/`-separated path relative to the working-copy root.
    pub relative_path: String,
}

/// List every file with `extension` under `root`, recursively.
///
/// Order is deterministic (file names sorted at every level) because record
/// order decides dataset splits. VCS metadata directories are never entered.
pub fn enumerate_sources(root: &Path, extension: &str) -> Vec<SourceFile> {
    let mut sources = Vec::new();

    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_vcs_dir(e))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(root = %root.display(), error = %e, "Skipping unreadable directory entry");
                continue;
            }
        };

        if !entry.file_type().is_file() || !has_extension(entry.path(), extension) {
            continue;
        }

        let relative_path = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        sources.push(SourceFile {
            path: entry.path().to_path_buf(),
            relative_path,
        });
    }

    sources
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == extension)
        .unwrap_or(false)
}

fn is_vcs_dir(entry: &walkdir::DirEntry) -> bool {
    const VCS_DIRS: &[&str] = &[".git", ".hg", ".svn"];

    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|s| VCS_DIRS.contains(&s))
            .unwrap_or(false)
}
