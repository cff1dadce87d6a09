//! Core domain types shared across the method corpus workspace.
//!
//! Everything here is plain data: repository provenance, working-copy
//! snapshots, the exported method rows, and the two pure policies that decide
//! what gets in (license allow-set) and where it lands (dataset split).

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// =============================================================================
// Repository Provenance
// =============================================================================

/// A repository accepted by discovery.
///
/// Immutable once produced; every [`MethodRecord`] mined from the repository
/// carries its `name` and `html_url` as provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryDescriptor {
    /// Full `owner/name` of the repository.
    pub name: String,
    /// Browser URL of the repository.
    pub html_url: String,
    /// SPDX identifier of the repository license.
    pub license_id: String,
    /// Popularity at discovery time.
    pub star_count: u32,
}

impl RepositoryDescriptor {
    /// Create a new descriptor.
    pub fn new(
        name: impl Into<String>,
        html_url: impl Into<String>,
        license_id: impl Into<String>,
        star_count: u32,
    ) -> Self {
        Self {
            name: name.into(),
            html_url: html_url.into(),
            license_id: license_id.into(),
            star_count,
        }
    }

    /// HTTPS clone URL derived from the browser URL.
    pub fn clone_url(&self) -> String {
        let base = self.html_url.trim_end_matches('/');
        if base.ends_with(".git") {
            base.to_string()
        } else {
            format!("{}.git", base)
        }
    }

    /// Filesystem-safe directory name for the working copy (`owner_name`).
    pub fn dir_name(&self) -> String {
        self.name
            .chars()
            .map(|c| match c {
                'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '.' => c,
                _ => '_',
            })
            .collect()
    }
}

/// A pinned local working copy of a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Root of the working copy on disk.
    pub local_path: PathBuf,
    /// Head commit of the default branch at acquisition time.
    pub commit_sha: String,
}

impl Snapshot {
    /// Create a new snapshot.
    pub fn new(local_path: impl Into<PathBuf>, commit_sha: impl Into<String>) -> Self {
        Self {
            local_path: local_path.into(),
            commit_sha: commit_sha.into(),
        }
    }
}

/// Whether `sha` is a full 40-character hexadecimal commit identifier.
pub fn is_commit_sha(sha: &str) -> bool {
    sha.len() == 40 && sha.bytes().all(|b| b.is_ascii_hexdigit())
}

// =============================================================================
// License Policy
// =============================================================================

/// SPDX placeholder GitHub reports when it cannot identify a license.
pub const NO_ASSERTION: &str = "NOASSERTION";

/// Permissive licenses accepted by default.
pub const DEFAULT_PERMISSIVE_LICENSES: &[&str] = &[
    "MIT",
    "BSD-2-Clause",
    "BSD-3-Clause",
    "Apache-2.0",
    "ISC",
    "Unlicense",
    "CC0-1.0",
];

/// Predicate over SPDX identifiers against a fixed allow-set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseFilter {
    allowed: BTreeSet<String>,
}

impl LicenseFilter {
    /// Build a filter from an explicit allow-set.
    pub fn new(allowed: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    /// Filter over [`DEFAULT_PERMISSIVE_LICENSES`].
    pub fn permissive() -> Self {
        Self::new(DEFAULT_PERMISSIVE_LICENSES.iter().copied())
    }

    /// Whether a license identifier is allowed.
    ///
    /// A missing identifier and [`NO_ASSERTION`] are never allowed.
    pub fn permits(&self, license_id: Option<&str>) -> bool {
        match license_id {
            None | Some(NO_ASSERTION) | Some("") => false,
            Some(id) => self.allowed.contains(id),
        }
    }

    /// The allow-set, in sorted order.
    pub fn allowed(&self) -> impl Iterator<Item = &str> {
        self.allowed.iter().map(String::as_str)
    }
}

impl Default for LicenseFilter {
    fn default() -> Self {
        Self::permissive()
    }
}

// =============================================================================
// Dataset Splits
// =============================================================================

/// Corpus partition a record is assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetSplit {
    Train,
    Eval,
    Test,
}

impl DatasetSplit {
    /// All splits in assignment order.
    pub const ALL: [DatasetSplit; 3] = [DatasetSplit::Train, DatasetSplit::Eval, DatasetSplit::Test];

    /// Label written to the output table.
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetSplit::Train => "train",
            DatasetSplit::Eval => "eval",
            DatasetSplit::Test => "test",
        }
    }
}

impl fmt::Display for DatasetSplit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed split capacities, filled in order with no shuffling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitPolicy {
    pub train: usize,
    pub eval: usize,
    pub test: usize,
}

impl Default for SplitPolicy {
    fn default() -> Self {
        Self {
            train: 20_000,
            eval: 5_000,
            test: 5_000,
        }
    }
}

impl SplitPolicy {
    /// Total number of records the corpus can hold.
    pub fn capacity(&self) -> usize {
        self.train + self.eval + self.test
    }

    /// Split for the record at 0-based emission `index`, or `None` once the
    /// corpus is full.
    pub fn assign(&self, index: usize) -> Option<DatasetSplit> {
        if index < self.train {
            Some(DatasetSplit::Train)
        } else if index < self.train + self.eval {
            Some(DatasetSplit::Eval)
        } else if index < self.capacity() {
            Some(DatasetSplit::Test)
        } else {
            None
        }
    }

    /// Capacity of one split.
    pub fn capacity_of(&self, split: DatasetSplit) -> usize {
        match split {
            DatasetSplit::Train => self.train,
            DatasetSplit::Eval => self.eval,
            DatasetSplit::Test => self.test,
        }
    }
}

// =============================================================================
// Method Records
// =============================================================================

/// Column order of the exported table.
pub const COLUMNS: [&str; 11] = [
    "dataset_split",
    "repo_name",
    "repo_url",
    "commit_sha",
    "file_path",
    "method_name",
    "start_line",
    "end_line",
    "signature",
    "original_code",
    "code_tokens",
];

/// One exported method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodRecord {
    pub dataset_split: DatasetSplit,
    pub repo_name: String,
    pub repo_url: String,
    pub commit_sha: String,
    /// `/`-separated path relative to the working-copy root.
    pub file_path: String,
    pub method_name: String,
    /// 1-based, inclusive.
    pub start_line: usize,
    /// 1-based, inclusive. Heuristic, see the extractor.
    pub end_line: usize,
    pub signature: String,
    /// Comment-free, whitespace-collapsed method text.
    pub original_code: String,
    pub code_tokens: Vec<String>,
}

impl MethodRecord {
    /// `code_tokens` as a JSON array, the form stored in the table.
    pub fn code_tokens_cell(&self) -> String {
        serde_json::to_string(&self.code_tokens).unwrap_or_else(|_| "[]".to_string())
    }

    /// Row cells in [`COLUMNS`] order.
    pub fn to_row(&self) -> [String; 11] {
        [
            self.dataset_split.to_string(),
            self.repo_name.clone(),
            self.repo_url.clone(),
            self.commit_sha.clone(),
            self.file_path.clone(),
            self.method_name.clone(),
            self.start_line.to_string(),
            self.end_line.to_string(),
            self.signature.clone(),
            self.original_code.clone(),
            self.code_tokens_cell(),
        ]
    }
}
