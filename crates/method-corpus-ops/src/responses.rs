//! Report DTOs returned by a mining run.

use std::collections::BTreeMap;
use std::path::PathBuf;

use method_corpus_core::{DatasetSplit, SplitPolicy};
use serde::{Deserialize, Serialize};

use crate::extract::ParseFailureKind;

/// How processing of one repository ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RepositoryOutcome {
    /// Every enumerated file was visited.
    Completed,
    /// The corpus filled up while this repository was being mined.
    CapacityReached,
    /// The working copy could not be obtained; nothing was emitted.
    AcquisitionFailed { message: String },
}

/// A file that contributed no rows because it failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub file_path: String,
    pub kind: ParseFailureKind,
    pub line: Option<usize>,
    pub message: String,
}

/// Per-repository summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryReport {
    pub repo_name: String,
    pub repo_url: String,
    pub commit_sha: Option<String>,
    pub files_scanned: usize,
    pub skipped_files: Vec<SkippedFile>,
    pub methods_emitted: usize,
    pub outcome: RepositoryOutcome,
}

impl RepositoryReport {
    pub(crate) fn new(repo_name: &str, repo_url: &str) -> Self {
        Self {
            repo_name: repo_name.to_string(),
            repo_url: repo_url.to_string(),
            commit_sha: None,
            files_scanned: 0,
            skipped_files: vec![],
            methods_emitted: 0,
            outcome: RepositoryOutcome::Completed,
        }
    }

    /// Whether the repository was skipped before any extraction.
    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, RepositoryOutcome::AcquisitionFailed { .. })
    }
}

/// Result of a whole mining run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MineResponse {
    /// One entry per repository attempted, in processing order.
    pub repositories: Vec<RepositoryReport>,
    /// Rows appended by this run.
    pub rows_written: usize,
    /// Rows appended per split.
    pub split_counts: BTreeMap<DatasetSplit, usize>,
    /// Capacities the rows were labelled against.
    pub split_capacities: SplitPolicy,
    /// Whether the run stopped because every split was full.
    pub capacity_reached: bool,
    /// The output table.
    pub output_path: PathBuf,
}

impl MineResponse {
    /// Total files visited across repositories.
    pub fn files_scanned(&self) -> usize {
        self.repositories.iter().map(|r| r.files_scanned).sum()
    }

    /// Total files skipped on parse failure.
    pub fn files_skipped(&self) -> usize {
        self.repositories.iter().map(|r| r.skipped_files.len()).sum()
    }

    /// Repositories skipped on acquisition failure.
    pub fn repositories_skipped(&self) -> usize {
        self.repositories.iter().filter(|r| r.is_skipped()).count()
    }
}
