//! Split labelling and incremental CSV export.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use method_corpus_core::{DatasetSplit, MethodRecord, SplitPolicy, COLUMNS};
use tracing::{debug, info};

use crate::error::CorpusResult;

/// A finished method row still waiting for its split label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlabeledRecord {
    pub repo_name: String,
    pub repo_url: String,
    pub commit_sha: String,
    pub file_path: String,
    pub method_name: String,
    pub start_line: usize,
    pub end_line: usize,
    pub signature: String,
    pub original_code: String,
    pub code_tokens: Vec<String>,
}

impl UnlabeledRecord {
    /// Attach a split label.
    pub fn label(self, dataset_split: DatasetSplit) -> MethodRecord {
        MethodRecord {
            dataset_split,
            repo_name: self.repo_name,
            repo_url: self.repo_url,
            commit_sha: self.commit_sha,
            file_path: self.file_path,
            method_name: self.method_name,
            start_line: self.start_line,
            end_line: self.end_line,
            signature: self.signature,
            original_code: self.original_code,
            code_tokens: self.code_tokens,
        }
    }
}

/// Append-only output table with the running emission counter.
///
/// The header is written exactly once: only when the file is new or empty.
/// Reopening an existing table appends rows and never repeats the header.
pub struct CorpusWriter {
    path: PathBuf,
    writer: csv::Writer<File>,
    policy: SplitPolicy,
    emitted: usize,
    counts: BTreeMap<DatasetSplit, usize>,
}

impl CorpusWriter {
    /// Open (or create) the table at `path` for appending.
    pub fn open(path: impl AsRef<Path>, policy: SplitPolicy) -> CorpusResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let is_empty = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_empty {
            writer.write_record(COLUMNS)?;
            writer.flush()?;
            debug!(path = %path.display(), "Wrote table header");
        } else {
            info!(path = %path.display(), "Appending to existing table");
        }

        Ok(Self {
            path,
            writer,
            policy,
            emitted: 0,
            counts: BTreeMap::new(),
        })
    }

    /// Label and append one record.
    ///
    /// Returns the assigned split, or `None` when the corpus is already full,
    /// in which case nothing is written.
    pub fn append(&mut self, record: UnlabeledRecord) -> CorpusResult<Option<DatasetSplit>> {
        let Some(split) = self.policy.assign(self.emitted) else {
            return Ok(None);
        };

        let record = record.label(split);
        self.writer.write_record(record.to_row())?;
        self.emitted += 1;
        *self.counts.entry(split).or_insert(0) += 1;

        Ok(Some(split))
    }

    /// Push buffered rows to disk.
    pub fn flush(&mut self) -> CorpusResult<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Whether every split is at capacity.
    pub fn is_full(&self) -> bool {
        self.policy.assign(self.emitted).is_none()
    }

    /// Rows written by this writer.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Rows written per split.
    pub fn split_counts(&self) -> &BTreeMap<DatasetSplit, usize> {
        &self.counts
    }

    /// Location of the table.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
