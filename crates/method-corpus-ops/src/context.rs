//! MiningContext - drives a whole corpus run.
//!
//! Discovery, then one repository at a time: acquire, enumerate, extract,
//! normalize, append, clean up. Nothing overlaps; emission order is discovery
//! order, then file order, then declaration order, and that order alone
//! decides split labels.

use method_corpus_core::{RepositoryDescriptor, Snapshot};
use method_corpus_git::{GitSnapshotSource, SnapshotSource};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::discovery::{discover, GitHubSearch, RepositorySearch};
use crate::error::CorpusResult;
use crate::export::{CorpusWriter, UnlabeledRecord};
use crate::extract::JavaMethodExtractor;
use crate::normalize::normalize;
use crate::responses::{MineResponse, RepositoryOutcome, RepositoryReport, SkippedFile};
use crate::scan::enumerate_sources;

/// The main mining context.
#[derive(Debug, Clone)]
pub struct MiningContext {
    /// Configuration for the run.
    pub config: Config,
}

impl MiningContext {
    /// Create a new context with the given configuration.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run against GitHub search and `git2` clones.
    pub async fn run(&self) -> CorpusResult<MineResponse> {
        let search = GitHubSearch::new(self.config.github_token.as_deref())?;
        let snapshots = GitSnapshotSource::new(&self.config.work_dir, self.config.clone_depth)
            .with_token(self.config.github_token.clone());
        self.run_with(&search, &snapshots).await
    }

    /// Run against the given capabilities.
    ///
    /// Fails only when discovery fails or the output table cannot be written.
    pub async fn run_with<S, A>(&self, search: &S, snapshots: &A) -> CorpusResult<MineResponse>
    where
        S: RepositorySearch + ?Sized,
        A: SnapshotSource + ?Sized,
    {
        let repositories = discover(search, &self.config).await?;

        let mut extractor = JavaMethodExtractor::new()?;
        let mut writer = CorpusWriter::open(&self.config.output_path, self.config.split_capacities)?;
        let mut reports = Vec::with_capacity(repositories.len());

        for (i, repo) in repositories.iter().enumerate() {
            if writer.is_full() {
                info!("Corpus capacity reached; not acquiring further repositories");
                break;
            }
            info!(
                repo = %repo.name,
                position = i + 1,
                total = repositories.len(),
                "Processing repository"
            );
            let report = self.mine_repository(repo, snapshots, &mut extractor, &mut writer)?;
            info!(
                repo = %repo.name,
                methods = report.methods_emitted,
                files = report.files_scanned,
                skipped_files = report.skipped_files.len(),
                "Finished repository"
            );
            reports.push(report);
        }

        writer.flush()?;

        Ok(MineResponse {
            repositories: reports,
            rows_written: writer.emitted(),
            split_counts: writer.split_counts().clone(),
            split_capacities: self.config.split_capacities,
            capacity_reached: writer.is_full(),
            output_path: writer.path().to_path_buf(),
        })
    }

    /// Acquire, mine and release one repository.
    ///
    /// Acquisition failure yields a skipped report; only output errors
    /// propagate, and the working copy is released before they do.
    pub fn mine_repository<A>(
        &self,
        repo: &RepositoryDescriptor,
        snapshots: &A,
        extractor: &mut JavaMethodExtractor,
        writer: &mut CorpusWriter,
    ) -> CorpusResult<RepositoryReport>
    where
        A: SnapshotSource + ?Sized,
    {
        let mut report = RepositoryReport::new(&repo.name, &repo.html_url);

        let snapshot = match snapshots.acquire(repo) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(repo = %repo.name, error = %e, "Skipping repository: acquisition failed");
                report.outcome = RepositoryOutcome::AcquisitionFailed {
                    message: e.to_string(),
                };
                return Ok(report);
            }
        };
        report.commit_sha = Some(snapshot.commit_sha.clone());

        let mined = self.mine_snapshot(repo, &snapshot, extractor, writer, &mut report);

        if let Err(e) = snapshots.release(&snapshot) {
            warn!(
                repo = %repo.name,
                path = %snapshot.local_path.display(),
                error = %e,
                "Failed to remove working copy"
            );
        }

        mined.map(|_| report)
    }

    fn mine_snapshot(
        &self,
        repo: &RepositoryDescriptor,
        snapshot: &Snapshot,
        extractor: &mut JavaMethodExtractor,
        writer: &mut CorpusWriter,
        report: &mut RepositoryReport,
    ) -> CorpusResult<()> {
        let sources = enumerate_sources(&snapshot.local_path, &self.config.file_extension);
        debug!(repo = %repo.name, files = sources.len(), "Enumerated source files");

        for source in sources {
            report.files_scanned += 1;

            let methods = match extractor.extract_file(&source.path) {
                Ok(methods) => methods,
                Err(failure) => {
                    warn!(
                        repo = %repo.name,
                        file = %source.relative_path,
                        kind = %failure.kind,
                        line = ?failure.line,
                        "Skipping file: {}",
                        failure.message
                    );
                    report.skipped_files.push(SkippedFile {
                        file_path: source.relative_path,
                        kind: failure.kind,
                        line: failure.line,
                        message: failure.message,
                    });
                    continue;
                }
            };

            for method in methods {
                let normalized = normalize(&method.body);
                let record = UnlabeledRecord {
                    repo_name: repo.name.clone(),
                    repo_url: repo.html_url.clone(),
                    commit_sha: snapshot.commit_sha.clone(),
                    file_path: source.relative_path.clone(),
                    method_name: method.name,
                    start_line: method.start_line,
                    end_line: method.end_line,
                    signature: method.signature,
                    original_code: normalized.original_code,
                    code_tokens: normalized.code_tokens,
                };

                if writer.append(record)?.is_none() {
                    writer.flush()?;
                    report.outcome = RepositoryOutcome::CapacityReached;
                    return Ok(());
                }
                report.methods_emitted += 1;
            }

            writer.flush()?;
        }

        if writer.is_full() {
            report.outcome = RepositoryOutcome::CapacityReached;
        }
        Ok(())
    }
}
