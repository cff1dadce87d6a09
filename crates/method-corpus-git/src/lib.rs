//! Snapshot acquisition: shallow working copies pinned to a commit.

use std::path::{Path, PathBuf};

use git2::{Cred, FetchOptions, RemoteCallbacks};
use method_corpus_core::{RepositoryDescriptor, Snapshot};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors raised while acquiring or releasing a working copy.
#[derive(Debug, Error)]
pub enum AcquireError {
    /// The clone itself failed (network, access, disk).
    #[error("Failed to clone {url}: {source}")]
    Clone {
        url: String,
        #[source]
        source: git2::Error,
    },

    /// The working copy exists but its head commit could not be resolved.
    #[error("Failed to resolve head commit in {path}: {message}")]
    HeadCommit { path: PathBuf, message: String },

    /// Preparing or removing the working-copy directory failed.
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Capability for obtaining and discarding working copies.
///
/// The pipeline owns each snapshot for the duration of one repository and
/// always hands it back through [`SnapshotSource::release`].
pub trait SnapshotSource {
    /// Produce a fresh local working copy of `repo`.
    fn acquire(&self, repo: &RepositoryDescriptor) -> Result<Snapshot, AcquireError>;

    /// Delete the working copy.
    fn release(&self, snapshot: &Snapshot) -> Result<(), AcquireError> {
        discard_snapshot(snapshot)
    }
}

/// Default `git2`-backed source cloning over HTTPS into a work directory.
#[derive(Debug, Clone)]
pub struct GitSnapshotSource {
    /// Parent directory of all working copies.
    pub work_dir: PathBuf,
    /// History depth of the clone; `0` fetches full history.
    pub depth: i32,
    /// Access token offered as HTTPS credentials when present.
    pub token: Option<String>,
}

impl GitSnapshotSource {
    /// Construct a source cloning into `work_dir` with the given depth.
    pub fn new(work_dir: impl Into<PathBuf>, depth: i32) -> Self {
        Self {
            work_dir: work_dir.into(),
            depth,
            token: None,
        }
    }

    /// Authenticate clones with a token.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// Where the working copy of `repo` lives.
    pub fn target_dir(&self, repo: &RepositoryDescriptor) -> PathBuf {
        self.work_dir.join(repo.dir_name())
    }

    /// Clone `url` into `path`, honouring depth and credentials.
    pub fn clone_into(&self, url: &str, path: &Path) -> Result<(), AcquireError> {
        let mut callbacks = RemoteCallbacks::new();
        if let Some(token) = self.token.clone() {
            callbacks.credentials(move |_url, _username_from_url, _allowed_types| {
                Cred::userpass_plaintext("x-access-token", &token)
            });
        }

        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(callbacks);
        if self.depth > 0 {
            fetch_options.depth(self.depth);
        }

        git2::build::RepoBuilder::new()
            .fetch_options(fetch_options)
            .clone(url, path)
            .map_err(|source| AcquireError::Clone {
                url: url.to_string(),
                source,
            })?;

        Ok(())
    }
}

impl SnapshotSource for GitSnapshotSource {
    fn acquire(&self, repo: &RepositoryDescriptor) -> Result<Snapshot, AcquireError> {
        let target = self.target_dir(repo);

        // Leftover from an interrupted run.
        if target.exists() {
            debug!(path = %target.display(), "Removing stale working copy");
            remove_dir(&target)?;
        }
        std::fs::create_dir_all(&self.work_dir).map_err(|source| AcquireError::Io {
            path: self.work_dir.clone(),
            source,
        })?;

        let url = repo.clone_url();
        info!(repo = %repo.name, url = %url, depth = self.depth, "Cloning repository");
        if let Err(e) = self.clone_into(&url, &target) {
            // A failed clone can leave a partial directory behind.
            remove_partial(&target);
            return Err(e);
        }

        let commit_sha = match head_commit(&target) {
            Ok(sha) => sha,
            Err(e) => {
                remove_partial(&target);
                return Err(e);
            }
        };
        info!(repo = %repo.name, commit = %commit_sha, "Pinned snapshot");

        Ok(Snapshot::new(target, commit_sha))
    }
}

/// Commit the checked-out `HEAD` points at.
pub fn head_commit(path: &Path) -> Result<String, AcquireError> {
    let head_error = |e: git2::Error| AcquireError::HeadCommit {
        path: path.to_path_buf(),
        message: e.message().to_string(),
    };

    let repo = git2::Repository::open(path).map_err(head_error)?;
    let commit = repo
        .head()
        .and_then(|head| head.peel_to_commit())
        .map_err(head_error)?;

    Ok(commit.id().to_string())
}

/// Remove a working copy from disk. Missing directories are not an error.
pub fn discard_snapshot(snapshot: &Snapshot) -> Result<(), AcquireError> {
    if !snapshot.local_path.exists() {
        return Ok(());
    }
    remove_dir(&snapshot.local_path)
}

fn remove_dir(path: &Path) -> Result<(), AcquireError> {
    std::fs::remove_dir_all(path).map_err(|source| AcquireError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn remove_partial(path: &Path) {
    if !path.exists() {
        return;
    }
    if let Err(e) = std::fs::remove_dir_all(path) {
        warn!(path = %path.display(), error = %e, "Failed to remove partial working copy");
    }
}
