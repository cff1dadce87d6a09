//! Offline stand-ins for the search and acquisition capabilities.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use method_corpus_core::{RepositoryDescriptor, Snapshot};
use method_corpus_ops::{
    AcquireError, Config, RepositorySearch, SearchCandidate, SearchFailure, SearchQuery,
    SnapshotSource,
};

/// Search returning scripted pages in order, then empty pages.
pub struct ScriptedSearch {
    script: Mutex<VecDeque<Result<Vec<SearchCandidate>, SearchFailure>>>,
    requested: Mutex<Vec<u32>>,
}

impl ScriptedSearch {
    pub fn new(script: Vec<Result<Vec<SearchCandidate>, SearchFailure>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requested: Mutex::new(vec![]),
        }
    }

    /// A single successful page.
    pub fn single_page(candidates: Vec<SearchCandidate>) -> Self {
        Self::new(vec![Ok(candidates)])
    }

    /// Page numbers requested so far, retries included.
    pub fn requested_pages(&self) -> Vec<u32> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl RepositorySearch for ScriptedSearch {
    async fn search_page(
        &self,
        _query: &SearchQuery,
        page: u32,
    ) -> Result<Vec<SearchCandidate>, SearchFailure> {
        self.requested.lock().unwrap().push(page);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(vec![]))
    }
}

pub fn candidate(full_name: &str, license: Option<&str>, stars: u32) -> SearchCandidate {
    SearchCandidate {
        full_name: full_name.to_string(),
        html_url: format!("https://github.com/{}", full_name),
        license_id: license.map(str::to_string),
        star_count: stars,
    }
}

/// Materializes fixture repositories as real git working copies.
pub struct FixtureSnapshots {
    work_dir: PathBuf,
    repos: HashMap<String, Vec<(String, String)>>,
    failing: HashSet<String>,
    acquired: Mutex<Vec<String>>,
}

impl FixtureSnapshots {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            repos: HashMap::new(),
            failing: HashSet::new(),
            acquired: Mutex::new(vec![]),
        }
    }

    pub fn with_repo(mut self, name: &str, files: &[(&str, &str)]) -> Self {
        self.repos.insert(
            name.to_string(),
            files
                .iter()
                .map(|(p, c)| (p.to_string(), c.to_string()))
                .collect(),
        );
        self
    }

    pub fn failing(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    /// Repository names acquisition was attempted for, in order.
    pub fn acquired(&self) -> Vec<String> {
        self.acquired.lock().unwrap().clone()
    }

    /// Working copies still present on disk.
    pub fn leftover_dirs(&self) -> usize {
        fs::read_dir(&self.work_dir)
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

impl SnapshotSource for FixtureSnapshots {
    fn acquire(&self, repo: &RepositoryDescriptor) -> Result<Snapshot, AcquireError> {
        self.acquired.lock().unwrap().push(repo.name.clone());
        let dir = self.work_dir.join(repo.dir_name());

        if self.failing.contains(&repo.name) {
            return Err(AcquireError::HeadCommit {
                path: dir,
                message: "remote hung up unexpectedly".to_string(),
            });
        }

        let files = self.repos.get(&repo.name).cloned().unwrap_or_default();
        fs::create_dir_all(&dir).unwrap();
        for (path, contents) in &files {
            let target = dir.join(path);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(target, contents).unwrap();
        }
        let sha = commit_all(&dir);

        Ok(Snapshot::new(dir, sha))
    }
}

/// Initialise a repository at `dir` and commit every file in it.
pub fn commit_all(dir: &Path) -> String {
    let repo = git2::Repository::init(dir).unwrap();
    let mut index = repo.index().unwrap();
    index
        .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
        .unwrap();
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let sig = git2::Signature::now("Fixture", "fixture@example.com").unwrap();
    repo.commit(Some("HEAD"), &sig, &sig, "fixture", &tree, &[])
        .unwrap()
        .to_string()
}

/// Configuration writing under `root` with no delays.
pub fn test_config(root: &Path) -> Config {
    Config {
        output_path: root.join("out").join("methods.csv"),
        work_dir: root.join("work"),
        search_page_delay_ms: 0,
        search_retry_backoff_ms: 0,
        github_token: None,
        ..Config::default()
    }
}

/// All rows of a CSV table, header included.
pub fn read_rows(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .unwrap();
    reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}
