//! Run configuration.
//!
//! Every knob is fixed policy with a default. A local `.env` file, an optional
//! JSON config file and environment variables can override a few of them, in
//! that order of increasing precedence.

use std::path::PathBuf;

use directories::ProjectDirs;
use method_corpus_core::{LicenseFilter, SplitPolicy, DEFAULT_PERMISSIVE_LICENSES};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::discovery::SearchQuery;
use crate::error::{CorpusError, CorpusResult};

/// Configuration for a mining run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Language qualifier used in the repository search.
    pub language: String,

    /// Extension of the source files to extract from.
    pub file_extension: String,

    /// Repositories must have strictly more stars than this.
    pub min_stars: u32,

    /// Number of repositories discovery accepts.
    pub max_repositories: usize,

    /// SPDX identifiers considered safe for redistribution.
    pub permissive_licenses: Vec<String>,

    /// Results per search page.
    pub search_per_page: u8,

    /// Upper bound on search pages requested.
    pub search_max_pages: u32,

    /// Pause between search pages.
    pub search_page_delay_ms: u64,

    /// Retries for a rate-limited search page.
    pub search_retries: u32,

    /// Initial backoff before retrying a rate-limited page; doubles per retry.
    pub search_retry_backoff_ms: u64,

    /// History depth of each clone; `0` clones full history.
    pub clone_depth: i32,

    /// The output table.
    pub output_path: PathBuf,

    /// Parent directory of working copies.
    pub work_dir: PathBuf,

    /// Split capacities.
    pub split_capacities: SplitPolicy,

    /// GitHub access token. Optional; without it access is rate-limited.
    #[serde(skip_serializing)]
    pub github_token: Option<String>,
}

fn default_work_dir() -> PathBuf {
    ProjectDirs::from("dev", "method-corpus", "mcorpus")
        .map(|dirs| dirs.cache_dir().join("repos"))
        .unwrap_or_else(|| std::env::temp_dir().join("method-corpus"))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: "java".to_string(),
            file_extension: "java".to_string(),
            min_stars: 100,
            max_repositories: 10,
            permissive_licenses: DEFAULT_PERMISSIVE_LICENSES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            search_per_page: 100,
            search_max_pages: 10,
            search_page_delay_ms: 1_000,
            search_retries: 2,
            search_retry_backoff_ms: 30_000,
            clone_depth: 1,
            output_path: PathBuf::from("java_methods.csv"),
            work_dir: default_work_dir(),
            split_capacities: SplitPolicy::default(),
            github_token: None,
        }
    }
}

impl Config {
    /// Load configuration from `.env`, the config file and the environment.
    pub fn load() -> CorpusResult<Self> {
        // Optional local declarations file; missing is fine.
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "Loaded environment file");
        }

        let mut config = match Self::config_file_path() {
            Some(path) if path.exists() => {
                let contents = std::fs::read_to_string(&path)?;
                serde_json::from_str(&contents)?
            }
            _ => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;

        if config.github_token.is_none() {
            warn!("GITHUB_TOKEN not set; GitHub access will be unauthenticated and rate-limited");
        }

        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// [`Config::load`]).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> CorpusResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("GITHUB_TOKEN").filter(|t| !t.trim().is_empty()) {
            self.github_token = Some(token.trim().to_string());
        }
        if let Some(value) = lookup("MCORPUS_MIN_STARS") {
            self.min_stars = parse_number("MCORPUS_MIN_STARS", &value)?;
        }
        if let Some(value) = lookup("MCORPUS_MAX_REPOS") {
            self.max_repositories = parse_number("MCORPUS_MAX_REPOS", &value)?;
        }
        if let Some(path) = lookup("MCORPUS_OUTPUT") {
            self.output_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("MCORPUS_WORK_DIR") {
            self.work_dir = PathBuf::from(path);
        }
        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_file_path() -> Option<PathBuf> {
        ProjectDirs::from("dev", "method-corpus", "mcorpus")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// License allow-set as a filter.
    pub fn license_filter(&self) -> LicenseFilter {
        LicenseFilter::new(self.permissive_licenses.iter().cloned())
    }

    /// Search query described by this configuration.
    pub fn search_query(&self) -> SearchQuery {
        SearchQuery {
            language: self.language.clone(),
            min_stars: self.min_stars,
            per_page: self.search_per_page,
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> CorpusResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| CorpusError::Config(format!("Invalid number for {}: {}", key, value)))
}
