//! Repository discovery: ranked search plus license filtering.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use method_corpus_core::{LicenseFilter, RepositoryDescriptor};
use octocrab::Octocrab;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{CorpusError, CorpusResult};

/// A ranked repository query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub language: String,
    pub min_stars: u32,
    pub per_page: u8,
}

impl SearchQuery {
    /// GitHub search qualifier string.
    pub fn to_query_string(&self) -> String {
        format!("language:{} stars:>{}", self.language, self.min_stars)
    }
}

/// One search hit, before license filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCandidate {
    /// `owner/name`.
    pub full_name: String,
    pub html_url: String,
    /// SPDX identifier as reported by the search, if any.
    pub license_id: Option<String>,
    pub star_count: u32,
}

/// Why a search request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchFailureKind {
    RateLimited,
    Unauthorized,
    Network,
    Other,
}

impl fmt::Display for SearchFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SearchFailureKind::RateLimited => "rate limited",
            SearchFailureKind::Unauthorized => "unauthorized",
            SearchFailureKind::Network => "network",
            SearchFailureKind::Other => "other",
        };
        f.write_str(label)
    }
}

/// A failed search request. An empty result page is not a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFailure {
    pub kind: SearchFailureKind,
    pub message: String,
}

impl SearchFailure {
    pub fn new(kind: SearchFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<SearchFailure> for CorpusError {
    fn from(failure: SearchFailure) -> Self {
        CorpusError::Discovery {
            kind: failure.kind,
            message: failure.message,
        }
    }
}

/// Capability for ranked repository search, most popular first.
#[async_trait]
pub trait RepositorySearch: Send + Sync {
    /// Fetch one 1-based page of results.
    async fn search_page(
        &self,
        query: &SearchQuery,
        page: u32,
    ) -> Result<Vec<SearchCandidate>, SearchFailure>;
}

/// Search backed by the GitHub REST API.
pub struct GitHubSearch {
    client: Octocrab,
}

impl GitHubSearch {
    /// Build a client, authenticated when a token is given.
    pub fn new(token: Option<&str>) -> CorpusResult<Self> {
        let builder = Octocrab::builder();
        let builder = match token {
            Some(token) => builder.personal_token(token.to_string()),
            None => builder,
        };
        let client = builder.build().map_err(|e| CorpusError::Discovery {
            kind: SearchFailureKind::Other,
            message: e.to_string(),
        })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl RepositorySearch for GitHubSearch {
    async fn search_page(
        &self,
        query: &SearchQuery,
        page: u32,
    ) -> Result<Vec<SearchCandidate>, SearchFailure> {
        let q = query.to_query_string();
        debug!(query = %q, page, "Searching repositories");

        let results = self
            .client
            .search()
            .repositories(&q)
            .sort("stars")
            .order("desc")
            .per_page(query.per_page)
            .page(page)
            .send()
            .await
            .map_err(|e| SearchFailure::new(classify_octocrab_error(&e), e.to_string()))?;

        Ok(results
            .items
            .into_iter()
            .map(|repo| {
                let full_name = repo.full_name.clone().unwrap_or_else(|| repo.name.clone());
                let html_url = repo
                    .html_url
                    .as_ref()
                    .map(|u| u.to_string())
                    .unwrap_or_else(|| format!("https://github.com/{}", full_name));
                SearchCandidate {
                    full_name,
                    html_url,
                    license_id: repo.license.as_ref().map(|l| l.spdx_id.clone()),
                    star_count: repo.stargazers_count.unwrap_or(0),
                }
            })
            .collect())
    }
}

fn classify_octocrab_error(err: &octocrab::Error) -> SearchFailureKind {
    match err {
        octocrab::Error::GitHub { source, .. } => match source.status_code.as_u16() {
            401 => SearchFailureKind::Unauthorized,
            403 | 429 => SearchFailureKind::RateLimited,
            _ => SearchFailureKind::Other,
        },
        octocrab::Error::Hyper { .. }
        | octocrab::Error::Http { .. }
        | octocrab::Error::Service { .. } => SearchFailureKind::Network,
        _ => SearchFailureKind::Other,
    }
}

/// Discover up to `config.max_repositories` permissively licensed repositories,
/// in search rank order.
///
/// Any search failure (after retries for rate limiting) fails the whole call;
/// a partial list is never returned as if complete.
pub async fn discover<S>(search: &S, config: &Config) -> CorpusResult<Vec<RepositoryDescriptor>>
where
    S: RepositorySearch + ?Sized,
{
    let query = config.search_query();
    let filter = config.license_filter();
    let mut accepted = Vec::new();

    info!(
        query = %query.to_query_string(),
        limit = config.max_repositories,
        licenses = %filter.allowed().collect::<Vec<_>>().join(","),
        "Discovering repositories"
    );

    if config.max_repositories == 0 {
        return Ok(accepted);
    }

    for page in 1..=config.search_max_pages {
        if page > 1 && config.search_page_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(config.search_page_delay_ms)).await;
        }

        let candidates = fetch_page(search, &query, page, config).await?;
        let page_len = candidates.len();

        for candidate in candidates {
            if let Some(descriptor) = accept(candidate, &filter, config.min_stars) {
                info!(
                    repo = %descriptor.name,
                    license = %descriptor.license_id,
                    stars = descriptor.star_count,
                    "Accepted repository"
                );
                accepted.push(descriptor);
                if accepted.len() >= config.max_repositories {
                    return Ok(accepted);
                }
            }
        }

        if page_len < query.per_page as usize {
            break;
        }
    }

    info!(count = accepted.len(), "Discovery finished");
    Ok(accepted)
}

fn accept(
    candidate: SearchCandidate,
    filter: &LicenseFilter,
    min_stars: u32,
) -> Option<RepositoryDescriptor> {
    if !filter.permits(candidate.license_id.as_deref()) {
        debug!(
            repo = %candidate.full_name,
            license = candidate.license_id.as_deref().unwrap_or("none"),
            "Rejected repository: license not permitted"
        );
        return None;
    }
    if candidate.star_count <= min_stars {
        debug!(repo = %candidate.full_name, stars = candidate.star_count, "Rejected repository: below star threshold");
        return None;
    }
    let license_id = candidate.license_id?;
    Some(RepositoryDescriptor::new(
        candidate.full_name,
        candidate.html_url,
        license_id,
        candidate.star_count,
    ))
}

async fn fetch_page<S>(
    search: &S,
    query: &SearchQuery,
    page: u32,
    config: &Config,
) -> Result<Vec<SearchCandidate>, SearchFailure>
where
    S: RepositorySearch + ?Sized,
{
    let mut attempt = 0u32;
    loop {
        match search.search_page(query, page).await {
            Ok(candidates) => return Ok(candidates),
            Err(failure)
                if failure.kind == SearchFailureKind::RateLimited
                    && attempt < config.search_retries =>
            {
                let backoff = config
                    .search_retry_backoff_ms
                    .saturating_mul(2u64.saturating_pow(attempt));
                warn!(
                    page,
                    attempt = attempt + 1,
                    backoff_ms = backoff,
                    error = %failure.message,
                    "Search rate limited, backing off"
                );
                if backoff > 0 {
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
                attempt += 1;
            }
            Err(failure) => return Err(failure),
        }
    }
}
