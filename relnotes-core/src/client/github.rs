//! Live GitHub REST client

use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;

use super::{PullRequest, PullRequestClient};
use crate::error::{NotesError, Result};

const API_BASE: &str = "https://api.github.com";

/// Bounded response cache; a change request referenced by several commits
/// is fetched from the network only once.
const RESPONSE_CACHE_SIZE: usize = 512;

/// Client for the live GitHub REST API.
pub struct GitHubClient {
    http: reqwest::Client,
    api_base: String,
    token: Option<String>,
    cache: Mutex<LruCache<(String, String, u64), PullRequest>>,
}

impl GitHubClient {
    /// Create a client, optionally authenticated with a token.
    pub fn new(token: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("relnotes/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let capacity = NonZeroUsize::new(RESPONSE_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN);
        Ok(Self {
            http,
            api_base: API_BASE.to_string(),
            token,
            cache: Mutex::new(LruCache::new(capacity)),
        })
    }

    /// Point the client at a different API root.
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }
}

#[async_trait::async_trait]
impl PullRequestClient for GitHubClient {
    async fn get_pull_request(&self, org: &str, repo: &str, number: u64) -> Result<PullRequest> {
        let key = (org.to_string(), repo.to_string(), number);
        if let Ok(mut cache) = self.cache.lock() {
            if let Some(hit) = cache.get(&key) {
                tracing::debug!("cache hit for {org}/{repo}#{number}");
                return Ok(hit.clone());
            }
        }

        let url = format!("{}/repos/{org}/{repo}/pulls/{number}", self.api_base);
        tracing::debug!("GET {url}");

        let mut request = self
            .http
            .get(&url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(NotesError::HttpStatus {
                status: response.status().as_u16(),
                url,
            });
        }

        let pr: PullRequest = response.json().await?;
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(key, pr.clone());
        }
        Ok(pr)
    }
}
