//! Replaying client backed by recorded fixtures

use std::path::PathBuf;

use async_trait::async_trait;
use dashmap::DashMap;

use super::{request_key, PullRequest, PullRequestClient};
use crate::error::{NotesError, Result};

/// Resolves requests from fixture files only; never performs network I/O.
///
/// A request without a recorded fixture is an error: replayed runs are
/// expected to be fully deterministic.
pub struct ReplayingClient {
    dir: PathBuf,
    cache: DashMap<String, PullRequest>,
}

impl ReplayingClient {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: DashMap::new(),
        }
    }
}

#[async_trait]
impl PullRequestClient for ReplayingClient {
    async fn get_pull_request(&self, org: &str, repo: &str, number: u64) -> Result<PullRequest> {
        let key = request_key(org, repo, number);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit.clone());
        }

        let path = self.dir.join(format!("{key}.json"));
        let data =
            std::fs::read(&path).map_err(|_| NotesError::FixtureNotFound(path.clone()))?;
        let pr: PullRequest = serde_json::from_slice(&data)?;

        self.cache.insert(key, pr.clone());
        Ok(pr)
    }
}
