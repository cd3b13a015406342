//! Recording decorator for the client capability

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashSet;

use super::{request_key, PullRequest, PullRequestClient};
use crate::error::Result;

/// Wraps another client and persists every response as a fixture file.
///
/// Fixtures are keyed by the stable request hash, so a later replay run
/// resolves the same requests without network access.
pub struct RecordingClient {
    inner: Arc<dyn PullRequestClient>,
    dir: PathBuf,
    written: DashSet<String>,
}

impl RecordingClient {
    /// Record into `dir`, creating it when missing.
    pub fn new(inner: Arc<dyn PullRequestClient>, dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            inner,
            dir,
            written: DashSet::new(),
        })
    }
}

#[async_trait]
impl PullRequestClient for RecordingClient {
    async fn get_pull_request(&self, org: &str, repo: &str, number: u64) -> Result<PullRequest> {
        let pr = self.inner.get_pull_request(org, repo, number).await?;

        let key = request_key(org, repo, number);
        // Concurrent tasks may request the same change request; the first
        // one writes the fixture.
        if self.written.insert(key.clone()) {
            let path = self.dir.join(format!("{key}.json"));
            let json = serde_json::to_vec_pretty(&pr)?;
            std::fs::write(&path, json)?;
            tracing::debug!("recorded {org}/{repo}#{number} to {}", path.display());
        }

        Ok(pr)
    }
}
