//! Client access to the code review API
//!
//! One capability trait with three interchangeable implementations: live
//! GitHub access, a recording decorator that persists every response, and a
//! replaying reader that never touches the network. The gatherer only ever
//! sees the trait; which implementation runs is decided once at startup.

mod github;
mod record;
mod replay;

pub use github::GitHubClient;
pub use record::RecordingClient;
pub use replay::ReplayingClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::Result;

/// A change request label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
}

/// Change request author.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub login: String,
    pub html_url: String,
}

/// The slice of a change request the note builder consumes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    /// Body may be null for change requests opened without a description
    #[serde(default)]
    pub body: Option<String>,
    pub html_url: String,
    #[serde(default)]
    pub user: User,
    #[serde(default)]
    pub labels: Vec<Label>,
}

impl PullRequest {
    /// Label names as plain strings.
    pub fn label_names(&self) -> Vec<String> {
        self.labels.iter().map(|l| l.name.clone()).collect()
    }
}

/// Capability consumed by the note builder.
#[async_trait]
pub trait PullRequestClient: Send + Sync {
    /// Fetch a single pull request.
    async fn get_pull_request(&self, org: &str, repo: &str, number: u64) -> Result<PullRequest>;
}

/// Stable key identifying one request, used to name fixture files.
pub(crate) fn request_key(org: &str, repo: &str, number: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("get-pull-request:{org}/{repo}/{number}"));
    format!("{:x}", hasher.finalize())
}
