//! Run configuration and validation
//!
//! `Options` captures everything one release notes run needs: the repository
//! coordinates, the revision range (explicit or discovered), the output
//! format and template, and the client mode (live, record or replay).
//! `validate_and_finish` settles all of it up front so the gathering and
//! rendering stages can assume a coherent configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use tracing::info;

use crate::client::{GitHubClient, PullRequestClient, RecordingClient, ReplayingClient};
use crate::document::TemplateSpec;
use crate::error::{NotesError, Result};
use crate::gatherer::MAX_PARALLEL_REQUESTS;
use crate::maps::{map_provider_from_init_string, MapProvider};
use crate::repo::{DiscoverResult, Repo};

/// Output format for the rendered document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Markdown,
    Json,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Markdown => "markdown",
            Format::Json => "json",
        }
    }
}

impl FromStr for Format {
    type Err = NotesError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "markdown" => Ok(Format::Markdown),
            "json" => Ok(Format::Json),
            other => Err(NotesError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the revision range is determined when it is not given explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoverMode {
    /// Use the explicitly provided revisions.
    None,
    /// Merge base of the default branch and the latest minor, up to the
    /// newest tag on the default branch.
    MergeBaseToLatest,
    /// Previous patch tag to latest patch tag within one minor line.
    PatchToPatch,
    /// Previous minor's final patch to the latest tag of the current minor.
    MinorToMinor,
}

impl DiscoverMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscoverMode::None => "none",
            DiscoverMode::MergeBaseToLatest => "merge-base-to-latest",
            DiscoverMode::PatchToPatch => "patch-to-patch",
            DiscoverMode::MinorToMinor => "minor-to-minor",
        }
    }

    fn run(&self, repo: &Repo, branch: &str) -> Result<DiscoverResult> {
        match self {
            DiscoverMode::None => Err(NotesError::discovery("no discovery mode configured")),
            DiscoverMode::MergeBaseToLatest => repo.discover_merge_base_to_latest(),
            DiscoverMode::PatchToPatch => {
                let branch = if branch.is_empty() {
                    repo.default_branch()?
                } else {
                    branch.to_string()
                };
                repo.discover_patch_to_patch(&branch)
            }
            DiscoverMode::MinorToMinor => repo.discover_minor_to_minor(),
        }
    }
}

impl FromStr for DiscoverMode {
    type Err = NotesError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(DiscoverMode::None),
            "merge-base-to-latest" => Ok(DiscoverMode::MergeBaseToLatest),
            "patch-to-patch" => Ok(DiscoverMode::PatchToPatch),
            "minor-to-minor" => Ok(DiscoverMode::MinorToMinor),
            other => Err(NotesError::UnknownDiscoverMode(other.to_string())),
        }
    }
}

impl std::fmt::Display for DiscoverMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for one release notes run.
///
/// Construct with `Options::default()`, fill in what the run needs, then
/// call [`Options::validate_and_finish`] exactly once before using the
/// revision fields, [`Options::client`] or [`Options::repo`].
#[derive(Debug, Clone)]
pub struct Options {
    /// API token for the live client. May stay empty in replay mode.
    pub github_token: String,
    /// Organization owning the repository.
    pub github_org: String,
    /// Repository name.
    pub github_repo: String,
    /// Start of the range as a commit hash. Filled by discovery or by
    /// resolving `start_rev` when empty.
    pub start_sha: String,
    /// End of the range as a commit hash. Filled like `start_sha`.
    pub end_sha: String,
    /// Symbolic start revision, e.g. a tag name.
    pub start_rev: String,
    /// Symbolic end revision.
    pub end_rev: String,
    /// Branch used by patch-to-patch discovery. Empty means the
    /// repository's default branch.
    pub branch: String,
    /// Revision discovery mode.
    pub discover: DiscoverMode,
    /// Local clone location. Empty means a per-repository directory under
    /// the system temp dir.
    pub repo_path: PathBuf,
    /// Overrides the release tag shown in the rendered document.
    pub release_version: String,
    /// Output format.
    pub format: Format,
    /// Markdown template selector.
    pub template: TemplateSpec,
    /// Persist every API response into this directory.
    pub record_dir: Option<PathBuf>,
    /// Serve every API request from fixtures in this directory.
    pub replay_dir: Option<PathBuf>,
    /// Map provider initializer strings, one provider each.
    pub map_provider_strings: Vec<String>,
    /// Directory of release artifacts for the downloads table.
    pub artifact_dir: Option<PathBuf>,
    /// Public URL prefix the artifacts are served from.
    pub artifact_url_prefix: String,
    /// Upper bound on concurrent API requests.
    pub max_parallel: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            github_token: String::new(),
            github_org: String::new(),
            github_repo: String::new(),
            start_sha: String::new(),
            end_sha: String::new(),
            start_rev: String::new(),
            end_rev: String::new(),
            branch: String::new(),
            discover: DiscoverMode::None,
            repo_path: PathBuf::new(),
            release_version: String::new(),
            format: Format::Markdown,
            template: TemplateSpec::Default,
            record_dir: None,
            replay_dir: None,
            map_provider_strings: Vec::new(),
            artifact_dir: None,
            artifact_url_prefix: String::new(),
            max_parallel: MAX_PARALLEL_REQUESTS,
        }
    }
}

impl Options {
    /// Location of the local clone.
    pub fn repo_path(&self) -> PathBuf {
        if self.repo_path.as_os_str().is_empty() {
            std::env::temp_dir().join(format!(
                "relnotes-{}-{}",
                self.github_org, self.github_repo
            ))
        } else {
            self.repo_path.clone()
        }
    }

    /// Clone the configured repository if needed and open it.
    pub fn repo(&self) -> Result<Repo> {
        let url = format!(
            "https://github.com/{}/{}",
            self.github_org, self.github_repo
        );
        Repo::clone_or_open(&url, &self.repo_path())
    }

    /// Check the configuration and settle the revision range.
    ///
    /// Runs discovery when requested, resolves symbolic revisions to
    /// commit hashes, and verifies everything the run will rely on later.
    /// All failure modes here are fatal.
    pub fn validate_and_finish(&mut self) -> Result<()> {
        if self.record_dir.is_some() && self.replay_dir.is_some() {
            return Err(NotesError::RecordAndReplay);
        }

        if self.github_org.is_empty() || self.github_repo.is_empty() {
            return Err(NotesError::other(
                "a GitHub organization and repository are required",
            ));
        }

        // Replay runs never touch the network, so no token is needed.
        if self.replay_dir.is_some() {
            info!("replay mode, skipping the GitHub token check");
        } else if self.github_token.is_empty() {
            return Err(NotesError::other(
                "a GitHub token is required, set it via the flag or $GITHUB_TOKEN",
            ));
        }

        // An explicitly given range wins over discovery.
        let explicit_range = !self.start_sha.is_empty() && !self.end_sha.is_empty();
        if self.discover != DiscoverMode::None && explicit_range {
            info!("revision range given explicitly, skipping {} discovery", self.discover);
        } else if self.discover != DiscoverMode::None {
            info!("discovering revision range via {} mode", self.discover);
            let repo = self.repo()?;
            let result = self.discover.run(&repo, &self.branch)?;
            self.start_sha = result.start_sha;
            self.start_rev = result.start_rev;
            self.end_sha = result.end_sha;
            self.end_rev = result.end_rev;
            info!(
                "discovered range {} ({}) to {} ({})",
                self.start_rev, self.start_sha, self.end_rev, self.end_sha
            );
        }

        if self.start_sha.is_empty() && self.start_rev.is_empty() {
            return Err(NotesError::MissingRevision("start"));
        }
        if self.end_sha.is_empty() && self.end_rev.is_empty() {
            return Err(NotesError::MissingRevision("end"));
        }

        if self.start_sha.is_empty() || self.end_sha.is_empty() {
            info!("resolving symbolic revisions to commit hashes");
            let repo = self.repo()?;
            if self.start_sha.is_empty() {
                self.start_sha = repo.rev_parse(&self.start_rev)?;
                info!("start {} is {}", self.start_rev, self.start_sha);
            }
            if self.end_sha.is_empty() {
                self.end_sha = repo.rev_parse(&self.end_rev)?;
                info!("end {} is {}", self.end_rev, self.end_sha);
            }
        }

        if let Some(record_dir) = &self.record_dir {
            std::fs::create_dir_all(record_dir)?;
        }

        // A broken template selector should fail here, not after the
        // whole gathering stage has run.
        if self.format == Format::Markdown {
            self.template.load()?;
        }

        Ok(())
    }

    /// Build the pull request client for this run.
    pub fn client(&self) -> Result<Arc<dyn PullRequestClient>> {
        if let Some(replay_dir) = &self.replay_dir {
            info!("replaying API responses from {}", replay_dir.display());
            return Ok(Arc::new(ReplayingClient::new(replay_dir)));
        }

        let token = if self.github_token.is_empty() {
            None
        } else {
            Some(self.github_token.clone())
        };
        let live = Arc::new(GitHubClient::new(token)?);

        if let Some(record_dir) = &self.record_dir {
            info!("recording API responses to {}", record_dir.display());
            return Ok(Arc::new(RecordingClient::new(live, record_dir)?));
        }

        Ok(live)
    }

    /// Instantiate one map provider per configured initializer string.
    pub fn map_providers(&self) -> Result<Vec<Box<dyn MapProvider>>> {
        self.map_provider_strings
            .iter()
            .map(|init| map_provider_from_init_string(init))
            .collect()
    }

    /// Label naming the end of the range in the rendered document.
    pub fn current_revision_label(&self) -> &str {
        if !self.release_version.is_empty() {
            &self.release_version
        } else if !self.end_rev.is_empty() {
            &self.end_rev
        } else {
            &self.end_sha
        }
    }

    /// Label naming the start of the range in the rendered document.
    pub fn previous_revision_label(&self) -> &str {
        if !self.start_rev.is_empty() {
            &self.start_rev
        } else {
            &self.start_sha
        }
    }
}
