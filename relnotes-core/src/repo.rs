//! Local repository access
//!
//! Wraps the system `git` binary for revision resolution, tag discovery and
//! the first-parent history walk. All commands run against a local working
//! copy; the only network operations are the initial clone and the tag
//! fetch when a copy already exists.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{NotesError, Result};
use crate::extract::pr_number_from_message;
use crate::version::TagVersion;

/// Separator between fields of one commit record in `git log` output.
const FIELD_SEPARATOR: &str = "\u{241e}";
/// Separator between commit records in `git log` output.
const COMMIT_SEPARATOR: &str = "\u{241d}";

/// Log format for the history walk: hash, parent hashes, raw message.
const WALK_FORMAT: &str = concat!(
    "%H", "\u{241e}", // hash
    "%P", "\u{241e}", // parent hashes, space separated
    "%B",       // raw message (subject + body)
    "\u{241d}"        // record separator
);

/// A commit as seen by the history walk.
#[derive(Debug, Clone)]
pub struct Commit {
    pub sha: String,
    /// Parent hashes in order; the first entry is the primary parent.
    pub parents: Vec<String>,
    pub message: String,
}

/// A commit paired with the change request number parsed from its message.
#[derive(Debug, Clone)]
pub struct CommitPrPair {
    pub commit: Commit,
    pub pr_number: u64,
}

/// Resolved start/end revisions for one run.
#[derive(Debug, Clone)]
pub struct DiscoverResult {
    pub start_sha: String,
    pub start_rev: String,
    pub end_sha: String,
    pub end_rev: String,
}

/// Handle to a local git working copy.
pub struct Repo {
    path: PathBuf,
}

impl Repo {
    /// Open an existing repository.
    pub fn open(path: &Path) -> Result<Self> {
        // Verify git is available
        let output = Command::new("git").arg("--version").output()?;
        if !output.status.success() {
            return Err(NotesError::GitNotAvailable);
        }

        // Verify path is a git repository
        let output = Command::new("git")
            .current_dir(path)
            .args(["rev-parse", "--git-dir"])
            .output()?;
        if !output.status.success() {
            return Err(NotesError::NotARepository(path.to_path_buf()));
        }

        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Open the repository at `path`, cloning it from `url` when absent.
    ///
    /// An existing copy is refreshed with a tag fetch; fetch failures are
    /// logged and ignored so offline runs can use a stale copy.
    pub fn clone_or_open(url: &str, path: &Path) -> Result<Self> {
        if path.join(".git").exists() {
            let repo = Self::open(path)?;
            if let Err(err) = repo.git(&["fetch", "--tags", "origin"]) {
                tracing::warn!("could not refresh {}: {err}", path.display());
            }
            return Ok(repo);
        }

        tracing::info!("cloning {url} into {}", path.display());
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let path_str = path
            .to_str()
            .ok_or_else(|| NotesError::other("repository path is not valid UTF-8"))?;
        let output = Command::new("git").args(["clone", url, path_str]).output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(NotesError::git_command(format!(
                "clone of {url} failed: {}",
                stderr.trim()
            )));
        }

        Self::open(path)
    }

    /// Repository root path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run a git command in the repository and return stdout.
    fn git(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .current_dir(&self.path)
            .args(args)
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(NotesError::git_command(stderr.trim().to_string()));
        }

        Ok(String::from_utf8(output.stdout)?)
    }

    /// Resolve a revision string to a commit hash.
    ///
    /// Tags are peeled to the commit they point at. Unknown local names are
    /// retried under `origin/` so branch names work in fresh clones.
    pub fn rev_parse(&self, rev: &str) -> Result<String> {
        let peel = format!("{rev}^{{commit}}");
        if let Ok(out) = self.git(&["rev-parse", "--verify", "--quiet", &peel]) {
            return Ok(out.trim().to_string());
        }

        let remote = format!("origin/{rev}^{{commit}}");
        match self.git(&["rev-parse", "--verify", "--quiet", &remote]) {
            Ok(out) => {
                tracing::debug!("resolved {rev} via origin/{rev}");
                Ok(out.trim().to_string())
            }
            Err(_) => Err(NotesError::UnresolvableRevision(rev.to_string())),
        }
    }

    /// Merge base of two resolved commits.
    pub fn merge_base(&self, a: &str, b: &str) -> Result<String> {
        let out = self.git(&["merge-base", a, b])?;
        Ok(out.trim().to_string())
    }

    /// The branch the repository considers its default.
    pub fn default_branch(&self) -> Result<String> {
        if let Ok(out) = self.git(&["symbolic-ref", "--short", "refs/remotes/origin/HEAD"]) {
            if let Some(branch) = out.trim().strip_prefix("origin/") {
                return Ok(branch.to_string());
            }
        }
        for candidate in ["master", "main"] {
            if self.rev_parse(candidate).is_ok() {
                return Ok(candidate.to_string());
            }
        }
        Err(NotesError::discovery(
            "unable to determine the default branch",
        ))
    }

    /// All parseable version tags in the repository.
    pub fn version_tags(&self) -> Result<Vec<TagVersion>> {
        let out = self.git(&["tag", "-l"])?;
        let mut tags: Vec<TagVersion> = out.lines().filter_map(TagVersion::parse).collect();
        tags.sort();
        Ok(tags)
    }

    /// Latest version tag reachable from `rev`.
    pub fn latest_tag_on(&self, rev: &str) -> Result<TagVersion> {
        let out = self.git(&["describe", "--tags", "--abbrev=0", rev])?;
        let name = out.trim();
        TagVersion::parse(name).ok_or_else(|| {
            NotesError::discovery(format!("latest tag {name:?} is not a version tag"))
        })
    }

    /// Discovery: merge base of the latest final minor release and its
    /// parent branch, up to the latest tag on the default branch.
    pub fn discover_merge_base_to_latest(&self) -> Result<DiscoverResult> {
        let tags = self.version_tags()?;
        let latest_minor = tags
            .iter()
            .filter(|t| t.is_minor_release())
            .max()
            .ok_or_else(|| NotesError::discovery("no final non-patch version tags found"))?;

        let default = self.default_branch()?;
        let default_sha = self.rev_parse(&default)?;
        let minor_sha = self.rev_parse(latest_minor.tag())?;
        let start_sha = self.merge_base(&default_sha, &minor_sha)?;

        let end_tag = self.latest_tag_on(&default_sha)?;
        let end_sha = self.rev_parse(end_tag.tag())?;

        Ok(DiscoverResult {
            start_sha,
            start_rev: latest_minor.tag().to_string(),
            end_sha,
            end_rev: end_tag.tag().to_string(),
        })
    }

    /// Discovery: previous patch tag to latest patch tag on a branch.
    pub fn discover_patch_to_patch(&self, branch: &str) -> Result<DiscoverResult> {
        let branch_sha = self.rev_parse(branch)?;
        let latest = self.latest_tag_on(&branch_sha)?;

        let previous = latest.previous_patch().ok_or_else(|| {
            NotesError::discovery(format!(
                "latest tag {latest} on {branch} is not a patch release"
            ))
        })?;

        Ok(DiscoverResult {
            start_sha: self.rev_parse(previous.tag())?,
            start_rev: previous.tag().to_string(),
            end_sha: self.rev_parse(latest.tag())?,
            end_rev: latest.tag().to_string(),
        })
    }

    /// Discovery: second-latest to latest final minor release tag.
    pub fn discover_minor_to_minor(&self) -> Result<DiscoverResult> {
        let tags = self.version_tags()?;
        let minors: Vec<&TagVersion> = tags.iter().filter(|t| t.is_minor_release()).collect();
        if minors.len() < 2 {
            return Err(NotesError::discovery(format!(
                "found {} final non-patch version tags, need at least two",
                minors.len()
            )));
        }

        let start = minors[minors.len() - 2];
        let end = minors[minors.len() - 1];
        Ok(DiscoverResult {
            start_sha: self.rev_parse(start.tag())?,
            start_rev: start.tag().to_string(),
            end_sha: self.rev_parse(end.tag())?,
            end_rev: end.tag().to_string(),
        })
    }

    /// Walk the primary-parent chain from `end_sha` and pair commits with
    /// change request numbers.
    ///
    /// The walk stops two primary-parent hops before `start_sha`: a release
    /// tag sits on top of a branch-point commit which itself sits on top of
    /// the last commit shared with the parent branch, and those two must be
    /// included.
    pub fn release_note_pairs(&self, start_sha: &str, end_sha: &str) -> Result<Vec<CommitPrPair>> {
        let stop = self
            .rev_parse(&format!("{start_sha}~2"))
            .map_err(|_| NotesError::discovery("finding last shared commit".to_string()))?;
        tracing::info!("will stop at {stop}");

        let format_arg = format!("--format={WALK_FORMAT}");
        let range = format!("{stop}..{end_sha}");
        let log = self.git(&["log", "--first-parent", &format_arg, &range])?;

        let commits = parse_log_output(&log);
        Ok(pairs_from_commits(commits))
    }
}

/// Parse `git log` output produced with [`WALK_FORMAT`].
fn parse_log_output(output: &str) -> Vec<Commit> {
    let mut commits = Vec::new();

    for record in output.split(COMMIT_SEPARATOR) {
        let record = record.trim();
        if record.is_empty() {
            continue;
        }

        let fields: Vec<&str> = record.splitn(3, FIELD_SEPARATOR).collect();
        if fields.len() != 3 {
            tracing::warn!("skipping malformed log record: {record:?}");
            continue;
        }

        commits.push(Commit {
            sha: fields[0].trim().to_string(),
            parents: fields[1].split_whitespace().map(String::from).collect(),
            message: fields[2].trim().to_string(),
        });
    }

    commits
}

/// Pair walked commits with change request numbers, preserving walk order.
///
/// Commits without a recognizable number are logged and dropped; they are
/// part of the traversal but contribute nothing to the output.
fn pairs_from_commits(commits: Vec<Commit>) -> Vec<CommitPrPair> {
    let mut pairs = Vec::new();

    for commit in commits {
        match pr_number_from_message(&commit.message) {
            Some(pr_number) => {
                tracing::debug!("sha: {} pr: {pr_number}", commit.sha);
                pairs.push(CommitPrPair { commit, pr_number });
            }
            None => {
                tracing::debug!("sha: {} prs: []", commit.sha);
            }
        }
    }

    pairs
}
