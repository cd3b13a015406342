//! Release Notes Aggregation Engine
//!
//! Turns a range of git history into a categorized release notes document.
//! The engine walks first-parent commits between two revisions, maps each
//! merge back to its change request, extracts the fenced release-note block
//! from the request body, classifies it from labels, applies curated
//! overrides, and renders the result as Markdown or JSON.
//!
//! ## Features
//!
//! - **Revision discovery** - resolve the range from tags alone: merge base
//!   to latest, patch to patch, or minor to minor
//! - **Bounded gathering** - change requests are fetched concurrently
//!   behind a semaphore; a single failed request never fails the run
//! - **Curated overrides** - YAML map files amend or replace individual
//!   notes after the fact
//! - **Record/replay** - every API response can be persisted and replayed,
//!   so a run is reproducible without network access
//!
//! ## Example
//!
//! ```ignore
//! use relnotes_core::{Document, Gatherer, Options};
//!
//! let mut options = Options {
//!     github_token: std::env::var("GITHUB_TOKEN").unwrap_or_default(),
//!     github_org: "kubernetes".into(),
//!     github_repo: "kubernetes".into(),
//!     start_rev: "v1.16.0".into(),
//!     end_rev: "v1.16.1".into(),
//!     ..Options::default()
//! };
//! options.validate_and_finish()?;
//!
//! let repo = options.repo()?;
//! let pairs = repo.release_note_pairs(&options.start_sha, &options.end_sha)?;
//!
//! let gatherer = Gatherer::new(options.client()?, &options.github_org, &options.github_repo);
//! let (notes, summary) = gatherer.gather(&pairs, &options.map_providers()?).await?;
//! tracing::info!("{summary}");
//!
//! let document = Document::new(
//!     &notes,
//!     options.previous_revision_label(),
//!     options.current_revision_label(),
//! );
//! println!("{}", document.render_markdown(&options.template.load()?)?);
//! ```

pub mod client;
pub mod document;
pub mod error;
pub mod extract;
pub mod gatherer;
pub mod maps;
pub mod note;
pub mod options;
pub mod repo;
pub mod toc;
pub mod version;

// Re-exports for convenience
pub use client::{PullRequest, PullRequestClient};
pub use document::{Document, Kind, TemplateSpec};
pub use error::{NotesError, Result};
pub use gatherer::{GatherSummary, Gatherer, NoteOutcome, MAX_PARALLEL_REQUESTS};
pub use maps::{MapProvider, ReleaseNotesMap};
pub use note::{ReleaseNote, ReleaseNotes};
pub use options::{DiscoverMode, Format, Options};
pub use repo::{Commit, CommitPrPair, Repo};
pub use version::TagVersion;
