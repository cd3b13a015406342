//! Concurrent release note gathering
//!
//! The gatherer drives one note builder invocation per commit/PR pair
//! under a bounded number of in-flight requests, merges the results into
//! a [`ReleaseNotes`] collection and reports progress once per pair.
//! Per-item failures are logged and skipped; they never abort the batch.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::client::PullRequestClient;
use crate::error::{NotesError, Result};
use crate::extract::{documentation_from_body, note_text_from_body};
use crate::maps::MapProvider;
use crate::note::{label_exact_match, labels_with_prefix, ReleaseNote, ReleaseNotes};
use crate::repo::CommitPrPair;

/// Ceiling for concurrently in-flight change request retrievals.
pub const MAX_PARALLEL_REQUESTS: usize = 10;

const ACTION_REQUIRED_LABEL: &str = "release-note-action-required";
const DO_NOT_PUBLISH_LABEL: &str = "release-note-none";

/// What happened to a single commit/PR pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteOutcome {
    /// A note was built and merged into the collection
    Built,
    /// The change request carries no note block
    Skipped,
    /// Retrieval or parsing failed; logged and dropped
    Failed,
}

/// Per-run tally of note outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GatherSummary {
    /// Input pairs handed to the gatherer
    pub total: usize,
    /// Progress ticks; always equals `total` once gathering returns
    pub done: usize,
    pub built: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl std::fmt::Display for GatherSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "built {} notes from {} commits ({} without a note, {} failed)",
            self.built, self.total, self.skipped, self.failed
        )
    }
}

/// Builds notes for commit/PR pairs through a client capability.
#[derive(Clone)]
pub struct Gatherer {
    client: Arc<dyn PullRequestClient>,
    org: String,
    repo: String,
    max_parallel: usize,
}

impl Gatherer {
    pub fn new(
        client: Arc<dyn PullRequestClient>,
        org: impl Into<String>,
        repo: impl Into<String>,
    ) -> Self {
        Self {
            client,
            org: org.into(),
            repo: repo.into(),
            max_parallel: MAX_PARALLEL_REQUESTS,
        }
    }

    /// Override the in-flight request ceiling. Values below one are
    /// clamped to one.
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    /// Build the release note for one commit/PR pair.
    ///
    /// Returns `Ok(None)` when the change request body carries no note
    /// block; that is a skip, not an error.
    pub async fn build_release_note(&self, pair: &CommitPrPair) -> Result<Option<ReleaseNote>> {
        let pr = self
            .client
            .get_pull_request(&self.org, &self.repo, pair.pr_number)
            .await?;

        let body = pr.body.as_deref().unwrap_or("");
        let Some(text) = note_text_from_body(body) else {
            return Ok(None);
        };

        let labels = pr.label_names();
        let sigs = labels_with_prefix(&labels, "sig");
        let kinds = labels_with_prefix(&labels, "kind");
        let areas = labels_with_prefix(&labels, "area");

        let documentation = documentation_from_body(body);
        let author = pr.user.login.clone();

        let mut note = ReleaseNote {
            commit: pair.commit.sha.clone(),
            text,
            markdown: String::new(),
            documentation: if documentation.is_empty() {
                None
            } else {
                Some(documentation)
            },
            author_url: format!("https://github.com/{author}"),
            author,
            pr_url: pr.html_url.clone(),
            pr_number: pr.number,
            feature: kinds.iter().any(|kind| kind == "feature"),
            duplicate_sig: sigs.len() > 1,
            duplicate_kind: kinds.len() > 1,
            action_required: label_exact_match(&labels, ACTION_REQUIRED_LABEL),
            do_not_publish: label_exact_match(&labels, DO_NOT_PUBLISH_LABEL),
            sigs,
            kinds,
            areas,
        };
        note.render_markdown();
        Ok(Some(note))
    }

    /// Gather notes for all pairs under the configured concurrency limit.
    ///
    /// Map overrides are prefetched sequentially before any task starts,
    /// accumulated over every provider. The collection history is set from
    /// the input walk order after all tasks have joined, so completion
    /// order never leaks into rendering order.
    pub async fn gather(
        &self,
        pairs: &[CommitPrPair],
        providers: &[Box<dyn MapProvider>],
    ) -> Result<(ReleaseNotes, GatherSummary)> {
        let total = pairs.len();
        let results = Arc::new(Mutex::new(ReleaseNotes::new()));
        let done = Arc::new(AtomicUsize::new(0));
        let semaphore = Arc::new(Semaphore::new(self.max_parallel));

        let mut walk_order = Vec::with_capacity(total);
        let mut handles = Vec::with_capacity(total);

        for pair in pairs {
            walk_order.push(pair.pr_number);

            let mut maps = Vec::new();
            for provider in providers {
                match provider.get_maps_for_pr(pair.pr_number) {
                    Ok(more) => maps.extend(more),
                    Err(err) => {
                        warn!("[ignored] loading maps for pr {}: {err}", pair.pr_number);
                    }
                }
            }

            let worker = self.clone();
            let pair = pair.clone();
            let semaphore = Arc::clone(&semaphore);
            let results = Arc::clone(&results);
            let done = Arc::clone(&done);

            handles.push(tokio::spawn(async move {
                // The permit is held across the retrieval; a hung call
                // occupies its slot until it returns.
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        done.fetch_add(1, Ordering::SeqCst);
                        return NoteOutcome::Failed;
                    }
                };

                let outcome = match worker.build_release_note(&pair).await {
                    Ok(Some(mut note)) => {
                        for map in &maps {
                            map.apply(&mut note);
                        }
                        if let Ok(mut collection) = results.lock() {
                            collection.insert(note);
                        }
                        NoteOutcome::Built
                    }
                    Ok(None) => {
                        debug!("no release note found for pr {}", pair.pr_number);
                        NoteOutcome::Skipped
                    }
                    Err(err) => {
                        warn!(
                            "[ignored] building release note for pr {}: {err}",
                            pair.pr_number
                        );
                        NoteOutcome::Failed
                    }
                };

                let finished = done.fetch_add(1, Ordering::SeqCst) + 1;
                debug!("({finished}/{total}) processed pr {}", pair.pr_number);
                outcome
            }));
        }

        let mut summary = GatherSummary {
            total,
            ..Default::default()
        };
        for handle in handles {
            match handle.await? {
                NoteOutcome::Built => summary.built += 1,
                NoteOutcome::Skipped => summary.skipped += 1,
                NoteOutcome::Failed => summary.failed += 1,
            }
        }
        summary.done = done.load(Ordering::SeqCst);

        let mut collection = Arc::try_unwrap(results)
            .map_err(|_| NotesError::other("release notes collection still shared"))?
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        collection.set_history(&walk_order);

        Ok((collection, summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use async_trait::async_trait;

    use crate::client::{Label, PullRequest, User};
    use crate::maps::{MapFields, ReleaseNotesMap};
    use crate::repo::Commit;

    struct FakeClient {
        prs: HashMap<u64, PullRequest>,
        calls: AtomicUsize,
    }

    impl FakeClient {
        fn new(prs: Vec<PullRequest>) -> Self {
            Self {
                prs: prs.into_iter().map(|pr| (pr.number, pr)).collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PullRequestClient for FakeClient {
        async fn get_pull_request(
            &self,
            _org: &str,
            _repo: &str,
            number: u64,
        ) -> Result<PullRequest> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prs
                .get(&number)
                .cloned()
                .ok_or(NotesError::HttpStatus {
                    status: 404,
                    url: format!("https://api.github.com/repos/org/repo/pulls/{number}"),
                })
        }
    }

    fn pr(number: u64, body: &str, labels: &[&str]) -> PullRequest {
        PullRequest {
            number,
            body: Some(body.to_string()),
            html_url: format!("https://github.com/org/repo/pull/{number}"),
            user: User {
                login: "octocat".to_string(),
                html_url: "https://github.com/octocat".to_string(),
            },
            labels: labels
                .iter()
                .map(|name| Label {
                    name: name.to_string(),
                })
                .collect(),
        }
    }

    fn pair(sha: &str, pr_number: u64) -> CommitPrPair {
        CommitPrPair {
            commit: Commit {
                sha: sha.to_string(),
                parents: vec![],
                message: format!("Merge pull request #{pr_number} from org/branch"),
            },
            pr_number,
        }
    }

    fn gatherer(prs: Vec<PullRequest>) -> Gatherer {
        Gatherer::new(Arc::new(FakeClient::new(prs)), "org", "repo")
    }

    #[tokio::test]
    async fn test_build_release_note_classification() {
        let g = gatherer(vec![pr(
            42,
            "some description\n\n```release-note\nadds a shiny feature\n```",
            &[
                "sig/node",
                "kind/feature",
                "release-note-action-required",
                "approved",
            ],
        )]);

        let note = g
            .build_release_note(&pair("abc123", 42))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(note.commit, "abc123");
        assert_eq!(note.text, "adds a shiny feature");
        assert_eq!(note.sigs, vec!["node"]);
        assert_eq!(note.kinds, vec!["feature"]);
        assert!(note.feature);
        assert!(note.action_required);
        assert!(!note.do_not_publish);
        assert!(!note.duplicate_sig);
        assert_eq!(note.author, "octocat");
        assert!(note.markdown.starts_with("Adds a shiny feature"));
        assert!(note.markdown.contains("[#42](https://github.com/org/repo/pull/42)"));
        assert!(note.markdown.ends_with("Courtesy of SIG Node"));
    }

    #[tokio::test]
    async fn test_build_release_note_without_block_is_a_skip() {
        let g = gatherer(vec![
            pr(1, "no note block at all", &[]),
            pr(2, "```release-note\nNONE\n```", &["release-note-none"]),
        ]);

        assert!(g.build_release_note(&pair("a", 1)).await.unwrap().is_none());
        assert!(g.build_release_note(&pair("b", 2)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_gather_counts_and_history_order() {
        let g = gatherer(vec![
            pr(11, "```release-note\nfirst change\n```", &["kind/bug"]),
            pr(22, "```release-note\nsecond change\n```", &["kind/feature"]),
            pr(33, "```release-note\nNONE\n```", &[]),
            pr(44, "```release-note\nthird change\n```", &[]),
        ]);

        // 55 is not known to the client, so it fails retrieval.
        let pairs = vec![
            pair("e", 44),
            pair("d", 55),
            pair("c", 33),
            pair("b", 22),
            pair("a", 11),
        ];
        let (notes, summary) = g.gather(&pairs, &[]).await.unwrap();

        assert_eq!(summary.total, 5);
        assert_eq!(summary.done, 5);
        assert_eq!(summary.built, 3);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 1);

        // History follows the input walk order, not completion order.
        assert_eq!(notes.history(), &[44, 22, 11]);
        assert_eq!(notes.len(), 3);
        assert!(notes.get(33).is_none());
        assert!(notes.get(55).is_none());
    }

    #[tokio::test]
    async fn test_gather_with_single_permit() {
        let prs: Vec<PullRequest> = (1..=4)
            .map(|n| pr(n, "```release-note\na change\n```", &[]))
            .collect();
        let g = gatherer(prs).with_max_parallel(1);

        let pairs: Vec<CommitPrPair> = (1..=4).map(|n| pair("sha", n)).collect();
        let (notes, summary) = g.gather(&pairs, &[]).await.unwrap();

        assert_eq!(summary.done, 4);
        assert_eq!(summary.built, 4);
        assert_eq!(notes.len(), 4);
    }

    #[tokio::test]
    async fn test_gather_deduplicates_change_requests() {
        let g = gatherer(vec![pr(
            77,
            "```release-note\ncherry picked change\n```",
            &[],
        )]);

        // Two commits referencing the same change request.
        let pairs = vec![pair("merge", 77), pair("pick", 77)];
        let (notes, summary) = g.gather(&pairs, &[]).await.unwrap();

        assert_eq!(summary.done, 2);
        assert_eq!(summary.built, 2);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes.history(), &[77]);
    }

    struct SingleMapProvider {
        map: ReleaseNotesMap,
    }

    impl MapProvider for SingleMapProvider {
        fn get_maps_for_pr(&self, pr_number: u64) -> Result<Vec<ReleaseNotesMap>> {
            if self.map.pr == pr_number {
                Ok(vec![self.map.clone()])
            } else {
                Ok(vec![])
            }
        }
    }

    #[tokio::test]
    async fn test_gather_applies_map_overrides() {
        let g = gatherer(vec![
            pr(10, "```release-note\ngenerated text\n```", &["kind/bug"]),
            pr(20, "```release-note\nuntouched\n```", &[]),
        ]);

        let provider: Box<dyn MapProvider> = Box::new(SingleMapProvider {
            map: ReleaseNotesMap {
                pr: 10,
                release_note: MapFields {
                    text: Some("curated text".to_string()),
                    ..Default::default()
                },
                ..Default::default()
            },
        });

        let pairs = vec![pair("a", 10), pair("b", 20)];
        let (notes, _) = g.gather(&pairs, &[provider]).await.unwrap();

        let overridden = notes.get(10).unwrap();
        assert_eq!(overridden.text, "curated text");
        assert!(overridden.markdown.starts_with("Curated text"));

        let untouched = notes.get(20).unwrap();
        assert_eq!(untouched.text, "untouched");
    }
}
