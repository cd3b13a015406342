//! Release note types and the gathered collection
//!
//! Core types produced by the gatherer and consumed by document assembly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Classification of a documentation link attached to a note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DocType {
    /// Anything that is not tracked in the project itself
    #[default]
    #[serde(rename = "external")]
    External,
    /// Enhancement proposal in the project's tracking repository
    #[serde(rename = "KEP")]
    Kep,
    /// Page on the project's documentation site
    #[serde(rename = "official")]
    Official,
}

impl std::fmt::Display for DocType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocType::External => write!(f, "external"),
            DocType::Kep => write!(f, "KEP"),
            DocType::Official => write!(f, "official"),
        }
    }
}

/// A documentation reference parsed from a change request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Documentation {
    /// Free-form description preceding the link
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Link target
    pub url: String,
    /// Where the link points
    #[serde(rename = "type", default)]
    pub doc_type: DocType,
}

fn is_false(v: &bool) -> bool {
    !*v
}

/// A single classified release note
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReleaseNote {
    /// Commit the note was gathered from
    pub commit: String,
    /// Note text extracted from the change request body
    pub text: String,
    /// Rendered markdown line, ready for document assembly
    pub markdown: String,
    /// Documentation references from the change request body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<Vec<Documentation>>,
    /// Author login
    pub author: String,
    /// Author profile URL
    pub author_url: String,
    /// Change request URL
    pub pr_url: String,
    /// Change request number
    pub pr_number: u64,
    /// `sig/` labels with the prefix stripped
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sigs: Vec<String>,
    /// `kind/` labels with the prefix stripped
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kinds: Vec<String>,
    /// `area/` labels with the prefix stripped
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub areas: Vec<String>,
    /// Carries a `kind/feature` label
    #[serde(default, skip_serializing_if = "is_false")]
    pub feature: bool,
    /// Applies to more than one SIG
    #[serde(default, rename = "duplicate", skip_serializing_if = "is_false")]
    pub duplicate_sig: bool,
    /// Applies to more than one kind
    #[serde(default, skip_serializing_if = "is_false")]
    pub duplicate_kind: bool,
    /// Carries the action-required label
    #[serde(default, skip_serializing_if = "is_false")]
    pub action_required: bool,
    /// Carries the release-note-none label; never rendered
    #[serde(default, skip_serializing_if = "is_false")]
    pub do_not_publish: bool,
}

impl ReleaseNote {
    /// Recompute the markdown field from the current text and metadata.
    ///
    /// Called after construction and again after map overlays change any
    /// content field.
    pub fn render_markdown(&mut self) {
        self.markdown = compose_markdown(
            &self.text,
            self.pr_number,
            &self.pr_url,
            &self.author,
            &self.author_url,
            &self.sigs,
            self.feature || self.action_required,
        );
    }
}

/// Gathered notes keyed by change request number, plus the walk-ordered
/// history.
///
/// The map is insertion-order independent; `history` is the only ordering
/// contract and holds the change request numbers in commit-walk order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReleaseNotes {
    by_pr: BTreeMap<u64, ReleaseNote>,
    history: Vec<u64>,
}

impl ReleaseNotes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a note, keyed by its change request number.
    pub fn insert(&mut self, note: ReleaseNote) {
        self.by_pr.insert(note.pr_number, note);
    }

    pub fn get(&self, pr_number: u64) -> Option<&ReleaseNote> {
        self.by_pr.get(&pr_number)
    }

    pub fn contains(&self, pr_number: u64) -> bool {
        self.by_pr.contains_key(&pr_number)
    }

    pub fn len(&self) -> usize {
        self.by_pr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_pr.is_empty()
    }

    /// Change request numbers in commit-walk order.
    pub fn history(&self) -> &[u64] {
        &self.history
    }

    /// Notes in ascending change request number order.
    pub fn notes(&self) -> impl Iterator<Item = &ReleaseNote> {
        self.by_pr.values()
    }

    /// Replace the history sequence.
    ///
    /// Entries without a gathered note are dropped, repeated numbers keep
    /// their first position only.
    pub(crate) fn set_history(&mut self, walk_order: &[u64]) {
        let mut seen = std::collections::HashSet::new();
        self.history = walk_order
            .iter()
            .copied()
            .filter(|pr| self.by_pr.contains_key(pr) && seen.insert(*pr))
            .collect();
    }
}

/// Strip `prefix/` from every label carrying it and return the remainders.
pub fn labels_with_prefix(labels: &[String], prefix: &str) -> Vec<String> {
    let full_prefix = format!("{prefix}/");
    labels
        .iter()
        .filter_map(|label| label.strip_prefix(&full_prefix))
        .map(String::from)
        .collect()
}

/// True when one of the labels equals `name` exactly.
pub fn label_exact_match(labels: &[String], name: &str) -> bool {
    labels.iter().any(|label| label == name)
}

/// Compose the rendered markdown line for a note.
///
/// Multi-line texts are indented so continuation lines nest under the list
/// bullet the renderer adds. The courtesy suffix is only attached for
/// feature or action-required notes that carry at least one SIG.
pub fn compose_markdown(
    text: &str,
    pr_number: u64,
    pr_url: &str,
    author: &str,
    author_url: &str,
    sigs: &[String],
    with_courtesy: bool,
) -> String {
    let indented = text.replace('\n', "\n  ");
    let mut markdown =
        format!("{indented} ([#{pr_number}]({pr_url}), [@{author}]({author_url}))");

    if with_courtesy {
        let sig_list = prettify_sig_list(sigs);
        if !sig_list.is_empty() {
            markdown = format!("{markdown}\n\n  Courtesy of {sig_list}");
        }
    }

    capitalize_first(&markdown)
}

/// Uppercase the first character so assembled documents look uniform.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Render a SIG slug list as prose: "SIG Api Machinery, SIG Node and SIG CLI".
pub fn prettify_sig_list(sigs: &[String]) -> String {
    let mut sorted: Vec<&String> = sigs.iter().collect();
    sorted.sort();

    let mut list = String::new();
    let last = sorted.len().saturating_sub(1);
    for (i, sig) in sorted.iter().enumerate() {
        if i == 0 {
            list = format!("SIG {}", pretty_sig(sig));
        } else if i == last {
            list = format!("{list} and SIG {}", pretty_sig(sig));
        } else {
            list = format!("{list}, SIG {}", pretty_sig(sig));
        }
    }
    list
}

/// Title-case a dash-separated SIG slug, upper-casing known acronyms.
fn pretty_sig(sig: &str) -> String {
    sig.split('-')
        .map(|part| match part {
            "vsphere" => "vSphere".to_string(),
            "vmware" => "VMware".to_string(),
            "openstack" => "OpenStack".to_string(),
            "api" | "aws" | "cli" | "gcp" => part.to_uppercase(),
            _ => capitalize_first(part),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label_vec(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_labels_with_prefix() {
        let labels = label_vec(&[
            "sig/apps",
            "sig/cluster-lifecycle",
            "kind/bug",
            "area/kubectl",
            "approved",
        ]);
        assert_eq!(
            labels_with_prefix(&labels, "sig"),
            vec!["apps", "cluster-lifecycle"]
        );
        assert_eq!(labels_with_prefix(&labels, "kind"), vec!["bug"]);
        assert_eq!(labels_with_prefix(&labels, "area"), vec!["kubectl"]);
        assert!(labels_with_prefix(&labels, "priority").is_empty());
    }

    #[test]
    fn test_label_exact_match() {
        let labels = label_vec(&["release-note-none", "lgtm"]);
        assert!(label_exact_match(&labels, "release-note-none"));
        assert!(!label_exact_match(&labels, "release-note"));
    }

    #[test]
    fn test_compose_markdown_plain() {
        let md = compose_markdown(
            "fixed a thing",
            1234,
            "https://github.com/org/repo/pull/1234",
            "octocat",
            "https://github.com/octocat",
            &[],
            false,
        );
        assert_eq!(
            md,
            "Fixed a thing ([#1234](https://github.com/org/repo/pull/1234), [@octocat](https://github.com/octocat))"
        );
    }

    #[test]
    fn test_compose_markdown_multiline_indents() {
        let md = compose_markdown(
            "line one\nline two",
            1,
            "u",
            "a",
            "au",
            &[],
            false,
        );
        assert!(md.starts_with("Line one\n  line two"));
    }

    #[test]
    fn test_compose_markdown_courtesy_suffix() {
        let sigs = label_vec(&["node", "api-machinery"]);
        let md = compose_markdown("adds a feature", 2, "u", "a", "au", &sigs, true);
        assert!(md.ends_with("\n\n  Courtesy of SIG API Machinery and SIG Node"));

        // No suffix without SIGs, even for feature notes.
        let md = compose_markdown("adds a feature", 2, "u", "a", "au", &[], true);
        assert!(!md.contains("Courtesy of"));
    }

    #[test]
    fn test_prettify_sig_list() {
        assert_eq!(prettify_sig_list(&label_vec(&["node"])), "SIG Node");
        assert_eq!(
            prettify_sig_list(&label_vec(&["node", "apps"])),
            "SIG Apps and SIG Node"
        );
        assert_eq!(
            prettify_sig_list(&label_vec(&["node", "cli", "aws"])),
            "SIG AWS, SIG CLI and SIG Node"
        );
        assert_eq!(
            prettify_sig_list(&label_vec(&["cluster-lifecycle"])),
            "SIG Cluster Lifecycle"
        );
        assert_eq!(prettify_sig_list(&[]), "");
    }

    #[test]
    fn test_collection_history_filters_and_dedupes() {
        let mut notes = ReleaseNotes::new();
        for pr in [10u64, 20, 30] {
            notes.insert(ReleaseNote {
                pr_number: pr,
                ..Default::default()
            });
        }

        // 40 was never gathered, 20 appears twice in the walk.
        notes.set_history(&[30, 20, 40, 20, 10]);
        assert_eq!(notes.history(), &[30, 20, 10]);
        assert_eq!(notes.len(), 3);
    }

    #[test]
    fn test_note_json_omits_empty_fields() {
        let note = ReleaseNote {
            commit: "abc".into(),
            text: "a note".into(),
            markdown: "A note".into(),
            author: "dev".into(),
            author_url: "https://github.com/dev".into(),
            pr_url: "https://github.com/o/r/pull/7".into(),
            pr_number: 7,
            ..Default::default()
        };
        let json = serde_json::to_string(&note).unwrap();
        assert!(!json.contains("duplicate"));
        assert!(!json.contains("sigs"));
        assert!(!json.contains("documentation"));
        assert!(json.contains("\"pr_number\":7"));
    }
}
