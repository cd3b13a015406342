//! Commit message and change request body pattern extraction
//!
//! All text patterns the gatherer recognizes live here: change request
//! numbers in commit messages, fenced note blocks, the action-required
//! annotation, and documentation link blocks.

use std::sync::OnceLock;

use regex::Regex;

use crate::note::{DocType, Documentation};

/// Change request number patterns, tried in order. First match wins.
///
/// Covers merge commits, the automated cherry-pick convention and
/// squash-merge subjects.
fn pr_number_patterns() -> &'static [Regex; 3] {
    static PATTERNS: OnceLock<[Regex; 3]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(r"Merge pull request #(?P<number>\d+)").unwrap(),
            Regex::new(r"automated-cherry-pick-of-#(?P<number>\d+)").unwrap(),
            Regex::new(r"\(#(?P<number>\d+)\)").unwrap(),
        ]
    })
}

/// Fenced note block markers, tried in order. CRLF variants match bodies
/// pasted from web forms, LF variants everything else; the bare fence is a
/// legacy form still found in old change requests.
fn note_block_patterns() -> &'static [Regex; 6] {
    static PATTERNS: OnceLock<[Regex; 6]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(r"(?s)```release-notes?\r\n(?P<note>.+?)\r\n```").unwrap(),
            Regex::new(r"(?s)```dev-release-notes?\r\n(?P<note>.+?)\r\n```").unwrap(),
            Regex::new(r"(?s)```\r\n(?P<note>.+?)\r\n```").unwrap(),
            Regex::new(r"(?s)```release-notes?\n(?P<note>.+?)\n```").unwrap(),
            Regex::new(r"(?s)```dev-release-notes?\n(?P<note>.+?)\n```").unwrap(),
            Regex::new(r"(?s)```\n(?P<note>.+?)\n```").unwrap(),
        ]
    })
}

/// Extract a change request number from a commit message.
///
/// Messages matching none of the known forms yield `None`; that is the
/// expected case for direct pushes and is not an error.
pub fn pr_number_from_message(message: &str) -> Option<u64> {
    for pattern in pr_number_patterns() {
        if let Some(caps) = pattern.captures(message) {
            if let Ok(number) = caps["number"].parse::<u64>() {
                return Some(number);
            }
        }
    }
    None
}

/// Extract and normalize the note text from a change request body.
///
/// Returns `None` when no marker matches or when the block content
/// normalizes to an explicit "no note" value (`NONE`, `N/A`, empty); both
/// mean "nothing to build", not an error.
pub fn note_text_from_body(body: &str) -> Option<String> {
    for pattern in note_block_patterns() {
        let Some(caps) = pattern.captures(body) else {
            continue;
        };

        // '#' is escaped so note texts cannot form accidental issue links.
        let note = caps["note"].replace('#', "&#35;");
        let note = note.replace('\r', "");
        let note = strip_action_required(&note);
        let note = dashify(&note);
        let note = strip_leading_bullet(note.trim());

        if is_contentless(note) {
            return None;
        }
        return Some(note.to_string());
    }
    None
}

/// Remove the action-required annotation, in either of its phrasings.
pub fn strip_action_required(note: &str) -> String {
    static BRACKETED: OnceLock<Regex> = OnceLock::new();
    static PREFIXED: OnceLock<Regex> = OnceLock::new();

    let bracketed =
        BRACKETED.get_or_init(|| Regex::new(r"(?i)\[action required\]\s").unwrap());
    let prefixed = PREFIXED.get_or_init(|| Regex::new(r"(?i)action required:\s").unwrap());

    let note = bracketed.replace_all(note, "");
    prefixed.replace_all(&note, "").into_owned()
}

/// Normalize star bullets to dashes.
fn dashify(note: &str) -> String {
    note.replace("* ", "- ")
}

/// Drop a single leading list bullet; the renderer adds its own.
fn strip_leading_bullet(note: &str) -> &str {
    match note.strip_prefix("- ") {
        Some(rest) => rest.trim_start(),
        None => note,
    }
}

/// True for block contents that explicitly declare "no release note".
fn is_contentless(note: &str) -> bool {
    let normalized = note
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_uppercase();
    matches!(normalized.as_str(), "" | "NONE" | "N/A" | "NA")
}

/// Parse the fenced `docs` block into classified documentation links.
///
/// Absent or malformed blocks yield an empty list; documentation is never
/// required.
pub fn documentation_from_body(body: &str) -> Vec<Documentation> {
    static DOCS: OnceLock<Regex> = OnceLock::new();
    static BULLETS: OnceLock<Regex> = OnceLock::new();

    let docs_block =
        DOCS.get_or_init(|| Regex::new(r"(?s)```docs\r?\n(?P<text>.+?)\r?\n```").unwrap());
    let bullets = BULLETS.get_or_init(|| Regex::new(r"[*-]\s").unwrap());

    let Some(caps) = docs_block.captures(body) else {
        return Vec::new();
    };

    let text = bullets.replace_all(&caps["text"], "");
    let mut result = Vec::new();

    for line in text.lines() {
        let Some(pos) = line.find("http") else {
            continue;
        };
        let description = line[..pos]
            .trim()
            .trim_end_matches([' ', ':', '-'])
            .to_string();
        let url = line[pos..].trim().to_string();

        let Ok(parsed) = reqwest::Url::parse(&url) else {
            continue;
        };

        result.push(Documentation {
            description,
            doc_type: classify_url(&parsed),
            url,
        });
    }

    result
}

/// Classify a documentation link by where it points.
fn classify_url(url: &reqwest::Url) -> DocType {
    let host = url.host_str().unwrap_or_default();
    let path = url.path();

    // Enhancement proposals tracked in a dedicated repository
    if host.contains("github.com") && path.contains("/enhancements/") {
        return DocType::Kep;
    }

    // The project documentation site
    if host.starts_with("docs.") || path.contains("/docs/") {
        return DocType::Official;
    }

    DocType::External
}
