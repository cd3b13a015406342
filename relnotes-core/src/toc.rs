//! Table of contents generation
//!
//! Scans rendered Markdown for headings and builds a nested link list.
//! Heading lines inside fenced code blocks are ignored. Anchors follow
//! the hosted-renderer convention: lowercase, strip everything outside
//! `[a-z0-9 -]`, spaces become hyphens, and repeated anchors get a
//! numeric suffix in order of appearance.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

/// Marker opening a generated TOC block.
pub const TOC_START: &str = "<!-- BEGIN MUNGE: GENERATED_TOC -->";
/// Marker closing a generated TOC block.
pub const TOC_END: &str = "<!-- END MUNGE: GENERATED_TOC -->";

fn heading_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(#{1,6})\s+(.*)$").unwrap())
}

/// Build a table of contents for a Markdown document.
///
/// One entry per heading, indented two spaces per level below the top.
/// Returns an empty string when the document has no headings.
pub fn generate_toc(markdown: &str) -> String {
    let mut toc = String::new();
    let mut anchor_counts: HashMap<String, usize> = HashMap::new();
    let mut in_code_block = false;

    for line in markdown.lines() {
        let line = line.trim_end_matches('\r');
        if line.trim_start().starts_with("```") {
            in_code_block = !in_code_block;
            continue;
        }
        if in_code_block {
            continue;
        }

        let Some(captures) = heading_pattern().captures(line) else {
            continue;
        };
        let level = captures[1].len();
        let heading = captures[2].trim_end();

        let mut anchor = build_anchor(heading);
        match anchor_counts.get_mut(&anchor) {
            Some(count) => {
                let suffixed = format!("{anchor}-{count}");
                *count += 1;
                anchor = suffixed;
            }
            None => {
                anchor_counts.insert(anchor.clone(), 1);
            }
        }

        let indent = "  ".repeat(level - 1);
        toc.push_str(&format!("{indent}- [{heading}](#{anchor})\n"));
    }

    toc
}

/// Wrap a generated TOC in its begin/end marker comments.
pub fn wrap_toc(toc: &str) -> String {
    format!("{TOC_START}\n{toc}{TOC_END}")
}

fn build_anchor(heading: &str) -> String {
    heading
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == ' ' || *c == '-')
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}
