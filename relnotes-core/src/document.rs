//! Document assembly and rendering
//!
//! Turns the gathered collection into a categorized document and renders
//! it as Markdown (through a handlebars template) or JSON. Bucketing
//! walks the collection history so note order inside each section follows
//! the commit walk.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use handlebars::Handlebars;
use serde::Serialize;
use sha2::{Digest, Sha512};
use tracing::debug;

use crate::error::{NotesError, Result};
use crate::note::ReleaseNotes;

/// Note category. The declaration order is the fixed priority order used
/// for section sorting, highest first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
)]
pub enum Kind {
    #[serde(rename = "deprecation")]
    Deprecation,
    #[serde(rename = "api-change")]
    ApiChange,
    #[serde(rename = "feature")]
    Feature,
    #[serde(rename = "design")]
    Design,
    #[serde(rename = "documentation")]
    Documentation,
    #[serde(rename = "failing-test")]
    FailingTest,
    #[serde(rename = "bug")]
    Bug,
    #[serde(rename = "cleanup")]
    Cleanup,
    #[serde(rename = "flake")]
    Flake,
    /// Shared bucket the low signal kinds collapse into
    #[serde(rename = "Other (Bug, Cleanup or Flake)")]
    BugCleanupFlake,
    /// Notes that carry no kind at all
    #[serde(rename = "Uncategorized")]
    Uncategorized,
}

impl Kind {
    /// Parse a kind label as it appears on a change request.
    pub fn from_label(label: &str) -> Option<Kind> {
        match label {
            "deprecation" => Some(Kind::Deprecation),
            "api-change" => Some(Kind::ApiChange),
            "feature" => Some(Kind::Feature),
            "design" => Some(Kind::Design),
            "documentation" => Some(Kind::Documentation),
            "failing-test" => Some(Kind::FailingTest),
            "bug" => Some(Kind::Bug),
            "cleanup" => Some(Kind::Cleanup),
            "flake" => Some(Kind::Flake),
            "Other (Bug, Cleanup or Flake)" => Some(Kind::BugCleanupFlake),
            "Uncategorized" => Some(Kind::Uncategorized),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Deprecation => "deprecation",
            Kind::ApiChange => "api-change",
            Kind::Feature => "feature",
            Kind::Design => "design",
            Kind::Documentation => "documentation",
            Kind::FailingTest => "failing-test",
            Kind::Bug => "bug",
            Kind::Cleanup => "cleanup",
            Kind::Flake => "flake",
            Kind::BugCleanupFlake => "Other (Bug, Cleanup or Flake)",
            Kind::Uncategorized => "Uncategorized",
        }
    }

    /// Section heading text.
    pub fn pretty(&self) -> &'static str {
        match self {
            Kind::Deprecation => "Deprecation",
            Kind::ApiChange => "API Change",
            Kind::Feature => "Feature",
            Kind::Design => "Design",
            Kind::Documentation => "Documentation",
            Kind::FailingTest => "Failing Test",
            Kind::Bug => "Bug",
            Kind::Cleanup => "Cleanup",
            Kind::Flake => "Flake",
            Kind::BugCleanupFlake => "Other (Bug, Cleanup or Flake)",
            Kind::Uncategorized => "Uncategorized",
        }
    }

    /// Collapse the low signal kinds into their shared bucket.
    pub fn collapsed(self) -> Kind {
        match self {
            Kind::Bug | Kind::Cleanup | Kind::Flake => Kind::BugCleanupFlake,
            kind => kind,
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the highest priority kind among the given labels. Labels outside
/// the known set count as uncategorized.
fn highest_priority_kind(kinds: &[String]) -> Kind {
    kinds
        .iter()
        .filter_map(|label| Kind::from_label(label))
        .min()
        .unwrap_or(Kind::Uncategorized)
}

/// A downloadable release artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct File {
    pub checksum: String,
    pub name: String,
    pub url: String,
}

/// Released artifacts grouped by filename convention.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileMetadata {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub source: Vec<File>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub client: Vec<File>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub server: Vec<File>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub node: Vec<File>,
}

impl FileMetadata {
    /// Hash every regular file in `dir` with SHA-512 and group the
    /// results. Returns `None` when the directory holds no files.
    pub fn from_dir(dir: &Path, url_prefix: &str, tag: &str) -> Result<Option<FileMetadata>> {
        if tag.is_empty() {
            return Err(NotesError::other("release tag not specified"));
        }
        if url_prefix.is_empty() {
            return Err(NotesError::other("artifact url prefix not specified"));
        }

        let mut names = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();

        let mut metadata = FileMetadata::default();
        for name in names {
            let mut file = std::fs::File::open(dir.join(&name))?;
            let mut hasher = Sha512::new();
            std::io::copy(&mut file, &mut hasher)?;

            let file = File {
                checksum: format!("{:x}", hasher.finalize()),
                url: format!("{url_prefix}/{tag}/{name}"),
                name,
            };
            let group = match &file.name {
                n if n.contains("-client") => &mut metadata.client,
                n if n.contains("-server") => &mut metadata.server,
                n if n.contains("-node") => &mut metadata.node,
                _ => &mut metadata.source,
            };
            group.push(file);
        }

        if metadata == FileMetadata::default() {
            return Ok(None);
        }
        Ok(Some(metadata))
    }
}

/// Template selection for the Markdown pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TemplateSpec {
    /// The embedded default template
    #[default]
    Default,
    /// Template text passed directly on the options surface
    Inline(String),
    /// Template read from a file
    Path(PathBuf),
}

impl TemplateSpec {
    /// Parse a template selector string: empty or `default` for the
    /// embedded template, `inline:<text>` for a literal, anything else
    /// is a file path.
    pub fn parse(spec: &str) -> TemplateSpec {
        if spec.is_empty() || spec == "default" {
            TemplateSpec::Default
        } else if let Some(inline) = spec.strip_prefix("inline:") {
            TemplateSpec::Inline(inline.to_string())
        } else {
            TemplateSpec::Path(PathBuf::from(spec))
        }
    }

    /// Resolve to template text.
    pub fn load(&self) -> Result<String> {
        match self {
            TemplateSpec::Default => Ok(DEFAULT_TEMPLATE.to_string()),
            TemplateSpec::Inline(text) => {
                if text.is_empty() {
                    return Err(NotesError::template("empty inline template"));
                }
                Ok(text.clone())
            }
            TemplateSpec::Path(path) => std::fs::read_to_string(path).map_err(|err| {
                NotesError::template(format!(
                    "reading template {}: {err}",
                    path.display()
                ))
            }),
        }
    }
}

/// The embedded Markdown template.
pub const DEFAULT_TEMPLATE: &str = r#"# {{release_tag}}

{{#if downloads}}
## Downloads for {{release_tag}}

{{#if downloads.source}}
filename | sha512 hash
-------- | -----------
{{#each downloads.source}}
[{{name}}]({{url}}) | `{{checksum}}`
{{/each}}

{{/if}}
{{#if downloads.client}}
### Client Binaries

filename | sha512 hash
-------- | -----------
{{#each downloads.client}}
[{{name}}]({{url}}) | `{{checksum}}`
{{/each}}

{{/if}}
{{#if downloads.server}}
### Server Binaries

filename | sha512 hash
-------- | -----------
{{#each downloads.server}}
[{{name}}]({{url}}) | `{{checksum}}`
{{/each}}

{{/if}}
{{#if downloads.node}}
### Node Binaries

filename | sha512 hash
-------- | -----------
{{#each downloads.node}}
[{{name}}]({{url}}) | `{{checksum}}`
{{/each}}

{{/if}}
{{/if}}
## Changelog since {{previous_tag}}

{{#if action_required}}
## Urgent Upgrade Notes

### (No, really, you MUST read this before you upgrade)

{{#each action_required}}
{{note this}}
{{/each}}

{{/if}}
{{#if notes}}
## Changes by Kind

{{#each notes}}
### {{prettyKind kind}}

{{#each note_entries}}
{{note this}}
{{/each}}

{{/each}}
{{/if}}
"#;

/// A categorized release notes document, derived once per render request.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    /// Urgent notes, sorted lexicographically
    #[serde(rename = "action_required")]
    pub notes_with_action_required: Vec<String>,
    /// Rendered note lines per kind, in history order within each kind
    #[serde(rename = "kinds")]
    pub notes_by_kind: BTreeMap<Kind, Vec<String>>,
    #[serde(rename = "downloads", skip_serializing_if = "Option::is_none")]
    pub downloads: Option<FileMetadata>,
    #[serde(rename = "release_tag")]
    pub current_revision: String,
    #[serde(rename = "previous_tag")]
    pub previous_revision: String,
}

impl Document {
    /// Assemble a document from the gathered collection.
    ///
    /// Walks the collection history in order. Duplicate-kind notes are
    /// filed once under their highest priority kind, action-required
    /// notes go to the urgent list, everything else is filed under every
    /// kind it carries, with kindless notes collected as uncategorized.
    /// Notes flagged do-not-publish are dropped here.
    pub fn new(notes: &ReleaseNotes, previous_revision: &str, current_revision: &str) -> Self {
        let mut doc = Document {
            notes_with_action_required: Vec::new(),
            notes_by_kind: BTreeMap::new(),
            downloads: None,
            current_revision: current_revision.to_string(),
            previous_revision: previous_revision.to_string(),
        };

        for pr in notes.history() {
            let Some(note) = notes.get(*pr) else {
                continue;
            };
            if note.do_not_publish {
                debug!("skipping do-not-publish note for pr {pr}");
                continue;
            }

            if note.duplicate_kind {
                let kind = highest_priority_kind(&note.kinds).collapsed();
                doc.file_under(kind, &note.markdown);
            } else if note.action_required {
                doc.notes_with_action_required.push(note.markdown.clone());
            } else if note.kinds.is_empty() {
                doc.file_under(Kind::Uncategorized, &note.markdown);
            } else {
                let kinds: BTreeSet<Kind> = note
                    .kinds
                    .iter()
                    .map(|label| {
                        Kind::from_label(label)
                            .unwrap_or(Kind::Uncategorized)
                            .collapsed()
                    })
                    .collect();
                for kind in kinds {
                    doc.file_under(kind, &note.markdown);
                }
            }
        }

        doc.notes_with_action_required.sort();
        doc
    }

    fn file_under(&mut self, kind: Kind, markdown: &str) {
        self.notes_by_kind
            .entry(kind)
            .or_default()
            .push(markdown.to_string());
    }

    /// Attach a downloads table built from a local artifact directory.
    pub fn with_downloads(mut self, dir: Option<&Path>, url_prefix: &str) -> Result<Self> {
        if let Some(dir) = dir {
            self.downloads = FileMetadata::from_dir(dir, url_prefix, &self.current_revision)?;
        }
        Ok(self)
    }

    /// Render the document through a Markdown template.
    pub fn render_markdown(&self, template: &str) -> Result<String> {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        registry.register_helper("prettyKind", Box::new(pretty_kind_helper));
        registry.register_helper("note", Box::new(note_helper));

        let data = TemplateData {
            release_tag: &self.current_revision,
            previous_tag: &self.previous_revision,
            downloads: self.downloads.as_ref(),
            action_required: &self.notes_with_action_required,
            notes: self
                .notes_by_kind
                .iter()
                .map(|(kind, entries)| NoteCategory {
                    kind: *kind,
                    note_entries: entries,
                })
                .collect(),
        };

        let rendered = registry.render_template(template, &data)?;
        Ok(rendered.trim().to_string())
    }

    /// Serialize the document structure as pretty JSON.
    pub fn render_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Serialization view handed to the template. Categories are a list so
/// template iteration follows kind priority instead of key order.
#[derive(Serialize)]
struct TemplateData<'a> {
    release_tag: &'a str,
    previous_tag: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    downloads: Option<&'a FileMetadata>,
    action_required: &'a [String],
    notes: Vec<NoteCategory<'a>>,
}

#[derive(Serialize)]
struct NoteCategory<'a> {
    kind: Kind,
    note_entries: &'a [String],
}

fn pretty_kind_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    let param = h.param(0).and_then(|v| v.value().as_str()).unwrap_or("");
    match Kind::from_label(param) {
        Some(kind) => out.write(kind.pretty())?,
        None => out.write(param)?,
    }
    Ok(())
}

fn note_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    let param = h.param(0).and_then(|v| v.value().as_str()).unwrap_or("");
    if !param.starts_with("- ") {
        out.write("- ")?;
    }
    out.write(param)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::ReleaseNote;

    #[test]
    fn test_kind_sort_follows_priority() {
        let mut kinds = vec![
            Kind::Cleanup,
            Kind::ApiChange,
            Kind::Deprecation,
            Kind::Documentation,
            Kind::BugCleanupFlake,
            Kind::FailingTest,
            Kind::Design,
            Kind::Flake,
            Kind::Bug,
            Kind::Feature,
            Kind::Uncategorized,
        ];
        kinds.sort();
        assert_eq!(
            kinds,
            vec![
                Kind::Deprecation,
                Kind::ApiChange,
                Kind::Feature,
                Kind::Design,
                Kind::Documentation,
                Kind::FailingTest,
                Kind::Bug,
                Kind::Cleanup,
                Kind::Flake,
                Kind::BugCleanupFlake,
                Kind::Uncategorized,
            ]
        );
    }

    #[test]
    fn test_kind_labels_and_pretty_names() {
        assert_eq!(Kind::from_label("api-change"), Some(Kind::ApiChange));
        assert_eq!(Kind::from_label("failing-test"), Some(Kind::FailingTest));
        assert_eq!(Kind::from_label("regression"), None);

        assert_eq!(Kind::ApiChange.pretty(), "API Change");
        assert_eq!(Kind::FailingTest.pretty(), "Failing Test");
        assert_eq!(
            Kind::BugCleanupFlake.pretty(),
            "Other (Bug, Cleanup or Flake)"
        );
        assert_eq!(Kind::Deprecation.pretty(), "Deprecation");

        assert_eq!(Kind::Bug.collapsed(), Kind::BugCleanupFlake);
        assert_eq!(Kind::Cleanup.collapsed(), Kind::BugCleanupFlake);
        assert_eq!(Kind::Flake.collapsed(), Kind::BugCleanupFlake);
        assert_eq!(Kind::Feature.collapsed(), Kind::Feature);
    }

    fn note(pr: u64, markdown: &str) -> ReleaseNote {
        ReleaseNote {
            pr_number: pr,
            markdown: markdown.to_string(),
            ..Default::default()
        }
    }

    fn collection(notes: Vec<ReleaseNote>, history: &[u64]) -> ReleaseNotes {
        let mut collection = ReleaseNotes::new();
        for note in notes {
            collection.insert(note);
        }
        collection.set_history(history);
        collection
    }

    #[test]
    fn test_document_filing() {
        let urgent_b = ReleaseNote {
            action_required: true,
            ..note(1, "Urgent B")
        };
        let urgent_a = ReleaseNote {
            action_required: true,
            ..note(2, "Urgent A")
        };
        let duplicate = ReleaseNote {
            duplicate_kind: true,
            kinds: vec!["bug".to_string(), "feature".to_string()],
            ..note(3, "Filed once under feature")
        };
        let cleanup = ReleaseNote {
            kinds: vec!["cleanup".to_string()],
            ..note(4, "A cleanup")
        };
        let kindless = note(5, "No category");
        let hidden = ReleaseNote {
            do_not_publish: true,
            ..note(6, "Never shown")
        };

        let notes = collection(
            vec![urgent_b, urgent_a, duplicate, cleanup, kindless, hidden],
            &[1, 2, 3, 4, 5, 6],
        );
        let doc = Document::new(&notes, "v1.2.0", "v1.2.1");

        // Urgent list is sorted lexicographically, not by history.
        assert_eq!(
            doc.notes_with_action_required,
            vec!["Urgent A".to_string(), "Urgent B".to_string()]
        );

        // Duplicate-kind notes land once, under the highest priority kind.
        assert_eq!(
            doc.notes_by_kind.get(&Kind::Feature),
            Some(&vec!["Filed once under feature".to_string()])
        );
        assert!(!doc.notes_by_kind.contains_key(&Kind::Bug));

        // Low signal kinds collapse into the shared bucket.
        assert_eq!(
            doc.notes_by_kind.get(&Kind::BugCleanupFlake),
            Some(&vec!["A cleanup".to_string()])
        );

        // Kindless notes are kept, not dropped.
        assert_eq!(
            doc.notes_by_kind.get(&Kind::Uncategorized),
            Some(&vec!["No category".to_string()])
        );

        // Do-not-publish never reaches the document.
        let json = doc.render_json().unwrap();
        assert!(!json.contains("Never shown"));
    }

    #[test]
    fn test_buckets_keep_history_order() {
        let first = ReleaseNote {
            kinds: vec!["bug".to_string()],
            ..note(10, "Zebra fix")
        };
        let second = ReleaseNote {
            kinds: vec!["bug".to_string()],
            ..note(11, "Aardvark fix")
        };

        let notes = collection(vec![first, second], &[10, 11]);
        let doc = Document::new(&notes, "v0.1.0", "v0.2.0");

        // History order wins over lexicographic order inside a bucket.
        assert_eq!(
            doc.notes_by_kind.get(&Kind::BugCleanupFlake),
            Some(&vec!["Zebra fix".to_string(), "Aardvark fix".to_string()])
        );
    }

    #[test]
    fn test_render_markdown_sections_in_order() {
        let urgent = ReleaseNote {
            action_required: true,
            ..note(1, "Must read this")
        };
        let deprecation = ReleaseNote {
            kinds: vec!["deprecation".to_string()],
            ..note(2, "Dropped a flag")
        };
        let api = ReleaseNote {
            kinds: vec!["api-change".to_string()],
            ..note(3, "Changed an endpoint")
        };

        let notes = collection(vec![urgent, deprecation, api], &[1, 2, 3]);
        let doc = Document::new(&notes, "v1.2.0", "v1.2.1");
        let markdown = doc.render_markdown(DEFAULT_TEMPLATE).unwrap();

        assert!(markdown.starts_with("# v1.2.1"));
        assert!(markdown.contains("## Changelog since v1.2.0"));
        assert!(markdown.contains("## Urgent Upgrade Notes"));
        assert!(markdown.contains("### (No, really, you MUST read this before you upgrade)"));
        assert!(markdown.contains("- Must read this"));
        assert!(markdown.contains("## Changes by Kind"));
        assert!(markdown.contains("### Deprecation\n\n- Dropped a flag"));
        assert!(markdown.contains("### API Change\n\n- Changed an endpoint"));

        // Section order: changelog, urgent, kinds; deprecation before api-change.
        let changelog = markdown.find("## Changelog since").unwrap();
        let urgent = markdown.find("## Urgent Upgrade Notes").unwrap();
        let by_kind = markdown.find("## Changes by Kind").unwrap();
        let dep = markdown.find("### Deprecation").unwrap();
        let api = markdown.find("### API Change").unwrap();
        assert!(changelog < urgent && urgent < by_kind && by_kind < dep && dep < api);
    }

    #[test]
    fn test_render_markdown_keeps_existing_bullet() {
        let bulleted = ReleaseNote {
            kinds: vec!["feature".to_string()],
            ..note(1, "- Already bulleted")
        };
        let notes = collection(vec![bulleted], &[1]);
        let doc = Document::new(&notes, "v0.0.1", "v0.0.2");

        let markdown = doc.render_markdown(DEFAULT_TEMPLATE).unwrap();
        assert!(markdown.contains("\n- Already bulleted"));
        assert!(!markdown.contains("- - Already bulleted"));
    }

    #[test]
    fn test_render_markdown_without_notes() {
        let notes = ReleaseNotes::new();
        let doc = Document::new(&notes, "v0.1.0", "v0.2.0");
        let markdown = doc.render_markdown(DEFAULT_TEMPLATE).unwrap();
        assert_eq!(markdown, "# v0.2.0\n\n## Changelog since v0.1.0");
    }

    #[test]
    fn test_markdown_is_not_html_escaped() {
        let escaped = ReleaseNote {
            kinds: vec!["bug".to_string()],
            ..note(1, "Escaped &#35;42 and `code`")
        };
        let notes = collection(vec![escaped], &[1]);
        let doc = Document::new(&notes, "v1.0.0", "v1.0.1");

        let markdown = doc.render_markdown(DEFAULT_TEMPLATE).unwrap();
        assert!(markdown.contains("Escaped &#35;42 and `code`"));
        assert!(!markdown.contains("&amp;"));
    }

    #[test]
    fn test_template_spec_parse_and_load() {
        assert_eq!(TemplateSpec::parse(""), TemplateSpec::Default);
        assert_eq!(TemplateSpec::parse("default"), TemplateSpec::Default);
        assert_eq!(
            TemplateSpec::parse("inline:# {{release_tag}}"),
            TemplateSpec::Inline("# {{release_tag}}".to_string())
        );
        assert_eq!(
            TemplateSpec::parse("/tmp/template.md.hbs"),
            TemplateSpec::Path(PathBuf::from("/tmp/template.md.hbs"))
        );

        assert_eq!(TemplateSpec::Default.load().unwrap(), DEFAULT_TEMPLATE);
        assert!(matches!(
            TemplateSpec::Path(PathBuf::from("/no/such/template")).load(),
            Err(NotesError::Template(_))
        ));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.hbs");
        std::fs::write(&path, "## {{release_tag}}").unwrap();
        assert_eq!(
            TemplateSpec::Path(path).load().unwrap(),
            "## {{release_tag}}"
        );
    }

    #[test]
    fn test_inline_template_render() {
        let notes = ReleaseNotes::new();
        let doc = Document::new(&notes, "v0.9.0", "v1.0.0");
        let spec = TemplateSpec::parse("inline:Release {{release_tag}} (since {{previous_tag}})");
        let markdown = doc.render_markdown(&spec.load().unwrap()).unwrap();
        assert_eq!(markdown, "Release v1.0.0 (since v0.9.0)");
    }

    #[test]
    fn test_file_metadata_groups_and_hashes() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "demo.tar.gz",
            "demo-client-linux-amd64.tar.gz",
            "demo-server-linux-amd64.tar.gz",
            "demo-node-linux-amd64.tar.gz",
        ] {
            std::fs::write(dir.path().join(name), name.as_bytes()).unwrap();
        }

        let metadata = FileMetadata::from_dir(dir.path(), "https://dl.example.com", "v1.0.0")
            .unwrap()
            .unwrap();
        assert_eq!(metadata.source.len(), 1);
        assert_eq!(metadata.client.len(), 1);
        assert_eq!(metadata.server.len(), 1);
        assert_eq!(metadata.node.len(), 1);

        let source = &metadata.source[0];
        assert_eq!(source.name, "demo.tar.gz");
        assert_eq!(source.url, "https://dl.example.com/v1.0.0/demo.tar.gz");
        // SHA-512 in hex
        assert_eq!(source.checksum.len(), 128);

        // Empty directory produces no metadata at all.
        let empty = tempfile::tempdir().unwrap();
        assert!(FileMetadata::from_dir(empty.path(), "https://dl.example.com", "v1.0.0")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_render_markdown_with_downloads_table() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("demo.tar.gz"), b"source").unwrap();
        std::fs::write(dir.path().join("demo-client-linux.tar.gz"), b"client").unwrap();

        let notes = ReleaseNotes::new();
        let doc = Document::new(&notes, "v1.0.0", "v1.1.0")
            .with_downloads(Some(dir.path()), "https://dl.example.com")
            .unwrap();
        let markdown = doc.render_markdown(DEFAULT_TEMPLATE).unwrap();

        assert!(markdown.contains("## Downloads for v1.1.0"));
        assert!(markdown.contains("filename | sha512 hash"));
        assert!(markdown.contains("### Client Binaries"));
        assert!(markdown
            .contains("[demo.tar.gz](https://dl.example.com/v1.1.0/demo.tar.gz)"));

        let downloads = markdown.find("## Downloads for").unwrap();
        let changelog = markdown.find("## Changelog since").unwrap();
        assert!(downloads < changelog);
    }

    #[test]
    fn test_render_json_structure() {
        let feature = ReleaseNote {
            kinds: vec!["feature".to_string()],
            ..note(7, "Added something")
        };
        let notes = collection(vec![feature], &[7]);
        let doc = Document::new(&notes, "v0.3.0", "v0.3.1");

        let json: serde_json::Value =
            serde_json::from_str(&doc.render_json().unwrap()).unwrap();
        assert_eq!(json["release_tag"], "v0.3.1");
        assert_eq!(json["previous_tag"], "v0.3.0");
        assert_eq!(json["kinds"]["feature"][0], "Added something");
        assert!(json["action_required"].as_array().unwrap().is_empty());
        assert!(json.get("downloads").is_none());
    }
}
