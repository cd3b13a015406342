//! Release notes map overlays
//!
//! Maps are externally authored YAML records that correct or amend a
//! generated note after the fact. Each record is keyed by change request
//! number and carries an arbitrary subset of note fields; application is
//! a field level merge. Only local directories are supported as sources,
//! remote backends are recognized but rejected.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{NotesError, Result};
use crate::note::{Documentation, ReleaseNote};

/// Replacement values an override may carry.
///
/// A `None` field leaves the generated value untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MapFields {
    pub text: Option<String>,
    pub author: Option<String>,
    pub areas: Option<Vec<String>>,
    pub kinds: Option<Vec<String>>,
    pub sigs: Option<Vec<String>>,
    pub feature: Option<bool>,
    pub action_required: Option<bool>,
    pub do_not_publish: Option<bool>,
    pub documentation: Option<Vec<Documentation>>,
}

/// One override record parsed from a map file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReleaseNotesMap {
    /// Change request the override applies to
    pub pr: u64,
    /// When set, the override only applies to notes gathered from this
    /// exact commit.
    #[serde(default)]
    pub commit: String,
    #[serde(default, rename = "releasenote")]
    pub release_note: MapFields,
}

impl ReleaseNotesMap {
    /// Merge this override into a note, field by field.
    ///
    /// Markdown is recomputed when the text or author changed so the
    /// rendered line stays consistent with the overridden fields.
    pub fn apply(&self, note: &mut ReleaseNote) {
        if !self.commit.is_empty() && self.commit != note.commit {
            debug!(
                "skipping map for pr {}: bound to commit {} but note is from {}",
                self.pr, self.commit, note.commit
            );
            return;
        }
        debug!("applying release notes map to pr {}", self.pr);

        let mut rerender = false;
        if let Some(text) = &self.release_note.text {
            note.text = text.clone();
            rerender = true;
        }
        if let Some(author) = &self.release_note.author {
            note.author = author.clone();
            note.author_url = format!("https://github.com/{author}");
            rerender = true;
        }
        if let Some(areas) = &self.release_note.areas {
            note.areas = areas.clone();
        }
        if let Some(kinds) = &self.release_note.kinds {
            note.kinds = kinds.clone();
        }
        if let Some(sigs) = &self.release_note.sigs {
            note.sigs = sigs.clone();
        }
        if let Some(feature) = self.release_note.feature {
            note.feature = feature;
        }
        if let Some(action_required) = self.release_note.action_required {
            note.action_required = action_required;
        }
        if let Some(do_not_publish) = self.release_note.do_not_publish {
            note.do_not_publish = do_not_publish;
        }
        if let Some(documentation) = &self.release_note.documentation {
            note.documentation = Some(documentation.clone());
        }

        if rerender {
            note.render_markdown();
        }
    }
}

/// Source of override records, loaded once per run and queried per
/// change request.
pub trait MapProvider: Send + Sync {
    /// Return every override declared for the given change request.
    fn get_maps_for_pr(&self, pr_number: u64) -> Result<Vec<ReleaseNotesMap>>;
}

/// Build a provider from an initialization string.
///
/// Remote backends (`gs://`, `github://`) are rejected with an
/// unsupported-backend error. Anything else must name an existing local
/// directory.
pub fn map_provider_from_init_string(init: &str) -> Result<Box<dyn MapProvider>> {
    if init.starts_with("gs://") || init.starts_with("github://") {
        return Err(NotesError::UnsupportedMapBackend(init.to_string()));
    }

    let path = PathBuf::from(init);
    let meta =
        std::fs::metadata(&path).map_err(|_| NotesError::MapPathNotFound(path.clone()))?;
    if !meta.is_dir() {
        return Err(NotesError::other(format!(
            "release notes map source must be a directory: {}",
            path.display()
        )));
    }

    Ok(Box::new(DirectoryMapProvider::new(&path)))
}

/// Parse a map file that may hold several YAML documents.
pub fn parse_release_notes_map(path: &Path) -> Result<Vec<ReleaseNotesMap>> {
    let content = std::fs::read_to_string(path)?;
    let mut maps = Vec::new();
    for document in serde_yaml::Deserializer::from_str(&content) {
        maps.push(ReleaseNotesMap::deserialize(document)?);
    }
    Ok(maps)
}

/// Provider reading every `.yaml`/`.yml` file under a directory,
/// recursively.
pub struct DirectoryMapProvider {
    maps: HashMap<u64, Vec<ReleaseNotesMap>>,
}

impl DirectoryMapProvider {
    /// Load all map files under `path`. Files that fail to parse are
    /// logged and skipped, they never fail the run.
    pub fn new(path: &Path) -> Self {
        let mut files = Vec::new();
        collect_map_files(path, &mut files);

        let mut maps: HashMap<u64, Vec<ReleaseNotesMap>> = HashMap::new();
        let mut loaded = 0usize;
        for file in &files {
            match parse_release_notes_map(file) {
                Ok(parsed) => {
                    loaded += parsed.len();
                    for map in parsed {
                        maps.entry(map.pr).or_default().push(map);
                    }
                }
                Err(err) => {
                    warn!("skipping release notes map {}: {err}", file.display());
                }
            }
        }
        info!(
            "loaded {loaded} release notes maps from {}",
            path.display()
        );

        Self { maps }
    }
}

impl MapProvider for DirectoryMapProvider {
    fn get_maps_for_pr(&self, pr_number: u64) -> Result<Vec<ReleaseNotesMap>> {
        Ok(self.maps.get(&pr_number).cloned().unwrap_or_default())
    }
}

fn collect_map_files(dir: &Path, files: &mut Vec<PathBuf>) {
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                collect_map_files(&path, files);
            } else if matches!(
                path.extension().and_then(|ext| ext.to_str()),
                Some("yaml") | Some("yml")
            ) {
                files.push(path);
            }
        }
    }
}
