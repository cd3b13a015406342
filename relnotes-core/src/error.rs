//! Error types for relnotes-core

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while gathering or rendering release notes
#[derive(Debug, Error)]
pub enum NotesError {
    /// git binary not found in PATH
    #[error("git executable not found in PATH")]
    GitNotAvailable,

    /// Path exists but is not a git repository
    #[error("not a git repository: {0}")]
    NotARepository(PathBuf),

    /// git command exited non-zero
    #[error("git command failed: {0}")]
    GitCommand(String),

    /// git output did not parse
    #[error("failed to parse git output: {0}")]
    GitParse(String),

    /// Revision string could not be resolved to a commit
    #[error("unable to resolve revision {0:?}")]
    UnresolvableRevision(String),

    /// Start or end of the range was not provided
    #[error("the {0} revision is required but was not provided")]
    MissingRevision(&'static str),

    /// Automatic revision discovery failed
    #[error("revision discovery failed: {0}")]
    Discovery(String),

    /// Discovery mode string not recognized
    #[error("{0:?} is not a valid revision discovery mode")]
    UnknownDiscoverMode(String),

    /// Output format not recognized
    #[error("{0:?} is an unsupported format")]
    UnsupportedFormat(String),

    /// Template selector invalid or template file unreadable
    #[error("invalid template: {0}")]
    Template(String),

    /// Record and replay directories configured at the same time
    #[error("please do not use record and replay together")]
    RecordAndReplay,

    /// Map provider init string names a backend without an implementation
    #[error("{0:?} is an unsupported release notes map backend")]
    UnsupportedMapBackend(String),

    /// Map provider directory does not exist
    #[error("release notes map path does not exist: {0}")]
    MapPathNotFound(PathBuf),

    /// Replay fixture file missing
    #[error("replay fixture not found: {0}")]
    FixtureNotFound(PathBuf),

    /// GitHub API transport error
    #[error("GitHub API error: {0}")]
    Http(#[from] reqwest::Error),

    /// GitHub API returned a non-success status
    #[error("GitHub API returned status {status} for {url}")]
    HttpStatus { status: u16, url: String },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Markdown template failed to compile
    #[error("template compile error: {0}")]
    TemplateCompile(#[from] handlebars::TemplateError),

    /// Markdown template failed to render
    #[error("template render error: {0}")]
    TemplateRender(#[from] handlebars::RenderError),

    /// Non UTF-8 output from git
    #[error("invalid UTF-8 in git output: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Aggregation worker failed to join
    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl NotesError {
    /// Create a git command error
    pub fn git_command(msg: impl Into<String>) -> Self {
        Self::GitCommand(msg.into())
    }

    /// Create a git parse error
    pub fn git_parse(msg: impl Into<String>) -> Self {
        Self::GitParse(msg.into())
    }

    /// Create a discovery error
    pub fn discovery(msg: impl Into<String>) -> Self {
        Self::Discovery(msg.into())
    }

    /// Create a template error
    pub fn template(msg: impl Into<String>) -> Self {
        Self::Template(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

/// Result type for release notes operations
pub type Result<T> = std::result::Result<T, NotesError>;
