//! Release notes generator entry point
//!
//! Parses flags and environment into the engine options, walks the
//! configured revision range, gathers notes from the change request API,
//! and writes the rendered document to a file or stdout.

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use relnotes_core::document::TemplateSpec;
use relnotes_core::{toc, Document, Format, Gatherer, Options, Result};

#[derive(Parser)]
#[command(name = "relnotes")]
#[command(about = "Generate categorized release notes from a range of git history")]
#[command(version)]
struct Args {
    /// GitHub API token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, default_value = "")]
    github_token: String,

    /// Organization owning the repository
    #[arg(long, env = "ORG", default_value = "kubernetes")]
    org: String,

    /// Repository to generate notes for
    #[arg(long, env = "REPO", default_value = "kubernetes")]
    repo: String,

    /// Start of the range as a commit hash
    #[arg(long, env = "START_SHA", default_value = "")]
    start_sha: String,

    /// End of the range as a commit hash
    #[arg(long, env = "END_SHA", default_value = "")]
    end_sha: String,

    /// Start of the range as a tag or other symbolic revision
    #[arg(long, env = "START_REV", default_value = "")]
    start_rev: String,

    /// End of the range as a tag or other symbolic revision
    #[arg(long, env = "END_REV", default_value = "")]
    end_rev: String,

    /// Branch used by patch-to-patch discovery, defaults to the
    /// repository's default branch
    #[arg(long, env = "BRANCH", default_value = "")]
    branch: String,

    /// Revision discovery mode: none, merge-base-to-latest,
    /// patch-to-patch or minor-to-minor
    #[arg(long, env = "DISCOVER", default_value = "none")]
    discover: String,

    /// Local clone location, defaults to a directory under the system
    /// temp dir
    #[arg(long, env = "REPO_PATH")]
    repo_path: Option<PathBuf>,

    /// Release tag shown in the document instead of the end revision
    #[arg(long, env = "RELEASE_VERSION", default_value = "")]
    release_version: String,

    /// Output format: markdown or json
    #[arg(long, env = "FORMAT", default_value = "markdown")]
    format: String,

    /// Markdown template: empty for the built-in one, "inline:..." for a
    /// literal template, anything else is read as a file path
    #[arg(long, env = "TEMPLATE", default_value = "")]
    template: String,

    /// Record API responses into this directory
    #[arg(long, env = "RECORD")]
    record: Option<PathBuf>,

    /// Replay API responses from this directory instead of the network
    #[arg(long, env = "REPLAY")]
    replay: Option<PathBuf>,

    /// Directory of release notes map files, may be given several times
    #[arg(long = "maps-from")]
    maps_from: Vec<String>,

    /// Append a generated table of contents to the markdown output
    #[arg(long)]
    toc: bool,

    /// Directory of release artifacts for the downloads table
    #[arg(long, env = "ARTIFACT_DIR")]
    artifact_dir: Option<PathBuf>,

    /// Public URL prefix the release artifacts are served from
    #[arg(long, env = "ARTIFACT_URL", default_value = "")]
    artifact_url: String,

    /// Upper bound on concurrent API requests
    #[arg(long, default_value_t = relnotes_core::MAX_PARALLEL_REQUESTS)]
    max_parallel: usize,

    /// Write the document here instead of stdout
    #[arg(long, short, env = "OUTPUT")]
    output: Option<PathBuf>,
}

impl Args {
    fn into_options(self) -> Result<(Options, bool, Option<PathBuf>)> {
        let options = Options {
            github_token: self.github_token,
            github_org: self.org,
            github_repo: self.repo,
            start_sha: self.start_sha,
            end_sha: self.end_sha,
            start_rev: self.start_rev,
            end_rev: self.end_rev,
            branch: self.branch,
            discover: self.discover.parse()?,
            repo_path: self.repo_path.unwrap_or_default(),
            release_version: self.release_version,
            format: self.format.parse()?,
            template: TemplateSpec::parse(&self.template),
            record_dir: self.record,
            replay_dir: self.replay,
            map_provider_strings: self.maps_from,
            artifact_dir: self.artifact_dir,
            artifact_url_prefix: self.artifact_url,
            max_parallel: self.max_parallel,
        };
        Ok((options, self.toc, self.output))
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relnotes=info,relnotes_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(err) = run(args).await {
        tracing::error!("{err}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let (mut options, toc, output) = args.into_options()?;
    options.validate_and_finish()?;

    let repo = options.repo()?;
    info!(
        "listing commits from {} to {}",
        options.start_sha, options.end_sha
    );
    let pairs = repo.release_note_pairs(&options.start_sha, &options.end_sha)?;
    info!("found {} commits referencing a change request", pairs.len());

    let providers = options.map_providers()?;
    let gatherer = Gatherer::new(
        options.client()?,
        &options.github_org,
        &options.github_repo,
    )
    .with_max_parallel(options.max_parallel);
    let (notes, summary) = gatherer.gather(&pairs, &providers).await?;
    info!("{summary}");

    let document = Document::new(
        &notes,
        options.previous_revision_label(),
        options.current_revision_label(),
    )
    .with_downloads(options.artifact_dir.as_deref(), &options.artifact_url_prefix)?;

    let mut rendered = match options.format {
        Format::Markdown => {
            let template = options.template.load()?;
            document.render_markdown(&template)?
        }
        Format::Json => document.render_json()?,
    };

    if toc && options.format == Format::Markdown {
        let generated = toc::generate_toc(&rendered);
        rendered.push_str("\n\n");
        rendered.push_str(&toc::wrap_toc(&generated));
    }

    match output {
        Some(path) => {
            std::fs::write(&path, &rendered)?;
            info!("release notes written to {}", path.display());
        }
        None => println!("{rendered}"),
    }

    Ok(())
}
