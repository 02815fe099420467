//! skyfetch CLI
//!
//! Fetch posts from a user, a handles file, a curated list or a search and
//! export them as JSON, JSONL or CSV.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{ArgGroup, Parser};
use skyfetch::{
    client::{BlueskyApi, SearchFilters, XrpcClient},
    error::{AppError, Result},
    export::LocalExporter,
    models::{Config, ExportFormat},
    pipeline::{self, Credentials, Target},
    services::FetchContext,
};

/// skyfetch - Bluesky post fetcher
#[derive(Parser, Debug)]
#[command(
    name = "skyfetch",
    version,
    about = "Fetch Bluesky timelines, lists and searches"
)]
#[command(group(
    ArgGroup::new("target")
        .required(true)
        .args(["handle", "file", "list", "search"])
))]
struct Cli {
    /// Fetch one user's timeline
    #[arg(short = 'a', long)]
    handle: Option<String>,

    /// Fetch timelines of the handles listed in a file (one per line)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Fetch posts from a curated list (web URL or at:// URI)
    #[arg(short, long)]
    list: Option<String>,

    /// Search posts by keyword
    #[arg(short, long)]
    search: Option<String>,

    /// Posts per user (timelines) or in total (lists, searches)
    #[arg(short = 'n', long, allow_negative_numbers = true)]
    limit: Option<i64>,

    /// Output file (default: <output_dir>/<target>_<timestamp>.<ext>)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Export format: json, jsonl or csv
    #[arg(short, long)]
    export: Option<ExportFormat>,

    /// Path to config file
    #[arg(short, long, default_value = "skyfetch.toml")]
    config: PathBuf,

    /// Keep retrieval order instead of sorting newest first
    #[arg(long)]
    no_sort: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Search: only posts by this author
    #[arg(long = "from", requires = "search")]
    author: Option<String>,

    /// Search: only posts mentioning this user
    #[arg(long, requires = "search")]
    mention: Option<String>,

    /// Search: language code
    #[arg(long, requires = "search")]
    language: Option<String>,

    /// Search: earliest date (YYYY-MM-DD)
    #[arg(long, requires = "search")]
    since: Option<String>,

    /// Search: latest date (YYYY-MM-DD)
    #[arg(long, requires = "search")]
    until: Option<String>,

    /// Search: keep posts whose links point to this domain
    #[arg(long, requires = "search")]
    domain: Option<String>,

    /// Account identifier (handle or email)
    #[arg(short, long, env = "BSKY_USERNAME")]
    username: Option<String>,

    /// App password
    #[arg(short, long, env = "BSKY_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// File with the identifier on line 1 and the password on line 2
    #[arg(long)]
    credentials: Option<PathBuf>,
}

impl Cli {
    fn credentials(&self) -> Result<Credentials> {
        if let Some(path) = &self.credentials {
            return Credentials::from_file(path);
        }
        match (&self.username, &self.password) {
            (Some(username), Some(password)) if !username.trim().is_empty() => {
                Ok(Credentials::new(username.trim(), password.as_str()))
            }
            _ => Err(AppError::auth(
                "no credentials: pass --username/--password, set BSKY_USERNAME/BSKY_PASSWORD, or use --credentials",
            )),
        }
    }

    fn target(&self) -> Result<Target> {
        if let Some(handle) = &self.handle {
            return Ok(Target::Handle(handle.clone()));
        }
        if let Some(path) = &self.file {
            return Ok(Target::Handles(pipeline::read_handles_file(path)?));
        }
        if let Some(list) = &self.list {
            return Ok(Target::List(list.clone()));
        }
        if let Some(query) = &self.search {
            return Ok(Target::Search {
                query: query.clone(),
                filters: SearchFilters {
                    author: self.author.clone(),
                    mention: self.mention.clone(),
                    lang: self.language.clone(),
                    since: self.since.clone(),
                    until: self.until.clone(),
                    domain: self.domain.clone(),
                },
            });
        }
        Err(AppError::validation("no target given"))
    }
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);
    if let Some(format) = cli.export {
        config.export.format = format;
    }
    if cli.no_sort {
        config.export.sort_by_date = false;
    }
    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }

    // Negative limits fetch nothing.
    let limit = cli
        .limit
        .map(|n| usize::try_from(n).unwrap_or(0))
        .unwrap_or(config.fetch.default_limit);
    let target = cli.target()?;
    let credentials = cli.credentials()?;

    let config = Arc::new(config);
    let client = Arc::new(XrpcClient::new(&config.api)?);
    pipeline::login(&*client, &credentials).await?;

    let api: Arc<dyn BlueskyApi> = client;
    let ctx = FetchContext::new(Arc::clone(&config), api);
    let report = pipeline::run_fetch(&ctx, &target, limit).await?;

    let exporter = LocalExporter::new(&config.export);
    match pipeline::run_export(&exporter, &report, cli.output.as_deref()).await? {
        Some(summary) => log::info!(
            "Saved {} posts as {} to {}",
            summary.records,
            summary.format.extension(),
            summary.path.display()
        ),
        None => log::warn!("No posts found for {}", report.base_name),
    }

    Ok(())
}
