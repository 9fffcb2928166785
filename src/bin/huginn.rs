//! huginn — enrich JSON log payloads with OCI resource tags.
//!
//! Reads one payload (a record or an array of records) from a file or
//! stdin, enriches it and writes the result to stdout.
//!
//! ```text
//! cat logs.json | huginn --config huginn.toml
//! huginn --tags-file tags.json logs.json
//! ```

use std::io::Read;
use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use huginn::{Huginn, HuginnError, Settings, StaticFetcher};

/// Enrich JSON log payloads with OCI resource tags.
#[derive(Parser)]
#[command(name = "huginn")]
#[command(version = huginn::PKG_VERSION)]
#[command(about = "Enrich JSON log payloads with OCI resource tags")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long, env = "HUGINN_CONFIG")]
    config: Option<PathBuf>,

    /// Serve tags from a JSON file (`{"<ocid>": {"freeform": {..}}}`)
    /// instead of querying Resource Search.
    #[arg(long)]
    tags_file: Option<PathBuf>,

    /// Write compact JSON instead of indented output.
    #[arg(long)]
    compact: bool,

    /// Input payload (default: stdin).
    input: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref())?;
    settings.apply_process_env()?;
    settings.validate()?;

    let mut builder = Huginn::builder()
        .config(settings.enrich_config()?)
        .cache_config(settings.cache_config()?)
        .retry(settings.retry.clone());

    if let Some(ref path) = args.tags_file {
        let fetcher = StaticFetcher::from_file(path)?;
        info!(path = %path.display(), entries = fetcher.len(), "serving tags from file");
        builder = builder.fetcher(fetcher);
    } else if let Some(search) = settings.search_config() {
        info!(endpoint = %search.endpoint, "querying resource search");
        builder = builder.search(search);
    } else {
        return Err(HuginnError::Configuration(
            "no tag source: set [search] endpoint, HUGINN_SEARCH_ENDPOINT, or --tags-file"
                .to_string(),
        )
        .into());
    }

    let enricher = builder.build()?;
    info!(version = huginn::version_string(), "huginn starting");

    let input = read_input(args.input.as_ref())?;
    let output = enricher.enrich_str(&input).await?;

    let rendered = if args.compact {
        serde_json::to_string(&output)?
    } else {
        serde_json::to_string_pretty(&output)?
    };
    println!("{rendered}");
    Ok(())
}

/// Log to stderr; `RUST_LOG` wins, then `LOG_LEVEL`, then `info`.
fn init_tracing() {
    let filter = log_filter(
        std::env::var("RUST_LOG").ok().as_deref(),
        std::env::var("LOG_LEVEL").ok().as_deref(),
    );

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// First non-blank, parseable directive of `rust_log` and `log_level`, else `info`.
fn log_filter(rust_log: Option<&str>, log_level: Option<&str>) -> tracing_subscriber::EnvFilter {
    let log_level = log_level.map(str::to_ascii_lowercase);
    [rust_log, log_level.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|directive| !directive.is_empty())
        .find_map(|directive| tracing_subscriber::EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| tracing_subscriber::EnvFilter::new("info"))
}
