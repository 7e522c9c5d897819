//! omdbview - terminal browser for the OMDB movie and series API.

/// Application configuration (TOML).
mod config;
/// Terminal UI components.
mod tui;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use regex::Regex;
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;
use url::Url;

use crate::config::{API_KEY_ENV, AppConfig, OmdbConfig, resolve_config_path};
use crate::tui::run_viewer;
use crate::tui::state::{ListingSettings, validate_term};
use omdbview_api::omdb::{
    Accumulated, DetailRecord, MediaType, OmdbApi, OmdbClient, PlotLength, SearchPage,
    SearchParams, SearchResultItem, accumulate_search,
};

/// CLI argument parser.
#[derive(Parser)]
#[command(name = "omdbview", about, version)]
struct Cli {
    /// Override config directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Fetch one page of search results.
    Search(SearchArgs),
    /// Collect the default listing across search pages.
    Browse(BrowseArgs),
    /// Show full metadata for one title.
    Details(DetailsArgs),
    /// Browse interactively in the terminal.
    Tui(TuiArgs),
    /// Manage the configuration file.
    Config(ConfigCommand),
    /// Print a shell completion script.
    Completions(CompletionsArgs),
}

/// Media type filter accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MediaTypeArg {
    /// Movies.
    Movie,
    /// TV series.
    Series,
    /// Single episodes.
    Episode,
    /// Games.
    Game,
}

impl From<MediaTypeArg> for MediaType {
    fn from(arg: MediaTypeArg) -> Self {
        match arg {
            MediaTypeArg::Movie => Self::Movie,
            MediaTypeArg::Series => Self::Series,
            MediaTypeArg::Episode => Self::Episode,
            MediaTypeArg::Game => Self::Game,
        }
    }
}

/// Plot length accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PlotArg {
    /// Short plot.
    Short,
    /// Full plot.
    Full,
}

impl From<PlotArg> for PlotLength {
    fn from(arg: PlotArg) -> Self {
        match arg {
            PlotArg::Short => Self::Short,
            PlotArg::Full => Self::Full,
        }
    }
}

/// Arguments for the `search` subcommand.
#[derive(clap::Args)]
struct SearchArgs {
    /// Title to search for (e.g. "breaking bad").
    #[arg(long, required = true)]
    query: String,
    /// Filter by media type.
    #[arg(long = "type", value_enum)]
    media_type: Option<MediaTypeArg>,
    /// Filter by release year.
    #[arg(long)]
    year: Option<u32>,
    /// Page number (1-based).
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    page: u32,
}

/// Arguments for the `browse` subcommand.
#[derive(clap::Args)]
struct BrowseArgs {
    /// Listing query (default: `browse.query` from config).
    #[arg(long)]
    query: Option<String>,
    /// Media type filter (default: `browse.media_type` from config).
    #[arg(long = "type", value_enum)]
    media_type: Option<MediaTypeArg>,
    /// Number of items to collect (default: `browse.target_count`).
    #[arg(long)]
    target: Option<usize>,
    /// Page ceiling (default: `browse.max_pages`).
    #[arg(long)]
    max_pages: Option<u32>,
}

/// Arguments for the `details` subcommand.
#[derive(clap::Args)]
struct DetailsArgs {
    /// IMDb identifier (e.g. "tt0903747").
    #[arg(long, required = true)]
    id: String,
    /// Plot length.
    #[arg(long, value_enum, default_value_t = PlotArg::Full)]
    plot: PlotArg,
}

/// Arguments for the `tui` subcommand.
#[derive(clap::Args)]
struct TuiArgs {
    /// Listing query (default: `browse.query` from config).
    #[arg(long)]
    query: Option<String>,
}

/// Arguments for the `config` subcommand.
#[derive(clap::Args)]
struct ConfigCommand {
    /// Config subcommand to run.
    #[command(subcommand)]
    command: ConfigSubcommands,
}

/// Available config subcommands.
#[derive(Subcommand)]
enum ConfigSubcommands {
    /// Write a default config file.
    Init,
    /// Show the effective configuration.
    Show,
}

/// Arguments for the `completions` subcommand.
#[derive(clap::Args)]
struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum)]
    shell: Shell,
}

/// Loads the config file from the resolved location.
fn load_config(dir: Option<&PathBuf>) -> Result<AppConfig> {
    let config_path = resolve_config_path(dir).context("failed to resolve config path")?;
    AppConfig::load(&config_path).context("failed to load config")
}

/// Builds the OMDB client from config and the `OMDB_API_KEY` environment variable.
fn build_omdb_client(config: &OmdbConfig) -> Result<OmdbClient> {
    let api_key = config.resolve_api_key(std::env::var(API_KEY_ENV).ok())?;

    let mut builder = OmdbClient::builder().api_key(api_key).user_agent(concat!(
        env!("CARGO_PKG_NAME"),
        "/",
        env!("CARGO_PKG_VERSION")
    ));
    if let Some(base_url) = &config.base_url {
        let url = Url::parse(base_url)
            .with_context(|| format!("invalid omdb.base_url: {base_url}"))?;
        builder = builder.base_url(url);
    }
    if let Some(interval) = config.min_interval() {
        builder = builder.min_interval(interval);
    }
    if let Some(timeout) = config.timeout() {
        builder = builder.timeout(timeout);
    }
    builder.build().context("failed to build OMDB client")
}

/// Checks that `id` looks like an IMDb title id (`tt` followed by digits).
fn validate_imdb_id(id: &str) -> Result<&str> {
    let pattern = Regex::new(r"^tt\d{7,}$").context("failed to compile IMDb id pattern")?;
    let id = id.trim();
    if !pattern.is_match(id) {
        bail!("invalid IMDb id: {id:?} (expected e.g. tt0903747)");
    }
    Ok(id)
}

/// Runs the `search` subcommand.
///
/// # Errors
///
/// Returns an error if the query is blank, the client fails to build, or
/// the request fails.
#[instrument(skip_all)]
async fn run_search(args: &SearchArgs, dir: Option<&PathBuf>) -> Result<()> {
    let query = validate_term(&args.query)?;
    let config = load_config(dir)?;
    let client = build_omdb_client(&config.omdb)?;

    let mut params = SearchParams::new(query).page(args.page);
    if let Some(media_type) = args.media_type {
        params = params.media_type(media_type.into());
    }
    if let Some(year) = args.year {
        params = params.year(year);
    }

    let page = client
        .search(&params)
        .await
        .context("OMDB search request failed")?;

    report_search_page(&page);
    Ok(())
}

/// Runs the `browse` subcommand.
///
/// # Errors
///
/// Returns an error if the client fails to build or accumulation fails.
#[instrument(skip_all)]
async fn run_browse(args: &BrowseArgs, dir: Option<&PathBuf>) -> Result<()> {
    let config = load_config(dir)?;
    let query = match &args.query {
        Some(q) => validate_term(q)?.to_owned(),
        None => config.browse.query.clone(),
    };
    let client = build_omdb_client(&config.omdb)?;

    let mut params = SearchParams::new(query);
    if let Some(media_type) = args
        .media_type
        .map(MediaType::from)
        .or(config.browse.media_type)
    {
        params = params.media_type(media_type);
    }
    let target = args.target.unwrap_or(config.browse.target_count);
    let max_pages = args.max_pages.unwrap_or(config.browse.max_pages);

    let accumulated = accumulate_search(&client, &params, target, max_pages)
        .await
        .context("failed to collect listing")?;

    report_accumulated(&accumulated);
    Ok(())
}

/// Runs the `details` subcommand.
///
/// # Errors
///
/// Returns an error if the id is malformed, the client fails to build, or
/// the request fails.
#[instrument(skip_all)]
async fn run_details(args: &DetailsArgs, dir: Option<&PathBuf>) -> Result<()> {
    let imdb_id = validate_imdb_id(&args.id)?;
    let config = load_config(dir)?;
    let client = build_omdb_client(&config.omdb)?;

    let detail = client
        .details(imdb_id, args.plot.into())
        .await
        .with_context(|| format!("OMDB detail request failed for {imdb_id}"))?;

    report_detail(&detail);
    Ok(())
}

/// Runs the `tui` subcommand.
///
/// # Errors
///
/// Returns an error if the client fails to build or the terminal fails.
async fn run_tui(args: &TuiArgs, dir: Option<&PathBuf>) -> Result<()> {
    let config = load_config(dir)?;
    let client = build_omdb_client(&config.omdb)?;

    let query = match &args.query {
        Some(q) => validate_term(q)?.to_owned(),
        None => config.browse.query.clone(),
    };
    let settings = ListingSettings {
        query,
        media_type: config.browse.media_type,
        search_media_type: config.browse.search_media_type,
        target: config.browse.target_count,
        max_pages: config.browse.max_pages,
    };

    run_viewer(Arc::new(client), settings).await
}

/// Runs the `config init` subcommand.
///
/// # Errors
///
/// Returns an error if the config file already exists or cannot be written.
fn run_config_init(dir: Option<&PathBuf>) -> Result<()> {
    let config_path = resolve_config_path(dir).context("failed to resolve config path")?;
    if config_path.exists() {
        bail!("config file already exists: {}", config_path.display());
    }
    AppConfig::default()
        .save(&config_path)
        .context("failed to save config")?;
    tracing::info!("Wrote {}", config_path.display());
    Ok(())
}

/// Runs the `config show` subcommand.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or parsed.
fn run_config_show(dir: Option<&PathBuf>) -> Result<()> {
    let config_path = resolve_config_path(dir).context("failed to resolve config path")?;
    let config = AppConfig::load(&config_path).context("failed to load config")?;

    let key_source = if std::env::var(API_KEY_ENV).is_ok_and(|v| !v.trim().is_empty()) {
        API_KEY_ENV
    } else if config.omdb.api_key.is_some() {
        "config"
    } else {
        "(not set)"
    };

    tracing::info!("Config file: {}", config_path.display());
    tracing::info!("API key: {key_source}");
    tracing::info!(
        "Base URL: {}",
        config
            .omdb
            .base_url
            .as_deref()
            .unwrap_or(omdbview_api::omdb::DEFAULT_BASE_URL)
    );
    tracing::info!(
        "Listing: query={:?} type={} target={} max_pages={}",
        config.browse.query,
        config
            .browse
            .media_type
            .map_or("all", MediaType::as_str),
        config.browse.target_count,
        config.browse.max_pages,
    );
    Ok(())
}

/// Writes the completion script for `shell` to stdout.
fn run_completions(args: &CompletionsArgs) {
    let mut command = Cli::command();
    clap_complete::generate(args.shell, &mut command, "omdbview", &mut io::stdout());
}

/// Logs one row per search result.
fn report_items(items: &[SearchResultItem]) {
    if items.is_empty() {
        tracing::info!("No items found.");
        return;
    }
    tracing::info!("imdbID\t\tYear\t\tType\tTitle");
    for item in items {
        tracing::info!(
            "{}\t{}\t\t{}\t{}",
            item.imdb_id,
            item.year,
            item.media_type,
            item.title,
        );
    }
    tracing::info!("Total: {} items", items.len());
}

/// Logs a single search page.
fn report_search_page(page: &SearchPage) {
    report_items(&page.items);
    if let Some(total) = page.total_results
        && !page.items.is_empty()
    {
        tracing::info!("Total results on OMDB: {total}");
    }
}

/// Logs an accumulated listing.
fn report_accumulated(accumulated: &Accumulated) {
    report_items(&accumulated.items);
    if accumulated.exhausted && !accumulated.items.is_empty() {
        tracing::info!(
            "Results ran out after {} pages ({} items)",
            accumulated.pages,
            accumulated.items.len()
        );
    }
}

/// Logs a detail record.
fn report_detail(detail: &DetailRecord) {
    tracing::info!("{} ({}) [{}]", detail.title, detail.year, detail.imdb_id);
    tracing::info!("Type: {}", detail.media_type);
    tracing::info!("Genre: {}", detail.genre);
    tracing::info!("Runtime: {}", detail.runtime);
    tracing::info!("IMDb rating: {}", detail.imdb_rating);
    if let Some(seasons) = &detail.total_seasons {
        tracing::info!("Seasons: {seasons}");
    }
    tracing::info!("Plot: {}", detail.plot);
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    #[cfg(not(feature = "otel"))]
    {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

        let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .and_then(|_| {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .build()
                    .ok()?;

                let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_simple_exporter(exporter)
                    .build();

                let tracer = opentelemetry::trace::TracerProvider::tracer(
                    &tracer_provider,
                    env!("CARGO_PKG_NAME"),
                );
                opentelemetry::global::set_tracer_provider(tracer_provider);

                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .init();
    }

    let cli = Cli::parse();
    let dir = cli.dir.as_ref();
    match cli.command {
        Commands::Search(args) => run_search(&args, dir).await,
        Commands::Browse(args) => run_browse(&args, dir).await,
        Commands::Details(args) => run_details(&args, dir).await,
        Commands::Tui(args) => run_tui(&args, dir).await,
        Commands::Config(cmd) => match cmd.command {
            ConfigSubcommands::Init => run_config_init(dir),
            ConfigSubcommands::Show => run_config_show(dir),
        },
        Commands::Completions(args) => {
            run_completions(&args);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::panic)]

    use tracing::subscriber::with_default;
    use tracing_mock::{expect, subscriber};

    use super::*;

    fn item(imdb_id: &str, title: &str) -> SearchResultItem {
        SearchResultItem {
            imdb_id: String::from(imdb_id),
            title: String::from(title),
            year: String::from("2008"),
            poster: String::from("N/A"),
            media_type: MediaType::Series,
        }
    }

    #[test]
    fn test_report_items_empty() {
        let (subscriber, handle) = subscriber::mock()
            .event(expect::event().with_fields(expect::msg("No items found.")))
            .only()
            .run_with_handle();

        with_default(subscriber, || {
            report_items(&[]);
        });

        handle.assert_finished();
    }

    #[test]
    fn test_report_items_rows_and_total() {
        let (subscriber, handle) = subscriber::mock()
            .event(expect::event().with_fields(expect::msg("imdbID\t\tYear\t\tType\tTitle")))
            .event(
                expect::event()
                    .with_fields(expect::msg("tt0903747\t2008\t\tseries\tBreaking Bad")),
            )
            .event(expect::event().with_fields(expect::msg("tt0411008\t2008\t\tseries\tLost")))
            .event(expect::event().with_fields(expect::msg("Total: 2 items")))
            .only()
            .run_with_handle();

        with_default(subscriber, || {
            report_items(&[
                item("tt0903747", "Breaking Bad"),
                item("tt0411008", "Lost"),
            ]);
        });

        handle.assert_finished();
    }

    #[test]
    fn test_report_accumulated_exhausted() {
        let (subscriber, handle) = subscriber::mock()
            .event(expect::event())
            .event(expect::event())
            .event(expect::event().with_fields(expect::msg("Total: 1 items")))
            .event(
                expect::event().with_fields(expect::msg("Results ran out after 1 pages (1 items)")),
            )
            .only()
            .run_with_handle();

        with_default(subscriber, || {
            report_accumulated(&Accumulated {
                items: vec![item("tt0903747", "Breaking Bad")],
                pages: 1,
                exhausted: true,
            });
        });

        handle.assert_finished();
    }

    #[test]
    fn test_validate_imdb_id() {
        // Arrange & Act & Assert
        assert_eq!(validate_imdb_id("tt0903747").unwrap(), "tt0903747");
        assert_eq!(validate_imdb_id(" tt12345678 ").unwrap(), "tt12345678");
        assert!(validate_imdb_id("0903747").is_err());
        assert!(validate_imdb_id("tt123").is_err());
        assert!(validate_imdb_id("tt0903747x").is_err());
    }

    #[test]
    fn test_media_type_arg_conversion() {
        // Arrange & Act & Assert
        assert_eq!(MediaType::from(MediaTypeArg::Series), MediaType::Series);
        assert_eq!(MediaType::from(MediaTypeArg::Movie), MediaType::Movie);
        assert_eq!(PlotLength::from(PlotArg::Short), PlotLength::Short);
    }

    #[test]
    fn test_cli_parses_browse_overrides() {
        // Arrange & Act
        let cli = Cli::try_parse_from([
            "omdbview",
            "browse",
            "--type",
            "movie",
            "--target",
            "30",
            "--max-pages",
            "5",
        ])
        .unwrap();

        // Assert
        let Commands::Browse(args) = cli.command else {
            panic!("expected browse");
        };
        assert_eq!(args.media_type, Some(MediaTypeArg::Movie));
        assert_eq!(args.target, Some(30));
        assert_eq!(args.max_pages, Some(5));
    }

    #[test]
    fn test_cli_rejects_page_zero() {
        // Arrange & Act
        let result = Cli::try_parse_from(["omdbview", "search", "--query", "x", "--page", "0"]);

        // Assert
        assert!(result.is_err());
    }

    #[test]
    fn test_build_client_rejects_bad_base_url() {
        // Arrange
        let config = OmdbConfig {
            api_key: Some(String::from("k")),
            base_url: Some(String::from("not a url")),
            ..OmdbConfig::default()
        };

        // Act
        let result = build_omdb_client(&config);

        // Assert
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("invalid omdb.base_url")
        );
    }
}
