//! CLI entry point for the traffic GeoJSON builder.
//!
//! `build` fetches the road midpoint CSV, looks up live traffic for every
//! point and writes a GeoJSON FeatureCollection. `check` only loads and
//! validates the CSV.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use traffic_geojson::{
    config::{Config, DEFAULT_OUTPUT, DEFAULT_SOURCE},
    fetch::{
        BasicClient, HttpClient,
        auth::{BearerKey, QueryKey},
    },
    output::RunOutcome,
    pipeline::run,
    source::load_points,
    traffic::{DEFAULT_BASE_URL, SpeedUnit, TrafficApi, TrafficConfig},
};

#[derive(Parser)]
#[command(name = "traffic_geojson")]
#[command(about = "Build a traffic-flow GeoJSON from road midpoints", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up traffic for every point and write the GeoJSON file
    Build {
        #[command(flatten)]
        source: SourceArgs,

        /// GeoJSON file to write
        #[arg(short, long, env = "OUTPUT_FILE", default_value = DEFAULT_OUTPUT)]
        output: PathBuf,

        /// Traffic API base URL
        #[arg(long, env = "TRAFFIC_API_BASE_URL", default_value = DEFAULT_BASE_URL)]
        base_url: String,

        /// Flow style segment of the endpoint path
        #[arg(long, default_value = "absolute")]
        style: String,

        /// Zoom level used to pick the road segment
        #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u8).range(0..=22))]
        zoom: u8,

        /// Speed unit
        #[arg(long, value_enum, default_value_t = SpeedUnit::Kmph)]
        unit: SpeedUnit,

        /// Per-request timeout in seconds
        #[arg(long, default_value_t = 10)]
        timeout_secs: u64,

        /// How the API key is sent
        #[arg(long, value_enum, default_value_t = AuthMode::Query)]
        auth: AuthMode,

        /// Leave `roadClosure` out of the feature properties
        #[arg(long, default_value_t = false)]
        no_road_closure: bool,

        /// Leave `last_updated` out of the feature properties
        #[arg(long, default_value_t = false)]
        no_timestamp: bool,
    },
    /// Load and validate the midpoint CSV without calling the traffic API
    Check {
        #[command(flatten)]
        source: SourceArgs,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// URL or path of the midpoint CSV
    #[arg(short, long, env = "SOURCE_URL", default_value = DEFAULT_SOURCE)]
    source: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum AuthMode {
    /// `?key=<TOMTOM_KEY>`
    Query,
    /// `Authorization: Bearer <TOMTOM_KEY>`
    Bearer,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/traffic_geojson.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("traffic_geojson.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            source,
            output,
            base_url,
            style,
            zoom,
            unit,
            timeout_secs,
            auth,
            no_road_closure,
            no_timestamp,
        } => {
            let api_key = std::env::var("TOMTOM_KEY").context("TOMTOM_KEY must be set")?;

            let config = Config {
                source: source.source,
                output,
                traffic: TrafficConfig {
                    base_url,
                    style,
                    zoom,
                    unit,
                    timeout: Duration::from_secs(timeout_secs),
                    include_road_closure: !no_road_closure,
                },
                stamp_timestamp: !no_timestamp,
            };

            let source_client = BasicClient::new()?;
            let outcome = match auth {
                AuthMode::Query => {
                    let client = QueryKey::tomtom(BasicClient::new()?, api_key);
                    build(&config, &source_client, client).await?
                }
                AuthMode::Bearer => {
                    let client = BearerKey::new(BasicClient::new()?, &api_key)?;
                    build(&config, &source_client, client).await?
                }
            };

            match outcome {
                RunOutcome::Written { path, features } => {
                    info!(path = %path.display(), features, "GeoJSON written successfully");
                }
                RunOutcome::Preserved { path } => {
                    warn!(path = %path.display(), "Nothing written, previous output kept");
                }
            }
        }
        Commands::Check { source } => {
            let client = BasicClient::new()?;
            let points = load_points(&client, &source.source).await?;
            info!(source = %source.source, rows = points.len(), "Dataset is valid");
        }
    }

    Ok(())
}

async fn build<C: HttpClient>(
    config: &Config,
    source_client: &BasicClient,
    traffic_client: C,
) -> Result<RunOutcome> {
    let api = TrafficApi::new(traffic_client, config.traffic.clone())?;
    run(config, source_client, &api).await
}
