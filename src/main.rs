//! CLI entry point for the GLAD alerts counter.
//!
//! Provides one subcommand per region kind plus `latest` for the full
//! per-year histogram.

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use glad_alerts::{
    analyzers::types::AlertRecord,
    config::AlertsConfig,
    error::AlertsError,
    fetch::{
        BasicClient, HttpClient,
        auth::{ApiKey, UrlParam},
    },
    infra::{arcgis::ArcgisClient, carto::CartoClient, geostore::GeostoreClient},
    orchestrator::AlertCounter,
    output::{print_json, print_pretty},
    parser::period_or_default,
    region::LandUseKind,
};
use std::ffi::OsStr;
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "glad_alerts")]
#[command(about = "Counts GLAD deforestation alerts for a region and period", long_about = None)]
struct Cli {
    /// JSON deployment config; production defaults when omitted
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Period as "begin,end" (YYYY-MM-DD); defaults to yesterday,today
    #[arg(short, long, global = true)]
    period: Option<String>,

    /// Count confirmed alerts only
    #[arg(long, global = true, default_value_t = false)]
    confirmed_only: bool,

    /// Deadline for the whole request, in seconds
    #[arg(long, global = true, default_value_t = 120)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Alerts for a country, or one of its admin-1 regions
    Admin {
        /// ISO 3166-1 alpha-3 country code
        iso: String,
        /// Admin-1 region id
        id1: Option<u32>,
    },
    /// Alerts for a protected area
    Wdpa {
        /// WDPA id
        id: u64,
    },
    /// Alerts for a land-use concession (mining, oilpalm, fiber, logging)
    Use { name: String, id: u64 },
    /// Alerts for a previously stored geometry
    Geostore { hash: String },
    /// Full histogram of every covered year
    Latest,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/glad_alerts.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("glad_alerts.log"));

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

    let config = match &cli.config {
        Some(path) => AlertsConfig::load(path)?,
        None => AlertsConfig::default(),
    };
    info!(strategy = ?config.strategy, fetch_mode = ?config.fetch_mode, "Configuration loaded");

    let counter = build_counter(config)?;
    let deadline = Duration::from_secs(cli.timeout_secs);
    let confirmed_only = cli.confirmed_only;

    let range = period_or_default(cli.period.as_deref())?;

    let (found, not_found) = match cli.command {
        Commands::Latest => {
            let latest = with_deadline(deadline, counter.latest()).await?;
            print_pretty(&latest);
            return print_json(&latest);
        }
        Commands::Admin { iso, id1: None } => (
            with_deadline(deadline, counter.count_national(&iso, range, confirmed_only)).await?,
            "Country not found",
        ),
        Commands::Admin { iso, id1: Some(id1) } => (
            with_deadline(
                deadline,
                counter.count_subnational(&iso, id1, range, confirmed_only),
            )
            .await?,
            "Country/Region not found",
        ),
        Commands::Wdpa { id } => (
            with_deadline(deadline, counter.count_protected_area(id, range, confirmed_only)).await?,
            "Wdpa not found",
        ),
        Commands::Use { name, id } => {
            let kind: LandUseKind = name.parse()?;
            (
                with_deadline(deadline, counter.count_land_use(kind, id, range, confirmed_only))
                    .await?,
                "Use not found",
            )
        }
        Commands::Geostore { hash } => (
            with_deadline(deadline, counter.count_geostore(&hash, range, confirmed_only)).await?,
            "Geostore not found",
        ),
    };

    report(found, not_found)
}

type Counter = AlertCounter<
    GeostoreClient<Box<dyn HttpClient>>,
    ArcgisClient<BasicClient>,
    CartoClient<Box<dyn HttpClient>>,
>;

/// Wires the HTTP collaborators, adding credentials found in the environment.
fn build_counter(config: AlertsConfig) -> Result<Counter> {
    let geostore_http: Box<dyn HttpClient> = match std::env::var("GEOSTORE_TOKEN") {
        Ok(token) => Box::new(ApiKey::bearer(BasicClient::new()?, &token)?),
        Err(_) => Box::new(BasicClient::new()?),
    };
    let carto_http: Box<dyn HttpClient> = match std::env::var("CARTO_API_KEY") {
        Ok(key) => Box::new(UrlParam::api_key(BasicClient::new()?, key)),
        Err(_) => Box::new(BasicClient::new()?),
    };

    let boundaries = GeostoreClient::new(geostore_http, &config.geostore);
    let histograms = ArcgisClient::new(BasicClient::new()?, config.arcgis.clone());
    let tabular = CartoClient::new(carto_http, config.carto.sql_endpoint.clone());

    Ok(AlertCounter::new(config, boundaries, histograms, tabular))
}

/// Runs `fut` under `deadline`, logging user-facing failures.
async fn with_deadline<T>(
    deadline: Duration,
    fut: impl Future<Output = Result<T, AlertsError>>,
) -> Result<T> {
    match tokio::time::timeout(deadline, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            if e.is_user_error() {
                error!(error = %e, "Request rejected");
            } else {
                error!(error = %e, "Provider failure");
            }
            Err(e.into())
        }
        Err(_) => Err(anyhow!("request timed out after {}s", deadline.as_secs())),
    }
}

fn report(record: Option<AlertRecord>, not_found: &str) -> Result<()> {
    match record {
        Some(record) => {
            print_pretty(&record);
            print_json(&record)
        }
        None => Err(anyhow!("{not_found}")),
    }
}
