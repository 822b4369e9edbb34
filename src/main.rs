use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use gcp_sweep::config::{Config, Overrides};
use gcp_sweep::gcp::auth::{self, GcpCredentials};
use gcp_sweep::gcp::client::{Endpoints, GcpClient};
use gcp_sweep::gcp::rest::RestProvider;
use std::path::PathBuf;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Delete unused GCP resources across projects
#[derive(Parser, Debug)]
#[command(name = "gcp-sweep", version, about, long_about = None)]
struct Args {
    /// GCP project to sweep (repeatable; overrides the config file)
    #[arg(short, long = "project")]
    projects: Vec<String>,

    /// Path to a JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Report what would be deleted without deleting anything
    #[arg(long, conflicts_with = "execute")]
    dry_run: bool,

    /// Actually delete resources
    #[arg(long)]
    execute: bool,

    /// Only touch zonal resources in this zone (repeatable)
    #[arg(long = "zone")]
    zones: Vec<String>,

    /// Only touch regional resources in this region (repeatable)
    #[arg(long = "region")]
    regions: Vec<String>,

    /// Email prefix of service accounts to delete
    #[arg(long)]
    service_account_prefix: Option<String>,

    /// Also empty and delete storage buckets
    #[arg(long)]
    allow_bucket_deletion: bool,

    /// Access token to use instead of Application Default Credentials
    #[arg(long, env = "GCP_SWEEP_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Log level (RUST_LOG takes precedence)
    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,

    /// Also append log lines to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

fn setup_logging(
    level: LogLevel,
    log_file: Option<&PathBuf>,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_filter()))
    };

    let stdout_layer = fmt::layer().with_target(false).with_filter(filter());

    let Some(log_path) = log_file else {
        tracing_subscriber::registry().with(stdout_layer).init();
        return Ok(None);
    };

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent).ok();
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false)
        .with_filter(filter());

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .init();

    tracing::debug!("Log file: {:?}", log_path);
    Ok(Some(guard))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level, args.log_file.as_ref())?;

    let dry_run = match (args.dry_run, args.execute) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    };

    let overrides = Overrides {
        projects: args.projects,
        dry_run,
        zones: args.zones,
        regions: args.regions,
        service_account_prefix: args.service_account_prefix,
        allow_bucket_deletion: args.allow_bucket_deletion,
    };

    let config = Config::load(args.config.as_deref())?
        .resolve(overrides, auth::get_default_project())?;

    let credentials = match args.access_token {
        Some(token) => GcpCredentials::from_token(token),
        None => GcpCredentials::new().await?,
    };

    let client = GcpClient::new(credentials, Endpoints::default())?
        .with_poll_interval(config.poll_interval);
    let provider = RestProvider::new(client);

    gcp_sweep::cleanup::run(&provider, &config).await;

    Ok(())
}
