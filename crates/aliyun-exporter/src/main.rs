use std::{net::SocketAddr, sync::Arc, time::Duration};

use aliyun_cloud::{AcsClient, AcsInventoryClient, AcsMonitoringClient, RpcTransport};
use aliyun_collector::{PRODUCT_PREFIX, ScrapeCoordinator, domains};
use aliyun_common::config::{
    CloudConfig, Credentials, DEFAULT_MONITORING_ENDPOINT, DEFAULT_REQUEST_TIMEOUT,
};
use aliyun_metrics::{ExporterState, MetricsRegistry, ScrapeMetrics, exporter_router};
use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

const ACCESS_KEY_ID_ENV: &str = "ALIYUN_ACCESS_KEY_ID";
const ACCESS_KEY_SECRET_ENV: &str = "ALIYUN_ACCESS_KEY_SECRET";
const REGION_ID_ENV: &str = "ALIYUN_REGION_ID";

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "aliyun_exporter", about = "Prometheus exporter for Aliyun SLB, NAT gateway and EIP metrics")]
struct Cli {
    #[arg(long, default_value = "0.0.0.0:9233")]
    listen_address: SocketAddr,

    #[arg(long, default_value = aliyun_metrics::router::DEFAULT_TELEMETRY_PATH)]
    telemetry_path: String,

    /// Base64-encoded access key id. Falls back to ALIYUN_ACCESS_KEY_ID.
    #[arg(long)]
    access_key_id: Option<String>,

    /// Base64-encoded access key secret. Falls back to ALIYUN_ACCESS_KEY_SECRET.
    #[arg(long)]
    access_key_secret: Option<String>,

    /// Treat the access key pair as plain text instead of base64.
    #[arg(long, default_value_t = false)]
    plain_credentials: bool,

    /// Falls back to ALIYUN_REGION_ID.
    #[arg(long)]
    region_id: Option<String>,

    #[arg(long, default_value = DEFAULT_MONITORING_ENDPOINT)]
    endpoint: String,

    /// Comma separated list of domains to export.
    #[arg(long, default_value = "slb,nat,eip")]
    domains: String,

    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT.as_secs())]
    request_timeout_secs: u64,

    #[arg(long, default_value = "info")]
    log_level: String,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn arg_or_env(value: Option<String>, env: &str) -> anyhow::Result<String> {
    value
        .or_else(|| std::env::var(env).ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .with_context(|| format!("missing --{} (or {env})", env_flag(env)))
}

fn env_flag(env: &str) -> String {
    env.trim_start_matches("ALIYUN_").to_ascii_lowercase().replace('_', "-")
}

fn init_tracing(cli: &Cli) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("aliyun={level},aliyun_exporter={level}", level = cli.log_level)))
        .context("invalid --log-level")?;

    match cli.log_format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(env_filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init(),
    }
    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<CloudConfig> {
    let access_key_id = arg_or_env(cli.access_key_id.clone(), ACCESS_KEY_ID_ENV)?;
    let access_key_secret = arg_or_env(cli.access_key_secret.clone(), ACCESS_KEY_SECRET_ENV)?;
    let region_id = arg_or_env(cli.region_id.clone(), REGION_ID_ENV)?;

    let credentials = if cli.plain_credentials {
        Credentials::new(access_key_id, access_key_secret)?
    } else {
        Credentials::from_base64(&access_key_id, &access_key_secret)?
    };

    Ok(CloudConfig::new(credentials, region_id)?
        .with_monitoring_endpoint(cli.endpoint.as_str())
        .with_request_timeout(Duration::from_secs(cli.request_timeout_secs)))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli)?;

    let config = load_config(&cli)?;
    let selected = cli
        .domains
        .split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(|key| domains::lookup(key).with_context(|| format!("unknown domain {key:?}")))
        .collect::<anyhow::Result<Vec<_>>>()?;
    if selected.is_empty() {
        bail!("--domains must name at least one of slb, nat, eip");
    }

    let client: Arc<dyn RpcTransport> = Arc::new(AcsClient::new(config.clone())?);
    let inventory = Arc::new(AcsInventoryClient::new(Arc::clone(&client), &config));
    let monitoring = Arc::new(AcsMonitoringClient::new(Arc::clone(&client), &config));

    let registry = Arc::new(MetricsRegistry::new());
    let scrape_metrics = Arc::new(ScrapeMetrics::register(&registry)?);
    for domain in selected {
        let coordinator = ScrapeCoordinator::new(
            domain,
            PRODUCT_PREFIX,
            inventory.clone(),
            monitoring.clone(),
        )?
        .with_metrics(Arc::clone(&scrape_metrics));
        info!(
            domain = domain.key,
            namespace = domain.namespace,
            metrics = coordinator.catalog().len(),
            "domain enabled"
        );
        registry.register_collector(Arc::new(coordinator))?;
    }

    let state = Arc::new(ExporterState::new(registry, cli.telemetry_path.as_str())?);
    let app = exporter_router(state);

    let listener = tokio::net::TcpListener::bind(cli.listen_address)
        .await
        .with_context(|| format!("failed to bind {}", cli.listen_address))?;
    info!(
        region = %config.region_id,
        "aliyun exporter listening on {} (telemetry at {})",
        cli.listen_address,
        cli.telemetry_path
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
