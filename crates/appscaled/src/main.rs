//! appscaled — the appscale daemon.
//!
//! Single binary that assembles the autoscaler:
//! - Marathon client (app listing, details, scale commands)
//! - Mesos agent statistics client
//! - Scheduler loop (aggregate, decide, apply every interval)
//!
//! # Usage
//!
//! ```text
//! MARATHON_HOST=http://marathon.mesos:8080 SCALING_INTERVAL=5 appscaled
//! ```

use std::time::Duration;

use clap::{Parser, ValueEnum};
use tokio::sync::watch;
use tracing::info;

use appscale_client::{AgentClient, MarathonClient, DEFAULT_AGENT_PORT};
use appscale_core::{LabelResolver, DEFAULT_LABEL_PREFIX};
use appscale_scheduler::{Scheduler, SchedulerConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "appscaled", about = "CPU/memory driven autoscaler for Marathon apps")]
struct Cli {
    /// Marathon endpoint, `http://host:port` or `host:port`.
    #[arg(long, env = "MARATHON_HOST")]
    marathon_host: String,

    /// Seconds between the end of one cycle and the start of the next.
    #[arg(long, env = "SCALING_INTERVAL", default_value = "5")]
    scaling_interval: u64,

    /// Namespace of the per-app autoscaling labels.
    #[arg(long, env = "LABEL_PREFIX", default_value = DEFAULT_LABEL_PREFIX)]
    label_prefix: String,

    /// Port of the Mesos agent statistics endpoint.
    #[arg(long, env = "AGENT_PORT", default_value_t = DEFAULT_AGENT_PORT)]
    agent_port: u16,

    /// Timeout for each HTTP request, in milliseconds.
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "2000")]
    request_timeout_ms: u64,

    /// Log output format.
    #[arg(long, env = "APPSCALE_LOG_FORMAT", value_enum, default_value = "text")]
    log_format: LogFormat,
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,appscaled=debug,appscale=debug"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Exits non-zero when MARATHON_HOST is missing.
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    run(cli).await
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let timeout = Duration::from_millis(cli.request_timeout_ms);
    let interval = Duration::from_secs(cli.scaling_interval);

    // ── Clients ────────────────────────────────────────────────

    let marathon = MarathonClient::new(&cli.marathon_host, timeout)?;
    info!(endpoint = %cli.marathon_host, "marathon client initialized");

    let agents = AgentClient::new(cli.agent_port, timeout);
    info!(port = cli.agent_port, "agent statistics client initialized");

    // ── Scheduler ──────────────────────────────────────────────

    let mut scheduler = Scheduler::new(
        marathon,
        agents,
        SchedulerConfig {
            interval,
            labels: LabelResolver::new(cli.label_prefix),
        },
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handle = tokio::spawn(async move {
        scheduler.run(shutdown_rx).await;
    });

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);

    handle.await?;
    info!("appscale daemon stopped");
    Ok(())
}
