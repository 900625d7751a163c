//! QuorumKV launcher.
//!
//! Starts five co-located peers on one host, each serving its KV service
//! and consensus roles on its own port, runs the initial leader elections,
//! and keeps the failure injector cycling acceptors until shutdown.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::signal;
use tracing::{error, info};

use quorumkv_api::Cluster;
use quorumkv_core::{ActivityLog, ClusterTiming};

#[derive(Debug, Parser)]
#[command(name = "quorumkv", about = "Replicated in-memory key-value store")]
struct Args {
    /// Host every peer binds and advertises.
    host: String,

    /// Exactly five peer ports.
    #[arg(num_args = 5, required = true)]
    ports: Vec<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quorumkv=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let log = Arc::new(ActivityLog::new("serverLog.txt"));
    let timing = ClusterTiming::default();

    let mut cluster = Cluster::start(&args.host, &args.ports, timing, Arc::clone(&log)).await?;
    cluster.elect_leaders().await?;
    let injector = cluster.spawn_failure_injector();

    info!("cluster ready; KV services:");
    for index in 0..args.ports.len() {
        info!("  - {}", cluster.base_url(index));
    }

    match signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => error!(error = %e, "unable to listen for shutdown signal"),
    }

    injector.abort();
    cluster.shutdown().await;
    log.activity("launcher stopped");
    Ok(())
}
