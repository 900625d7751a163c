//! QuorumKV interactive client.
//!
//! Connects to one peer's KV service, auto-submits the fixture
//! pre-population sequence, then sends every stdin line verbatim as a
//! command and prints the response, until `exit`.

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use uuid::Uuid;

use quorumkv_core::cluster::SERVICE_PATH;
use quorumkv_core::{ActivityLog, ClusterTiming};
use quorumkv_network::RpcClient;

const PREPOPULATION: [&str; 5] = [
    "PUT player Kohli",
    "PUT position batting",
    "PUT strength placement",
    "PUT weakness leg spin",
    "PUT favorite aggression",
];

#[derive(Debug, Parser)]
#[command(name = "quorumkv-cli", about = "QuorumKV interactive client")]
struct Args {
    /// Host or IP of the peer to connect to.
    server_address: String,

    /// Port of the peer's KV service.
    server_port: u16,
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
    let log = ActivityLog::new("clientLog.txt");
    let base_url = format!(
        "http://{}:{}/{SERVICE_PATH}",
        args.server_address, args.server_port
    );
    let rpc = RpcClient::new(ClusterTiming::default().rpc_timeout)?;
    let client_id = Uuid::new_v4().to_string();

    info!(base_url, client_id, "connecting");
    log.activity(&format!("client {client_id} connecting to {base_url}"));

    for command in PREPOPULATION {
        submit(&rpc, &base_url, &client_id, command, &log).await;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = line.trim();
        if command.is_empty() {
            continue;
        }
        if command.eq_ignore_ascii_case("exit") {
            break;
        }
        submit(&rpc, &base_url, &client_id, command, &log).await;
    }

    log.activity(&format!("client {client_id} disconnected"));
    Ok(())
}

async fn submit(rpc: &RpcClient, base_url: &str, client_id: &str, command: &str, log: &ActivityLog) {
    match rpc.execute(base_url, client_id, command).await {
        Ok(response) => {
            println!("{response}");
            log.activity(&format!("{command} -> {response}"));
        }
        Err(e) => {
            eprintln!("request failed: {e:#}");
            log.error(&format!("{command} failed: {e}"));
        }
    }
}
