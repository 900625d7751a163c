//! Randomized leader election for proposers and acceptors.
//!
//! Two independent routines, one per role. Each serializes against itself
//! and is debounced: a second call inside the configured window returns
//! without action, which keeps simultaneous silence detections from
//! several monitors from cascading into an election storm. Per-peer
//! transport failures during the `set_leader` sweep are swallowed; a peer
//! that was down simply missed the assignment.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use quorumkv_core::ClusterContext;
use quorumkv_network::RpcClient;

/// Cluster-wide election facility shared by every role on a node.
#[derive(Debug)]
pub struct LeaderElection {
    ctx: Arc<ClusterContext>,
    rpc: RpcClient,
    debounce: Duration,
    proposer_gate: Mutex<Option<Instant>>,
    acceptor_gate: Mutex<Option<Instant>>,
}

impl LeaderElection {
    pub fn new(ctx: Arc<ClusterContext>, rpc: RpcClient, debounce: Duration) -> Self {
        Self {
            ctx,
            rpc,
            debounce,
            proposer_gate: Mutex::new(None),
            acceptor_gate: Mutex::new(None),
        }
    }

    /// Elect a leader proposer at random, sweep `set_leader` over every
    /// proposer, and publish the chosen handle in the cluster context.
    /// Returns the chosen URL, or `None` when debounced.
    pub async fn assign_leadership_proposer(&self) -> Option<String> {
        let mut gate = self.proposer_gate.lock().await;
        if Self::debounced(&gate, self.debounce) {
            debug!("proposer election debounced");
            return None;
        }
        *gate = Some(Instant::now());

        let urls = self.ctx.view().proposer_urls();
        let chosen = Self::pick(&urls)?;
        info!(chosen, "electing leader proposer");

        for url in &urls {
            if let Err(e) = self.rpc.proposer_set_leader(url, *url == chosen).await {
                warn!(url, error = %e, "proposer missed leadership assignment");
            }
        }

        self.ctx.set_leader_proposer(Some(chosen.clone())).await;
        Some(chosen)
    }

    /// Elect a leader acceptor at random and sweep `set_leader` over every
    /// acceptor. Returns whether the election actually ran.
    pub async fn assign_leadership_acceptor(&self) -> bool {
        let mut gate = self.acceptor_gate.lock().await;
        if Self::debounced(&gate, self.debounce) {
            debug!("acceptor election debounced");
            return false;
        }
        *gate = Some(Instant::now());

        let urls = self.ctx.view().acceptor_urls();
        let Some(chosen) = Self::pick(&urls) else {
            return false;
        };
        info!(chosen, "electing leader acceptor");

        for url in &urls {
            if let Err(e) = self.rpc.acceptor_set_leader(url, *url == chosen).await {
                warn!(url, error = %e, "acceptor missed leadership assignment");
            }
        }
        true
    }

    fn debounced(last: &Option<Instant>, debounce: Duration) -> bool {
        last.map_or(false, |at| at.elapsed() < debounce)
    }

    fn pick(urls: &[String]) -> Option<String> {
        if urls.is_empty() {
            return None;
        }
        let index = rand::thread_rng().gen_range(0..urls.len());
        Some(urls[index].clone())
    }
}
