//! Cluster bootstrap: wire up and serve all peers of one launcher process.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use quorumkv_consensus::{
    acceptor_slot, Acceptor, AcceptorSlot, FailureInjector, LeaderElection, Learner, Proposer,
};
use quorumkv_core::{ActivityLog, ClusterContext, ClusterTiming, ClusterView};
use quorumkv_network::RpcClient;
use quorumkv_store::{KvService, KvStore};

use crate::server::{router, PeerHandles};

/// A fully wired cluster of co-located peers.
///
/// Listeners are bound before the view is built, so a port of `0` (used by
/// the tests) resolves to the actual ephemeral port in every derived URL.
pub struct Cluster {
    ctx: Arc<ClusterContext>,
    election: Arc<LeaderElection>,
    rpc: RpcClient,
    timing: ClusterTiming,
    log: Arc<ActivityLog>,
    peers: Vec<PeerHandles>,
    acceptor_slots: Vec<AcceptorSlot>,
    servers: Vec<JoinHandle<()>>,
}

impl Cluster {
    /// Bind one listener per port, construct every peer's role objects,
    /// and start serving. No leader exists until `elect_leaders` runs.
    pub async fn start(
        host: &str,
        ports: &[u16],
        timing: ClusterTiming,
        log: Arc<ActivityLog>,
    ) -> Result<Self> {
        let mut listeners = Vec::with_capacity(ports.len());
        let mut bound_ports = Vec::with_capacity(ports.len());
        for port in ports {
            let listener = TcpListener::bind((host, *port))
                .await
                .with_context(|| format!("failed to bind {host}:{port}"))?;
            bound_ports.push(listener.local_addr()?.port());
            listeners.push(listener);
        }

        let view = ClusterView::new(host, &bound_ports);
        anyhow::ensure!(!view.is_empty(), "at least one peer port is required");
        let ctx = Arc::new(ClusterContext::new(view));
        let rpc = RpcClient::new(timing.rpc_timeout)?;
        let election = Arc::new(LeaderElection::new(
            Arc::clone(&ctx),
            rpc.clone(),
            timing.election_debounce,
        ));

        let mut peers = Vec::with_capacity(listeners.len());
        let mut acceptor_slots = Vec::with_capacity(listeners.len());
        let mut servers = Vec::with_capacity(listeners.len());

        for (index, listener) in listeners.into_iter().enumerate() {
            let store = Arc::new(KvStore::new());
            let learner = Arc::new(Learner::new(Arc::clone(&store)));
            let proposer = Proposer::new(
                index,
                Arc::clone(&ctx),
                rpc.clone(),
                timing,
                Arc::clone(&election),
            );
            let acceptor = Acceptor::new(
                index,
                Arc::clone(&ctx),
                rpc.clone(),
                timing,
                Arc::clone(&election),
            );
            let slot = acceptor_slot(acceptor);
            let kv = Arc::new(KvService::new(
                Arc::clone(&ctx),
                rpc.clone(),
                store,
                Arc::clone(&log),
            ));

            let handles = PeerHandles {
                kv,
                proposer,
                acceptor: Arc::clone(&slot),
                learner,
            };
            let app = router(handles.clone());
            let server = tokio::spawn(async move {
                if let Err(e) = axum::serve(listener, app).await {
                    warn!(error = %e, "peer server stopped");
                }
            });

            info!(peer = index, url = ctx.view().base_url(index), "peer serving");
            peers.push(handles);
            acceptor_slots.push(slot);
            servers.push(server);
        }

        log.activity(&format!("cluster serving {} peers on {host}", peers.len()));

        Ok(Self {
            ctx,
            election,
            rpc,
            timing,
            log,
            peers,
            acceptor_slots,
            servers,
        })
    }

    pub fn context(&self) -> &Arc<ClusterContext> {
        &self.ctx
    }

    pub fn election(&self) -> &Arc<LeaderElection> {
        &self.election
    }

    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    pub fn peers(&self) -> &[PeerHandles] {
        &self.peers
    }

    pub fn acceptor_slots(&self) -> &[AcceptorSlot] {
        &self.acceptor_slots
    }

    pub fn base_url(&self, index: usize) -> &str {
        self.ctx.view().base_url(index)
    }

    /// Run the two initial elections, establishing exactly one leader
    /// proposer and one leader acceptor.
    pub async fn elect_leaders(&self) -> Result<()> {
        self.election
            .assign_leadership_proposer()
            .await
            .context("initial proposer election did not run")?;
        anyhow::ensure!(
            self.election.assign_leadership_acceptor().await,
            "initial acceptor election did not run"
        );
        self.log.activity("initial leader elections completed");
        Ok(())
    }

    /// Start the acceptor kill-and-restart loop.
    pub fn spawn_failure_injector(&self) -> JoinHandle<()> {
        FailureInjector::new(
            self.acceptor_slots.clone(),
            Arc::clone(&self.ctx),
            self.rpc.clone(),
            self.timing,
            Arc::clone(&self.election),
            Arc::clone(&self.log),
        )
        .spawn()
    }

    /// Stop every background task and server of this cluster.
    pub async fn shutdown(&mut self) {
        for handles in &self.peers {
            handles.proposer.shutdown_tasks();
        }
        for slot in &self.acceptor_slots {
            if let Some(acceptor) = slot.read().await.as_ref() {
                acceptor.shutdown_tasks();
            }
        }
        for server in self.servers.drain(..) {
            server.abort();
        }
        self.log.activity("cluster shut down");
    }
}
