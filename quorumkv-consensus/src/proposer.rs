//! The proposer role: relays client writes into consensus rounds.
//!
//! Only the elected leader proposer drives rounds. A round is one prepare
//! fan-out, then (on promise) one accept fan-out, then (on accept) one
//! learn broadcast, all coordinated by whichever acceptor currently holds
//! the acceptor leadership. Rounds are never retried; a rejected or failed
//! round simply ends and the client must re-issue the command.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use quorumkv_core::{ClusterContext, ClusterTiming};
use quorumkv_network::{RpcClient, Verdict};

use crate::election::LeaderElection;
use crate::types::{ProposalSequence, TaskSlot};

#[derive(Debug)]
struct RoundState {
    sequence: ProposalSequence,
    current_value: Option<String>,
}

/// One peer's proposer.
#[derive(Debug)]
pub struct Proposer {
    index: usize,
    ctx: Arc<ClusterContext>,
    rpc: RpcClient,
    timing: ClusterTiming,
    election: Arc<LeaderElection>,
    round: Mutex<RoundState>,
    is_leader: AtomicBool,
    leader_alive: AtomicBool,
    heartbeat_task: TaskSlot,
    monitor_task: TaskSlot,
}

impl Proposer {
    pub fn new(
        index: usize,
        ctx: Arc<ClusterContext>,
        rpc: RpcClient,
        timing: ClusterTiming,
        election: Arc<LeaderElection>,
    ) -> Arc<Self> {
        Arc::new(Self {
            index,
            ctx,
            rpc,
            timing,
            election,
            round: Mutex::new(RoundState {
                sequence: ProposalSequence::new(index),
                current_value: None,
            }),
            is_leader: AtomicBool::new(false),
            leader_alive: AtomicBool::new(false),
            heartbeat_task: TaskSlot::default(),
            monitor_task: TaskSlot::default(),
        })
    }

    /// Record the next value to propose.
    pub async fn set_value(&self, value: &str) {
        self.round.lock().await.current_value = Some(value.to_string());
    }

    /// Drive one consensus round for the recorded value.
    ///
    /// The round lock is held for the whole round, so proposals on one
    /// proposer are serialized and their numbers strictly increase.
    pub async fn propose(&self, client_id: &str) {
        if !self.is_leader() {
            warn!(
                peer = self.index,
                client_id, "propose on a non-leader proposer ignored"
            );
            return;
        }

        let mut round = self.round.lock().await;
        let Some(value) = round.current_value.clone() else {
            warn!(peer = self.index, client_id, "propose without a recorded value");
            return;
        };
        let proposal = round.sequence.next();
        info!(client_id, proposal, value, "starting consensus round");

        // The driver is whichever acceptor currently claims leadership;
        // resolve it fresh so a restarted leader is found at the same URL.
        let mut driver = None;
        for url in self.ctx.view().acceptor_urls() {
            match self.rpc.acceptor_is_leader(&url).await {
                Ok(true) => {
                    driver = Some(url);
                    break;
                }
                Ok(false) => {}
                Err(e) => debug!(url, error = %e, "acceptor unreachable during driver scan"),
            }
        }
        let Some(driver) = driver else {
            error!(proposal, "no leader acceptor reachable; aborting round");
            return;
        };

        match self.rpc.handle_prepare_request(&driver, proposal).await {
            Ok(Verdict::Promise) => {}
            Ok(verdict) => {
                info!(proposal, ?verdict, "prepare quorum not reached; round ends");
                return;
            }
            Err(e) => {
                error!(proposal, error = %e, "prepare phase failed; round ends");
                return;
            }
        }

        match self.rpc.handle_accept_request(&driver, proposal, &value).await {
            Ok(Verdict::Accept) => {}
            Ok(verdict) => {
                info!(proposal, ?verdict, "accept quorum not reached; round ends");
                return;
            }
            Err(e) => {
                error!(proposal, error = %e, "accept phase failed; round ends");
                return;
            }
        }

        match self.rpc.acceptor_learn(&driver, &value).await {
            Ok(message) => info!(proposal, message, "round decided"),
            Err(e) => error!(proposal, error = %e, "learn broadcast failed"),
        }
    }

    pub fn is_leader(&self) -> bool {
        self.is_leader.load(Ordering::SeqCst)
    }

    /// A heartbeat from the leader proposer arrived.
    pub fn receive_heartbeat(&self) {
        self.leader_alive.store(true, Ordering::SeqCst);
    }

    /// Flip leadership and swap the matching background task, mirroring
    /// the acceptor-side plumbing.
    pub fn set_leader(self: Arc<Self>, leader: bool) {
        self.is_leader.store(leader, Ordering::SeqCst);
        if leader {
            info!(peer = self.index, "proposer assuming leadership");
            self.monitor_task.cancel();
            let emitter = Self::spawn_heartbeat(Arc::clone(&self));
            self.heartbeat_task.replace(emitter);
        } else {
            self.heartbeat_task.cancel();
            self.leader_alive.store(false, Ordering::SeqCst);
            let monitor = Self::spawn_monitor(Arc::clone(&self));
            self.monitor_task.replace(monitor);
        }
    }

    /// Stop both background tasks on shutdown.
    pub fn shutdown_tasks(&self) {
        self.heartbeat_task.cancel();
        self.monitor_task.cancel();
    }

    fn spawn_heartbeat(proposer: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(proposer.timing.heartbeat_interval);
            loop {
                ticker.tick().await;
                for url in proposer.ctx.view().proposer_urls() {
                    if let Err(e) = proposer.rpc.proposer_heartbeat(&url).await {
                        debug!(url, error = %e, "proposer heartbeat undelivered");
                    }
                }
            }
        })
    }

    fn spawn_monitor(proposer: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(proposer.timing.monitor_interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if proposer.leader_alive.swap(false, Ordering::SeqCst) {
                    continue;
                }
                warn!(
                    peer = proposer.index,
                    "leader proposer silent beyond the monitor window; requesting re-election"
                );
                let election = Arc::clone(&proposer.election);
                tokio::spawn(async move {
                    election.assign_leadership_proposer().await;
                });
                break;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use quorumkv_core::ClusterView;

    use super::*;

    fn proposer() -> Arc<Proposer> {
        let ctx = Arc::new(ClusterContext::new(ClusterView::new("127.0.0.1", &[1])));
        let rpc = RpcClient::new(Duration::from_millis(200)).unwrap();
        let election = Arc::new(LeaderElection::new(
            Arc::clone(&ctx),
            rpc.clone(),
            Duration::from_millis(1000),
        ));
        Proposer::new(2, ctx, rpc, ClusterTiming::default(), election)
    }

    #[tokio::test]
    async fn propose_on_non_leader_is_a_no_op() {
        let proposer = proposer();
        proposer.set_value("PUT color red").await;
        // Would otherwise try to reach acceptors on a dead port.
        proposer.propose("c1").await;
        assert!(!proposer.is_leader());
    }

    #[tokio::test]
    async fn set_value_records_the_latest_value() {
        let proposer = proposer();
        proposer.set_value("PUT a 1").await;
        proposer.set_value("PUT a 2").await;
        assert_eq!(
            proposer.round.lock().await.current_value.as_deref(),
            Some("PUT a 2")
        );
    }
}
