//! The acceptor role: per-peer Paxos voting plus, on the elected
//! leader-acceptor, quorum coordination on behalf of the proposer.
//!
//! Votes are a per-instance critical section: `prepare` and `accept` are
//! atomic with respect to each other on the same acceptor. The quorum
//! fan-outs resolve every peer acceptor by URL on each call and walk the
//! list serially; a transport failure on any peer counts as a REJECT vote
//! and never aborts the round.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use quorumkv_core::{ClusterContext, ClusterTiming};
use quorumkv_network::{RpcClient, Verdict};

use crate::election::LeaderElection;
use crate::types::TaskSlot;

#[derive(Debug, Default)]
struct VoteState {
    highest_proposal: u64,
    accepted_value: Option<String>,
}

/// One peer's acceptor.
///
/// A restarted acceptor is a fresh instance bound at the same address:
/// `highest_proposal` starts over at zero and no background task runs
/// until the next election assigns this instance a role.
#[derive(Debug)]
pub struct Acceptor {
    index: usize,
    ctx: Arc<ClusterContext>,
    rpc: RpcClient,
    timing: ClusterTiming,
    election: Arc<LeaderElection>,
    votes: Mutex<VoteState>,
    is_leader: AtomicBool,
    leader_alive: AtomicBool,
    heartbeat_task: TaskSlot,
    monitor_task: TaskSlot,
}

impl Acceptor {
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
            votes: Mutex::new(VoteState::default()),
            is_leader: AtomicBool::new(false),
            leader_alive: AtomicBool::new(false),
            heartbeat_task: TaskSlot::default(),
            monitor_task: TaskSlot::default(),
        })
    }

    /// Phase 1 vote: promise iff the proposal is strictly newer than
    /// anything this acceptor has seen. `highest_proposal` never decreases.
    pub fn prepare(&self, proposal: u64) -> Verdict {
        let mut votes = self.votes.lock();
        if proposal > votes.highest_proposal {
            votes.highest_proposal = proposal;
            debug!(peer = self.index, proposal, "promised");
            Verdict::Promise
        } else {
            debug!(
                peer = self.index,
                proposal,
                highest = votes.highest_proposal,
                "prepare rejected"
            );
            Verdict::Reject
        }
    }

    /// Phase 2 vote. The comparison is `>=` against the highest proposal
    /// seen, so the promised round itself is acceptable; under concurrent
    /// proposers this can overwrite an already-promised-higher round.
    /// TODO: track the promised number separately from the accepted one.
    pub fn accept(&self, proposal: u64, value: &str) -> Verdict {
        let mut votes = self.votes.lock();
        if proposal >= votes.highest_proposal {
            votes.highest_proposal = proposal;
            votes.accepted_value = Some(value.to_string());
            debug!(peer = self.index, proposal, value, "accepted");
            Verdict::Accept
        } else {
            debug!(
                peer = self.index,
                proposal,
                highest = votes.highest_proposal,
                "accept rejected"
            );
            Verdict::Reject
        }
    }

    /// Highest proposal number this acceptor has promised or accepted.
    pub fn highest_proposal(&self) -> u64 {
        self.votes.lock().highest_proposal
    }

    /// Value bound to the highest-numbered proposal accepted so far.
    pub fn accepted_value(&self) -> Option<String> {
        self.votes.lock().accepted_value.clone()
    }

    /// Coordinate the prepare quorum: resolve every acceptor, collect
    /// promises serially, and answer PROMISE only on a strict majority.
    pub async fn handle_prepare_request(&self, proposal: u64) -> Verdict {
        let urls = self.ctx.view().acceptor_urls();
        let mut promises = 0;
        for url in &urls {
            match self.rpc.prepare(url, proposal).await {
                Ok(Verdict::Promise) => promises += 1,
                Ok(_) => {}
                Err(e) => {
                    debug!(url, proposal, error = %e, "prepare vote unreachable; counted as REJECT");
                }
            }
        }
        if self.ctx.view().is_majority(promises) {
            info!(proposal, promises, peers = urls.len(), "prepare quorum reached");
            Verdict::Promise
        } else {
            warn!(proposal, promises, peers = urls.len(), "prepare quorum failed");
            Verdict::Reject
        }
    }

    /// Coordinate the accept quorum, symmetrically to the prepare phase.
    pub async fn handle_accept_request(&self, proposal: u64, value: &str) -> Verdict {
        let urls = self.ctx.view().acceptor_urls();
        let mut accepts = 0;
        for url in &urls {
            match self.rpc.accept(url, proposal, value).await {
                Ok(Verdict::Accept) => accepts += 1,
                Ok(_) => {}
                Err(e) => {
                    debug!(url, proposal, error = %e, "accept vote unreachable; counted as REJECT");
                }
            }
        }
        if self.ctx.view().is_majority(accepts) {
            info!(proposal, accepts, peers = urls.len(), "accept quorum reached");
            Verdict::Accept
        } else {
            warn!(proposal, accepts, peers = urls.len(), "accept quorum failed");
            Verdict::Reject
        }
    }

    /// Broadcast a decided value to every learner. Unlike the vote
    /// fan-outs, a learner failure here propagates to the caller.
    pub async fn learn(&self, value: &str) -> Result<String> {
        for url in self.ctx.view().learner_urls() {
            self.rpc.learn(&url, value).await?;
        }
        Ok(format!("Learned: {value}"))
    }

    pub fn is_leader(&self) -> bool {
        self.is_leader.load(Ordering::SeqCst)
    }

    /// A heartbeat from the leader-acceptor arrived; the next monitor
    /// window counts as healthy.
    pub fn receive_heartbeat(&self) {
        self.leader_alive.store(true, Ordering::SeqCst);
    }

    /// Flip leadership and swap the matching background task: leaders emit
    /// heartbeats to every peer acceptor, everyone else watches for
    /// silence. Safe to call repeatedly with the same value.
    pub fn set_leader(self: Arc<Self>, leader: bool) {
        self.is_leader.store(leader, Ordering::SeqCst);
        if leader {
            info!(peer = self.index, "acceptor assuming leadership");
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

    /// Stop both background tasks. Called when this instance is unexported
    /// or the cluster shuts down.
    pub fn shutdown_tasks(&self) {
        self.heartbeat_task.cancel();
        self.monitor_task.cancel();
    }

    fn spawn_heartbeat(acceptor: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(acceptor.timing.heartbeat_interval);
            loop {
                ticker.tick().await;
                for url in acceptor.ctx.view().acceptor_urls() {
                    if let Err(e) = acceptor.rpc.acceptor_heartbeat(&url).await {
                        debug!(url, error = %e, "acceptor heartbeat undelivered");
                    }
                }
            }
        })
    }

    fn spawn_monitor(acceptor: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(acceptor.timing.monitor_interval);
            // The immediate first tick would test a window that never was.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if acceptor.leader_alive.swap(false, Ordering::SeqCst) {
                    continue;
                }
                warn!(
                    peer = acceptor.index,
                    "leader acceptor silent beyond the monitor window; requesting re-election"
                );
                let election = Arc::clone(&acceptor.election);
                tokio::spawn(async move {
                    election.assign_leadership_acceptor().await;
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

    fn acceptor() -> Arc<Acceptor> {
        let ctx = Arc::new(ClusterContext::new(ClusterView::new("127.0.0.1", &[1])));
        let rpc = RpcClient::new(Duration::from_millis(200)).unwrap();
        let election = Arc::new(LeaderElection::new(
            Arc::clone(&ctx),
            rpc.clone(),
            Duration::from_millis(1000),
        ));
        Acceptor::new(0, ctx, rpc, ClusterTiming::default(), election)
    }

    #[tokio::test]
    async fn prepare_promises_only_strictly_newer_proposals() {
        let acceptor = acceptor();
        assert_eq!(acceptor.prepare(5), Verdict::Promise);
        assert_eq!(acceptor.prepare(5), Verdict::Reject);
        assert_eq!(acceptor.prepare(4), Verdict::Reject);
        assert_eq!(acceptor.prepare(6), Verdict::Promise);
        assert_eq!(acceptor.highest_proposal(), 6);
    }

    #[tokio::test]
    async fn accept_admits_equal_proposal_numbers() {
        let acceptor = acceptor();
        assert_eq!(acceptor.prepare(7), Verdict::Promise);
        // The promised round itself must be acceptable.
        assert_eq!(acceptor.accept(7, "PUT color red"), Verdict::Accept);
        assert_eq!(acceptor.accepted_value().as_deref(), Some("PUT color red"));
        // Anything below the highest seen is not.
        assert_eq!(acceptor.accept(6, "PUT color green"), Verdict::Reject);
        assert_eq!(acceptor.accepted_value().as_deref(), Some("PUT color red"));
    }

    #[tokio::test]
    async fn highest_proposal_never_decreases() {
        let acceptor = acceptor();
        let mut observed = Vec::new();
        for proposal in [3, 1, 8, 8, 2, 9] {
            acceptor.prepare(proposal);
            observed.push(acceptor.highest_proposal());
        }
        let mut sorted = observed.clone();
        sorted.sort_unstable();
        assert_eq!(observed, sorted);
        assert_eq!(acceptor.highest_proposal(), 9);
    }

    #[tokio::test]
    async fn accept_advances_highest_proposal() {
        let acceptor = acceptor();
        assert_eq!(acceptor.accept(10, "DELETE x"), Verdict::Accept);
        assert_eq!(acceptor.highest_proposal(), 10);
        assert_eq!(acceptor.prepare(10), Verdict::Reject);
    }
}
