//! Fault injection: periodic acceptor kill-and-restart cycles.
//!
//! A single background loop owned by the launcher. Each cycle picks a
//! random acceptor, unexports it after a random delay (its address then
//! answers 503, which quorum fan-outs count as REJECT votes), and after a
//! second random delay binds a brand-new acceptor instance at the same
//! address. Only acceptors are targeted; proposers and learners are never
//! killed.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use quorumkv_core::{ActivityLog, ClusterContext, ClusterTiming};
use quorumkv_network::RpcClient;

use crate::acceptor::Acceptor;
use crate::election::LeaderElection;

/// The rebindable slot an acceptor is served out of.
///
/// The HTTP surface resolves the slot on every request: an empty slot
/// answers 503, and a replaced slot serves the new instance immediately.
/// In-flight calls that already cloned the old instance finish against it;
/// a stale reference is at worst one swallowed failure on the caller.
pub type AcceptorSlot = Arc<RwLock<Option<Arc<Acceptor>>>>;

/// Build a slot around a live acceptor.
pub fn acceptor_slot(acceptor: Arc<Acceptor>) -> AcceptorSlot {
    Arc::new(RwLock::new(Some(acceptor)))
}

/// The kill-and-restart loop.
pub struct FailureInjector {
    slots: Vec<AcceptorSlot>,
    ctx: Arc<ClusterContext>,
    rpc: RpcClient,
    timing: ClusterTiming,
    election: Arc<LeaderElection>,
    log: Arc<ActivityLog>,
}

impl FailureInjector {
    pub fn new(
        slots: Vec<AcceptorSlot>,
        ctx: Arc<ClusterContext>,
        rpc: RpcClient,
        timing: ClusterTiming,
        election: Arc<LeaderElection>,
        log: Arc<ActivityLog>,
    ) -> Self {
        Self {
            slots,
            ctx,
            rpc,
            timing,
            election,
            log,
        }
    }

    /// Run the injection loop until aborted.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    async fn run(self) {
        loop {
            let index = self.pick_target().await;

            self.sleep_random().await;
            let removed = self.slots[index].write().await.take();
            let Some(acceptor) = removed else {
                // Slot emptied under us; start the cycle over.
                continue;
            };
            acceptor.shutdown_tasks();
            warn!(index, "unexported acceptor");
            self.log
                .activity(&format!("failure injector unexported acceptor {index}"));

            self.sleep_random().await;
            let fresh = Acceptor::new(
                index,
                Arc::clone(&self.ctx),
                self.rpc.clone(),
                self.timing,
                Arc::clone(&self.election),
            );
            *self.slots[index].write().await = Some(fresh);
            info!(index, "acceptor re-created at the same address");
            self.log
                .activity(&format!("failure injector restarted acceptor {index}"));
        }
    }

    /// Pick a random slot that currently holds an acceptor; an empty slot
    /// means a retry, immediately.
    async fn pick_target(&self) -> usize {
        loop {
            let index = rand::thread_rng().gen_range(0..self.slots.len());
            if self.slots[index].read().await.is_some() {
                return index;
            }
            tokio::task::yield_now().await;
        }
    }

    async fn sleep_random(&self) {
        let min = self.timing.failure_delay_min.as_millis() as u64;
        let max = self.timing.failure_delay_max.as_millis() as u64;
        let delay = rand::thread_rng().gen_range(min..=max.max(min));
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
}
