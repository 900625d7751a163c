//! Cluster membership and shared runtime context.
//!
//! The replica set is fixed at startup: every peer knows the same ordered
//! list of base addresses, and the three role address lists (proposers,
//! acceptors, learners) are derived from it. Remote handles are never
//! cached across calls; each invocation builds the target URL from this
//! view and resolves it fresh, so restarted role objects bound at the same
//! address are picked up naturally.

use tokio::sync::RwLock;

/// Path under which every peer publishes its four role objects.
pub const SERVICE_PATH: &str = "KeyValueStore";

const PROPOSER_SUFFIX: &str = "proposer";
const ACCEPTOR_SUFFIX: &str = "acceptor";
const LEARNER_SUFFIX: &str = "learner";

/// The fixed, ordered set of peer base addresses known to every node.
///
/// A base address points at a peer's KV service; the co-located proposer,
/// acceptor, and learner live under it at stable sub-paths.
#[derive(Debug, Clone)]
pub struct ClusterView {
    base_urls: Vec<String>,
}

impl ClusterView {
    /// Build the view for a set of co-located peers on one host.
    pub fn new(host: &str, ports: &[u16]) -> Self {
        let base_urls = ports
            .iter()
            .map(|port| format!("http://{host}:{port}/{SERVICE_PATH}"))
            .collect();
        Self { base_urls }
    }

    pub fn len(&self) -> usize {
        self.base_urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.base_urls.is_empty()
    }

    pub fn base_urls(&self) -> &[String] {
        &self.base_urls
    }

    pub fn base_url(&self, index: usize) -> &str {
        &self.base_urls[index]
    }

    /// Addresses of every proposer in peer order.
    pub fn proposer_urls(&self) -> Vec<String> {
        self.role_urls(PROPOSER_SUFFIX)
    }

    /// Addresses of every acceptor in peer order.
    pub fn acceptor_urls(&self) -> Vec<String> {
        self.role_urls(ACCEPTOR_SUFFIX)
    }

    /// Addresses of every learner in peer order.
    pub fn learner_urls(&self) -> Vec<String> {
        self.role_urls(LEARNER_SUFFIX)
    }

    fn role_urls(&self, suffix: &str) -> Vec<String> {
        self.base_urls
            .iter()
            .map(|base| format!("{base}/{suffix}"))
            .collect()
    }

    /// Whether `count` responses constitute a strict majority of the peers.
    pub fn is_majority(&self, count: usize) -> bool {
        count > self.len() / 2
    }
}

/// Process-wide state threaded through every role at construction.
///
/// Replaces the reference design's statics: the immutable cluster view plus
/// the handle to the proposer chosen by the most recent successful election.
/// Only elections write the leader handle; the KV services read it on every
/// write command.
#[derive(Debug)]
pub struct ClusterContext {
    view: ClusterView,
    leader_proposer: RwLock<Option<String>>,
}

impl ClusterContext {
    pub fn new(view: ClusterView) -> Self {
        Self {
            view,
            leader_proposer: RwLock::new(None),
        }
    }

    pub fn view(&self) -> &ClusterView {
        &self.view
    }

    /// URL of the proposer elected leader by the last successful election,
    /// if any election has completed yet.
    pub async fn leader_proposer(&self) -> Option<String> {
        self.leader_proposer.read().await.clone()
    }

    pub async fn set_leader_proposer(&self, url: Option<String>) {
        *self.leader_proposer.write().await = url;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_derives_role_urls_in_peer_order() {
        let view = ClusterView::new("localhost", &[12345, 12346]);
        assert_eq!(
            view.base_urls(),
            &[
                "http://localhost:12345/KeyValueStore".to_string(),
                "http://localhost:12346/KeyValueStore".to_string(),
            ]
        );
        assert_eq!(
            view.proposer_urls(),
            vec![
                "http://localhost:12345/KeyValueStore/proposer".to_string(),
                "http://localhost:12346/KeyValueStore/proposer".to_string(),
            ]
        );
        assert_eq!(
            view.acceptor_urls()[1],
            "http://localhost:12346/KeyValueStore/acceptor"
        );
        assert_eq!(
            view.learner_urls()[0],
            "http://localhost:12345/KeyValueStore/learner"
        );
    }

    #[test]
    fn majority_is_strict() {
        let view = ClusterView::new("localhost", &[1, 2, 3, 4, 5]);
        assert!(!view.is_majority(2));
        assert!(view.is_majority(3));

        let even = ClusterView::new("localhost", &[1, 2, 3, 4]);
        assert!(!even.is_majority(2));
        assert!(even.is_majority(3));
    }

    #[tokio::test]
    async fn leader_proposer_handle_starts_empty() {
        let ctx = ClusterContext::new(ClusterView::new("localhost", &[9000]));
        assert_eq!(ctx.leader_proposer().await, None);

        ctx.set_leader_proposer(Some("http://localhost:9000/KeyValueStore/proposer".into()))
            .await;
        assert_eq!(
            ctx.leader_proposer().await.as_deref(),
            Some("http://localhost:9000/KeyValueStore/proposer")
        );
    }
}
