//! # QuorumKV Store
//!
//! The per-peer in-memory key-value map and the KV service that fronts it.
//! The service is the client entry point: reads are answered from the local
//! map, writes are relayed to the current leader proposer and only reach
//! the map once the co-located learner applies the decided value.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, error, info, warn};

use quorumkv_core::error::CommandError;
use quorumkv_core::{
    parse_command, ActivityLog, ClusterContext, Command, RESPONSE_ERROR, RESPONSE_INVALID_COMMAND,
    RESPONSE_NO_LEADER, RESPONSE_NULL,
};
use quorumkv_network::RpcClient;

/// The replicated map of one peer.
///
/// Keys and values are opaque strings. Concurrent readers and writers are
/// safe; ordering across keys is irrelevant. Mutations arrive only through
/// the learner once a value is decided.
#[derive(Debug, Default)]
pub struct KvStore {
    entries: DashMap<String, String>,
}

impl KvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    pub fn insert(&self, key: String, value: String) -> Option<String> {
        self.entries.insert(key, value)
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        self.entries.remove(key).map(|(_, value)| value)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Client-facing service of one peer.
///
/// Holds the local map and routes writes through the leader proposer handle
/// established by the most recent successful election. Responses use the
/// fixed vocabulary in `quorumkv_core::command`.
#[derive(Debug)]
pub struct KvService {
    ctx: Arc<ClusterContext>,
    rpc: RpcClient,
    store: Arc<KvStore>,
    log: Arc<ActivityLog>,
}

impl KvService {
    pub fn new(
        ctx: Arc<ClusterContext>,
        rpc: RpcClient,
        store: Arc<KvStore>,
        log: Arc<ActivityLog>,
    ) -> Self {
        Self {
            ctx,
            rpc,
            store,
            log,
        }
    }

    /// The map shared with the co-located learner.
    pub fn store(&self) -> Arc<KvStore> {
        Arc::clone(&self.store)
    }

    /// Execute one raw client command and produce the response string.
    pub async fn execute_command(&self, client_id: &str, raw: &str) -> String {
        self.log
            .activity(&format!("client {client_id} issued: {raw}"));

        let command = match parse_command(raw) {
            Ok(command) => command,
            Err(CommandError::UnknownOperation(verb)) => {
                warn!(client_id, verb, "unknown operation");
                self.log.error(&format!("unknown operation from {client_id}: {raw}"));
                return RESPONSE_INVALID_COMMAND.to_string();
            }
            Err(CommandError::Malformed(_)) => {
                warn!(client_id, command = raw, "malformed command");
                self.log.error(&format!("malformed command from {client_id}: {raw}"));
                return RESPONSE_NULL.to_string();
            }
        };

        match command {
            Command::Get { key } => {
                let response = self
                    .store
                    .get(&key)
                    .unwrap_or_else(|| RESPONSE_NULL.to_string());
                debug!(client_id, key, response, "served local read");
                response
            }
            write => self.route_write(client_id, write).await,
        }
    }

    /// Relay a write to the current leader proposer: record the value, then
    /// drive one consensus round. The round itself is not retried; a failed
    /// relay answers `"ERROR"` and the client must re-issue.
    async fn route_write(&self, client_id: &str, command: Command) -> String {
        let Some(leader) = self.ctx.leader_proposer().await else {
            warn!(client_id, "write rejected: no leader proposer known");
            self.log
                .error(&format!("write from {client_id} rejected: no leader proposer"));
            return RESPONSE_NO_LEADER.to_string();
        };

        let value = command.to_string();
        let key = command.key().to_string();

        let submitted = async {
            self.rpc.set_value(&leader, &value).await?;
            self.rpc.propose(&leader, client_id).await
        }
        .await;

        match submitted {
            Ok(()) => {
                info!(client_id, key, leader, "write submitted to consensus");
                key
            }
            Err(e) => {
                error!(client_id, key, error = %e, "write relay failed");
                self.log
                    .error(&format!("write from {client_id} failed: {e}"));
                RESPONSE_ERROR.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use quorumkv_core::ClusterView;

    use super::*;

    fn service() -> KvService {
        let view = ClusterView::new("127.0.0.1", &[1]);
        let ctx = Arc::new(ClusterContext::new(view));
        let rpc = RpcClient::new(Duration::from_millis(200)).unwrap();
        let log_path = std::env::temp_dir().join(format!(
            "quorumkv-store-test-{}.txt",
            std::process::id()
        ));
        KvService::new(
            ctx,
            rpc,
            Arc::new(KvStore::new()),
            Arc::new(ActivityLog::new(log_path)),
        )
    }

    #[test]
    fn map_overwrites_and_removes() {
        let store = KvStore::new();
        assert_eq!(store.insert("color".into(), "red".into()), None);
        assert_eq!(
            store.insert("color".into(), "blue".into()),
            Some("red".into())
        );
        assert_eq!(store.get("color"), Some("blue".into()));
        assert_eq!(store.remove("color"), Some("blue".into()));
        assert_eq!(store.remove("color"), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn get_miss_answers_null() {
        let service = service();
        assert_eq!(service.execute_command("c1", "GET missing").await, "NULL");
    }

    #[tokio::test]
    async fn get_hit_serves_local_value() {
        let service = service();
        service.store().insert("player".into(), "Kohli".into());
        assert_eq!(service.execute_command("c1", "GET player").await, "Kohli");
    }

    #[tokio::test]
    async fn write_without_leader_is_rejected() {
        let service = service();
        assert_eq!(
            service.execute_command("c1", "PUT color red").await,
            "ERROR: No leader Here"
        );
        assert_eq!(
            service.execute_command("c1", "DELETE color").await,
            "ERROR: No leader Here"
        );
        // Nothing entered the local map.
        assert!(service.store().is_empty());
    }

    #[tokio::test]
    async fn malformed_and_unknown_commands_short_circuit() {
        let service = service();
        assert_eq!(service.execute_command("c1", "GET").await, "NULL");
        assert_eq!(service.execute_command("c1", "PUT onlykey").await, "NULL");
        assert_eq!(
            service.execute_command("c1", "FOO bar baz").await,
            "Invalid command"
        );
    }

    #[tokio::test]
    async fn unreachable_leader_answers_error() {
        let service = service();
        // Point the handle at a port nothing listens on.
        service
            .ctx
            .set_leader_proposer(Some("http://127.0.0.1:1/KeyValueStore/proposer".into()))
            .await;
        assert_eq!(service.execute_command("c1", "PUT color red").await, "ERROR");
    }
}
