//! The learner role: applies decided values to the co-located map.

use std::sync::Arc;

use tracing::{debug, error};

use quorumkv_core::{parse_command, Command};
use quorumkv_store::KvStore;

/// One peer's learner.
///
/// Holds the mutator side of the peer's map, handed over at construction
/// by the KV service. Decided values arrive as the canonical command
/// strings the proposer put through consensus.
#[derive(Debug)]
pub struct Learner {
    store: Arc<KvStore>,
}

impl Learner {
    pub fn new(store: Arc<KvStore>) -> Self {
        Self { store }
    }

    /// Apply one decided value. Malformed payloads and deletes of absent
    /// keys are logged and ignored; learning never fails the round.
    pub fn learn(&self, value: &str) {
        match parse_command(value) {
            Ok(Command::Put { key, value }) => {
                debug!(key, value, "applying decided put");
                self.store.insert(key, value);
            }
            Ok(Command::Delete { key }) => {
                if self.store.remove(&key).is_none() {
                    error!(key, "decided delete for an absent key");
                }
            }
            Ok(Command::Get { .. }) | Err(_) => {
                error!(value, "undecodable decided value ignored");
            }
        }
    }
}
