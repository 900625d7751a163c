//! # QuorumKV API
//!
//! The HTTP surface of one peer and the cluster bootstrap. Every peer
//! serves its four role objects under `/KeyValueStore` on its own port;
//! the bootstrap wires stores, services, and roles together for all peers
//! of one launcher process and starts their servers.

pub mod bootstrap;
pub mod server;

pub use bootstrap::Cluster;
pub use server::{router, PeerHandles};
