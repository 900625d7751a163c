//! # QuorumKV Core
//!
//! Shared foundations for the QuorumKV cluster: the cluster view and its
//! derived role addresses, the process-wide cluster context, the client
//! command grammar with its fixed response vocabulary, timing configuration,
//! domain errors, and the append-only activity log.
//!
//! Everything here is transport-agnostic. The consensus roles, the KV
//! service, and the HTTP surface are built on top of these types in the
//! sibling crates.

pub mod activity_log;
pub mod cluster;
pub mod command;
pub mod config;
pub mod error;

pub use activity_log::ActivityLog;
pub use cluster::{ClusterContext, ClusterView};
pub use command::{
    parse_command, Command, RESPONSE_ERROR, RESPONSE_INVALID_COMMAND, RESPONSE_NO_LEADER,
    RESPONSE_NULL,
};
pub use config::ClusterTiming;
pub use error::CommandError;
