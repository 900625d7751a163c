//! # QuorumKV Network
//!
//! The wire vocabulary and the HTTP client used for every remote role
//! invocation. The four role contracts (KV service, proposer, acceptor,
//! learner) are plain capability sets served as JSON over HTTP; nothing in
//! the consensus machinery depends on the transport beyond this crate.
//!
//! Handles are deliberately not cached: every call formats the target URL
//! from the cluster view and performs a fresh request, so an acceptor that
//! was unexported and re-created at the same address is reached without any
//! invalidation protocol.

pub mod client;
pub mod wire;

pub use client::RpcClient;
pub use wire::Verdict;
