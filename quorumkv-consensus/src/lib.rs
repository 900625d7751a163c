//! # QuorumKV Consensus
//!
//! The replication and agreement machinery: the three Paxos roles
//! (proposer, acceptor, learner), randomized leader election with
//! heartbeat-driven failure detection, and the failure injector that
//! exercises acceptor crash-and-restart cycles.
//!
//! Every client write runs one independent single-decree round: the leader
//! proposer numbers the value, the leader acceptor coordinates prepare and
//! accept quorums over every acceptor, and on success broadcasts the value
//! to every learner, which applies it to its peer's map. Reads never touch
//! this crate.
//!
//! Leadership is maintained by two periodic loops per role instance: the
//! leader emits heartbeats every few seconds, everyone else monitors for
//! silence and triggers a debounced re-election when a window passes
//! without one. Both loops are cancellable and are swapped atomically on
//! `set_leader` transitions.

pub mod acceptor;
pub mod election;
pub mod failure;
pub mod learner;
pub mod proposer;
pub mod types;

pub use acceptor::Acceptor;
pub use election::LeaderElection;
pub use failure::{acceptor_slot, AcceptorSlot, FailureInjector};
pub use learner::Learner;
pub use proposer::Proposer;
pub use types::ProposalSequence;
