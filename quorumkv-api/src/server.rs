//! Per-peer HTTP router for the four role objects.
//!
//! The KV service, proposer, and learner are fixed for the life of the
//! peer; the acceptor is served out of a rebindable slot so the failure
//! injector can unexport and replace it. Requests against an empty slot
//! answer 503, which quorum fan-outs count as REJECT votes.

use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::post,
    Router,
};

use quorumkv_consensus::{AcceptorSlot, Acceptor, Learner, Proposer};
use quorumkv_network::wire::{
    AcceptRequest, ExecuteRequest, ExecuteResponse, LeaderStatus, LearnRequest, LearnResponse,
    PrepareRequest, ProposeRequest, SetLeaderRequest, SetValueRequest, VoteResponse,
};
use quorumkv_store::KvService;

/// The four co-located role objects of one peer.
#[derive(Clone)]
pub struct PeerHandles {
    pub kv: Arc<KvService>,
    pub proposer: Arc<Proposer>,
    pub acceptor: AcceptorSlot,
    pub learner: Arc<Learner>,
}

/// Build the router publishing one peer's role objects.
pub fn router(handles: PeerHandles) -> Router {
    Router::new()
        .route("/KeyValueStore/execute", post(kv_execute))
        .route("/KeyValueStore/proposer/value", post(proposer_set_value))
        .route("/KeyValueStore/proposer/propose", post(proposer_propose))
        .route(
            "/KeyValueStore/proposer/leader",
            post(proposer_set_leader).get(proposer_leader_status),
        )
        .route("/KeyValueStore/proposer/heartbeat", post(proposer_heartbeat))
        .route("/KeyValueStore/acceptor/prepare", post(acceptor_prepare))
        .route("/KeyValueStore/acceptor/accept", post(acceptor_accept))
        .route("/KeyValueStore/acceptor/quorum/prepare", post(acceptor_quorum_prepare))
        .route("/KeyValueStore/acceptor/quorum/accept", post(acceptor_quorum_accept))
        .route("/KeyValueStore/acceptor/learn", post(acceptor_learn))
        .route(
            "/KeyValueStore/acceptor/leader",
            post(acceptor_set_leader).get(acceptor_leader_status),
        )
        .route("/KeyValueStore/acceptor/heartbeat", post(acceptor_heartbeat))
        .route("/KeyValueStore/learner/learn", post(learner_learn))
        .with_state(handles)
}

fn empty() -> Json<serde_json::Value> {
    Json(serde_json::json!({}))
}

/// Resolve the acceptor slot; an unexported acceptor answers 503.
async fn resolve_acceptor(slot: &AcceptorSlot) -> Result<Arc<Acceptor>, StatusCode> {
    slot.read()
        .await
        .clone()
        .ok_or(StatusCode::SERVICE_UNAVAILABLE)
}

// --- KV service ---

async fn kv_execute(
    State(peer): State<PeerHandles>,
    Json(request): Json<ExecuteRequest>,
) -> Json<ExecuteResponse> {
    let response = peer
        .kv
        .execute_command(&request.client_id, &request.command)
        .await;
    Json(ExecuteResponse { response })
}

// --- Proposer ---

async fn proposer_set_value(
    State(peer): State<PeerHandles>,
    Json(request): Json<SetValueRequest>,
) -> Json<serde_json::Value> {
    peer.proposer.set_value(&request.value).await;
    empty()
}

async fn proposer_propose(
    State(peer): State<PeerHandles>,
    Json(request): Json<ProposeRequest>,
) -> Json<serde_json::Value> {
    peer.proposer.propose(&request.client_id).await;
    empty()
}

async fn proposer_set_leader(
    State(peer): State<PeerHandles>,
    Json(request): Json<SetLeaderRequest>,
) -> Json<serde_json::Value> {
    peer.proposer.set_leader(request.leader);
    empty()
}

async fn proposer_leader_status(State(peer): State<PeerHandles>) -> Json<LeaderStatus> {
    Json(LeaderStatus {
        leader: peer.proposer.is_leader(),
    })
}

async fn proposer_heartbeat(State(peer): State<PeerHandles>) -> Json<serde_json::Value> {
    peer.proposer.receive_heartbeat();
    empty()
}

// --- Acceptor ---

async fn acceptor_prepare(
    State(peer): State<PeerHandles>,
    Json(request): Json<PrepareRequest>,
) -> Result<Json<VoteResponse>, StatusCode> {
    let acceptor = resolve_acceptor(&peer.acceptor).await?;
    Ok(Json(VoteResponse {
        verdict: acceptor.prepare(request.proposal),
    }))
}

async fn acceptor_accept(
    State(peer): State<PeerHandles>,
    Json(request): Json<AcceptRequest>,
) -> Result<Json<VoteResponse>, StatusCode> {
    let acceptor = resolve_acceptor(&peer.acceptor).await?;
    Ok(Json(VoteResponse {
        verdict: acceptor.accept(request.proposal, &request.value),
    }))
}

async fn acceptor_quorum_prepare(
    State(peer): State<PeerHandles>,
    Json(request): Json<PrepareRequest>,
) -> Result<Json<VoteResponse>, StatusCode> {
    let acceptor = resolve_acceptor(&peer.acceptor).await?;
    Ok(Json(VoteResponse {
        verdict: acceptor.handle_prepare_request(request.proposal).await,
    }))
}

async fn acceptor_quorum_accept(
    State(peer): State<PeerHandles>,
    Json(request): Json<AcceptRequest>,
) -> Result<Json<VoteResponse>, StatusCode> {
    let acceptor = resolve_acceptor(&peer.acceptor).await?;
    Ok(Json(VoteResponse {
        verdict: acceptor
            .handle_accept_request(request.proposal, &request.value)
            .await,
    }))
}

async fn acceptor_learn(
    State(peer): State<PeerHandles>,
    Json(request): Json<LearnRequest>,
) -> Result<Json<LearnResponse>, StatusCode> {
    let acceptor = resolve_acceptor(&peer.acceptor).await?;
    match acceptor.learn(&request.value).await {
        Ok(message) => Ok(Json(LearnResponse { message })),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

async fn acceptor_set_leader(
    State(peer): State<PeerHandles>,
    Json(request): Json<SetLeaderRequest>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let acceptor = resolve_acceptor(&peer.acceptor).await?;
    acceptor.set_leader(request.leader);
    Ok(empty())
}

async fn acceptor_leader_status(
    State(peer): State<PeerHandles>,
) -> Result<Json<LeaderStatus>, StatusCode> {
    let acceptor = resolve_acceptor(&peer.acceptor).await?;
    Ok(Json(LeaderStatus {
        leader: acceptor.is_leader(),
    }))
}

async fn acceptor_heartbeat(
    State(peer): State<PeerHandles>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let acceptor = resolve_acceptor(&peer.acceptor).await?;
    acceptor.receive_heartbeat();
    Ok(empty())
}

// --- Learner ---

async fn learner_learn(
    State(peer): State<PeerHandles>,
    Json(request): Json<LearnRequest>,
) -> Json<serde_json::Value> {
    peer.learner.learn(&request.value);
    empty()
}
