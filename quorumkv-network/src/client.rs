//! HTTP client for remote role invocations.
//!
//! One `RpcClient` is shared by every role on a node. Each method takes the
//! target role URL explicitly; callers obtain it from the cluster view on
//! every call. A non-success status is an error to the caller, which in
//! quorum fan-outs is counted as a REJECT vote.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::wire::{
    AcceptRequest, ExecuteRequest, ExecuteResponse, LeaderStatus, LearnRequest, LearnResponse,
    PrepareRequest, ProposeRequest, SetLeaderRequest, SetValueRequest, Verdict, VoteResponse,
};

/// Shared HTTP client with a fixed transport timeout.
#[derive(Debug, Clone)]
pub struct RpcClient {
    http: reqwest::Client,
}

impl RpcClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        // Peer traffic stays inside the cluster; ambient proxy settings
        // must not intercept it.
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { http })
    }

    async fn post<Req, Resp>(&self, url: &str, body: &Req) -> Result<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        debug!(url, "remote invocation");
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?
            .error_for_status()
            .with_context(|| format!("request to {url} rejected"))?;
        response
            .json()
            .await
            .with_context(|| format!("invalid response body from {url}"))
    }

    async fn get<Resp>(&self, url: &str) -> Result<Resp>
    where
        Resp: DeserializeOwned,
    {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?
            .error_for_status()
            .with_context(|| format!("request to {url} rejected"))?;
        response
            .json()
            .await
            .with_context(|| format!("invalid response body from {url}"))
    }

    // --- KV service ---

    /// Submit one client command to a peer's KV service.
    pub async fn execute(&self, base_url: &str, client_id: &str, command: &str) -> Result<String> {
        let request = ExecuteRequest {
            client_id: client_id.to_string(),
            command: command.to_string(),
        };
        let response: ExecuteResponse = self.post(&format!("{base_url}/execute"), &request).await?;
        Ok(response.response)
    }

    // --- Proposer ---

    /// Record the next value the proposer should propose.
    pub async fn set_value(&self, proposer_url: &str, value: &str) -> Result<()> {
        let request = SetValueRequest {
            value: value.to_string(),
        };
        self.post::<_, serde_json::Value>(&format!("{proposer_url}/value"), &request)
            .await?;
        Ok(())
    }

    /// Drive one consensus round for the previously recorded value.
    pub async fn propose(&self, proposer_url: &str, client_id: &str) -> Result<()> {
        let request = ProposeRequest {
            client_id: client_id.to_string(),
        };
        self.post::<_, serde_json::Value>(&format!("{proposer_url}/propose"), &request)
            .await?;
        Ok(())
    }

    pub async fn proposer_set_leader(&self, proposer_url: &str, leader: bool) -> Result<()> {
        let request = SetLeaderRequest { leader };
        self.post::<_, serde_json::Value>(&format!("{proposer_url}/leader"), &request)
            .await?;
        Ok(())
    }

    pub async fn proposer_is_leader(&self, proposer_url: &str) -> Result<bool> {
        let status: LeaderStatus = self.get(&format!("{proposer_url}/leader")).await?;
        Ok(status.leader)
    }

    pub async fn proposer_heartbeat(&self, proposer_url: &str) -> Result<()> {
        self.post::<_, serde_json::Value>(&format!("{proposer_url}/heartbeat"), &serde_json::json!({}))
            .await?;
        Ok(())
    }

    // --- Acceptor ---

    /// Single-acceptor phase 1 vote.
    pub async fn prepare(&self, acceptor_url: &str, proposal: u64) -> Result<Verdict> {
        let request = PrepareRequest { proposal };
        let response: VoteResponse = self.post(&format!("{acceptor_url}/prepare"), &request).await?;
        Ok(response.verdict)
    }

    /// Single-acceptor phase 2 vote.
    pub async fn accept(&self, acceptor_url: &str, proposal: u64, value: &str) -> Result<Verdict> {
        let request = AcceptRequest {
            proposal,
            value: value.to_string(),
        };
        let response: VoteResponse = self.post(&format!("{acceptor_url}/accept"), &request).await?;
        Ok(response.verdict)
    }

    /// Ask the leader-acceptor to coordinate the prepare quorum.
    pub async fn handle_prepare_request(&self, acceptor_url: &str, proposal: u64) -> Result<Verdict> {
        let request = PrepareRequest { proposal };
        let response: VoteResponse = self
            .post(&format!("{acceptor_url}/quorum/prepare"), &request)
            .await?;
        Ok(response.verdict)
    }

    /// Ask the leader-acceptor to coordinate the accept quorum.
    pub async fn handle_accept_request(
        &self,
        acceptor_url: &str,
        proposal: u64,
        value: &str,
    ) -> Result<Verdict> {
        let request = AcceptRequest {
            proposal,
            value: value.to_string(),
        };
        let response: VoteResponse = self
            .post(&format!("{acceptor_url}/quorum/accept"), &request)
            .await?;
        Ok(response.verdict)
    }

    /// Ask the leader-acceptor to broadcast a decided value to every learner.
    pub async fn acceptor_learn(&self, acceptor_url: &str, value: &str) -> Result<String> {
        let request = LearnRequest {
            value: value.to_string(),
        };
        let response: LearnResponse = self.post(&format!("{acceptor_url}/learn"), &request).await?;
        Ok(response.message)
    }

    pub async fn acceptor_set_leader(&self, acceptor_url: &str, leader: bool) -> Result<()> {
        let request = SetLeaderRequest { leader };
        self.post::<_, serde_json::Value>(&format!("{acceptor_url}/leader"), &request)
            .await?;
        Ok(())
    }

    pub async fn acceptor_is_leader(&self, acceptor_url: &str) -> Result<bool> {
        let status: LeaderStatus = self.get(&format!("{acceptor_url}/leader")).await?;
        Ok(status.leader)
    }

    pub async fn acceptor_heartbeat(&self, acceptor_url: &str) -> Result<()> {
        self.post::<_, serde_json::Value>(&format!("{acceptor_url}/heartbeat"), &serde_json::json!({}))
            .await?;
        Ok(())
    }

    // --- Learner ---

    /// Deliver a decided value to one learner.
    pub async fn learn(&self, learner_url: &str, value: &str) -> Result<()> {
        let request = LearnRequest {
            value: value.to_string(),
        };
        self.post::<_, serde_json::Value>(&format!("{learner_url}/learn"), &request)
            .await?;
        Ok(())
    }
}
