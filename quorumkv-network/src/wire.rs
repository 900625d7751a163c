//! Request and response bodies exchanged between peers.

use serde::{Deserialize, Serialize};

/// Outcome of a vote or of a coordinated quorum round.
///
/// Serialized as the literal strings the roles exchange: a prepare answers
/// `PROMISE` or `REJECT`, an accept answers `ACCEPT` or `REJECT`, and the
/// coordinator echoes the same vocabulary for whole-quorum outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "PROMISE")]
    Promise,
    #[serde(rename = "ACCEPT")]
    Accept,
    #[serde(rename = "REJECT")]
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub client_id: String,
    pub command: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub response: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetValueRequest {
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposeRequest {
    pub client_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetLeaderRequest {
    pub leader: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderStatus {
    pub leader: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepareRequest {
    pub proposal: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptRequest {
    pub proposal: u64,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteResponse {
    pub verdict: Verdict,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnRequest {
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdicts_serialize_as_wire_literals() {
        assert_eq!(serde_json::to_string(&Verdict::Promise).unwrap(), "\"PROMISE\"");
        assert_eq!(serde_json::to_string(&Verdict::Accept).unwrap(), "\"ACCEPT\"");
        assert_eq!(serde_json::to_string(&Verdict::Reject).unwrap(), "\"REJECT\"");

        let parsed: Verdict = serde_json::from_str("\"REJECT\"").unwrap();
        assert_eq!(parsed, Verdict::Reject);
    }
}
