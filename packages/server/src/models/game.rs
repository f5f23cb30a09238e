use serde::{Deserialize, Serialize};

use mafia_engine::{NightActionKind, PlayerId, SessionId, VoteChoice};

#[derive(Debug, Serialize, Deserialize)]
pub struct StartGameRequest {
    pub user_id: PlayerId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NightActionRequest {
    pub user_id: PlayerId,
    pub kind: NightActionKind,
    pub target_id: PlayerId,
}

/// `target` is a player id or `"abstain"`.
#[derive(Debug, Serialize, Deserialize)]
pub struct VoteRequest {
    pub user_id: PlayerId,
    pub target: VoteChoice,
}

/// Acknowledgement for an accepted submission.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmissionAccepted {
    pub session_id: SessionId,
}
