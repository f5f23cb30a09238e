use serde::{Deserialize, Serialize};
use std::fmt;

use super::player::PlayerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NightActionKind {
    Kill,
    Protect,
    Investigate,
}

impl fmt::Display for NightActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NightActionKind::Kill => write!(f, "kill"),
            NightActionKind::Protect => write!(f, "protect"),
            NightActionKind::Investigate => write!(f, "investigate"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NightSubmission {
    pub actor: PlayerId,
    pub target: PlayerId,
}

/// One slot per action kind. A later submission of the same kind replaces the
/// earlier one, whoever sent it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingNightActions {
    pub kill: Option<NightSubmission>,
    pub protect: Option<NightSubmission>,
    pub investigate: Option<NightSubmission>,
}

impl PendingNightActions {
    pub fn record(&mut self, kind: NightActionKind, submission: NightSubmission) {
        *self.slot_mut(kind) = Some(submission);
    }

    pub fn get(&self, kind: NightActionKind) -> Option<&NightSubmission> {
        match kind {
            NightActionKind::Kill => self.kill.as_ref(),
            NightActionKind::Protect => self.protect.as_ref(),
            NightActionKind::Investigate => self.investigate.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.kill.is_none() && self.protect.is_none() && self.investigate.is_none()
    }

    fn slot_mut(&mut self, kind: NightActionKind) -> &mut Option<NightSubmission> {
        match kind {
            NightActionKind::Kill => &mut self.kill,
            NightActionKind::Protect => &mut self.protect,
            NightActionKind::Investigate => &mut self.investigate,
        }
    }
}

/// A day vote. On the wire this is either a player id or the string
/// `"abstain"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "VoteTarget", into = "VoteTarget")]
pub enum VoteChoice {
    Player(PlayerId),
    Abstain,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum VoteTarget {
    Id(PlayerId),
    Text(String),
}

impl TryFrom<VoteTarget> for VoteChoice {
    type Error = String;

    fn try_from(value: VoteTarget) -> Result<Self, Self::Error> {
        match value {
            VoteTarget::Id(id) => Ok(VoteChoice::Player(id)),
            VoteTarget::Text(text) => {
                let text = text.trim();
                if text.eq_ignore_ascii_case("abstain") || text.eq_ignore_ascii_case("skip") {
                    Ok(VoteChoice::Abstain)
                } else {
                    text.parse::<PlayerId>()
                        .map(VoteChoice::Player)
                        .map_err(|_| format!("invalid vote target: {}", text))
                }
            }
        }
    }
}

impl From<VoteChoice> for VoteTarget {
    fn from(choice: VoteChoice) -> Self {
        match choice {
            VoteChoice::Player(id) => VoteTarget::Id(id),
            VoteChoice::Abstain => VoteTarget::Text("abstain".to_string()),
        }
    }
}
