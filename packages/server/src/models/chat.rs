use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mafia_engine::{
    GamePhase, GameSummary, NightActionKind, PlayerId, PlayerReward, RoleId, Team, Verdict,
};

/// Everything said or announced in one session, in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatLog {
    pub session_id: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub message_id: String,
    pub session_id: String,
    /// Set only for private messages.
    pub recipient_id: Option<PlayerId>,
    pub timestamp: DateTime<Utc>,
    pub message_type: ChatMessageType,
    pub event: GameEvent,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatMessageType {
    Public,  // プレイヤーの発言
    Private, // 役職通知・調査結果など
    System,  // 進行アナウンス
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerRef {
    pub user_id: PlayerId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EliminatedPlayer {
    pub user_id: PlayerId,
    pub name: String,
    pub role: Option<RoleId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameEvent {
    PlayerJoined {
        player: PlayerRef,
        players: usize,
        required: usize,
    },
    PlayerLeft {
        player: PlayerRef,
    },
    RoleReveal {
        role: RoleId,
        team: Team,
        description: String,
        win_condition: String,
    },
    PhaseChange {
        phase: GamePhase,
        round: u32,
        duration_secs: u64,
        alive: Vec<PlayerRef>,
    },
    ActionRequest {
        action: NightActionKind,
        targets: Vec<PlayerRef>,
        duration_secs: u64,
    },
    InvestigationResult {
        target: PlayerRef,
        verdict: Verdict,
    },
    NightResult {
        round: u32,
        eliminated: Option<EliminatedPlayer>,
        was_protected: bool,
    },
    DayResult {
        round: u32,
        eliminated: Option<EliminatedPlayer>,
        tally: Vec<(PlayerId, usize)>,
        tie: bool,
    },
    GameOver {
        summary: GameSummary,
        rewards: Vec<PlayerReward>,
    },
    GameAborted {
        reason: String,
    },
    Chat {
        player: PlayerRef,
        content: String,
    },
    Error {
        content: String,
    },
}

impl ChatLog {
    pub fn new(session_id: String) -> Self {
        ChatLog {
            session_id,
            messages: Vec::new(),
        }
    }

    pub fn add_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn get_messages_by_type(&self, message_type: ChatMessageType) -> Vec<&ChatMessage> {
        self.messages
            .iter()
            .filter(|m| m.message_type == message_type)
            .collect()
    }

    /// Messages `player_id` is allowed to see: all public and system
    /// messages plus private ones addressed to them.
    pub fn visible_to(&self, player_id: Option<PlayerId>) -> Vec<&ChatMessage> {
        self.messages
            .iter()
            .filter(|m| m.is_visible_to(player_id))
            .collect()
    }
}

impl ChatMessage {
    pub fn new(
        session_id: String,
        recipient_id: Option<PlayerId>,
        message_type: ChatMessageType,
        event: GameEvent,
    ) -> Self {
        ChatMessage {
            message_id: uuid::Uuid::new_v4().to_string(),
            session_id,
            recipient_id,
            timestamp: Utc::now(),
            message_type,
            event,
        }
    }

    pub fn system(session_id: &str, event: GameEvent) -> Self {
        Self::new(session_id.to_string(), None, ChatMessageType::System, event)
    }

    pub fn private(session_id: &str, recipient_id: PlayerId, event: GameEvent) -> Self {
        Self::new(
            session_id.to_string(),
            Some(recipient_id),
            ChatMessageType::Private,
            event,
        )
    }

    pub fn is_visible_to(&self, player_id: Option<PlayerId>) -> bool {
        match self.message_type {
            ChatMessageType::Private => {
                self.recipient_id.is_some() && self.recipient_id == player_id
            }
            _ => true,
        }
    }
}
