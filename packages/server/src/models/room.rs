use serde::{Deserialize, Serialize};

use mafia_engine::{
    GameMode, GamePhase, GameSession, GameStatus, PlayerId, RoleId, SessionId, Winner,
};

#[derive(Debug, Deserialize)]
pub struct CreateGameRequest {
    pub mode: GameMode,
    pub creator_id: PlayerId,
    pub creator_name: String,
    pub chat_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct JoinGameRequest {
    pub user_id: PlayerId,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateGameResponse {
    pub session_id: SessionId,
}

/// Lobby listing entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoomSummary {
    pub session_id: SessionId,
    pub mode: GameMode,
    pub status: GameStatus,
    pub creator_id: PlayerId,
    pub chat_id: i64,
    pub players: usize,
    pub max_players: usize,
}

impl From<&GameSession> for RoomSummary {
    fn from(game: &GameSession) -> Self {
        RoomSummary {
            session_id: game.id().to_string(),
            mode: game.mode(),
            status: game.status(),
            creator_id: game.creator_id(),
            chat_id: game.chat_id(),
            players: game.players().len(),
            max_players: game.mode().settings().max_players,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerView {
    pub user_id: PlayerId,
    pub name: String,
    pub alive: bool,
    pub role: Option<RoleId>,
}

/// Public view of a session. Roles stay hidden until the game ends unless
/// `reveal_roles` is set.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub mode: GameMode,
    pub status: GameStatus,
    pub phase: GamePhase,
    pub round: u32,
    pub winner: Option<Winner>,
    pub players: Vec<PlayerView>,
}

impl SessionView {
    pub fn new(game: &GameSession, reveal_roles: bool) -> Self {
        let reveal = reveal_roles || game.is_terminal();
        SessionView {
            session_id: game.id().to_string(),
            mode: game.mode(),
            status: game.status(),
            phase: game.phase(),
            round: game.round(),
            winner: game.winner(),
            players: game
                .players()
                .iter()
                .map(|p| PlayerView {
                    user_id: p.user_id,
                    name: p.name.clone(),
                    alive: p.alive,
                    role: if reveal { p.role } else { None },
                })
                .collect(),
        }
    }
}
