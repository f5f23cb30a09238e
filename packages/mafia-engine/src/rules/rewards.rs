use serde::{Deserialize, Serialize};

use super::winning_judgement::Winner;
use crate::models::{GameMode, Player, PlayerId, RoleId};
use crate::registry::RoleRegistry;

pub const BASE_COINS: u32 = 50;
pub const WIN_BONUS_XP: u32 = 100;
pub const WIN_BONUS_COINS: u32 = 50;
pub const SURVIVAL_BONUS_XP: u32 = 50;
pub const SURVIVAL_BONUS_COINS: u32 = 25;
pub const ROUND_BONUS_XP: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerReward {
    pub user_id: PlayerId,
    pub role: Option<RoleId>,
    pub won: bool,
    pub survived: bool,
    pub xp: u32,
    pub coins: u32,
}

/// Whether a player sides with `winner`. Evil roles (mafia and neutral teams)
/// share the mafia's victory; everyone else shares the villagers'.
pub fn is_winner(registry: &RoleRegistry, player: &Player, winner: Winner) -> bool {
    let evil = player
        .role
        .and_then(|role| registry.is_evil(role).ok())
        .unwrap_or(false);
    match winner {
        Winner::Mafia => evil,
        Winner::Villagers => !evil,
    }
}

pub fn calculate_reward(
    registry: &RoleRegistry,
    mode: GameMode,
    player: &Player,
    winner: Winner,
    rounds: u32,
) -> PlayerReward {
    let won = is_winner(registry, player, winner);
    let mut xp = mode.settings().base_xp_reward + ROUND_BONUS_XP * rounds;
    let mut coins = BASE_COINS;
    if won {
        xp += WIN_BONUS_XP;
        coins += WIN_BONUS_COINS;
    }
    if player.alive {
        xp += SURVIVAL_BONUS_XP;
        coins += SURVIVAL_BONUS_COINS;
    }

    PlayerReward {
        user_id: player.user_id,
        role: player.role,
        won,
        survived: player.alive,
        xp,
        coins,
    }
}
