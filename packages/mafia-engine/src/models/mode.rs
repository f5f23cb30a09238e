use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::role::RoleId;
use crate::error::GameError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameMode {
    #[serde(rename = "5v5")]
    FiveVsFive,
    #[serde(rename = "1v1")]
    OneVsOne,
}

/// Fixed configuration of a mode.
#[derive(Debug, Clone, Serialize)]
pub struct ModeSettings {
    pub min_players: usize,
    pub max_players: usize,
    /// Role counts in dealing order.
    pub roles: &'static [(RoleId, usize)],
    pub night_duration: Duration,
    pub day_duration: Duration,
    pub base_xp_reward: u32,
}

const FIVE_VS_FIVE: ModeSettings = ModeSettings {
    min_players: 10,
    max_players: 10,
    roles: &[
        (RoleId::Mafia, 3),
        (RoleId::Detective, 1),
        (RoleId::Doctor, 1),
        (RoleId::Villager, 5),
    ],
    night_duration: Duration::from_secs(60),
    day_duration: Duration::from_secs(90),
    base_xp_reward: 150,
};

const ONE_VS_ONE: ModeSettings = ModeSettings {
    min_players: 2,
    max_players: 2,
    roles: &[(RoleId::Mafia, 1), (RoleId::Detective, 1)],
    night_duration: Duration::from_secs(30),
    day_duration: Duration::from_secs(45),
    base_xp_reward: 75,
};

impl GameMode {
    pub const ALL: [GameMode; 2] = [GameMode::FiveVsFive, GameMode::OneVsOne];

    pub fn settings(&self) -> &'static ModeSettings {
        match self {
            GameMode::FiveVsFive => &FIVE_VS_FIVE,
            GameMode::OneVsOne => &ONE_VS_ONE,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::FiveVsFive => "5v5",
            GameMode::OneVsOne => "1v1",
        }
    }

    /// Sum of the mode's role table.
    pub fn role_total(&self) -> usize {
        self.settings().roles.iter().map(|(_, count)| count).sum()
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameMode {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GameMode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| GameError::UnknownMode(s.to_string()))
    }
}
