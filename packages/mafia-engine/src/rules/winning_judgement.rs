use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{Player, Team};
use crate::registry::RoleRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Mafia,
    Villagers,
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Winner::Mafia => write!(f, "mafia"),
            Winner::Villagers => write!(f, "villagers"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WinConditionEvaluator;

impl WinConditionEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// `None` means the game goes on. Neutral roles count for neither side;
    /// mafia wins on parity.
    pub fn evaluate(&self, registry: &RoleRegistry, players: &[Player]) -> Option<Winner> {
        let (mut mafia, mut villagers) = (0usize, 0usize);
        for role in players.iter().filter(|p| p.alive).filter_map(|p| p.role) {
            match registry.team_of(role) {
                Ok(Team::Mafia) => mafia += 1,
                Ok(Team::Villagers) => villagers += 1,
                _ => {}
            }
        }

        if mafia == 0 {
            Some(Winner::Villagers)
        } else if mafia >= villagers {
            Some(Winner::Mafia)
        } else {
            None
        }
    }
}
