use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::action::NightActionKind;
use crate::error::GameError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleId {
    Mafia,
    Godfather,
    Boss,
    Detective,
    Doctor,
    Villager,
    Vigilante,
    Jester,
}

impl RoleId {
    pub const ALL: [RoleId; 8] = [
        RoleId::Mafia,
        RoleId::Godfather,
        RoleId::Boss,
        RoleId::Detective,
        RoleId::Doctor,
        RoleId::Villager,
        RoleId::Vigilante,
        RoleId::Jester,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleId::Mafia => "mafia",
            RoleId::Godfather => "godfather",
            RoleId::Boss => "boss",
            RoleId::Detective => "detective",
            RoleId::Doctor => "doctor",
            RoleId::Villager => "villager",
            RoleId::Vigilante => "vigilante",
            RoleId::Jester => "jester",
        }
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleId {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoleId::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| GameError::RoleNotFound(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Mafia,
    Villagers,
    Neutral,
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Team::Mafia => write!(f, "mafia"),
            Team::Villagers => write!(f, "villagers"),
            Team::Neutral => write!(f, "neutral"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbilityId {
    Eliminate,
    Investigate,
    Protect,
    Vote,
    Intimidate,
    Armor,
    Shoot,
    Disguise,
    Haunt,
}

#[derive(Debug, Clone, Serialize)]
pub struct Ability {
    pub id: AbilityId,
    pub name: &'static str,
    pub description: &'static str,
    /// Rounds that must pass between uses. 0 means usable every round.
    pub cooldown: u32,
    /// `None` is unlimited.
    pub uses: Option<u32>,
    pub passive: bool,
    pub restriction: Option<&'static str>,
}

impl Ability {
    /// The night action this ability grants, if it is one the night buffer
    /// knows how to hold.
    pub fn night_action(&self) -> Option<NightActionKind> {
        match self.id {
            AbilityId::Eliminate => Some(NightActionKind::Kill),
            AbilityId::Investigate => Some(NightActionKind::Investigate),
            AbilityId::Protect => Some(NightActionKind::Protect),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleDefinition {
    pub id: RoleId,
    pub name: &'static str,
    pub team: Team,
    pub icon: &'static str,
    pub description: &'static str,
    pub abilities: Vec<Ability>,
    pub win_condition: &'static str,
}

impl RoleDefinition {
    pub fn night_action(&self) -> Option<NightActionKind> {
        self.abilities.iter().find_map(Ability::night_action)
    }

    /// Disguised roles read as innocent to investigation whatever their team.
    pub fn disguised(&self) -> bool {
        self.abilities
            .iter()
            .any(|ability| ability.id == AbilityId::Disguise)
    }

    pub fn is_evil(&self) -> bool {
        matches!(self.team, Team::Mafia | Team::Neutral)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_id_parses_case_insensitively() {
        assert_eq!("Godfather".parse::<RoleId>().unwrap(), RoleId::Godfather);
        assert_eq!(" doctor ".parse::<RoleId>().unwrap(), RoleId::Doctor);
    }

    #[test]
    fn test_unknown_role_id_is_rejected() {
        let err = "werewolf".parse::<RoleId>().unwrap_err();
        assert_eq!(err, GameError::RoleNotFound("werewolf".to_string()));
    }
}
