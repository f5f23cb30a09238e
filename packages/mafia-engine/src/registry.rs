use std::collections::HashMap;

use crate::error::GameError;
use crate::models::{Ability, AbilityId, NightActionKind, RoleDefinition, RoleId, Team};

/// Read-only catalog of role definitions, built once and shared by every
/// session.
#[derive(Debug, Clone)]
pub struct RoleRegistry {
    roles: HashMap<RoleId, RoleDefinition>,
}

impl RoleRegistry {
    pub fn new(definitions: Vec<RoleDefinition>) -> Self {
        Self {
            roles: definitions.into_iter().map(|def| (def.id, def)).collect(),
        }
    }

    pub fn standard() -> Self {
        Self::new(standard_roles())
    }

    pub fn get_role(&self, id: RoleId) -> Result<&RoleDefinition, GameError> {
        self.roles
            .get(&id)
            .ok_or_else(|| GameError::RoleNotFound(id.to_string()))
    }

    /// Looks a role up by its string id, e.g. `"godfather"`.
    pub fn get_role_by_name(&self, name: &str) -> Result<&RoleDefinition, GameError> {
        self.get_role(name.parse()?)
    }

    pub fn team_of(&self, id: RoleId) -> Result<Team, GameError> {
        Ok(self.get_role(id)?.team)
    }

    pub fn is_evil(&self, id: RoleId) -> Result<bool, GameError> {
        Ok(self.get_role(id)?.is_evil())
    }

    pub fn abilities_of(&self, id: RoleId) -> Result<&[Ability], GameError> {
        Ok(&self.get_role(id)?.abilities)
    }

    pub fn night_action_of(&self, id: RoleId) -> Option<NightActionKind> {
        self.roles.get(&id).and_then(RoleDefinition::night_action)
    }

    pub fn is_disguised(&self, id: RoleId) -> bool {
        self.roles.get(&id).is_some_and(RoleDefinition::disguised)
    }

    pub fn roles(&self) -> impl Iterator<Item = &RoleDefinition> {
        self.roles.values()
    }
}

impl Default for RoleRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

const fn ability(id: AbilityId, name: &'static str, description: &'static str) -> Ability {
    Ability {
        id,
        name,
        description,
        cooldown: 0,
        uses: None,
        passive: false,
        restriction: None,
    }
}

fn standard_roles() -> Vec<RoleDefinition> {
    vec![
        RoleDefinition {
            id: RoleId::Mafia,
            name: "Mafia",
            team: Team::Mafia,
            icon: "🔪",
            description: "Eliminate villagers during the night",
            abilities: vec![ability(
                AbilityId::Eliminate,
                "Eliminate",
                "Choose one player to eliminate each night",
            )],
            win_condition: "Mafia members equal or outnumber villagers",
        },
        RoleDefinition {
            id: RoleId::Detective,
            name: "Detective",
            team: Team::Villagers,
            icon: "🔍",
            description: "Investigate players to find the Mafia",
            abilities: vec![ability(
                AbilityId::Investigate,
                "Investigate",
                "Learn if a player is Mafia or Innocent",
            )],
            win_condition: "Eliminate all Mafia members",
        },
        RoleDefinition {
            id: RoleId::Doctor,
            name: "Doctor",
            team: Team::Villagers,
            icon: "💉",
            description: "Protect players from elimination",
            abilities: vec![Ability {
                cooldown: 1,
                restriction: Some("Cannot protect same player twice in a row"),
                ..ability(
                    AbilityId::Protect,
                    "Protect",
                    "Save one player from elimination each night",
                )
            }],
            win_condition: "Eliminate all Mafia members",
        },
        RoleDefinition {
            id: RoleId::Villager,
            name: "Villager",
            team: Team::Villagers,
            icon: "👥",
            description: "Vote and discuss to find the Mafia",
            abilities: vec![ability(
                AbilityId::Vote,
                "Vote",
                "Vote to eliminate suspects during the day",
            )],
            win_condition: "Eliminate all Mafia members",
        },
        RoleDefinition {
            id: RoleId::Boss,
            name: "Boss",
            team: Team::Mafia,
            icon: "👑",
            description: "Powerful Mafia leader with special abilities",
            abilities: vec![
                ability(
                    AbilityId::Eliminate,
                    "Eliminate",
                    "Eliminate one player each night",
                ),
                Ability {
                    uses: Some(1),
                    ..ability(
                        AbilityId::Intimidate,
                        "Intimidate",
                        "Cancel one player's vote (1 use per game)",
                    )
                },
                Ability {
                    uses: Some(1),
                    passive: true,
                    ..ability(AbilityId::Armor, "Armor", "Survive first elimination attempt")
                },
            ],
            win_condition: "Eliminate all villagers",
        },
        RoleDefinition {
            id: RoleId::Vigilante,
            name: "Vigilante",
            team: Team::Villagers,
            icon: "🔫",
            description: "Take justice into your own hands",
            abilities: vec![Ability {
                cooldown: 2,
                uses: Some(2),
                ..ability(
                    AbilityId::Shoot,
                    "Shoot",
                    "Eliminate one player at night (limited uses)",
                )
            }],
            win_condition: "Eliminate all Mafia members",
        },
        RoleDefinition {
            id: RoleId::Godfather,
            name: "Godfather",
            team: Team::Mafia,
            icon: "🎩",
            description: "Mafia leader who appears innocent",
            abilities: vec![
                ability(AbilityId::Eliminate, "Eliminate", "Choose elimination target"),
                Ability {
                    passive: true,
                    ..ability(
                        AbilityId::Disguise,
                        "Disguise",
                        "Appear innocent to Detective investigations",
                    )
                },
            ],
            win_condition: "Mafia members equal or outnumber villagers",
        },
        RoleDefinition {
            id: RoleId::Jester,
            name: "Jester",
            team: Team::Neutral,
            icon: "🤡",
            description: "Get yourself eliminated to win",
            abilities: vec![Ability {
                uses: Some(1),
                ..ability(
                    AbilityId::Haunt,
                    "Haunt",
                    "If eliminated by vote, choose one player to eliminate",
                )
            }],
            win_condition: "Get eliminated by vote",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_role_id_is_registered() {
        let registry = RoleRegistry::standard();
        for id in RoleId::ALL {
            assert_eq!(registry.get_role(id).unwrap().id, id);
        }
    }

    #[test]
    fn test_evil_roles() {
        let registry = RoleRegistry::standard();
        assert!(registry.is_evil(RoleId::Mafia).unwrap());
        assert!(registry.is_evil(RoleId::Godfather).unwrap());
        assert!(registry.is_evil(RoleId::Jester).unwrap());
        assert!(!registry.is_evil(RoleId::Detective).unwrap());
        assert!(!registry.is_evil(RoleId::Villager).unwrap());
    }

    #[test]
    fn test_night_actions_come_from_abilities() {
        let registry = RoleRegistry::standard();
        assert_eq!(registry.night_action_of(RoleId::Mafia), Some(NightActionKind::Kill));
        assert_eq!(registry.night_action_of(RoleId::Godfather), Some(NightActionKind::Kill));
        assert_eq!(
            registry.night_action_of(RoleId::Detective),
            Some(NightActionKind::Investigate)
        );
        assert_eq!(registry.night_action_of(RoleId::Doctor), Some(NightActionKind::Protect));
        assert_eq!(registry.night_action_of(RoleId::Villager), None);
        assert_eq!(registry.night_action_of(RoleId::Vigilante), None);
    }

    #[test]
    fn test_abilities_of() {
        let registry = RoleRegistry::standard();
        let mafia: Vec<_> = registry
            .abilities_of(RoleId::Mafia)
            .unwrap()
            .iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(mafia, vec![AbilityId::Eliminate]);
        let doctor = registry.abilities_of(RoleId::Doctor).unwrap();
        assert_eq!(doctor[0].id, AbilityId::Protect);
        assert_eq!(doctor[0].cooldown, 1);
        assert!(RoleRegistry::new(vec![])
            .abilities_of(RoleId::Doctor)
            .is_err());
    }

    #[test]
    fn test_roles_lists_each_definition_once() {
        let registry = RoleRegistry::standard();
        let mut ids: Vec<_> = registry.roles().map(|r| r.id).collect();
        ids.sort();
        let mut expected = RoleId::ALL.to_vec();
        expected.sort();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_only_godfather_is_disguised() {
        let registry = RoleRegistry::standard();
        let disguised: Vec<_> = RoleId::ALL
            .into_iter()
            .filter(|id| registry.is_disguised(*id))
            .collect();
        assert_eq!(disguised, vec![RoleId::Godfather]);
    }

    #[test]
    fn test_missing_role_fails_with_not_found() {
        let registry = RoleRegistry::new(vec![]);
        assert_eq!(
            registry.team_of(RoleId::Mafia),
            Err(GameError::RoleNotFound("mafia".to_string()))
        );
        assert!(registry.get_role_by_name("nobody").is_err());
    }
}
