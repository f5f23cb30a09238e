use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::models::{NightActionKind, PendingNightActions, Player, PlayerId, Team};
use crate::registry::RoleRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Mafia,
    Innocent,
}

/// Private to the investigator; never broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestigationResult {
    pub investigator: PlayerId,
    pub target: PlayerId,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NightOutcome {
    pub eliminated: Option<PlayerId>,
    /// The kill landed on a protected player and was negated.
    pub was_protected: bool,
    pub investigation: Option<InvestigationResult>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NightResolver;

impl NightResolver {
    pub fn new() -> Self {
        Self
    }

    /// Applies one night's actions to the roster. Steps run in a fixed order:
    /// reset flags, protect, kill, investigate. Targets that are not living
    /// players when the night resolves are ignored.
    pub fn resolve(
        &self,
        registry: &RoleRegistry,
        players: &mut [Player],
        actions: &PendingNightActions,
    ) -> NightOutcome {
        let mut outcome = NightOutcome::default();
        let alive_at_dusk: HashSet<PlayerId> = players
            .iter()
            .filter(|p| p.alive)
            .map(|p| p.user_id)
            .collect();
        let valid = |kind: NightActionKind| {
            actions
                .get(kind)
                .copied()
                .filter(|submission| alive_at_dusk.contains(&submission.target))
        };

        for player in players.iter_mut() {
            player.protected = false;
            player.investigated = false;
        }

        let protect = valid(NightActionKind::Protect);
        if let Some(submission) = protect {
            if let Some(target) = find_mut(players, submission.target) {
                target.protected = true;
            }
        }

        if let Some(submission) = valid(NightActionKind::Kill) {
            if let Some(target) = find_mut(players, submission.target) {
                if target.protected {
                    target.protected = false;
                    outcome.was_protected = true;
                    log::debug!("kill on {} negated by protection", target.user_id);
                } else {
                    target.eliminate();
                    outcome.eliminated = Some(target.user_id);
                }
            }
        }

        if let Some(submission) = valid(NightActionKind::Investigate) {
            if let Some(target) = find_mut(players, submission.target) {
                target.investigated = true;
                let verdict = match target.role {
                    Some(role) if registry.is_disguised(role) => Verdict::Innocent,
                    Some(role) if registry.team_of(role).ok() == Some(Team::Mafia) => {
                        Verdict::Mafia
                    }
                    _ => Verdict::Innocent,
                };
                outcome.investigation = Some(InvestigationResult {
                    investigator: submission.actor,
                    target: target.user_id,
                    verdict,
                });
            }
        }

        for player in players.iter_mut() {
            let protects = player
                .role
                .and_then(|role| registry.night_action_of(role))
                == Some(NightActionKind::Protect);
            if protects {
                player.last_protected_target = protect
                    .filter(|submission| submission.actor == player.user_id)
                    .map(|submission| submission.target);
            }
        }

        outcome
    }
}

fn find_mut(players: &mut [Player], id: PlayerId) -> Option<&mut Player> {
    players.iter_mut().find(|p| p.user_id == id)
}
