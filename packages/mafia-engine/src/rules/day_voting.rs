use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::models::{Player, PlayerId, VoteChoice};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayOutcome {
    pub eliminated: Option<PlayerId>,
    /// Vote counts per target, highest first, ties ordered by player id.
    pub tally: Vec<(PlayerId, usize)>,
    pub tie: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DayResolver;

impl DayResolver {
    pub fn new() -> Self {
        Self
    }

    /// Counts the votes and lynches the single top target. Abstentions and
    /// votes for dead or unknown players count for nobody; a tie at the top
    /// lynches nobody.
    pub fn resolve(
        &self,
        players: &mut [Player],
        votes: &HashMap<PlayerId, VoteChoice>,
    ) -> DayOutcome {
        let mut counts: BTreeMap<PlayerId, usize> = BTreeMap::new();
        for choice in votes.values() {
            let VoteChoice::Player(target) = choice else {
                continue;
            };
            if players.iter().any(|p| p.user_id == *target && p.alive) {
                *counts.entry(*target).or_insert(0) += 1;
            }
        }

        let mut tally: Vec<(PlayerId, usize)> = counts.into_iter().collect();
        tally.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        let (leader, tie) = match tally.as_slice() {
            [] => (None, false),
            [(_, first), (_, second), ..] if first == second => (None, true),
            [(target, _), ..] => (Some(*target), false),
        };

        let mut eliminated = None;
        if let Some(player) = leader.and_then(|id| players.iter_mut().find(|p| p.user_id == id)) {
            player.eliminate();
            eliminated = Some(player.user_id);
        }

        DayOutcome {
            eliminated,
            tally,
            tie,
        }
    }
}
