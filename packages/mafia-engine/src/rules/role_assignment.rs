use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::{GameMode, RoleId};

/// Role dealt to fill seats the mode's table does not cover.
pub const FILLER_ROLE: RoleId = RoleId::Villager;

#[derive(Debug, Clone, Copy, Default)]
pub struct RoleAssigner;

impl RoleAssigner {
    pub fn new() -> Self {
        Self
    }

    pub fn assign(&self, player_count: usize, mode: GameMode) -> Vec<RoleId> {
        self.assign_with_rng(player_count, mode, &mut rand::thread_rng())
    }

    /// Expands the mode's role table and returns a uniformly shuffled list of
    /// exactly `player_count` roles.
    pub fn assign_with_rng<R: Rng + ?Sized>(
        &self,
        player_count: usize,
        mode: GameMode,
        rng: &mut R,
    ) -> Vec<RoleId> {
        let mut roles: Vec<RoleId> = mode
            .settings()
            .roles
            .iter()
            .flat_map(|&(role, count)| std::iter::repeat(role).take(count))
            .collect();

        if roles.len() != player_count {
            log::warn!(
                "mode {} deals {} roles but {} players are seated",
                mode,
                roles.len(),
                player_count
            );
        }
        if roles.len() < player_count {
            roles.resize(player_count, FILLER_ROLE);
        }

        roles.shuffle(rng);
        roles.truncate(player_count);
        roles
    }
}
