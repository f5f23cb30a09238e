use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mafia_engine::{PlayerId, PlayerReward, RoleId};

pub const STARTING_LEVEL: u32 = 1;
pub const STARTING_COINS: u32 = 100;
pub const LEVEL_UP_COINS_PER_LEVEL: u32 = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub user_id: PlayerId,
    pub username: String,
    pub level: u32,
    /// XP carried towards the next level.
    pub xp: u32,
    pub coins: u32,
    pub wins: u32,
    pub losses: u32,
    pub games_played: u32,
    pub roles_played: BTreeMap<RoleId, u32>,
    pub favorite_role: Option<RoleId>,
    pub created_at: DateTime<Utc>,
}

impl PlayerProfile {
    fn new(user_id: PlayerId, username: String) -> Self {
        PlayerProfile {
            user_id,
            username,
            level: STARTING_LEVEL,
            xp: 0,
            coins: STARTING_COINS,
            wins: 0,
            losses: 0,
            games_played: 0,
            roles_played: BTreeMap::new(),
            favorite_role: None,
            created_at: Utc::now(),
        }
    }

    pub fn win_rate(&self) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        f64::from(self.wins) / f64::from(self.games_played) * 100.0
    }
}

/// XP needed to reach `level` from the one below it.
pub fn xp_for_level(level: u32) -> u32 {
    (100.0 * f64::from(level).powf(1.5)).floor() as u32
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProgressionError {
    #[error("Player {0} is not registered")]
    PlayerNotFound(PlayerId),
    #[error("Progression storage is unavailable")]
    StoragePoisoned,
}

/// Long-lived per-player record: level, XP, coins and match history.
pub trait ProgressionStore: Send + Sync {
    /// Creates the profile or refreshes the username of an existing one.
    fn register_player(
        &self,
        user_id: PlayerId,
        username: &str,
    ) -> Result<PlayerProfile, ProgressionError>;
    fn get_player(&self, user_id: PlayerId) -> Result<Option<PlayerProfile>, ProgressionError>;
    fn record_win(&self, user_id: PlayerId) -> Result<(), ProgressionError>;
    fn record_loss(&self, user_id: PlayerId) -> Result<(), ProgressionError>;
    /// Adds XP and applies any level-ups it triggers.
    fn add_xp(&self, user_id: PlayerId, amount: u32) -> Result<PlayerProfile, ProgressionError>;
    fn add_coins(&self, user_id: PlayerId, amount: u32) -> Result<(), ProgressionError>;
    fn record_role_played(&self, user_id: PlayerId, role: RoleId) -> Result<(), ProgressionError>;
    /// Top players by level, then by carried XP.
    fn leaderboard(&self, limit: usize) -> Result<Vec<PlayerProfile>, ProgressionError>;

    /// Books one finished game for one player.
    fn apply_reward(&self, reward: &PlayerReward) -> Result<PlayerProfile, ProgressionError> {
        if reward.won {
            self.record_win(reward.user_id)?;
        } else {
            self.record_loss(reward.user_id)?;
        }
        self.add_coins(reward.user_id, reward.coins)?;
        self.add_xp(reward.user_id, reward.xp)
    }
}

#[derive(Default)]
pub struct InMemoryProgression {
    players: RwLock<HashMap<PlayerId, PlayerProfile>>,
}

impl InMemoryProgression {
    pub fn new() -> Self {
        Self::default()
    }

    fn update<T>(
        &self,
        user_id: PlayerId,
        f: impl FnOnce(&mut PlayerProfile) -> T,
    ) -> Result<T, ProgressionError> {
        let mut players = self
            .players
            .write()
            .map_err(|_| ProgressionError::StoragePoisoned)?;
        let profile = players
            .get_mut(&user_id)
            .ok_or(ProgressionError::PlayerNotFound(user_id))?;
        Ok(f(profile))
    }
}

impl ProgressionStore for InMemoryProgression {
    fn register_player(
        &self,
        user_id: PlayerId,
        username: &str,
    ) -> Result<PlayerProfile, ProgressionError> {
        let mut players = self
            .players
            .write()
            .map_err(|_| ProgressionError::StoragePoisoned)?;
        let profile = players
            .entry(user_id)
            .or_insert_with(|| PlayerProfile::new(user_id, username.to_string()));
        profile.username = username.to_string();
        Ok(profile.clone())
    }

    fn get_player(&self, user_id: PlayerId) -> Result<Option<PlayerProfile>, ProgressionError> {
        let players = self
            .players
            .read()
            .map_err(|_| ProgressionError::StoragePoisoned)?;
        Ok(players.get(&user_id).cloned())
    }

    fn record_win(&self, user_id: PlayerId) -> Result<(), ProgressionError> {
        self.update(user_id, |p| {
            p.wins += 1;
            p.games_played += 1;
        })
    }

    fn record_loss(&self, user_id: PlayerId) -> Result<(), ProgressionError> {
        self.update(user_id, |p| {
            p.losses += 1;
            p.games_played += 1;
        })
    }

    fn add_xp(&self, user_id: PlayerId, amount: u32) -> Result<PlayerProfile, ProgressionError> {
        self.update(user_id, |p| {
            p.xp += amount;
            let mut needed = xp_for_level(p.level + 1);
            while p.xp >= needed {
                p.level += 1;
                p.xp -= needed;
                p.coins += LEVEL_UP_COINS_PER_LEVEL * p.level;
                log::info!("player {} reached level {}", p.user_id, p.level);
                needed = xp_for_level(p.level + 1);
            }
            p.clone()
        })
    }

    fn add_coins(&self, user_id: PlayerId, amount: u32) -> Result<(), ProgressionError> {
        self.update(user_id, |p| p.coins += amount)
    }

    fn record_role_played(&self, user_id: PlayerId, role: RoleId) -> Result<(), ProgressionError> {
        self.update(user_id, |p| {
            let count = {
                let entry = p.roles_played.entry(role).or_insert(0);
                *entry += 1;
                *entry
            };
            // 同数なら今のお気に入りを維持
            let current = p
                .favorite_role
                .and_then(|fav| p.roles_played.get(&fav).copied())
                .unwrap_or(0);
            if p.favorite_role.is_none() || count > current {
                p.favorite_role = Some(role);
            }
        })
    }

    fn leaderboard(&self, limit: usize) -> Result<Vec<PlayerProfile>, ProgressionError> {
        let players = self
            .players
            .read()
            .map_err(|_| ProgressionError::StoragePoisoned)?;
        let mut ranked: Vec<PlayerProfile> = players.values().cloned().collect();
        ranked.sort_by(|a, b| {
            (b.level, b.xp)
                .cmp(&(a.level, a.xp))
                .then(a.user_id.cmp(&b.user_id))
        });
        ranked.truncate(limit);
        Ok(ranked)
    }
}
