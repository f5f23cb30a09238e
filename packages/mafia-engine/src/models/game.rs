use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::action::{NightActionKind, NightSubmission, PendingNightActions, VoteChoice};
use super::mode::GameMode;
use super::player::{Player, PlayerId};
use super::role::{RoleId, Team};
use crate::error::GameError;
use crate::rules::{calculate_reward, DayOutcome, NightOutcome, PlayerReward, Rulebook, Winner};

pub type SessionId = String;
/// Opaque routing handle of the chat the session was created in.
pub type ChatId = i64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Waiting,
    InProgress,
    Finished,
    Aborted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    Day,
    Night,
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GamePhase::Day => write!(f, "day"),
            GamePhase::Night => write!(f, "night"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NightReport {
    pub round: u32,
    pub outcome: NightOutcome,
    pub winner: Option<Winner>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayReport {
    pub round: u32,
    pub outcome: DayOutcome,
    pub winner: Option<Winner>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub user_id: PlayerId,
    pub name: String,
    pub role: Option<RoleId>,
    pub alive: bool,
}

/// Post-game report of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    pub id: SessionId,
    pub mode: GameMode,
    pub status: GameStatus,
    pub round: u32,
    pub winner: Option<Winner>,
    pub players: Vec<PlayerSummary>,
}

/// One game, from lobby to result.
///
/// Players keep join order; the first one is the creator. Roles are dealt
/// once at start and never change, `alive` only ever goes from true to false,
/// and `round` only moves forward.
#[derive(Debug, Clone, Serialize)]
pub struct GameSession {
    id: SessionId,
    mode: GameMode,
    chat_id: ChatId,
    creator_id: PlayerId,
    players: Vec<Player>,
    status: GameStatus,
    phase: GamePhase,
    round: u32,
    winner: Option<Winner>,
    night_actions: PendingNightActions,
    day_votes: HashMap<PlayerId, VoteChoice>,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    rewards_settled: bool,
    abort_reason: Option<String>,
    #[serde(skip)]
    rules: Rulebook,
}

impl fmt::Display for GameSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Game {{ id: {}, mode: {}, players: {}, status: {:?}, phase: {}, round: {}, winner: {:?} }}",
            self.id,
            self.mode,
            self.players.len(),
            self.status,
            self.phase,
            self.round,
            self.winner
        )
    }
}

impl GameSession {
    pub fn new(
        id: SessionId,
        mode: GameMode,
        creator_id: PlayerId,
        creator_name: String,
        chat_id: ChatId,
        rules: Rulebook,
    ) -> Self {
        GameSession {
            id,
            mode,
            chat_id,
            creator_id,
            players: vec![Player::new(creator_id, creator_name)],
            status: GameStatus::Waiting,
            phase: GamePhase::Day,
            round: 0,
            winner: None,
            night_actions: PendingNightActions::default(),
            day_votes: HashMap::new(),
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            rewards_settled: false,
            abort_reason: None,
            rules,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    pub fn creator_id(&self) -> PlayerId {
        self.creator_id
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn winner(&self) -> Option<Winner> {
        self.winner
    }

    pub fn night_actions(&self) -> &PendingNightActions {
        &self.night_actions
    }

    pub fn day_votes(&self) -> &HashMap<PlayerId, VoteChoice> {
        &self.day_votes
    }

    pub fn abort_reason(&self) -> Option<&str> {
        self.abort_reason.as_deref()
    }

    pub fn rules(&self) -> &Rulebook {
        &self.rules
    }

    pub fn player(&self, user_id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.user_id == user_id)
    }

    pub fn alive_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.alive)
    }

    pub fn is_alive_participant(&self, user_id: PlayerId) -> bool {
        self.player(user_id).is_some_and(|p| p.alive)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, GameStatus::Finished | GameStatus::Aborted)
    }

    // Lobby

    pub fn join(&mut self, user_id: PlayerId, name: String) -> Result<(), GameError> {
        if self.status != GameStatus::Waiting {
            return Err(GameError::AlreadyStarted);
        }
        if self.player(user_id).is_some() {
            return Err(GameError::AlreadyJoined);
        }
        if self.players.len() >= self.mode.settings().max_players {
            return Err(GameError::LobbyFull);
        }
        self.players.push(Player::new(user_id, name));
        Ok(())
    }

    pub fn leave(&mut self, user_id: PlayerId) -> Result<(), GameError> {
        if self.status != GameStatus::Waiting {
            return Err(GameError::GameInProgress);
        }
        if user_id == self.creator_id {
            return Err(GameError::CreatorCannotLeave);
        }
        let index = self
            .players
            .iter()
            .position(|p| p.user_id == user_id)
            .ok_or(GameError::NotAParticipant)?;
        self.players.remove(index);
        Ok(())
    }

    /// Checks that `user_id` may discard this lobby. The registry does the
    /// actual removal.
    pub fn ensure_can_cancel(&self, user_id: PlayerId) -> Result<(), GameError> {
        if user_id != self.creator_id {
            return Err(GameError::NotCreator("cancel"));
        }
        if self.status != GameStatus::Waiting {
            return Err(GameError::GameInProgress);
        }
        Ok(())
    }

    pub fn start(&mut self, requester: PlayerId) -> Result<Vec<(PlayerId, RoleId)>, GameError> {
        self.start_with_rng(requester, &mut rand::thread_rng())
    }

    /// Deals roles in join order and opens night 1. Returns who got what.
    pub fn start_with_rng<R: Rng + ?Sized>(
        &mut self,
        requester: PlayerId,
        rng: &mut R,
    ) -> Result<Vec<(PlayerId, RoleId)>, GameError> {
        if requester != self.creator_id {
            return Err(GameError::NotCreator("start"));
        }
        if self.status != GameStatus::Waiting {
            return Err(GameError::AlreadyStarted);
        }
        let settings = self.mode.settings();
        if self.players.len() < settings.min_players {
            return Err(GameError::NotEnoughPlayers {
                required: settings.min_players,
            });
        }
        if self.players.len() > settings.max_players {
            return Err(GameError::TooManyPlayers {
                max: settings.max_players,
            });
        }

        let roles = self
            .rules
            .assigner
            .assign_with_rng(self.players.len(), self.mode, rng);
        let dealt: Vec<(PlayerId, RoleId)> = self
            .players
            .iter_mut()
            .zip(roles)
            .map(|(player, role)| {
                player.role = Some(role);
                (player.user_id, role)
            })
            .collect();

        self.status = GameStatus::InProgress;
        self.phase = GamePhase::Night;
        self.round = 1;
        self.started_at = Some(Utc::now());
        self.night_actions = PendingNightActions::default();
        self.day_votes.clear();
        log::info!("game {} started with {} players", self.id, dealt.len());
        Ok(dealt)
    }

    // Night

    /// Living players whose role acts at night, with the action they take.
    pub fn night_actors(&self) -> Vec<(PlayerId, NightActionKind)> {
        self.alive_players()
            .filter_map(|p| {
                let kind = p.role.and_then(|role| self.rules.registry.night_action_of(role))?;
                Some((p.user_id, kind))
            })
            .collect()
    }

    /// Targets `actor` may currently pick for their night action.
    pub fn eligible_targets(&self, actor: PlayerId) -> Vec<PlayerId> {
        let Some(kind) = self.night_action_of(actor) else {
            return Vec::new();
        };
        self.alive_players()
            .filter(|target| self.check_night_target(actor, kind, target.user_id).is_ok())
            .map(|target| target.user_id)
            .collect()
    }

    pub fn submit_night_action(
        &mut self,
        actor: PlayerId,
        kind: NightActionKind,
        target: PlayerId,
    ) -> Result<(), GameError> {
        self.ensure_accepting(GamePhase::Night)?;
        self.ensure_living_actor(actor)?;
        if self.night_action_of(actor) != Some(kind) {
            return Err(GameError::ActionNotAllowed(kind));
        }
        self.check_night_target(actor, kind, target)?;

        self.night_actions
            .record(kind, NightSubmission { actor, target });
        log::debug!("game {}: {} submitted {} on {}", self.id, actor, kind, target);
        Ok(())
    }

    /// Every kind of night action that some living player can take has been
    /// submitted.
    pub fn all_night_actions_in(&self) -> bool {
        self.night_actors()
            .iter()
            .all(|(_, kind)| self.night_actions.get(*kind).is_some())
    }

    pub fn resolve_night(&mut self) -> Result<NightReport, GameError> {
        self.expect_phase(GamePhase::Night)?;
        let round = self.round;
        let actions = std::mem::take(&mut self.night_actions);
        let outcome = self
            .rules
            .night
            .resolve(&self.rules.registry, &mut self.players, &actions);

        let winner = self.judge();
        if winner.is_none() {
            self.phase = GamePhase::Day;
            self.day_votes.clear();
        }
        Ok(NightReport {
            round,
            outcome,
            winner,
        })
    }

    // Day

    pub fn submit_vote(&mut self, voter: PlayerId, choice: VoteChoice) -> Result<(), GameError> {
        self.ensure_accepting(GamePhase::Day)?;
        self.ensure_living_actor(voter)?;
        if let VoteChoice::Player(target) = choice {
            if !self.is_alive_participant(target) {
                return Err(GameError::InvalidTarget(target));
            }
        }
        self.day_votes.insert(voter, choice);
        Ok(())
    }

    pub fn all_votes_in(&self) -> bool {
        self.alive_players()
            .all(|p| self.day_votes.contains_key(&p.user_id))
    }

    pub fn resolve_day(&mut self) -> Result<DayReport, GameError> {
        self.expect_phase(GamePhase::Day)?;
        let round = self.round;
        let votes = std::mem::take(&mut self.day_votes);
        let outcome = self.rules.day.resolve(&mut self.players, &votes);

        let winner = self.judge();
        if winner.is_none() {
            self.round += 1;
            self.phase = GamePhase::Night;
            self.night_actions = PendingNightActions::default();
        }
        Ok(DayReport {
            round,
            outcome,
            winner,
        })
    }

    // End of game

    /// Marks the session failed. Finished sessions stay finished.
    pub fn abort(&mut self, reason: impl Into<String>) {
        if self.status == GameStatus::Finished {
            return;
        }
        let reason = reason.into();
        log::error!("game {} aborted: {}", self.id, reason);
        self.status = GameStatus::Aborted;
        self.abort_reason = Some(reason);
        self.finished_at = Some(Utc::now());
    }

    /// Rewards for every dealt player. Returns `Some` exactly once, after the
    /// game has finished.
    pub fn settle_rewards(&mut self) -> Option<Vec<PlayerReward>> {
        let winner = self.winner?;
        if self.status != GameStatus::Finished || self.rewards_settled {
            return None;
        }
        self.rewards_settled = true;
        Some(
            self.players
                .iter()
                .filter(|p| p.role.is_some())
                .map(|p| calculate_reward(&self.rules.registry, self.mode, p, winner, self.round))
                .collect(),
        )
    }

    pub fn summary(&self) -> GameSummary {
        GameSummary {
            id: self.id.clone(),
            mode: self.mode,
            status: self.status,
            round: self.round,
            winner: self.winner,
            players: self
                .players
                .iter()
                .map(|p| PlayerSummary {
                    user_id: p.user_id,
                    name: p.name.clone(),
                    role: p.role,
                    alive: p.alive,
                })
                .collect(),
        }
    }

    fn judge(&mut self) -> Option<Winner> {
        let winner = self
            .rules
            .judge
            .evaluate(&self.rules.registry, &self.players)?;
        self.status = GameStatus::Finished;
        self.winner = Some(winner);
        self.finished_at = Some(Utc::now());
        log::info!("game {} finished, {} win", self.id, winner);
        Some(winner)
    }

    fn night_action_of(&self, user_id: PlayerId) -> Option<NightActionKind> {
        self.player(user_id)
            .and_then(|p| p.role)
            .and_then(|role| self.rules.registry.night_action_of(role))
    }

    fn team_of(&self, user_id: PlayerId) -> Option<Team> {
        self.player(user_id)
            .and_then(|p| p.role)
            .and_then(|role| self.rules.registry.team_of(role).ok())
    }

    fn check_night_target(
        &self,
        actor: PlayerId,
        kind: NightActionKind,
        target: PlayerId,
    ) -> Result<(), GameError> {
        if !self.is_alive_participant(target) {
            return Err(GameError::InvalidTarget(target));
        }
        match kind {
            NightActionKind::Kill => {
                if self.team_of(actor) == Some(Team::Mafia)
                    && self.team_of(target) == Some(Team::Mafia)
                {
                    return Err(GameError::CannotTargetTeammate);
                }
            }
            NightActionKind::Investigate => {
                if actor == target {
                    return Err(GameError::CannotTargetSelf);
                }
            }
            NightActionKind::Protect => {
                let last = self.player(actor).and_then(|p| p.last_protected_target);
                if last == Some(target) {
                    return Err(GameError::RepeatProtection);
                }
            }
        }
        Ok(())
    }

    /// Player-facing check: rejects submissions outside the right phase.
    fn ensure_accepting(&self, phase: GamePhase) -> Result<(), GameError> {
        if self.status != GameStatus::InProgress {
            return Err(GameError::NotInProgress);
        }
        if self.phase != phase {
            return Err(GameError::WrongPhase(phase));
        }
        Ok(())
    }

    fn ensure_living_actor(&self, user_id: PlayerId) -> Result<(), GameError> {
        match self.player(user_id) {
            None => Err(GameError::NotAParticipant),
            Some(p) if !p.alive => Err(GameError::ActorNotAlive),
            Some(_) => Ok(()),
        }
    }

    /// Driver-facing check: opening or resolving the wrong phase is an
    /// invariant violation, not a player error.
    pub fn expect_phase(&self, expected: GamePhase) -> Result<(), GameError> {
        if self.status != GameStatus::InProgress || self.phase != expected {
            return Err(GameError::PhaseMismatch {
                status: self.status,
                phase: self.phase,
                expected,
            });
        }
        Ok(())
    }
}
