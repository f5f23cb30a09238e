use std::sync::Arc;
use std::time::Duration;

use mafia_engine::{
    GameError, GamePhase, GameSession, GameStatus, GameSummary, PlayerId, SessionId,
};

use crate::{
    models::{
        chat::{EliminatedPlayer, GameEvent, PlayerRef},
        game::{NightActionRequest, StartGameRequest, SubmissionAccepted, VoteRequest},
        room::SessionView,
    },
    services::{player_service::ProgressionError, session_registry::SessionHandle},
    state::AppState,
};

#[derive(Debug, thiserror::Error)]
pub enum GameServiceError {
    #[error(transparent)]
    Game(#[from] GameError),
    #[error("Game {0} not found")]
    SessionNotFound(String),
    #[error("You are not in a game that is taking this action right now")]
    NoActiveSession,
    #[error("You are already in game {0}")]
    AlreadyInAnotherGame(SessionId),
    #[error(transparent)]
    Progression(#[from] ProgressionError),
}

async fn session(
    state: &AppState,
    session_id: &str,
) -> Result<Arc<SessionHandle>, GameServiceError> {
    state
        .registry
        .get(session_id)
        .await
        .ok_or_else(|| GameServiceError::SessionNotFound(session_id.to_string()))
}

fn player_ref(game: &GameSession, user_id: PlayerId) -> Option<PlayerRef> {
    game.player(user_id).map(|p| PlayerRef {
        user_id: p.user_id,
        name: p.name.clone(),
    })
}

fn alive_refs(game: &GameSession) -> Vec<PlayerRef> {
    game.alive_players()
        .map(|p| PlayerRef {
            user_id: p.user_id,
            name: p.name.clone(),
        })
        .collect()
}

fn eliminated_player(game: &GameSession, user_id: PlayerId) -> Option<EliminatedPlayer> {
    game.player(user_id).map(|p| EliminatedPlayer {
        user_id: p.user_id,
        name: p.name.clone(),
        role: p.role,
    })
}

/// Deals roles, tells every player theirs and hands the session to the
/// phase driver.
pub async fn start_game(
    state: AppState,
    session_id: &str,
    req: StartGameRequest,
) -> Result<SessionView, GameServiceError> {
    let handle = session(&state, session_id).await?;

    let (view, reveals) = {
        let mut game = handle.game.lock().await;
        let dealt = game.start(req.user_id)?;
        let registry = game.rules().registry.clone();
        let reveals: Vec<(PlayerId, GameEvent)> = dealt
            .iter()
            .filter_map(|&(user_id, role)| match registry.get_role(role) {
                Ok(def) => Some((
                    user_id,
                    GameEvent::RoleReveal {
                        role,
                        team: def.team,
                        description: def.description.to_string(),
                        win_condition: def.win_condition.to_string(),
                    },
                )),
                Err(e) => {
                    log::warn!("no definition for dealt role {}: {}", role, e);
                    None
                }
            })
            .collect();
        for &(user_id, role) in &dealt {
            if let Err(e) = state.progression.record_role_played(user_id, role) {
                log::warn!("could not record role for player {}: {}", user_id, e);
            }
        }
        (SessionView::new(&game, state.config.show_player_roles), reveals)
    };

    for (user_id, event) in reveals {
        state
            .send_private(&handle, session_id, user_id, event)
            .await;
    }

    tokio::spawn(run_game(state.clone(), handle, session_id.to_string()));
    Ok(view)
}

/// Routes a night action to the session where the actor is alive and it is
/// night.
pub async fn submit_night_action(
    state: AppState,
    req: NightActionRequest,
) -> Result<SubmissionAccepted, GameServiceError> {
    let handle = state
        .registry
        .find_session_for(req.user_id, GamePhase::Night)
        .await
        .ok_or(GameServiceError::NoActiveSession)?;

    let session_id = {
        let mut game = handle.game.lock().await;
        game.submit_night_action(req.user_id, req.kind, req.target_id)?;
        game.id().to_string()
    };
    handle.submissions.notify_one();
    Ok(SubmissionAccepted { session_id })
}

pub async fn submit_vote(
    state: AppState,
    req: VoteRequest,
) -> Result<SubmissionAccepted, GameServiceError> {
    let handle = state
        .registry
        .find_session_for(req.user_id, GamePhase::Day)
        .await
        .ok_or(GameServiceError::NoActiveSession)?;

    let session_id = {
        let mut game = handle.game.lock().await;
        game.submit_vote(req.user_id, req.target)?;
        game.id().to_string()
    };
    handle.submissions.notify_one();
    Ok(SubmissionAccepted { session_id })
}

pub async fn get_game_state(
    state: AppState,
    session_id: String,
) -> Result<SessionView, GameServiceError> {
    let handle = session(&state, &session_id).await?;
    let game = handle.game.lock().await;
    Ok(SessionView::new(&game, state.config.show_player_roles))
}

pub async fn get_summary(
    state: AppState,
    session_id: String,
) -> Result<GameSummary, GameServiceError> {
    let handle = session(&state, &session_id).await?;
    let summary = handle.game.lock().await.summary();
    Ok(summary)
}

/// Phase driver. Alternates night and day until the session finishes or is
/// aborted.
pub async fn run_game(state: AppState, handle: Arc<SessionHandle>, session_id: SessionId) {
    log::info!("phase driver started for {}", session_id);
    loop {
        if !run_night(&state, &handle, &session_id).await {
            break;
        }
        tokio::time::sleep(state.config.phase_pause).await;
        if !run_day(&state, &handle, &session_id).await {
            break;
        }
        tokio::time::sleep(state.config.phase_pause).await;
    }
    log::info!("phase driver stopped for {}", session_id);
}

/// `Ok(false)` once the session has ended on its own. A running session in
/// any other phase than `expected` is aborted here.
fn open_phase(game: &mut GameSession, expected: GamePhase) -> Result<bool, GameError> {
    if game.status() != GameStatus::InProgress {
        return Ok(false);
    }
    if let Err(err) = game.expect_phase(expected) {
        game.abort(err.to_string());
        return Err(err);
    }
    Ok(true)
}

/// Returns false once the session should not continue.
async fn run_night(state: &AppState, handle: &SessionHandle, session_id: &str) -> bool {
    let opened = {
        let mut game = handle.game.lock().await;
        open_phase(&mut game, GamePhase::Night).map(|running| {
            running.then(|| {
                let requests: Vec<_> = game
                    .night_actors()
                    .into_iter()
                    .map(|(actor, kind)| {
                        let targets = game
                            .eligible_targets(actor)
                            .into_iter()
                            .filter_map(|t| player_ref(&game, t))
                            .collect::<Vec<_>>();
                        (actor, kind, targets)
                    })
                    .collect();
                (game.mode(), game.round(), alive_refs(&game), requests)
            })
        })
    };
    let (mode, round, alive, requests) = match opened {
        Ok(Some(opened)) => opened,
        Ok(None) => return false,
        Err(err) => {
            announce_abort(state, handle, session_id, &err).await;
            return false;
        }
    };

    let duration = state.config.night_duration(mode);
    state
        .broadcast_event(
            handle,
            session_id,
            GameEvent::PhaseChange {
                phase: GamePhase::Night,
                round,
                duration_secs: duration.as_secs(),
                alive,
            },
        )
        .await;
    for (actor, action, targets) in requests {
        state
            .send_private(
                handle,
                session_id,
                actor,
                GameEvent::ActionRequest {
                    action,
                    targets,
                    duration_secs: duration.as_secs(),
                },
            )
            .await;
    }

    wait_for_submissions(state, handle, duration, GamePhase::Night).await;

    let resolved = {
        let mut game = handle.game.lock().await;
        match game.resolve_night() {
            Ok(report) => {
                let eliminated = report
                    .outcome
                    .eliminated
                    .and_then(|id| eliminated_player(&game, id));
                let investigation = report.outcome.investigation.as_ref().and_then(|inv| {
                    player_ref(&game, inv.target)
                        .map(|target| (inv.investigator, target, inv.verdict))
                });
                Ok((report, eliminated, investigation))
            }
            Err(err) => {
                game.abort(err.to_string());
                Err(err)
            }
        }
    };

    let (report, eliminated, investigation) = match resolved {
        Ok(resolved) => resolved,
        Err(err) => {
            announce_abort(state, handle, session_id, &err).await;
            return false;
        }
    };

    if let Some((investigator, target, verdict)) = investigation {
        state
            .send_private(
                handle,
                session_id,
                investigator,
                GameEvent::InvestigationResult { target, verdict },
            )
            .await;
    }
    state
        .broadcast_event(
            handle,
            session_id,
            GameEvent::NightResult {
                round: report.round,
                eliminated,
                was_protected: report.outcome.was_protected,
            },
        )
        .await;

    if report.winner.is_some() {
        finish_game(state, handle, session_id).await;
        return false;
    }
    true
}

async fn run_day(state: &AppState, handle: &SessionHandle, session_id: &str) -> bool {
    let opened = {
        let mut game = handle.game.lock().await;
        open_phase(&mut game, GamePhase::Day)
            .map(|running| running.then(|| (game.mode(), game.round(), alive_refs(&game))))
    };
    let (mode, round, alive) = match opened {
        Ok(Some(opened)) => opened,
        Ok(None) => return false,
        Err(err) => {
            announce_abort(state, handle, session_id, &err).await;
            return false;
        }
    };

    let duration = state.config.day_duration(mode);
    state
        .broadcast_event(
            handle,
            session_id,
            GameEvent::PhaseChange {
                phase: GamePhase::Day,
                round,
                duration_secs: duration.as_secs(),
                alive,
            },
        )
        .await;

    wait_for_submissions(state, handle, duration, GamePhase::Day).await;

    let resolved = {
        let mut game = handle.game.lock().await;
        match game.resolve_day() {
            Ok(report) => {
                let eliminated = report
                    .outcome
                    .eliminated
                    .and_then(|id| eliminated_player(&game, id));
                Ok((report, eliminated))
            }
            Err(err) => {
                game.abort(err.to_string());
                Err(err)
            }
        }
    };

    let (report, eliminated) = match resolved {
        Ok(resolved) => resolved,
        Err(err) => {
            announce_abort(state, handle, session_id, &err).await;
            return false;
        }
    };

    state
        .broadcast_event(
            handle,
            session_id,
            GameEvent::DayResult {
                round: report.round,
                eliminated,
                tally: report.outcome.tally,
                tie: report.outcome.tie,
            },
        )
        .await;

    if report.winner.is_some() {
        finish_game(state, handle, session_id).await;
        return false;
    }
    true
}

/// Sleeps out the phase. With early resolution on, wakes on each accepted
/// submission and returns as soon as everyone expected has submitted.
async fn wait_for_submissions(
    state: &AppState,
    handle: &SessionHandle,
    duration: Duration,
    phase: GamePhase,
) {
    let sleep = tokio::time::sleep(duration);
    tokio::pin!(sleep);

    if !state.config.early_resolution {
        sleep.await;
        return;
    }

    loop {
        let notified = handle.submissions.notified();
        let everyone_in = {
            let game = handle.game.lock().await;
            match phase {
                GamePhase::Night => game.all_night_actions_in(),
                GamePhase::Day => game.all_votes_in(),
            }
        };
        if everyone_in {
            log::debug!("all submissions in for {} phase, resolving early", phase);
            return;
        }
        tokio::select! {
            _ = &mut sleep => return,
            _ = notified => {}
        }
    }
}

async fn announce_abort(
    state: &AppState,
    handle: &SessionHandle,
    session_id: &str,
    err: &GameError,
) {
    log::error!("session {} aborted by driver: {}", session_id, err);
    state
        .broadcast_event(
            handle,
            session_id,
            GameEvent::GameAborted {
                reason: err.to_string(),
            },
        )
        .await;
    state.remove_session_channel(session_id).await;
}

/// Settles rewards once and books them in the progression store.
async fn finish_game(state: &AppState, handle: &SessionHandle, session_id: &str) {
    let (summary, rewards) = {
        let mut game = handle.game.lock().await;
        let rewards = game.settle_rewards();
        (game.summary(), rewards)
    };
    let Some(rewards) = rewards else {
        log::warn!("rewards for {} were already settled", session_id);
        return;
    };

    for reward in &rewards {
        if let Err(e) = state.progression.apply_reward(reward) {
            log::warn!("could not book reward for player {}: {}", reward.user_id, e);
        }
    }
    log::info!(
        "session {} over after {} rounds, {:?} win",
        session_id,
        summary.round,
        summary.winner
    );
    state
        .broadcast_event(handle, session_id, GameEvent::GameOver { summary, rewards })
        .await;
    // 購読中のソケットは残りを受け取ってから閉じる
    state.remove_session_channel(session_id).await;
}
