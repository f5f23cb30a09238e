use mafia_engine::{PlayerId, SessionId};

use crate::{
    models::{
        chat::{GameEvent, PlayerRef},
        room::{CreateGameRequest, JoinGameRequest, RoomSummary, SessionView},
    },
    services::game_service::GameServiceError,
    state::AppState,
};

pub async fn create_room(
    state: &AppState,
    req: CreateGameRequest,
) -> Result<SessionId, GameServiceError> {
    let _membership = state.registry.lock_membership().await;
    if let Some(other) = state.registry.live_session_of(req.creator_id).await {
        return Err(GameServiceError::AlreadyInAnotherGame(other));
    }
    state
        .progression
        .register_player(req.creator_id, &req.creator_name)?;
    let handle = state
        .registry
        .create(req.mode, req.creator_id, req.creator_name, req.chat_id)
        .await;
    let session_id = handle.game.lock().await.id().to_string();
    state.get_or_create_session_channel(&session_id).await;
    Ok(session_id)
}

pub async fn join_room(
    state: &AppState,
    session_id: &str,
    req: JoinGameRequest,
) -> Result<RoomSummary, GameServiceError> {
    let handle = state
        .registry
        .get(session_id)
        .await
        .ok_or_else(|| GameServiceError::SessionNotFound(session_id.to_string()))?;

    let (summary, required) = {
        let _membership = state.registry.lock_membership().await;
        if let Some(other) = state.registry.live_session_of(req.user_id).await {
            if other != session_id {
                return Err(GameServiceError::AlreadyInAnotherGame(other));
            }
        }
        let mut game = handle.game.lock().await;
        game.join(req.user_id, req.name.clone())?;
        (RoomSummary::from(&*game), game.mode().settings().min_players)
    };
    state.progression.register_player(req.user_id, &req.name)?;
    log::info!("player {} joined {}", req.user_id, session_id);

    state
        .broadcast_event(
            &handle,
            session_id,
            GameEvent::PlayerJoined {
                player: PlayerRef {
                    user_id: req.user_id,
                    name: req.name,
                },
                players: summary.players,
                required,
            },
        )
        .await;
    Ok(summary)
}

pub async fn leave_room(
    state: &AppState,
    session_id: &str,
    user_id: PlayerId,
) -> Result<RoomSummary, GameServiceError> {
    let handle = state
        .registry
        .get(session_id)
        .await
        .ok_or_else(|| GameServiceError::SessionNotFound(session_id.to_string()))?;

    let (summary, name) = {
        let mut game = handle.game.lock().await;
        let name = game
            .player(user_id)
            .map(|p| p.name.clone())
            .unwrap_or_default();
        game.leave(user_id)?;
        (RoomSummary::from(&*game), name)
    };
    log::info!("player {} left {}", user_id, session_id);

    state
        .broadcast_event(
            &handle,
            session_id,
            GameEvent::PlayerLeft {
                player: PlayerRef { user_id, name },
            },
        )
        .await;
    Ok(summary)
}

/// Creator-only. Discards a lobby that has not started yet.
pub async fn cancel_room(
    state: &AppState,
    session_id: &str,
    user_id: PlayerId,
) -> Result<(), GameServiceError> {
    let handle = state
        .registry
        .get(session_id)
        .await
        .ok_or_else(|| GameServiceError::SessionNotFound(session_id.to_string()))?;

    {
        // ロックを保持したまま削除して、同時のstartと競合しないようにする
        let mut game = handle.game.lock().await;
        game.ensure_can_cancel(user_id)?;
        game.abort("cancelled by creator");
        state.registry.remove(session_id).await;
    }

    state
        .broadcast_event(
            &handle,
            session_id,
            GameEvent::GameAborted {
                reason: "Game cancelled by creator".to_string(),
            },
        )
        .await;
    state.remove_session_channel(session_id).await;
    Ok(())
}

pub async fn get_rooms(state: &AppState) -> Vec<RoomSummary> {
    let mut rooms = Vec::new();
    for handle in state.registry.list().await {
        rooms.push(RoomSummary::from(&*handle.game.lock().await));
    }
    rooms.sort_by(|a, b| a.session_id.cmp(&b.session_id));
    rooms
}

pub async fn get_room_info(
    state: &AppState,
    session_id: &str,
) -> Result<SessionView, GameServiceError> {
    let handle = state
        .registry
        .get(session_id)
        .await
        .ok_or_else(|| GameServiceError::SessionNotFound(session_id.to_string()))?;
    let game = handle.game.lock().await;
    Ok(SessionView::new(&game, state.config.show_player_roles))
}
