use crate::services::game_service::GameServiceError;
use crate::state::AppState;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use mafia_engine::GameError;

mod game;
mod player;
mod room;

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .nest("/api/room", room::routes(state.clone()))
        .nest("/api/game", game::routes(state.clone()))
        .nest("/api/players", player::routes(state.clone()))
}

// エラーハンドリング
impl IntoResponse for GameServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            GameServiceError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            GameServiceError::NoActiveSession => StatusCode::BAD_REQUEST,
            GameServiceError::AlreadyInAnotherGame(_) => StatusCode::CONFLICT,
            GameServiceError::Progression(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GameServiceError::Game(err) if err.is_invariant_violation() => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            GameServiceError::Game(GameError::NotCreator(_) | GameError::NotAParticipant) => {
                StatusCode::FORBIDDEN
            }
            GameServiceError::Game(
                GameError::AlreadyStarted
                | GameError::AlreadyJoined
                | GameError::LobbyFull
                | GameError::GameInProgress,
            ) => StatusCode::CONFLICT,
            GameServiceError::Game(_) => StatusCode::BAD_REQUEST,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            log::error!("request failed: {}", self);
        }

        let body = Json(serde_json::json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}
