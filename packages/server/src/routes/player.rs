use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use mafia_engine::PlayerId;

use crate::services::game_service::GameServiceError;
use crate::state::AppState;

const DEFAULT_LEADERBOARD_SIZE: usize = 10;

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    limit: Option<usize>,
}

// プレイヤールートの設定
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/leaderboard", get(get_leaderboard))
        .route("/:id", get(get_player))
        .with_state(state)
}

pub async fn get_player(
    State(state): State<AppState>,
    Path(id): Path<PlayerId>,
) -> Result<Response, GameServiceError> {
    match state.progression.get_player(id)? {
        Some(profile) => Ok((StatusCode::OK, Json(profile)).into_response()),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": format!("Player {} is not registered", id) })),
        )
            .into_response()),
    }
}

pub async fn get_leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<impl IntoResponse, GameServiceError> {
    let limit = query.limit.unwrap_or(DEFAULT_LEADERBOARD_SIZE);
    let board = state.progression.leaderboard(limit)?;
    Ok((StatusCode::OK, Json(board)))
}
