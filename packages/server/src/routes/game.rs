use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::state::AppState;
use crate::{
    models::game::{NightActionRequest, StartGameRequest, VoteRequest},
    services::game_service::{self, GameServiceError},
};

pub fn routes(state: AppState) -> Router {
    Router::new()
        // ゲームアクション（参加中のゲームはサーバー側で探す）
        .nest(
            "/actions",
            Router::new()
                .route("/vote", post(cast_vote_handler))
                .route("/night-action", post(night_action_handler)),
        )
        .nest(
            "/:roomid",
            Router::new()
                .route("/start", post(start_game))
                .route("/state", get(get_game_state))
                .route("/summary", get(get_summary)),
        )
        .with_state(state)
}

pub async fn start_game(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(req): Json<StartGameRequest>,
) -> Result<impl IntoResponse, GameServiceError> {
    let view = game_service::start_game(state, &room_id, req).await?;
    Ok((StatusCode::OK, Json(view)))
}

async fn get_game_state(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<impl IntoResponse, GameServiceError> {
    let view = game_service::get_game_state(state, room_id).await?;
    Ok((StatusCode::OK, Json(view)))
}

async fn get_summary(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<impl IntoResponse, GameServiceError> {
    let summary = game_service::get_summary(state, room_id).await?;
    Ok((StatusCode::OK, Json(summary)))
}

async fn night_action_handler(
    State(state): State<AppState>,
    Json(req): Json<NightActionRequest>,
) -> Result<impl IntoResponse, GameServiceError> {
    let accepted = game_service::submit_night_action(state, req).await?;
    Ok((StatusCode::OK, Json(accepted)))
}

async fn cast_vote_handler(
    State(state): State<AppState>,
    Json(req): Json<VoteRequest>,
) -> Result<impl IntoResponse, GameServiceError> {
    let accepted = game_service::submit_vote(state, req).await?;
    Ok((StatusCode::OK, Json(accepted)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::GameConfig;
    use crate::models::room::{CreateGameRequest, JoinGameRequest, SessionView};
    use crate::services::room_service;
    use axum::{body::to_bytes, body::Body, http::Request};
    use mafia_engine::{GameMode, GamePhase, GameStatus};
    use std::time::Duration;
    use tower::ServiceExt;

    fn slow_state() -> AppState {
        // 解決が走らないように長めのフェーズにする
        AppState::new(GameConfig {
            phase_duration_override: Some(Duration::from_secs(600)),
            ..GameConfig::default()
        })
    }

    async fn one_vs_one(state: &AppState) -> String {
        let id = room_service::create_room(
            state,
            CreateGameRequest {
                mode: GameMode::OneVsOne,
                creator_id: 1,
                creator_name: "P1".to_string(),
                chat_id: -1,
            },
        )
        .await
        .unwrap();
        room_service::join_room(
            state,
            &id,
            JoinGameRequest {
                user_id: 2,
                name: "P2".to_string(),
            },
        )
        .await
        .unwrap();
        id
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_start_game() {
        let state = slow_state();
        let room_id = one_vs_one(&state).await;
        let app = routes(state);

        let response = app
            .clone()
            .oneshot(post_json(
                &format!("/{}/start", room_id),
                serde_json::json!({"user_id": 2}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .clone()
            .oneshot(post_json(
                &format!("/{}/start", room_id),
                serde_json::json!({"user_id": 1}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let view: SessionView = serde_json::from_slice(&body).unwrap();
        assert_eq!(view.status, GameStatus::InProgress);
        assert_eq!(view.phase, GamePhase::Night);
        assert_eq!(view.round, 1);

        let response = app
            .oneshot(post_json(
                &format!("/{}/start", room_id),
                serde_json::json!({"user_id": 1}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_vote_outside_day_has_no_session() {
        let state = slow_state();
        let room_id = one_vs_one(&state).await;
        let app = routes(state);
        app.clone()
            .oneshot(post_json(
                &format!("/{}/start", room_id),
                serde_json::json!({"user_id": 1}),
            ))
            .await
            .unwrap();

        let response = app
            .oneshot(post_json(
                "/actions/vote",
                serde_json::json!({"user_id": 1, "target": "abstain"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn test_unknown_game_is_not_found() {
        let app = routes(slow_state());
        let request = Request::builder()
            .uri("/G-000-0/state")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
