use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use mafia_engine::PlayerId;

use crate::{
    models::room::{CreateGameRequest, CreateGameResponse, JoinGameRequest},
    services::{game_service::GameServiceError, room_service},
    state::AppState,
    utils::websocket,
};

pub fn routes(state: AppState) -> Router {
    Router::new()
        // ゲーム作成
        // curl -X POST http://localhost:8080/api/room/create -H 'Content-Type: application/json' \
        //   -d '{"mode":"5v5","creator_id":1,"creator_name":"alice","chat_id":-100}'
        .route("/create", post(create_room))
        // ルーム一覧取得
        // curl http://localhost:8080/api/room/rooms
        .route("/rooms", get(get_rooms))
        // 特定のルーム情報取得
        // curl http://localhost:8080/api/room/{roomid}
        .route("/:roomid", get(get_room_info))
        // ルーム参加
        // curl -X POST http://localhost:8080/api/room/{roomid}/join -d '{"user_id":2,"name":"bob"}'
        .route("/:roomid/join", post(join_room))
        // ルーム脱退
        // curl -X POST http://localhost:8080/api/room/{roomid}/leave/{playerid}
        .route("/:roomid/leave/:playerid", post(leave_room))
        // ルーム削除（作成者のみ）
        // curl -X POST http://localhost:8080/api/room/{roomid}/cancel/{playerid}
        .route("/:roomid/cancel/:playerid", post(cancel_room))
        // WebSocket接続
        // websocat 'ws://localhost:8080/api/room/{roomid}/ws?player_id=1'
        .route("/:roomid/ws", get(websocket::handler))
        .with_state(state)
}

pub async fn create_room(
    State(state): State<AppState>,
    Json(req): Json<CreateGameRequest>,
) -> Result<impl IntoResponse, GameServiceError> {
    let session_id = room_service::create_room(&state, req).await?;
    Ok((StatusCode::CREATED, Json(CreateGameResponse { session_id })))
}

async fn get_rooms(State(state): State<AppState>) -> impl IntoResponse {
    let rooms = room_service::get_rooms(&state).await;
    (StatusCode::OK, Json(rooms))
}

async fn get_room_info(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<impl IntoResponse, GameServiceError> {
    let room = room_service::get_room_info(&state, &room_id).await?;
    Ok((StatusCode::OK, Json(room)))
}

pub async fn join_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(req): Json<JoinGameRequest>,
) -> Result<impl IntoResponse, GameServiceError> {
    let summary = room_service::join_room(&state, &room_id, req).await?;
    Ok((StatusCode::OK, Json(summary)))
}

pub async fn leave_room(
    State(state): State<AppState>,
    Path((room_id, player_id)): Path<(String, PlayerId)>,
) -> Result<impl IntoResponse, GameServiceError> {
    let summary = room_service::leave_room(&state, &room_id, player_id).await?;
    Ok((StatusCode::OK, Json(summary)))
}

async fn cancel_room(
    State(state): State<AppState>,
    Path((room_id, player_id)): Path<(String, PlayerId)>,
) -> Result<impl IntoResponse, GameServiceError> {
    room_service::cancel_room(&state, &room_id, player_id).await?;
    Ok((
        StatusCode::OK,
        Json(format!("Game {} cancelled", room_id)),
    ))
}
