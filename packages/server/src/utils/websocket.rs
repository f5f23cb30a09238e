use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, Query, State, WebSocketUpgrade,
    },
    response::{IntoResponse, Response},
};
use futures::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tracing::info;

use mafia_engine::PlayerId;

use crate::models::chat::{ChatMessage, ChatMessageType, GameEvent, PlayerRef};
use crate::services::{game_service::GameServiceError, session_registry::SessionHandle};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    pub player_id: Option<PlayerId>,
}

/// What a client may send over the socket.
#[derive(Debug, Serialize, Deserialize)]
struct IncomingChat {
    content: String,
}

pub async fn handler(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Query(params): Query<ConnectParams>,
    ws: WebSocketUpgrade,
) -> Response {
    let Some(handle) = state.registry.get(&room_id).await else {
        return GameServiceError::SessionNotFound(room_id).into_response();
    };
    let player_id = params.player_id;
    ws.on_upgrade(move |socket| handle_socket(socket, state, handle, room_id, player_id))
}

pub async fn handle_socket(
    ws: WebSocket,
    state: AppState,
    handle: Arc<SessionHandle>,
    room_id: String,
    player_id: Option<PlayerId>,
) {
    info!(
        "New WebSocket connection established for room: {} (player {:?})",
        room_id, player_id
    );
    // 終わったゲームには履歴だけ送る
    let live = !handle.game.lock().await.is_terminal();
    let rx = if live {
        Some(state.get_or_create_session_channel(&room_id).await.subscribe())
    } else {
        None
    };

    // 購読後に履歴を取るので取りこぼしはない。重複はIDで除く
    let backlog: Vec<ChatMessage> = handle
        .chat_log
        .lock()
        .await
        .visible_to(player_id)
        .into_iter()
        .cloned()
        .collect();
    let replayed: HashSet<String> = backlog.iter().map(|m| m.message_id.clone()).collect();

    let (mut sender, mut receiver) = ws.split();

    let room_id_for_send = room_id.clone();
    let mut send_task = tokio::spawn(async move {
        for msg in &backlog {
            if send_message(&mut sender, msg).await.is_err() {
                return;
            }
        }
        let Some(mut rx) = rx else {
            return;
        };
        loop {
            let msg = match rx.recv().await {
                Ok(msg) => msg,
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!(
                        "socket for room {} skipped {} messages",
                        room_id_for_send,
                        skipped
                    );
                    continue;
                }
                // セッションが終わってチャンネルが外された
                Err(RecvError::Closed) => break,
            };
            // 他人宛の個別メッセージは送らない
            if !msg.is_visible_to(player_id) || replayed.contains(&msg.message_id) {
                continue;
            }
            if let Err(e) = send_message(&mut sender, &msg).await {
                log::debug!("socket for room {} closed: {}", room_id_for_send, e);
                break;
            }
        }
    });

    let state_for_receive = state.clone();
    let room_id_for_receive = room_id.clone();
    let mut receive_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Text(text) = msg {
                handle_incoming(&state_for_receive, &room_id_for_receive, player_id, &text).await;
            }
        }
    });

    // どちらかが終わったらもう片方も止める
    tokio::select! {
        _ = &mut send_task => receive_task.abort(),
        _ = &mut receive_task => send_task.abort(),
    }
    info!("WebSocket connection closed for room: {}", room_id);
}

async fn send_message(
    sender: &mut SplitSink<WebSocket, Message>,
    msg: &ChatMessage,
) -> Result<(), axum::Error> {
    let text = match serde_json::to_string(msg) {
        Ok(text) => text,
        Err(e) => {
            log::error!("Error serializing message: {}", e);
            return Ok(());
        }
    };
    sender.send(Message::Text(text)).await
}

/// Relays chat from living participants. Anything else gets a private error
/// back to the sender.
async fn handle_incoming(state: &AppState, room_id: &str, player_id: Option<PlayerId>, text: &str) {
    let Some(handle) = state.registry.get(room_id).await else {
        return;
    };
    let Some(player_id) = player_id else {
        return;
    };

    let reply = match serde_json::from_str::<IncomingChat>(text) {
        Ok(chat) => {
            let speaker = {
                let game = handle.game.lock().await;
                game.player(player_id)
                    .filter(|p| p.alive)
                    .map(|p| p.name.clone())
            };
            match speaker {
                Some(name) => Ok(ChatMessage::new(
                    room_id.to_string(),
                    None,
                    ChatMessageType::Public,
                    GameEvent::Chat {
                        player: PlayerRef {
                            user_id: player_id,
                            name,
                        },
                        content: chat.content,
                    },
                )),
                None => Err("Only living players in this game can chat".to_string()),
            }
        }
        Err(e) => Err(format!("Invalid message format: {}", e)),
    };

    match reply {
        Ok(message) => state.publish(&handle, message).await,
        Err(content) => {
            state
                .send_private(&handle, room_id, player_id, GameEvent::Error { content })
                .await
        }
    }
}
