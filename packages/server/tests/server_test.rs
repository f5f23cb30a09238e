use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use futures::{SinkExt, StreamExt};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tower::ServiceExt;

use mafia_server::{app, utils::test_setup::test_state};

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn create_game(app: &Router, mode: &str) -> String {
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/room/create",
            serde_json::json!({
                "mode": mode,
                "creator_id": 1,
                "creator_name": "Player1",
                "chat_id": -100
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    read_json(response).await["session_id"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_create_and_join_game() {
    let app = app::create_app_with_state(test_state());
    let room_id = create_game(&app, "5v5").await;

    let join_response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/room/{}/join", room_id),
            serde_json::json!({"user_id": 2, "name": "Player2"}),
        ))
        .await
        .unwrap();
    assert_eq!(join_response.status(), StatusCode::OK);
    let summary = read_json(join_response).await;
    assert_eq!(summary["players"], 2);
    assert_eq!(summary["mode"], "5v5");

    let leave_response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/room/{}/leave/1", room_id),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(leave_response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        read_json(leave_response).await["error"],
        "The creator cannot leave; cancel the game instead."
    );
}

#[tokio::test]
async fn test_unknown_mode_is_rejected() {
    let app = app::create_app_with_state(test_state());
    let response = app
        .oneshot(post_json(
            "/api/room/create",
            serde_json::json!({
                "mode": "3v3",
                "creator_id": 1,
                "creator_name": "Player1",
                "chat_id": -100
            }),
        ))
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_start_and_query_game() {
    let app = app::create_app_with_state(test_state());
    let room_id = create_game(&app, "1v1").await;
    app.clone()
        .oneshot(post_json(
            &format!("/api/room/{}/join", room_id),
            serde_json::json!({"user_id": 2, "name": "Player2"}),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/game/{}/start", room_id),
            serde_json::json!({"user_id": 1}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let request = Request::builder()
        .uri(format!("/api/game/{}/state", room_id))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let state = read_json(response).await;
    assert_eq!(state["round"], 1);

    let request = Request::builder()
        .uri("/api/players/1")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let profile = read_json(response).await;
    assert_eq!(profile["username"], "Player1");
}

#[tokio::test]
async fn test_websocket_feed_filters_private_messages() {
    let state = test_state();
    let app = app::create_app_with_state(state.clone());
    let room_id = create_game(&app, "1v1").await;
    app.clone()
        .oneshot(post_json(
            &format!("/api/room/{}/join", room_id),
            serde_json::json!({"user_id": 2, "name": "Player2"}),
        ))
        .await
        .unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let url = format!("ws://{}/api/room/{}/ws?player_id=1", addr, room_id);
    let (mut socket, _) = connect_async(url).await.expect("Failed to connect");

    // 自分の発言が返ってくれば購読済み
    socket
        .send(Message::Text(r#"{"content":"hello"}"#.to_string()))
        .await
        .unwrap();
    loop {
        let msg = socket.next().await.unwrap().unwrap();
        if let Message::Text(text) = msg {
            let json: serde_json::Value = serde_json::from_str(&text).unwrap();
            if json["event"]["kind"] == "chat" {
                assert_eq!(json["event"]["content"], "hello");
                assert_eq!(json["event"]["player"]["name"], "Player1");
                break;
            }
        }
    }

    mafia_server::services::game_service::start_game(
        state.clone(),
        &room_id,
        mafia_server::models::game::StartGameRequest { user_id: 1 },
    )
    .await
    .unwrap();

    let mut reveals = 0;
    loop {
        let msg = tokio::time::timeout(std::time::Duration::from_secs(5), socket.next())
            .await
            .expect("timed out waiting for messages")
            .unwrap()
            .unwrap();
        let Message::Text(text) = msg else { continue };
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        if json["message_type"] == "private" {
            assert_eq!(json["recipient_id"], 1);
        }
        match json["event"]["kind"].as_str() {
            Some("role_reveal") => reveals += 1,
            Some("game_over") => break,
            _ => {}
        }
    }
    assert_eq!(reveals, 1);
}

#[tokio::test]
async fn test_late_connection_replays_own_role_reveal() {
    let state = test_state();
    let app = app::create_app_with_state(state.clone());
    let room_id = create_game(&app, "1v1").await;
    app.clone()
        .oneshot(post_json(
            &format!("/api/room/{}/join", room_id),
            serde_json::json!({"user_id": 2, "name": "Player2"}),
        ))
        .await
        .unwrap();
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/game/{}/start", room_id),
            serde_json::json!({"user_id": 1}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // 開始後に接続しても自分の役職は届く
    let url = format!("ws://{}/api/room/{}/ws?player_id=2", addr, room_id);
    let (mut socket, _) = connect_async(url).await.expect("Failed to connect");

    let mut reveals = 0;
    while let Ok(Some(Ok(msg))) =
        tokio::time::timeout(std::time::Duration::from_secs(5), socket.next()).await
    {
        let Message::Text(text) = msg else { continue };
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        if json["message_type"] == "private" {
            assert_eq!(json["recipient_id"], 2);
        }
        match json["event"]["kind"].as_str() {
            Some("role_reveal") => reveals += 1,
            Some("game_over") => break,
            _ => {}
        }
    }
    assert_eq!(reveals, 1);
}

#[tokio::test]
async fn test_websocket_to_unknown_game_is_refused() {
    let state = test_state();
    let app = app::create_app_with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let url = format!("ws://{}/api/room/G-000-404/ws?player_id=1", addr);
    assert!(connect_async(url).await.is_err());
    assert!(state.channel.lock().await.is_empty());
}
