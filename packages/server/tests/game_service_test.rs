use std::sync::Arc;
use std::time::Duration;

use mafia_engine::{
    GameMode, GamePhase, GameStatus, NightActionKind, PlayerId, RoleId, VoteChoice, Winner,
};

use mafia_server::{
    models::{
        chat::{ChatMessageType, GameEvent},
        config::GameConfig,
        game::{NightActionRequest, StartGameRequest, VoteRequest},
        room::{CreateGameRequest, JoinGameRequest},
    },
    services::{
        game_service, game_service::GameServiceError, room_service, session_registry::SessionHandle,
    },
    state::AppState,
    utils::test_setup::{setup_test_env, test_state},
};

/// テスト用のゲームを作成して `players` 人まで参加させる
async fn setup_lobby(state: &AppState, mode: GameMode, players: PlayerId) -> String {
    setup_lobby_from(state, mode, 1, players).await
}

/// Same as `setup_lobby`, with user ids `first..first + players`.
async fn setup_lobby_from(
    state: &AppState,
    mode: GameMode,
    first: PlayerId,
    players: PlayerId,
) -> String {
    let session_id = room_service::create_room(
        state,
        CreateGameRequest {
            mode,
            creator_id: first,
            creator_name: format!("Player{}", first),
            chat_id: -100,
        },
    )
    .await
    .unwrap();
    for id in first + 1..first + players {
        room_service::join_room(
            state,
            &session_id,
            JoinGameRequest {
                user_id: id,
                name: format!("Player{}", id),
            },
        )
        .await
        .unwrap();
    }
    session_id
}

async fn handle(state: &AppState, session_id: &str) -> Arc<SessionHandle> {
    state.registry.get(session_id).await.unwrap()
}

async fn players_with(handle: &SessionHandle, role: RoleId) -> Vec<PlayerId> {
    handle
        .game
        .lock()
        .await
        .players()
        .iter()
        .filter(|p| p.alive && p.role == Some(role))
        .map(|p| p.user_id)
        .collect()
}

/// Polls until `pred` holds or five seconds pass.
async fn wait_until<F>(handle: &SessionHandle, pred: F)
where
    F: Fn(&mafia_engine::GameSession) -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        if pred(&*handle.game.lock().await) {
            return;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_one_vs_one_finishes_and_books_rewards() {
    let state = test_state();
    let session_id = setup_lobby(&state, GameMode::OneVsOne, 2).await;

    let view = game_service::start_game(state.clone(), &session_id, StartGameRequest { user_id: 1 })
        .await
        .unwrap();
    assert_eq!(view.phase, GamePhase::Night);
    assert!(view.players.iter().all(|p| p.role.is_none()));

    let handle = handle(&state, &session_id).await;
    let mafia = players_with(&handle, RoleId::Mafia).await[0];
    let detective = players_with(&handle, RoleId::Detective).await[0];

    // 1対1は最初の夜でマフィア勝利
    wait_until(&handle, |g| g.status() == GameStatus::Finished).await;
    assert_eq!(handle.game.lock().await.winner(), Some(Winner::Mafia));

    // GameOverの配信までは少し待つ
    tokio::time::sleep(Duration::from_millis(50)).await;

    let winner = state.progression.get_player(mafia).unwrap().unwrap();
    assert_eq!(winner.wins, 1);
    assert_eq!(winner.games_played, 1);
    assert_eq!(winner.xp, 75 + 100 + 50 + 10);
    assert_eq!(winner.coins, 100 + 50 + 50 + 25);
    assert_eq!(winner.favorite_role, Some(RoleId::Mafia));

    let loser = state.progression.get_player(detective).unwrap().unwrap();
    assert_eq!(loser.losses, 1);
    assert_eq!(loser.games_played, 1);
    assert_eq!(loser.xp, 75 + 50 + 10);
    assert_eq!(loser.coins, 100 + 50 + 25);

    let summary = game_service::get_summary(state.clone(), session_id.clone())
        .await
        .unwrap();
    assert_eq!(summary.winner, Some(Winner::Mafia));
    assert!(summary.players.iter().all(|p| p.role.is_some()));

    // 報酬は一度だけ
    let log = handle.chat_log.lock().await;
    let game_overs = log
        .messages
        .iter()
        .filter(|m| matches!(m.event, GameEvent::GameOver { .. }))
        .count();
    assert_eq!(game_overs, 1);
    assert!(handle.game.lock().await.settle_rewards().is_none());
    assert!(!state.channel.lock().await.contains_key(&session_id));
}

#[tokio::test]
async fn test_role_reveals_are_private() {
    let state = test_state();
    let session_id = setup_lobby(&state, GameMode::OneVsOne, 2).await;
    game_service::start_game(state.clone(), &session_id, StartGameRequest { user_id: 1 })
        .await
        .unwrap();

    let handle = handle(&state, &session_id).await;
    let log = handle.chat_log.lock().await;
    let reveals: Vec<_> = log
        .messages
        .iter()
        .filter(|m| matches!(m.event, GameEvent::RoleReveal { .. }))
        .collect();
    assert_eq!(reveals.len(), 2);
    assert!(reveals
        .iter()
        .all(|m| m.message_type == ChatMessageType::Private && m.recipient_id.is_some()));
    let own_reveals = log
        .visible_to(Some(1))
        .iter()
        .filter(|m| matches!(m.event, GameEvent::RoleReveal { .. }))
        .count();
    assert_eq!(own_reveals, 1);
}

#[tokio::test]
async fn test_night_resolves_early_once_everyone_acted() {
    setup_test_env();
    let state = AppState::new(GameConfig {
        phase_duration_override: Some(Duration::from_secs(30)),
        early_resolution: true,
        phase_pause: Duration::from_millis(10),
        ..GameConfig::default()
    });
    let session_id = setup_lobby(&state, GameMode::FiveVsFive, 10).await;
    game_service::start_game(state.clone(), &session_id, StartGameRequest { user_id: 1 })
        .await
        .unwrap();

    let handle = handle(&state, &session_id).await;
    let mafia = players_with(&handle, RoleId::Mafia).await;
    let detective = players_with(&handle, RoleId::Detective).await[0];
    let doctor = players_with(&handle, RoleId::Doctor).await[0];
    let villagers = players_with(&handle, RoleId::Villager).await;
    let victim = villagers[0];

    game_service::submit_night_action(
        state.clone(),
        NightActionRequest {
            user_id: mafia[0],
            kind: NightActionKind::Kill,
            target_id: victim,
        },
    )
    .await
    .unwrap();
    game_service::submit_night_action(
        state.clone(),
        NightActionRequest {
            user_id: doctor,
            kind: NightActionKind::Protect,
            target_id: villagers[1],
        },
    )
    .await
    .unwrap();
    let accepted = game_service::submit_night_action(
        state.clone(),
        NightActionRequest {
            user_id: detective,
            kind: NightActionKind::Investigate,
            target_id: mafia[1],
        },
    )
    .await
    .unwrap();
    assert_eq!(accepted.session_id, session_id);

    wait_until(&handle, |g| g.phase() == GamePhase::Day).await;
    {
        let game = handle.game.lock().await;
        assert!(!game.player(victim).unwrap().alive);
        assert_eq!(game.round(), 1);
    }

    // 結果の配信を待つ
    tokio::time::sleep(Duration::from_millis(50)).await;
    {
        let log = handle.chat_log.lock().await;
        let investigation = log
            .visible_to(Some(detective))
            .into_iter()
            .find(|m| matches!(m.event, GameEvent::InvestigationResult { .. }))
            .expect("detective should get a result");
        assert_eq!(investigation.recipient_id, Some(detective));
        assert!(log
            .visible_to(Some(victim))
            .iter()
            .all(|m| !matches!(m.event, GameEvent::InvestigationResult { .. })));
        assert!(log.messages.iter().any(|m| matches!(
            &m.event,
            GameEvent::NightResult { eliminated: Some(p), .. } if p.user_id == victim
        )));
    }

    // 全員棄権で昼を終える
    let alive: Vec<PlayerId> = handle
        .game
        .lock()
        .await
        .alive_players()
        .map(|p| p.user_id)
        .collect();
    for voter in alive {
        game_service::submit_vote(
            state.clone(),
            VoteRequest {
                user_id: voter,
                target: VoteChoice::Abstain,
            },
        )
        .await
        .unwrap();
    }
    wait_until(&handle, |g| g.phase() == GamePhase::Night && g.round() == 2).await;
    assert_eq!(handle.game.lock().await.alive_players().count(), 9);
}

#[tokio::test]
async fn test_submissions_need_an_active_session() {
    let state = test_state();
    let session_id = setup_lobby(&state, GameMode::FiveVsFive, 3).await;

    let err = game_service::submit_night_action(
        state.clone(),
        NightActionRequest {
            user_id: 1,
            kind: NightActionKind::Kill,
            target_id: 2,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, GameServiceError::NoActiveSession));

    let err = game_service::start_game(state.clone(), &session_id, StartGameRequest { user_id: 1 })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GameServiceError::Game(mafia_engine::GameError::NotEnoughPlayers { required: 10 })
    ));
    assert_eq!(
        handle(&state, &session_id).await.game.lock().await.status(),
        GameStatus::Waiting
    );
}

#[tokio::test]
async fn test_driver_aborts_a_session_found_in_the_wrong_phase() {
    setup_test_env();
    let state = AppState::new(GameConfig {
        phase_duration_override: Some(Duration::from_secs(30)),
        phase_pause: Duration::from_millis(10),
        ..GameConfig::default()
    });
    let broken_id = setup_lobby_from(&state, GameMode::FiveVsFive, 1, 10).await;
    let healthy_id = setup_lobby_from(&state, GameMode::FiveVsFive, 11, 10).await;
    game_service::start_game(state.clone(), &healthy_id, StartGameRequest { user_id: 11 })
        .await
        .unwrap();

    let broken = handle(&state, &broken_id).await;
    {
        // 誰も行動しない夜を済ませて昼にしておく
        let mut game = broken.game.lock().await;
        game.start(1).unwrap();
        game.resolve_night().unwrap();
        assert_eq!(game.phase(), GamePhase::Day);
    }

    // 夜から始めるドライバーに昼のセッションを渡す
    game_service::run_game(state.clone(), broken.clone(), broken_id.clone()).await;

    assert_eq!(broken.game.lock().await.status(), GameStatus::Aborted);
    assert!(broken
        .chat_log
        .lock()
        .await
        .messages
        .iter()
        .any(|m| matches!(m.event, GameEvent::GameAborted { .. })));
    assert!(!state.channel.lock().await.contains_key(&broken_id));

    let healthy = handle(&state, &healthy_id).await;
    assert_eq!(healthy.game.lock().await.status(), GameStatus::InProgress);
    assert!(state.channel.lock().await.contains_key(&healthy_id));
}
