use std::{collections::HashMap, sync::Arc};
use tokio::sync::{broadcast, Mutex};

use mafia_engine::PlayerId;

use crate::models::chat::{ChatMessage, GameEvent};
use crate::models::config::GameConfig;
use crate::services::player_service::{InMemoryProgression, ProgressionStore};
use crate::services::session_registry::{SessionHandle, SessionRegistry};

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub progression: Arc<dyn ProgressionStore>,
    pub channel: Arc<Mutex<HashMap<String, broadcast::Sender<ChatMessage>>>>,
    pub config: Arc<GameConfig>,
}

impl AppState {
    pub fn new(config: GameConfig) -> Self {
        Self::with_progression(config, Arc::new(InMemoryProgression::new()))
    }

    pub fn with_progression(config: GameConfig, progression: Arc<dyn ProgressionStore>) -> Self {
        AppState {
            registry: Arc::new(SessionRegistry::default()),
            progression,
            channel: Arc::new(Mutex::new(HashMap::new())),
            config: Arc::new(config),
        }
    }

    pub async fn get_or_create_session_channel(
        &self,
        session_id: &str,
    ) -> broadcast::Sender<ChatMessage> {
        let mut channels = self.channel.lock().await;
        if let Some(channel) = channels.get(session_id) {
            channel.clone()
        } else {
            let (tx, _) = broadcast::channel(1000);
            channels.insert(session_id.to_string(), tx.clone());
            tx
        }
    }

    pub async fn remove_session_channel(&self, session_id: &str) {
        self.channel.lock().await.remove(session_id);
    }

    /// Appends `message` to the session log and pushes it to every
    /// subscriber. Nobody listening is not an error, and a session whose
    /// feed is already closed only gets the log entry.
    pub async fn publish(&self, handle: &SessionHandle, message: ChatMessage) {
        handle.record(message.clone()).await;
        let tx = self.channel.lock().await.get(&message.session_id).cloned();
        let Some(tx) = tx else {
            log::debug!("feed for {} is closed", message.session_id);
            return;
        };
        if tx.send(message).is_err() {
            log::debug!("no websocket subscribers for this session");
        }
    }

    pub async fn broadcast_event(
        &self,
        handle: &SessionHandle,
        session_id: &str,
        event: GameEvent,
    ) {
        self.publish(handle, ChatMessage::system(session_id, event))
            .await;
    }

    pub async fn send_private(
        &self,
        handle: &SessionHandle,
        session_id: &str,
        recipient: PlayerId,
        event: GameEvent,
    ) {
        self.publish(handle, ChatMessage::private(session_id, recipient, event))
            .await;
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}
