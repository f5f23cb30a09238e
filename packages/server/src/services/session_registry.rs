use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rand::Rng;
use tokio::sync::{Mutex, MutexGuard, Notify, RwLock};

use mafia_engine::{GameMode, GamePhase, GameSession, GameStatus, PlayerId, Rulebook, SessionId};

use crate::models::chat::{ChatLog, ChatMessage};

/// One live session plus what the server keeps next to it.
pub struct SessionHandle {
    pub game: Mutex<GameSession>,
    pub chat_log: Mutex<ChatLog>,
    /// Signalled on every accepted submission so the phase driver can
    /// re-check whether everyone is in.
    pub submissions: Notify,
}

impl SessionHandle {
    fn new(game: GameSession) -> Self {
        let chat_log = ChatLog::new(game.id().to_string());
        SessionHandle {
            game: Mutex::new(game),
            chat_log: Mutex::new(chat_log),
            submissions: Notify::new(),
        }
    }

    pub async fn record(&self, message: ChatMessage) {
        self.chat_log.lock().await.add_message(message);
    }
}

/// Owns every session, keyed by id.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Arc<SessionHandle>>>,
    counter: AtomicU64,
    /// Held across the live-session check and the join or create it guards.
    membership: Mutex<()>,
    rules: Rulebook,
}

impl SessionRegistry {
    pub fn new(rules: Rulebook) -> Self {
        SessionRegistry {
            sessions: RwLock::new(HashMap::new()),
            counter: AtomicU64::new(0),
            membership: Mutex::new(()),
            rules,
        }
    }

    pub fn rules(&self) -> &Rulebook {
        &self.rules
    }

    fn next_id(&self) -> SessionId {
        let count = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let salt: u32 = rand::thread_rng().gen_range(100..1000);
        format!("G-{}-{}", salt, count)
    }

    pub async fn create(
        &self,
        mode: GameMode,
        creator_id: PlayerId,
        creator_name: String,
        chat_id: i64,
    ) -> Arc<SessionHandle> {
        let id = self.next_id();
        let game = GameSession::new(
            id.clone(),
            mode,
            creator_id,
            creator_name,
            chat_id,
            self.rules.clone(),
        );
        let handle = Arc::new(SessionHandle::new(game));
        self.sessions.write().await.insert(id.clone(), handle.clone());
        log::info!("session {} created ({}) by {}", id, mode, creator_id);
        handle
    }

    pub async fn get(&self, id: &str) -> Option<Arc<SessionHandle>> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn remove(&self, id: &str) -> Option<Arc<SessionHandle>> {
        let removed = self.sessions.write().await.remove(id);
        if removed.is_some() {
            log::info!("session {} removed", id);
        }
        removed
    }

    pub async fn list(&self) -> Vec<Arc<SessionHandle>> {
        self.sessions.read().await.values().cloned().collect()
    }

    pub async fn lock_membership(&self) -> MutexGuard<'_, ()> {
        self.membership.lock().await
    }

    /// The waiting or in-progress session `user_id` belongs to, if any.
    /// Eliminated players still belong to their session until it ends.
    pub async fn live_session_of(&self, user_id: PlayerId) -> Option<SessionId> {
        for handle in self.list().await {
            let game = handle.game.lock().await;
            if !game.is_terminal() && game.player(user_id).is_some() {
                return Some(game.id().to_string());
            }
        }
        None
    }

    /// Finds the in-progress session where `user_id` is alive and the
    /// current phase is `phase`. A player belongs to at most one live
    /// session (see `live_session_of`), so the match is unique.
    pub async fn find_session_for(
        &self,
        user_id: PlayerId,
        phase: GamePhase,
    ) -> Option<Arc<SessionHandle>> {
        let handles = self.list().await;
        for handle in handles {
            let game = handle.game.lock().await;
            if game.status() == GameStatus::InProgress
                && game.phase() == phase
                && game.is_alive_participant(user_id)
            {
                drop(game);
                return Some(handle);
            }
        }
        None
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(Rulebook::default())
    }
}
