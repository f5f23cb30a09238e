use serde::{Deserialize, Serialize};

use super::role::RoleId;

pub type PlayerId = u64;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub user_id: PlayerId,
    pub name: String,
    pub role: Option<RoleId>,
    pub alive: bool,
    // per-round flags
    pub protected: bool,
    pub investigated: bool,
    pub last_protected_target: Option<PlayerId>,
    pub items_used: Vec<String>,
}

impl Player {
    pub fn new(user_id: PlayerId, name: String) -> Self {
        Self {
            user_id,
            name,
            role: None,
            alive: true,
            protected: false,
            investigated: false,
            last_protected_target: None,
            items_used: Vec::new(),
        }
    }

    pub fn eliminate(&mut self) {
        self.alive = false;
    }
}
