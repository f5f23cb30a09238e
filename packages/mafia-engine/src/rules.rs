use std::sync::Arc;

use crate::registry::RoleRegistry;

pub mod day_voting;
pub mod night_resolution;
pub mod rewards;
pub mod role_assignment;
pub mod winning_judgement;

pub use day_voting::*;
pub use night_resolution::*;
pub use rewards::*;
pub use role_assignment::*;
pub use winning_judgement::*;

/// The stateless services a session delegates to. Built once and handed to
/// every `GameSession`.
#[derive(Debug, Clone)]
pub struct Rulebook {
    pub registry: Arc<RoleRegistry>,
    pub assigner: RoleAssigner,
    pub night: NightResolver,
    pub day: DayResolver,
    pub judge: WinConditionEvaluator,
}

impl Rulebook {
    pub fn new(registry: Arc<RoleRegistry>) -> Self {
        Self {
            registry,
            assigner: RoleAssigner::new(),
            night: NightResolver::new(),
            day: DayResolver::new(),
            judge: WinConditionEvaluator::new(),
        }
    }
}

impl Default for Rulebook {
    fn default() -> Self {
        Self::new(Arc::new(RoleRegistry::standard()))
    }
}
