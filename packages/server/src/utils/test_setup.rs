use dotenvy::dotenv;
use std::sync::Once;
use std::time::Duration;

use crate::models::config::GameConfig;
use crate::state::AppState;

static INIT: Once = Once::new();

pub fn setup_test_env() {
    INIT.call_once(|| {
        dotenv().ok();
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// Short phases with early resolution on, so games finish within a test.
pub fn test_config() -> GameConfig {
    GameConfig {
        phase_duration_override: Some(Duration::from_millis(200)),
        early_resolution: true,
        phase_pause: Duration::from_millis(10),
        ..GameConfig::default()
    }
}

pub fn test_state() -> AppState {
    setup_test_env();
    AppState::new(test_config())
}
