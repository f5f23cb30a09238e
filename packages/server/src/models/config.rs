use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use mafia_engine::GameMode;

#[derive(Debug, Clone)]
pub struct GameConfig {
    pub bind_addr: SocketAddr,
    pub allowed_origin: String,
    // 全フェーズ共通の秒数。未設定ならモードごとの既定値を使う
    pub phase_duration_override: Option<Duration>,
    // 全員が提出したらタイマーを待たずに解決するかどうか
    pub early_resolution: bool,
    // 進行中のゲームでも役職を状態APIに表示するかどうか
    pub show_player_roles: bool,
    // 結果発表から次フェーズまでの間
    pub phase_pause: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            allowed_origin: "http://localhost:3000".to_string(),
            phase_duration_override: None,
            early_resolution: false,
            show_player_roles: false,
            phase_pause: Duration::from_secs(2),
        }
    }
}

impl GameConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_addr = env::var("BIND_ADDR")
            .ok()
            .and_then(|v| v.parse::<SocketAddr>().ok())
            .unwrap_or(defaults.bind_addr);
        let allowed_origin = env::var("ALLOWED_ORIGIN").unwrap_or(defaults.allowed_origin);
        let phase_duration_override = env::var("PHASE_DURATION_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs);
        let early_resolution = env::var("EARLY_RESOLUTION")
            .map(|v| v == "true")
            .unwrap_or(false);
        let show_player_roles = env::var("SHOW_PLAYER_ROLES")
            .map(|v| v == "true")
            .unwrap_or(false);
        let phase_pause = env::var("PHASE_PAUSE_MILLIS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.phase_pause);

        Self {
            bind_addr,
            allowed_origin,
            phase_duration_override,
            early_resolution,
            show_player_roles,
            phase_pause,
        }
    }

    pub fn night_duration(&self, mode: GameMode) -> Duration {
        self.phase_duration_override
            .unwrap_or(mode.settings().night_duration)
    }

    pub fn day_duration(&self, mode: GameMode) -> Duration {
        self.phase_duration_override
            .unwrap_or(mode.settings().day_duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_durations_follow_mode_unless_overridden() {
        let config = GameConfig::default();
        assert_eq!(config.night_duration(GameMode::FiveVsFive), Duration::from_secs(60));
        assert_eq!(config.day_duration(GameMode::OneVsOne), Duration::from_secs(45));

        let config = GameConfig {
            phase_duration_override: Some(Duration::from_secs(5)),
            ..GameConfig::default()
        };
        assert_eq!(config.night_duration(GameMode::FiveVsFive), Duration::from_secs(5));
        assert_eq!(config.day_duration(GameMode::FiveVsFive), Duration::from_secs(5));
    }
}
