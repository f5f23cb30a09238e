pub mod game_service;
pub mod player_service;
pub mod room_service;
pub mod session_registry;
