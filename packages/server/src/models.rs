pub mod chat;
pub mod config;
pub mod game;
pub mod room;
