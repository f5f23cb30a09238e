pub mod action;
pub mod game;
pub mod mode;
pub mod player;
pub mod role;

pub use action::*;
pub use game::*;
pub use mode::*;
pub use player::*;
pub use role::*;
