//! Rules and state machine for a game of Mafia.
//!
//! Everything here is synchronous and free of I/O: a [`GameSession`] takes
//! player input, resolves nights and days through the services in
//! [`Rulebook`], and reports what happened. Timers, transport and persistence
//! live in the server.

pub mod error;
pub mod models;
pub mod registry;
pub mod rules;

pub use error::*;
pub use models::*;
pub use registry::*;
pub use rules::*;
