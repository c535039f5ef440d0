//! Norse CCG - combat and trigger-resolution engine for a two-player card game
//!
//! The engine owns one `GameState` per match. Inbound actions (play a card,
//! attack, end the turn) resolve completely, including every trigger they
//! cascade into, before control returns. State changes are recorded in the
//! game log and published on an event bus for presentation subscribers.

pub mod ai;
pub mod config;
pub mod core;
pub mod error;
pub mod events;
pub mod game;
pub mod loader;
pub mod quest;
pub mod zones;

pub use error::{ActionRejection, EngineError, Result};
