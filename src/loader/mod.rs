//! Card catalog, deck lists and match setup

pub mod catalog;
pub mod deck;
pub mod game_init;

pub use catalog::{CardCatalog, LoadReport, SkippedEntry, THE_COIN_ID};
pub use deck::{DeckEntry, DeckList, DeckLoader};
pub use game_init::MatchBuilder;
