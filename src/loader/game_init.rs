//! Match setup from decks
//!
//! Creates a seeded `GameState` from two deck lists and a catalog, then deals
//! the opening hands.

use crate::config::EngineConfig;
use crate::core::Side;
use crate::game::GameState;
use crate::loader::{CardCatalog, DeckList};
use crate::{EngineError, Result};
use std::sync::Arc;

/// Builder for a two-player match
pub struct MatchBuilder {
    catalog: Arc<CardCatalog>,
    config: EngineConfig,
    decks: [Option<DeckList>; 2],
    first: Side,
}

impl MatchBuilder {
    pub fn new(catalog: Arc<CardCatalog>) -> Self {
        MatchBuilder {
            catalog,
            config: EngineConfig::default(),
            decks: [None, None],
            first: Side::Player,
        }
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn deck(mut self, side: Side, deck: DeckList) -> Self {
        self.decks[side.index()] = Some(deck);
        self
    }

    /// Side that takes the first turn
    pub fn first(mut self, side: Side) -> Self {
        self.first = side;
        self
    }

    /// Build the match in the mulligan phase with opening hands dealt
    pub fn build(self) -> Result<GameState> {
        let mut game = GameState::new(self.config, Arc::clone(&self.catalog));
        for side in Side::BOTH {
            let deck = self.decks[side.index()]
                .as_ref()
                .ok_or_else(|| EngineError::DataError(format!("no deck for {side}")))?;
            Self::load_deck(&mut game, &self.catalog, side, deck)?;
        }
        game.begin_match(self.first);
        Ok(game)
    }

    /// Put a deck's cards into `side`'s deck zone
    fn load_deck(game: &mut GameState, catalog: &CardCatalog, side: Side, deck: &DeckList) -> Result<()> {
        if let Some(hero) = &deck.hero {
            game.player_mut(side).hero_name = hero.clone();
        }
        for entry in &deck.cards {
            let definition = catalog.get(entry.id).ok_or_else(|| {
                EngineError::DataError(format!(
                    "deck '{}': card {} not found in catalog",
                    deck.name, entry.id
                ))
            })?;
            for _ in 0..entry.count {
                let card = game.new_instance(Arc::clone(&definition), side);
                game.player_mut(side).deck.push(card);
            }
        }
        let size = game.player(side).deck.len();
        if size != game.config.deck_size {
            tracing::debug!(deck = %deck.name, size, expected = game.config.deck_size, "deck size differs from configured size");
        }
        Ok(())
    }
}
