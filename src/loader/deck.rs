//! Deck list loader (JSON)
//!
//! `{"name": "...", "hero": "...", "cards": [{"id": 12, "count": 2}, ...]}`

use crate::core::CardId;
use crate::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One line of a deck list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckEntry {
    pub id: CardId,
    #[serde(default = "one")]
    pub count: u8,
}

fn one() -> u8 {
    1
}

/// A complete deck list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckList {
    pub name: String,
    #[serde(default)]
    pub hero: Option<String>,
    pub cards: Vec<DeckEntry>,
}

impl DeckList {
    pub fn total_cards(&self) -> usize {
        self.cards.iter().map(|e| e.count as usize).sum()
    }
}

/// Deck loader for JSON deck lists
pub struct DeckLoader;

impl DeckLoader {
    pub fn load_from_file(path: &Path) -> Result<DeckList> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a deck from its JSON text
    pub fn parse(content: &str) -> Result<DeckList> {
        let deck: DeckList = serde_json::from_str(content)?;
        if deck.total_cards() == 0 {
            return Err(EngineError::DataError(format!("deck '{}' is empty", deck.name)));
        }
        Ok(deck)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_deck() {
        let deck = DeckLoader::parse(
            r#"{"name": "Shield Wall", "hero": "Brynhild", "cards": [{"id": 1, "count": 2}, {"id": 7}]}"#,
        )
        .unwrap();
        assert_eq!(deck.name, "Shield Wall");
        assert_eq!(deck.hero.as_deref(), Some("Brynhild"));
        assert_eq!(deck.total_cards(), 3);
        assert_eq!(deck.cards[1].count, 1);
    }

    #[test]
    fn test_empty_deck_rejected() {
        let result = DeckLoader::parse(r#"{"name": "Nothing", "cards": []}"#);
        assert!(matches!(result, Err(EngineError::DataError(_))));
    }
}
