//! Engine configuration
//!
//! Every field has a default, so a config file only needs the values it
//! changes.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub starting_health: i32,
    pub max_mana: u8,
    pub hand_cap: usize,
    pub battlefield_cap: usize,
    pub secret_cap: usize,
    /// Opening hand of the side that goes first
    pub first_hand_size: usize,
    /// Opening hand of the side that goes second (also receives the coin)
    pub second_hand_size: usize,
    pub deck_size: usize,
    pub hero_power_cost: u8,
    /// Bound on nested trigger resolution
    pub max_cascade_depth: u32,
    /// Events kept in the bus history
    pub event_history_cap: usize,
    /// Delay between automated actions
    pub ai_action_delay_ms: u64,
    /// Upper bound on one automated turn
    pub ai_turn_timeout_ms: u64,
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            starting_health: 30,
            max_mana: 10,
            hand_cap: 10,
            battlefield_cap: 7,
            secret_cap: 5,
            first_hand_size: 3,
            second_hand_size: 4,
            deck_size: 30,
            hero_power_cost: 2,
            max_cascade_depth: 32,
            event_history_cap: 200,
            ai_action_delay_ms: 0,
            ai_turn_timeout_ms: 10_000,
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
