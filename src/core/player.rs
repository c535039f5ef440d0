//! Per-side player state

use crate::core::{
    ArtifactRuntimeState, CardInstance, Effect, EffectSlot, InstanceId, ManaPool, Side, TokenSpec,
};
use crate::quest::ActiveQuest;
use serde::{Deserialize, Serialize};

/// A hero power: a cheap, once-per-turn ability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroPower {
    pub name: String,
    #[serde(default = "default_hero_power_cost")]
    pub cost: u8,
    #[serde(default)]
    pub requires_target: bool,
    #[serde(default)]
    pub effects: Vec<EffectSlot>,
    #[serde(default)]
    pub used: bool,
}

fn default_hero_power_cost() -> u8 {
    2
}

impl Default for HeroPower {
    /// Summon a 1/1 Einherjar
    fn default() -> Self {
        HeroPower {
            name: "Reinforce".to_string(),
            cost: default_hero_power_cost(),
            requires_target: false,
            effects: vec![EffectSlot::Known(Effect::Summon {
                token: TokenSpec {
                    id: None,
                    name: "Einherjar Recruit".to_string(),
                    attack: 1,
                    health: 1,
                    keywords: Default::default(),
                    race: None,
                },
                count: 1,
                for_enemy: false,
            })],
            used: false,
        }
    }
}

/// Everything one side owns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub side: Side,
    pub hero_name: String,

    pub hero_health: i32,
    pub max_health: i32,
    pub hero_armor: i32,

    pub mana: ManaPool,

    pub hand: Vec<CardInstance>,
    pub deck: Vec<CardInstance>,
    pub battlefield: Vec<CardInstance>,
    pub graveyard: Vec<CardInstance>,

    pub artifact: Option<CardInstance>,
    pub artifact_state: Option<ArtifactRuntimeState>,
    pub secrets: Vec<CardInstance>,

    pub active_quests: Vec<ActiveQuest>,
    pub completed_quests: Vec<ActiveQuest>,

    pub hero_power: HeroPower,

    pub cards_played_this_turn: u32,
    pub hero_attacks_this_turn: u8,
    pub fatigue_counter: i32,
    pub mulligan_done: bool,
}

impl PlayerState {
    pub fn new(side: Side, hero_name: impl Into<String>, starting_health: i32) -> Self {
        PlayerState {
            side,
            hero_name: hero_name.into(),
            hero_health: starting_health,
            max_health: starting_health,
            hero_armor: 0,
            mana: ManaPool::default(),
            hand: Vec::new(),
            deck: Vec::new(),
            battlefield: Vec::new(),
            graveyard: Vec::new(),
            artifact: None,
            artifact_state: None,
            secrets: Vec::new(),
            active_quests: Vec::new(),
            completed_quests: Vec::new(),
            hero_power: HeroPower::default(),
            cards_played_this_turn: 0,
            hero_attacks_this_turn: 0,
            fatigue_counter: 0,
            mulligan_done: false,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.hero_health <= 0
    }

    pub fn hand_index(&self, id: InstanceId) -> Option<usize> {
        self.hand.iter().position(|c| c.instance_id == id)
    }

    pub fn board_index(&self, id: InstanceId) -> Option<usize> {
        self.battlefield.iter().position(|c| c.instance_id == id)
    }

    pub fn minion(&self, id: InstanceId) -> Option<&CardInstance> {
        self.battlefield.iter().find(|c| c.instance_id == id)
    }

    pub fn minion_mut(&mut self, id: InstanceId) -> Option<&mut CardInstance> {
        self.battlefield.iter_mut().find(|c| c.instance_id == id)
    }

    pub fn has_taunt(&self) -> bool {
        self.battlefield.iter().any(|m| m.is_taunt && m.is_alive())
    }

    /// Friendly minions that died this game, oldest first
    pub fn dead_minions(&self) -> impl Iterator<Item = &CardInstance> {
        self.graveyard.iter().filter(|c| c.definition.is_minion())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_player_defaults() {
        let p = PlayerState::new(Side::Player, "Sigrun", 30);
        assert_eq!(p.hero_health, 30);
        assert_eq!(p.max_health, 30);
        assert_eq!(p.hero_power.cost, 2);
        assert!(!p.is_dead());
        assert!(p.artifact.is_none());
    }
}
