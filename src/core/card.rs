//! Card definitions and runtime card instances

use crate::core::{
    ArtifactSpec, Aura, CardId, EffectSlot, GateBook, InstanceId, Race, Side, TriggeredEffect,
};
use crate::quest::QuestSpec;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::sync::Arc;

/// Card types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    Minion,
    Spell,
    Weapon,
    Artifact,
    Secret,
    Quest,
}

impl CardKind {
    /// Weapons and artifacts both occupy the single artifact slot
    pub fn is_equippable(self) -> bool {
        matches!(self, CardKind::Weapon | CardKind::Artifact)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    #[default]
    Common,
    Rare,
    Epic,
    Legendary,
}

/// Minion keywords
///
/// Unknown keyword strings in catalog data deserialize to `Unknown` and have
/// no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Keyword {
    Taunt,
    DivineShield,
    Lifesteal,
    Rush,
    Charge,
    Stealth,
    Windfury,
    Poisonous,
    #[serde(other)]
    Unknown,
}

/// Immutable catalog definition of a card
///
/// Shared between every instance through an `Arc`; gameplay never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDefinition {
    pub id: CardId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CardKind,
    #[serde(default)]
    pub mana_cost: u8,
    #[serde(default)]
    pub attack: i32,
    #[serde(default)]
    pub health: i32,
    /// Weapon durability; treated as 1 by the evaluator when absent
    #[serde(default)]
    pub durability: Option<i32>,
    #[serde(default)]
    pub rarity: Rarity,
    #[serde(default)]
    pub race: Option<Race>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub keywords: SmallVec<[Keyword; 4]>,
    #[serde(default)]
    pub battlecry: Vec<EffectSlot>,
    #[serde(default)]
    pub deathrattle: Vec<EffectSlot>,
    /// Effects resolved when a spell is cast
    #[serde(default)]
    pub spell_effects: Vec<EffectSlot>,
    #[serde(default)]
    pub aura: Option<Aura>,
    #[serde(default)]
    pub triggers: Vec<TriggeredEffect>,
    #[serde(default)]
    pub overload: u8,
    #[serde(default)]
    pub requires_target: bool,
    #[serde(default)]
    pub quest: Option<QuestSpec>,
    #[serde(default)]
    pub artifact: Option<ArtifactSpec>,
    #[serde(default = "default_collectible")]
    pub collectible: bool,
}

fn default_collectible() -> bool {
    true
}

impl CardDefinition {
    /// A bare definition with no effects, mostly useful for tokens and tests
    pub fn new(id: CardId, name: impl Into<String>, kind: CardKind, mana_cost: u8) -> Self {
        CardDefinition {
            id,
            name: name.into(),
            kind,
            mana_cost,
            attack: 0,
            health: 0,
            durability: None,
            rarity: Rarity::Common,
            race: None,
            description: String::new(),
            keywords: SmallVec::new(),
            battlecry: Vec::new(),
            deathrattle: Vec::new(),
            spell_effects: Vec::new(),
            aura: None,
            triggers: Vec::new(),
            overload: 0,
            requires_target: false,
            quest: None,
            artifact: None,
            collectible: true,
        }
    }

    pub fn minion(id: u32, name: impl Into<String>, mana_cost: u8, attack: i32, health: i32) -> Self {
        let mut def = CardDefinition::new(CardId::new(id), name, CardKind::Minion, mana_cost);
        def.attack = attack;
        def.health = health;
        def
    }

    pub fn spell(id: u32, name: impl Into<String>, mana_cost: u8) -> Self {
        CardDefinition::new(CardId::new(id), name, CardKind::Spell, mana_cost)
    }

    pub fn with_keywords(mut self, keywords: &[Keyword]) -> Self {
        self.keywords = keywords.iter().copied().collect();
        self
    }

    pub fn has_keyword(&self, keyword: Keyword) -> bool {
        self.keywords.contains(&keyword)
    }

    pub fn is_minion(&self) -> bool {
        self.kind == CardKind::Minion
    }

    pub fn has_deathrattle(&self) -> bool {
        !self.deathrattle.is_empty()
    }
}

/// A card in play (or in a hand/deck/graveyard) with its mutable runtime stats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardInstance {
    pub instance_id: InstanceId,
    pub definition: Arc<CardDefinition>,
    pub owner: Side,

    pub current_attack: i32,
    pub current_health: i32,
    /// Cap for healing; raised by health buffs
    pub max_health: i32,

    pub is_summoning_sick: bool,
    pub can_attack: bool,
    pub attacks_performed: u8,
    pub is_frozen: bool,
    /// Turn number on which the freeze was applied
    pub frozen_on_turn: Option<u32>,

    pub is_stealth: bool,
    pub has_divine_shield: bool,
    pub has_lifesteal: bool,
    pub is_taunt: bool,
    pub has_rush: bool,
    pub has_charge: bool,
    pub has_windfury: bool,
    pub has_poisonous: bool,

    pub is_silenced: bool,
    /// Added to the printed mana cost (negative for discounts)
    pub cost_modifier: i32,
    /// Created by an effect rather than starting in the deck
    pub is_generated: bool,

    pub gates: GateBook,
}

impl CardInstance {
    pub fn new(instance_id: InstanceId, definition: Arc<CardDefinition>, owner: Side) -> Self {
        let mut card = CardInstance {
            instance_id,
            current_attack: definition.attack,
            current_health: definition.health,
            max_health: definition.health,
            owner,
            is_summoning_sick: false,
            can_attack: false,
            attacks_performed: 0,
            is_frozen: false,
            frozen_on_turn: None,
            is_stealth: false,
            has_divine_shield: false,
            has_lifesteal: false,
            is_taunt: false,
            has_rush: false,
            has_charge: false,
            has_windfury: false,
            has_poisonous: false,
            is_silenced: false,
            cost_modifier: 0,
            is_generated: false,
            gates: GateBook::default(),
            definition,
        };
        let keywords = card.definition.keywords.clone();
        for keyword in keywords {
            card.set_keyword(keyword, true);
        }
        card
    }

    pub fn card_id(&self) -> CardId {
        self.definition.id
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn kind(&self) -> CardKind {
        self.definition.kind
    }

    /// Printed cost plus modifiers, never below zero
    pub fn mana_cost(&self) -> u8 {
        (self.definition.mana_cost as i32 + self.cost_modifier).clamp(0, u8::MAX as i32) as u8
    }

    pub fn is_alive(&self) -> bool {
        self.current_health > 0
    }

    pub fn is_damaged(&self) -> bool {
        self.current_health < self.max_health
    }

    pub fn has_keyword(&self, keyword: Keyword) -> bool {
        match keyword {
            Keyword::Taunt => self.is_taunt,
            Keyword::DivineShield => self.has_divine_shield,
            Keyword::Lifesteal => self.has_lifesteal,
            Keyword::Rush => self.has_rush,
            Keyword::Charge => self.has_charge,
            Keyword::Stealth => self.is_stealth,
            Keyword::Windfury => self.has_windfury,
            Keyword::Poisonous => self.has_poisonous,
            Keyword::Unknown => false,
        }
    }

    pub fn set_keyword(&mut self, keyword: Keyword, value: bool) {
        match keyword {
            Keyword::Taunt => self.is_taunt = value,
            Keyword::DivineShield => self.has_divine_shield = value,
            Keyword::Lifesteal => self.has_lifesteal = value,
            Keyword::Rush => self.has_rush = value,
            Keyword::Charge => self.has_charge = value,
            Keyword::Stealth => self.is_stealth = value,
            Keyword::Windfury => self.has_windfury = value,
            Keyword::Poisonous => self.has_poisonous = value,
            Keyword::Unknown => {}
        }
    }

    pub fn max_attacks_per_turn(&self) -> u8 {
        if self.has_windfury {
            2
        } else {
            1
        }
    }

    /// Strip keywords, triggers, deathrattle and aura; current stats stay
    pub fn silence(&mut self) {
        for keyword in [
            Keyword::Taunt,
            Keyword::DivineShield,
            Keyword::Lifesteal,
            Keyword::Rush,
            Keyword::Charge,
            Keyword::Stealth,
            Keyword::Windfury,
            Keyword::Poisonous,
        ] {
            self.set_keyword(keyword, false);
        }
        self.is_frozen = false;
        self.frozen_on_turn = None;
        self.is_silenced = true;
    }

    pub fn triggers(&self) -> &[TriggeredEffect] {
        if self.is_silenced {
            &[]
        } else {
            &self.definition.triggers
        }
    }

    pub fn deathrattle(&self) -> &[EffectSlot] {
        if self.is_silenced {
            &[]
        } else {
            &self.definition.deathrattle
        }
    }

    pub fn aura(&self) -> Option<&Aura> {
        if self.is_silenced {
            None
        } else {
            self.definition.aura.as_ref()
        }
    }

    /// Fresh copy of the printed card under a new id, as returned to hand or deck
    pub fn reset_copy(&self, instance_id: InstanceId) -> CardInstance {
        let mut copy = CardInstance::new(instance_id, Arc::clone(&self.definition), self.owner);
        copy.is_generated = self.is_generated;
        copy
    }
}
