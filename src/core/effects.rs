//! Declarative effect descriptors
//!
//! Cards and artifacts describe what they do as plain data: an `Effect` is a
//! closed enum tagged by its `type` field, grouped under a `Trigger` key in a
//! `TriggeredEffect`. The interpreter in `game::interpreter` matches these
//! exhaustively. Descriptors whose tag is not part of the enum survive loading
//! as `EffectSlot::Unrecognized` so one bad entry never poisons a card.

use crate::core::{CardId, CardKind, Keyword, Race};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A numeric amount, either fixed or read from the resolution context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Fixed(i32),
    Dynamic(DynamicAmount),
}

impl From<i32> for Amount {
    fn from(value: i32) -> Self {
        Amount::Fixed(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DynamicAmount {
    /// The numeric payload of the trigger (e.g. damage taken for `onHeroDamaged`)
    TriggerValue,
    FriendlyMinionCount,
    EnemyMinionCount,
    /// Current value of the owner's artifact counter of the same name
    Souls,
    Venom,
    Seeds,
}

/// Which characters an effect touches
///
/// Resolved against the live board at the moment the effect runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// The target picked by the player when the card was played
    Chosen,
    /// The character the trigger is about (played minion, attack target, ...)
    Subject,
    /// The minion carrying this effect
    #[serde(rename = "self")]
    SelfMinion,
    EnemyHero,
    FriendlyHero,
    RandomEnemyMinion,
    RandomFriendlyMinion,
    RandomEnemyCharacter,
    AllEnemyMinions,
    AllFriendlyMinions,
    OtherFriendlyMinions,
    AllMinions,
    AllEnemies,
    AllFriendlyCharacters,
    MostDamagedFriendly,
}

/// Inline token definition for summon effects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenSpec {
    #[serde(default)]
    pub id: Option<CardId>,
    pub name: String,
    pub attack: i32,
    pub health: i32,
    #[serde(default)]
    pub keywords: SmallVec<[Keyword; 4]>,
    #[serde(default)]
    pub race: Option<Race>,
}

/// Per-artifact counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Counter {
    Souls,
    Seeds,
    Venom,
    PermanentAttackBonus,
    EscalatingDamage,
    ResurrectionCharges,
    TotalDamageTaken,
}

/// Candidate pool for a discover effect
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoverPool {
    /// Explicit candidates; when empty the collectible catalog is filtered
    #[serde(default)]
    pub card_ids: Vec<CardId>,
    #[serde(default)]
    pub kind: Option<CardKind>,
    #[serde(default)]
    pub max_cost: Option<u8>,
}

/// Board predicates used by conditional triggers and effects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    HeroDamagedThisTurn,
    HandSizeAtMost { count: usize },
    CardsPlayedThisTurnAtLeast { count: u32 },
    SpellsCastThisTurnAtLeast { count: u32 },
    FriendlyMinionsAtLeast { count: usize },
    FewerMinionsThanOpponent,
    HeroAtFullHealth,
    ArmorAtLeast { amount: i32 },
    SubjectCostAtLeast { cost: u8 },
    CounterAtLeast { counter: Counter, amount: i32 },
}

/// Closed set of effect primitives compositions, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    Damage {
        amount: Amount,
        target: Target,
        /// Each repeat re-picks random targets from the survivors
        #[serde(default = "one")]
        repeat: u8,
    },
    DamageAllEnemies {
        amount: Amount,
    },
    Heal {
        amount: Amount,
        target: Target,
    },
    Buff {
        #[serde(default)]
        attack: i32,
        #[serde(default)]
        health: i32,
        target: Target,
    },
    BuffAndCopy {
        #[serde(default)]
        attack: i32,
        #[serde(default)]
        health: i32,
        target: Target,
    },
    Summon {
        token: TokenSpec,
        #[serde(default = "one")]
        count: u8,
        /// Summon onto the enemy board instead
        #[serde(default)]
        for_enemy: bool,
    },
    SummonCopy {
        target: Target,
    },
    Draw {
        #[serde(default = "one")]
        count: u8,
    },
    Freeze {
        target: Target,
    },
    Silence {
        target: Target,
    },
    Destroy {
        target: Target,
    },
    ConditionalDestroy {
        target: Target,
        #[serde(default)]
        max_health: Option<i32>,
        #[serde(default)]
        min_attack: Option<i32>,
    },
    GainArmor {
        amount: Amount,
    },
    GrantKeyword {
        keyword: Keyword,
        target: Target,
    },
    GrantRandomKeyword {
        keywords: Vec<Keyword>,
        target: Target,
    },
    ReturnToHand {
        target: Target,
    },
    ShuffleIntoDeck {
        target: Target,
    },
    GainManaCrystal {
        #[serde(default = "one")]
        amount: u8,
    },
    /// Temporary mana for the current turn (The Coin)
    GainMana {
        #[serde(default = "one")]
        amount: u8,
    },
    Overload {
        amount: u8,
    },
    Resurrect {
        #[serde(default = "one")]
        count: u8,
    },
    DebuffAttack {
        amount: i32,
        target: Target,
    },
    CopyToHand {
        target: Target,
        #[serde(default)]
        cost_reduction: u8,
    },
    AddCardToHand {
        card_id: CardId,
        #[serde(default = "one")]
        count: u8,
    },
    ReduceHandCosts {
        amount: u8,
    },
    AddCounter {
        counter: Counter,
        amount: Amount,
        #[serde(default)]
        max: Option<i32>,
    },
    SpendCounter {
        counter: Counter,
        cost: i32,
        effects: Vec<EffectSlot>,
    },
    DamageByCounter {
        counter: Counter,
        target: Target,
        #[serde(default)]
        increment: i32,
    },
    PreventLethal {
        #[serde(default = "lethal_floor")]
        set_health: i32,
    },
    Discover {
        #[serde(default)]
        pool: DiscoverPool,
    },
    Conditional {
        condition: Condition,
        effects: Vec<EffectSlot>,
    },
}

fn one() -> u8 {
    1
}

fn lethal_floor() -> i32 {
    5
}

impl Effect {
    /// The `type` tag as it appears in catalog data
    pub fn type_name(&self) -> &'static str {
        match self {
            Effect::Damage { .. } => "damage",
            Effect::DamageAllEnemies { .. } => "damage_all_enemies",
            Effect::Heal { .. } => "heal",
            Effect::Buff { .. } => "buff",
            Effect::BuffAndCopy { .. } => "buff_and_copy",
            Effect::Summon { .. } => "summon",
            Effect::SummonCopy { .. } => "summon_copy",
            Effect::Draw { .. } => "draw",
            Effect::Freeze { .. } => "freeze",
            Effect::Silence { .. } => "silence",
            Effect::Destroy { .. } => "destroy",
            Effect::ConditionalDestroy { .. } => "conditional_destroy",
            Effect::GainArmor { .. } => "gain_armor",
            Effect::GrantKeyword { .. } => "grant_keyword",
            Effect::GrantRandomKeyword { .. } => "grant_random_keyword",
            Effect::ReturnToHand { .. } => "return_to_hand",
            Effect::ShuffleIntoDeck { .. } => "shuffle_into_deck",
            Effect::GainManaCrystal { .. } => "gain_mana_crystal",
            Effect::GainMana { .. } => "gain_mana",
            Effect::Overload { .. } => "overload",
            Effect::Resurrect { .. } => "resurrect",
            Effect::DebuffAttack { .. } => "debuff_attack",
            Effect::CopyToHand { .. } => "copy_to_hand",
            Effect::AddCardToHand { .. } => "add_card_to_hand",
            Effect::ReduceHandCosts { .. } => "reduce_hand_costs",
            Effect::AddCounter { .. } => "add_counter",
            Effect::SpendCounter { .. } => "spend_counter",
            Effect::DamageByCounter { .. } => "damage_by_counter",
            Effect::PreventLethal { .. } => "prevent_lethal",
            Effect::Discover { .. } => "discover",
            Effect::Conditional { .. } => "conditional",
        }
    }

    /// Selector of a single-target effect
    pub fn target(&self) -> Option<Target> {
        match self {
            Effect::Damage { target, .. }
            | Effect::Heal { target, .. }
            | Effect::Buff { target, .. }
            | Effect::BuffAndCopy { target, .. }
            | Effect::SummonCopy { target }
            | Effect::Freeze { target }
            | Effect::Silence { target }
            | Effect::Destroy { target }
            | Effect::ConditionalDestroy { target, .. }
            | Effect::GrantKeyword { target, .. }
            | Effect::GrantRandomKeyword { target, .. }
            | Effect::ReturnToHand { target }
            | Effect::ShuffleIntoDeck { target }
            | Effect::DebuffAttack { target, .. }
            | Effect::CopyToHand { target, .. }
            | Effect::DamageByCounter { target, .. } => Some(*target),
            _ => None,
        }
    }

    /// Descriptors wrapped by `conditional` and `spend_counter`
    pub fn nested(&self) -> &[EffectSlot] {
        match self {
            Effect::Conditional { effects, .. } | Effect::SpendCounter { effects, .. } => effects,
            _ => &[],
        }
    }

    /// Whether the effect, or one it wraps, reads `Target::Chosen`
    pub fn uses_chosen_target(&self) -> bool {
        self.target() == Some(Target::Chosen)
            || self
                .nested()
                .iter()
                .any(|slot| matches!(slot, EffectSlot::Known(inner) if inner.uses_chosen_target()))
    }
}

/// One slot in a descriptor list
///
/// Anything that does not parse as a known `Effect` is kept verbatim so the
/// interpreter can report it and move on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EffectSlot {
    Known(Effect),
    Unrecognized(serde_json::Value),
}

impl EffectSlot {
    pub fn type_name(&self) -> &str {
        match self {
            EffectSlot::Known(effect) => effect.type_name(),
            EffectSlot::Unrecognized(raw) => raw
                .get("type")
                .and_then(|t| t.as_str())
                .unwrap_or("<untyped>"),
        }
    }
}

impl From<Effect> for EffectSlot {
    fn from(effect: Effect) -> Self {
        EffectSlot::Known(effect)
    }
}

/// Trigger keys for triggered descriptors
///
/// Keys are relative to the owner of the source: `endOfTurn` on a minion
/// fires at the end of its owner's turn, `onEnemyMinionDeath` when a minion
/// of the other side dies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Trigger {
    OnSummon,
    OnMinionPlay,
    OnEnemyMinionPlayed,
    OnSpellCast,
    OnHeroAttack,
    OnHeroKill,
    OnMinionAttack,
    OnEnemyAttack,
    OnFriendlyMinionDeath,
    OnEnemyMinionDeath,
    OnAnyMinionDeath,
    OnHeroDamaged,
    OnLethal,
    StartOfTurn,
    EndOfTurn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateScope {
    PerTurn,
    PerGame,
}

/// Once-per-turn / once-per-game gating key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gate {
    pub scope: GateScope,
    pub key: String,
}

/// Effects bound to a trigger, with optional gating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggeredEffect {
    pub trigger: Trigger,
    #[serde(default)]
    pub gate: Option<Gate>,
    /// Percentage chance to fire, rolled on the game RNG
    #[serde(default)]
    pub chance: Option<u8>,
    #[serde(default)]
    pub condition: Option<Condition>,
    pub effects: Vec<EffectSlot>,
}

impl TriggeredEffect {
    pub fn new(trigger: Trigger, effects: Vec<Effect>) -> Self {
        TriggeredEffect {
            trigger,
            gate: None,
            chance: None,
            condition: None,
            effects: effects.into_iter().map(EffectSlot::Known).collect(),
        }
    }

    pub fn gated(mut self, scope: GateScope, key: impl Into<String>) -> Self {
        self.gate = Some(Gate {
            scope,
            key: key.into(),
        });
        self
    }
}

/// Passive effects that hold while the minion is on the battlefield
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Aura {
    /// Other friendly minions have +N attack
    FriendlyAttack { amount: i32 },
    /// Friendly spells deal N extra damage
    SpellDamage { amount: i32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_effect_parses() {
        let slot: EffectSlot = serde_json::from_str(
            r#"{"type":"damage","amount":3,"target":"random_enemy_minion"}"#,
        )
        .unwrap();
        assert_eq!(
            slot,
            EffectSlot::Known(Effect::Damage {
                amount: Amount::Fixed(3),
                target: Target::RandomEnemyMinion,
                repeat: 1,
            })
        );
    }

    #[test]
    fn test_dynamic_amount_parses() {
        let slot: EffectSlot = serde_json::from_str(
            r#"{"type":"add_counter","counter":"venom","amount":"trigger_value","max":10}"#,
        )
        .unwrap();
        assert_eq!(
            slot,
            EffectSlot::Known(Effect::AddCounter {
                counter: Counter::Venom,
                amount: Amount::Dynamic(DynamicAmount::TriggerValue),
                max: Some(10),
            })
        );
    }

    #[test]
    fn test_unknown_type_is_kept_as_unrecognized() {
        let slot: EffectSlot =
            serde_json::from_str(r#"{"type":"time_warp","turns":1}"#).unwrap();
        assert!(matches!(slot, EffectSlot::Unrecognized(_)));
        assert_eq!(slot.type_name(), "time_warp");
    }

    #[test]
    fn test_prevent_lethal_default_floor() {
        let slot: EffectSlot = serde_json::from_str(r#"{"type":"prevent_lethal"}"#).unwrap();
        assert_eq!(
            slot,
            EffectSlot::Known(Effect::PreventLethal { set_health: 5 })
        );
    }

    #[test]
    fn test_triggered_effect_with_gate() {
        let trig: TriggeredEffect = serde_json::from_str(
            r#"{
                "trigger": "onSpellCast",
                "gate": {"scope": "per_turn", "key": "shuffleEnemy"},
                "effects": [{"type": "shuffle_into_deck", "target": "random_enemy_minion"}]
            }"#,
        )
        .unwrap();
        assert_eq!(trig.trigger, Trigger::OnSpellCast);
        assert_eq!(trig.gate.as_ref().map(|g| g.scope), Some(GateScope::PerTurn));
        assert_eq!(trig.effects.len(), 1);
    }

    #[test]
    fn test_uses_chosen_target() {
        let e = Effect::Damage {
            amount: Amount::Fixed(2),
            target: Target::Chosen,
            repeat: 1,
        };
        assert!(e.uses_chosen_target());
        assert!(!Effect::Draw { count: 1 }.uses_chosen_target());
    }

    #[test]
    fn test_chosen_target_inside_wrappers() {
        let slot: EffectSlot = serde_json::from_str(
            r#"{"type":"spend_counter","counter":"souls","cost":2,"effects":[
                {"type":"conditional","condition":{"type":"hero_damaged_this_turn"},
                 "effects":[{"type":"freeze","target":"chosen"}]}
            ]}"#,
        )
        .unwrap();
        let EffectSlot::Known(effect) = slot else {
            panic!("spend_counter should parse");
        };
        assert_eq!(effect.target(), None);
        assert!(effect.uses_chosen_target());
    }
}
