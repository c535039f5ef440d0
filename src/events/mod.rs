//! Typed game events and the in-process event bus
//!
//! The engine pushes a `GameEvent` for every public state transition while an
//! action resolves; the facade drains them in order at the action boundary and
//! publishes them on the `EventBus`. Presentation code (audio, animation,
//! notifications) subscribes without the engine knowing it exists.

pub mod animation;
pub mod audio;
pub mod bus;
pub mod notification;

pub use animation::{AnimationKind, AnimationQueue, AnimationRequest};
pub use audio::{AudioMapper, SoundEffect};
pub use bus::{
    EventBus, EventFilter, EventSubscriber, RecordingSubscriber, SubscriberError, SubscriptionHandle,
};
pub use notification::{NotificationConfig, NotificationMapper, Toast, ToastLevel};

use crate::core::{CardId, CardKind, InstanceId, Rarity, Side, TargetRef, Trigger};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Closed set of event payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    GameStarted {
        first: Side,
    },
    MulliganCompleted {
        side: Side,
        replaced: usize,
    },
    TurnStarted {
        side: Side,
        turn: u32,
    },
    TurnEnded {
        side: Side,
        turn: u32,
    },
    CardDrawn {
        side: Side,
        instance: InstanceId,
        card_id: CardId,
        name: String,
    },
    FatigueDamage {
        side: Side,
        amount: i32,
    },
    CardBurned {
        side: Side,
        card_id: CardId,
        name: String,
    },
    CardPlayed {
        side: Side,
        instance: InstanceId,
        card_id: CardId,
        name: String,
        kind: CardKind,
        rarity: Rarity,
        mana_cost: u8,
        target: Option<TargetRef>,
    },
    MinionSummoned {
        side: Side,
        instance: InstanceId,
        card_id: CardId,
        name: String,
        attack: i32,
        health: i32,
        from_hand: bool,
    },
    MinionDestroyed {
        side: Side,
        instance: InstanceId,
        card_id: CardId,
        name: String,
    },
    SpellCast {
        side: Side,
        instance: InstanceId,
        name: String,
        target: Option<TargetRef>,
    },
    BattlecryTriggered {
        side: Side,
        source: InstanceId,
        name: String,
        effect: String,
        value: i32,
    },
    DeathrattleTriggered {
        side: Side,
        source: InstanceId,
        name: String,
    },
    ArtifactTriggered {
        side: Side,
        name: String,
        trigger: Trigger,
    },
    ArtifactEquipped {
        side: Side,
        instance: InstanceId,
        name: String,
        replaced: Option<String>,
    },
    DamageDealt {
        target: TargetRef,
        amount: i32,
        absorbed_by_armor: i32,
    },
    Healed {
        target: TargetRef,
        amount: i32,
    },
    BuffApplied {
        target: InstanceId,
        attack: i32,
        health: i32,
    },
    ArmorGained {
        side: Side,
        amount: i32,
    },
    DivineShieldPopped {
        target: InstanceId,
    },
    MinionFrozen {
        target: InstanceId,
    },
    MinionSilenced {
        target: InstanceId,
    },
    AttackDeclared {
        side: Side,
        attacker: TargetRef,
        defender: TargetRef,
    },
    HeroPowerUsed {
        side: Side,
        name: String,
    },
    SecretPlayed {
        side: Side,
        instance: InstanceId,
    },
    SecretRevealed {
        side: Side,
        name: String,
    },
    QuestStarted {
        side: Side,
        quest_id: u32,
        name: String,
        goal: u32,
    },
    QuestProgressed {
        side: Side,
        quest_id: u32,
        current: u32,
        goal: u32,
    },
    QuestCompleted {
        side: Side,
        quest_id: u32,
        name: String,
        reward_card_id: CardId,
    },
    ManaCrystalGained {
        side: Side,
        amount: u8,
    },
    DiscoverOffered {
        side: Side,
        options: Vec<CardId>,
    },
    DiscoverResolved {
        side: Side,
        card_id: CardId,
    },
    LethalPrevented {
        side: Side,
        health: i32,
    },
    GameEnded {
        winner: Side,
    },
}

/// Payload-free discriminant of `GameEvent`, used for subscription filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    GameStarted,
    MulliganCompleted,
    TurnStarted,
    TurnEnded,
    CardDrawn,
    FatigueDamage,
    CardBurned,
    CardPlayed,
    MinionSummoned,
    MinionDestroyed,
    SpellCast,
    BattlecryTriggered,
    DeathrattleTriggered,
    ArtifactTriggered,
    ArtifactEquipped,
    DamageDealt,
    Healed,
    BuffApplied,
    ArmorGained,
    DivineShieldPopped,
    MinionFrozen,
    MinionSilenced,
    AttackDeclared,
    HeroPowerUsed,
    SecretPlayed,
    SecretRevealed,
    QuestStarted,
    QuestProgressed,
    QuestCompleted,
    ManaCrystalGained,
    DiscoverOffered,
    DiscoverResolved,
    LethalPrevented,
    GameEnded,
}

impl GameEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GameEvent::GameStarted { .. } => EventKind::GameStarted,
            GameEvent::MulliganCompleted { .. } => EventKind::MulliganCompleted,
            GameEvent::TurnStarted { .. } => EventKind::TurnStarted,
            GameEvent::TurnEnded { .. } => EventKind::TurnEnded,
            GameEvent::CardDrawn { .. } => EventKind::CardDrawn,
            GameEvent::FatigueDamage { .. } => EventKind::FatigueDamage,
            GameEvent::CardBurned { .. } => EventKind::CardBurned,
            GameEvent::CardPlayed { .. } => EventKind::CardPlayed,
            GameEvent::MinionSummoned { .. } => EventKind::MinionSummoned,
            GameEvent::MinionDestroyed { .. } => EventKind::MinionDestroyed,
            GameEvent::SpellCast { .. } => EventKind::SpellCast,
            GameEvent::BattlecryTriggered { .. } => EventKind::BattlecryTriggered,
            GameEvent::DeathrattleTriggered { .. } => EventKind::DeathrattleTriggered,
            GameEvent::ArtifactTriggered { .. } => EventKind::ArtifactTriggered,
            GameEvent::ArtifactEquipped { .. } => EventKind::ArtifactEquipped,
            GameEvent::DamageDealt { .. } => EventKind::DamageDealt,
            GameEvent::Healed { .. } => EventKind::Healed,
            GameEvent::BuffApplied { .. } => EventKind::BuffApplied,
            GameEvent::ArmorGained { .. } => EventKind::ArmorGained,
            GameEvent::DivineShieldPopped { .. } => EventKind::DivineShieldPopped,
            GameEvent::MinionFrozen { .. } => EventKind::MinionFrozen,
            GameEvent::MinionSilenced { .. } => EventKind::MinionSilenced,
            GameEvent::AttackDeclared { .. } => EventKind::AttackDeclared,
            GameEvent::HeroPowerUsed { .. } => EventKind::HeroPowerUsed,
            GameEvent::SecretPlayed { .. } => EventKind::SecretPlayed,
            GameEvent::SecretRevealed { .. } => EventKind::SecretRevealed,
            GameEvent::QuestStarted { .. } => EventKind::QuestStarted,
            GameEvent::QuestProgressed { .. } => EventKind::QuestProgressed,
            GameEvent::QuestCompleted { .. } => EventKind::QuestCompleted,
            GameEvent::ManaCrystalGained { .. } => EventKind::ManaCrystalGained,
            GameEvent::DiscoverOffered { .. } => EventKind::DiscoverOffered,
            GameEvent::DiscoverResolved { .. } => EventKind::DiscoverResolved,
            GameEvent::LethalPrevented { .. } => EventKind::LethalPrevented,
            GameEvent::GameEnded { .. } => EventKind::GameEnded,
        }
    }
}

/// A published event: immutable, sequenced and timestamped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Total order across the whole match
    pub sequence: u64,
    pub turn: u32,
    pub timestamp_ms: u64,
    pub event: GameEvent,
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
