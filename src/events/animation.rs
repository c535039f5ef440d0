//! Animation requests derived from events
//!
//! Requests are consumed one at a time: highest priority first, and in
//! insertion order among equal priorities.

use super::{EventRecord, EventSubscriber, GameEvent, SubscriberError};
use crate::core::{Rarity, TargetRef};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationKind {
    GameStart,
    TurnStart,
    CardPlay,
    LegendaryEntrance,
    CardDraw,
    CardBurn,
    Summon,
    Death,
    SpellCast,
    Battlecry,
    Deathrattle,
    Buff,
    Attack,
    Damage,
    Victory,
    Defeat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationRequest {
    pub kind: AnimationKind,
    pub priority: u8,
    pub duration: Duration,
    pub target: Option<TargetRef>,
    /// Sequence of the event that caused it
    pub event_sequence: u64,
}

impl AnimationRequest {
    /// Animation for an event, if it has one
    pub fn for_event(record: &EventRecord) -> Option<Self> {
        let ms = Duration::from_millis;
        let (kind, priority, duration, target) = match &record.event {
            GameEvent::GameStarted { .. } => (AnimationKind::GameStart, 10, ms(3000), None),
            GameEvent::GameEnded { winner } => {
                let kind = if *winner == crate::core::Side::Player {
                    AnimationKind::Victory
                } else {
                    AnimationKind::Defeat
                };
                (kind, 10, ms(5000), None)
            }
            GameEvent::TurnStarted { .. } => (AnimationKind::TurnStart, 8, ms(1500), None),
            GameEvent::CardPlayed { rarity, .. } if *rarity == Rarity::Legendary => {
                (AnimationKind::LegendaryEntrance, 10, ms(2000), None)
            }
            GameEvent::CardPlayed { .. } => (AnimationKind::CardPlay, 5, ms(600), None),
            GameEvent::CardDrawn { .. } => (AnimationKind::CardDraw, 3, ms(500), None),
            GameEvent::CardBurned { .. } => (AnimationKind::CardBurn, 3, ms(500), None),
            GameEvent::MinionSummoned { instance, .. } => {
                (AnimationKind::Summon, 5, ms(800), Some(TargetRef::Minion(*instance)))
            }
            GameEvent::MinionDestroyed { instance, .. } => {
                (AnimationKind::Death, 6, ms(600), Some(TargetRef::Minion(*instance)))
            }
            GameEvent::SpellCast { target, .. } => (AnimationKind::SpellCast, 7, ms(1000), *target),
            GameEvent::BattlecryTriggered { source, .. } => {
                (AnimationKind::Battlecry, 6, ms(800), Some(TargetRef::Minion(*source)))
            }
            GameEvent::DeathrattleTriggered { .. } => (AnimationKind::Deathrattle, 7, ms(1000), None),
            GameEvent::BuffApplied { target, .. } => {
                (AnimationKind::Buff, 4, ms(500), Some(TargetRef::Minion(*target)))
            }
            GameEvent::AttackDeclared { defender, .. } => (AnimationKind::Attack, 6, ms(700), Some(*defender)),
            GameEvent::DamageDealt { target, amount, .. } if *amount > 0 => {
                (AnimationKind::Damage, 5, ms(400), Some(*target))
            }
            _ => return None,
        };
        Some(AnimationRequest {
            kind,
            priority,
            duration,
            target,
            event_sequence: record.sequence,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Queued {
    request: AnimationRequest,
    order: u64,
}

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        self.request
            .priority
            .cmp(&other.request.priority)
            .then_with(|| other.order.cmp(&self.order))
    }
}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Priority queue of pending animations
#[derive(Debug, Default)]
pub struct AnimationQueue {
    heap: BinaryHeap<Queued>,
    next_order: u64,
}

impl AnimationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, request: AnimationRequest) {
        let order = self.next_order;
        self.next_order += 1;
        self.heap.push(Queued { request, order });
    }

    /// Next animation to play
    pub fn next(&mut self) -> Option<AnimationRequest> {
        self.heap.pop().map(|q| q.request)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Total time of everything still queued
    pub fn pending_duration(&self) -> Duration {
        self.heap.iter().map(|q| q.request.duration).sum()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

impl EventSubscriber for AnimationQueue {
    fn name(&self) -> &str {
        "animation"
    }

    fn on_event(&mut self, record: &EventRecord) -> Result<(), SubscriberError> {
        if let Some(request) = AnimationRequest::for_event(record) {
            self.push(request);
        }
        Ok(())
    }
}
