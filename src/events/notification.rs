//! Toast notifications derived from events

use super::{EventKind, EventRecord, EventSubscriber, GameEvent, SubscriberError};
use crate::core::Side;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
    pub duration_ms: u64,
}

impl Toast {
    fn new(level: ToastLevel, message: impl Into<String>, duration_ms: u64) -> Self {
        Toast {
            level,
            message: message.into(),
            duration_ms,
        }
    }
}

/// Which events produce toasts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Kinds suppressed as too noisy
    pub suppressed: Vec<EventKind>,
    /// Battlecries below this value are not shown
    pub battlecry_threshold: i32,
    /// Side whose point of view the messages use
    pub viewer: Side,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        NotificationConfig {
            suppressed: vec![
                EventKind::CardPlayed,
                EventKind::CardDrawn,
                EventKind::TurnStarted,
                EventKind::TurnEnded,
                EventKind::BuffApplied,
            ],
            battlecry_threshold: 3,
            viewer: Side::Player,
        }
    }
}

/// Turns events into user-facing toasts
#[derive(Debug, Clone, Default)]
pub struct NotificationMapper {
    config: NotificationConfig,
    toasts: Vec<Toast>,
}

impl NotificationMapper {
    pub fn new(config: NotificationConfig) -> Self {
        NotificationMapper {
            config,
            toasts: Vec::new(),
        }
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    fn whose(&self, side: Side) -> &'static str {
        if side == self.config.viewer {
            "Your"
        } else {
            "Opponent's"
        }
    }

    /// The toast for an event, if it should be shown
    pub fn toast_for(&self, event: &GameEvent) -> Option<Toast> {
        if self.config.suppressed.contains(&event.kind()) {
            return None;
        }
        let toast = match event {
            GameEvent::CardPlayed { rarity, name, .. } if *rarity == crate::core::Rarity::Legendary => {
                Toast::new(ToastLevel::Success, format!("Legendary! {name}"), 2000)
            }
            GameEvent::CardDrawn { name, .. } => Toast::new(ToastLevel::Info, format!("Drew {name}"), 1000),
            GameEvent::TurnStarted { side, .. } if *side == self.config.viewer => {
                Toast::new(ToastLevel::Success, "Your turn!", 1500)
            }
            GameEvent::CardBurned { side, name, .. } => Toast::new(
                ToastLevel::Warning,
                format!("{} {} was burned!", self.whose(*side), name),
                3000,
            ),
            GameEvent::FatigueDamage { side, amount } => Toast::new(
                ToastLevel::Warning,
                format!("{} hero takes {} fatigue damage", self.whose(*side), amount),
                2000,
            ),
            GameEvent::BattlecryTriggered { name, effect, value, .. } => {
                if *value < self.config.battlecry_threshold {
                    return None;
                }
                Toast::new(ToastLevel::Info, format!("{name}: {effect}"), 2000)
            }
            GameEvent::DeathrattleTriggered { name, .. } => {
                Toast::new(ToastLevel::Info, format!("Deathrattle: {name}"), 2000)
            }
            GameEvent::SecretRevealed { side, name } => Toast::new(
                ToastLevel::Info,
                format!("{} secret: {}!", self.whose(*side), name),
                3000,
            ),
            GameEvent::QuestCompleted { side, name, .. } => Toast::new(
                ToastLevel::Success,
                format!("{} quest completed: {}", self.whose(*side), name),
                3000,
            ),
            GameEvent::LethalPrevented { side, health } => Toast::new(
                ToastLevel::Warning,
                format!("{} hero survives at {} health!", self.whose(*side), health),
                3000,
            ),
            GameEvent::GameStarted { .. } => Toast::new(ToastLevel::Success, "Game Started!", 3000),
            GameEvent::GameEnded { winner } => {
                if *winner == self.config.viewer {
                    Toast::new(ToastLevel::Success, "Victory!", 5000)
                } else {
                    Toast::new(ToastLevel::Error, "Defeat", 5000)
                }
            }
            GameEvent::DiscoverResolved { side, card_id } if *side == self.config.viewer => {
                Toast::new(ToastLevel::Success, format!("Discovered card {card_id}"), 2000)
            }
            _ => return None,
        };
        Some(toast)
    }
}

impl EventSubscriber for NotificationMapper {
    fn name(&self) -> &str {
        "notifications"
    }

    fn on_event(&mut self, record: &EventRecord) -> Result<(), SubscriberError> {
        if let Some(toast) = self.toast_for(&record.event) {
            self.toasts.push(toast);
        }
        Ok(())
    }
}
