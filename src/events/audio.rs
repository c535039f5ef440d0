//! Event to sound-effect mapping

use super::{EventRecord, EventSubscriber, GameEvent, SubscriberError};
use crate::core::{CardKind, Rarity, Side};
use serde::{Deserialize, Serialize};

/// Sound effect ids understood by the audio layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundEffect {
    GameStart,
    TurnStart,
    CardPlay,
    Spell,
    SpellCast,
    Legendary,
    CardDraw,
    Damage,
    Error,
    Battlecry,
    Deathrattle,
    HeroPower,
    SecretTrigger,
    Attack,
    Discover,
    Victory,
    Defeat,
}

impl SoundEffect {
    pub fn id(self) -> &'static str {
        match self {
            SoundEffect::GameStart => "game_start",
            SoundEffect::TurnStart => "turn_start",
            SoundEffect::CardPlay => "card_play",
            SoundEffect::Spell => "spell",
            SoundEffect::SpellCast => "spell_cast",
            SoundEffect::Legendary => "legendary",
            SoundEffect::CardDraw => "card_draw",
            SoundEffect::Damage => "damage",
            SoundEffect::Error => "error",
            SoundEffect::Battlecry => "battlecry",
            SoundEffect::Deathrattle => "deathrattle",
            SoundEffect::HeroPower => "hero_power",
            SoundEffect::SecretTrigger => "secret_trigger",
            SoundEffect::Attack => "attack",
            SoundEffect::Discover => "discover",
            SoundEffect::Victory => "victory",
            SoundEffect::Defeat => "defeat",
        }
    }
}

/// Maps events to sounds and remembers what it played
///
/// Outcome sounds are from the point of view of `listener`.
#[derive(Debug, Clone)]
pub struct AudioMapper {
    listener: Side,
    played: Vec<SoundEffect>,
}

impl Default for AudioMapper {
    fn default() -> Self {
        Self::new(Side::Player)
    }
}

impl AudioMapper {
    pub fn new(listener: Side) -> Self {
        AudioMapper {
            listener,
            played: Vec::new(),
        }
    }

    pub fn played(&self) -> &[SoundEffect] {
        &self.played
    }

    /// The sound for an event, if any
    pub fn sound_for(&self, event: &GameEvent) -> Option<SoundEffect> {
        let sound = match event {
            GameEvent::CardPlayed { kind, rarity, .. } => {
                if *rarity == Rarity::Legendary {
                    SoundEffect::Legendary
                } else if *kind == CardKind::Spell {
                    SoundEffect::Spell
                } else {
                    SoundEffect::CardPlay
                }
            }
            GameEvent::CardDrawn { .. } => SoundEffect::CardDraw,
            GameEvent::FatigueDamage { .. } => SoundEffect::Damage,
            GameEvent::CardBurned { .. } => SoundEffect::Error,
            // played minions are already covered by CardPlayed
            GameEvent::MinionSummoned { from_hand, .. } if !from_hand => SoundEffect::Battlecry,
            GameEvent::MinionDestroyed { .. } => SoundEffect::Damage,
            GameEvent::SpellCast { .. } => SoundEffect::SpellCast,
            GameEvent::BattlecryTriggered { .. } => SoundEffect::Battlecry,
            GameEvent::DeathrattleTriggered { .. } => SoundEffect::Deathrattle,
            GameEvent::HeroPowerUsed { .. } => SoundEffect::HeroPower,
            GameEvent::SecretRevealed { .. } => SoundEffect::SecretTrigger,
            GameEvent::AttackDeclared { .. } => SoundEffect::Attack,
            GameEvent::TurnStarted { .. } => SoundEffect::TurnStart,
            GameEvent::GameStarted { .. } => SoundEffect::GameStart,
            GameEvent::DiscoverOffered { .. } => SoundEffect::Discover,
            GameEvent::GameEnded { winner } => {
                if *winner == self.listener {
                    SoundEffect::Victory
                } else {
                    SoundEffect::Defeat
                }
            }
            _ => return None,
        };
        Some(sound)
    }
}

impl EventSubscriber for AudioMapper {
    fn name(&self) -> &str {
        "audio"
    }

    fn on_event(&mut self, record: &EventRecord) -> Result<(), SubscriberError> {
        if let Some(sound) = self.sound_for(&record.event) {
            self.played.push(sound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CardId, InstanceId};

    fn played(kind: CardKind, rarity: Rarity) -> GameEvent {
        GameEvent::CardPlayed {
            side: Side::Player,
            instance: InstanceId::new(1),
            card_id: CardId::new(1),
            name: "Card".into(),
            kind,
            rarity,
            mana_cost: 3,
            target: None,
        }
    }

    #[test]
    fn test_card_played_sounds() {
        let audio = AudioMapper::default();
        assert_eq!(audio.sound_for(&played(CardKind::Minion, Rarity::Legendary)), Some(SoundEffect::Legendary));
        assert_eq!(audio.sound_for(&played(CardKind::Spell, Rarity::Rare)), Some(SoundEffect::Spell));
        assert_eq!(audio.sound_for(&played(CardKind::Weapon, Rarity::Common)), Some(SoundEffect::CardPlay));
    }

    #[test]
    fn test_draw_fatigue_and_burn() {
        let audio = AudioMapper::default();
        let fatigue = GameEvent::FatigueDamage { side: Side::Player, amount: 2 };
        let burn = GameEvent::CardBurned { side: Side::Player, card_id: CardId::new(3), name: "X".into() };
        assert_eq!(audio.sound_for(&fatigue).map(SoundEffect::id), Some("damage"));
        assert_eq!(audio.sound_for(&burn).map(SoundEffect::id), Some("error"));
    }

    #[test]
    fn test_outcome_depends_on_listener() {
        let ended = GameEvent::GameEnded { winner: Side::Opponent };
        assert_eq!(AudioMapper::new(Side::Player).sound_for(&ended), Some(SoundEffect::Defeat));
        assert_eq!(AudioMapper::new(Side::Opponent).sound_for(&ended), Some(SoundEffect::Victory));
    }
}
