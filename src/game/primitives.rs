//! Effect primitive library
//!
//! Small state mutators every higher-level resolver is built from. Each one
//! re-validates its target first (targets may have died earlier in the same
//! cascade), logs its numeric result and queues the matching `GameEvent`.
//! Primitives never remove dead minions themselves; `sweep_dead` does that and
//! is run by the interpreter after every effect and by combat after damage.

use crate::core::{
    CardDefinition, CardInstance, InstanceId, Side, TargetRef, Trigger, LETHAL_PREVENTED_KEY,
};
use crate::events::GameEvent;
use crate::game::{GameState, LogKind};
use crate::quest::QuestAction;
use crate::zones;
use rand::Rng;
use std::sync::Arc;

/// What produced an effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Minion,
    Spell,
    Artifact,
    Secret,
    HeroPower,
    Hero,
    /// Game rules (fatigue)
    Rule,
}

/// The card or rule an effect is attributed to
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub side: Side,
    pub name: String,
    pub instance: Option<InstanceId>,
    pub kind: SourceKind,
}

impl Source {
    pub fn new(side: Side, name: impl Into<String>, kind: SourceKind) -> Self {
        Source {
            side,
            name: name.into(),
            instance: None,
            kind,
        }
    }

    pub fn card(card: &CardInstance, kind: SourceKind) -> Self {
        Source {
            side: card.owner,
            name: card.name().to_string(),
            instance: Some(card.instance_id),
            kind,
        }
    }

    pub fn rule(side: Side, name: &str) -> Self {
        Source::new(side, name, SourceKind::Rule)
    }
}

impl GameState {
    fn source_flags(&self, source: &Source) -> (bool, bool) {
        if source.kind != SourceKind::Minion {
            return (false, false);
        }
        source
            .instance
            .and_then(|id| {
                self.player(source.side)
                    .battlefield
                    .iter()
                    .find(|m| m.instance_id == id)
            })
            .map(|m| (m.has_lifesteal, m.has_poisonous))
            .unwrap_or((false, false))
    }

    /// Deal damage; returns the amount that got through armor / divine shield
    pub fn deal_damage(&mut self, source: &Source, target: TargetRef, amount: i32) -> i32 {
        if amount <= 0 || self.is_game_over() {
            return 0;
        }
        let (lifesteal, poisonous) = self.source_flags(source);
        let dealt = match target {
            TargetRef::Hero(side) => self.damage_hero(source, side, amount),
            TargetRef::Minion(id) => self.damage_minion(source, id, amount, poisonous),
        };
        if lifesteal && dealt > 0 {
            self.heal(source, TargetRef::Hero(source.side), dealt);
        }
        dealt
    }

    fn damage_minion(&mut self, source: &Source, id: InstanceId, amount: i32, poisonous: bool) -> i32 {
        let Some(minion) = self.minion_mut(id) else {
            tracing::debug!(target_id = %id, source = %source.name, "damage target vanished, skipped");
            return 0;
        };
        if minion.has_divine_shield {
            minion.has_divine_shield = false;
            let name = minion.name().to_string();
            self.emit(GameEvent::DivineShieldPopped { target: id });
            self.log(
                LogKind::Effect,
                Some(source.side),
                format!("{}'s Divine Shield absorbs {} damage from {}", name, amount, source.name),
                Some(&source.name),
                Some(0),
            );
            return 0;
        }
        minion.current_health = (minion.current_health - amount).max(0);
        if poisonous {
            minion.current_health = 0;
        }
        let name = minion.name().to_string();
        let remaining = minion.current_health;
        self.emit(GameEvent::DamageDealt {
            target: TargetRef::Minion(id),
            amount,
            absorbed_by_armor: 0,
        });
        self.log(
            LogKind::Effect,
            Some(source.side),
            format!("{} deals {} damage to {} ({} health left)", source.name, amount, name, remaining),
            Some(&source.name),
            Some(amount),
        );
        amount
    }

    fn damage_hero(&mut self, source: &Source, side: Side, amount: i32) -> i32 {
        let player = self.player_mut(side);
        let absorbed = player.hero_armor.min(amount);
        player.hero_armor -= absorbed;
        let through = amount - absorbed;
        player.hero_health = (player.hero_health - through).max(0);
        let health = player.hero_health;
        if through > 0 {
            if let Some(state) = player.artifact_state.as_mut() {
                state.hero_damaged_this_turn = true;
                state.counters.total_damage_taken += through;
            }
        }
        self.emit(GameEvent::DamageDealt {
            target: TargetRef::Hero(side),
            amount,
            absorbed_by_armor: absorbed,
        });
        self.log(
            LogKind::Effect,
            Some(source.side),
            format!(
                "{} deals {} damage to the {} hero ({} absorbed by armor, {} health left)",
                source.name, amount, side, absorbed, health
            ),
            Some(&source.name),
            Some(through),
        );
        if through > 0 {
            self.fire_trigger(Trigger::OnHeroDamaged, side, Some(TargetRef::Hero(side)), through);
        }
        if self.player(side).is_dead() {
            self.fire_trigger(Trigger::OnLethal, side, Some(TargetRef::Hero(side)), through);
            if self.player(side).is_dead() {
                self.end_game(side.other());
            }
        }
        through
    }

    /// Restore health up to the cap; returns the amount healed
    pub fn heal(&mut self, source: &Source, target: TargetRef, amount: i32) -> i32 {
        if amount <= 0 {
            return 0;
        }
        let (healed, name) = match target {
            TargetRef::Hero(side) => {
                let player = self.player_mut(side);
                let before = player.hero_health;
                player.hero_health = (player.hero_health + amount).min(player.max_health);
                (player.hero_health - before, format!("the {} hero", side))
            }
            TargetRef::Minion(id) => {
                let Some(minion) = self.minion_mut(id) else {
                    return 0;
                };
                let before = minion.current_health;
                minion.current_health = (minion.current_health + amount).min(minion.max_health);
                (minion.current_health - before, minion.name().to_string())
            }
        };
        if healed > 0 {
            self.emit(GameEvent::Healed {
                target,
                amount: healed,
            });
            self.log(
                LogKind::Effect,
                Some(source.side),
                format!("{} restores {} health to {}", source.name, healed, name),
                Some(&source.name),
                Some(healed),
            );
        }
        healed
    }

    /// Change a minion's attack and health; health buffs also raise max health
    pub fn buff_stats(&mut self, source: &Source, id: InstanceId, attack: i32, health: i32) -> bool {
        let Some(minion) = self.minion_mut(id) else {
            return false;
        };
        minion.current_attack = (minion.current_attack + attack).max(0);
        minion.current_health += health;
        if health > 0 {
            minion.max_health += health;
        }
        minion.current_health = minion.current_health.max(0);
        let (name, new_attack, new_health) =
            (minion.name().to_string(), minion.current_attack, minion.current_health);
        self.emit(GameEvent::BuffApplied {
            target: id,
            attack,
            health,
        });
        self.log(
            LogKind::Effect,
            Some(source.side),
            format!(
                "{} gives {} {:+}/{:+} (now {}/{})",
                source.name, name, attack, health, new_attack, new_health
            ),
            Some(&source.name),
            Some(attack + health),
        );
        true
    }

    pub fn gain_armor(&mut self, source: &Source, side: Side, amount: i32) {
        if amount <= 0 {
            return;
        }
        let player = self.player_mut(side);
        player.hero_armor += amount;
        let total = player.hero_armor;
        self.emit(GameEvent::ArmorGained { side, amount });
        self.log(
            LogKind::Effect,
            Some(side),
            format!("{} grants {} armor (now {})", source.name, amount, total),
            Some(&source.name),
            Some(amount),
        );
    }

    /// Put a minion onto its owner's battlefield
    ///
    /// Returns `None` (and logs) when the board is full; summons are never
    /// queued. Fires `onSummon` and, for summons outside of playing a card,
    /// tracks the quest `summon_minion` action.
    pub fn place_on_battlefield(
        &mut self,
        source: &Source,
        mut card: CardInstance,
        position: Option<usize>,
        from_hand: bool,
    ) -> Option<InstanceId> {
        let side = card.owner;
        let cap = self.config.battlefield_cap;
        if self.player(side).battlefield.len() >= cap {
            self.log(
                LogKind::Effect,
                Some(side),
                format!("No room to summon {} (battlefield full)", card.name()),
                Some(&source.name),
                None,
            );
            return None;
        }
        card.is_summoning_sick = true;
        card.attacks_performed = 0;
        card.can_attack = card.has_charge || card.has_rush;
        let id = card.instance_id;
        let event = GameEvent::MinionSummoned {
            side,
            instance: id,
            card_id: card.card_id(),
            name: card.name().to_string(),
            attack: card.current_attack,
            health: card.current_health,
            from_hand,
        };
        let message = format!(
            "{} summons {} ({}/{})",
            source.name,
            card.name(),
            card.current_attack,
            card.current_health
        );
        let snapshot = (!from_hand).then(|| card.clone());
        let board = &mut self.player_mut(side).battlefield;
        let index = position.unwrap_or(board.len()).min(board.len());
        board.insert(index, card);
        self.emit(event);
        self.log(LogKind::Effect, Some(side), message, Some(&source.name), None);
        self.fire_trigger(Trigger::OnSummon, side, Some(TargetRef::Minion(id)), 0);
        if let Some(card) = snapshot {
            self.track_quest_action(side, QuestAction::SummonMinion, &card);
        }
        Some(id)
    }

    /// Create a token from a definition and summon it for `side`
    pub fn summon_token(
        &mut self,
        source: &Source,
        side: Side,
        definition: Arc<CardDefinition>,
    ) -> Option<InstanceId> {
        if self.player(side).battlefield.len() >= self.config.battlefield_cap {
            self.log(
                LogKind::Effect,
                Some(side),
                format!("No room to summon {} (battlefield full)", definition.name),
                Some(&source.name),
                None,
            );
            return None;
        }
        let mut card = self.new_instance(definition, side);
        card.is_generated = true;
        self.place_on_battlefield(source, card, None, false)
    }

    /// Add a card to a hand, burning it if the hand is at the cap
    pub fn add_to_hand(&mut self, side: Side, card: CardInstance) -> bool {
        if self.player(side).hand.len() >= self.config.hand_cap {
            let (card_id, name) = (card.card_id(), card.name().to_string());
            self.player_mut(side).graveyard.push(card);
            self.emit(GameEvent::CardBurned {
                side,
                card_id,
                name: name.clone(),
            });
            self.log(
                LogKind::Effect,
                Some(side),
                format!("Hand is full: {} is burned", name),
                Some(&name),
                None,
            );
            return false;
        }
        self.player_mut(side).hand.push(card);
        true
    }

    /// Draw a random card from the deck, or take fatigue damage if it is empty
    pub fn draw_card(&mut self, side: Side) -> Option<InstanceId> {
        if self.player(side).deck.is_empty() {
            let player = self.player_mut(side);
            player.fatigue_counter += 1;
            let amount = player.fatigue_counter;
            self.emit(GameEvent::FatigueDamage { side, amount });
            self.log(
                LogKind::Effect,
                Some(side),
                format!("The {} deck is empty: fatigue deals {} damage", side, amount),
                Some("Fatigue"),
                Some(amount),
            );
            self.deal_damage(&Source::rule(side, "Fatigue"), TargetRef::Hero(side), amount);
            return None;
        }
        let len = self.player(side).deck.len();
        let idx = self.rng.gen_range(0..len);
        let card = self.player_mut(side).deck.remove(idx);
        let (id, card_id, name) = (card.instance_id, card.card_id(), card.name().to_string());
        if self.add_to_hand(side, card) {
            self.emit(GameEvent::CardDrawn {
                side,
                instance: id,
                card_id,
                name: name.clone(),
            });
            self.log(
                LogKind::Effect,
                Some(side),
                format!("The {} draws {}", side, name),
                None,
                None,
            );
            Some(id)
        } else {
            None
        }
    }

    pub fn freeze(&mut self, source: &Source, id: InstanceId) -> bool {
        let turn = self.turn_number();
        let Some(minion) = self.minion_mut(id) else {
            return false;
        };
        minion.is_frozen = true;
        minion.frozen_on_turn = Some(turn);
        minion.can_attack = false;
        let name = minion.name().to_string();
        self.emit(GameEvent::MinionFrozen { target: id });
        self.log(
            LogKind::Effect,
            Some(source.side),
            format!("{} freezes {}", source.name, name),
            Some(&source.name),
            None,
        );
        true
    }

    pub fn silence(&mut self, source: &Source, id: InstanceId) -> bool {
        let Some(minion) = self.minion_mut(id) else {
            return false;
        };
        minion.silence();
        let name = minion.name().to_string();
        self.emit(GameEvent::MinionSilenced { target: id });
        self.log(
            LogKind::Effect,
            Some(source.side),
            format!("{} silences {}", source.name, name),
            Some(&source.name),
            None,
        );
        true
    }

    /// Unconditional death, bypassing divine shield and armor
    pub fn destroy(&mut self, source: &Source, id: InstanceId) -> bool {
        let Some(minion) = self.minion_mut(id) else {
            return false;
        };
        minion.current_health = 0;
        let name = minion.name().to_string();
        self.log(
            LogKind::Effect,
            Some(source.side),
            format!("{} destroys {}", source.name, name),
            Some(&source.name),
            None,
        );
        true
    }

    /// Return a minion to its owner's hand with printed stats
    pub fn return_to_hand(&mut self, source: &Source, id: InstanceId) -> bool {
        let Some(owner) = self.minion(id).map(|m| m.owner) else {
            return false;
        };
        let Some(card) = zones::take(&mut self.player_mut(owner).battlefield, id) else {
            return false;
        };
        let fresh = card.reset_copy(id);
        let name = fresh.name().to_string();
        self.log(
            LogKind::Effect,
            Some(source.side),
            format!("{} returns {} to its owner's hand", source.name, name),
            Some(&source.name),
            None,
        );
        self.add_to_hand(owner, fresh);
        true
    }

    /// Shuffle a minion back into its owner's deck with printed stats
    pub fn shuffle_into_deck(&mut self, source: &Source, id: InstanceId) -> bool {
        let Some(owner) = self.minion(id).map(|m| m.owner) else {
            return false;
        };
        let Some(card) = zones::take(&mut self.player_mut(owner).battlefield, id) else {
            return false;
        };
        let fresh = card.reset_copy(id);
        let name = fresh.name().to_string();
        self.player_mut(owner).deck.push(fresh);
        self.log(
            LogKind::Effect,
            Some(source.side),
            format!("{} shuffles {} into the {} deck", source.name, name, owner),
            Some(&source.name),
            None,
        );
        true
    }

    /// Reset a dying hero to `set_health` once per game
    pub fn prevent_lethal(&mut self, source: &Source, side: Side, set_health: i32) -> bool {
        if !self.player(side).is_dead() {
            return false;
        }
        let Some(state) = self.player_mut(side).artifact_state.as_mut() else {
            tracing::warn!(source = %source.name, "prevent_lethal without an equipped artifact");
            return false;
        };
        if !state
            .gates
            .try_use(crate::core::GateScope::PerGame, LETHAL_PREVENTED_KEY)
        {
            return false;
        }
        let player = self.player_mut(side);
        player.hero_health = set_health.min(player.max_health).max(1);
        let health = player.hero_health;
        self.emit(GameEvent::LethalPrevented { side, health });
        self.log(
            LogKind::Trigger,
            Some(side),
            format!("{} prevents lethal damage: the {} hero is set to {} health", source.name, side, health),
            Some(&source.name),
            Some(health),
        );
        true
    }

    /// Remove every dead minion, then resolve deathrattles and death triggers
    ///
    /// Dead minions leave the battlefield before any deathrattle runs, so no
    /// effect ever observes a dead-but-present minion. Repeats until a pass
    /// finds nobody dead.
    pub fn sweep_dead(&mut self) {
        loop {
            let order = self.current_turn().in_resolution_order();
            let mut dead = Vec::new();
            for side in order {
                let board = &mut self.player_mut(side).battlefield;
                let mut i = 0;
                while i < board.len() {
                    if board[i].is_alive() {
                        i += 1;
                    } else {
                        dead.push(board.remove(i));
                    }
                }
            }
            if dead.is_empty() {
                return;
            }
            for card in &dead {
                self.emit(GameEvent::MinionDestroyed {
                    side: card.owner,
                    instance: card.instance_id,
                    card_id: card.card_id(),
                    name: card.name().to_string(),
                });
                self.log(
                    LogKind::Combat,
                    Some(card.owner),
                    format!("{} dies", card.name()),
                    Some(card.name()),
                    None,
                );
                self.player_mut(card.owner).graveyard.push(card.clone());
            }
            for card in &dead {
                if self.is_game_over() {
                    return;
                }
                self.resolve_deathrattle(card);
                let subject = Some(TargetRef::Minion(card.instance_id));
                self.fire_trigger(Trigger::OnFriendlyMinionDeath, card.owner, subject, 0);
                self.fire_trigger(Trigger::OnEnemyMinionDeath, card.owner.other(), subject, 0);
                for side in self.current_turn().in_resolution_order() {
                    self.fire_trigger(Trigger::OnAnyMinionDeath, side, subject, 0);
                }
            }
        }
    }
}
