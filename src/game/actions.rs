//! Inbound player actions: playing cards, hero powers and discover choices
//!
//! Every action is checked in full by a `check_*` method that only reads the
//! state. The mutating method runs the check first and starts changing
//! state only once it passed, so a rejected action leaves `GameState`
//! untouched. The checks are public so that automated players can test
//! legality without trying.

use crate::core::{
    ArtifactRuntimeState, CardDefinition, CardInstance, CardKind, Effect, EffectSlot, InstanceId,
    Side, Target, TargetRef, Trigger,
};
use crate::error::ActionRejection;
use crate::events::GameEvent;
use crate::game::interpreter::{effect_magnitude, EffectContext};
use crate::game::primitives::{Source, SourceKind};
use crate::game::{GameState, LogKind};
use crate::quest::QuestAction;
use crate::zones;
use crate::{EngineError, Result};
use std::sync::Arc;

/// Outcome of a successful play check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayCheck {
    /// Mana that will be spent
    pub cost: u8,
    /// Target passed on to the card's effects
    pub target: Option<TargetRef>,
}

/// Effects that resolve when a card of this kind is played
pub fn play_effects(definition: &CardDefinition) -> &[EffectSlot] {
    match definition.kind {
        CardKind::Spell => &definition.spell_effects,
        CardKind::Minion | CardKind::Weapon | CardKind::Artifact => &definition.battlecry,
        CardKind::Secret | CardKind::Quest => &[],
    }
}

/// Every effect reading the chosen target, including ones nested in wrappers
fn chosen_effects(effects: &[EffectSlot]) -> Vec<&Effect> {
    let mut found = Vec::new();
    collect_chosen(effects, &mut found);
    found
}

fn collect_chosen<'a>(effects: &'a [EffectSlot], out: &mut Vec<&'a Effect>) {
    for slot in effects {
        if let EffectSlot::Known(effect) = slot {
            if effect.target() == Some(Target::Chosen) {
                out.push(effect);
            }
            collect_chosen(effect.nested(), out);
        }
    }
}

/// Damage and healing may pick a hero; everything else needs a minion
fn accepts_hero(effect: &Effect) -> bool {
    matches!(
        effect,
        Effect::Damage { .. } | Effect::Heal { .. } | Effect::DamageByCounter { .. }
    )
}

impl GameState {
    /// Whether playing `card` asks the player for a target
    pub fn needs_target(&self, card: &CardInstance) -> bool {
        card.definition.requires_target || !chosen_effects(play_effects(&card.definition)).is_empty()
    }

    /// Characters `side` may pick when playing `card`
    pub fn legal_targets(&self, side: Side, card: &CardInstance) -> Vec<TargetRef> {
        let effects = play_effects(&card.definition);
        let heroes_allowed = {
            let chosen = chosen_effects(effects);
            chosen.is_empty() || chosen.into_iter().all(accepts_hero)
        };
        let mut targets = Vec::new();
        for s in side.in_resolution_order() {
            if heroes_allowed {
                targets.push(TargetRef::Hero(s));
            }
            targets.extend(
                self.player(s)
                    .battlefield
                    .iter()
                    .filter(|m| m.is_alive() && m.instance_id != card.instance_id)
                    .filter(|m| s == side || !m.is_stealth)
                    .map(|m| TargetRef::Minion(m.instance_id)),
            );
        }
        targets
    }

    /// Mana `side` would pay for `card` right now
    pub fn play_cost(&self, side: Side, card: &CardInstance) -> u8 {
        let cost = card.mana_cost();
        if card.kind() == CardKind::Spell {
            cost.saturating_sub(self.spell_cost_reduction(side))
        } else {
            cost
        }
    }

    /// Whether `side` may play `instance` from hand at `target`
    pub fn check_play(
        &self,
        side: Side,
        instance: InstanceId,
        target: Option<TargetRef>,
    ) -> std::result::Result<PlayCheck, ActionRejection> {
        self.check_can_act(side)?;
        let player = self.player(side);
        let card = player
            .hand
            .iter()
            .find(|c| c.instance_id == instance)
            .ok_or(ActionRejection::CardNotInHand)?;

        let cost = self.play_cost(side, card);
        if !player.mana.can_afford(cost) {
            return Err(ActionRejection::InsufficientMana {
                required: cost,
                available: player.mana.current,
            });
        }

        match card.kind() {
            CardKind::Minion if player.battlefield.len() >= self.config.battlefield_cap => {
                return Err(ActionRejection::BoardFull);
            }
            CardKind::Secret
                if player.secrets.len() >= self.config.secret_cap
                    || player.secrets.iter().any(|s| s.card_id() == card.card_id()) =>
            {
                return Err(ActionRejection::SecretZoneFull);
            }
            _ => {}
        }

        if !self.needs_target(card) {
            return Ok(PlayCheck { cost, target: None });
        }
        let legal = self.legal_targets(side, card);
        match target {
            Some(t) if legal.contains(&t) => Ok(PlayCheck { cost, target: Some(t) }),
            Some(_) => Err(ActionRejection::IllegalTarget),
            // a minion whose battlecry has nothing to hit can still be played
            None if card.kind() == CardKind::Minion && legal.is_empty() => Ok(PlayCheck { cost, target: None }),
            None => Err(ActionRejection::TargetRequired),
        }
    }

    /// Play a card from `side`'s hand
    pub fn play_card(&mut self, side: Side, instance: InstanceId, target: Option<TargetRef>) -> Result<()> {
        let checked = self.check_play(side, instance, target)?;
        let card = zones::take(&mut self.player_mut(side).hand, instance).ok_or_else(|| {
            EngineError::InvariantViolation(format!("card {instance} left the hand after validation"))
        })?;

        let player = self.player_mut(side);
        player.mana.spend(checked.cost);
        player.cards_played_this_turn += 1;
        if card.definition.overload > 0 {
            player.mana.add_overload(card.definition.overload);
        }

        self.emit(GameEvent::CardPlayed {
            side,
            instance,
            card_id: card.card_id(),
            name: card.name().to_string(),
            kind: card.kind(),
            rarity: card.definition.rarity,
            mana_cost: checked.cost,
            target: checked.target,
        });
        self.log(
            LogKind::Action,
            Some(side),
            format!("The {} plays {} ({} mana)", side, card.name(), checked.cost),
            Some(card.name()),
            Some(checked.cost as i32),
        );

        match card.kind() {
            CardKind::Minion => self.play_minion(side, card, checked.target),
            CardKind::Spell => self.cast_spell(side, card, checked),
            CardKind::Weapon | CardKind::Artifact => self.equip(side, card, checked.target),
            CardKind::Secret => self.set_secret(side, card),
            CardKind::Quest => {
                self.start_quest(side, &card);
                self.player_mut(side).graveyard.push(card);
            }
        }
        self.sweep_dead();
        Ok(())
    }

    /// Play an artifact or weapon from hand
    pub fn equip_artifact(&mut self, side: Side, instance: InstanceId) -> Result<()> {
        let equippable = self
            .player(side)
            .hand
            .iter()
            .find(|c| c.instance_id == instance)
            .map(|c| c.kind().is_equippable());
        match equippable {
            Some(false) => Err(ActionRejection::NotAnArtifact.into()),
            // other checks, including a missing card, come from check_play
            _ => self.play_card(side, instance, None),
        }
    }

    fn play_minion(&mut self, side: Side, card: CardInstance, target: Option<TargetRef>) {
        let source = Source::card(&card, SourceKind::Minion);
        let definition = Arc::clone(&card.definition);
        let snapshot = card.clone();
        let Some(id) = self.place_on_battlefield(&source, card, None, true) else {
            return;
        };

        let battlecry = &definition.battlecry;
        if !battlecry.is_empty() && !self.is_game_over() {
            let value: i32 = battlecry
                .iter()
                .filter_map(|slot| match slot {
                    EffectSlot::Known(effect) => Some(effect_magnitude(effect)),
                    EffectSlot::Unrecognized(_) => None,
                })
                .sum();
            let effect = battlecry
                .iter()
                .map(|slot| slot.type_name())
                .collect::<Vec<_>>()
                .join(", ");
            self.emit(GameEvent::BattlecryTriggered {
                side,
                source: id,
                name: definition.name.clone(),
                effect,
                value,
            });
            self.log(
                LogKind::Trigger,
                Some(side),
                format!("{}'s battlecry triggers", definition.name),
                Some(&definition.name),
                Some(value),
            );
            let ctx = EffectContext::new(source).with_chosen(target);
            self.resolve_effects(&ctx, battlecry);
        }

        let subject = Some(TargetRef::Minion(id));
        self.fire_trigger(Trigger::OnMinionPlay, side, subject, 0);
        self.fire_trigger(Trigger::OnEnemyMinionPlayed, side.other(), subject, 0);
        self.track_quest_action(side, QuestAction::PlayMinion, &snapshot);
    }

    fn cast_spell(&mut self, side: Side, card: CardInstance, checked: PlayCheck) {
        let definition = Arc::clone(&card.definition);
        self.emit(GameEvent::SpellCast {
            side,
            instance: card.instance_id,
            name: definition.name.clone(),
            target: checked.target,
        });
        let ctx = EffectContext::new(Source::card(&card, SourceKind::Spell)).with_chosen(checked.target);
        self.resolve_effects(&ctx, &definition.spell_effects);

        let snapshot = card.clone();
        self.player_mut(side).graveyard.push(card);
        if let Some(state) = self.player_mut(side).artifact_state.as_mut() {
            state.spells_cast_this_turn += 1;
        }
        self.fire_trigger(Trigger::OnSpellCast, side, checked.target, checked.cost as i32);
        self.track_quest_action(side, QuestAction::CastSpell, &snapshot);
    }

    /// Put an artifact or weapon into the artifact slot, discarding the old one
    fn equip(&mut self, side: Side, mut card: CardInstance, target: Option<TargetRef>) {
        let replaced = self.player_mut(side).artifact.take();
        let replaced_name = replaced.as_ref().map(|c| c.name().to_string());
        if let Some(old) = replaced {
            let player = self.player_mut(side);
            player.artifact_state = None;
            player.graveyard.push(old);
        }

        if card.kind() == CardKind::Weapon {
            card.current_health = card.definition.durability.unwrap_or(1).max(1);
        }
        let definition = Arc::clone(&card.definition);
        let source = Source::card(&card, SourceKind::Artifact);
        let instance = card.instance_id;
        let player = self.player_mut(side);
        player.artifact_state = Some(ArtifactRuntimeState::new(definition.artifact.as_ref()));
        player.artifact = Some(card);

        self.emit(GameEvent::ArtifactEquipped {
            side,
            instance,
            name: definition.name.clone(),
            replaced: replaced_name.clone(),
        });
        let message = match &replaced_name {
            Some(old) => format!("The {} equips {}, replacing {}", side, definition.name, old),
            None => format!("The {} equips {}", side, definition.name),
        };
        self.log(LogKind::Action, Some(side), message, Some(&definition.name), None);

        if !definition.battlecry.is_empty() {
            let ctx = EffectContext::new(source).with_chosen(target);
            self.resolve_effects(&ctx, &definition.battlecry);
        }
    }

    fn set_secret(&mut self, side: Side, card: CardInstance) {
        let instance = card.instance_id;
        self.player_mut(side).secrets.push(card);
        self.emit(GameEvent::SecretPlayed { side, instance });
        self.log(LogKind::Action, Some(side), format!("The {} sets a secret", side), None, None);
    }

    /// Whether `side` may use its hero power at `target`
    pub fn check_hero_power(
        &self,
        side: Side,
        target: Option<TargetRef>,
    ) -> std::result::Result<Option<TargetRef>, ActionRejection> {
        self.check_can_act(side)?;
        let player = self.player(side);
        let power = &player.hero_power;
        if power.used {
            return Err(ActionRejection::HeroPowerUsed);
        }
        if !player.mana.can_afford(power.cost) {
            return Err(ActionRejection::InsufficientMana {
                required: power.cost,
                available: player.mana.current,
            });
        }
        let needs_target = power.requires_target || !chosen_effects(&power.effects).is_empty();
        if !needs_target {
            return Ok(None);
        }
        match target {
            None => Err(ActionRejection::TargetRequired),
            Some(TargetRef::Minion(id)) => match self.minion(id) {
                Some(m) if m.owner == side || !m.is_stealth => Ok(target),
                _ => Err(ActionRejection::IllegalTarget),
            },
            Some(TargetRef::Hero(_)) => Ok(target),
        }
    }

    /// Use `side`'s hero power
    pub fn use_hero_power(&mut self, side: Side, target: Option<TargetRef>) -> Result<()> {
        let target = self.check_hero_power(side, target)?;
        let player = self.player_mut(side);
        let power = player.hero_power.clone();
        player.mana.spend(power.cost);
        player.hero_power.used = true;

        self.emit(GameEvent::HeroPowerUsed {
            side,
            name: power.name.clone(),
        });
        self.log(
            LogKind::Action,
            Some(side),
            format!("The {} uses {} ({} mana)", side, power.name, power.cost),
            Some(&power.name),
            Some(power.cost as i32),
        );
        let ctx = EffectContext::new(Source::new(side, power.name.clone(), SourceKind::HeroPower)).with_chosen(target);
        self.resolve_effects(&ctx, &power.effects);
        Ok(())
    }

    /// Pick option `index` of `side`'s pending discover
    pub fn resolve_discover(&mut self, side: Side, index: usize) -> Result<()> {
        if self.is_game_over() {
            return Err(ActionRejection::GameOver.into());
        }
        let pending = self
            .pending_discover
            .as_ref()
            .ok_or(ActionRejection::NoDiscoveryPending)?;
        if pending.side != side {
            return Err(ActionRejection::NotYourTurn.into());
        }
        let card_id = *pending.options.get(index).ok_or(ActionRejection::IllegalTarget)?;
        let definition = self.catalog().get(card_id).ok_or_else(|| {
            EngineError::InvariantViolation(format!("discover option {card_id} is not in the catalog"))
        })?;

        let source = pending.source.clone();
        self.pending_discover = None;
        let mut card = self.new_instance(definition, side);
        card.is_generated = true;
        let name = card.name().to_string();
        self.add_to_hand(side, card);
        self.emit(GameEvent::DiscoverResolved { side, card_id });
        self.log(
            LogKind::Action,
            Some(side),
            format!("The {} discovers {} from {}", side, name, source),
            Some(&source),
            None,
        );
        Ok(())
    }
}
