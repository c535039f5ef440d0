//! Trigger/effect interpreter
//!
//! Turns declarative descriptors into sequences of primitive calls.
//!
//! Resolution contract:
//! - effects in one descriptor resolve top-to-bottom, in listed order;
//! - gates are checked before anything mutates and are marked as soon as a
//!   trigger passes its condition and chance roll, so a re-entrant firing in
//!   the same cascade sees the gate as used;
//! - random targets are drawn from the board as it is when the effect runs;
//! - every effect leaves a game-log entry naming its source.
//!
//! When several sources react to the same trigger they resolve in a fixed
//! order: the acting side's sources before the other side's, and within one
//! side the artifact, then minions left to right, then secrets.

use crate::core::{
    Amount, CardDefinition, CardInstance, Condition, Counter, DiscoverPool, DynamicAmount,
    Effect, EffectSlot, Gate, GateScope, InstanceId, Side, Target, TargetRef, TokenSpec,
    Trigger, TriggeredEffect,
};
use crate::events::GameEvent;
use crate::game::primitives::{Source, SourceKind};
use crate::game::{GameState, LogKind, PendingDiscover};
use rand::seq::SliceRandom;
use std::sync::Arc;

/// Cards offered by one discover effect
pub const DISCOVER_OPTIONS: usize = 3;

/// Everything an effect list needs to know about why it is resolving
#[derive(Debug, Clone)]
pub struct EffectContext {
    pub source: Source,
    /// Target picked by the player
    pub chosen: Option<TargetRef>,
    /// The character the trigger is about
    pub subject: Option<TargetRef>,
    /// Numeric payload of the trigger
    pub trigger_value: i32,
}

impl EffectContext {
    pub fn new(source: Source) -> Self {
        EffectContext {
            source,
            chosen: None,
            subject: None,
            trigger_value: 0,
        }
    }

    pub fn with_chosen(mut self, chosen: Option<TargetRef>) -> Self {
        self.chosen = chosen;
        self
    }

    pub fn with_subject(mut self, subject: Option<TargetRef>) -> Self {
        self.subject = subject;
        self
    }

    pub fn with_value(mut self, value: i32) -> Self {
        self.trigger_value = value;
        self
    }

    fn side(&self) -> Side {
        self.source.side
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TriggerSource {
    Artifact(InstanceId),
    Minion(InstanceId),
    Secret(InstanceId),
}

/// Rough size of an effect, used for battlecry notifications
pub fn effect_magnitude(effect: &Effect) -> i32 {
    let fixed = |a: &Amount| match a {
        Amount::Fixed(n) => *n,
        Amount::Dynamic(_) => 0,
    };
    match effect {
        Effect::Damage { amount, repeat, .. } => fixed(amount) * *repeat as i32,
        Effect::DamageAllEnemies { amount }
        | Effect::Heal { amount, .. }
        | Effect::GainArmor { amount }
        | Effect::AddCounter { amount, .. } => fixed(amount),
        Effect::Buff { attack, health, .. } | Effect::BuffAndCopy { attack, health, .. } => {
            attack + health
        }
        Effect::Summon { token, count, .. } => (token.attack + token.health) * *count as i32,
        Effect::Draw { count } | Effect::Resurrect { count } | Effect::AddCardToHand { count, .. } => {
            *count as i32
        }
        Effect::DebuffAttack { amount, .. } => *amount,
        Effect::GainManaCrystal { amount }
        | Effect::GainMana { amount }
        | Effect::Overload { amount } => *amount as i32,
        Effect::ReduceHandCosts { amount } => *amount as i32,
        Effect::CopyToHand { cost_reduction, .. } => *cost_reduction as i32,
        Effect::PreventLethal { set_health } => *set_health,
        Effect::SpendCounter { cost, .. } => *cost,
        Effect::SummonCopy { .. }
        | Effect::Freeze { .. }
        | Effect::Silence { .. }
        | Effect::Destroy { .. }
        | Effect::ConditionalDestroy { .. }
        | Effect::GrantKeyword { .. }
        | Effect::GrantRandomKeyword { .. }
        | Effect::ReturnToHand { .. }
        | Effect::ShuffleIntoDeck { .. }
        | Effect::DamageByCounter { .. }
        | Effect::Discover { .. }
        | Effect::Conditional { .. } => 0,
    }
}

fn token_definition(token: &TokenSpec) -> Arc<CardDefinition> {
    let id = token.id.map(|id| id.as_u32()).unwrap_or(0);
    let mut def = CardDefinition::minion(id, token.name.clone(), 0, token.attack, token.health)
        .with_keywords(&token.keywords);
    def.race = token.race.clone();
    def.collectible = false;
    Arc::new(def)
}

impl GameState {
    /// Resolve a descriptor list in order, sweeping the dead after each effect
    pub fn resolve_effects(&mut self, ctx: &EffectContext, effects: &[EffectSlot]) {
        for slot in effects {
            if self.is_game_over() {
                return;
            }
            match slot {
                EffectSlot::Known(effect) => self.resolve_effect(ctx, effect),
                EffectSlot::Unrecognized(_) => {
                    let type_name = slot.type_name().to_string();
                    tracing::warn!(
                        source = %ctx.source.name,
                        effect_type = %type_name,
                        "unrecognized effect type, skipped"
                    );
                    self.log(
                        LogKind::Warning,
                        Some(ctx.side()),
                        format!("{}: unknown effect type '{}' skipped", ctx.source.name, type_name),
                        Some(&ctx.source.name),
                        None,
                    );
                }
            }
            self.sweep_dead();
        }
    }

    fn resolve_effect(&mut self, ctx: &EffectContext, effect: &Effect) {
        let side = ctx.side();
        let source = &ctx.source;
        match effect {
            Effect::Damage {
                amount,
                target,
                repeat,
            } => {
                for _ in 0..(*repeat).max(1) {
                    let amount = self.damage_amount(ctx, amount);
                    for t in self.resolve_targets(ctx, *target) {
                        self.deal_damage(source, t, amount);
                    }
                }
            }
            Effect::DamageAllEnemies { amount } => {
                let amount = self.damage_amount(ctx, amount);
                for t in self.resolve_targets(ctx, Target::AllEnemies) {
                    self.deal_damage(source, t, amount);
                }
            }
            Effect::Heal { amount, target } => {
                let amount = self.resolve_amount(ctx, amount);
                for t in self.resolve_targets(ctx, *target) {
                    self.heal(source, t, amount);
                }
            }
            Effect::Buff {
                attack,
                health,
                target,
            } => {
                for id in self.resolve_minions(ctx, *target) {
                    self.buff_stats(source, id, *attack, *health);
                }
            }
            Effect::BuffAndCopy {
                attack,
                health,
                target,
            } => {
                for id in self.resolve_minions(ctx, *target) {
                    if self.buff_stats(source, id, *attack, *health) {
                        self.copy_minion_to_hand(source, id, 0);
                    }
                }
            }
            Effect::Summon {
                token,
                count,
                for_enemy,
            } => {
                let owner = if *for_enemy { side.other() } else { side };
                let def = token_definition(token);
                for _ in 0..*count {
                    if self.summon_token(source, owner, Arc::clone(&def)).is_none() {
                        break;
                    }
                }
            }
            Effect::SummonCopy { target } => {
                for id in self.resolve_minions(ctx, *target) {
                    self.summon_copy(source, id);
                }
            }
            Effect::Draw { count } => {
                for _ in 0..*count {
                    self.draw_card(side);
                }
            }
            Effect::Freeze { target } => {
                for id in self.resolve_minions(ctx, *target) {
                    self.freeze(source, id);
                }
            }
            Effect::Silence { target } => {
                for id in self.resolve_minions(ctx, *target) {
                    self.silence(source, id);
                }
            }
            Effect::Destroy { target } => {
                for id in self.resolve_minions(ctx, *target) {
                    self.destroy(source, id);
                }
            }
            Effect::ConditionalDestroy {
                target,
                max_health,
                min_attack,
            } => {
                for id in self.resolve_minions(ctx, *target) {
                    let Some(m) = self.minion(id) else { continue };
                    let health_ok = max_health.map_or(true, |h| m.current_health <= h);
                    let attack_ok = min_attack.map_or(true, |a| self.effective_attack(m) >= a);
                    if health_ok && attack_ok {
                        self.destroy(source, id);
                    }
                }
            }
            Effect::GainArmor { amount } => {
                let amount = self.resolve_amount(ctx, amount);
                self.gain_armor(source, side, amount);
            }
            Effect::GrantKeyword { keyword, target } => {
                for id in self.resolve_minions(ctx, *target) {
                    self.grant_keyword(source, id, *keyword);
                }
            }
            Effect::GrantRandomKeyword { keywords, target } => {
                for id in self.resolve_minions(ctx, *target) {
                    if let Some(keyword) = self.pick_random(keywords) {
                        self.grant_keyword(source, id, keyword);
                    }
                }
            }
            Effect::ReturnToHand { target } => {
                for id in self.resolve_minions(ctx, *target) {
                    self.return_to_hand(source, id);
                }
            }
            Effect::ShuffleIntoDeck { target } => {
                for id in self.resolve_minions(ctx, *target) {
                    self.shuffle_into_deck(source, id);
                }
            }
            Effect::GainManaCrystal { amount } => {
                let cap = self.config.max_mana;
                let gained = self.player_mut(side).mana.gain_crystals(*amount, cap);
                if gained > 0 {
                    self.emit(GameEvent::ManaCrystalGained {
                        side,
                        amount: gained,
                    });
                }
                self.log(
                    LogKind::Effect,
                    Some(side),
                    format!("{} grants {} mana crystal(s)", source.name, gained),
                    Some(&source.name),
                    Some(gained as i32),
                );
            }
            Effect::GainMana { amount } => {
                self.player_mut(side).mana.gain_temporary(*amount);
                self.log(
                    LogKind::Effect,
                    Some(side),
                    format!("{} gains {} mana this turn", source.name, amount),
                    Some(&source.name),
                    Some(*amount as i32),
                );
            }
            Effect::Overload { amount } => {
                self.player_mut(side).mana.add_overload(*amount);
                self.log(
                    LogKind::Effect,
                    Some(side),
                    format!("{} overloads {} mana", source.name, amount),
                    Some(&source.name),
                    Some(*amount as i32),
                );
            }
            Effect::Resurrect { count } => self.resurrect(source, *count),
            Effect::DebuffAttack { amount, target } => {
                for id in self.resolve_minions(ctx, *target) {
                    self.buff_stats(source, id, -amount, 0);
                }
            }
            Effect::CopyToHand {
                target,
                cost_reduction,
            } => {
                for id in self.resolve_minions(ctx, *target) {
                    self.copy_minion_to_hand(source, id, *cost_reduction);
                }
            }
            Effect::AddCardToHand { card_id, count } => {
                let Some(def) = self.catalog().get(*card_id) else {
                    tracing::warn!(card_id = %card_id, source = %source.name, "card to add is not in the catalog");
                    return;
                };
                for _ in 0..*count {
                    let mut card = self.new_instance(Arc::clone(&def), side);
                    card.is_generated = true;
                    let name = card.name().to_string();
                    if self.add_to_hand(side, card) {
                        self.log(
                            LogKind::Effect,
                            Some(side),
                            format!("{} adds {} to hand", source.name, name),
                            Some(&source.name),
                            None,
                        );
                    }
                }
            }
            Effect::ReduceHandCosts { amount } => {
                for card in &mut self.player_mut(side).hand {
                    card.cost_modifier -= *amount as i32;
                }
                self.log(
                    LogKind::Effect,
                    Some(side),
                    format!("{} reduces the cost of cards in hand by {}", source.name, amount),
                    Some(&source.name),
                    Some(*amount as i32),
                );
            }
            Effect::AddCounter {
                counter,
                amount,
                max,
            } => {
                let amount = self.resolve_amount(ctx, amount);
                self.add_counter(source, *counter, amount, *max);
            }
            Effect::SpendCounter {
                counter,
                cost,
                effects,
            } => {
                let Some(state) = self.player_mut(side).artifact_state.as_mut() else {
                    return;
                };
                let value = state.counters.get_mut(*counter);
                if *value < *cost {
                    return;
                }
                *value -= cost;
                let left = *value;
                self.log(
                    LogKind::Effect,
                    Some(side),
                    format!("{} spends {} {:?} ({} left)", source.name, cost, counter, left),
                    Some(&source.name),
                    Some(left),
                );
                self.resolve_effects(ctx, effects);
            }
            Effect::DamageByCounter {
                counter,
                target,
                increment,
            } => {
                let Some(state) = self.player_mut(side).artifact_state.as_mut() else {
                    return;
                };
                let value = state.counters.get_mut(*counter);
                let amount = *value;
                *value += increment;
                for t in self.resolve_targets(ctx, *target) {
                    self.deal_damage(source, t, amount);
                }
            }
            Effect::PreventLethal { set_health } => {
                self.prevent_lethal(source, side, *set_health);
            }
            Effect::Discover { pool } => self.offer_discover(source, pool),
            Effect::Conditional { condition, effects } => {
                if self.check_condition(ctx, condition) {
                    self.resolve_effects(ctx, effects);
                }
            }
        }
    }

    fn resolve_amount(&self, ctx: &EffectContext, amount: &Amount) -> i32 {
        let side = ctx.side();
        let counter = |c: Counter| {
            self.player(side)
                .artifact_state
                .as_ref()
                .map(|s| s.counters.get(c))
                .unwrap_or(0)
        };
        match amount {
            Amount::Fixed(n) => *n,
            Amount::Dynamic(DynamicAmount::TriggerValue) => ctx.trigger_value,
            Amount::Dynamic(DynamicAmount::FriendlyMinionCount) => {
                self.player(side).battlefield.iter().filter(|m| m.is_alive()).count() as i32
            }
            Amount::Dynamic(DynamicAmount::EnemyMinionCount) => self
                .player(side.other())
                .battlefield
                .iter()
                .filter(|m| m.is_alive())
                .count() as i32,
            Amount::Dynamic(DynamicAmount::Souls) => counter(Counter::Souls),
            Amount::Dynamic(DynamicAmount::Venom) => counter(Counter::Venom),
            Amount::Dynamic(DynamicAmount::Seeds) => counter(Counter::Seeds),
        }
    }

    fn damage_amount(&self, ctx: &EffectContext, amount: &Amount) -> i32 {
        let base = self.resolve_amount(ctx, amount);
        if ctx.source.kind == SourceKind::Spell && base > 0 {
            base + self.spell_damage(ctx.side())
        } else {
            base
        }
    }

    fn living_minions(&self, side: Side) -> Vec<InstanceId> {
        self.player(side)
            .battlefield
            .iter()
            .filter(|m| m.is_alive())
            .map(|m| m.instance_id)
            .collect()
    }

    /// Resolve a selector against the current board
    pub fn resolve_targets(&mut self, ctx: &EffectContext, target: Target) -> Vec<TargetRef> {
        let side = ctx.side();
        let enemy = side.other();
        let minions = |ids: Vec<InstanceId>| ids.into_iter().map(TargetRef::Minion).collect::<Vec<_>>();
        let self_id = ctx
            .source
            .instance
            .filter(|_| ctx.source.kind == SourceKind::Minion);
        match target {
            Target::Chosen => ctx.chosen.filter(|t| self.target_exists(*t)).into_iter().collect(),
            Target::Subject => ctx.subject.filter(|t| self.target_exists(*t)).into_iter().collect(),
            Target::SelfMinion => self_id
                .filter(|id| self.minion(*id).is_some())
                .map(TargetRef::Minion)
                .into_iter()
                .collect(),
            Target::EnemyHero => vec![TargetRef::Hero(enemy)],
            Target::FriendlyHero => vec![TargetRef::Hero(side)],
            Target::RandomEnemyMinion => {
                let pool = self.living_minions(enemy);
                self.pick_random(&pool).map(TargetRef::Minion).into_iter().collect()
            }
            Target::RandomFriendlyMinion => {
                let pool: Vec<_> = self
                    .living_minions(side)
                    .into_iter()
                    .filter(|id| Some(*id) != self_id)
                    .collect();
                self.pick_random(&pool).map(TargetRef::Minion).into_iter().collect()
            }
            Target::RandomEnemyCharacter => {
                let mut pool = minions(self.living_minions(enemy));
                pool.push(TargetRef::Hero(enemy));
                self.pick_random(&pool).into_iter().collect()
            }
            Target::AllEnemyMinions => minions(self.living_minions(enemy)),
            Target::AllFriendlyMinions => minions(self.living_minions(side)),
            Target::OtherFriendlyMinions => minions(
                self.living_minions(side)
                    .into_iter()
                    .filter(|id| Some(*id) != self_id)
                    .collect(),
            ),
            Target::AllMinions => {
                let mut all = minions(self.living_minions(side));
                all.extend(minions(self.living_minions(enemy)));
                all
            }
            Target::AllEnemies => {
                let mut all = minions(self.living_minions(enemy));
                all.push(TargetRef::Hero(enemy));
                all
            }
            Target::AllFriendlyCharacters => {
                let mut all = minions(self.living_minions(side));
                all.push(TargetRef::Hero(side));
                all
            }
            Target::MostDamagedFriendly => {
                let player = self.player(side);
                let mut best: Option<(i32, TargetRef)> = None;
                let hero_missing = player.max_health - player.hero_health;
                if hero_missing > 0 {
                    best = Some((hero_missing, TargetRef::Hero(side)));
                }
                for m in player.battlefield.iter().filter(|m| m.is_alive()) {
                    let missing = m.max_health - m.current_health;
                    if missing > 0 && best.map_or(true, |(b, _)| missing > b) {
                        best = Some((missing, TargetRef::Minion(m.instance_id)));
                    }
                }
                best.map(|(_, t)| t).into_iter().collect()
            }
        }
    }

    fn resolve_minions(&mut self, ctx: &EffectContext, target: Target) -> Vec<InstanceId> {
        self.resolve_targets(ctx, target)
            .into_iter()
            .filter_map(TargetRef::minion)
            .collect()
    }

    /// Evaluate a board predicate from the source owner's point of view
    pub fn check_condition(&self, ctx: &EffectContext, condition: &Condition) -> bool {
        let side = ctx.side();
        let player = self.player(side);
        let artifact = player.artifact_state.as_ref();
        let alive = |s: Side| self.player(s).battlefield.iter().filter(|m| m.is_alive()).count();
        match condition {
            Condition::HeroDamagedThisTurn => artifact.map_or(false, |a| a.hero_damaged_this_turn),
            Condition::HandSizeAtMost { count } => player.hand.len() <= *count,
            Condition::CardsPlayedThisTurnAtLeast { count } => player.cards_played_this_turn >= *count,
            Condition::SpellsCastThisTurnAtLeast { count } => {
                artifact.map_or(false, |a| a.spells_cast_this_turn >= *count)
            }
            Condition::FriendlyMinionsAtLeast { count } => alive(side) >= *count,
            Condition::FewerMinionsThanOpponent => alive(side) < alive(side.other()),
            Condition::HeroAtFullHealth => player.hero_health >= player.max_health,
            Condition::ArmorAtLeast { amount } => player.hero_armor >= *amount,
            Condition::SubjectCostAtLeast { cost } => ctx
                .subject
                .and_then(TargetRef::minion)
                .and_then(|id| self.minion(id))
                .map_or(false, |m| m.mana_cost() >= *cost),
            Condition::CounterAtLeast { counter, amount } => {
                artifact.map_or(false, |a| a.counters.get(*counter) >= *amount)
            }
        }
    }

    fn grant_keyword(&mut self, source: &Source, id: InstanceId, keyword: crate::core::Keyword) {
        let Some(minion) = self.minion_mut(id) else {
            return;
        };
        minion.set_keyword(keyword, true);
        if matches!(keyword, crate::core::Keyword::Charge | crate::core::Keyword::Rush)
            && !minion.is_frozen
            && minion.attacks_performed < minion.max_attacks_per_turn()
        {
            minion.can_attack = true;
        }
        let name = minion.name().to_string();
        self.log(
            LogKind::Effect,
            Some(source.side),
            format!("{} grants {:?} to {}", source.name, keyword, name),
            Some(&source.name),
            None,
        );
    }

    fn copy_minion_to_hand(&mut self, source: &Source, id: InstanceId, cost_reduction: u8) {
        let Some(def) = self.minion(id).map(|m| Arc::clone(&m.definition)) else {
            return;
        };
        let mut card = self.new_instance(def, source.side);
        card.is_generated = true;
        card.cost_modifier -= cost_reduction as i32;
        let name = card.name().to_string();
        if self.add_to_hand(source.side, card) {
            self.log(
                LogKind::Effect,
                Some(source.side),
                format!("{} adds a copy of {} to hand", source.name, name),
                Some(&source.name),
                None,
            );
        }
    }

    fn summon_copy(&mut self, source: &Source, id: InstanceId) {
        let Some(original) = self.minion(id).cloned() else {
            return;
        };
        if self.player(source.side).battlefield.len() >= self.config.battlefield_cap {
            return;
        }
        let mut copy = self.new_instance(Arc::clone(&original.definition), source.side);
        copy.current_attack = original.current_attack;
        copy.current_health = original.current_health;
        copy.max_health = original.max_health;
        copy.is_generated = true;
        self.place_on_battlefield(source, copy, None, false);
    }

    fn resurrect(&mut self, source: &Source, count: u8) {
        let mut pool: Vec<Arc<CardDefinition>> = Vec::new();
        for card in self.player(source.side).dead_minions() {
            if card.definition.id.as_u32() != 0 && !pool.iter().any(|d| d.id == card.definition.id) {
                pool.push(Arc::clone(&card.definition));
            }
        }
        for _ in 0..count {
            if pool.is_empty() {
                break;
            }
            let idx = self.pick_random(&(0..pool.len()).collect::<Vec<_>>()).unwrap_or(0);
            let def = pool.remove(idx);
            if self.summon_token(source, source.side, def).is_none() {
                break;
            }
        }
    }

    fn add_counter(&mut self, source: &Source, counter: Counter, amount: i32, max: Option<i32>) {
        let side = source.side;
        let Some(state) = self.player_mut(side).artifact_state.as_mut() else {
            tracing::debug!(source = %source.name, "counter effect without an equipped artifact");
            return;
        };
        let value = state.counters.get_mut(counter);
        *value += amount;
        if let Some(max) = max {
            *value = (*value).min(max);
        }
        let now = *value;
        self.log(
            LogKind::Effect,
            Some(side),
            format!("{} {:?} is now {}", source.name, counter, now),
            Some(&source.name),
            Some(now),
        );
    }

    fn offer_discover(&mut self, source: &Source, pool: &DiscoverPool) {
        if self.pending_discover.is_some() {
            tracing::warn!(source = %source.name, "discover while another choice is pending, skipped");
            return;
        }
        let mut candidates: Vec<_> = if pool.card_ids.is_empty() {
            self.catalog()
                .collectible()
                .filter(|d| pool.kind.map_or(true, |k| d.kind == k))
                .filter(|d| pool.max_cost.map_or(true, |c| d.mana_cost <= c))
                .map(|d| d.id)
                .collect()
        } else {
            pool.card_ids.clone()
        };
        candidates.shuffle(&mut self.rng);
        candidates.truncate(DISCOVER_OPTIONS);
        if candidates.is_empty() {
            self.log(
                LogKind::Warning,
                Some(source.side),
                format!("{}: nothing to discover", source.name),
                Some(&source.name),
                None,
            );
            return;
        }
        self.pending_discover = Some(PendingDiscover {
            side: source.side,
            options: candidates.clone(),
            source: source.name.clone(),
        });
        self.emit(GameEvent::DiscoverOffered {
            side: source.side,
            options: candidates,
        });
        self.log(
            LogKind::Effect,
            Some(source.side),
            format!("{} offers a discover choice", source.name),
            Some(&source.name),
            None,
        );
    }

    /// Resolve a minion's deathrattle after it has left the battlefield
    pub(crate) fn resolve_deathrattle(&mut self, card: &CardInstance) {
        let effects = card.deathrattle().to_vec();
        if effects.is_empty() {
            return;
        }
        if !self.enter_cascade() {
            tracing::warn!(card = %card.name(), "cascade depth exceeded, deathrattle skipped");
            return;
        }
        self.emit(GameEvent::DeathrattleTriggered {
            side: card.owner,
            source: card.instance_id,
            name: card.name().to_string(),
        });
        self.log(
            LogKind::Trigger,
            Some(card.owner),
            format!("{}'s deathrattle triggers", card.name()),
            Some(card.name()),
            None,
        );
        let ctx = EffectContext::new(Source::card(card, SourceKind::Minion));
        self.resolve_effects(&ctx, &effects);
        self.exit_cascade();
    }

    fn collect_triggers(
        &self,
        trigger: Trigger,
        side: Side,
        subject: Option<TargetRef>,
    ) -> Vec<(TriggerSource, TriggeredEffect)> {
        let player = self.player(side);
        let mut found = Vec::new();
        if let Some(artifact) = player.artifact.as_ref() {
            for te in artifact.triggers().iter().filter(|t| t.trigger == trigger) {
                found.push((TriggerSource::Artifact(artifact.instance_id), te.clone()));
            }
        }
        let about_self = matches!(trigger, Trigger::OnSummon | Trigger::OnMinionPlay);
        for minion in player.battlefield.iter().filter(|m| m.is_alive()) {
            if about_self && subject == Some(TargetRef::Minion(minion.instance_id)) {
                continue;
            }
            for te in minion.triggers().iter().filter(|t| t.trigger == trigger) {
                found.push((TriggerSource::Minion(minion.instance_id), te.clone()));
            }
        }
        for secret in &player.secrets {
            for te in secret.triggers().iter().filter(|t| t.trigger == trigger) {
                found.push((TriggerSource::Secret(secret.instance_id), te.clone()));
            }
        }
        found
    }

    fn trigger_source_card(&self, side: Side, src: TriggerSource) -> Option<&CardInstance> {
        let player = self.player(side);
        match src {
            TriggerSource::Artifact(id) => player.artifact.as_ref().filter(|a| a.instance_id == id),
            TriggerSource::Minion(id) => player.minion(id).filter(|m| m.is_alive()),
            TriggerSource::Secret(id) => player.secrets.iter().find(|s| s.instance_id == id),
        }
    }

    fn try_use_gate(&mut self, side: Side, src: TriggerSource, gate: &Gate) -> bool {
        let player = self.player_mut(side);
        match src {
            TriggerSource::Artifact(_) => match player.artifact_state.as_mut() {
                Some(state) => state.gates.try_use(gate.scope, &gate.key),
                None => false,
            },
            TriggerSource::Minion(id) => match player.minion_mut(id) {
                Some(minion) => minion.gates.try_use(gate.scope, &gate.key),
                None => false,
            },
            TriggerSource::Secret(_) => true,
        }
    }

    /// Fire every `trigger` descriptor owned by `side`
    pub fn fire_trigger(&mut self, trigger: Trigger, side: Side, subject: Option<TargetRef>, value: i32) {
        if self.is_game_over() {
            return;
        }
        let pending = self.collect_triggers(trigger, side, subject);
        if pending.is_empty() {
            return;
        }
        if !self.enter_cascade() {
            tracing::warn!(?trigger, %side, "cascade depth exceeded, trigger skipped");
            self.log(
                LogKind::Warning,
                Some(side),
                format!("Trigger {:?} skipped: cascade too deep", trigger),
                None,
                None,
            );
            return;
        }
        for (src, triggered) in pending {
            if self.is_game_over() {
                break;
            }
            self.run_triggered(side, src, &triggered, subject, value);
        }
        self.exit_cascade();
    }

    fn run_triggered(
        &mut self,
        side: Side,
        src: TriggerSource,
        triggered: &TriggeredEffect,
        subject: Option<TargetRef>,
        value: i32,
    ) {
        let Some(card) = self.trigger_source_card(side, src) else {
            return;
        };
        let kind = match src {
            TriggerSource::Artifact(_) => SourceKind::Artifact,
            TriggerSource::Minion(_) => SourceKind::Minion,
            TriggerSource::Secret(_) => SourceKind::Secret,
        };
        let ctx = EffectContext::new(Source::card(card, kind))
            .with_subject(subject)
            .with_value(value);
        if let Some(condition) = &triggered.condition {
            if !self.check_condition(&ctx, condition) {
                return;
            }
        }
        if let Some(chance) = triggered.chance {
            if !self.roll_percent(chance) {
                return;
            }
        }
        if let Some(gate) = &triggered.gate {
            if !self.try_use_gate(side, src, gate) {
                self.log(
                    LogKind::Effect,
                    Some(side),
                    format!(
                        "{}: '{}' already used this {}",
                        ctx.source.name,
                        gate.key,
                        if gate.scope == GateScope::PerTurn { "turn" } else { "game" }
                    ),
                    Some(&ctx.source.name),
                    None,
                );
                return;
            }
        }
        let name = ctx.source.name.clone();
        match src {
            TriggerSource::Artifact(_) => {
                self.emit(GameEvent::ArtifactTriggered {
                    side,
                    name: name.clone(),
                    trigger: triggered.trigger,
                });
            }
            TriggerSource::Secret(id) => {
                if let Some(secret) = crate::zones::take(&mut self.player_mut(side).secrets, id) {
                    self.player_mut(side).graveyard.push(secret);
                }
                self.emit(GameEvent::SecretRevealed {
                    side,
                    name: name.clone(),
                });
            }
            TriggerSource::Minion(_) => {}
        }
        self.log(
            LogKind::Trigger,
            Some(side),
            format!("{} triggers ({:?})", name, triggered.trigger),
            Some(&name),
            None,
        );
        self.resolve_effects(&ctx, &triggered.effects);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::core::{ArtifactRuntimeState, CardKind, Keyword};
    use crate::game::GamePhase;
    use crate::loader::CardCatalog;

    fn state() -> GameState {
        let mut gs = GameState::new(EngineConfig::default(), Arc::new(CardCatalog::default()));
        gs.phase = GamePhase::Play;
        gs
    }

    fn put(gs: &mut GameState, side: Side, def: CardDefinition) -> InstanceId {
        let card = gs.new_instance(Arc::new(def), side);
        let id = card.instance_id;
        gs.player_mut(side).battlefield.push(card);
        id
    }

    fn spell_ctx(side: Side) -> EffectContext {
        EffectContext::new(Source::new(side, "Test Spell", SourceKind::Spell))
    }

    #[test]
    fn test_effects_resolve_in_listed_order() {
        let mut gs = state();
        let id = put(&mut gs, Side::Opponent, CardDefinition::minion(1, "Troll", 3, 3, 3));
        let effects: Vec<EffectSlot> = vec![
            Effect::Buff { attack: 0, health: 2, target: Target::AllEnemyMinions }.into(),
            Effect::Damage { amount: Amount::Fixed(4), target: Target::AllEnemyMinions, repeat: 1 }.into(),
        ];
        gs.resolve_effects(&spell_ctx(Side::Player), &effects);
        assert_eq!(gs.minion(id).unwrap().current_health, 1);
    }

    #[test]
    fn test_unknown_effect_is_skipped_and_logged() {
        let mut gs = state();
        let raw: EffectSlot = serde_json::from_str(r#"{"type":"time_warp"}"#).unwrap();
        let effects = vec![raw, Effect::GainArmor { amount: Amount::Fixed(2) }.into()];
        gs.resolve_effects(&spell_ctx(Side::Player), &effects);
        assert_eq!(gs.player(Side::Player).hero_armor, 2);
        assert!(gs
            .log
            .of_kind(LogKind::Warning)
            .any(|e| e.message.contains("time_warp")));
    }

    #[test]
    fn test_dead_minion_never_observed_by_next_effect() {
        let mut gs = state();
        put(&mut gs, Side::Opponent, CardDefinition::minion(1, "Thrall", 1, 1, 1));
        let effects: Vec<EffectSlot> = vec![
            Effect::Damage { amount: Amount::Fixed(1), target: Target::AllEnemyMinions, repeat: 1 }.into(),
            Effect::Buff { attack: 5, health: 5, target: Target::RandomEnemyMinion }.into(),
        ];
        gs.resolve_effects(&spell_ctx(Side::Player), &effects);
        assert!(gs.player(Side::Opponent).battlefield.is_empty());
        assert_eq!(gs.player(Side::Opponent).graveyard[0].current_attack, 1);
    }

    #[test]
    fn test_deathrattle_cascade_resolves_fully() {
        let mut gs = state();
        let mut bomb = CardDefinition::minion(1, "Ember Bomb", 2, 1, 1);
        bomb.deathrattle = vec![Effect::Damage {
            amount: Amount::Fixed(2),
            target: Target::AllMinions,
            repeat: 1,
        }
        .into()];
        put(&mut gs, Side::Opponent, bomb.clone());
        put(&mut gs, Side::Opponent, bomb);
        put(&mut gs, Side::Player, CardDefinition::minion(2, "Thrall", 1, 1, 2));
        let effects: Vec<EffectSlot> = vec![Effect::Damage {
            amount: Amount::Fixed(1),
            target: Target::AllEnemyMinions,
            repeat: 1,
        }
        .into()];
        gs.resolve_effects(&spell_ctx(Side::Player), &effects);
        assert!(gs.player(Side::Opponent).battlefield.is_empty());
        assert!(gs.player(Side::Player).battlefield.is_empty());
        for p in &gs.players {
            assert!(p.battlefield.iter().all(|m| m.current_health > 0));
        }
    }

    #[test]
    fn test_once_per_turn_gate_blocks_second_firing() {
        let mut gs = state();
        let mut totem = CardDefinition::new(crate::core::CardId::new(50), "Storm Totem", CardKind::Artifact, 2);
        totem.triggers = vec![TriggeredEffect::new(
            Trigger::OnSpellCast,
            vec![Effect::GainArmor { amount: Amount::Fixed(1) }],
        )
        .gated(GateScope::PerTurn, "armor")];
        let card = gs.new_instance(Arc::new(totem), Side::Player);
        gs.player_mut(Side::Player).artifact = Some(card);
        gs.player_mut(Side::Player).artifact_state = Some(ArtifactRuntimeState::default());

        gs.fire_trigger(Trigger::OnSpellCast, Side::Player, None, 0);
        gs.fire_trigger(Trigger::OnSpellCast, Side::Player, None, 0);
        assert_eq!(gs.player(Side::Player).hero_armor, 1);

        gs.player_mut(Side::Player).artifact_state.as_mut().unwrap().reset_turn();
        gs.fire_trigger(Trigger::OnSpellCast, Side::Player, None, 0);
        assert_eq!(gs.player(Side::Player).hero_armor, 2);
    }

    #[test]
    fn test_gate_blocks_reentry_within_own_cascade() {
        let mut gs = state();
        let mut thorns = CardDefinition::new(crate::core::CardId::new(51), "Thorned Mail", CardKind::Artifact, 2);
        // hurts its own hero, which raises the same trigger again
        thorns.triggers = vec![TriggeredEffect::new(
            Trigger::OnHeroDamaged,
            vec![Effect::Damage { amount: Amount::Fixed(1), target: Target::FriendlyHero, repeat: 1 }],
        )
        .gated(GateScope::PerTurn, "thorns")];
        let card = gs.new_instance(Arc::new(thorns), Side::Player);
        gs.player_mut(Side::Player).artifact = Some(card);
        gs.player_mut(Side::Player).artifact_state = Some(ArtifactRuntimeState::default());

        let axe = Source::new(Side::Opponent, "Axe", SourceKind::Hero);
        gs.deal_damage(&axe, TargetRef::Hero(Side::Player), 1);

        assert_eq!(gs.player(Side::Player).hero_health, 28);
        assert!(!gs.is_game_over());
        let gates = &gs.player(Side::Player).artifact_state.as_ref().unwrap().gates;
        assert!(gates.is_used(GateScope::PerTurn, "thorns"));
    }

    #[test]
    fn test_spend_counter_runs_nested_effects() {
        let mut gs = state();
        gs.player_mut(Side::Player).artifact_state = Some(ArtifactRuntimeState::default());
        let ctx = EffectContext::new(Source::new(Side::Player, "Soul Lantern", SourceKind::Artifact));
        let spirit = TokenSpec {
            id: None,
            name: "Spirit".into(),
            attack: 3,
            health: 3,
            keywords: Default::default(),
            race: None,
        };
        let effects: Vec<EffectSlot> = vec![
            Effect::AddCounter { counter: Counter::Souls, amount: Amount::Fixed(3), max: None }.into(),
            Effect::SpendCounter {
                counter: Counter::Souls,
                cost: 3,
                effects: vec![Effect::Summon { token: spirit, count: 1, for_enemy: false }.into()],
            }
            .into(),
        ];
        gs.resolve_effects(&ctx, &effects);
        assert_eq!(gs.player(Side::Player).battlefield.len(), 1);
        assert_eq!(
            gs.player(Side::Player).artifact_state.as_ref().unwrap().counters.souls,
            0
        );
    }

    #[test]
    fn test_escalating_damage_by_counter() {
        let mut gs = state();
        let mut st = ArtifactRuntimeState::default();
        st.counters.escalating_damage = 1;
        gs.player_mut(Side::Player).artifact_state = Some(st);
        let ctx = EffectContext::new(Source::new(Side::Player, "Ragnarok Horn", SourceKind::Artifact));
        let effects: Vec<EffectSlot> = vec![Effect::DamageByCounter {
            counter: Counter::EscalatingDamage,
            target: Target::EnemyHero,
            increment: 1,
        }
        .into()];
        gs.resolve_effects(&ctx, &effects);
        gs.resolve_effects(&ctx, &effects);
        assert_eq!(gs.player(Side::Opponent).hero_health, 27);
    }

    #[test]
    fn test_spell_damage_bonus_applies_to_spells_only() {
        let mut gs = state();
        let mut wizard = CardDefinition::minion(3, "Seer", 2, 1, 3);
        wizard.aura = Some(crate::core::Aura::SpellDamage { amount: 1 });
        put(&mut gs, Side::Player, wizard);
        let bolt: Vec<EffectSlot> = vec![Effect::Damage {
            amount: Amount::Fixed(2),
            target: Target::EnemyHero,
            repeat: 1,
        }
        .into()];
        gs.resolve_effects(&spell_ctx(Side::Player), &bolt);
        assert_eq!(gs.player(Side::Opponent).hero_health, 27);
        let ctx = EffectContext::new(Source::new(Side::Player, "Axe", SourceKind::Artifact));
        gs.resolve_effects(&ctx, &bolt);
        assert_eq!(gs.player(Side::Opponent).hero_health, 25);
    }

    #[test]
    fn test_grant_random_keyword_from_list() {
        let mut gs = state();
        let id = put(&mut gs, Side::Player, CardDefinition::minion(1, "Thrall", 1, 1, 1));
        let ctx = spell_ctx(Side::Player).with_chosen(Some(TargetRef::Minion(id)));
        let effects: Vec<EffectSlot> = vec![Effect::GrantRandomKeyword {
            keywords: vec![Keyword::Taunt],
            target: Target::Chosen,
        }
        .into()];
        gs.resolve_effects(&ctx, &effects);
        assert!(gs.minion(id).unwrap().is_taunt);
    }

    #[test]
    fn test_vanished_chosen_target_is_skipped() {
        let mut gs = state();
        let id = put(&mut gs, Side::Opponent, CardDefinition::minion(1, "Thrall", 1, 1, 1));
        let ctx = spell_ctx(Side::Player).with_chosen(Some(TargetRef::Minion(id)));
        let effects: Vec<EffectSlot> = vec![
            Effect::Destroy { target: Target::Chosen }.into(),
            Effect::Buff { attack: 1, health: 1, target: Target::Chosen }.into(),
            Effect::GainArmor { amount: Amount::Fixed(3) }.into(),
        ];
        gs.resolve_effects(&ctx, &effects);
        assert!(gs.player(Side::Opponent).battlefield.is_empty());
        assert_eq!(gs.player(Side::Player).hero_armor, 3);
    }
}
