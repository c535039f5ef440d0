//! Heuristic move evaluator
//!
//! Scores every legal play in hand and picks targets greedily. Nothing here
//! mutates the game: all legality comes from the engine's `check_*` methods,
//! so the evaluator can be asked as often as needed.
//!
//! Heuristics:
//! - Minion: attack + health, keyword bonuses, stats per mana
//! - Spell, secret, quest: mana cost scaled by a constant
//! - Weapon/artifact: attack times durability
//! - Board clears gain weight against a wide enemy board
//! - Minions gain weight while our own board is thin
//! - Spending every remaining mana on one card is slightly penalised
//! - Attacks respect taunt (lowest health first), then the strongest enemy
//!   minion, then the hero

use crate::core::{CardDefinition, CardInstance, CardKind, Effect, EffectSlot, InstanceId, Keyword, Side, Target, TargetRef};
use crate::game::{play_effects, GamePhase, GameState};

/// Weight per mana for cards without a body
pub const SPELL_COST_WEIGHT: f32 = 1.5;
/// Bonus for a board-clearing spell when the enemy has more than
/// `WIDE_BOARD` minions
pub const BOARD_CLEAR_BONUS: f32 = 5.0;
pub const WIDE_BOARD: usize = 3;
/// Bonus for a minion while our own board has fewer than `THIN_BOARD` minions
pub const SMALL_BOARD_BONUS: f32 = 3.0;
pub const THIN_BOARD: usize = 2;
pub const ALL_MANA_PENALTY: f32 = 1.0;

/// A legal card play with its heuristic score
#[derive(Debug, Clone, PartialEq)]
pub struct PlayOption {
    pub instance: InstanceId,
    pub name: String,
    pub score: f32,
    pub target: Option<TargetRef>,
}

/// One step an automated player wants to take
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiAction {
    Mulligan { replace: Vec<InstanceId> },
    ResolveDiscover { index: usize },
    Play { instance: InstanceId, target: Option<TargetRef> },
    Attack { attacker: InstanceId, target: TargetRef },
    HeroAttack { target: TargetRef },
    HeroPower { target: Option<TargetRef> },
    EndTurn,
}

fn keyword_bonus(definition: &CardDefinition) -> f32 {
    definition
        .keywords
        .iter()
        .map(|k| match k {
            Keyword::Taunt => 2.0,
            Keyword::DivineShield => 3.0,
            Keyword::Charge => 2.0,
            Keyword::Windfury => 2.0,
            _ => 0.0,
        })
        .sum()
}

/// Base value of a card, independent of the board
pub fn card_score(card: &CardInstance) -> f32 {
    let definition = &card.definition;
    match definition.kind {
        CardKind::Minion => {
            let stats = (definition.attack + definition.health) as f32;
            let per_mana = stats / card.mana_cost().max(1) as f32;
            stats + keyword_bonus(definition) + per_mana
        }
        CardKind::Spell | CardKind::Secret | CardKind::Quest => card.mana_cost() as f32 * SPELL_COST_WEIGHT,
        CardKind::Weapon | CardKind::Artifact => {
            (definition.attack * definition.durability.unwrap_or(1)) as f32
        }
    }
}

fn is_board_clear(definition: &CardDefinition) -> bool {
    play_effects(definition).iter().any(|slot| match slot {
        EffectSlot::Known(Effect::DamageAllEnemies { .. }) => true,
        EffectSlot::Known(
            Effect::Damage { target, .. } | Effect::Destroy { target } | Effect::Freeze { target },
        ) => matches!(target, Target::AllEnemyMinions | Target::AllMinions | Target::AllEnemies),
        _ => false,
    })
}

/// Card value adjusted for the current board
pub fn score_play(state: &GameState, side: Side, card: &CardInstance) -> f32 {
    let player = state.player(side);
    let enemy = state.player(side.other());
    let mut score = card_score(card);
    match card.kind() {
        CardKind::Spell if enemy.battlefield.len() > WIDE_BOARD && is_board_clear(&card.definition) => {
            score += BOARD_CLEAR_BONUS;
        }
        CardKind::Minion if player.battlefield.len() < THIN_BOARD => score += SMALL_BOARD_BONUS,
        _ => {}
    }
    let cost = state.play_cost(side, card);
    if cost == player.mana.current && player.mana.current > 3 {
        score -= ALL_MANA_PENALTY;
    }
    score
}

/// Effects that help whatever they land on
fn is_beneficial(effect: &Effect) -> bool {
    matches!(
        effect,
        Effect::Buff { .. }
            | Effect::BuffAndCopy { .. }
            | Effect::Heal { .. }
            | Effect::GrantKeyword { .. }
            | Effect::GrantRandomKeyword { .. }
            | Effect::CopyToHand { .. }
            | Effect::SummonCopy { .. }
    )
}

/// Highest-attack minion among `targets` owned by `owner`; leftmost wins ties
fn strongest_minion(state: &GameState, owner: Side, targets: &[TargetRef]) -> Option<TargetRef> {
    let mut best: Option<(i32, TargetRef)> = None;
    for target in targets {
        let Some(minion) = target.minion().and_then(|id| state.player(owner).minion(id)) else {
            continue;
        };
        let attack = state.effective_attack(minion);
        if best.map_or(true, |(a, _)| attack > a) {
            best = Some((attack, *target));
        }
    }
    best.map(|(_, t)| t)
}

/// Greedy choice among `legal` for a chosen-target effect list
///
/// Harmful effects go to the strongest enemy minion, else the enemy hero.
/// Beneficial ones go to the strongest friendly minion, else our hero.
pub fn choose_target(state: &GameState, side: Side, effects: &[EffectSlot], legal: &[TargetRef]) -> Option<TargetRef> {
    let beneficial = effects.iter().any(|slot| match slot {
        EffectSlot::Known(effect) => effect.uses_chosen_target() && is_beneficial(effect),
        EffectSlot::Unrecognized(_) => false,
    });
    let toward = if beneficial { side } else { side.other() };
    strongest_minion(state, toward, legal)
        .or_else(|| legal.iter().copied().find(|t| *t == TargetRef::Hero(toward)))
        .or_else(|| legal.first().copied())
}

/// Every legal play for `side`, best first
pub fn evaluate_plays(state: &GameState, side: Side) -> Vec<PlayOption> {
    let mut options = Vec::new();
    for card in &state.player(side).hand {
        let target = if state.needs_target(card) {
            let legal = state.legal_targets(side, card);
            choose_target(state, side, play_effects(&card.definition), &legal)
        } else {
            None
        };
        if state.check_play(side, card.instance_id, target).is_err() {
            continue;
        }
        options.push(PlayOption {
            instance: card.instance_id,
            name: card.name().to_string(),
            score: score_play(state, side, card),
            target,
        });
    }
    options.sort_by(|a, b| b.score.total_cmp(&a.score));
    options
}

/// Where an attacker of `side` should swing
///
/// Taunt minions come first, lowest health preferred. Otherwise the
/// strongest visible enemy minion, and the hero when the board is empty and
/// `can_hit_hero` holds.
pub fn attack_target(state: &GameState, side: Side, can_hit_hero: bool) -> Option<TargetRef> {
    let enemy = state.player(side.other());
    let visible: Vec<&CardInstance> = enemy
        .battlefield
        .iter()
        .filter(|m| m.is_alive() && !m.is_stealth)
        .collect();

    let mut taunt: Option<&CardInstance> = None;
    for m in visible.iter().filter(|m| m.is_taunt) {
        if taunt.map_or(true, |t| m.current_health < t.current_health) {
            taunt = Some(m);
        }
    }
    if let Some(m) = taunt {
        return Some(TargetRef::Minion(m.instance_id));
    }
    let targets: Vec<TargetRef> = visible.iter().map(|m| TargetRef::Minion(m.instance_id)).collect();
    strongest_minion(state, side.other(), &targets).or(can_hit_hero.then_some(TargetRef::Hero(side.other())))
}

/// Attacks every ready minion of `side` would make on the current board
pub fn plan_attacks(state: &GameState, side: Side) -> Vec<(InstanceId, TargetRef)> {
    state
        .player(side)
        .battlefield
        .iter()
        .filter_map(|m| {
            let can_hit_hero = !m.is_summoning_sick || m.has_charge;
            let target = attack_target(state, side, can_hit_hero)?;
            state
                .check_minion_attack(side, m.instance_id, target)
                .ok()
                .map(|_| (m.instance_id, target))
        })
        .collect()
}

fn hero_power_target(state: &GameState, side: Side) -> Option<TargetRef> {
    let legal: Vec<TargetRef> = Side::BOTH
        .iter()
        .flat_map(|s| {
            std::iter::once(TargetRef::Hero(*s)).chain(
                state
                    .player(*s)
                    .battlefield
                    .iter()
                    .filter(|m| m.is_alive() && (*s == side || !m.is_stealth))
                    .map(|m| TargetRef::Minion(m.instance_id)),
            )
        })
        .collect();
    choose_target(state, side, &state.player(side).hero_power.effects, &legal)
}

/// Next step for `side`, or `None` when it has nothing to do right now
pub fn choose_action(state: &GameState, side: Side) -> Option<AiAction> {
    if state.is_game_over() {
        return None;
    }
    let player = state.player(side);

    if state.phase == GamePhase::Mulligan {
        if player.mulligan_done {
            return None;
        }
        let replace = player
            .hand
            .iter()
            .filter(|c| !c.is_generated && c.mana_cost() >= 5)
            .map(|c| c.instance_id)
            .collect();
        return Some(AiAction::Mulligan { replace });
    }

    if let Some(pending) = state.pending_discover.as_ref() {
        if pending.side != side {
            return None;
        }
        let mut best = (0, 0);
        for (index, id) in pending.options.iter().enumerate() {
            let cost = state.catalog().get(*id).map_or(0, |d| d.mana_cost);
            if cost > best.1 {
                best = (index, cost);
            }
        }
        return Some(AiAction::ResolveDiscover { index: best.0 });
    }

    if state.current_turn() != side {
        return None;
    }

    if let Some(best) = evaluate_plays(state, side).into_iter().find(|o| o.score > 0.0) {
        return Some(AiAction::Play {
            instance: best.instance,
            target: best.target,
        });
    }

    if let Some((attacker, target)) = plan_attacks(state, side).into_iter().next() {
        return Some(AiAction::Attack { attacker, target });
    }

    if let Some(target) = attack_target(state, side, true) {
        if state.check_hero_attack(side, target).is_ok() {
            return Some(AiAction::HeroAttack { target });
        }
    }

    let power_target = hero_power_target(state, side);
    if let Ok(target) = state.check_hero_power(side, power_target) {
        return Some(AiAction::HeroPower { target });
    }

    Some(AiAction::EndTurn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::core::{Amount, CardId};
    use crate::loader::CardCatalog;
    use std::sync::Arc;

    fn state() -> GameState {
        let mut gs = GameState::new(EngineConfig::default(), Arc::new(CardCatalog::default()));
        gs.phase = GamePhase::Play;
        gs.turn.begin();
        for side in Side::BOTH {
            gs.player_mut(side).mana.max = 10;
            gs.player_mut(side).mana.current = 10;
        }
        gs
    }

    fn in_hand(gs: &mut GameState, side: Side, def: CardDefinition) -> InstanceId {
        let card = gs.new_instance(Arc::new(def), side);
        let id = card.instance_id;
        gs.player_mut(side).hand.push(card);
        id
    }

    fn put(gs: &mut GameState, side: Side, def: CardDefinition) -> InstanceId {
        let card = gs.new_instance(Arc::new(def), side);
        let id = card.instance_id;
        gs.player_mut(side).battlefield.push(card);
        id
    }

    #[test]
    fn test_minion_score_counts_keywords_and_efficiency() {
        let gs = &mut state();
        let id = in_hand(
            gs,
            Side::Player,
            CardDefinition::minion(1, "Shieldmaiden", 2, 2, 2).with_keywords(&[Keyword::Taunt, Keyword::DivineShield]),
        );
        let card = gs.player(Side::Player).hand.iter().find(|c| c.instance_id == id).unwrap();
        // 4 stats + 5 keywords + 2 per mana
        assert_eq!(card_score(card), 11.0);
    }

    #[test]
    fn test_weapon_score_is_attack_times_durability() {
        let gs = &mut state();
        let mut axe = CardDefinition::new(CardId::new(5), "Bearded Axe", CardKind::Weapon, 3);
        axe.attack = 3;
        axe.durability = Some(2);
        in_hand(gs, Side::Player, axe);
        assert_eq!(card_score(&gs.player(Side::Player).hand[0]), 6.0);
    }

    #[test]
    fn test_board_heuristics() {
        let mut gs = state();
        let mut storm = CardDefinition::spell(30, "Fimbul Storm", 4);
        storm.spell_effects = vec![Effect::DamageAllEnemies { amount: Amount::Fixed(2) }.into()];
        let storm = in_hand(&mut gs, Side::Player, storm);
        let thrall = in_hand(&mut gs, Side::Player, CardDefinition::minion(31, "Thrall", 1, 1, 1));
        for _ in 0..4 {
            put(&mut gs, Side::Opponent, CardDefinition::minion(32, "Draugr", 1, 1, 1));
        }
        let options = evaluate_plays(&gs, Side::Player);
        let score = |id| options.iter().find(|o| o.instance == id).unwrap().score;
        assert_eq!(score(storm), 4.0 * SPELL_COST_WEIGHT + BOARD_CLEAR_BONUS);
        assert_eq!(score(thrall), 2.0 + 2.0 + SMALL_BOARD_BONUS);
        assert_eq!(options[0].instance, storm);
    }

    #[test]
    fn test_all_mana_penalty() {
        let mut gs = state();
        gs.player_mut(Side::Player).mana.current = 4;
        let spell = in_hand(&mut gs, Side::Player, CardDefinition::spell(33, "Rune of Ice", 4));
        let options = evaluate_plays(&gs, Side::Player);
        assert_eq!(options[0].instance, spell);
        assert_eq!(options[0].score, 4.0 * SPELL_COST_WEIGHT - ALL_MANA_PENALTY);
    }

    #[test]
    fn test_unaffordable_cards_are_not_options() {
        let mut gs = state();
        gs.player_mut(Side::Player).mana.current = 1;
        in_hand(&mut gs, Side::Player, CardDefinition::minion(34, "Jotun", 8, 8, 8));
        assert!(evaluate_plays(&gs, Side::Player).is_empty());
    }

    #[test]
    fn test_damage_targets_strongest_enemy_minion() {
        let mut gs = state();
        let mut bolt = CardDefinition::spell(20, "Lightning Rune", 3);
        bolt.spell_effects = vec![Effect::Damage {
            amount: Amount::Fixed(3),
            target: Target::Chosen,
            repeat: 1,
        }
        .into()];
        in_hand(&mut gs, Side::Player, bolt);
        assert_eq!(evaluate_plays(&gs, Side::Player)[0].target, Some(TargetRef::Hero(Side::Opponent)));

        put(&mut gs, Side::Opponent, CardDefinition::minion(1, "Small", 1, 1, 1));
        let big = put(&mut gs, Side::Opponent, CardDefinition::minion(2, "Big", 4, 5, 5));
        assert_eq!(evaluate_plays(&gs, Side::Player)[0].target, Some(TargetRef::Minion(big)));
    }

    #[test]
    fn test_attack_respects_taunt_lowest_health() {
        let mut gs = state();
        let attacker = put(&mut gs, Side::Player, CardDefinition::minion(1, "Berserker", 3, 3, 3));
        put(&mut gs, Side::Opponent, CardDefinition::minion(2, "Ogre", 5, 5, 5));
        put(&mut gs, Side::Opponent, CardDefinition::minion(3, "Wall", 2, 0, 6).with_keywords(&[Keyword::Taunt]));
        let guard = put(&mut gs, Side::Opponent, CardDefinition::minion(4, "Guard", 1, 1, 1).with_keywords(&[Keyword::Taunt]));
        assert_eq!(plan_attacks(&gs, Side::Player), vec![(attacker, TargetRef::Minion(guard))]);
    }

    #[test]
    fn test_attack_prefers_strongest_then_hero() {
        let mut gs = state();
        put(&mut gs, Side::Player, CardDefinition::minion(1, "Berserker", 3, 3, 3));
        assert_eq!(attack_target(&gs, Side::Player, true), Some(TargetRef::Hero(Side::Opponent)));
        let ogre = put(&mut gs, Side::Opponent, CardDefinition::minion(2, "Ogre", 5, 5, 5));
        put(&mut gs, Side::Opponent, CardDefinition::minion(3, "Imp", 1, 1, 1));
        assert_eq!(attack_target(&gs, Side::Player, true), Some(TargetRef::Minion(ogre)));
    }

    #[test]
    fn test_evaluator_does_not_mutate() {
        let mut gs = state();
        in_hand(&mut gs, Side::Player, CardDefinition::minion(1, "Thrall", 1, 1, 1));
        put(&mut gs, Side::Opponent, CardDefinition::minion(2, "Ogre", 5, 5, 5));
        let before = serde_json::to_string(&gs).unwrap();
        let _ = choose_action(&gs, Side::Player);
        let _ = evaluate_plays(&gs, Side::Player);
        assert_eq!(serde_json::to_string(&gs).unwrap(), before);
    }

    #[test]
    fn test_turn_ends_when_nothing_left() {
        let mut gs = state();
        gs.player_mut(Side::Player).hero_power.used = true;
        assert_eq!(choose_action(&gs, Side::Player), Some(AiAction::EndTurn));
        assert_eq!(choose_action(&gs, Side::Opponent), None);
    }
}
