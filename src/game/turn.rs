//! Turn lifecycle
//!
//! The only code that flips `current_turn` and advances `turn_number`.
//! Starting a turn runs, in order: mana (crystal plus pending overload),
//! minion attack eligibility, per-turn artifact and gate resets, per-turn
//! player counters, `startOfTurn` triggers, then the turn's draw.

use crate::core::{InstanceId, Side, Trigger};
use crate::error::ActionRejection;
use crate::events::GameEvent;
use crate::game::{GamePhase, GameState, LogKind, TurnStructure};
use crate::zones;
use crate::Result;
use std::collections::BTreeSet;

impl GameState {
    /// Deal opening hands and give the second side The Coin
    pub fn begin_match(&mut self, first: Side) {
        self.turn = TurnStructure::new(first);
        self.phase = GamePhase::Mulligan;
        for (side, size) in [
            (first, self.config.first_hand_size),
            (first.other(), self.config.second_hand_size),
        ] {
            for _ in 0..size {
                self.draw_card(side);
            }
        }
        let coin = self.catalog().coin();
        let mut coin = self.new_instance(coin, first.other());
        coin.is_generated = true;
        self.add_to_hand(first.other(), coin);

        self.emit(GameEvent::GameStarted { first });
        self.log(
            LogKind::Turn,
            Some(first),
            format!(
                "Match started: {} vs {}, {} goes first",
                self.player(Side::Player).hero_name,
                self.player(Side::Opponent).hero_name,
                first
            ),
            None,
            None,
        );
    }

    fn check_mulligan(&self, side: Side, replace: &[InstanceId]) -> std::result::Result<(), ActionRejection> {
        if self.is_game_over() {
            return Err(ActionRejection::GameOver);
        }
        if self.phase != GamePhase::Mulligan {
            return Err(ActionRejection::WrongPhase);
        }
        let player = self.player(side);
        if player.mulligan_done {
            return Err(ActionRejection::MulliganDone);
        }
        for id in replace {
            let card = player
                .hand
                .iter()
                .find(|c| c.instance_id == *id)
                .ok_or(ActionRejection::CardNotInHand)?;
            if card.is_generated {
                return Err(ActionRejection::IllegalTarget);
            }
        }
        Ok(())
    }

    /// Swap the chosen opening-hand cards for new draws
    ///
    /// Replacement cards are drawn before the returned cards go back into the
    /// deck, so a card is never redrawn by the mulligan that set it aside.
    /// Once both sides have finished, the first turn starts.
    pub fn complete_mulligan(&mut self, side: Side, replace: &[InstanceId]) -> Result<()> {
        self.check_mulligan(side, replace)?;

        let unique: BTreeSet<InstanceId> = replace.iter().copied().collect();
        let mut set_aside = Vec::with_capacity(unique.len());
        for id in &unique {
            if let Some(card) = zones::take(&mut self.player_mut(side).hand, *id) {
                set_aside.push(card);
            }
        }
        for _ in 0..set_aside.len() {
            self.draw_card(side);
        }
        let replaced = set_aside.len();
        self.player_mut(side).deck.extend(set_aside);
        self.player_mut(side).mulligan_done = true;

        self.emit(GameEvent::MulliganCompleted { side, replaced });
        self.log(
            LogKind::Action,
            Some(side),
            format!("The {} replaces {} card(s)", side, replaced),
            None,
            Some(replaced as i32),
        );

        if Side::BOTH.iter().all(|s| self.player(*s).mulligan_done) {
            self.phase = GamePhase::Play;
            self.turn.begin();
            self.start_turn();
        }
        Ok(())
    }

    /// Start-of-turn bookkeeping for the side whose turn it now is
    pub(crate) fn start_turn(&mut self) {
        let side = self.current_turn();
        let turn = self.turn_number();
        self.emit(GameEvent::TurnStarted { side, turn });
        self.log(
            LogKind::Turn,
            Some(side),
            format!("Turn {}: the {} ({}) begins", turn, side, self.player(side).hero_name),
            None,
            None,
        );

        let cap = self.config.max_mana.min(crate::core::MAX_MANA);
        let player = self.player_mut(side);
        let before = player.mana.max;
        player.mana.start_turn(cap);
        let gained = player.mana.max - before;
        let (current, max, overloaded) = (player.mana.current, player.mana.max, player.mana.overloaded);

        for minion in player.battlefield.iter_mut() {
            minion.is_summoning_sick = false;
            minion.attacks_performed = 0;
            minion.can_attack = !minion.is_frozen;
            minion.gates.reset_turn();
        }
        if let Some(state) = player.artifact_state.as_mut() {
            state.reset_turn();
        }
        player.cards_played_this_turn = 0;
        player.hero_attacks_this_turn = 0;
        player.hero_power.used = false;

        if gained > 0 {
            self.emit(GameEvent::ManaCrystalGained { side, amount: gained });
        }
        self.log(
            LogKind::Effect,
            Some(side),
            format!("The {} has {}/{} mana ({} overloaded)", side, current, max, overloaded),
            None,
            Some(current as i32),
        );

        self.fire_trigger(Trigger::StartOfTurn, side, None, 0);
        if !self.is_game_over() {
            self.draw_card(side);
        }
    }

    fn check_end_turn(&self, side: Side) -> std::result::Result<(), ActionRejection> {
        if self.is_game_over() {
            return Err(ActionRejection::GameOver);
        }
        if self.phase != GamePhase::Play {
            return Err(ActionRejection::WrongPhase);
        }
        if side != self.current_turn() {
            return Err(ActionRejection::NotYourTurn);
        }
        if self.pending_discover.is_some() {
            return Err(ActionRejection::DiscoveryPending);
        }
        Ok(())
    }

    /// Finish `side`'s turn and hand control to the other side
    pub fn end_turn(&mut self, side: Side) -> Result<()> {
        self.check_end_turn(side)?;
        let turn = self.turn_number();

        self.fire_trigger(Trigger::EndOfTurn, side, None, 0);
        if self.is_game_over() {
            return Ok(());
        }

        let mut thawed = Vec::new();
        for minion in self.player_mut(side).battlefield.iter_mut() {
            if minion.is_frozen && minion.frozen_on_turn.is_some_and(|t| t < turn) {
                minion.is_frozen = false;
                minion.frozen_on_turn = None;
                thawed.push(minion.name().to_string());
            }
        }
        for name in thawed {
            self.log(LogKind::Effect, Some(side), format!("{} thaws", name), Some(&name), None);
        }

        self.emit(GameEvent::TurnEnded { side, turn });
        self.log(
            LogKind::Turn,
            Some(side),
            format!("Turn {}: the {} ends its turn", turn, side),
            None,
            None,
        );

        self.turn.next_turn();
        self.start_turn();
        Ok(())
    }
}
