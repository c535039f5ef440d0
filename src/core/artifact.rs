//! Equipped artifact data and its runtime state

use crate::core::{Counter, GateScope};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Starting values for the artifact counters
///
/// Doubles as the live counter storage inside `ArtifactRuntimeState`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CounterSet {
    pub souls: i32,
    pub seeds: i32,
    pub venom: i32,
    pub permanent_attack_bonus: i32,
    pub escalating_damage: i32,
    pub resurrection_charges: i32,
    pub total_damage_taken: i32,
}

impl CounterSet {
    pub fn get(&self, counter: Counter) -> i32 {
        match counter {
            Counter::Souls => self.souls,
            Counter::Seeds => self.seeds,
            Counter::Venom => self.venom,
            Counter::PermanentAttackBonus => self.permanent_attack_bonus,
            Counter::EscalatingDamage => self.escalating_damage,
            Counter::ResurrectionCharges => self.resurrection_charges,
            Counter::TotalDamageTaken => self.total_damage_taken,
        }
    }

    pub fn get_mut(&mut self, counter: Counter) -> &mut i32 {
        match counter {
            Counter::Souls => &mut self.souls,
            Counter::Seeds => &mut self.seeds,
            Counter::Venom => &mut self.venom,
            Counter::PermanentAttackBonus => &mut self.permanent_attack_bonus,
            Counter::EscalatingDamage => &mut self.escalating_damage,
            Counter::ResurrectionCharges => &mut self.resurrection_charges,
            Counter::TotalDamageTaken => &mut self.total_damage_taken,
        }
    }
}

/// Artifact-only fields of a card definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactSpec {
    /// Type-specific defaults applied whenever this artifact is equipped
    #[serde(default)]
    pub initial_state: CounterSet,
    /// Extra damage on friendly damage spells
    #[serde(default)]
    pub spell_damage: i32,
    /// Mana discount on friendly spells
    #[serde(default)]
    pub spell_cost_reduction: u8,
}

/// Once-per-turn and once-per-game gates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateBook {
    once_per_turn: BTreeSet<String>,
    once_per_game: BTreeSet<String>,
}

impl GateBook {
    pub fn is_used(&self, scope: GateScope, key: &str) -> bool {
        match scope {
            GateScope::PerTurn => self.once_per_turn.contains(key),
            GateScope::PerGame => self.once_per_game.contains(key),
        }
    }

    /// Marks the gate; returns false if it was already used
    pub fn try_use(&mut self, scope: GateScope, key: &str) -> bool {
        match scope {
            GateScope::PerTurn => self.once_per_turn.insert(key.to_string()),
            GateScope::PerGame => self.once_per_game.insert(key.to_string()),
        }
    }

    pub fn reset_turn(&mut self) {
        self.once_per_turn.clear();
    }
}

/// State that lives exactly as long as an artifact stays equipped
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRuntimeState {
    pub counters: CounterSet,
    pub gates: GateBook,
    pub spells_cast_this_turn: u32,
    pub hero_attacks_this_turn: u32,
    pub hero_damaged_this_turn: bool,
}

/// Gate key recorded by `prevent_lethal`
pub const LETHAL_PREVENTED_KEY: &str = "lethalPrevented";

impl ArtifactRuntimeState {
    pub fn new(spec: Option<&ArtifactSpec>) -> Self {
        ArtifactRuntimeState {
            counters: spec.map(|s| s.initial_state.clone()).unwrap_or_default(),
            ..Default::default()
        }
    }

    /// Clear per-turn statistics and once-per-turn gates
    pub fn reset_turn(&mut self) {
        self.gates.reset_turn();
        self.spells_cast_this_turn = 0;
        self.hero_attacks_this_turn = 0;
        self.hero_damaged_this_turn = false;
    }

    pub fn lethal_prevented(&self) -> bool {
        self.gates.is_used(GateScope::PerGame, LETHAL_PREVENTED_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_is_used_once_per_turn() {
        let mut gates = GateBook::default();
        assert!(gates.try_use(GateScope::PerTurn, "shuffleEnemy"));
        assert!(!gates.try_use(GateScope::PerTurn, "shuffleEnemy"));
        gates.reset_turn();
        assert!(gates.try_use(GateScope::PerTurn, "shuffleEnemy"));
    }

    #[test]
    fn test_per_game_gate_survives_turn_reset() {
        let mut state = ArtifactRuntimeState::default();
        assert!(state.gates.try_use(GateScope::PerGame, LETHAL_PREVENTED_KEY));
        state.reset_turn();
        assert!(state.lethal_prevented());
    }

    #[test]
    fn test_initial_state_from_spec() {
        let spec: ArtifactSpec =
            serde_json::from_str(r#"{"initialState": {"escalatingDamage": 1}}"#).unwrap();
        let state = ArtifactRuntimeState::new(Some(&spec));
        assert_eq!(state.counters.get(Counter::EscalatingDamage), 1);
        assert_eq!(state.counters.get(Counter::Souls), 0);
    }
}
