//! Main game state structure

use crate::config::EngineConfig;
use crate::core::{
    Aura, CardDefinition, CardId, CardInstance, InstanceId, InstanceIdAllocator, PlayerState,
    Side, TargetRef,
};
use crate::events::GameEvent;
use crate::game::{GameLog, GamePhase, LogKind, TurnStructure};
use crate::loader::CardCatalog;
use crate::zones::{self, Location};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A discover choice waiting for the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingDiscover {
    pub side: Side,
    pub options: Vec<CardId>,
    pub source: String,
}

/// Complete game state
///
/// The single root of a match. The engine owns it exclusively while an action
/// resolves; nothing else mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub turn: TurnStructure,
    pub phase: GamePhase,
    pub winner: Option<Side>,
    /// Indexed by `Side::index()`
    pub players: [PlayerState; 2],
    pub log: GameLog,
    pub config: EngineConfig,
    pub pending_discover: Option<PendingDiscover>,

    /// Gameplay RNG (serializable for deterministic replay)
    pub rng: ChaCha12Rng,

    ids: InstanceIdAllocator,

    #[serde(skip)]
    catalog: Arc<CardCatalog>,

    /// Events produced by the action in flight, drained at the action boundary
    #[serde(skip)]
    outbox: Vec<(u32, GameEvent)>,

    #[serde(skip)]
    cascade_depth: u32,
}

impl GameState {
    pub fn new(config: EngineConfig, catalog: Arc<CardCatalog>) -> Self {
        let seed = config.seed.unwrap_or(0);
        let players = [
            PlayerState::new(Side::Player, "Player", config.starting_health),
            PlayerState::new(Side::Opponent, "Opponent", config.starting_health),
        ];
        let mut state = GameState {
            turn: TurnStructure::new(Side::Player),
            phase: GamePhase::Mulligan,
            winner: None,
            players,
            log: GameLog::new(),
            config,
            pending_discover: None,
            rng: ChaCha12Rng::seed_from_u64(seed),
            ids: InstanceIdAllocator::new(),
            catalog,
            outbox: Vec::new(),
            cascade_depth: 0,
        };
        let cost = state.config.hero_power_cost;
        for p in &mut state.players {
            p.hero_power.cost = cost;
        }
        state
    }

    /// Set the RNG seed for deterministic gameplay
    pub fn seed_rng(&mut self, seed: u64) {
        self.rng = ChaCha12Rng::seed_from_u64(seed);
    }

    pub fn catalog(&self) -> &Arc<CardCatalog> {
        &self.catalog
    }

    /// Reattach the catalog after deserializing a saved state
    pub fn attach_catalog(&mut self, catalog: Arc<CardCatalog>) {
        self.catalog = catalog;
    }

    pub fn turn_number(&self) -> u32 {
        self.turn.turn_number()
    }

    pub fn current_turn(&self) -> Side {
        self.turn.current_turn()
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    pub fn player(&self, side: Side) -> &PlayerState {
        &self.players[side.index()]
    }

    pub fn player_mut(&mut self, side: Side) -> &mut PlayerState {
        &mut self.players[side.index()]
    }

    /// Create a runtime instance with a fresh id
    pub fn new_instance(&mut self, definition: Arc<CardDefinition>, owner: Side) -> CardInstance {
        let id = self.ids.next_id();
        CardInstance::new(id, definition, owner)
    }

    pub fn locate(&self, id: InstanceId) -> Option<Location> {
        zones::locate(&self.players, id)
    }

    /// A living minion on either battlefield
    pub fn minion(&self, id: InstanceId) -> Option<&CardInstance> {
        self.players
            .iter()
            .flat_map(|p| p.battlefield.iter())
            .find(|m| m.instance_id == id && m.is_alive())
    }

    pub fn minion_mut(&mut self, id: InstanceId) -> Option<&mut CardInstance> {
        self.players
            .iter_mut()
            .flat_map(|p| p.battlefield.iter_mut())
            .find(|m| m.instance_id == id && m.is_alive())
    }

    /// Whether the target still exists and can be affected
    pub fn target_exists(&self, target: TargetRef) -> bool {
        match target {
            TargetRef::Hero(_) => true,
            TargetRef::Minion(id) => self.minion(id).is_some(),
        }
    }

    /// Side owning a target
    pub fn target_side(&self, target: TargetRef) -> Option<Side> {
        match target {
            TargetRef::Hero(side) => Some(side),
            TargetRef::Minion(id) => self.minion(id).map(|m| m.owner),
        }
    }

    /// Attack including friendly auras, never negative
    pub fn effective_attack(&self, minion: &CardInstance) -> i32 {
        let aura_bonus: i32 = self
            .player(minion.owner)
            .battlefield
            .iter()
            .filter(|other| other.instance_id != minion.instance_id && other.is_alive())
            .filter_map(|other| match other.aura() {
                Some(Aura::FriendlyAttack { amount }) => Some(*amount),
                _ => None,
            })
            .sum();
        (minion.current_attack + aura_bonus).max(0)
    }

    /// Bonus damage for friendly spells from auras and the artifact
    pub fn spell_damage(&self, side: Side) -> i32 {
        let player = self.player(side);
        let from_minions: i32 = player
            .battlefield
            .iter()
            .filter(|m| m.is_alive())
            .filter_map(|m| match m.aura() {
                Some(Aura::SpellDamage { amount }) => Some(*amount),
                _ => None,
            })
            .sum();
        let from_artifact = player
            .artifact
            .as_ref()
            .and_then(|a| a.definition.artifact.as_ref())
            .map(|spec| spec.spell_damage)
            .unwrap_or(0);
        from_minions + from_artifact
    }

    /// Mana discount on spells granted by the equipped artifact
    pub fn spell_cost_reduction(&self, side: Side) -> u8 {
        self.player(side)
            .artifact
            .as_ref()
            .and_then(|a| a.definition.artifact.as_ref())
            .map(|spec| spec.spell_cost_reduction)
            .unwrap_or(0)
    }

    /// Attack of the hero from the equipped weapon/artifact plus permanent bonuses
    pub fn hero_attack(&self, side: Side) -> i32 {
        let player = self.player(side);
        let Some(artifact) = player.artifact.as_ref() else {
            return 0;
        };
        let bonus = player
            .artifact_state
            .as_ref()
            .map(|s| s.counters.permanent_attack_bonus)
            .unwrap_or(0);
        (artifact.current_attack + bonus).max(0)
    }

    /// Uniform pick from `candidates`
    pub fn pick_random<T: Copy>(&mut self, candidates: &[T]) -> Option<T> {
        if candidates.is_empty() {
            return None;
        }
        let idx = self.rng.gen_range(0..candidates.len());
        Some(candidates[idx])
    }

    /// Roll a percentage chance on the game RNG
    pub fn roll_percent(&mut self, chance: u8) -> bool {
        if chance >= 100 {
            return true;
        }
        self.rng.gen_range(0..100u8) < chance
    }

    /// Queue an event for publication at the end of the current action
    pub fn emit(&mut self, event: GameEvent) {
        let turn = self.turn_number();
        self.outbox.push((turn, event));
    }

    /// Drain queued events in emission order
    pub fn take_events(&mut self) -> Vec<(u32, GameEvent)> {
        std::mem::take(&mut self.outbox)
    }

    /// Append to the game log
    pub fn log(
        &mut self,
        kind: LogKind,
        side: Option<Side>,
        message: impl Into<String>,
        source: Option<&str>,
        value: Option<i32>,
    ) {
        let turn = self.turn_number();
        self.log.record(turn, side, kind, message, source, value);
    }

    /// End the match; the first call wins
    pub fn end_game(&mut self, winner: Side) {
        if self.is_game_over() {
            return;
        }
        self.phase = GamePhase::GameOver;
        self.winner = Some(winner);
        self.log(
            LogKind::GameOver,
            Some(winner),
            format!("Game over: {} wins", winner),
            None,
            None,
        );
        self.emit(GameEvent::GameEnded { winner });
    }

    /// Enter one level of nested trigger resolution; false if the bound is hit
    pub(crate) fn enter_cascade(&mut self) -> bool {
        if self.cascade_depth >= self.config.max_cascade_depth {
            return false;
        }
        self.cascade_depth += 1;
        true
    }

    pub(crate) fn exit_cascade(&mut self) {
        self.cascade_depth = self.cascade_depth.saturating_sub(1);
    }
}
