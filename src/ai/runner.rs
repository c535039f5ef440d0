//! Automated turn execution
//!
//! `take_turn` drives one side through a whole turn synchronously, asking
//! the evaluator for one action at a time and applying it through the
//! engine. `AutoTurnRunner` does the same on tokio with pacing between
//! actions, a bound on the whole turn, and a single-slot guard so that a
//! second automated turn cannot start while one is running.

use crate::ai::evaluator::{choose_action, AiAction};
use crate::config::EngineConfig;
use crate::core::Side;
use crate::error::ActionRejection;
use crate::game::{Engine, GamePhase};
use crate::{EngineError, Result};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Actions one side may take in a single turn before the turn is ended for it
pub const MAX_ACTIONS_PER_TURN: usize = 64;

#[derive(Debug, Default)]
struct SlotState {
    holder: Option<(u64, Instant)>,
    next_token: u64,
}

/// Single-slot "automated turn in progress" token
///
/// A holder older than `stale_after` is assumed lost and is evicted by the
/// next `try_acquire`.
#[derive(Debug, Clone)]
pub struct TurnSlot {
    state: Arc<Mutex<SlotState>>,
    stale_after: Duration,
}

impl TurnSlot {
    pub fn new(stale_after: Duration) -> Self {
        TurnSlot {
            state: Arc::new(Mutex::new(SlotState::default())),
            stale_after,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn try_acquire(&self) -> Result<TurnGuard> {
        let mut state = self.lock();
        if let Some((token, since)) = state.holder {
            if since.elapsed() < self.stale_after {
                return Err(ActionRejection::TurnInProgress.into());
            }
            tracing::warn!(token, held_ms = since.elapsed().as_millis() as u64, "clearing stale turn slot");
        }
        let token = state.next_token;
        state.next_token += 1;
        state.holder = Some((token, Instant::now()));
        Ok(TurnGuard {
            state: Arc::clone(&self.state),
            token,
        })
    }

    pub fn is_busy(&self) -> bool {
        self.lock().holder.is_some()
    }

    pub fn force_clear(&self) {
        self.lock().holder = None;
    }
}

/// Releases the slot when dropped, unless it was already handed on
#[derive(Debug)]
pub struct TurnGuard {
    state: Arc<Mutex<SlotState>>,
    token: u64,
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if matches!(state.holder, Some((token, _)) if token == self.token) {
            state.holder = None;
        }
    }
}

/// Apply one evaluator action through the engine
pub fn apply(engine: &mut Engine, side: Side, action: &AiAction) -> Result<()> {
    tracing::debug!(%side, ?action, "ai action");
    match action {
        AiAction::Mulligan { replace } => engine.complete_mulligan(side, replace),
        AiAction::ResolveDiscover { index } => engine.resolve_discover(side, *index),
        AiAction::Play { instance, target } => engine.play_card(side, *instance, *target),
        AiAction::Attack { attacker, target } => engine.attack_with_minion(side, *attacker, *target),
        AiAction::HeroAttack { target } => engine.attack_with_hero(side, *target),
        AiAction::HeroPower { target } => engine.use_hero_power(side, *target),
        AiAction::EndTurn => engine.end_turn(side),
    }
}

/// Outcome of one step
enum Step {
    /// An action was applied and the turn goes on
    Continue,
    /// The last action ended the turn
    Done,
    /// Nothing to do
    Idle,
}

fn step(engine: &mut Engine, side: Side) -> Result<Step> {
    let Some(action) = choose_action(engine.state(), side) else {
        return Ok(Step::Idle);
    };
    match apply(engine, side, &action) {
        Ok(()) if action == AiAction::EndTurn => Ok(Step::Done),
        Ok(()) => Ok(Step::Continue),
        Err(err) if err.rejection().is_some() => {
            tracing::warn!(%side, ?action, error = %err, "evaluator proposed an illegal action");
            finish_turn(engine, side);
            Ok(Step::Done)
        }
        Err(err) => Err(err),
    }
}

/// End `side`'s turn if it still owns it; true when the turn passed
fn finish_turn(engine: &mut Engine, side: Side) -> bool {
    let state = engine.state();
    if state.phase != GamePhase::Play || state.current_turn() != side {
        return false;
    }
    match engine.end_turn(side) {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(%side, error = %err, "could not end automated turn");
            false
        }
    }
}

/// Play `side`'s part of the game until it has nothing left to do; returns
/// the number of actions applied
pub fn take_turn(engine: &mut Engine, side: Side) -> Result<usize> {
    let mut actions = 0;
    loop {
        match step(engine, side)? {
            Step::Done => return Ok(actions + 1),
            Step::Idle => return Ok(actions),
            Step::Continue => actions += 1,
        }
        if actions >= MAX_ACTIONS_PER_TURN {
            tracing::warn!(%side, actions, "action cap reached, ending turn");
            finish_turn(engine, side);
            return Ok(actions);
        }
    }
}

/// Sides that have something to do right now
fn acting_sides(engine: &Engine) -> Vec<Side> {
    let state = engine.state();
    match state.phase {
        GamePhase::Mulligan => Side::BOTH
            .into_iter()
            .filter(|s| !state.player(*s).mulligan_done)
            .collect(),
        GamePhase::Play => vec![state.current_turn()],
        GamePhase::GameOver => Vec::new(),
    }
}

/// Automated match to completion or until `max_turns` have passed
pub fn play_match(engine: &mut Engine, max_turns: u32) -> Result<Option<Side>> {
    while engine.state().turn_number() <= max_turns {
        let sides = acting_sides(engine);
        if sides.is_empty() {
            break;
        }
        for side in sides {
            take_turn(engine, side)?;
        }
    }
    Ok(engine.state().winner)
}

/// Paced automated turns over a shared engine
#[derive(Debug, Clone)]
pub struct AutoTurnRunner {
    engine: Arc<tokio::sync::Mutex<Engine>>,
    slot: TurnSlot,
    action_delay: Duration,
    turn_timeout: Duration,
}

impl AutoTurnRunner {
    pub fn new(engine: Arc<tokio::sync::Mutex<Engine>>, config: &EngineConfig) -> Self {
        let turn_timeout = Duration::from_millis(config.ai_turn_timeout_ms);
        AutoTurnRunner {
            engine,
            slot: TurnSlot::new(turn_timeout),
            action_delay: Duration::from_millis(config.ai_action_delay_ms),
            turn_timeout,
        }
    }

    pub fn engine(&self) -> &Arc<tokio::sync::Mutex<Engine>> {
        &self.engine
    }

    pub fn slot(&self) -> &TurnSlot {
        &self.slot
    }

    /// Run one automated turn for `side`
    ///
    /// Fails with `TurnInProgress` while another automated turn holds the
    /// slot. A turn that outlives the timeout is abandoned, its turn ended
    /// and the slot released.
    pub async fn run_turn(&self, side: Side) -> Result<usize> {
        let _guard = self.slot.try_acquire()?;
        match tokio::time::timeout(self.turn_timeout, self.paced_turn(side)).await {
            Ok(result) => result,
            Err(_) => {
                let ms = self.turn_timeout.as_millis() as u64;
                tracing::warn!(%side, timeout_ms = ms, "automated turn timed out");
                finish_turn(&mut *self.engine.lock().await, side);
                Err(EngineError::TurnTimedOut(ms))
            }
        }
    }

    async fn paced_turn(&self, side: Side) -> Result<usize> {
        let mut actions = 0;
        loop {
            let outcome = {
                let mut engine = self.engine.lock().await;
                step(&mut engine, side)?
            };
            match outcome {
                Step::Done => return Ok(actions + 1),
                Step::Idle => return Ok(actions),
                Step::Continue => actions += 1,
            }
            if actions >= MAX_ACTIONS_PER_TURN {
                tracing::warn!(%side, actions, "action cap reached, ending turn");
                finish_turn(&mut *self.engine.lock().await, side);
                return Ok(actions);
            }
            if !self.action_delay.is_zero() {
                tokio::time::sleep(self.action_delay).await;
            }
        }
    }

    /// Run automated turns for both sides until the game ends or
    /// `max_turns` have passed
    pub async fn run_match(&self, max_turns: u32) -> Result<Option<Side>> {
        loop {
            let sides = {
                let engine = self.engine.lock().await;
                if engine.state().turn_number() > max_turns {
                    break;
                }
                acting_sides(&engine)
            };
            if sides.is_empty() {
                break;
            }
            for side in sides {
                self.run_turn(side).await?;
            }
        }
        Ok(self.engine.lock().await.state().winner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_is_single_holder() {
        let slot = TurnSlot::new(Duration::from_secs(60));
        let guard = slot.try_acquire().unwrap();
        let err = slot.try_acquire().unwrap_err();
        assert_eq!(err.rejection(), Some(ActionRejection::TurnInProgress));
        drop(guard);
        assert!(!slot.is_busy());
        assert!(slot.try_acquire().is_ok());
    }

    #[test]
    fn test_stale_holder_is_evicted() {
        let slot = TurnSlot::new(Duration::ZERO);
        let stale = slot.try_acquire().unwrap();
        let fresh = slot.try_acquire().unwrap();
        // the evicted guard must not release the new holder
        drop(stale);
        assert!(slot.is_busy());
        drop(fresh);
        assert!(!slot.is_busy());
    }

    #[test]
    fn test_finish_turn_reports_refused_end() {
        use crate::core::{CardDefinition, CardId};
        use crate::game::{GameState, PendingDiscover};
        use crate::loader::CardCatalog;

        let mut catalog = CardCatalog::new();
        catalog.insert(CardDefinition::minion(60, "Draugr Husk", 1, 1, 1));
        let mut gs = GameState::new(EngineConfig::default(), Arc::new(catalog));
        gs.phase = GamePhase::Play;
        gs.turn.begin();
        let side = gs.current_turn();
        gs.pending_discover = Some(PendingDiscover {
            side,
            options: vec![CardId::new(60)],
            source: "Seer".into(),
        });
        let mut engine = Engine::new(gs);

        assert!(!finish_turn(&mut engine, side));
        assert_eq!(engine.state().current_turn(), side);
        assert!(!finish_turn(&mut engine, side.other()));

        engine.resolve_discover(side, 0).unwrap();
        assert!(finish_turn(&mut engine, side));
        assert_eq!(engine.state().current_turn(), side.other());
    }

    #[test]
    fn test_force_clear() {
        let slot = TurnSlot::new(Duration::from_secs(60));
        let _guard = slot.try_acquire().unwrap();
        slot.force_clear();
        assert!(slot.try_acquire().is_ok());
    }
}
