//! Engine facade
//!
//! Owns the `GameState` and the `EventBus`. Each inbound action runs to
//! completion against the state, then the events it produced are published
//! in emission order. A rejected action leaves one rejection notice in the
//! game log and changes nothing else.

use crate::core::{InstanceId, Side, TargetRef};
use crate::events::{EventBus, EventFilter, EventSubscriber, SubscriptionHandle};
use crate::game::{GameState, LogKind};
use crate::Result;

pub struct Engine {
    state: GameState,
    bus: EventBus,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("turn", &self.state.turn_number())
            .field("phase", &self.state.phase)
            .field("bus", &self.bus)
            .finish()
    }
}

impl Engine {
    /// Wrap a prepared match; events queued during setup are published
    /// once subscribers call `flush` or the first action completes
    pub fn new(state: GameState) -> Self {
        let bus = EventBus::with_history_cap(state.config.event_history_cap);
        Engine { state, bus }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn into_state(self) -> GameState {
        self.state
    }

    pub fn subscribe(
        &mut self,
        filter: EventFilter,
        priority: i32,
        subscriber: Box<dyn EventSubscriber>,
    ) -> SubscriptionHandle {
        self.bus.subscribe(filter, priority, subscriber)
    }

    pub fn unsubscribe(&mut self, handle: SubscriptionHandle) -> bool {
        self.bus.unsubscribe(handle)
    }

    /// Publish every queued event; returns how many were published
    pub fn flush(&mut self) -> usize {
        let events = self.state.take_events();
        let count = events.len();
        for (turn, event) in events {
            self.bus.publish(turn, event);
        }
        count
    }

    fn run(&mut self, side: Side, action: impl FnOnce(&mut GameState) -> Result<()>) -> Result<()> {
        let outcome = action(&mut self.state);
        if let Err(err) = &outcome {
            match err.rejection() {
                Some(reason) => {
                    tracing::debug!(%side, %reason, "action rejected");
                    self.state.log(
                        LogKind::Rejection,
                        Some(side),
                        format!("Rejected action by the {}: {}", side, reason),
                        None,
                        None,
                    );
                }
                None => tracing::warn!(%side, error = %err, "action failed"),
            }
        }
        self.flush();
        outcome
    }

    pub fn complete_mulligan(&mut self, side: Side, replace: &[InstanceId]) -> Result<()> {
        self.run(side, |gs| gs.complete_mulligan(side, replace))
    }

    pub fn play_card(&mut self, side: Side, instance: InstanceId, target: Option<TargetRef>) -> Result<()> {
        self.run(side, |gs| gs.play_card(side, instance, target))
    }

    pub fn equip_artifact(&mut self, side: Side, instance: InstanceId) -> Result<()> {
        self.run(side, |gs| gs.equip_artifact(side, instance))
    }

    pub fn attack_with_minion(&mut self, side: Side, attacker: InstanceId, target: TargetRef) -> Result<()> {
        self.run(side, |gs| gs.attack_with_minion(side, attacker, target))
    }

    pub fn attack_with_hero(&mut self, side: Side, target: TargetRef) -> Result<()> {
        self.run(side, |gs| gs.attack_with_hero(side, target))
    }

    pub fn use_hero_power(&mut self, side: Side, target: Option<TargetRef>) -> Result<()> {
        self.run(side, |gs| gs.use_hero_power(side, target))
    }

    pub fn resolve_discover(&mut self, side: Side, index: usize) -> Result<()> {
        self.run(side, |gs| gs.resolve_discover(side, index))
    }

    pub fn end_turn(&mut self, side: Side) -> Result<()> {
        self.run(side, |gs| gs.end_turn(side))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::error::ActionRejection;
    use crate::events::{EventKind, RecordingSubscriber};
    use crate::loader::CardCatalog;
    use std::sync::Arc;

    fn engine() -> Engine {
        let mut gs = GameState::new(EngineConfig::default(), Arc::new(CardCatalog::default()));
        gs.begin_match(Side::Player);
        Engine::new(gs)
    }

    #[test]
    fn test_setup_events_published_on_flush() {
        let mut engine = engine();
        let recorder = RecordingSubscriber::shared();
        engine.subscribe(EventFilter::All, 0, Box::new(Arc::clone(&recorder)));
        engine.flush();
        let kinds = recorder.lock().unwrap().kinds();
        assert_eq!(kinds.last(), Some(&EventKind::GameStarted));
    }

    #[test]
    fn test_rejection_is_logged_once_and_publishes_nothing() {
        let mut engine = engine();
        engine.flush();
        let published = engine.bus().published();
        let err = engine.end_turn(Side::Player).unwrap_err();
        assert_eq!(err.rejection(), Some(ActionRejection::WrongPhase));
        assert_eq!(engine.bus().published(), published);
        assert_eq!(engine.state().log.of_kind(LogKind::Rejection).count(), 1);
    }

    #[test]
    fn test_actions_publish_in_order() {
        let mut engine = engine();
        let recorder = RecordingSubscriber::shared();
        engine.subscribe(
            EventFilter::kinds(&[EventKind::MulliganCompleted, EventKind::TurnStarted]),
            0,
            Box::new(Arc::clone(&recorder)),
        );
        engine.complete_mulligan(Side::Player, &[]).unwrap();
        engine.complete_mulligan(Side::Opponent, &[]).unwrap();
        assert_eq!(
            recorder.lock().unwrap().kinds(),
            vec![EventKind::MulliganCompleted, EventKind::MulliganCompleted, EventKind::TurnStarted]
        );
    }
}
