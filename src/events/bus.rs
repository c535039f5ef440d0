//! Process-local publish/subscribe
//!
//! Publication is synchronous. Subscribers run in priority order (higher
//! first, then registration order); a subscriber that returns an error or
//! panics is logged and skipped, and the remaining subscribers still run.

use super::{now_millis, EventKind, EventRecord, GameEvent};
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Failure reported by a subscriber; never reaches the engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct SubscriberError(pub String);

/// Receives published events
pub trait EventSubscriber: Send {
    fn name(&self) -> &str {
        "subscriber"
    }

    fn on_event(&mut self, record: &EventRecord) -> Result<(), SubscriberError>;
}

/// Shared subscribers let the caller keep a handle to inspect them
impl<S: EventSubscriber> EventSubscriber for Arc<Mutex<S>> {
    fn name(&self) -> &str {
        "shared subscriber"
    }

    fn on_event(&mut self, record: &EventRecord) -> Result<(), SubscriberError> {
        let mut inner = self
            .lock()
            .map_err(|_| SubscriberError("subscriber lock poisoned".to_string()))?;
        inner.on_event(record)
    }
}

/// Which events a subscription receives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventFilter {
    All,
    Kinds(Vec<EventKind>),
}

impl EventFilter {
    pub fn kinds(kinds: &[EventKind]) -> Self {
        EventFilter::Kinds(kinds.to_vec())
    }

    pub fn matches(&self, kind: EventKind) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Kinds(kinds) => kinds.contains(&kind),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

struct Subscription {
    handle: SubscriptionHandle,
    filter: EventFilter,
    priority: i32,
    subscriber: Box<dyn EventSubscriber>,
}

/// In-process event bus with a bounded history
pub struct EventBus {
    subscriptions: Vec<Subscription>,
    next_handle: u64,
    next_sequence: u64,
    history: VecDeque<EventRecord>,
    history_cap: usize,
    failures: u64,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriptions", &self.subscriptions.len())
            .field("next_sequence", &self.next_sequence)
            .field("history", &self.history.len())
            .field("failures", &self.failures)
            .finish()
    }
}

impl EventBus {
    pub const DEFAULT_HISTORY_CAP: usize = 200;

    pub fn new() -> Self {
        Self::with_history_cap(Self::DEFAULT_HISTORY_CAP)
    }

    pub fn with_history_cap(history_cap: usize) -> Self {
        EventBus {
            subscriptions: Vec::new(),
            next_handle: 1,
            next_sequence: 0,
            history: VecDeque::with_capacity(history_cap.min(1024)),
            history_cap,
            failures: 0,
        }
    }

    /// Register a subscriber
    pub fn subscribe(
        &mut self,
        filter: EventFilter,
        priority: i32,
        subscriber: Box<dyn EventSubscriber>,
    ) -> SubscriptionHandle {
        let handle = SubscriptionHandle(self.next_handle);
        self.next_handle += 1;
        // after every existing subscription with the same or higher priority
        let index = self
            .subscriptions
            .iter()
            .position(|s| s.priority < priority)
            .unwrap_or(self.subscriptions.len());
        self.subscriptions.insert(
            index,
            Subscription {
                handle,
                filter,
                priority,
                subscriber,
            },
        );
        handle
    }

    pub fn subscribe_all(&mut self, subscriber: Box<dyn EventSubscriber>) -> SubscriptionHandle {
        self.subscribe(EventFilter::All, 0, subscriber)
    }

    /// Remove a subscription; false if the handle is unknown
    pub fn unsubscribe(&mut self, handle: SubscriptionHandle) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.handle != handle);
        self.subscriptions.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Publish an event to every matching subscriber
    pub fn publish(&mut self, turn: u32, event: GameEvent) -> EventRecord {
        let record = EventRecord {
            sequence: self.next_sequence,
            turn,
            timestamp_ms: now_millis(),
            event,
        };
        self.next_sequence += 1;

        if self.history_cap > 0 {
            if self.history.len() == self.history_cap {
                self.history.pop_front();
            }
            self.history.push_back(record.clone());
        }

        let kind = record.event.kind();
        for sub in self.subscriptions.iter_mut().filter(|s| s.filter.matches(kind)) {
            let subscriber = &mut sub.subscriber;
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| subscriber.on_event(&record)));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    self.failures += 1;
                    tracing::warn!(subscriber = %sub.subscriber.name(), ?kind, error = %e, "event subscriber failed");
                }
                Err(_) => {
                    self.failures += 1;
                    tracing::warn!(subscriber = %sub.subscriber.name(), ?kind, "event subscriber panicked");
                }
            }
        }
        record
    }

    /// Most recent events, oldest first
    pub fn history(&self) -> impl Iterator<Item = &EventRecord> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Subscriber errors and panics seen so far
    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Number of events published so far
    pub fn published(&self) -> u64 {
        self.next_sequence
    }
}

/// Keeps every record it receives
#[derive(Debug, Default)]
pub struct RecordingSubscriber {
    pub records: Vec<EventRecord>,
}

impl RecordingSubscriber {
    pub fn shared() -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(Self::default()))
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.records.iter().map(|r| r.event.kind()).collect()
    }
}

impl EventSubscriber for RecordingSubscriber {
    fn name(&self) -> &str {
        "recorder"
    }

    fn on_event(&mut self, record: &EventRecord) -> Result<(), SubscriberError> {
        self.records.push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Side;

    struct Tagger {
        tag: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl EventSubscriber for Tagger {
        fn on_event(&mut self, _record: &EventRecord) -> Result<(), SubscriberError> {
            self.log.lock().unwrap().push(self.tag);
            Ok(())
        }
    }

    struct Failing;

    impl EventSubscriber for Failing {
        fn on_event(&mut self, _record: &EventRecord) -> Result<(), SubscriberError> {
            Err(SubscriberError("boom".into()))
        }
    }

    struct Panicking;

    impl EventSubscriber for Panicking {
        fn on_event(&mut self, _record: &EventRecord) -> Result<(), SubscriberError> {
            panic!("subscriber bug");
        }
    }

    fn started() -> GameEvent {
        GameEvent::GameStarted { first: Side::Player }
    }

    #[test]
    fn test_priority_then_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();
        for (tag, priority) in [("low", 0), ("high", 10), ("low2", 0), ("high2", 10)] {
            bus.subscribe(
                EventFilter::All,
                priority,
                Box::new(Tagger { tag, log: Arc::clone(&log) }),
            );
        }
        bus.publish(1, started());
        assert_eq!(*log.lock().unwrap(), vec!["high", "high2", "low", "low2"]);
    }

    #[test]
    fn test_failures_do_not_stop_other_subscribers() {
        let recorder = RecordingSubscriber::shared();
        let mut bus = EventBus::new();
        bus.subscribe(EventFilter::All, 5, Box::new(Failing));
        bus.subscribe(EventFilter::All, 4, Box::new(Panicking));
        bus.subscribe_all(Box::new(Arc::clone(&recorder)));
        bus.publish(1, started());
        assert_eq!(recorder.lock().unwrap().records.len(), 1);
        assert_eq!(bus.failures(), 2);
    }

    #[test]
    fn test_filter_and_unsubscribe() {
        let recorder = RecordingSubscriber::shared();
        let mut bus = EventBus::new();
        let handle = bus.subscribe(
            EventFilter::kinds(&[EventKind::GameEnded]),
            0,
            Box::new(Arc::clone(&recorder)),
        );
        bus.publish(1, started());
        bus.publish(3, GameEvent::GameEnded { winner: Side::Opponent });
        assert_eq!(recorder.lock().unwrap().kinds(), vec![EventKind::GameEnded]);
        assert!(bus.unsubscribe(handle));
        assert!(!bus.unsubscribe(handle));
        bus.publish(4, GameEvent::GameEnded { winner: Side::Opponent });
        assert_eq!(recorder.lock().unwrap().records.len(), 1);
    }

    #[test]
    fn test_history_is_capped_and_sequenced() {
        let mut bus = EventBus::with_history_cap(3);
        for _ in 0..5 {
            bus.publish(1, started());
        }
        let seqs: Vec<u64> = bus.history().map(|r| r.sequence).collect();
        assert_eq!(seqs, vec![2, 3, 4]);
        assert_eq!(bus.published(), 5);
    }
}
