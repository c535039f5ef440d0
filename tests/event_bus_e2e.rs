//! Event bus wiring with the presentation subscribers

use norse_ccg::core::{CardDefinition, CardId, Rarity, Side};
use norse_ccg::events::{
    AnimationKind, AnimationQueue, AudioMapper, EventFilter, EventKind, EventRecord, EventSubscriber,
    NotificationMapper, RecordingSubscriber, SoundEffect, SubscriberError,
};
use norse_ccg::game::{Engine, GameState};
use norse_ccg::loader::{CardCatalog, DeckEntry, DeckList, MatchBuilder};
use norse_ccg::Result;
use std::sync::{Arc, Mutex};

fn started() -> Result<GameState> {
    let mut catalog = CardCatalog::new();
    catalog.insert(CardDefinition::minion(1, "Einherjar Thrall", 1, 1, 2));
    let mut odin = CardDefinition::minion(2, "Odin Allfather", 1, 5, 5);
    odin.rarity = Rarity::Legendary;
    catalog.insert(odin);
    let deck = DeckList {
        name: "Thralls".into(),
        hero: None,
        cards: vec![DeckEntry { id: CardId::new(1), count: 30 }],
    };
    let mut gs = MatchBuilder::new(Arc::new(catalog))
        .seed(5)
        .deck(Side::Player, deck.clone())
        .deck(Side::Opponent, deck)
        .build()?;
    gs.complete_mulligan(Side::Player, &[])?;
    gs.complete_mulligan(Side::Opponent, &[])?;
    Ok(gs)
}

/// Appends its label to a shared list
struct Probe {
    label: &'static str,
    seen: Arc<Mutex<Vec<&'static str>>>,
}

impl EventSubscriber for Probe {
    fn on_event(&mut self, _record: &EventRecord) -> std::result::Result<(), SubscriberError> {
        self.seen.lock().unwrap().push(self.label);
        Ok(())
    }
}

struct Failing;

impl EventSubscriber for Failing {
    fn on_event(&mut self, _record: &EventRecord) -> std::result::Result<(), SubscriberError> {
        Err(SubscriberError("speaker unplugged".into()))
    }
}

struct Panicking;

impl EventSubscriber for Panicking {
    fn on_event(&mut self, _record: &EventRecord) -> std::result::Result<(), SubscriberError> {
        panic!("renderer crashed");
    }
}

#[test]
fn test_presentation_subscribers_see_a_legendary_play() -> Result<()> {
    let mut gs = started()?;
    let definition = gs.catalog().get(CardId::new(2)).unwrap();
    let card = gs.new_instance(definition, Side::Player);
    let odin = card.instance_id;
    gs.player_mut(Side::Player).hand.push(card);

    let mut engine = Engine::new(gs);
    let audio = Arc::new(Mutex::new(AudioMapper::default()));
    let animations = Arc::new(Mutex::new(AnimationQueue::new()));
    let toasts = Arc::new(Mutex::new(NotificationMapper::default()));
    engine.subscribe(EventFilter::All, 0, Box::new(Arc::clone(&audio)));
    engine.subscribe(EventFilter::All, 0, Box::new(Arc::clone(&animations)));
    engine.subscribe(EventFilter::All, 0, Box::new(Arc::clone(&toasts)));
    engine.play_card(Side::Player, odin, None)?;

    assert!(audio.lock().unwrap().played().contains(&SoundEffect::Legendary));

    let messages: Vec<String> = toasts.lock().unwrap().toasts().iter().map(|t| t.message.clone()).collect();
    assert!(messages.contains(&"Legendary! Odin Allfather".to_string()));
    assert!(!messages.iter().any(|m| m.starts_with("Drew")));

    assert!(messages.contains(&"Game Started!".to_string()));

    // equal priority: the earlier event plays first
    let mut queue = animations.lock().unwrap();
    assert_eq!(queue.next().map(|a| a.kind), Some(AnimationKind::GameStart));
    assert_eq!(queue.next().map(|a| a.kind), Some(AnimationKind::LegendaryEntrance));
    assert_eq!(queue.next().map(|a| a.kind), Some(AnimationKind::TurnStart));
    Ok(())
}

#[test]
fn test_priority_then_registration_order() -> Result<()> {
    let mut engine = Engine::new(started()?);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let probe = |label| Box::new(Probe { label, seen: Arc::clone(&seen) });
    engine.subscribe(EventFilter::kinds(&[EventKind::GameStarted]), 0, probe("low"));
    engine.subscribe(EventFilter::kinds(&[EventKind::GameStarted]), 5, probe("high"));
    engine.subscribe(EventFilter::kinds(&[EventKind::GameStarted]), 5, probe("high-later"));
    engine.flush();
    assert_eq!(*seen.lock().unwrap(), vec!["high", "high-later", "low"]);
    Ok(())
}

#[test]
fn test_failing_subscribers_do_not_stop_delivery() -> Result<()> {
    let mut engine = Engine::new(started()?);
    let recorder = RecordingSubscriber::shared();
    engine.subscribe(EventFilter::All, 10, Box::new(Failing));
    engine.subscribe(EventFilter::All, 5, Box::new(Panicking));
    engine.subscribe(EventFilter::All, 0, Box::new(Arc::clone(&recorder)));
    let published = engine.flush();
    assert!(published > 0);
    assert_eq!(recorder.lock().unwrap().records.len(), published);
    assert_eq!(engine.bus().failures(), 2 * published as u64);
    Ok(())
}

#[test]
fn test_unsubscribe_and_history_cap() -> Result<()> {
    let mut gs = started()?;
    gs.config.event_history_cap = 4;
    let mut engine = Engine::new(gs);
    let recorder = RecordingSubscriber::shared();
    let handle = engine.subscribe(EventFilter::All, 0, Box::new(Arc::clone(&recorder)));
    engine.flush();
    let received = recorder.lock().unwrap().records.len();
    assert!(engine.unsubscribe(handle));
    assert!(!engine.unsubscribe(handle));

    engine.end_turn(Side::Player)?;
    assert_eq!(recorder.lock().unwrap().records.len(), received);
    assert_eq!(engine.bus().history_len(), 4);
    let sequences: Vec<u64> = engine.bus().history().map(|r| r.sequence).collect();
    assert!(sequences.windows(2).all(|w| w[0] < w[1]));
    Ok(())
}
