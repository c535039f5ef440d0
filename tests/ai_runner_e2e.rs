//! Automated turn runner on tokio

use norse_ccg::ai::AutoTurnRunner;
use norse_ccg::config::EngineConfig;
use norse_ccg::core::{CardDefinition, CardId, Side};
use norse_ccg::game::{Engine, GamePhase};
use norse_ccg::loader::{CardCatalog, DeckEntry, DeckList, MatchBuilder};
use norse_ccg::{ActionRejection, EngineError, Result};
use std::sync::Arc;
use tokio::sync::Mutex;

fn engine(config: &EngineConfig) -> Result<Arc<Mutex<Engine>>> {
    let mut catalog = CardCatalog::new();
    catalog.insert(CardDefinition::minion(1, "Einherjar Thrall", 1, 1, 2));
    catalog.insert(CardDefinition::minion(2, "Fjord Raider", 3, 3, 2));
    let deck = DeckList {
        name: "Raiders".into(),
        hero: None,
        cards: vec![
            DeckEntry { id: CardId::new(1), count: 15 },
            DeckEntry { id: CardId::new(2), count: 15 },
        ],
    };
    let state = MatchBuilder::new(Arc::new(catalog))
        .config(config.clone())
        .seed(99)
        .deck(Side::Player, deck.clone())
        .deck(Side::Opponent, deck)
        .build()?;
    Ok(Arc::new(Mutex::new(Engine::new(state))))
}

#[tokio::test]
async fn test_run_turn_hands_the_turn_over() -> Result<()> {
    let config = EngineConfig::default();
    let runner = AutoTurnRunner::new(engine(&config)?, &config);
    runner.run_turn(Side::Player).await?;
    runner.run_turn(Side::Opponent).await?;
    {
        let engine = runner.engine().lock().await;
        assert_eq!(engine.state().phase, GamePhase::Play);
        assert_eq!(engine.state().current_turn(), Side::Player);
    }

    runner.run_turn(Side::Player).await?;
    let engine = runner.engine().lock().await;
    assert_eq!(engine.state().current_turn(), Side::Opponent);
    assert_eq!(engine.state().turn_number(), 2);
    assert!(!runner.slot().is_busy());
    Ok(())
}

#[tokio::test]
async fn test_second_automated_turn_is_rejected_while_one_runs() -> Result<()> {
    let config = EngineConfig {
        ai_action_delay_ms: 20,
        ..EngineConfig::default()
    };
    let runner = AutoTurnRunner::new(engine(&config)?, &config);
    runner.run_turn(Side::Player).await?;
    runner.run_turn(Side::Opponent).await?;

    let busy = runner.clone();
    let first = tokio::spawn(async move { busy.run_turn(Side::Player).await });
    tokio::task::yield_now().await;
    while !runner.slot().is_busy() && !first.is_finished() {
        tokio::task::yield_now().await;
    }
    if runner.slot().is_busy() {
        let err = runner.run_turn(Side::Player).await.unwrap_err();
        assert_eq!(err.rejection(), Some(ActionRejection::TurnInProgress));
    }
    first.await.expect("runner task panicked")?;
    assert!(!runner.slot().is_busy());
    Ok(())
}

#[tokio::test]
async fn test_timed_out_turn_is_ended_and_slot_released() -> Result<()> {
    let config = EngineConfig {
        ai_action_delay_ms: 200,
        ai_turn_timeout_ms: 50,
        ..EngineConfig::default()
    };
    let runner = AutoTurnRunner::new(engine(&config)?, &config);
    // the mulligan is one action, then the pacing delay outlives the bound
    let result = runner.run_turn(Side::Player).await;
    assert!(matches!(result, Err(EngineError::TurnTimedOut(50))));
    assert!(!runner.slot().is_busy());
    assert!(runner.slot().try_acquire().is_ok());
    // the action applied before the timeout is kept
    assert!(runner.engine().lock().await.state().player(Side::Player).mulligan_done);
    Ok(())
}

#[tokio::test]
async fn test_run_match_finishes() -> Result<()> {
    let config = EngineConfig::default();
    let runner = AutoTurnRunner::new(engine(&config)?, &config);
    let winner = runner.run_match(80).await?;
    let engine = runner.engine().lock().await;
    let state = engine.state();
    match winner {
        Some(side) => assert!(state.player(side.other()).is_dead()),
        None => assert!(state.turn_number() > 80),
    }
    Ok(())
}
