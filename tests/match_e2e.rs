//! End-to-end AI-vs-AI matches on the bundled catalog
//!
//! Every action is applied one at a time so the board invariants can be
//! checked after each one.

use norse_ccg::ai::{apply, choose_action, play_match};
use norse_ccg::core::Side;
use norse_ccg::game::{Engine, GamePhase, GameState};
use norse_ccg::loader::{CardCatalog, DeckLoader, MatchBuilder};
use norse_ccg::Result;
use std::path::PathBuf;
use std::sync::Arc;

const MAX_TURNS: u32 = 60;

fn data(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(path)
}

fn core_match(seed: u64) -> Result<Engine> {
    let (catalog, report) = CardCatalog::load_from_file(&data("catalog/core.json"))?;
    assert!(report.is_clean(), "bundled catalog has problems: {:?}", report);
    let state = MatchBuilder::new(Arc::new(catalog))
        .seed(seed)
        .deck(Side::Player, DeckLoader::load_from_file(&data("decks/valkyrie.json"))?)
        .deck(Side::Opponent, DeckLoader::load_from_file(&data("decks/jotun.json"))?)
        .build()?;
    Ok(Engine::new(state))
}

/// Side that has to act next, if any
fn actor(state: &GameState) -> Option<Side> {
    if let Some(pending) = &state.pending_discover {
        return Some(pending.side);
    }
    match state.phase {
        GamePhase::Mulligan => Side::BOTH.into_iter().find(|s| !state.player(*s).mulligan_done),
        GamePhase::Play => Some(state.current_turn()),
        GamePhase::GameOver => None,
    }
}

fn assert_invariants(state: &GameState) {
    for side in Side::BOTH {
        let player = state.player(side);
        for minion in &player.battlefield {
            assert!(
                minion.current_health > 0,
                "{} on the {} battlefield has {} health",
                minion.name(),
                side,
                minion.current_health
            );
        }
        assert!(player.hand.len() <= state.config.hand_cap);
        assert!(player.battlefield.len() <= state.config.battlefield_cap);
        assert!(player.secrets.len() <= state.config.secret_cap);
        assert!(player.hero_health >= 0);
    }
}

/// Step a match action by action; returns every game log message
fn step_match(engine: &mut Engine) -> Result<Vec<String>> {
    while engine.state().turn_number() <= MAX_TURNS {
        let Some(side) = actor(engine.state()) else {
            break;
        };
        let Some(action) = choose_action(engine.state(), side) else {
            break;
        };
        apply(engine, side, &action)?;
        assert_invariants(engine.state());
    }
    Ok(engine.state().log.entries().iter().map(|e| e.message.clone()).collect())
}

#[test]
fn test_no_living_dead_minions_across_seeds() -> Result<()> {
    for seed in 0..6 {
        let mut engine = core_match(seed)?;
        step_match(&mut engine)?;
        let state = engine.state();
        assert!(state.is_game_over() || state.turn_number() > MAX_TURNS, "seed {seed} stalled");
    }
    Ok(())
}

#[test]
fn test_same_seed_same_match() -> Result<()> {
    let first = step_match(&mut core_match(1234)?)?;
    let second = step_match(&mut core_match(1234)?)?;
    similar_asserts::assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_play_match_reaches_an_outcome() -> Result<()> {
    let mut engine = core_match(7)?;
    let winner = play_match(&mut engine, MAX_TURNS)?;
    let state = engine.state();
    match winner {
        Some(side) => {
            assert!(state.is_game_over());
            assert!(state.player(side.other()).is_dead());
        }
        None => assert!(state.turn_number() > MAX_TURNS),
    }
    assert!(engine.bus().published() > 0);
    Ok(())
}
