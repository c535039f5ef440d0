//! Automated opponent: move evaluation and paced turn execution

pub mod evaluator;
pub mod runner;

pub use evaluator::{
    attack_target, card_score, choose_action, choose_target, evaluate_plays, plan_attacks, score_play, AiAction,
    PlayOption,
};
pub use runner::{apply, play_match, take_turn, AutoTurnRunner, TurnGuard, TurnSlot, MAX_ACTIONS_PER_TURN};
