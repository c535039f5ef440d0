//! Game state, effect resolution and the turn lifecycle

pub mod actions;
pub mod combat;
pub mod engine;
pub mod interpreter;
pub mod logger;
pub mod phase;
pub mod primitives;
pub mod state;
pub mod turn;

pub use actions::{play_effects, PlayCheck};
pub use engine::Engine;
pub use interpreter::{effect_magnitude, EffectContext, DISCOVER_OPTIONS};
pub use logger::{GameLog, LogEntry, LogKind, OutputMode, VerbosityLevel};
pub use phase::{GamePhase, TurnStructure};
pub use primitives::{Source, SourceKind};
pub use state::{GameState, PendingDiscover};
