//! Player-visible game log
//!
//! Every mutation performed by an action ends with an entry here naming the
//! source, the effect and the numeric result. The log is part of `GameState`,
//! append-only, and is the audit trail of a match. Entries are always kept in
//! memory; `OutputMode::Both` additionally echoes them to stdout.

use crate::core::Side;
use serde::{Deserialize, Serialize};

/// Verbosity level for game output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerbosityLevel {
    /// No stdout echo
    Silent = 0,
    /// Only game outcome
    Minimal = 1,
    /// Actions, triggers and turn changes (default)
    #[default]
    Normal = 2,
    /// Every primitive result
    Verbose = 3,
}

/// Output destination for log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Capture only to the in-memory log (default)
    #[default]
    Memory,
    /// In-memory log plus stdout echo
    Both,
}

/// What an entry is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    Turn,
    Action,
    Trigger,
    Effect,
    Combat,
    Quest,
    Warning,
    Rejection,
    GameOver,
}

impl LogKind {
    fn level(self) -> VerbosityLevel {
        match self {
            LogKind::GameOver => VerbosityLevel::Minimal,
            LogKind::Turn
            | LogKind::Action
            | LogKind::Trigger
            | LogKind::Combat
            | LogKind::Quest
            | LogKind::Warning
            | LogKind::Rejection => VerbosityLevel::Normal,
            LogKind::Effect => VerbosityLevel::Verbose,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub sequence: u64,
    pub turn: u32,
    pub side: Option<Side>,
    pub kind: LogKind,
    pub level: VerbosityLevel,
    pub message: String,
    /// Name of the card, artifact or rule that caused the entry
    pub source: Option<String>,
    /// Numeric result (damage dealt, amount healed, new counter value, ...)
    pub value: Option<i32>,
}

/// Append-only game log
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameLog {
    verbosity: VerbosityLevel,
    output_mode: OutputMode,
    entries: Vec<LogEntry>,
    next_sequence: u64,
}

impl GameLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verbosity(verbosity: VerbosityLevel) -> Self {
        GameLog {
            verbosity,
            ..Default::default()
        }
    }

    pub fn set_output_mode(&mut self, mode: OutputMode) {
        self.output_mode = mode;
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.verbosity
    }

    pub fn set_verbosity(&mut self, verbosity: VerbosityLevel) {
        self.verbosity = verbosity;
    }

    /// Append an entry
    pub fn record(
        &mut self,
        turn: u32,
        side: Option<Side>,
        kind: LogKind,
        message: impl Into<String>,
        source: Option<&str>,
        value: Option<i32>,
    ) {
        let entry = LogEntry {
            sequence: self.next_sequence,
            turn,
            side,
            kind,
            level: kind.level(),
            message: message.into(),
            source: source.map(str::to_string),
            value,
        };
        self.next_sequence += 1;
        if self.output_mode == OutputMode::Both && entry.level <= self.verbosity {
            Self::echo(&entry);
        }
        self.entries.push(entry);
    }

    fn echo(entry: &LogEntry) {
        if entry.level == VerbosityLevel::Minimal {
            println!("{}", entry.message);
        } else {
            println!("  [T{}] {}", entry.turn, entry.message);
        }
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }

    pub fn of_kind(&self, kind: LogKind) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().filter(move |e| e.kind == kind)
    }

    /// Last `n` entries, oldest first
    pub fn tail(&self, n: usize) -> &[LogEntry] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }
}
