//! Strongly-typed wrappers for game concepts
//!
//! Sides, target references and tribe names get their own types so they
//! cannot be mixed up with bare integers or strings.

use super::InstanceId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two seats at the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Player,
    Opponent,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Player, Side::Opponent];

    pub fn other(self) -> Side {
        match self {
            Side::Player => Side::Opponent,
            Side::Opponent => Side::Player,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Side::Player => 0,
            Side::Opponent => 1,
        }
    }

    /// `self` first, then the other side
    pub fn in_resolution_order(self) -> [Side; 2] {
        [self, self.other()]
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Player => write!(f, "player"),
            Side::Opponent => write!(f, "opponent"),
        }
    }
}

/// Anything that can be targeted: a hero or a minion on the battlefield
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetRef {
    Hero(Side),
    Minion(InstanceId),
}

impl TargetRef {
    pub fn minion(self) -> Option<InstanceId> {
        match self {
            TargetRef::Minion(id) => Some(id),
            TargetRef::Hero(_) => None,
        }
    }
}

impl fmt::Display for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetRef::Hero(side) => write!(f, "{} hero", side),
            TargetRef::Minion(id) => write!(f, "minion {}", id),
        }
    }
}

/// Minion tribe (e.g. "Beast", "Undead", "Elemental")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Race(String);

impl Race {
    pub fn new(s: impl Into<String>) -> Self {
        Race(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Race {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Race {
    fn from(s: &str) -> Self {
        Race(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_other_is_involution() {
        for side in Side::BOTH {
            assert_eq!(side.other().other(), side);
            assert_ne!(side.other(), side);
        }
    }

    #[test]
    fn test_resolution_order_starts_with_acting_side() {
        assert_eq!(
            Side::Opponent.in_resolution_order(),
            [Side::Opponent, Side::Player]
        );
    }

    #[test]
    fn test_target_ref_serializes_tagged() {
        let json = serde_json::to_string(&TargetRef::Hero(Side::Player)).unwrap();
        assert_eq!(json, r#"{"hero":"player"}"#);
    }
}
