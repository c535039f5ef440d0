//! Mana crystals and overload

use serde::{Deserialize, Serialize};

/// Hard cap on mana crystals
pub const MAX_MANA: u8 = 10;

/// A hero's mana crystals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManaPool {
    pub current: u8,
    pub max: u8,
    /// Crystals locked this turn by overload played last turn
    pub overloaded: u8,
    /// Overload incurred this turn, applied at the next turn start
    pub pending_overload: u8,
}

impl ManaPool {
    pub fn can_afford(&self, cost: u8) -> bool {
        self.current >= cost
    }

    /// Deducts `cost`; callers validate affordability first
    pub fn spend(&mut self, cost: u8) {
        self.current = self.current.saturating_sub(cost);
    }

    /// Turn start: grow by one crystal, move pending overload into effect and refill
    pub fn start_turn(&mut self, cap: u8) {
        self.max = (self.max + 1).min(cap);
        self.overloaded = self.pending_overload;
        self.pending_overload = 0;
        self.current = self.max.saturating_sub(self.overloaded);
    }

    /// Adds empty crystals up to `cap`; returns how many were gained
    pub fn gain_crystals(&mut self, amount: u8, cap: u8) -> u8 {
        let before = self.max;
        self.max = self.max.saturating_add(amount).min(cap);
        self.max - before
    }

    /// Mana usable this turn only, allowed above `max`
    pub fn gain_temporary(&mut self, amount: u8) {
        self.current = self.current.saturating_add(amount);
    }

    pub fn add_overload(&mut self, amount: u8) {
        self.pending_overload = self.pending_overload.saturating_add(amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_turn_applies_overload() {
        let mut pool = ManaPool {
            current: 0,
            max: 4,
            overloaded: 0,
            pending_overload: 2,
        };
        pool.start_turn(MAX_MANA);
        assert_eq!(pool.max, 5);
        assert_eq!(pool.overloaded, 2);
        assert_eq!(pool.current, 3);
        assert_eq!(pool.pending_overload, 0);
    }

    #[test]
    fn test_mana_caps_at_ten() {
        let mut pool = ManaPool {
            max: 10,
            ..Default::default()
        };
        pool.start_turn(MAX_MANA);
        assert_eq!(pool.max, 10);
        assert_eq!(pool.gain_crystals(3, MAX_MANA), 0);
    }

    #[test]
    fn test_spend() {
        let mut pool = ManaPool {
            current: 3,
            max: 3,
            ..Default::default()
        };
        assert!(pool.can_afford(3));
        assert!(!pool.can_afford(4));
        pool.spend(2);
        assert_eq!(pool.current, 1);
    }
}
