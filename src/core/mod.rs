//! Core game types and entities

pub mod artifact;
pub mod card;
pub mod effects;
pub mod entity;
pub mod mana;
pub mod player;
pub mod types;

pub use artifact::{ArtifactRuntimeState, ArtifactSpec, CounterSet, GateBook, LETHAL_PREVENTED_KEY};
pub use card::{CardDefinition, CardInstance, CardKind, Keyword, Rarity};
pub use effects::{
    Amount, Aura, Condition, Counter, DiscoverPool, DynamicAmount, Effect, EffectSlot, Gate,
    GateScope, Target, TokenSpec, Trigger, TriggeredEffect,
};
pub use entity::{CardId, InstanceId, InstanceIdAllocator};
pub use mana::{ManaPool, MAX_MANA};
pub use player::{HeroPower, PlayerState};
pub use types::{Race, Side, TargetRef};
