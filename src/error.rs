//! Error types for the combat engine

use thiserror::Error;

/// Reason an inbound action was rejected before any state was touched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ActionRejection {
    #[error("the game is over")]
    GameOver,

    #[error("action not allowed in the current phase")]
    WrongPhase,

    #[error("acting out of turn")]
    NotYourTurn,

    #[error("card is not in hand")]
    CardNotInHand,

    #[error("insufficient mana: requires {required}, have {available}")]
    InsufficientMana { required: u8, available: u8 },

    #[error("this card requires a target")]
    TargetRequired,

    #[error("illegal target")]
    IllegalTarget,

    #[error("battlefield is full")]
    BoardFull,

    #[error("secret zone is full or already holds this secret")]
    SecretZoneFull,

    #[error("attacker not found on the battlefield")]
    AttackerNotFound,

    #[error("minion is summoning sick")]
    SummoningSick,

    #[error("already attacked this turn")]
    AlreadyAttacked,

    #[error("frozen characters cannot attack")]
    Frozen,

    #[error("character has no attack")]
    NoAttack,

    #[error("a taunt minion must be attacked first")]
    MustAttackTaunt,

    #[error("rush minions may only attack minions this turn")]
    RushTargetsMinionsOnly,

    #[error("hero power already used this turn")]
    HeroPowerUsed,

    #[error("no weapon equipped")]
    NoWeapon,

    #[error("a discover choice must be resolved first")]
    DiscoveryPending,

    #[error("no discover choice is pending")]
    NoDiscoveryPending,

    #[error("card is not an equippable artifact")]
    NotAnArtifact,

    #[error("mulligan already completed")]
    MulliganDone,

    #[error("an automated turn is already in progress")]
    TurnInProgress,
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid action: {0}")]
    InvalidAction(#[from] ActionRejection),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Automated turn exceeded {0} ms")]
    TurnTimedOut(u64),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl EngineError {
    /// The rejection reason, if this is an `InvalidAction`
    pub fn rejection(&self) -> Option<ActionRejection> {
        match self {
            EngineError::InvalidAction(reason) => Some(*reason),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
