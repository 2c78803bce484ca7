//! Error types for the battle engine.
//!
//! Errors fall into two groups:
//!
//! - **Configuration errors** (unknown keyword, empty roster, invalid unit
//!   data) fail fast at construction or setup time.
//! - **Precondition violations** (insufficient AP, dead actor) are returned
//!   before any state is touched, so a rejected call never leaves the roster
//!   half-mutated.
//!
//! Expected outcomes such as "no valid target" are not errors; they are
//! reported through `SkillResult` instead.

use thiserror::Error;

use super::unit::{Team, UnitId};
use crate::skills::{KeywordId, SkillId};

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, BattleError>;

/// Errors raised by the battle engine.
#[derive(Debug, Error)]
pub enum BattleError {
    #[error("unknown keyword `{0}`")]
    UnknownKeyword(KeywordId),

    #[error("keyword `{0}` is already registered")]
    DuplicateKeyword(KeywordId),

    #[error("unknown skill `{0}`")]
    UnknownSkill(SkillId),

    #[error("skill `{0}` is already registered")]
    DuplicateSkill(SkillId),

    #[error("unknown passive `{0}`")]
    UnknownPassive(String),

    #[error("{0} roster is empty")]
    EmptyRoster(Team),

    #[error("invalid unit {unit}: {reason}")]
    InvalidUnit { unit: UnitId, reason: String },

    #[error("unit {0} appears more than once in the roster")]
    DuplicateUnit(UnitId),

    #[error("unknown unit {0}")]
    UnknownUnit(UnitId),

    #[error("unit {unit} has {have} AP but skill `{skill}` costs {need}")]
    InsufficientAp {
        unit: UnitId,
        skill: SkillId,
        have: i32,
        need: i32,
    },

    #[error("unit {0} is dead and cannot act")]
    DeadUnitActs(UnitId),

    #[error("game speed must be 1, 2, 4 or 8 (got {0})")]
    InvalidSpeed(u32),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("snapshot encoding failed: {0}")]
    Snapshot(#[from] bincode::Error),

    #[error("malformed data: {0}")]
    Data(#[from] serde_json::Error),
}

impl BattleError {
    /// True for errors that reject an operation without touching state
    /// (as opposed to setup/configuration failures).
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            BattleError::InsufficientAp { .. } | BattleError::DeadUnitActs(_)
        )
    }
}
