//! Core engine types: units, roster, RNG, configuration, errors.
//!
//! These are the building blocks every other module works on. Unit stats
//! only change through crate-internal mutators, so the HP/AP invariants hold
//! no matter what a host does with the public API.

pub mod config;
pub mod error;
pub mod rng;
pub mod roster;
pub mod unit;

pub use config::{BattleConfig, VALID_SPEEDS};
pub use error::{BattleError, Result};
pub use rng::{BattleRng, BattleRngState, CombatRng, CombatRngState};
pub use roster::Roster;
pub use unit::{Team, Unit, UnitId, UnitSpec};
