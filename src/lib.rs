//! # charge-battle
//!
//! A turn-based battle engine where turns come from charge, not rounds.
//!
//! ## Model
//!
//! 1. **Charge scheduling**: every living unit accumulates charge at a rate
//!    proportional to its speed. Reaching the threshold makes it Ready; Ready
//!    units act one at a time in a deterministic order.
//!
//! 2. **Keyword composition**: skills are built from keywords. A skill's AP
//!    cost and power are the sums of its keywords', and keyword tags (multi-hit,
//!    ignore defense, penetration, lifesteal, splash) fold into one modifier set.
//!
//! 3. **Staged resolution**: attacks flow through fixed stages (crit roll,
//!    pre-damage passive, per-hit damage, lifesteal and splash, post-damage
//!    passive). Passives act on a context value passed between stages.
//!
//! 4. **Headless core**: presentation hooks and narration only observe
//!    committed state. A seeded battle plays out identically with or without
//!    them.
//!
//! ## Modules
//!
//! - `core`: unit ids, units, roster, RNG, configuration, errors
//! - `skills`: keyword table, skill composition, skill library
//! - `passives`: passive abilities and their registry
//! - `effects`: targeting policies and the resolution pipeline
//! - `turns`: the charge scheduler
//! - `battle`: the controller, state, choosers, hooks and logs

pub mod battle;
pub mod core;
pub mod effects;
pub mod passives;
pub mod skills;
pub mod turns;

// Re-export commonly used types
pub use crate::core::{
    BattleConfig, BattleError, BattleRng, CombatRng, Result, Roster, Team, Unit, UnitId, UnitSpec,
};

pub use crate::skills::{
    Keyword, KeywordId, KeywordTable, KeywordTags, Skill, SkillDef, SkillId, SkillKind,
    SkillLibrary, TargetKind,
};

pub use crate::passives::{PassiveAbility, PassiveKind, PassiveRegistry, PassiveTrigger};

pub use crate::effects::{
    CombatEvent, FailureReason, LowestHpPolicy, SkillResolver, SkillResult, TargetPolicy,
};

pub use crate::turns::{GameSpeed, StepRejection, TickOutcome, TurnScheduler, UnitPhase};

pub use crate::battle::{
    BattleController, BattleLog, BattleOutcome, BattleSnapshot, BattleState, LogCategory,
    PresentationHooks, Progress, SkillChooser, StepOutcome, TurnRecord,
};
