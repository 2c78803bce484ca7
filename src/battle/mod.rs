//! Battle orchestration.
//!
//! - `BattleController`: setup, controls (start, pause, auto mode, speed,
//!   manual step) and the turn loop
//! - `BattleState`: roster, scheduler, RNG, history and outcome
//! - `SkillChooser`: which skill a unit uses on its turn
//! - `PresentationHooks` / `BattleLog`: observers that never affect outcomes
//!
//! ```
//! use charge_battle::battle::{BattleController, BattleOutcome};
//! use charge_battle::core::{BattleConfig, UnitSpec};
//!
//! let mut controller = BattleController::with_defaults(BattleConfig::new(42)).unwrap();
//! controller
//!     .initialize_units(
//!         &[UnitSpec::new(1, "Knight", 40, 12).with_combat(6, 2)],
//!         &[UnitSpec::new(2, "Slime", 12, 8)],
//!     )
//!     .unwrap();
//!
//! let outcome = controller.run_to_end(100_000).unwrap();
//! assert!(outcome.is_some());
//! ```

mod controller;
mod hooks;
mod narration;
mod policy;
mod state;

pub use controller::{BattleController, Progress, StepOutcome};
pub use hooks::{HookError, NoHooks, PresentationHooks};
pub use narration::{BattleLog, LogCategory, LogEntry, LogFacadeSink, MemoryLog};
pub use policy::{PriorityChooser, ScriptedChooser, SkillChoice, SkillChooser};
pub use state::{BattleOutcome, BattleSnapshot, BattleState, TurnRecord};
