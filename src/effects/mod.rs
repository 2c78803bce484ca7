//! Skill resolution pipeline.
//!
//! - `TargetPolicy`: picks a target under the targeting contract
//! - `SkillResolver`: applies attack, heal, defend and wait skills
//! - `SkillResult` / `CombatEvent`: what happened, for hooks and logs
//!
//! ```
//! use charge_battle::core::{BattleConfig, BattleRng, Roster, Team, Unit, UnitId, UnitSpec};
//! use charge_battle::effects::{LowestHpPolicy, SkillResolver};
//! use charge_battle::skills::{KeywordTable, SkillId, SkillLibrary};
//!
//! let table = KeywordTable::with_defaults();
//! let library = SkillLibrary::with_defaults(&table).unwrap();
//! let knight = Unit::from_spec(&UnitSpec::new(1, "Knight", 40, 10), Team::Ally, None, Vec::new()).unwrap();
//! let slime = Unit::from_spec(&UnitSpec::new(2, "Slime", 10, 5), Team::Enemy, None, Vec::new()).unwrap();
//! let mut roster = Roster::new(vec![knight], vec![slime]).unwrap();
//!
//! let config = BattleConfig::new(1).with_crit_chance(0.0);
//! let resolver = SkillResolver::new(&config);
//! let skill = library.require(&SkillId::new("flame_strike")).unwrap();
//! let mut rng = BattleRng::new(config.seed);
//!
//! let result = resolver
//!     .resolve(&mut roster, UnitId::new(1), skill, &mut LowestHpPolicy, &mut rng)
//!     .unwrap();
//! assert!(result.target_died);
//! ```

mod resolver;
mod result;
mod targeting;

pub use resolver::SkillResolver;
pub use result::{CombatEvent, FailureReason, SkillResult};
pub use targeting::{
    is_valid_target, valid_targets, FrontSlotPolicy, LowestHpPolicy, PreferredTargetPolicy,
    RandomPolicy, TargetPolicy,
};
