//! Keyword and skill composition.
//!
//! - `Keyword` / `KeywordTable`: atomic fragments (AP cost, power, tags)
//! - `SkillDef` / `Skill`: keyword lists composed into actions, with derived
//!   cost, power and folded `SkillModifiers`
//! - `SkillLibrary`: all skills available in a battle
//!
//! Composition is additive and pure: a skill's cost and power are the sums
//! over its keywords, fixed at construction. Any unknown keyword fails the
//! whole build; no partial skill is ever returned.

mod keyword;
mod library;
mod skill;

pub use keyword::{Keyword, KeywordId, KeywordTable, KeywordTags, MAX_HITS};
pub use library::{SkillLibrary, WAIT_SKILL};
pub use skill::{Skill, SkillDef, SkillId, SkillKind, SkillModifiers, TargetKind};
