//! Skill library for definition lookup.
//!
//! The `SkillLibrary` stores every built skill for a battle and the default
//! loadout handed to units whose data lists no skills.

use rustc_hash::FxHashMap;

use super::keyword::KeywordTable;
use super::skill::{Skill, SkillDef, SkillId, SkillKind, TargetKind};
use crate::core::{BattleError, Result};

/// Id of the built-in free `wait` skill.
pub const WAIT_SKILL: &str = "wait";

/// Registry of built skills.
///
/// ## Example
///
/// ```
/// use charge_battle::skills::{KeywordTable, SkillId, SkillLibrary};
///
/// let table = KeywordTable::with_defaults();
/// let library = SkillLibrary::with_defaults(&table).unwrap();
///
/// let skill = library.get(&SkillId::new("flame_strike")).unwrap();
/// assert_eq!(skill.ap_cost(), 5);
/// assert_eq!(skill.power(), 15);
/// ```
#[derive(Clone, Debug, Default)]
pub struct SkillLibrary {
    skills: FxHashMap<SkillId, Skill>,
    default_loadout: Vec<SkillId>,
}

impl SkillLibrary {
    /// Create a new empty library.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in skill set, built against `table`.
    ///
    /// Fails if `table` lacks any keyword the built-ins use.
    pub fn with_defaults(table: &KeywordTable) -> Result<Self> {
        let defs = [
            SkillDef::new("basic_attack", "Basic Attack", SkillKind::Attack, TargetKind::Enemy)
                .with_keyword("SLASH")
                .with_priority(5),
            SkillDef::new("flame_strike", "Flame Strike", SkillKind::Attack, TargetKind::Enemy)
                .with_keyword("STRIKE")
                .with_keyword("FLAME")
                .with_priority(1),
            SkillDef::new("twin_slash", "Twin Slash", SkillKind::Attack, TargetKind::Enemy)
                .with_keyword("TWIN")
                .with_keyword("SLASH")
                .with_priority(2),
            SkillDef::new("drain_bite", "Drain Bite", SkillKind::Attack, TargetKind::Enemy)
                .with_keyword("DRAIN")
                .with_keyword("SLASH")
                .with_priority(3),
            SkillDef::new("piercing_shot", "Piercing Shot", SkillKind::Attack, TargetKind::Enemy)
                .with_keyword("PIERCE")
                .with_keyword("STRIKE")
                .with_priority(2),
            SkillDef::new("cleave", "Cleave", SkillKind::Attack, TargetKind::Enemy)
                .with_keyword("SWEEP")
                .with_keyword("SLASH")
                .with_priority(2),
            SkillDef::new("sunder", "Sunder", SkillKind::Attack, TargetKind::Enemy)
                .with_keyword("BREAKER")
                .with_priority(3),
            SkillDef::new("mend", "Mend", SkillKind::Heal, TargetKind::Ally)
                .with_keyword("MEND")
                .with_priority(0),
            SkillDef::new("guard", "Guard", SkillKind::Defend, TargetKind::Self_)
                .with_keyword("BRACE")
                .with_priority(6),
            SkillDef::new(WAIT_SKILL, "Wait", SkillKind::Wait, TargetKind::Self_).with_priority(9),
        ];

        let mut library = Self::from_defs(&defs, table)?;
        library.default_loadout = ["basic_attack", "flame_strike", "guard", WAIT_SKILL]
            .into_iter()
            .map(SkillId::new)
            .collect();
        Ok(library)
    }

    /// Build every definition against `table`.
    pub fn from_defs(defs: &[SkillDef], table: &KeywordTable) -> Result<Self> {
        let mut library = Self::new();
        for def in defs {
            library.register(def.build(table)?)?;
        }
        Ok(library)
    }

    /// Load skill definitions from a JSON array and build them.
    pub fn from_json(json: &str, table: &KeywordTable) -> Result<Self> {
        let defs: Vec<SkillDef> = serde_json::from_str(json)?;
        Self::from_defs(&defs, table)
    }

    /// Register a built skill. Fails if the id is taken.
    pub fn register(&mut self, skill: Skill) -> Result<()> {
        if self.skills.contains_key(skill.id()) {
            return Err(BattleError::DuplicateSkill(skill.id().clone()));
        }
        self.skills.insert(skill.id().clone(), skill);
        Ok(())
    }

    /// Set the loadout given to units whose data lists no skills.
    pub fn set_default_loadout(&mut self, loadout: Vec<SkillId>) -> Result<()> {
        for id in &loadout {
            self.require(id)?;
        }
        self.default_loadout = loadout;
        Ok(())
    }

    #[must_use]
    pub fn default_loadout(&self) -> &[SkillId] {
        &self.default_loadout
    }

    #[must_use]
    pub fn get(&self, id: &SkillId) -> Option<&Skill> {
        self.skills.get(id)
    }

    /// Look up a skill, failing with `UnknownSkill`.
    pub fn require(&self, id: &SkillId) -> Result<&Skill> {
        self.get(id).ok_or_else(|| BattleError::UnknownSkill(id.clone()))
    }

    #[must_use]
    pub fn contains(&self, id: &SkillId) -> bool {
        self.skills.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.skills.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// Iterate over all skills (unordered).
    pub fn iter(&self) -> impl Iterator<Item = &Skill> {
        self.skills.values()
    }

    /// The free fallback skill: the cheapest `wait`, lowest id on ties.
    #[must_use]
    pub fn fallback_wait(&self) -> Option<&Skill> {
        self.skills
            .values()
            .filter(|s| s.kind() == SkillKind::Wait && s.ap_cost() == 0)
            .min_by(|a, b| a.id().cmp(b.id()))
    }
}
