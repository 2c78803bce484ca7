//! Combatants.
//!
//! ## Invariants
//!
//! Every `Unit` upholds, at all times:
//! - `0 <= hp <= max_hp`
//! - `is_alive() <=> hp > 0`
//! - `0 <= ap <= max_ap`
//!
//! Stats are private and only change through the crate's mutators, which
//! clamp on every write. Dead units are never removed from the roster; they
//! stay with `hp == 0` and are skipped by scheduling and targeting.

use serde::{Deserialize, Serialize};

use super::error::{BattleError, Result};
use crate::passives::PassiveAbility;
use crate::skills::SkillId;

/// Unique identifier for a unit within a battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl UnitId {
    /// Create a new unit ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Unit({})", self.0)
    }
}

/// The two sides of a battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Ally,
    Enemy,
}

impl Team {
    /// The opposing side.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Team::Ally => Team::Enemy,
            Team::Enemy => Team::Ally,
        }
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Team::Ally => write!(f, "ally"),
            Team::Enemy => write!(f, "enemy"),
        }
    }
}

/// Initial unit record supplied by the host's unit data source.
///
/// `hp` and `ap` default to their maximums when omitted. `passive` names an
/// entry in the `PassiveRegistry`; `skills` names entries in the
/// `SkillLibrary` (an empty list means "use the library's default loadout").
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitSpec {
    pub id: u32,
    pub name: String,
    pub slot: u8,
    pub max_hp: i32,
    #[serde(default)]
    pub hp: Option<i32>,
    #[serde(default = "default_max_ap")]
    pub max_ap: i32,
    #[serde(default)]
    pub ap: Option<i32>,
    pub speed: i32,
    #[serde(default)]
    pub attack: i32,
    #[serde(default)]
    pub defense: i32,
    #[serde(default)]
    pub passive: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}

fn default_max_ap() -> i32 {
    10
}

impl UnitSpec {
    /// Create a spec with the given id, name and core stats.
    pub fn new(id: u32, name: impl Into<String>, max_hp: i32, speed: i32) -> Self {
        Self {
            id,
            name: name.into(),
            slot: 0,
            max_hp,
            hp: None,
            max_ap: default_max_ap(),
            ap: None,
            speed,
            attack: 0,
            defense: 0,
            passive: None,
            skills: Vec::new(),
        }
    }

    /// Set the formation slot.
    #[must_use]
    pub fn with_slot(mut self, slot: u8) -> Self {
        self.slot = slot;
        self
    }

    /// Start below full HP.
    #[must_use]
    pub fn with_hp(mut self, hp: i32) -> Self {
        self.hp = Some(hp);
        self
    }

    /// Set max AP (current AP starts full unless `with_ap` is used).
    #[must_use]
    pub fn with_max_ap(mut self, max_ap: i32) -> Self {
        self.max_ap = max_ap;
        self
    }

    /// Start with a specific AP value.
    #[must_use]
    pub fn with_ap(mut self, ap: i32) -> Self {
        self.ap = Some(ap);
        self
    }

    /// Set attack and defense.
    #[must_use]
    pub fn with_combat(mut self, attack: i32, defense: i32) -> Self {
        self.attack = attack;
        self.defense = defense;
        self
    }

    /// Attach a passive by registry name.
    #[must_use]
    pub fn with_passive(mut self, name: impl Into<String>) -> Self {
        self.passive = Some(name.into());
        self
    }

    /// Add a skill to the loadout by library id.
    #[must_use]
    pub fn with_skill(mut self, skill: impl Into<String>) -> Self {
        self.skills.push(skill.into());
        self
    }
}

/// A combatant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    id: UnitId,
    name: String,
    team: Team,
    slot: u8,
    hp: i32,
    max_hp: i32,
    ap: i32,
    max_ap: i32,
    speed: i32,
    attack: i32,
    defense: i32,
    charge: f64,
    guarding: bool,
    passive: Option<PassiveAbility>,
    skills: Vec<SkillId>,
}

impl Unit {
    /// Build a unit from external data, validating its stats.
    ///
    /// The passive and loadout are resolved by the caller (see
    /// `BattleController::initialize_units`), which owns the registries.
    pub fn from_spec(
        spec: &UnitSpec,
        team: Team,
        passive: Option<PassiveAbility>,
        skills: Vec<SkillId>,
    ) -> Result<Self> {
        let id = UnitId::new(spec.id);
        let invalid = |reason: &str| BattleError::InvalidUnit {
            unit: id,
            reason: reason.to_string(),
        };

        if spec.max_hp <= 0 {
            return Err(invalid("max_hp must be positive"));
        }
        if spec.speed <= 0 {
            return Err(invalid("speed must be positive"));
        }
        if spec.max_ap < 0 {
            return Err(invalid("max_ap must not be negative"));
        }
        let hp = spec.hp.unwrap_or(spec.max_hp);
        if !(0..=spec.max_hp).contains(&hp) {
            return Err(invalid("hp must be within 0..=max_hp"));
        }
        let ap = spec.ap.unwrap_or(spec.max_ap);
        if !(0..=spec.max_ap).contains(&ap) {
            return Err(invalid("ap must be within 0..=max_ap"));
        }

        Ok(Self {
            id,
            name: spec.name.clone(),
            team,
            slot: spec.slot,
            hp,
            max_hp: spec.max_hp,
            ap,
            max_ap: spec.max_ap,
            speed: spec.speed,
            attack: spec.attack,
            defense: spec.defense,
            charge: 0.0,
            guarding: false,
            passive,
            skills,
        })
    }

    #[must_use]
    pub fn id(&self) -> UnitId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn team(&self) -> Team {
        self.team
    }

    #[must_use]
    pub fn slot(&self) -> u8 {
        self.slot
    }

    #[must_use]
    pub fn hp(&self) -> i32 {
        self.hp
    }

    #[must_use]
    pub fn max_hp(&self) -> i32 {
        self.max_hp
    }

    #[must_use]
    pub fn ap(&self) -> i32 {
        self.ap
    }

    #[must_use]
    pub fn max_ap(&self) -> i32 {
        self.max_ap
    }

    #[must_use]
    pub fn speed(&self) -> i32 {
        self.speed
    }

    #[must_use]
    pub fn attack(&self) -> i32 {
        self.attack
    }

    #[must_use]
    pub fn defense(&self) -> i32 {
        self.defense
    }

    #[must_use]
    pub fn charge(&self) -> f64 {
        self.charge
    }

    /// True while a defend guard is waiting to absorb a hit.
    #[must_use]
    pub fn is_guarding(&self) -> bool {
        self.guarding
    }

    #[must_use]
    pub fn passive(&self) -> Option<&PassiveAbility> {
        self.passive.as_ref()
    }

    /// Skill loadout, in the order the unit data listed it.
    #[must_use]
    pub fn skills(&self) -> &[SkillId] {
        &self.skills
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Missing HP (`max_hp - hp`).
    #[must_use]
    pub fn missing_hp(&self) -> i32 {
        self.max_hp - self.hp
    }

    // === Mutators (pipeline and scheduler only) ===

    /// Remove up to `amount` HP. Returns the HP actually lost.
    pub(crate) fn take_damage(&mut self, amount: i32) -> i32 {
        let dealt = amount.clamp(0, self.hp);
        self.hp -= dealt;
        dealt
    }

    /// Restore up to `amount` HP. Dead units cannot be healed.
    /// Returns the HP actually restored.
    pub(crate) fn heal(&mut self, amount: i32) -> i32 {
        if !self.is_alive() {
            return 0;
        }
        let healed = amount.clamp(0, self.missing_hp());
        self.hp += healed;
        healed
    }

    /// Spend AP. The caller has already checked affordability.
    pub(crate) fn spend_ap(&mut self, cost: i32) {
        self.ap = (self.ap - cost.max(0)).clamp(0, self.max_ap);
    }

    /// Recover up to `amount` AP. Returns the AP actually recovered.
    pub(crate) fn recover_ap(&mut self, amount: i32) -> i32 {
        let recovered = amount.clamp(0, self.max_ap - self.ap);
        self.ap += recovered;
        recovered
    }

    pub(crate) fn add_charge(&mut self, amount: f64) {
        if self.is_alive() && amount > 0.0 {
            self.charge += amount;
        }
    }

    pub(crate) fn reset_charge(&mut self) {
        self.charge = 0.0;
    }

    pub(crate) fn set_guard(&mut self, guarding: bool) {
        self.guarding = guarding;
    }
}
