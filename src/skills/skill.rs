//! Skills: named actions composed from keyword lists.
//!
//! A `SkillDef` is authoring data (what a designer writes); `SkillDef::build`
//! validates it against a `KeywordTable` and produces an immutable `Skill`
//! whose AP cost, power and modifiers are computed exactly once.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::keyword::{checked_sum, Keyword, KeywordId, KeywordTable, KeywordTags, MAX_HITS};
use crate::core::{BattleError, Result};

/// Skill identifier, e.g. `"flame_strike"`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillId(pub String);

impl SkillId {
    /// Create a new skill ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SkillId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a skill does when resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillKind {
    Attack,
    Heal,
    Defend,
    Wait,
}

impl SkillKind {
    /// Whether a skill of this kind may be aimed at `target`.
    ///
    /// Attacks hit the opposing team, heals stay on the actor's team, and
    /// defend and wait only affect the actor.
    #[must_use]
    pub fn accepts(self, target: TargetKind) -> bool {
        match self {
            SkillKind::Attack => target == TargetKind::Enemy,
            SkillKind::Heal => matches!(target, TargetKind::Ally | TargetKind::Self_),
            SkillKind::Defend | SkillKind::Wait => target == TargetKind::Self_,
        }
    }
}

impl std::fmt::Display for SkillKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SkillKind::Attack => "attack",
            SkillKind::Heal => "heal",
            SkillKind::Defend => "defend",
            SkillKind::Wait => "wait",
        };
        f.write_str(name)
    }
}

/// Who a skill may be aimed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    /// A living unit on the opposing team.
    #[serde(rename = "enemy")]
    Enemy,
    /// A living teammate other than the actor.
    #[serde(rename = "ally")]
    Ally,
    /// The actor itself.
    #[serde(rename = "self")]
    Self_,
}

/// Keyword tags folded into one value.
///
/// Built by a pure reducer over the keyword list, so the pipeline reads plain
/// fields instead of probing for tag presence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkillModifiers {
    /// Number of damage applications (at least 1).
    pub hits: u32,
    pub ignore_defense: bool,
    pub penetration: bool,
    /// Combined lifesteal ratio, capped at 1.
    pub lifesteal: f64,
    pub splash: bool,
}

impl Default for SkillModifiers {
    fn default() -> Self {
        Self {
            hits: 1,
            ignore_defense: false,
            penetration: false,
            lifesteal: 0.0,
            splash: false,
        }
    }
}

impl SkillModifiers {
    /// Fold keyword tags together.
    ///
    /// Hit counts add up to a cap of `MAX_HITS` (no hit tags means a single
    /// hit). Lifesteal ratios add up to a cap of 1, and flags are OR-ed.
    pub fn from_tags<'a>(tags: impl IntoIterator<Item = &'a KeywordTags>) -> Self {
        let (extra_hits, modifiers) = tags.into_iter().fold(
            (0u32, Self::default()),
            |(hits, acc), tag| {
                let merged = Self {
                    hits: acc.hits,
                    ignore_defense: acc.ignore_defense || tag.ignore_defense,
                    penetration: acc.penetration || tag.penetration,
                    lifesteal: (acc.lifesteal + tag.lifesteal.unwrap_or(0.0)).min(1.0),
                    splash: acc.splash || tag.splash,
                };
                (hits.saturating_add(tag.hits.unwrap_or(0)), merged)
            },
        );

        Self {
            hits: extra_hits.clamp(1, MAX_HITS),
            ..modifiers
        }
    }

    /// True if the target's defense stat is skipped.
    #[must_use]
    pub fn bypasses_defense(&self) -> bool {
        self.ignore_defense || self.penetration
    }
}

/// Authoring data for a skill.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkillDef {
    pub id: SkillId,
    pub name: String,
    pub kind: SkillKind,
    pub target: TargetKind,
    #[serde(default)]
    pub keywords: Vec<KeywordId>,
    /// Lower values take precedence when a chooser ranks skills.
    #[serde(default)]
    pub priority: i32,
}

impl SkillDef {
    /// Create a definition with no keywords and priority 0.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: SkillKind,
        target: TargetKind,
    ) -> Self {
        Self {
            id: SkillId::new(id),
            name: name.into(),
            kind,
            target,
            keywords: Vec::new(),
            priority: 0,
        }
    }

    /// Append a keyword.
    #[must_use]
    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keywords.push(KeywordId::new(keyword));
        self
    }

    /// Set the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Build the skill.
    ///
    /// Fails fast on an unknown keyword, a target the kind does not allow,
    /// or cost/power totals that overflow.
    pub fn build(&self, table: &KeywordTable) -> Result<Skill> {
        if !self.kind.accepts(self.target) {
            return Err(BattleError::InvalidConfig(format!(
                "skill `{}`: {} skills cannot target {:?}",
                self.id, self.kind, self.target
            )));
        }

        let keywords: Vec<&Keyword> = table.lookup_all(&self.keywords)?;
        let overflow = |what: &str| {
            BattleError::InvalidConfig(format!("skill `{}`: total {what} overflows", self.id))
        };
        let ap_cost = checked_sum(keywords.iter().map(|k| k.ap_cost)).ok_or_else(|| overflow("ap_cost"))?;
        let power = checked_sum(keywords.iter().map(|k| k.power)).ok_or_else(|| overflow("power"))?;

        Ok(Skill {
            id: self.id.clone(),
            name: self.name.clone(),
            kind: self.kind,
            target: self.target,
            priority: self.priority,
            keywords: self.keywords.iter().cloned().collect(),
            ap_cost,
            power,
            modifiers: SkillModifiers::from_tags(keywords.iter().map(|k| &k.tags)),
        })
    }
}

/// A built skill. Derived values never change after construction.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Skill {
    id: SkillId,
    name: String,
    kind: SkillKind,
    target: TargetKind,
    priority: i32,
    keywords: SmallVec<[KeywordId; 4]>,
    ap_cost: i32,
    power: i32,
    modifiers: SkillModifiers,
}

impl Skill {
    #[must_use]
    pub fn id(&self) -> &SkillId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> SkillKind {
        self.kind
    }

    #[must_use]
    pub fn target(&self) -> TargetKind {
        self.target
    }

    #[must_use]
    pub fn priority(&self) -> i32 {
        self.priority
    }

    #[must_use]
    pub fn keywords(&self) -> &[KeywordId] {
        &self.keywords
    }

    #[must_use]
    pub fn ap_cost(&self) -> i32 {
        self.ap_cost
    }

    #[must_use]
    pub fn power(&self) -> i32 {
        self.power
    }

    #[must_use]
    pub fn modifiers(&self) -> &SkillModifiers {
        &self.modifiers
    }
}
