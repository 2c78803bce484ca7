//! Resolution results and the events they carry.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::UnitId;
use crate::skills::{SkillId, SkillKind};

/// Why a skill resolved without effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The targeting policy found no valid target.
    NoTarget,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::NoTarget => f.write_str("no_target"),
        }
    }
}

/// Something observable that happened while a skill resolved.
///
/// Events are recorded in order as state is mutated, and only handed to
/// presentation hooks after the whole resolution has committed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CombatEvent {
    ActionAnnounced {
        actor: UnitId,
        skill: SkillId,
        ap_cost: i32,
    },
    Damage {
        source: UnitId,
        target: UnitId,
        amount: i32,
        critical: bool,
    },
    Miss {
        attacker: UnitId,
        target: UnitId,
    },
    Heal {
        target: UnitId,
        amount: i32,
    },
    ApRecovered {
        unit: UnitId,
        amount: i32,
    },
    Guarded {
        unit: UnitId,
    },
    PassiveActivated {
        unit: UnitId,
        passive: String,
    },
    Death {
        unit: UnitId,
    },
}

/// Uniform result of resolving one skill.
///
/// `total_effect` is damage dealt to the primary target (attack), HP
/// restored (heal), AP recovered (wait) or 0 (defend).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkillResult {
    pub success: bool,
    pub kind: SkillKind,
    pub skill: SkillId,
    pub actor: UnitId,
    pub target: Option<UnitId>,
    pub total_effect: i32,
    pub target_died: bool,
    pub reason: Option<FailureReason>,
    pub critical: bool,
    pub dodged: bool,
    pub ap_spent: i32,
    /// Every unit that died during this resolution, in order.
    pub deaths: SmallVec<[UnitId; 4]>,
    pub events: SmallVec<[CombatEvent; 8]>,
}

impl SkillResult {
    /// A successful result with no effect recorded yet.
    pub(crate) fn begin(kind: SkillKind, skill: SkillId, actor: UnitId) -> Self {
        Self {
            success: true,
            kind,
            skill,
            actor,
            target: None,
            total_effect: 0,
            target_died: false,
            reason: None,
            critical: false,
            dodged: false,
            ap_spent: 0,
            deaths: SmallVec::new(),
            events: SmallVec::new(),
        }
    }

    /// A failed result. Nothing was consumed or changed.
    pub(crate) fn failed(kind: SkillKind, skill: SkillId, actor: UnitId, reason: FailureReason) -> Self {
        Self {
            success: false,
            reason: Some(reason),
            ..Self::begin(kind, skill, actor)
        }
    }

    pub(crate) fn push(&mut self, event: CombatEvent) {
        if let CombatEvent::Death { unit } = event {
            self.deaths.push(unit);
        }
        self.events.push(event);
    }

    /// Total damage across all events (primary, splash and retaliation).
    #[must_use]
    pub fn damage_dealt(&self) -> i32 {
        self.events
            .iter()
            .map(|e| match e {
                CombatEvent::Damage { amount, .. } => *amount,
                _ => 0,
            })
            .sum()
    }
}
