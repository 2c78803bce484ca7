//! Presentation hooks.
//!
//! A host (renderer, sound, UI) observes the battle through
//! `PresentationHooks`. Hooks run only after the state change they describe
//! has been committed, and they cannot change the outcome: a failing hook is
//! logged and counted by the controller, never propagated.

use thiserror::Error;

use super::state::BattleOutcome;
use crate::core::{Roster, Unit};
use crate::effects::CombatEvent;
use crate::skills::SkillId;

/// A hook could not present an event.
#[derive(Debug, Error)]
#[error("presentation hook failed: {0}")]
pub struct HookError(pub String);

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Observer callbacks. Every method defaults to a no-op.
pub trait PresentationHooks {
    fn on_action_announced(
        &mut self,
        _actor: &Unit,
        _skill: &SkillId,
        _ap_cost: i32,
    ) -> Result<(), HookError> {
        Ok(())
    }

    fn on_damage(&mut self, _target: &Unit, _amount: i32, _critical: bool) -> Result<(), HookError> {
        Ok(())
    }

    /// An attack was dodged.
    fn on_miss(&mut self, _attacker: &Unit, _target: &Unit) -> Result<(), HookError> {
        Ok(())
    }

    fn on_heal(&mut self, _target: &Unit, _amount: i32) -> Result<(), HookError> {
        Ok(())
    }

    fn on_death(&mut self, _unit: &Unit) -> Result<(), HookError> {
        Ok(())
    }

    fn on_passive_activated(&mut self, _unit: &Unit, _passive: &str) -> Result<(), HookError> {
        Ok(())
    }

    fn on_battle_end(&mut self, _outcome: BattleOutcome) -> Result<(), HookError> {
        Ok(())
    }
}

/// Hooks that present nothing (headless runs).
#[derive(Clone, Copy, Debug, Default)]
pub struct NoHooks;

impl PresentationHooks for NoHooks {}

/// Hand one committed event to `hooks`.
///
/// Events without a matching hook (AP recovery, guard) are skipped. Units
/// are looked up in their post-resolution state.
pub(crate) fn dispatch(
    hooks: &mut dyn PresentationHooks,
    roster: &Roster,
    event: &CombatEvent,
) -> Result<(), HookError> {
    let unit = |id| {
        roster
            .get(id)
            .ok_or_else(|| HookError::new(format!("event names unknown unit {id}")))
    };

    match event {
        CombatEvent::ActionAnnounced {
            actor,
            skill,
            ap_cost,
        } => hooks.on_action_announced(unit(*actor)?, skill, *ap_cost),
        CombatEvent::Damage {
            target,
            amount,
            critical,
            ..
        } => hooks.on_damage(unit(*target)?, *amount, *critical),
        CombatEvent::Miss { attacker, target } => hooks.on_miss(unit(*attacker)?, unit(*target)?),
        CombatEvent::Heal { target, amount } => hooks.on_heal(unit(*target)?, *amount),
        CombatEvent::Death { unit: id } => hooks.on_death(unit(*id)?),
        CombatEvent::PassiveActivated { unit: id, passive } => {
            hooks.on_passive_activated(unit(*id)?, passive)
        }
        CombatEvent::ApRecovered { .. } | CombatEvent::Guarded { .. } => Ok(()),
    }
}
