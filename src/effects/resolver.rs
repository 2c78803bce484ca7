//! Skill resolution.
//!
//! `SkillResolver` applies one skill from one unit to the roster. It is the
//! only place unit HP, AP and guard state change during combat.
//!
//! ## Attack stages
//!
//! 1. Select a target; none is a `NoTarget` result with nothing consumed
//! 2. Spend AP, roll one critical for the whole skill
//! 3. `OnBeingHit` passive on the target (dodge, damage scaling)
//! 4. Apply each hit: defense, guard, clamp; stop once the target dies
//! 5. Lifesteal, then splash onto the target's teammates
//! 6. `OnAfterHit` passive if the target survived (retaliation)
//!
//! The resolver is stateless apart from the numeric rules copied from
//! `BattleConfig`. Randomness comes from the caller's `BattleRng` so battle
//! state can snapshot it.

use log::{debug, info, warn};
use smallvec::SmallVec;

use super::result::{CombatEvent, FailureReason, SkillResult};
use super::targeting::{is_valid_target, TargetPolicy};
use crate::core::{BattleConfig, BattleError, BattleRng, CombatRng, Result, Roster, UnitId};
use crate::passives::{HitContext, PassiveResult, PassiveTrigger};
use crate::skills::{Skill, SkillKind, MAX_HITS};

/// Applies skills to a roster.
#[derive(Clone, Debug, PartialEq)]
pub struct SkillResolver {
    crit_chance: f64,
    crit_multiplier: f64,
    wait_ap_recovery: i32,
    guard_multiplier: f64,
    splash_ratio: f64,
}

impl SkillResolver {
    /// Create a resolver using the rules in `config`.
    #[must_use]
    pub fn new(config: &BattleConfig) -> Self {
        Self {
            crit_chance: config.crit_chance,
            crit_multiplier: config.crit_multiplier,
            wait_ap_recovery: config.wait_ap_recovery,
            guard_multiplier: config.guard_multiplier,
            splash_ratio: config.splash_ratio,
        }
    }

    /// Resolve `skill` used by `actor`.
    ///
    /// Fails with `DeadUnitActs` or `InsufficientAp` before touching any
    /// state. A missing target is not an error: the result comes back with
    /// `success == false` and `FailureReason::NoTarget`.
    pub fn resolve(
        &self,
        roster: &mut Roster,
        actor: UnitId,
        skill: &Skill,
        policy: &mut dyn TargetPolicy,
        rng: &mut BattleRng,
    ) -> Result<SkillResult> {
        let cost = self.check_preconditions(roster, actor, skill)?;

        let result = match skill.kind() {
            SkillKind::Attack => self.resolve_attack(roster, actor, skill, cost, policy, rng)?,
            SkillKind::Heal => self.resolve_heal(roster, actor, skill, cost, policy, &mut rng.targeting)?,
            SkillKind::Defend => self.resolve_defend(roster, actor, skill, cost)?,
            SkillKind::Wait => self.resolve_wait(roster, actor, skill)?,
        };

        if result.success {
            info!(
                "{} used {} ({}): effect {}, {} AP",
                actor,
                skill.id(),
                skill.kind(),
                result.total_effect,
                result.ap_spent
            );
        } else {
            debug!("{} could not use {}: no valid target", actor, skill.id());
        }
        Ok(result)
    }

    /// AP the skill will cost, once the actor is known to be able to pay it.
    fn check_preconditions(&self, roster: &Roster, actor: UnitId, skill: &Skill) -> Result<i32> {
        let unit = roster.require(actor)?;
        if !unit.is_alive() {
            return Err(BattleError::DeadUnitActs(actor));
        }

        let cost = match skill.kind() {
            SkillKind::Wait => 0,
            _ => skill.ap_cost().max(0),
        };
        if unit.ap() < cost {
            return Err(BattleError::InsufficientAp {
                unit: actor,
                skill: skill.id().clone(),
                have: unit.ap(),
                need: cost,
            });
        }
        Ok(cost)
    }

    fn select_target(
        roster: &Roster,
        actor: UnitId,
        skill: &Skill,
        policy: &mut dyn TargetPolicy,
        rng: &mut CombatRng,
    ) -> Result<Option<UnitId>> {
        let unit = roster.require(actor)?;
        let kind = skill.target();
        let picked = policy.select(unit, roster, kind, rng);

        Ok(picked.filter(|id| {
            let valid = roster
                .get(*id)
                .is_some_and(|candidate| is_valid_target(unit, candidate, kind));
            if !valid {
                warn!("policy picked invalid target {id} for {}", skill.id());
            }
            valid
        }))
    }

    /// Pay for the skill and announce it.
    fn commit(
        roster: &mut Roster,
        actor: UnitId,
        skill: &Skill,
        cost: i32,
        result: &mut SkillResult,
    ) -> Result<()> {
        roster.require_mut(actor)?.spend_ap(cost);
        result.ap_spent = cost;
        result.push(CombatEvent::ActionAnnounced {
            actor,
            skill: skill.id().clone(),
            ap_cost: cost,
        });
        Ok(())
    }

    fn resolve_attack(
        &self,
        roster: &mut Roster,
        actor: UnitId,
        skill: &Skill,
        cost: i32,
        policy: &mut dyn TargetPolicy,
        rng: &mut BattleRng,
    ) -> Result<SkillResult> {
        let Some(target) = Self::select_target(roster, actor, skill, policy, &mut rng.targeting)? else {
            return Ok(SkillResult::failed(
                skill.kind(),
                skill.id().clone(),
                actor,
                FailureReason::NoTarget,
            ));
        };

        let mut result = SkillResult::begin(skill.kind(), skill.id().clone(), actor);
        result.target = Some(target);
        Self::commit(roster, actor, skill, cost, &mut result)?;

        let modifiers = skill.modifiers();
        let critical = rng.combat.roll(self.crit_chance);
        let raw = if critical {
            (f64::from(skill.power()) * self.crit_multiplier).floor() as i32
        } else {
            skill.power()
        };
        result.critical = critical;

        let ctx = HitContext::new(actor, target, skill.id().clone(), raw);
        let ctx = match trigger_passive(roster, target, PassiveTrigger::OnBeingHit, &ctx, &mut rng.combat, &mut result)? {
            Some(PassiveResult::Context(next)) => next,
            _ => ctx,
        };

        if ctx.dodged {
            debug!("{target} dodged {}", skill.id());
            result.dodged = true;
            result.push(CombatEvent::Miss {
                attacker: actor,
                target,
            });
            return Ok(result);
        }

        let mut total = 0;
        for (index, hit) in split_hits(ctx.damage, modifiers.hits).into_iter().enumerate() {
            let unit = roster.require_mut(target)?;
            if !unit.is_alive() {
                break;
            }

            let scaled = (f64::from(hit) * ctx.damage_multiplier).floor() as i32;
            let mut damage = mitigate(scaled, unit.defense(), modifiers.bypasses_defense());
            if unit.is_guarding() && !modifiers.penetration {
                damage = (f64::from(damage) * self.guard_multiplier).floor() as i32;
                unit.set_guard(false);
            }

            let dealt = unit.take_damage(damage);
            let died = !unit.is_alive();
            total += dealt;
            debug!("hit {} of {}: {target} took {dealt}", index + 1, skill.id());

            result.push(CombatEvent::Damage {
                source: actor,
                target,
                amount: dealt,
                critical,
            });
            if died {
                result.target_died = true;
                result.push(CombatEvent::Death { unit: target });
                break;
            }
        }
        result.total_effect = total;
        let ctx = ctx.with_dealt(total);

        if modifiers.lifesteal > 0.0 && total > 0 {
            let amount = (f64::from(total) * modifiers.lifesteal).floor() as i32;
            let healed = roster.require_mut(actor)?.heal(amount);
            if healed > 0 {
                result.push(CombatEvent::Heal {
                    target: actor,
                    amount: healed,
                });
            }
        }

        if modifiers.splash && total > 0 {
            let amount = (f64::from(total) * self.splash_ratio).floor() as i32;
            self.apply_splash(roster, actor, target, amount, modifiers.bypasses_defense(), &mut result)?;
        }

        if roster.require(target)?.is_alive() {
            if let Some(PassiveResult::Retaliation(strike)) =
                trigger_passive(roster, target, PassiveTrigger::OnAfterHit, &ctx, &mut rng.combat, &mut result)?
            {
                let attacker = roster.require_mut(actor)?;
                if attacker.is_alive() {
                    let damage = mitigate(strike.amount, attacker.defense(), strike.ignore_defense);
                    let dealt = attacker.take_damage(damage);
                    result.push(CombatEvent::Damage {
                        source: target,
                        target: actor,
                        amount: dealt,
                        critical: false,
                    });
                    if !attacker.is_alive() {
                        result.push(CombatEvent::Death { unit: actor });
                    }
                }
            }
        }

        Ok(result)
    }

    fn apply_splash(
        &self,
        roster: &mut Roster,
        actor: UnitId,
        target: UnitId,
        amount: i32,
        bypass_defense: bool,
        result: &mut SkillResult,
    ) -> Result<()> {
        if amount <= 0 {
            return Ok(());
        }

        let team = roster.require(target)?.team();
        let victims: SmallVec<[UnitId; 4]> = roster
            .living(team)
            .filter(|u| u.id() != target)
            .map(|u| u.id())
            .collect();

        for id in victims {
            let unit = roster.require_mut(id)?;
            let dealt = unit.take_damage(mitigate(amount, unit.defense(), bypass_defense));
            debug!("splash: {id} took {dealt}");
            result.push(CombatEvent::Damage {
                source: actor,
                target: id,
                amount: dealt,
                critical: false,
            });
            if !unit.is_alive() {
                result.push(CombatEvent::Death { unit: id });
            }
        }
        Ok(())
    }

    fn resolve_heal(
        &self,
        roster: &mut Roster,
        actor: UnitId,
        skill: &Skill,
        cost: i32,
        policy: &mut dyn TargetPolicy,
        rng: &mut CombatRng,
    ) -> Result<SkillResult> {
        let Some(target) = Self::select_target(roster, actor, skill, policy, rng)? else {
            return Ok(SkillResult::failed(
                skill.kind(),
                skill.id().clone(),
                actor,
                FailureReason::NoTarget,
            ));
        };

        let mut result = SkillResult::begin(skill.kind(), skill.id().clone(), actor);
        result.target = Some(target);
        Self::commit(roster, actor, skill, cost, &mut result)?;

        let healed = roster.require_mut(target)?.heal(skill.power());
        result.total_effect = healed;
        result.push(CombatEvent::Heal {
            target,
            amount: healed,
        });
        Ok(result)
    }

    fn resolve_defend(
        &self,
        roster: &mut Roster,
        actor: UnitId,
        skill: &Skill,
        cost: i32,
    ) -> Result<SkillResult> {
        let mut result = SkillResult::begin(skill.kind(), skill.id().clone(), actor);
        result.target = Some(actor);
        Self::commit(roster, actor, skill, cost, &mut result)?;

        roster.require_mut(actor)?.set_guard(true);
        result.push(CombatEvent::Guarded { unit: actor });
        Ok(result)
    }

    fn resolve_wait(&self, roster: &mut Roster, actor: UnitId, skill: &Skill) -> Result<SkillResult> {
        let mut result = SkillResult::begin(skill.kind(), skill.id().clone(), actor);
        result.target = Some(actor);
        Self::commit(roster, actor, skill, 0, &mut result)?;

        let recovered = roster.require_mut(actor)?.recover_ap(self.wait_ap_recovery);
        result.total_effect = recovered;
        result.push(CombatEvent::ApRecovered {
            unit: actor,
            amount: recovered,
        });
        Ok(result)
    }
}

/// Run the passive held by `holder` at `trigger`, recording the activation.
fn trigger_passive(
    roster: &Roster,
    holder: UnitId,
    trigger: PassiveTrigger,
    ctx: &HitContext,
    rng: &mut CombatRng,
    result: &mut SkillResult,
) -> Result<Option<PassiveResult>> {
    let unit = roster.require(holder)?;
    let Some(passive) = unit.passive() else {
        return Ok(None);
    };

    let fired = passive.activate(trigger, ctx, unit, rng);
    if fired.is_some() {
        debug!("{holder} passive {} fired", passive.display_name);
        result.push(CombatEvent::PassiveActivated {
            unit: holder,
            passive: passive.display_name.clone(),
        });
    }
    Ok(fired)
}

/// Split `raw` damage over `hits` (clamped to `1..=MAX_HITS`); leading hits
/// take the remainder.
fn split_hits(raw: i32, hits: u32) -> SmallVec<[i32; 4]> {
    let count = i32::try_from(hits.clamp(1, MAX_HITS)).unwrap_or(1);
    let raw = raw.max(0);
    let base = raw / count;
    let remainder = raw % count;
    (0..count)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect()
}

/// Reduce `amount` by `defense`, never below 1 for a landing hit.
fn mitigate(amount: i32, defense: i32, bypass: bool) -> i32 {
    if amount <= 0 {
        0
    } else if bypass {
        amount
    } else {
        (amount - defense.max(0)).max(1)
    }
}
