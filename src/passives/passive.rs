//! Passive abilities and the hit context they act on.
//!
//! A passive is bound to one trigger point in the attack pipeline:
//!
//! - `OnBeingHit` runs once before damage is applied. It receives the
//!   `HitContext` by value and returns an updated one (dodge, scaled damage).
//! - `OnAfterHit` runs after damage if the holder survived and did not dodge.
//!   It may answer with a `Retaliation` aimed back at the attacker.
//!
//! Passives never touch unit stats. Everything they decide flows back
//! through the pipeline, which applies it.

use serde::{Deserialize, Serialize};

use crate::core::{BattleError, CombatRng, Result, Unit, UnitId};
use crate::skills::SkillId;

/// Where in the attack pipeline a passive fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassiveTrigger {
    OnBeingHit,
    OnAfterHit,
}

/// State of one attack as it moves through the pipeline stages.
///
/// Each stage takes the context by value and returns the next one; nothing
/// is shared or mutated in place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HitContext {
    pub attacker: UnitId,
    pub target: UnitId,
    pub skill: SkillId,
    /// Damage after the crit roll, before passives and mitigation.
    pub damage: i32,
    /// Scale applied to every hit of this attack.
    pub damage_multiplier: f64,
    pub dodged: bool,
    /// HP the target actually lost (filled in by the damage stage).
    pub dealt: i32,
}

impl HitContext {
    /// Context for a fresh attack.
    pub fn new(attacker: UnitId, target: UnitId, skill: SkillId, damage: i32) -> Self {
        Self {
            attacker,
            target,
            skill,
            damage,
            damage_multiplier: 1.0,
            dodged: false,
            dealt: 0,
        }
    }

    /// The same context, flagged as dodged.
    #[must_use]
    pub fn dodge(self) -> Self {
        Self {
            dodged: true,
            ..self
        }
    }

    /// The same context with its multiplier scaled by `factor`.
    #[must_use]
    pub fn scale(self, factor: f64) -> Self {
        Self {
            damage_multiplier: self.damage_multiplier * factor.max(0.0),
            ..self
        }
    }

    /// The same context with the realized damage recorded.
    #[must_use]
    pub fn with_dealt(self, dealt: i32) -> Self {
        Self { dealt, ..self }
    }
}

/// A strike back at the attacker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Retaliation {
    pub amount: i32,
    /// Skip the attacker's defense stat.
    pub ignore_defense: bool,
}

/// What a passive produced when it fired.
#[derive(Clone, Debug, PartialEq)]
pub enum PassiveResult {
    /// Updated context (from `OnBeingHit`).
    Context(HitContext),
    /// Counter damage (from `OnAfterHit`).
    Retaliation(Retaliation),
}

/// The closed set of passive behaviours.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassiveKind {
    /// Dodge the whole attack with probability `chance`.
    Evasion { chance: f64 },
    /// Scale incoming damage.
    Bulwark { multiplier: f64 },
    /// Scale incoming damage while HP is at or below `hp_ratio` of max.
    LastStand { hp_ratio: f64, multiplier: f64 },
    /// Strike back for `attack * ratio`, reduced by the attacker's defense.
    Counter { ratio: f64 },
    /// Reflect `damage taken * ratio`, ignoring defense.
    Thorns { ratio: f64 },
}

impl PassiveKind {
    /// The pipeline point this behaviour is bound to.
    #[must_use]
    pub fn trigger(&self) -> PassiveTrigger {
        match self {
            PassiveKind::Evasion { .. }
            | PassiveKind::Bulwark { .. }
            | PassiveKind::LastStand { .. } => PassiveTrigger::OnBeingHit,
            PassiveKind::Counter { .. } | PassiveKind::Thorns { .. } => PassiveTrigger::OnAfterHit,
        }
    }

    fn validate(&self) -> Result<()> {
        let ok = match *self {
            PassiveKind::Evasion { chance } => (0.0..=1.0).contains(&chance),
            PassiveKind::Bulwark { multiplier } => multiplier >= 0.0,
            PassiveKind::LastStand { hp_ratio, multiplier } => {
                (0.0..=1.0).contains(&hp_ratio) && multiplier >= 0.0
            }
            PassiveKind::Counter { ratio } | PassiveKind::Thorns { ratio } => ratio >= 0.0,
        };
        if ok {
            Ok(())
        } else {
            Err(BattleError::InvalidConfig(format!("passive parameters out of range: {self:?}")))
        }
    }
}

/// A named passive carried in a unit's passive slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PassiveAbility {
    pub display_name: String,
    pub kind: PassiveKind,
}

impl PassiveAbility {
    /// Create a passive, validating its parameters.
    pub fn new(display_name: impl Into<String>, kind: PassiveKind) -> Result<Self> {
        kind.validate()?;
        Ok(Self {
            display_name: display_name.into(),
            kind,
        })
    }

    #[must_use]
    pub fn trigger(&self) -> PassiveTrigger {
        self.kind.trigger()
    }

    /// Run the passive at `trigger`.
    ///
    /// `holder` is the unit carrying the passive (the attack's target).
    /// Returns `None` when the passive is bound to another trigger or did
    /// not fire.
    pub fn activate(
        &self,
        trigger: PassiveTrigger,
        ctx: &HitContext,
        holder: &Unit,
        rng: &mut CombatRng,
    ) -> Option<PassiveResult> {
        if trigger != self.trigger() {
            return None;
        }

        match self.kind {
            PassiveKind::Evasion { chance } => {
                rng.roll(chance).then(|| PassiveResult::Context(ctx.clone().dodge()))
            }
            PassiveKind::Bulwark { multiplier } => {
                Some(PassiveResult::Context(ctx.clone().scale(multiplier)))
            }
            PassiveKind::LastStand { hp_ratio, multiplier } => {
                let threshold = f64::from(holder.max_hp()) * hp_ratio;
                (f64::from(holder.hp()) <= threshold)
                    .then(|| PassiveResult::Context(ctx.clone().scale(multiplier)))
            }
            PassiveKind::Counter { ratio } => {
                let amount = (f64::from(holder.attack()) * ratio).floor() as i32;
                (amount > 0).then_some(PassiveResult::Retaliation(Retaliation {
                    amount,
                    ignore_defense: false,
                }))
            }
            PassiveKind::Thorns { ratio } => {
                let amount = (f64::from(ctx.dealt) * ratio).floor() as i32;
                (amount > 0).then_some(PassiveResult::Retaliation(Retaliation {
                    amount,
                    ignore_defense: true,
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Team, UnitSpec};

    fn holder(hp: i32, attack: i32) -> Unit {
        let spec = UnitSpec::new(2, "Holder", 100, 10).with_hp(hp).with_combat(attack, 0);
        Unit::from_spec(&spec, Team::Enemy, None, Vec::new()).unwrap()
    }

    fn ctx() -> HitContext {
        HitContext::new(UnitId::new(1), UnitId::new(2), SkillId::new("basic_attack"), 20)
    }

    #[test]
    fn test_trigger_binding() {
        assert_eq!(PassiveKind::Evasion { chance: 0.5 }.trigger(), PassiveTrigger::OnBeingHit);
        assert_eq!(PassiveKind::Counter { ratio: 1.0 }.trigger(), PassiveTrigger::OnAfterHit);

        let counter = PassiveAbility::new("Riposte", PassiveKind::Counter { ratio: 1.0 }).unwrap();
        let mut rng = CombatRng::new(1);
        assert!(counter
            .activate(PassiveTrigger::OnBeingHit, &ctx(), &holder(50, 10), &mut rng)
            .is_none());
    }

    #[test]
    fn test_evasion_always_and_never() {
        let mut rng = CombatRng::new(1);
        let always = PassiveAbility::new("Blur", PassiveKind::Evasion { chance: 1.0 }).unwrap();
        let never = PassiveAbility::new("Slow", PassiveKind::Evasion { chance: 0.0 }).unwrap();
        let unit = holder(50, 0);

        match always.activate(PassiveTrigger::OnBeingHit, &ctx(), &unit, &mut rng) {
            Some(PassiveResult::Context(next)) => assert!(next.dodged),
            other => panic!("expected dodge, got {other:?}"),
        }
        assert!(never
            .activate(PassiveTrigger::OnBeingHit, &ctx(), &unit, &mut rng)
            .is_none());
    }

    #[test]
    fn test_last_stand_threshold() {
        let mut rng = CombatRng::new(1);
        let passive = PassiveAbility::new(
            "Last Stand",
            PassiveKind::LastStand { hp_ratio: 0.3, multiplier: 0.5 },
        )
        .unwrap();

        assert!(passive
            .activate(PassiveTrigger::OnBeingHit, &ctx(), &holder(31, 0), &mut rng)
            .is_none());
        match passive.activate(PassiveTrigger::OnBeingHit, &ctx(), &holder(30, 0), &mut rng) {
            Some(PassiveResult::Context(next)) => assert_eq!(next.damage_multiplier, 0.5),
            other => panic!("expected scaled context, got {other:?}"),
        }
    }

    #[test]
    fn test_counter_and_thorns() {
        let mut rng = CombatRng::new(1);
        let counter = PassiveAbility::new("Riposte", PassiveKind::Counter { ratio: 0.5 }).unwrap();
        let thorns = PassiveAbility::new("Thorns", PassiveKind::Thorns { ratio: 0.3 }).unwrap();
        let hit = ctx().with_dealt(10);

        assert_eq!(
            counter.activate(PassiveTrigger::OnAfterHit, &hit, &holder(50, 9), &mut rng),
            Some(PassiveResult::Retaliation(Retaliation { amount: 4, ignore_defense: false }))
        );
        assert_eq!(
            thorns.activate(PassiveTrigger::OnAfterHit, &hit, &holder(50, 0), &mut rng),
            Some(PassiveResult::Retaliation(Retaliation { amount: 3, ignore_defense: true }))
        );
        // Nothing to reflect
        assert!(thorns
            .activate(PassiveTrigger::OnAfterHit, &ctx(), &holder(50, 0), &mut rng)
            .is_none());
    }

    #[test]
    fn test_context_stages_are_values() {
        let original = ctx();
        let scaled = original.clone().scale(0.5).scale(0.5);
        assert_eq!(original.damage_multiplier, 1.0);
        assert_eq!(scaled.damage_multiplier, 0.25);
        assert!(!scaled.dodged);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(PassiveAbility::new("X", PassiveKind::Evasion { chance: 1.2 }).is_err());
        assert!(PassiveAbility::new("X", PassiveKind::Bulwark { multiplier: -1.0 }).is_err());
    }

    #[test]
    fn test_serde_variant_names() {
        let json = r#"{ "display_name": "Iron Skin", "kind": { "bulwark": { "multiplier": 0.7 } } }"#;
        let passive: PassiveAbility = serde_json::from_str(json).unwrap();
        assert_eq!(passive.kind, PassiveKind::Bulwark { multiplier: 0.7 });
    }
}
