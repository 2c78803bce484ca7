//! Target selection.
//!
//! The engine only guarantees the targeting contract:
//!
//! - `Enemy`: a living unit on the opposing team
//! - `Ally`: a living teammate other than the actor
//! - `Self_`: the actor itself (while alive)
//!
//! Which candidate is picked is a pluggable `TargetPolicy`. `None` means
//! "no valid target" and is handled by the pipeline as a normal outcome.
//! Policies that need randomness draw from the battle's targeting stream,
//! which snapshots capture.

use crate::core::{CombatRng, Roster, Unit, UnitId};
use crate::skills::TargetKind;

/// Check whether `candidate` satisfies `kind` for `actor`.
#[must_use]
pub fn is_valid_target(actor: &Unit, candidate: &Unit, kind: TargetKind) -> bool {
    if !candidate.is_alive() {
        return false;
    }
    match kind {
        TargetKind::Enemy => candidate.team() != actor.team(),
        TargetKind::Ally => candidate.team() == actor.team() && candidate.id() != actor.id(),
        TargetKind::Self_ => candidate.id() == actor.id(),
    }
}

/// All units in `roster` that satisfy `kind` for `actor`, in roster order.
pub fn valid_targets<'a>(actor: &'a Unit, roster: &'a Roster, kind: TargetKind) -> Vec<&'a Unit> {
    roster
        .iter()
        .filter(|candidate| is_valid_target(actor, candidate, kind))
        .collect()
}

/// Chooses one target from the valid candidates.
pub trait TargetPolicy {
    /// Pick a target for `actor`, or `None` if no valid target exists.
    fn select(
        &mut self,
        actor: &Unit,
        roster: &Roster,
        kind: TargetKind,
        rng: &mut CombatRng,
    ) -> Option<UnitId>;
}

impl<T: TargetPolicy + ?Sized> TargetPolicy for Box<T> {
    fn select(
        &mut self,
        actor: &Unit,
        roster: &Roster,
        kind: TargetKind,
        rng: &mut CombatRng,
    ) -> Option<UnitId> {
        (**self).select(actor, roster, kind, rng)
    }
}

/// Default policy: the candidate with the lowest current HP.
///
/// Ties go to the lowest slot, then the lowest unit id, so simulated battles
/// are reproducible.
#[derive(Clone, Copy, Debug, Default)]
pub struct LowestHpPolicy;

impl TargetPolicy for LowestHpPolicy {
    fn select(&mut self, actor: &Unit, roster: &Roster, kind: TargetKind, _rng: &mut CombatRng) -> Option<UnitId> {
        valid_targets(actor, roster, kind)
            .into_iter()
            .min_by_key(|u| (u.hp(), u.slot(), u.id()))
            .map(Unit::id)
    }
}

/// The candidate in the frontmost (lowest) slot.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrontSlotPolicy;

impl TargetPolicy for FrontSlotPolicy {
    fn select(&mut self, actor: &Unit, roster: &Roster, kind: TargetKind, _rng: &mut CombatRng) -> Option<UnitId> {
        valid_targets(actor, roster, kind)
            .into_iter()
            .min_by_key(|u| (u.slot(), u.id()))
            .map(Unit::id)
    }
}

/// A uniformly random candidate, drawn from the targeting stream.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomPolicy;

impl TargetPolicy for RandomPolicy {
    fn select(&mut self, actor: &Unit, roster: &Roster, kind: TargetKind, rng: &mut CombatRng) -> Option<UnitId> {
        let candidates = valid_targets(actor, roster, kind);
        rng.choose(&candidates).map(|u| u.id())
    }
}

/// A host-chosen target (manual input), falling back to another policy when
/// the chosen unit is not a valid target.
#[derive(Clone, Debug)]
pub struct PreferredTargetPolicy<P> {
    preferred: Option<UnitId>,
    fallback: P,
}

impl<P: TargetPolicy> PreferredTargetPolicy<P> {
    pub fn new(fallback: P) -> Self {
        Self {
            preferred: None,
            fallback,
        }
    }

    /// Aim the next selections at `target`.
    pub fn prefer(&mut self, target: Option<UnitId>) {
        self.preferred = target;
    }
}

impl<P: TargetPolicy> TargetPolicy for PreferredTargetPolicy<P> {
    fn select(&mut self, actor: &Unit, roster: &Roster, kind: TargetKind, rng: &mut CombatRng) -> Option<UnitId> {
        let chosen = self
            .preferred
            .and_then(|id| roster.get(id))
            .filter(|candidate| is_valid_target(actor, candidate, kind))
            .map(Unit::id);

        chosen.or_else(|| self.fallback.select(actor, roster, kind, rng))
    }
}
