//! Skill choice.
//!
//! When a unit's turn begins, a `SkillChooser` decides which skill from its
//! loadout it uses and, optionally, which unit it aims at. Aiming is only a
//! preference: the resolution pipeline still enforces the targeting contract
//! and falls back to its target policy.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::core::{Roster, Unit, UnitId};
use crate::effects::valid_targets;
use crate::skills::{Skill, SkillId, SkillKind, SkillLibrary, WAIT_SKILL};

/// A skill to use, with an optional preferred target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillChoice {
    pub skill: SkillId,
    #[serde(default)]
    pub target: Option<UnitId>,
}

impl SkillChoice {
    pub fn new(skill: impl Into<String>) -> Self {
        Self {
            skill: SkillId::new(skill),
            target: None,
        }
    }

    /// Aim at `target`.
    #[must_use]
    pub fn at(mut self, target: UnitId) -> Self {
        self.target = Some(target);
        self
    }

    /// The fallback `wait`.
    #[must_use]
    pub fn wait() -> Self {
        Self::new(WAIT_SKILL)
    }
}

/// Picks a skill for the unit whose turn it is.
pub trait SkillChooser {
    fn choose(&mut self, actor: &Unit, roster: &Roster, library: &SkillLibrary) -> SkillChoice;
}

/// Uses the best-priority skill that can do something useful right now.
///
/// A skill is a candidate when the actor can afford it and:
/// - attack: a valid target exists
/// - heal: a valid target is missing HP (aimed at the most wounded)
/// - defend: the actor is not already guarding
///
/// Lower priority values win; ties go to loadout order. With no candidate
/// the unit waits.
#[derive(Clone, Copy, Debug, Default)]
pub struct PriorityChooser;

impl PriorityChooser {
    fn candidate(actor: &Unit, roster: &Roster, skill: &Skill) -> Option<SkillChoice> {
        if skill.kind() != SkillKind::Wait && actor.ap() < skill.ap_cost() {
            return None;
        }

        let choice = SkillChoice {
            skill: skill.id().clone(),
            target: None,
        };
        match skill.kind() {
            SkillKind::Attack => {
                (!valid_targets(actor, roster, skill.target()).is_empty()).then_some(choice)
            }
            SkillKind::Heal => valid_targets(actor, roster, skill.target())
                .into_iter()
                .filter(|u| u.missing_hp() > 0)
                .max_by_key(|u| (u.missing_hp(), std::cmp::Reverse(u.id())))
                .map(|u| choice.at(u.id())),
            SkillKind::Defend => (!actor.is_guarding()).then_some(choice),
            SkillKind::Wait => Some(choice),
        }
    }
}

impl SkillChooser for PriorityChooser {
    fn choose(&mut self, actor: &Unit, roster: &Roster, library: &SkillLibrary) -> SkillChoice {
        actor
            .skills()
            .iter()
            .filter_map(|id| library.get(id))
            .enumerate()
            .filter_map(|(order, skill)| {
                Self::candidate(actor, roster, skill).map(|choice| ((skill.priority(), order), choice))
            })
            .min_by_key(|(rank, _)| *rank)
            .map_or_else(SkillChoice::wait, |(_, choice)| choice)
    }
}

/// Plays queued choices in order, then defers to `PriorityChooser`.
///
/// Used for manual control: the host queues what the player picked before
/// calling `manual_next_turn`.
#[derive(Clone, Debug, Default)]
pub struct ScriptedChooser {
    queue: VecDeque<SkillChoice>,
    fallback: PriorityChooser,
}

impl ScriptedChooser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a choice for the next turn that has none.
    pub fn push(&mut self, choice: SkillChoice) {
        self.queue.push_back(choice);
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl SkillChooser for ScriptedChooser {
    fn choose(&mut self, actor: &Unit, roster: &Roster, library: &SkillLibrary) -> SkillChoice {
        match self.queue.pop_front() {
            Some(choice) => choice,
            None => self.fallback.choose(actor, roster, library),
        }
    }
}

impl<T: SkillChooser + ?Sized> SkillChooser for Box<T> {
    fn choose(&mut self, actor: &Unit, roster: &Roster, library: &SkillLibrary) -> SkillChoice {
        (**self).choose(actor, roster, library)
    }
}

/// Lets a host keep a handle on a `ScriptedChooser` it gave to the
/// controller.
impl SkillChooser for std::rc::Rc<std::cell::RefCell<ScriptedChooser>> {
    fn choose(&mut self, actor: &Unit, roster: &Roster, library: &SkillLibrary) -> SkillChoice {
        self.borrow_mut().choose(actor, roster, library)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Team, UnitSpec};
    use crate::skills::KeywordTable;

    fn library() -> SkillLibrary {
        SkillLibrary::with_defaults(&KeywordTable::with_defaults()).unwrap()
    }

    fn unit(spec: UnitSpec, team: Team, skills: &[&str]) -> Unit {
        let skills = skills.iter().map(|s| SkillId::new(*s)).collect();
        Unit::from_spec(&spec, team, None, skills).unwrap()
    }

    #[test]
    fn test_priority_prefers_best_affordable() {
        let library = library();
        let roster = Roster::new(
            vec![unit(
                UnitSpec::new(1, "Knight", 30, 10),
                Team::Ally,
                &["basic_attack", "flame_strike", "wait"],
            )],
            vec![unit(UnitSpec::new(2, "Slime", 30, 10), Team::Enemy, &["wait"])],
        )
        .unwrap();
        let actor = roster.get(UnitId::new(1)).unwrap();

        let choice = PriorityChooser.choose(actor, &roster, &library);
        assert_eq!(choice.skill.as_str(), "flame_strike");
    }

    #[test]
    fn test_priority_falls_back_when_poor() {
        let library = library();
        let roster = Roster::new(
            vec![unit(
                UnitSpec::new(1, "Knight", 30, 10).with_ap(4),
                Team::Ally,
                &["flame_strike", "basic_attack"],
            )],
            vec![unit(UnitSpec::new(2, "Slime", 30, 10), Team::Enemy, &[])],
        )
        .unwrap();
        let actor = roster.get(UnitId::new(1)).unwrap();
        assert_eq!(PriorityChooser.choose(actor, &roster, &library).skill.as_str(), "basic_attack");

        let broke = Roster::new(
            vec![unit(
                UnitSpec::new(1, "Knight", 30, 10).with_ap(0),
                Team::Ally,
                &["flame_strike", "basic_attack"],
            )],
            vec![unit(UnitSpec::new(2, "Slime", 30, 10), Team::Enemy, &[])],
        )
        .unwrap();
        let actor = broke.get(UnitId::new(1)).unwrap();
        assert_eq!(PriorityChooser.choose(actor, &broke, &library), SkillChoice::wait());
    }

    #[test]
    fn test_heal_only_when_wounded() {
        let library = library();
        let healer = |hp_b: i32, hp_c: i32| {
            Roster::new(
                vec![
                    unit(UnitSpec::new(1, "Cleric", 30, 10), Team::Ally, &["mend", "basic_attack"]),
                    unit(UnitSpec::new(2, "B", 30, 10).with_hp(hp_b), Team::Ally, &[]),
                    unit(UnitSpec::new(3, "C", 30, 10).with_hp(hp_c), Team::Ally, &[]),
                ],
                vec![unit(UnitSpec::new(4, "Slime", 30, 10), Team::Enemy, &[])],
            )
            .unwrap()
        };

        let healthy = healer(30, 30);
        let actor = healthy.get(UnitId::new(1)).unwrap();
        assert_eq!(PriorityChooser.choose(actor, &healthy, &library).skill.as_str(), "basic_attack");

        let hurt = healer(25, 12);
        let actor = hurt.get(UnitId::new(1)).unwrap();
        let choice = PriorityChooser.choose(actor, &hurt, &library);
        assert_eq!(choice.skill.as_str(), "mend");
        assert_eq!(choice.target, Some(UnitId::new(3)));
    }

    #[test]
    fn test_scripted_then_fallback() {
        let library = library();
        let roster = Roster::new(
            vec![unit(UnitSpec::new(1, "Knight", 30, 10), Team::Ally, &["basic_attack", "guard"])],
            vec![unit(UnitSpec::new(2, "Slime", 30, 10), Team::Enemy, &[])],
        )
        .unwrap();
        let actor = roster.get(UnitId::new(1)).unwrap();

        let mut chooser = ScriptedChooser::new();
        chooser.push(SkillChoice::new("guard"));
        assert_eq!(chooser.pending(), 1);

        assert_eq!(chooser.choose(actor, &roster, &library).skill.as_str(), "guard");
        assert_eq!(chooser.choose(actor, &roster, &library).skill.as_str(), "basic_attack");
    }
}
