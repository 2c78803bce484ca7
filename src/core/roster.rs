//! The battle roster: every unit on both teams.
//!
//! Units are stored allies-first in a single `Vec`. Dead units stay in place
//! so ids and slots keep resolving after a death.

use serde::{Deserialize, Serialize};

use super::error::{BattleError, Result};
use super::unit::{Team, Unit, UnitId};

/// All units in a battle, living and dead.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    units: Vec<Unit>,
}

impl Roster {
    /// Build a roster from both teams.
    ///
    /// Fails if either side is empty or a unit id appears twice.
    pub fn new(allies: Vec<Unit>, enemies: Vec<Unit>) -> Result<Self> {
        if allies.is_empty() {
            return Err(BattleError::EmptyRoster(Team::Ally));
        }
        if enemies.is_empty() {
            return Err(BattleError::EmptyRoster(Team::Enemy));
        }

        let mut units = allies;
        units.extend(enemies);

        let mut seen = rustc_hash::FxHashSet::default();
        for unit in &units {
            if !seen.insert(unit.id()) {
                return Err(BattleError::DuplicateUnit(unit.id()));
            }
        }

        Ok(Self { units })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|u| u.id() == id)
    }

    pub(crate) fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.iter_mut().find(|u| u.id() == id)
    }

    /// Look up a unit, failing with `UnknownUnit`.
    pub fn require(&self, id: UnitId) -> Result<&Unit> {
        self.get(id).ok_or(BattleError::UnknownUnit(id))
    }

    pub(crate) fn require_mut(&mut self, id: UnitId) -> Result<&mut Unit> {
        self.get_mut(id).ok_or(BattleError::UnknownUnit(id))
    }

    /// Iterate over every unit, allies first.
    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Unit> {
        self.units.iter_mut()
    }

    /// Units on one team, living and dead.
    pub fn team(&self, team: Team) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(move |u| u.team() == team)
    }

    /// Allied units.
    pub fn allies(&self) -> impl Iterator<Item = &Unit> {
        self.team(Team::Ally)
    }

    /// Enemy units.
    pub fn enemies(&self) -> impl Iterator<Item = &Unit> {
        self.team(Team::Enemy)
    }

    /// Living units on one team.
    pub fn living(&self, team: Team) -> impl Iterator<Item = &Unit> {
        self.team(team).filter(|u| u.is_alive())
    }

    /// Number of living units on one team.
    #[must_use]
    pub fn living_count(&self, team: Team) -> usize {
        self.living(team).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::UnitSpec;

    fn unit(id: u32, team: Team, hp: i32) -> Unit {
        let spec = UnitSpec::new(id, format!("U{id}"), 20, 10).with_hp(hp);
        Unit::from_spec(&spec, team, None, Vec::new()).unwrap()
    }

    #[test]
    fn test_empty_rosters_rejected() {
        let err = Roster::new(Vec::new(), vec![unit(1, Team::Enemy, 5)]).unwrap_err();
        assert!(matches!(err, BattleError::EmptyRoster(Team::Ally)));

        let err = Roster::new(vec![unit(1, Team::Ally, 5)], Vec::new()).unwrap_err();
        assert!(matches!(err, BattleError::EmptyRoster(Team::Enemy)));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = Roster::new(vec![unit(1, Team::Ally, 5)], vec![unit(1, Team::Enemy, 5)])
            .unwrap_err();
        assert!(matches!(err, BattleError::DuplicateUnit(id) if id == UnitId::new(1)));
    }

    #[test]
    fn test_living_queries() {
        let roster = Roster::new(
            vec![unit(1, Team::Ally, 5), unit(2, Team::Ally, 0)],
            vec![unit(3, Team::Enemy, 7)],
        )
        .unwrap();

        assert_eq!(roster.len(), 3);
        assert_eq!(roster.allies().count(), 2);
        assert_eq!(roster.living_count(Team::Ally), 1);
        assert_eq!(roster.living_count(Team::Enemy), 1);
        assert!(roster.get(UnitId::new(2)).is_some());
        assert!(roster.require(UnitId::new(9)).is_err());
    }
}
