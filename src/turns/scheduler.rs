//! Charge-based turn scheduler.
//!
//! Every unit cycles through `Charging -> Ready -> Acting -> Charging`, with
//! `Dead` as the terminal phase. Each tick adds
//! `speed * tick_rate * game_speed` to every living unit's charge; a unit
//! whose charge reaches the threshold joins the ready queue.
//!
//! Time is frozen while any unit is Ready or Acting: the queue drains one
//! turn at a time before charge accumulates again. Entering `Acting` resets
//! the unit's charge to exactly 0.
//!
//! Ready order is deterministic: higher speed first, then lower slot, then
//! allies before enemies, then lower unit id.

use log::debug;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{BattleConfig, BattleError, Result, Roster, Unit, UnitId, VALID_SPEEDS};

/// Where a unit is in its turn cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitPhase {
    Charging,
    Ready,
    Acting,
    Dead,
}

/// Game-speed multiplier. Only 1, 2, 4 and 8 exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct GameSpeed(u32);

impl GameSpeed {
    pub const NORMAL: Self = Self(1);

    /// Validate a multiplier.
    pub fn new(multiplier: u32) -> Result<Self> {
        if VALID_SPEEDS.contains(&multiplier) {
            Ok(Self(multiplier))
        } else {
            Err(BattleError::InvalidSpeed(multiplier))
        }
    }

    #[must_use]
    pub const fn multiplier(self) -> u32 {
        self.0
    }
}

impl Default for GameSpeed {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl TryFrom<u32> for GameSpeed {
    type Error = BattleError;

    fn try_from(value: u32) -> Result<Self> {
        Self::new(value)
    }
}

impl From<GameSpeed> for u32 {
    fn from(speed: GameSpeed) -> u32 {
        speed.0
    }
}

impl std::fmt::Display for GameSpeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "x{}", self.0)
    }
}

/// What one call to `tick` did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not running, or paused. Nothing changed.
    Halted,
    /// A unit is Ready or Acting, so time did not advance.
    Blocked,
    /// Charge accumulated; lists units that became Ready on this tick.
    Advanced { newly_ready: SmallVec<[UnitId; 4]> },
}

/// Why a manual step was refused. Refusals never change state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepRejection {
    /// Manual steps are only accepted with auto mode off.
    AutoModeActive,
    /// The battle has not been started.
    NotRunning,
    /// Another unit's turn has not completed.
    TurnInProgress,
    /// No unit is Ready yet.
    NoUnitReady,
    /// The battle is over.
    BattleEnded,
}

impl std::fmt::Display for StepRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            StepRejection::AutoModeActive => "manual step while auto mode is on",
            StepRejection::NotRunning => "battle is not running",
            StepRejection::TurnInProgress => "a turn is already in progress",
            StepRejection::NoUnitReady => "no unit is ready",
            StepRejection::BattleEnded => "battle has ended",
        };
        f.write_str(text)
    }
}

/// Time accumulation and turn order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurnScheduler {
    tick_rate: f64,
    threshold: f64,
    speed: GameSpeed,
    running: bool,
    paused: bool,
    auto_mode: bool,
    ready: Vec<UnitId>,
    acting: Option<UnitId>,
    ticks: u64,
}

impl TurnScheduler {
    /// Create a stopped scheduler from `config`.
    pub fn new(config: &BattleConfig) -> Result<Self> {
        Ok(Self {
            tick_rate: config.tick_rate,
            threshold: config.charge_threshold,
            speed: GameSpeed::new(config.game_speed)?,
            running: false,
            paused: false,
            auto_mode: config.auto_mode,
            ready: Vec::new(),
            acting: None,
            ticks: 0,
        })
    }

    // === Controls ===

    /// Begin accumulating time.
    pub fn start(&mut self) {
        self.running = true;
        self.paused = false;
        debug!("scheduler started at {}", self.speed);
    }

    /// Stop for good (battle over). Ready and acting state is cleared.
    pub fn stop(&mut self) {
        self.running = false;
        self.ready.clear();
        self.acting = None;
        debug!("scheduler stopped after {} ticks", self.ticks);
    }

    pub fn pause(&mut self) {
        self.paused = true;
        debug!("scheduler paused");
    }

    pub fn resume(&mut self) {
        self.paused = false;
        debug!("scheduler resumed");
    }

    /// Change the game-speed multiplier. Invalid values leave it unchanged.
    pub fn set_speed(&mut self, multiplier: u32) -> Result<()> {
        self.speed = GameSpeed::new(multiplier)?;
        debug!("game speed set to {}", self.speed);
        Ok(())
    }

    /// Flip auto mode, returning the new value.
    pub fn toggle_auto_mode(&mut self) -> bool {
        self.auto_mode = !self.auto_mode;
        debug!("auto mode {}", if self.auto_mode { "on" } else { "off" });
        self.auto_mode
    }

    // === Queries ===

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[must_use]
    pub fn auto_mode(&self) -> bool {
        self.auto_mode
    }

    #[must_use]
    pub fn speed(&self) -> GameSpeed {
        self.speed
    }

    /// Ticks that advanced time.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// The unit whose turn is in progress.
    #[must_use]
    pub fn acting(&self) -> Option<UnitId> {
        self.acting
    }

    /// Ready units in the order they will act.
    #[must_use]
    pub fn ready_queue(&self) -> &[UnitId] {
        &self.ready
    }

    /// Current phase of `unit`.
    #[must_use]
    pub fn phase(&self, unit: &Unit) -> UnitPhase {
        if !unit.is_alive() {
            UnitPhase::Dead
        } else if self.acting == Some(unit.id()) {
            UnitPhase::Acting
        } else if self.ready.contains(&unit.id()) {
            UnitPhase::Ready
        } else {
            UnitPhase::Charging
        }
    }

    /// Charge as a fraction of the threshold, clamped to `0.0..=1.0`.
    #[must_use]
    pub fn progress(&self, unit: &Unit) -> f64 {
        (unit.charge() / self.threshold).clamp(0.0, 1.0)
    }

    // === Time ===

    /// Advance one tick.
    pub fn tick(&mut self, roster: &mut Roster) -> TickOutcome {
        if !self.running || self.paused {
            return TickOutcome::Halted;
        }

        self.ready.retain(|id| roster.get(*id).is_some_and(Unit::is_alive));
        if self.acting.is_some() || !self.ready.is_empty() {
            return TickOutcome::Blocked;
        }

        let step = self.tick_rate * f64::from(self.speed.multiplier());
        for unit in roster.iter_mut() {
            unit.add_charge(f64::from(unit.speed()) * step);
        }
        self.ticks += 1;

        let mut newly_ready: SmallVec<[&Unit; 4]> = roster
            .iter()
            .filter(|u| u.is_alive() && u.charge() >= self.threshold)
            .collect();
        newly_ready.sort_by_key(|u| ready_order(u));

        let newly_ready: SmallVec<[UnitId; 4]> = newly_ready.iter().map(|u| u.id()).collect();
        for id in &newly_ready {
            debug!("{id} is ready (tick {})", self.ticks);
        }
        self.ready.extend(newly_ready.iter().copied());

        TickOutcome::Advanced { newly_ready }
    }

    // === Turns ===

    /// Move the first living Ready unit into `Acting`.
    ///
    /// Resets its charge to 0 and drops any guard it still holds. Returns
    /// `None` if a turn is already in progress or nobody is Ready.
    pub fn begin_turn(&mut self, roster: &mut Roster) -> Option<UnitId> {
        if self.acting.is_some() {
            return None;
        }

        while !self.ready.is_empty() {
            let id = self.ready.remove(0);
            let Some(unit) = roster.get_mut(id) else {
                continue;
            };
            if !unit.is_alive() {
                continue;
            }

            unit.reset_charge();
            unit.set_guard(false);
            self.acting = Some(id);
            debug!("{id} is acting");
            return Some(id);
        }
        None
    }

    /// Process exactly one Ready unit's turn on manual request.
    pub fn step_once(&mut self, roster: &mut Roster) -> std::result::Result<UnitId, StepRejection> {
        if self.auto_mode {
            return Err(StepRejection::AutoModeActive);
        }
        if !self.running {
            return Err(StepRejection::NotRunning);
        }
        if self.acting.is_some() {
            return Err(StepRejection::TurnInProgress);
        }
        self.begin_turn(roster).ok_or(StepRejection::NoUnitReady)
    }

    /// Mark the acting unit's turn as done. Time may advance again once the
    /// ready queue is empty.
    pub fn complete_turn(&mut self, unit: UnitId) {
        if self.acting == Some(unit) {
            self.acting = None;
        }
    }
}

/// Sort key for the ready queue.
fn ready_order(unit: &Unit) -> (std::cmp::Reverse<i32>, u8, crate::core::Team, UnitId) {
    (
        std::cmp::Reverse(unit.speed()),
        unit.slot(),
        unit.team(),
        unit.id(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Team, UnitSpec};

    fn unit(id: u32, team: Team, slot: u8, speed: i32) -> Unit {
        let spec = UnitSpec::new(id, format!("U{id}"), 30, speed).with_slot(slot);
        Unit::from_spec(&spec, team, None, Vec::new()).unwrap()
    }

    fn scheduler(config: BattleConfig) -> TurnScheduler {
        let mut scheduler = TurnScheduler::new(&config).unwrap();
        scheduler.start();
        scheduler
    }

    fn charge(roster: &Roster, id: u32) -> f64 {
        roster.get(UnitId::new(id)).unwrap().charge()
    }

    #[test]
    fn test_game_speed_values() {
        for n in VALID_SPEEDS {
            assert_eq!(GameSpeed::new(n).unwrap().multiplier(), n);
        }
        assert!(matches!(GameSpeed::new(3), Err(BattleError::InvalidSpeed(3))));
        assert_eq!(GameSpeed::default(), GameSpeed::NORMAL);
        assert_eq!(GameSpeed::NORMAL.to_string(), "x1");
    }

    #[test]
    fn test_charge_per_tick() {
        let mut roster =
            Roster::new(vec![unit(1, Team::Ally, 0, 10)], vec![unit(2, Team::Enemy, 0, 25)]).unwrap();
        let mut s = scheduler(BattleConfig::default().with_tick_rate(1.0));

        s.tick(&mut roster);
        assert_eq!(charge(&roster, 1), 10.0);
        assert_eq!(charge(&roster, 2), 25.0);

        s.set_speed(4).unwrap();
        s.tick(&mut roster);
        assert_eq!(charge(&roster, 1), 50.0);
        assert_eq!(charge(&roster, 2), 125.0);
        assert_eq!(s.ready_queue(), &[UnitId::new(2)]);
    }

    #[test]
    fn test_halted_when_stopped_or_paused() {
        let mut roster =
            Roster::new(vec![unit(1, Team::Ally, 0, 10)], vec![unit(2, Team::Enemy, 0, 10)]).unwrap();
        let mut s = TurnScheduler::new(&BattleConfig::default()).unwrap();

        assert_eq!(s.tick(&mut roster), TickOutcome::Halted);
        s.start();
        s.pause();
        assert_eq!(s.tick(&mut roster), TickOutcome::Halted);
        assert_eq!(charge(&roster, 1), 0.0);

        s.resume();
        assert!(matches!(s.tick(&mut roster), TickOutcome::Advanced { .. }));
        assert_eq!(s.ticks(), 1);
    }

    #[test]
    fn test_ready_order_tie_breaks() {
        let mut roster = Roster::new(
            vec![unit(1, Team::Ally, 2, 50), unit(2, Team::Ally, 1, 50), unit(3, Team::Ally, 0, 40)],
            vec![unit(4, Team::Enemy, 1, 50), unit(5, Team::Enemy, 0, 60)],
        )
        .unwrap();
        let mut s = scheduler(BattleConfig::default().with_tick_rate(10.0));

        match s.tick(&mut roster) {
            TickOutcome::Advanced { newly_ready } => {
                let order: Vec<_> = newly_ready.iter().map(|id| id.raw()).collect();
                assert_eq!(order, vec![5, 2, 4, 1, 3]);
            }
            other => panic!("expected advance, got {other:?}"),
        }
    }

    #[test]
    fn test_time_frozen_while_ready() {
        let mut roster =
            Roster::new(vec![unit(1, Team::Ally, 0, 100)], vec![unit(2, Team::Enemy, 0, 10)]).unwrap();
        let mut s = scheduler(BattleConfig::default().with_tick_rate(1.0));

        s.tick(&mut roster);
        assert_eq!(s.ready_queue(), &[UnitId::new(1)]);
        assert_eq!(s.tick(&mut roster), TickOutcome::Blocked);
        assert_eq!(charge(&roster, 2), 10.0);

        let actor = s.begin_turn(&mut roster).unwrap();
        assert_eq!(actor, UnitId::new(1));
        assert_eq!(charge(&roster, 1), 0.0);
        assert_eq!(s.phase(roster.get(actor).unwrap()), UnitPhase::Acting);
        assert_eq!(s.tick(&mut roster), TickOutcome::Blocked);

        s.complete_turn(actor);
        assert!(matches!(s.tick(&mut roster), TickOutcome::Advanced { .. }));
        assert_eq!(charge(&roster, 2), 20.0);
    }

    #[test]
    fn test_overflow_discarded() {
        let mut roster =
            Roster::new(vec![unit(1, Team::Ally, 0, 130)], vec![unit(2, Team::Enemy, 0, 10)]).unwrap();
        let mut s = scheduler(BattleConfig::default().with_tick_rate(1.0));

        s.tick(&mut roster);
        assert_eq!(charge(&roster, 1), 130.0);
        s.begin_turn(&mut roster);
        assert_eq!(charge(&roster, 1), 0.0);
    }

    #[test]
    fn test_dead_units_skipped() {
        let mut roster = Roster::new(
            vec![unit(1, Team::Ally, 0, 100)],
            vec![unit(2, Team::Enemy, 0, 100)],
        )
        .unwrap();
        let mut s = scheduler(BattleConfig::default().with_tick_rate(1.0));
        s.tick(&mut roster);
        assert_eq!(s.ready_queue().len(), 2);

        roster.get_mut(UnitId::new(1)).unwrap().take_damage(100);
        assert_eq!(s.phase(roster.get(UnitId::new(1)).unwrap()), UnitPhase::Dead);
        assert_eq!(s.begin_turn(&mut roster), Some(UnitId::new(2)));
    }

    #[test]
    fn test_begin_turn_clears_guard() {
        let mut roster =
            Roster::new(vec![unit(1, Team::Ally, 0, 100)], vec![unit(2, Team::Enemy, 0, 1)]).unwrap();
        roster.get_mut(UnitId::new(1)).unwrap().set_guard(true);
        let mut s = scheduler(BattleConfig::default().with_tick_rate(1.0));

        s.tick(&mut roster);
        s.begin_turn(&mut roster);
        assert!(!roster.get(UnitId::new(1)).unwrap().is_guarding());
    }

    #[test]
    fn test_step_once_rejections() {
        let mut roster =
            Roster::new(vec![unit(1, Team::Ally, 0, 100)], vec![unit(2, Team::Enemy, 0, 10)]).unwrap();
        let mut s = TurnScheduler::new(&BattleConfig::default().with_tick_rate(1.0)).unwrap();

        assert_eq!(s.step_once(&mut roster), Err(StepRejection::AutoModeActive));
        assert!(!s.toggle_auto_mode());
        assert_eq!(s.step_once(&mut roster), Err(StepRejection::NotRunning));

        s.start();
        assert_eq!(s.step_once(&mut roster), Err(StepRejection::NoUnitReady));

        s.tick(&mut roster);
        assert_eq!(s.step_once(&mut roster), Ok(UnitId::new(1)));
        assert_eq!(s.step_once(&mut roster), Err(StepRejection::TurnInProgress));
    }

    #[test]
    fn test_invalid_speed_keeps_current() {
        let mut s = scheduler(BattleConfig::default().with_game_speed(2));
        assert!(s.set_speed(5).is_err());
        assert_eq!(s.speed().multiplier(), 2);
    }

    #[test]
    fn test_progress_clamped() {
        let mut roster =
            Roster::new(vec![unit(1, Team::Ally, 0, 150)], vec![unit(2, Team::Enemy, 0, 50)]).unwrap();
        let mut s = scheduler(BattleConfig::default().with_tick_rate(1.0));
        s.tick(&mut roster);

        assert_eq!(s.progress(roster.get(UnitId::new(1)).unwrap()), 1.0);
        assert_eq!(s.progress(roster.get(UnitId::new(2)).unwrap()), 0.5);
    }
}
