//! Battle state and snapshots.
//!
//! `BattleState` is the single owner of everything that changes during a
//! battle: the roster, the scheduler, the RNG streams, the turn history and
//! the outcome. The turn history is an `im::Vector`, so cloning the whole
//! state for a what-if run is cheap.
//!
//! A `BattleSnapshot` captures the same data with each RNG stream reduced to
//! its seed and position. Restoring a snapshot continues the battle
//! exactly as the original would have.

use im::Vector;
use serde::{Deserialize, Serialize};

use crate::core::{BattleConfig, BattleRng, BattleRngState, Result, Roster, Team, UnitId};
use crate::effects::SkillResult;
use crate::turns::TurnScheduler;

/// How a battle ended, from the allied side's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleOutcome {
    Victory,
    Defeat,
    Draw,
}

impl BattleOutcome {
    /// Decide the outcome from the roster, or `None` if both teams stand.
    #[must_use]
    pub fn evaluate(roster: &Roster) -> Option<Self> {
        let allies = roster.living_count(Team::Ally);
        let enemies = roster.living_count(Team::Enemy);
        match (allies, enemies) {
            (0, 0) => Some(BattleOutcome::Draw),
            (0, _) => Some(BattleOutcome::Defeat),
            (_, 0) => Some(BattleOutcome::Victory),
            _ => None,
        }
    }

    /// The winning team, if any.
    #[must_use]
    pub fn winner(self) -> Option<Team> {
        match self {
            BattleOutcome::Victory => Some(Team::Ally),
            BattleOutcome::Defeat => Some(Team::Enemy),
            BattleOutcome::Draw => None,
        }
    }
}

impl std::fmt::Display for BattleOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BattleOutcome::Victory => write!(f, "victory"),
            BattleOutcome::Defeat => write!(f, "defeat"),
            BattleOutcome::Draw => write!(f, "draw"),
        }
    }
}

/// One resolved turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    /// Turn number, starting at 1.
    pub turn: u32,
    /// Scheduler tick the turn happened on.
    pub tick: u64,
    pub actor: UnitId,
    pub result: SkillResult,
}

/// Everything that changes during a battle.
#[derive(Clone, Debug)]
pub struct BattleState {
    pub(super) roster: Roster,
    pub(super) scheduler: TurnScheduler,
    pub(super) rng: BattleRng,
    pub(super) outcome: Option<BattleOutcome>,
    pub(super) turn: u32,
    pub(super) history: Vector<TurnRecord>,
}

impl BattleState {
    /// Fresh state for `roster`, stopped and at turn 0.
    pub fn new(roster: Roster, config: &BattleConfig) -> Result<Self> {
        Ok(Self {
            roster,
            scheduler: TurnScheduler::new(config)?,
            rng: BattleRng::new(config.seed),
            outcome: None,
            turn: 0,
            history: Vector::new(),
        })
    }

    #[must_use]
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    #[must_use]
    pub fn scheduler(&self) -> &TurnScheduler {
        &self.scheduler
    }

    #[must_use]
    pub fn outcome(&self) -> Option<BattleOutcome> {
        self.outcome
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// Turns resolved so far.
    #[must_use]
    pub fn turn(&self) -> u32 {
        self.turn
    }

    /// Every resolved turn, oldest first.
    #[must_use]
    pub fn history(&self) -> &Vector<TurnRecord> {
        &self.history
    }

    /// Capture the state for later restoration.
    #[must_use]
    pub fn snapshot(&self) -> BattleSnapshot {
        BattleSnapshot {
            roster: self.roster.clone(),
            scheduler: self.scheduler.clone(),
            rng: self.rng.state(),
            outcome: self.outcome,
            turn: self.turn,
            history: self.history.clone(),
        }
    }

    /// Rebuild a state from a snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: BattleSnapshot) -> Self {
        Self {
            roster: snapshot.roster,
            scheduler: snapshot.scheduler,
            rng: BattleRng::from_state(&snapshot.rng),
            outcome: snapshot.outcome,
            turn: snapshot.turn,
            history: snapshot.history,
        }
    }

    pub(super) fn record(&mut self, actor: UnitId, result: SkillResult) -> TurnRecord {
        self.turn += 1;
        let record = TurnRecord {
            turn: self.turn,
            tick: self.scheduler.ticks(),
            actor,
            result,
        };
        self.history.push_back(record.clone());
        record
    }
}

/// Serializable checkpoint of a `BattleState`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BattleSnapshot {
    pub roster: Roster,
    pub scheduler: TurnScheduler,
    pub rng: BattleRngState,
    pub outcome: Option<BattleOutcome>,
    pub turn: u32,
    pub history: Vector<TurnRecord>,
}

impl BattleSnapshot {
    /// Encode with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode bytes produced by `to_bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}
