//! Battle narration.
//!
//! The controller narrates every turn as `(message, category)` pairs to a
//! `BattleLog` sink. Sinks are purely observational.

use serde::{Deserialize, Serialize};

use crate::core::{Roster, UnitId};
use crate::effects::CombatEvent;

/// What a log line is about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogCategory {
    System,
    Action,
    Damage,
    Heal,
    Passive,
    Death,
    Outcome,
}

impl std::fmt::Display for LogCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LogCategory::System => "system",
            LogCategory::Action => "action",
            LogCategory::Damage => "damage",
            LogCategory::Heal => "heal",
            LogCategory::Passive => "passive",
            LogCategory::Death => "death",
            LogCategory::Outcome => "outcome",
        };
        f.write_str(name)
    }
}

/// Receives narration lines.
pub trait BattleLog {
    fn log(&mut self, message: &str, category: LogCategory);
}

/// Forwards narration to the `log` facade under the `battle` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogFacadeSink;

impl BattleLog for LogFacadeSink {
    fn log(&mut self, message: &str, category: LogCategory) {
        log::info!(target: "battle", "[{category}] {message}");
    }
}

/// One narration line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub category: LogCategory,
    pub message: String,
}

/// Keeps narration in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryLog {
    entries: Vec<LogEntry>,
}

impl MemoryLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Entries of one category, oldest first.
    pub fn of_category(&self, category: LogCategory) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().filter(move |e| e.category == category)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl BattleLog for MemoryLog {
    fn log(&mut self, message: &str, category: LogCategory) {
        self.entries.push(LogEntry {
            category,
            message: message.to_string(),
        });
    }
}

/// A shared `MemoryLog` a host can keep reading while the controller owns
/// the sink.
impl BattleLog for std::rc::Rc<std::cell::RefCell<MemoryLog>> {
    fn log(&mut self, message: &str, category: LogCategory) {
        self.borrow_mut().log(message, category);
    }
}

/// Narration for one committed event.
pub(crate) fn describe(roster: &Roster, event: &CombatEvent) -> (String, LogCategory) {
    let name = |id: UnitId| {
        roster
            .get(id)
            .map_or_else(|| id.to_string(), |u| u.name().to_string())
    };

    match event {
        CombatEvent::ActionAnnounced {
            actor,
            skill,
            ap_cost,
        } => (
            format!("{} uses {skill} ({ap_cost} AP)", name(*actor)),
            LogCategory::Action,
        ),
        CombatEvent::Damage {
            target,
            amount,
            critical,
            ..
        } => {
            let crit = if *critical { " (critical)" } else { "" };
            (
                format!("{} takes {amount} damage{crit}", name(*target)),
                LogCategory::Damage,
            )
        }
        CombatEvent::Miss { attacker, target } => (
            format!("{} dodges {}'s attack", name(*target), name(*attacker)),
            LogCategory::Damage,
        ),
        CombatEvent::Heal { target, amount } => (
            format!("{} recovers {amount} HP", name(*target)),
            LogCategory::Heal,
        ),
        CombatEvent::ApRecovered { unit, amount } => (
            format!("{} waits and recovers {amount} AP", name(*unit)),
            LogCategory::Action,
        ),
        CombatEvent::Guarded { unit } => {
            (format!("{} raises a guard", name(*unit)), LogCategory::Action)
        }
        CombatEvent::PassiveActivated { unit, passive } => (
            format!("{}'s {passive} activates", name(*unit)),
            LogCategory::Passive,
        ),
        CombatEvent::Death { unit } => (format!("{} falls", name(*unit)), LogCategory::Death),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Team, Unit, UnitSpec};
    use crate::skills::SkillId;

    fn roster() -> Roster {
        let ally = Unit::from_spec(&UnitSpec::new(1, "Knight", 20, 10), Team::Ally, None, Vec::new())
            .unwrap();
        let enemy = Unit::from_spec(&UnitSpec::new(2, "Slime", 20, 10), Team::Enemy, None, Vec::new())
            .unwrap();
        Roster::new(vec![ally], vec![enemy]).unwrap()
    }

    #[test]
    fn test_memory_log_filters() {
        let mut log = MemoryLog::new();
        log.log("Battle start", LogCategory::System);
        log.log("Slime takes 3 damage", LogCategory::Damage);
        log.log("Slime takes 4 damage", LogCategory::Damage);

        assert_eq!(log.entries().len(), 3);
        assert_eq!(log.of_category(LogCategory::Damage).count(), 2);
        log.clear();
        assert!(log.entries().is_empty());
    }

    #[test]
    fn test_describe_uses_names() {
        let roster = roster();
        let (message, category) = describe(
            &roster,
            &CombatEvent::ActionAnnounced {
                actor: UnitId::new(1),
                skill: SkillId::new("flame_strike"),
                ap_cost: 5,
            },
        );
        assert_eq!(message, "Knight uses flame_strike (5 AP)");
        assert_eq!(category, LogCategory::Action);

        let (message, _) = describe(
            &roster,
            &CombatEvent::Damage {
                source: UnitId::new(1),
                target: UnitId::new(2),
                amount: 22,
                critical: true,
            },
        );
        assert_eq!(message, "Slime takes 22 damage (critical)");
    }

    #[test]
    fn test_shared_memory_log() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let shared = Rc::new(RefCell::new(MemoryLog::new()));
        let mut sink = Rc::clone(&shared);
        sink.log("hello", LogCategory::System);
        assert_eq!(shared.borrow().entries()[0].message, "hello");
    }
}
