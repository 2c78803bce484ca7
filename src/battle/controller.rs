//! Battle controller.
//!
//! The controller is the host-facing surface of the engine. It owns the
//! `BattleState` and wires the scheduler, the skill chooser, the resolution
//! pipeline, presentation hooks and the narration sink together:
//!
//! ```text
//! advance()            tick scheduler ──► (auto mode) begin turn
//! manual_next_turn()   step scheduler ──► begin turn
//!                                   │
//!                 choose skill ─► resolve ─► record ─► hooks + log ─► end check
//! ```
//!
//! State is always committed before any hook or log sink sees it, so a
//! headless run (`NoHooks`) produces exactly the same battle.

use log::{info, warn};

use super::hooks::{dispatch, NoHooks, PresentationHooks};
use super::narration::{describe, BattleLog, LogCategory, LogFacadeSink};
use super::policy::{PriorityChooser, SkillChooser};
use super::state::{BattleOutcome, BattleSnapshot, BattleState, TurnRecord};
use crate::core::{BattleConfig, BattleError, Result, Roster, Team, Unit, UnitId, UnitSpec};
use crate::effects::{LowestHpPolicy, PreferredTargetPolicy, SkillResolver, TargetPolicy};
use crate::passives::PassiveRegistry;
use crate::skills::{KeywordTable, SkillId, SkillLibrary};
use crate::turns::{GameSpeed, StepRejection, TickOutcome};

/// Result of one `advance` call.
#[derive(Clone, Debug, PartialEq)]
pub enum Progress {
    /// The scheduler ticked without a turn being taken.
    Ticked(TickOutcome),
    /// A unit took its turn.
    Turn(TurnRecord),
    /// The battle is over; nothing was consumed.
    Ended(BattleOutcome),
}

/// Result of a manual step request.
#[derive(Clone, Debug, PartialEq)]
pub enum StepOutcome {
    Turn(TurnRecord),
    Rejected(StepRejection),
}

/// Host-facing battle driver.
pub struct BattleController {
    config: BattleConfig,
    library: SkillLibrary,
    passives: PassiveRegistry,
    resolver: SkillResolver,
    state: Option<BattleState>,
    chooser: Box<dyn SkillChooser>,
    targeting: PreferredTargetPolicy<Box<dyn TargetPolicy>>,
    hooks: Box<dyn PresentationHooks>,
    log: Box<dyn BattleLog>,
    hook_failures: u32,
}

impl BattleController {
    /// Create a controller.
    ///
    /// Fails if `config` is out of range or `library` has no `wait` skill to
    /// fall back on.
    pub fn new(
        config: BattleConfig,
        library: SkillLibrary,
        passives: PassiveRegistry,
    ) -> Result<Self> {
        config.validate()?;
        if library.fallback_wait().is_none() {
            return Err(BattleError::InvalidConfig(
                "skill library has no `wait` skill".into(),
            ));
        }

        Ok(Self {
            resolver: SkillResolver::new(&config),
            config,
            library,
            passives,
            state: None,
            chooser: Box::new(PriorityChooser),
            targeting: PreferredTargetPolicy::new(Box::new(LowestHpPolicy)),
            hooks: Box::new(NoHooks),
            log: Box::new(LogFacadeSink),
            hook_failures: 0,
        })
    }

    /// A controller with the built-in keywords, skills and passives.
    pub fn with_defaults(config: BattleConfig) -> Result<Self> {
        let table = KeywordTable::with_defaults();
        let library = SkillLibrary::with_defaults(&table)?;
        Self::new(config, library, PassiveRegistry::with_defaults())
    }

    /// Replace the skill chooser.
    #[must_use]
    pub fn with_chooser(mut self, chooser: impl SkillChooser + 'static) -> Self {
        self.chooser = Box::new(chooser);
        self
    }

    /// Replace the default targeting policy.
    #[must_use]
    pub fn with_targeting(mut self, policy: impl TargetPolicy + 'static) -> Self {
        self.targeting = PreferredTargetPolicy::new(Box::new(policy));
        self
    }

    /// Attach presentation hooks.
    #[must_use]
    pub fn with_hooks(mut self, hooks: impl PresentationHooks + 'static) -> Self {
        self.hooks = Box::new(hooks);
        self
    }

    /// Replace the narration sink.
    #[must_use]
    pub fn with_log(mut self, log: impl BattleLog + 'static) -> Self {
        self.log = Box::new(log);
        self
    }

    // === Setup ===

    /// Build both teams from unit data and reset the battle.
    ///
    /// Passives are looked up in the passive registry; an empty skill list
    /// gets the library's default loadout. Fails fast on an empty team,
    /// invalid stats, duplicate ids or unknown passives and skills.
    pub fn initialize_units(&mut self, allies: &[UnitSpec], enemies: &[UnitSpec]) -> Result<()> {
        let allies = self.build_team(allies, Team::Ally)?;
        let enemies = self.build_team(enemies, Team::Enemy)?;
        let roster = Roster::new(allies, enemies)?;

        let message = format!(
            "Battle initialized: {} allies vs {} enemies",
            roster.allies().count(),
            roster.enemies().count()
        );
        self.state = Some(BattleState::new(roster, &self.config)?);
        self.hook_failures = 0;
        info!("{message}");
        self.log.log(&message, LogCategory::System);
        Ok(())
    }

    /// `initialize_units` from two JSON arrays of unit records.
    pub fn initialize_from_json(&mut self, allies: &str, enemies: &str) -> Result<()> {
        let allies: Vec<UnitSpec> = serde_json::from_str(allies)?;
        let enemies: Vec<UnitSpec> = serde_json::from_str(enemies)?;
        self.initialize_units(&allies, &enemies)
    }

    fn build_team(&self, specs: &[UnitSpec], team: Team) -> Result<Vec<Unit>> {
        specs
            .iter()
            .map(|spec| {
                let passive = match &spec.passive {
                    Some(name) => Some(self.passives.require(name)?.clone()),
                    None => None,
                };

                let skills = if spec.skills.is_empty() {
                    self.library.default_loadout().to_vec()
                } else {
                    spec.skills
                        .iter()
                        .map(|name| {
                            let id = SkillId::new(name.as_str());
                            self.library.require(&id)?;
                            Ok(id)
                        })
                        .collect::<Result<Vec<_>>>()?
                };

                Unit::from_spec(spec, team, passive, skills)
            })
            .collect()
    }

    // === Controls ===

    /// Start the clock. Does nothing once the battle has ended.
    ///
    /// If a side has no living units at this point the battle ends at once.
    pub fn start_battle(&mut self) -> Result<()> {
        let state = self.state.as_mut().ok_or_else(not_initialized)?;
        if let Some(outcome) = state.outcome {
            warn!("start_battle ignored: battle already ended in {outcome}");
            return Ok(());
        }
        if state.scheduler.is_running() {
            return Ok(());
        }

        state.scheduler.start();
        info!("battle started (seed {})", self.config.seed);
        self.log.log("Battle start!", LogCategory::System);

        // A side may already be wiped out by its unit data.
        if let Some(outcome) = BattleOutcome::evaluate(&state.roster) {
            self.end_battle(outcome);
        }
        Ok(())
    }

    /// Pause or resume time. Returns the new paused flag.
    pub fn toggle_pause(&mut self) -> bool {
        let Some(state) = self.state.as_mut() else {
            return false;
        };

        if state.scheduler.is_paused() {
            state.scheduler.resume();
            self.log.log("Resumed", LogCategory::System);
        } else {
            state.scheduler.pause();
            self.log.log("Paused", LogCategory::System);
        }
        state.scheduler.is_paused()
    }

    /// Flip auto mode. Returns the new value.
    pub fn toggle_auto_mode(&mut self) -> bool {
        let auto = match self.state.as_mut() {
            Some(state) => state.scheduler.toggle_auto_mode(),
            None => {
                self.config.auto_mode = !self.config.auto_mode;
                self.config.auto_mode
            }
        };
        let message = format!("Auto mode {}", if auto { "on" } else { "off" });
        self.log.log(&message, LogCategory::System);
        auto
    }

    /// Change the game-speed multiplier (1, 2, 4 or 8).
    pub fn set_speed(&mut self, multiplier: u32) -> Result<()> {
        match self.state.as_mut() {
            Some(state) => state.scheduler.set_speed(multiplier)?,
            None => self.config.game_speed = GameSpeed::new(multiplier)?.multiplier(),
        }
        self.log.log(&format!("Speed x{multiplier}"), LogCategory::System);
        Ok(())
    }

    // === Queries ===

    /// True while the clock runs and the battle is not over.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state
            .as_ref()
            .is_some_and(|s| s.scheduler.is_running() && !s.is_over())
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.state.as_ref().is_some_and(|s| s.scheduler.is_paused())
    }

    #[must_use]
    pub fn auto_mode(&self) -> bool {
        self.state
            .as_ref()
            .map_or(self.config.auto_mode, |s| s.scheduler.auto_mode())
    }

    #[must_use]
    pub fn outcome(&self) -> Option<BattleOutcome> {
        self.state.as_ref().and_then(BattleState::outcome)
    }

    #[must_use]
    pub fn state(&self) -> Option<&BattleState> {
        self.state.as_ref()
    }

    #[must_use]
    pub fn roster(&self) -> Option<&Roster> {
        self.state.as_ref().map(BattleState::roster)
    }

    #[must_use]
    pub fn library(&self) -> &SkillLibrary {
        &self.library
    }

    /// Presentation hooks that returned an error so far.
    #[must_use]
    pub fn hook_failures(&self) -> u32 {
        self.hook_failures
    }

    // === Driving ===

    /// Advance one scheduler tick; in auto mode, also take the next Ready
    /// unit's turn.
    pub fn advance(&mut self) -> Result<Progress> {
        let state = self.state.as_mut().ok_or_else(not_initialized)?;
        if let Some(outcome) = state.outcome {
            return Ok(Progress::Ended(outcome));
        }

        let ticked = state.scheduler.tick(&mut state.roster);
        if ticked == TickOutcome::Halted || !state.scheduler.auto_mode() {
            return Ok(Progress::Ticked(ticked));
        }

        match state.scheduler.begin_turn(&mut state.roster) {
            Some(actor) => self.take_turn(actor).map(Progress::Turn),
            None => Ok(Progress::Ticked(ticked)),
        }
    }

    /// Take exactly one Ready unit's turn (manual mode only).
    ///
    /// Refusals (auto mode on, nobody ready, battle over) are reported and
    /// change nothing.
    pub fn manual_next_turn(&mut self) -> Result<StepOutcome> {
        let state = self.state.as_mut().ok_or_else(not_initialized)?;
        let step = if state.is_over() {
            Err(StepRejection::BattleEnded)
        } else {
            state.scheduler.step_once(&mut state.roster)
        };

        match step {
            Ok(actor) => self.take_turn(actor).map(StepOutcome::Turn),
            Err(rejection) => {
                warn!("manual step rejected: {rejection}");
                self.log
                    .log(&format!("Cannot step: {rejection}"), LogCategory::System);
                Ok(StepOutcome::Rejected(rejection))
            }
        }
    }

    /// Drive the battle headlessly until it ends or `max_ticks` calls to
    /// `advance` have been made. Starts the battle if needed and steps
    /// manually when auto mode is off.
    pub fn run_to_end(&mut self, max_ticks: u64) -> Result<Option<BattleOutcome>> {
        self.start_battle()?;

        for _ in 0..max_ticks {
            match self.advance()? {
                Progress::Ended(outcome) => return Ok(Some(outcome)),
                Progress::Ticked(TickOutcome::Halted) => break,
                Progress::Ticked(_) if !self.auto_mode() && self.has_ready_unit() => {
                    self.manual_next_turn()?;
                }
                _ => {}
            }
        }
        Ok(self.outcome())
    }

    fn has_ready_unit(&self) -> bool {
        self.state
            .as_ref()
            .is_some_and(|s| !s.scheduler.ready_queue().is_empty())
    }

    /// Checkpoint the battle.
    pub fn snapshot(&self) -> Result<BattleSnapshot> {
        self.state
            .as_ref()
            .map(BattleState::snapshot)
            .ok_or_else(not_initialized)
    }

    /// Replace the battle with a checkpoint.
    pub fn restore(&mut self, snapshot: BattleSnapshot) {
        let state = BattleState::from_snapshot(snapshot);
        info!("restored battle at turn {}", state.turn());
        self.state = Some(state);
    }

    // === Turn ===

    fn take_turn(&mut self, actor: UnitId) -> Result<TurnRecord> {
        let state = self.state.as_mut().ok_or_else(not_initialized)?;

        let choice = {
            let unit = state.roster.require(actor)?;
            self.chooser.choose(unit, &state.roster, &self.library)
        };

        let skill = match self.library.get(&choice.skill) {
            Some(skill) => skill,
            None => {
                warn!("{actor} chose unknown skill `{}`; waiting", choice.skill);
                self.library
                    .fallback_wait()
                    .ok_or_else(|| BattleError::UnknownSkill(choice.skill.clone()))?
            }
        };

        self.targeting.prefer(choice.target);
        let resolved = self.resolver.resolve(
            &mut state.roster,
            actor,
            skill,
            &mut self.targeting,
            &mut state.rng,
        );
        let result = match resolved {
            Ok(result) => result,
            Err(err) if err.is_rejection() => {
                warn!("{actor} could not use {}: {err}; waiting", skill.id());
                self.log.log(&err.to_string(), LogCategory::System);
                let wait = self
                    .library
                    .fallback_wait()
                    .ok_or_else(|| BattleError::UnknownSkill(skill.id().clone()));
                match wait.and_then(|wait| {
                    self.resolver.resolve(
                        &mut state.roster,
                        actor,
                        wait,
                        &mut self.targeting,
                        &mut state.rng,
                    )
                }) {
                    Ok(result) => result,
                    Err(err) => {
                        self.targeting.prefer(None);
                        state.scheduler.complete_turn(actor);
                        return Err(err);
                    }
                }
            }
            Err(err) => {
                self.targeting.prefer(None);
                state.scheduler.complete_turn(actor);
                return Err(err);
            }
        };
        self.targeting.prefer(None);
        state.scheduler.complete_turn(actor);

        let record = state.record(actor, result);

        // Presentation only sees committed state.
        if !record.result.success {
            let name = state.roster.require(actor)?.name().to_string();
            self.log.log(
                &format!("{name} has no valid target for {}", record.result.skill),
                LogCategory::Action,
            );
        }
        for event in &record.result.events {
            let (message, category) = describe(&state.roster, event);
            self.log.log(&message, category);
            if let Err(err) = dispatch(self.hooks.as_mut(), &state.roster, event) {
                self.hook_failures += 1;
                warn!("{err}");
            }
        }

        if let Some(outcome) = BattleOutcome::evaluate(&state.roster) {
            self.end_battle(outcome);
        }

        Ok(record)
    }

    /// Record the outcome, stop the clock and notify observers.
    fn end_battle(&mut self, outcome: BattleOutcome) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        state.outcome = Some(outcome);
        state.scheduler.stop();
        info!("battle ended in {outcome} after {} turns", state.turn());

        self.log
            .log(&format!("Battle over: {outcome}"), LogCategory::Outcome);
        if let Err(err) = self.hooks.on_battle_end(outcome) {
            self.hook_failures += 1;
            warn!("{err}");
        }
    }
}

fn not_initialized() -> BattleError {
    BattleError::InvalidConfig("units have not been initialized".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skills::{SkillDef, SkillKind, TargetKind};

    fn controller(config: BattleConfig) -> BattleController {
        BattleController::with_defaults(config).unwrap()
    }

    fn knight() -> UnitSpec {
        UnitSpec::new(1, "Knight", 40, 30).with_combat(8, 2)
    }

    fn slime() -> UnitSpec {
        UnitSpec::new(2, "Slime", 10, 10)
    }

    #[test]
    fn test_library_needs_wait() {
        let table = KeywordTable::with_defaults();
        let defs = [SkillDef::new("jab", "Jab", SkillKind::Attack, TargetKind::Enemy).with_keyword("SLASH")];
        let library = SkillLibrary::from_defs(&defs, &table).unwrap();

        let result = BattleController::new(BattleConfig::default(), library, PassiveRegistry::new());
        assert!(matches!(result, Err(BattleError::InvalidConfig(_))));
    }

    #[test]
    fn test_initialize_resolves_loadouts_and_passives() {
        let mut c = controller(BattleConfig::default());
        c.initialize_units(
            &[knight().with_passive("riposte")],
            &[slime().with_skill("cleave").with_skill("wait")],
        )
        .unwrap();

        let roster = c.roster().unwrap();
        let knight = roster.get(UnitId::new(1)).unwrap();
        assert_eq!(knight.passive().unwrap().display_name, "Riposte");
        assert_eq!(knight.skills(), c.library().default_loadout());
        assert_eq!(roster.get(UnitId::new(2)).unwrap().skills().len(), 2);
    }

    #[test]
    fn test_initialize_fails_fast() {
        let mut c = controller(BattleConfig::default());
        assert!(matches!(
            c.initialize_units(&[knight()], &[]),
            Err(BattleError::EmptyRoster(Team::Enemy))
        ));
        assert!(matches!(
            c.initialize_units(&[knight().with_passive("flight")], &[slime()]),
            Err(BattleError::UnknownPassive(_))
        ));
        assert!(matches!(
            c.initialize_units(&[knight().with_skill("meteor")], &[slime()]),
            Err(BattleError::UnknownSkill(_))
        ));
        assert!(c.state().is_none());
    }

    #[test]
    fn test_not_initialized() {
        let mut c = controller(BattleConfig::default());
        assert!(c.start_battle().is_err());
        assert!(c.advance().is_err());
        assert!(!c.toggle_pause());
        assert!(!c.is_running());
    }

    #[test]
    fn test_pause_stops_time() {
        let mut c = controller(BattleConfig::default().with_tick_rate(1.0));
        c.initialize_units(&[knight()], &[slime()]).unwrap();
        c.start_battle().unwrap();

        assert!(c.toggle_pause());
        assert_eq!(c.advance().unwrap(), Progress::Ticked(TickOutcome::Halted));
        assert!(!c.toggle_pause());
        assert!(matches!(c.advance().unwrap(), Progress::Ticked(TickOutcome::Advanced { .. })));
    }

    #[test]
    fn test_invalid_speed_rejected() {
        let mut c = controller(BattleConfig::default());
        assert!(matches!(c.set_speed(3), Err(BattleError::InvalidSpeed(3))));
        c.initialize_units(&[knight()], &[slime()]).unwrap();
        c.set_speed(8).unwrap();
        assert_eq!(c.state().unwrap().scheduler().speed().multiplier(), 8);
    }

    #[test]
    fn test_auto_battle_reaches_victory() {
        let mut c = controller(BattleConfig::new(4).with_crit_chance(0.0));
        c.initialize_units(&[knight()], &[slime()]).unwrap();

        let outcome = c.run_to_end(10_000).unwrap();
        assert_eq!(outcome, Some(BattleOutcome::Victory));
        assert!(!c.is_running());
        assert!(c.state().unwrap().turn() >= 1);
    }
}
