//! Battle configuration.
//!
//! Hosts configure the engine at setup by providing a `BattleConfig`,
//! either through the builder methods or as JSON data. Every numeric rule
//! the pipeline and scheduler apply (tick rate, crit odds, AP recovery,
//! guard and splash ratios) lives here rather than in code.

use serde::{Deserialize, Serialize};

use super::error::{BattleError, Result};

/// Game-speed multipliers accepted by `set_speed`.
pub const VALID_SPEEDS: [u32; 4] = [1, 2, 4, 8];

/// Complete battle configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    /// RNG seed. Same seed + same inputs = same battle.
    pub seed: u64,

    /// Logical time per scheduler tick. Charge gained per tick is
    /// `speed * tick_rate * game_speed`.
    pub tick_rate: f64,

    /// Charge needed for a unit to become Ready.
    pub charge_threshold: f64,

    /// Probability of a critical hit, rolled once per attack.
    pub crit_chance: f64,

    /// Damage multiplier on a critical hit (result is floored).
    pub crit_multiplier: f64,

    /// AP restored by a `wait` skill.
    pub wait_ap_recovery: i32,

    /// Damage multiplier applied to the hit a guard absorbs.
    pub guard_multiplier: f64,

    /// Share of an attack's damage dealt to the target's teammates by
    /// splash skills.
    pub splash_ratio: f64,

    /// Start in automatic mode.
    pub auto_mode: bool,

    /// Initial game-speed multiplier (1, 2, 4 or 8).
    pub game_speed: u32,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            tick_rate: 0.1,
            charge_threshold: 100.0,
            crit_chance: 0.15,
            crit_multiplier: 1.5,
            wait_ap_recovery: 3,
            guard_multiplier: 0.5,
            splash_ratio: 0.5,
            auto_mode: true,
            game_speed: 1,
        }
    }
}

impl BattleConfig {
    /// Create the default configuration with a seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Parse and validate a JSON configuration. Missing fields take their
    /// defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the critical-hit chance.
    #[must_use]
    pub fn with_crit_chance(mut self, chance: f64) -> Self {
        self.crit_chance = chance;
        self
    }

    /// Set the tick rate.
    #[must_use]
    pub fn with_tick_rate(mut self, tick_rate: f64) -> Self {
        self.tick_rate = tick_rate;
        self
    }

    /// Set AP recovered by waiting.
    #[must_use]
    pub fn with_wait_recovery(mut self, amount: i32) -> Self {
        self.wait_ap_recovery = amount;
        self
    }

    /// Start in manual (single-step) mode.
    #[must_use]
    pub fn manual(mut self) -> Self {
        self.auto_mode = false;
        self
    }

    /// Set the initial game speed.
    #[must_use]
    pub fn with_game_speed(mut self, speed: u32) -> Self {
        self.game_speed = speed;
        self
    }

    /// Check every field is in range.
    pub fn validate(&self) -> Result<()> {
        let unit_range = 0.0..=1.0;
        if !(self.tick_rate > 0.0) {
            return Err(BattleError::InvalidConfig("tick_rate must be positive".into()));
        }
        if !(self.charge_threshold > 0.0) {
            return Err(BattleError::InvalidConfig(
                "charge_threshold must be positive".into(),
            ));
        }
        if !unit_range.contains(&self.crit_chance) {
            return Err(BattleError::InvalidConfig("crit_chance must be within 0..=1".into()));
        }
        if self.crit_multiplier < 1.0 {
            return Err(BattleError::InvalidConfig("crit_multiplier must be at least 1".into()));
        }
        if self.wait_ap_recovery < 0 {
            return Err(BattleError::InvalidConfig(
                "wait_ap_recovery must not be negative".into(),
            ));
        }
        if !unit_range.contains(&self.guard_multiplier) {
            return Err(BattleError::InvalidConfig(
                "guard_multiplier must be within 0..=1".into(),
            ));
        }
        if !unit_range.contains(&self.splash_ratio) {
            return Err(BattleError::InvalidConfig("splash_ratio must be within 0..=1".into()));
        }
        if !VALID_SPEEDS.contains(&self.game_speed) {
            return Err(BattleError::InvalidSpeed(self.game_speed));
        }
        Ok(())
    }
}
