//! Passive registry.
//!
//! Unit data names passives by key (`"riposte"`, `"evasion"`); the registry
//! maps those keys to `PassiveAbility` values at battle setup.

use rustc_hash::FxHashMap;

use super::passive::{PassiveAbility, PassiveKind};
use crate::core::{BattleError, Result};

/// Named passive abilities available to unit data.
#[derive(Clone, Debug, Default)]
pub struct PassiveRegistry {
    passives: FxHashMap<String, PassiveAbility>,
}

impl PassiveRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in passives.
    #[must_use]
    pub fn with_defaults() -> Self {
        let defaults = [
            ("evasion", "Evasion", PassiveKind::Evasion { chance: 0.25 }),
            ("iron_skin", "Iron Skin", PassiveKind::Bulwark { multiplier: 0.7 }),
            (
                "last_stand",
                "Last Stand",
                PassiveKind::LastStand { hp_ratio: 0.3, multiplier: 0.5 },
            ),
            ("riposte", "Riposte", PassiveKind::Counter { ratio: 0.5 }),
            ("thorns", "Thorns", PassiveKind::Thorns { ratio: 0.3 }),
        ];

        let mut registry = Self::new();
        for (key, name, kind) in defaults {
            registry.passives.insert(
                key.to_string(),
                PassiveAbility {
                    display_name: name.to_string(),
                    kind,
                },
            );
        }
        registry
    }

    /// Register a passive under `key`. Fails if the key is taken.
    pub fn register(&mut self, key: impl Into<String>, passive: PassiveAbility) -> Result<()> {
        let key = key.into();
        if self.passives.contains_key(&key) {
            return Err(BattleError::InvalidConfig(format!(
                "passive `{key}` is already registered"
            )));
        }
        self.passives.insert(key, passive);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&PassiveAbility> {
        self.passives.get(key)
    }

    /// Look up a passive, failing with `UnknownPassive`.
    pub fn require(&self, key: &str) -> Result<&PassiveAbility> {
        self.get(key)
            .ok_or_else(|| BattleError::UnknownPassive(key.to_string()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.passives.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.passives.is_empty()
    }
}
