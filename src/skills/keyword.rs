//! Keywords: the atomic, composable fragments skills are built from.
//!
//! A keyword contributes AP cost, power and optional tags. Skills sum the
//! cost and power of their keywords and fold the tags together through
//! `SkillModifiers::from_tags`, so new skills can be authored purely as
//! keyword lists without new code.
//!
//! ```
//! use charge_battle::skills::{KeywordId, KeywordTable};
//!
//! let table = KeywordTable::with_defaults();
//! let ids = [KeywordId::new("STRIKE"), KeywordId::new("FLAME")];
//!
//! assert_eq!(table.resolve_ap_cost(&ids).unwrap(), 5);
//! assert_eq!(table.resolve_power(&ids).unwrap(), 15);
//! ```

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::{BattleError, Result};

/// Most hits a single skill can deliver.
pub const MAX_HITS: u32 = 16;

/// Keyword identifier, e.g. `"STRIKE"`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeywordId(pub String);

impl KeywordId {
    /// Create a new keyword ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for KeywordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Optional effect tags a keyword can carry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordTags {
    /// Number of hits this keyword adds.
    pub hits: Option<u32>,
    /// Skip the target's defense stat.
    pub ignore_defense: bool,
    /// Skip the target's defense stat and any guard.
    pub penetration: bool,
    /// Fraction of damage dealt returned to the attacker as HP (0..=1).
    pub lifesteal: Option<f64>,
    /// Damage spills onto the target's teammates.
    pub splash: bool,
}

/// A keyword definition. Immutable once registered.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub id: KeywordId,
    pub ap_cost: i32,
    pub power: i32,
    #[serde(default)]
    pub tags: KeywordTags,
}

impl Keyword {
    /// Create a keyword with no tags.
    pub fn new(id: impl Into<String>, ap_cost: i32, power: i32) -> Self {
        Self {
            id: KeywordId::new(id),
            ap_cost,
            power,
            tags: KeywordTags::default(),
        }
    }

    /// Add hits.
    #[must_use]
    pub fn with_hits(mut self, hits: u32) -> Self {
        self.tags.hits = Some(hits);
        self
    }

    /// Ignore the target's defense.
    #[must_use]
    pub fn ignoring_defense(mut self) -> Self {
        self.tags.ignore_defense = true;
        self
    }

    /// Penetrate defense and guards.
    #[must_use]
    pub fn penetrating(mut self) -> Self {
        self.tags.penetration = true;
        self
    }

    /// Heal the attacker for a share of damage dealt.
    #[must_use]
    pub fn with_lifesteal(mut self, ratio: f64) -> Self {
        self.tags.lifesteal = Some(ratio);
        self
    }

    /// Spill damage onto the target's teammates.
    #[must_use]
    pub fn splashing(mut self) -> Self {
        self.tags.splash = true;
        self
    }

    fn validate(&self) -> Result<()> {
        let invalid = |what: &str| Err(BattleError::InvalidConfig(format!("keyword `{}`: {what}", self.id)));
        if self.ap_cost < 0 {
            return invalid("ap_cost must not be negative");
        }
        if self.power < 0 {
            return invalid("power must not be negative");
        }
        if let Some(hits) = self.tags.hits {
            if !(1..=MAX_HITS).contains(&hits) {
                return invalid(&format!("hits must be within 1..={MAX_HITS}"));
            }
        }
        if let Some(ratio) = self.tags.lifesteal {
            if !(0.0..=1.0).contains(&ratio) {
                return invalid("lifesteal must be within 0..=1");
            }
        }
        Ok(())
    }
}

/// Registry of keyword definitions, keyed by id.
#[derive(Clone, Debug, Default)]
pub struct KeywordTable {
    keywords: FxHashMap<KeywordId, Keyword>,
}

impl KeywordTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in keyword vocabulary.
    #[must_use]
    pub fn with_defaults() -> Self {
        let defaults = [
            Keyword::new("STRIKE", 2, 10),
            Keyword::new("FLAME", 3, 5),
            Keyword::new("SLASH", 1, 6),
            Keyword::new("TWIN", 2, 0).with_hits(2),
            Keyword::new("PIERCE", 2, 4).ignoring_defense(),
            Keyword::new("BREAKER", 3, 6).penetrating(),
            Keyword::new("DRAIN", 2, 3).with_lifesteal(0.5),
            Keyword::new("SWEEP", 3, 4).splashing(),
            Keyword::new("MEND", 2, 12),
            Keyword::new("BRACE", 1, 0),
        ];

        let mut table = Self::new();
        for keyword in defaults {
            table.keywords.insert(keyword.id.clone(), keyword);
        }
        table
    }

    /// Load keyword definitions from a JSON array.
    pub fn from_json(json: &str) -> Result<Self> {
        let keywords: Vec<Keyword> = serde_json::from_str(json)?;
        let mut table = Self::new();
        for keyword in keywords {
            table.register(keyword)?;
        }
        Ok(table)
    }

    /// Register a keyword.
    ///
    /// Fails on a duplicate id or out-of-range values.
    pub fn register(&mut self, keyword: Keyword) -> Result<()> {
        keyword.validate()?;
        if self.keywords.contains_key(&keyword.id) {
            return Err(BattleError::DuplicateKeyword(keyword.id));
        }
        self.keywords.insert(keyword.id.clone(), keyword);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, id: &KeywordId) -> Option<&Keyword> {
        self.keywords.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &KeywordId) -> bool {
        self.keywords.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Look up every id, failing on the first unknown one.
    pub fn lookup_all<'a>(&'a self, ids: &[KeywordId]) -> Result<Vec<&'a Keyword>> {
        ids.iter()
            .map(|id| self.get(id).ok_or_else(|| BattleError::UnknownKeyword(id.clone())))
            .collect()
    }

    /// Total AP cost of a keyword list.
    ///
    /// Fails on an unknown keyword or a total that does not fit in `i32`.
    pub fn resolve_ap_cost(&self, ids: &[KeywordId]) -> Result<i32> {
        checked_sum(self.lookup_all(ids)?.iter().map(|k| k.ap_cost))
            .ok_or_else(|| BattleError::InvalidConfig("total ap_cost overflows".into()))
    }

    /// Total power of a keyword list.
    ///
    /// Fails on an unknown keyword or a total that does not fit in `i32`.
    pub fn resolve_power(&self, ids: &[KeywordId]) -> Result<i32> {
        checked_sum(self.lookup_all(ids)?.iter().map(|k| k.power))
            .ok_or_else(|| BattleError::InvalidConfig("total power overflows".into()))
    }
}

/// Sum of `values`, or `None` on overflow.
pub(crate) fn checked_sum(values: impl IntoIterator<Item = i32>) -> Option<i32> {
    values.into_iter().try_fold(0i32, i32::checked_add)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<KeywordId> {
        names.iter().map(|n| KeywordId::new(*n)).collect()
    }

    #[test]
    fn test_strike_flame_sums() {
        let table = KeywordTable::with_defaults();
        let kws = ids(&["STRIKE", "FLAME"]);
        assert_eq!(table.resolve_ap_cost(&kws).unwrap(), 5);
        assert_eq!(table.resolve_power(&kws).unwrap(), 15);
    }

    #[test]
    fn test_empty_list_sums_to_zero() {
        let table = KeywordTable::with_defaults();
        assert_eq!(table.resolve_ap_cost(&[]).unwrap(), 0);
        assert_eq!(table.resolve_power(&[]).unwrap(), 0);
    }

    #[test]
    fn test_unknown_keyword_is_error() {
        let table = KeywordTable::with_defaults();
        let err = table.resolve_ap_cost(&ids(&["STRIKE", "NOPE"])).unwrap_err();
        assert!(matches!(err, BattleError::UnknownKeyword(id) if id.as_str() == "NOPE"));
        assert!(table.resolve_power(&ids(&["NOPE"])).is_err());
    }

    #[test]
    fn test_register_rejects_duplicates_and_bad_values() {
        let mut table = KeywordTable::new();
        table.register(Keyword::new("A", 1, 1)).unwrap();
        assert!(matches!(
            table.register(Keyword::new("A", 2, 2)),
            Err(BattleError::DuplicateKeyword(_))
        ));
        assert!(table.register(Keyword::new("B", -1, 0)).is_err());
        assert!(table.register(Keyword::new("C", 0, 0).with_hits(0)).is_err());
        assert!(table.register(Keyword::new("D", 0, 0).with_lifesteal(1.5)).is_err());
        assert!(table.register(Keyword::new("E", 0, 10).with_hits(3_000_000_000)).is_err());
        assert!(table.register(Keyword::new("F", 0, 10).with_hits(MAX_HITS + 1)).is_err());
        assert_eq!(table.len(), 1);

        table.register(Keyword::new("G", 0, 10).with_hits(MAX_HITS)).unwrap();
    }

    #[test]
    fn test_overflowing_totals_are_errors() {
        let mut table = KeywordTable::new();
        table.register(Keyword::new("BIG", i32::MAX, i32::MAX)).unwrap();
        table.register(Keyword::new("ONE", 1, 1)).unwrap();

        let kws = ids(&["BIG", "ONE"]);
        assert!(matches!(table.resolve_ap_cost(&kws), Err(BattleError::InvalidConfig(_))));
        assert!(matches!(table.resolve_power(&kws), Err(BattleError::InvalidConfig(_))));
        assert_eq!(table.resolve_ap_cost(&ids(&["BIG"])).unwrap(), i32::MAX);
    }

    #[test]
    fn test_from_json() {
        let json = r#"[
            { "id": "JAB", "ap_cost": 1, "power": 3 },
            { "id": "FLURRY", "ap_cost": 2, "power": 0, "tags": { "hits": 3 } }
        ]"#;
        let table = KeywordTable::from_json(json).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(&KeywordId::new("FLURRY")).unwrap().tags.hits, Some(3));
        assert!(!table.get(&KeywordId::new("JAB")).unwrap().tags.splash);
    }
}
