//! Property tests for composition, resource bounds and scheduling.

use proptest::prelude::*;

use charge_battle::battle::BattleController;
use charge_battle::core::{BattleConfig, BattleRng, Roster, Team, Unit, UnitId, UnitSpec};
use charge_battle::effects::{LowestHpPolicy, SkillResolver};
use charge_battle::skills::{KeywordId, KeywordTable, SkillDef, SkillId, SkillKind, SkillLibrary, TargetKind};
use charge_battle::turns::TurnScheduler;

const DEFAULT_KEYWORDS: [&str; 10] = [
    "STRIKE", "FLAME", "SLASH", "TWIN", "PIERCE", "BREAKER", "DRAIN", "SWEEP", "MEND", "BRACE",
];

const PASSIVES: [Option<&str>; 6] = [
    None,
    Some("evasion"),
    Some("iron_skin"),
    Some("last_stand"),
    Some("riposte"),
    Some("thorns"),
];

fn keyword_list() -> impl Strategy<Value = Vec<&'static str>> {
    prop::collection::vec(prop::sample::select(DEFAULT_KEYWORDS.to_vec()), 0..6)
}

prop_compose! {
    fn unit_spec(id: u32, slot: u8)(
        max_hp in 1..80i32,
        speed in 1..40i32,
        attack in 0..15i32,
        defense in 0..6i32,
        max_ap in 0..12i32,
        passive in prop::sample::select(PASSIVES.to_vec()),
    ) -> UnitSpec {
        let spec = UnitSpec::new(id, format!("U{id}"), max_hp, speed)
            .with_slot(slot)
            .with_max_ap(max_ap)
            .with_combat(attack, defense);
        match passive {
            Some(name) => spec.with_passive(name),
            None => spec,
        }
    }
}

prop_compose! {
    fn battle()(
        seed in any::<u64>(),
        a0 in unit_spec(1, 0),
        a1 in unit_spec(2, 1),
        e0 in unit_spec(10, 0),
        e1 in unit_spec(11, 1),
    ) -> (u64, Vec<UnitSpec>, Vec<UnitSpec>) {
        (seed, vec![a0, a1], vec![e0, e1])
    }
}

fn assert_bounds(roster: &Roster) -> Result<(), TestCaseError> {
    for unit in roster.iter() {
        prop_assert!((0..=unit.max_hp()).contains(&unit.hp()), "{} hp {}", unit.id(), unit.hp());
        prop_assert!((0..=unit.max_ap()).contains(&unit.ap()), "{} ap {}", unit.id(), unit.ap());
        prop_assert!(unit.charge() >= 0.0);
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // =========================================================================
    // Composition
    // =========================================================================

    #[test]
    fn test_skill_totals_are_keyword_sums(keywords in keyword_list()) {
        let table = KeywordTable::with_defaults();
        let def = keywords
            .iter()
            .fold(SkillDef::new("prop", "Prop", SkillKind::Attack, TargetKind::Enemy), |def, kw| {
                def.with_keyword(*kw)
            });
        let skill = def.build(&table).unwrap();

        let ids: Vec<KeywordId> = keywords.iter().map(|k| KeywordId::new(*k)).collect();
        let cost: i32 = ids.iter().map(|id| table.get(id).unwrap().ap_cost).sum();
        let power: i32 = ids.iter().map(|id| table.get(id).unwrap().power).sum();

        prop_assert_eq!(skill.ap_cost(), cost);
        prop_assert_eq!(skill.power(), power);
        prop_assert!(skill.modifiers().hits >= 1);
        prop_assert!((0.0..=1.0).contains(&skill.modifiers().lifesteal));
    }

    #[test]
    fn test_unknown_keyword_anywhere_fails(keywords in keyword_list(), at in 0usize..6) {
        let table = KeywordTable::with_defaults();
        let mut ids: Vec<KeywordId> = keywords.iter().map(|k| KeywordId::new(*k)).collect();
        let at = at.min(ids.len());
        ids.insert(at, KeywordId::new("UNKNOWN"));

        prop_assert!(table.resolve_ap_cost(&ids).is_err());
        prop_assert!(table.resolve_power(&ids).is_err());
    }

    // =========================================================================
    // Resources
    // =========================================================================

    #[test]
    fn test_wait_recovers_within_bounds(max_ap in 0..20i32, ap_ratio in 0.0..=1.0f64, recovery in 0..8i32) {
        let ap = (f64::from(max_ap) * ap_ratio).floor() as i32;
        let spec = UnitSpec::new(1, "Waiter", 10, 10).with_max_ap(max_ap).with_ap(ap);
        let mut roster = Roster::new(
            vec![Unit::from_spec(&spec, Team::Ally, None, Vec::new()).unwrap()],
            vec![Unit::from_spec(&UnitSpec::new(2, "Foe", 10, 10), Team::Enemy, None, Vec::new()).unwrap()],
        )
        .unwrap();

        let config = BattleConfig::new(0).with_wait_recovery(recovery);
        let library = SkillLibrary::with_defaults(&KeywordTable::with_defaults()).unwrap();
        let wait = library.require(&SkillId::new("wait")).unwrap();
        let result = SkillResolver::new(&config)
            .resolve(&mut roster, UnitId::new(1), wait, &mut LowestHpPolicy, &mut BattleRng::new(0))
            .unwrap();

        let after = roster.get(UnitId::new(1)).unwrap().ap();
        prop_assert_eq!(after, (ap + recovery).min(max_ap));
        prop_assert!(after >= ap);
        prop_assert_eq!(result.ap_spent, 0);
    }

    #[test]
    fn test_battle_keeps_stats_in_bounds((seed, allies, enemies) in battle()) {
        let mut controller = BattleController::with_defaults(BattleConfig::new(seed).with_tick_rate(1.0)).unwrap();
        controller.initialize_units(&allies, &enemies).unwrap();
        controller.start_battle().unwrap();

        for _ in 0..2_000 {
            controller.advance().unwrap();
            assert_bounds(controller.roster().unwrap())?;
            if controller.outcome().is_some() {
                break;
            }
        }
    }

    #[test]
    fn test_same_seed_same_battle((seed, allies, enemies) in battle()) {
        let run = || {
            let mut controller = BattleController::with_defaults(BattleConfig::new(seed).with_tick_rate(1.0)).unwrap();
            controller.initialize_units(&allies, &enemies).unwrap();
            let outcome = controller.run_to_end(2_000).unwrap();
            (outcome, controller.state().unwrap().history().clone())
        };
        prop_assert_eq!(run(), run());
    }

    // =========================================================================
    // Scheduling
    // =========================================================================

    #[test]
    fn test_charge_never_decreases_between_turns(
        speeds in prop::collection::vec(1..60i32, 2..6),
        ticks in 1..200usize,
    ) {
        let units: Vec<Unit> = speeds
            .iter()
            .enumerate()
            .map(|(i, speed)| {
                let spec = UnitSpec::new(i as u32 + 1, format!("U{i}"), 10, *speed).with_slot(i as u8);
                let team = if i % 2 == 0 { Team::Ally } else { Team::Enemy };
                Unit::from_spec(&spec, team, None, Vec::new()).unwrap()
            })
            .collect();
        let (allies, enemies): (Vec<Unit>, Vec<Unit>) = units.into_iter().partition(|u| u.team() == Team::Ally);
        let mut roster = Roster::new(allies, enemies).unwrap();

        let mut scheduler = TurnScheduler::new(&BattleConfig::default().with_tick_rate(1.0)).unwrap();
        scheduler.start();

        for _ in 0..ticks {
            let before: Vec<f64> = roster.iter().map(Unit::charge).collect();
            scheduler.tick(&mut roster);
            for (unit, previous) in roster.iter().zip(&before) {
                prop_assert!(unit.charge() >= *previous);
            }

            let mut last_speed = i32::MAX;
            while let Some(actor) = scheduler.begin_turn(&mut roster) {
                let unit = roster.get(actor).unwrap();
                prop_assert_eq!(unit.charge(), 0.0);
                prop_assert!(unit.speed() <= last_speed);
                last_speed = unit.speed();
                scheduler.complete_turn(actor);
            }
        }
    }
}
