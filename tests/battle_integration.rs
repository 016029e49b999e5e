//! End-to-end battle tests against the public API

use ember_tactics::battle::{
    BattleEvent, BattleOutcome, GridBounds, TurnEngine, TurnPhase, Unit, UnitStats,
};
use ember_tactics::core::config::BattleConfig;
use ember_tactics::core::types::{Allegiance, GridPos};
use ember_tactics::data::{ClassCatalog, EffectCatalog, SkillCatalog};
use ember_tactics::dice::{DiceRoller, FixedRolls};

fn engine_with_fixed(unit: f32, roll: i32) -> TurnEngine {
    TurnEngine::new(
        BattleConfig::default(),
        GridBounds::new(12, 12),
        SkillCatalog::with_defaults(),
        EffectCatalog::with_defaults(),
        Box::new(FixedRolls { unit, roll }),
    )
    .unwrap()
}

fn grunt(allegiance: Allegiance, speed: i32, pos: GridPos) -> Unit {
    Unit::new(
        "grunt",
        allegiance,
        UnitStats {
            speed,
            ..UnitStats::default()
        },
    )
    .at(pos)
}

#[test]
fn adjacent_exchange_deals_expected_damage() {
    // No skills fire (0.99 > every slot probability), every attack rolls 4.
    // Damage per hit: roll 4 + attack 5 - defense 2 = 7.
    let mut engine = engine_with_fixed(0.99, 4);
    let ally = engine.add_unit(grunt(Allegiance::Ally, 8, GridPos::new(0, 0)));
    let enemy = engine.add_unit(grunt(Allegiance::Enemy, 3, GridPos::new(1, 0)));

    assert_eq!(engine.step().unwrap(), TurnPhase::ProcessUnitTurn);
    assert_eq!(engine.step().unwrap(), TurnPhase::EndTurn);

    // Exactly one damage event per attacker in the round
    let damage_events: Vec<_> = engine
        .events()
        .iter()
        .filter_map(|e| match e {
            BattleEvent::DamageCalculated {
                target_id,
                hp_damage_dealt,
                ..
            } => Some((*target_id, *hp_damage_dealt)),
            _ => None,
        })
        .collect();
    assert_eq!(damage_events, vec![(enemy, 7), (ally, 7)]);

    assert_eq!(engine.roster().get(ally).unwrap().current_hp, 23);
    assert_eq!(engine.roster().get(enemy).unwrap().current_hp, 23);
}

#[test]
fn faster_unit_acts_first() {
    let mut engine = engine_with_fixed(0.99, 4);
    let slow = engine.add_unit(grunt(Allegiance::Ally, 2, GridPos::new(0, 0)));
    let fast = engine.add_unit(grunt(Allegiance::Enemy, 9, GridPos::new(1, 0)));

    engine.step().unwrap();
    engine.step().unwrap();

    let activations: Vec<_> = engine
        .events()
        .iter()
        .filter_map(|e| match e {
            BattleEvent::UnitTurnStarted { unit_id } => Some(*unit_id),
            _ => None,
        })
        .collect();
    assert_eq!(activations, vec![fast, slow]);
}

#[test]
fn killing_blow_ends_battle_at_next_start_turn() {
    let mut engine = engine_with_fixed(0.99, 4);
    engine.add_unit(grunt(Allegiance::Ally, 8, GridPos::new(0, 0)));
    let enemy = engine.add_unit(
        Unit::new(
            "wisp",
            Allegiance::Enemy,
            UnitStats {
                max_hp: 1,
                speed: 1,
                ..UnitStats::default()
            },
        )
        .at(GridPos::new(1, 0)),
    );

    engine.step().unwrap(); // StartTurn
    engine.step().unwrap(); // ProcessUnitTurn: the wisp dies
    assert!(engine
        .events()
        .iter()
        .any(|e| matches!(e, BattleEvent::UnitDied { unit_id } if *unit_id == enemy)));

    engine.step().unwrap(); // EndTurn prunes the corpse
    let phase = engine.step().unwrap(); // StartTurn detects the end
    assert_eq!(phase, TurnPhase::BattleEnd);
    assert_eq!(engine.outcome(), Some(BattleOutcome::Victory));

    assert!(matches!(
        engine.events().last(),
        Some(BattleEvent::BattleEnded {
            outcome: BattleOutcome::Victory,
            turn: 1,
        })
    ));
}

#[test]
fn event_stream_brackets_the_battle() {
    let mut engine = engine_with_fixed(0.99, 4);
    engine.add_unit(grunt(Allegiance::Ally, 8, GridPos::new(0, 0)));
    engine.add_unit(grunt(Allegiance::Enemy, 3, GridPos::new(1, 0)));

    engine.run().unwrap();

    let events = engine.events();
    assert!(matches!(
        events.first(),
        Some(BattleEvent::BattleStarted {
            allies: 1,
            enemies: 1,
        })
    ));
    assert!(matches!(events.last(), Some(BattleEvent::BattleEnded { .. })));
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, BattleEvent::BattleEnded { .. }))
            .count(),
        1
    );
}

#[test]
fn barrier_absorbs_before_health() {
    let mut engine = engine_with_fixed(0.99, 4);
    engine.add_unit(grunt(Allegiance::Ally, 8, GridPos::new(0, 0)));
    let shelled = engine.add_unit(
        grunt(Allegiance::Enemy, 3, GridPos::new(1, 0)).with_barrier(10),
    );

    engine.step().unwrap();
    engine.step().unwrap();

    // The 7-point hit lands entirely on the barrier
    assert!(engine.events().iter().any(|e| matches!(
        e,
        BattleEvent::DamageCalculated {
            target_id,
            hp_damage_dealt: 0,
            barrier_damage_dealt: 7,
            new_barrier: 3,
            ..
        } if *target_id == shelled
    )));
    let unit = engine.roster().get(shelled).unwrap();
    assert_eq!(unit.current_hp, unit.stats.max_hp);
    assert_eq!(unit.current_barrier, 3);
}

#[test]
fn distant_units_approach_before_attacking() {
    let mut engine = engine_with_fixed(0.99, 4);
    let ally = engine.add_unit(grunt(Allegiance::Ally, 8, GridPos::new(0, 0)));
    engine.add_unit(grunt(Allegiance::Enemy, 3, GridPos::new(9, 0)));

    engine.step().unwrap();
    engine.step().unwrap();

    // Too far for a first-round attack: movement happened, no damage yet
    let moved = engine.roster().get(ally).unwrap().position;
    assert_ne!(moved, GridPos::new(0, 0));
    assert!(moved.distance(&GridPos::new(9, 0)) < 9);
    assert!(!engine
        .events()
        .iter()
        .any(|e| matches!(e, BattleEvent::DamageCalculated { .. })));
}

#[test]
fn seeded_class_battle_replays_identically() {
    let run = |seed: u64| {
        let mut engine = TurnEngine::new(
            BattleConfig::default(),
            GridBounds::new(12, 12),
            SkillCatalog::with_defaults(),
            EffectCatalog::with_defaults(),
            Box::new(DiceRoller::from_seed(seed)),
        )
        .unwrap();

        let classes = ClassCatalog::with_defaults();
        engine.add_unit(
            classes
                .get("soldier")
                .unwrap()
                .spawn("Asli", Allegiance::Ally)
                .at(GridPos::new(0, 0)),
        );
        engine.add_unit(
            classes
                .get("ranger")
                .unwrap()
                .spawn("Brook", Allegiance::Ally)
                .at(GridPos::new(0, 2)),
        );
        engine.add_unit(
            classes
                .get("warden")
                .unwrap()
                .spawn("Coal", Allegiance::Enemy)
                .at(GridPos::new(11, 0)),
        );
        engine.add_unit(
            classes
                .get("hexer")
                .unwrap()
                .spawn("Dusk", Allegiance::Enemy)
                .at(GridPos::new(11, 2)),
        );

        let outcome = engine.run().unwrap();
        let turns = engine.turn();
        let hp_trace: Vec<(i32, i32)> = engine
            .events()
            .iter()
            .filter_map(|e| match e {
                BattleEvent::DamageCalculated {
                    new_hp, new_barrier, ..
                } => Some((*new_hp, *new_barrier)),
                _ => None,
            })
            .collect();
        (outcome, turns, hp_trace)
    };

    assert_eq!(run(20260829), run(20260829));
}

#[test]
fn class_battle_terminates_within_turn_cap() {
    let mut engine = TurnEngine::new(
        BattleConfig::default(),
        GridBounds::new(12, 12),
        SkillCatalog::with_defaults(),
        EffectCatalog::with_defaults(),
        Box::new(DiceRoller::from_seed(7)),
    )
    .unwrap();

    let classes = ClassCatalog::with_defaults();
    engine.add_unit(
        classes
            .get("soldier")
            .unwrap()
            .spawn("Asli", Allegiance::Ally)
            .at(GridPos::new(0, 0)),
    );
    engine.add_unit(
        classes
            .get("warden")
            .unwrap()
            .spawn("Coal", Allegiance::Enemy)
            .at(GridPos::new(11, 0)),
    );

    let outcome = engine.run().unwrap();
    assert!(engine.turn() <= BattleConfig::default().max_turns);
    assert!(matches!(
        outcome,
        BattleOutcome::Victory | BattleOutcome::Defeat | BattleOutcome::Draw
    ));

    // Dead units never appear in the final roster
    for unit in [Allegiance::Ally, Allegiance::Enemy]
        .iter()
        .flat_map(|a| engine.roster().living_of(*a))
    {
        assert!(unit.current_hp > 0);
    }
}

#[test]
fn stunned_unit_loses_its_activation() {
    // Slot roll 0.0 always fires: the hexer opens with crippling_hex
    // against the lone enemy, which must then skip its first activation.
    let mut engine = engine_with_fixed(0.0, 2);
    let classes = ClassCatalog::with_defaults();
    engine.add_unit(
        classes
            .get("hexer")
            .unwrap()
            .spawn("Dusk", Allegiance::Ally)
            .at(GridPos::new(0, 0)),
    );
    let victim = engine.add_unit(grunt(Allegiance::Enemy, 1, GridPos::new(1, 0)));

    engine.step().unwrap();
    engine.step().unwrap();

    assert!(engine.events().iter().any(|e| matches!(
        e,
        BattleEvent::StatusEffectApplied { unit_id, effect_id, .. }
            if *unit_id == victim && effect_id == "stun"
    )));
    assert!(engine.events().iter().any(|e| matches!(
        e,
        BattleEvent::UnitTurnSkipped { unit_id, effect_id }
            if *unit_id == victim && effect_id == "stun"
    )));
}
