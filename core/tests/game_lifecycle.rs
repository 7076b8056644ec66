//! Full engine lifecycle against real storage: fresh start, ticking with
//! layer content, autosave, reload with offline catch-up, corruption
//! fallback, migration, and hard reset.

use prestige_core::{
    layer::{LayerSpec, ResourceCalculation},
    save::{check_player, InvalidSavePolicy},
    Decimal, GameEngine, GameError, GameSpec, LayerRegistry, MemoryStorage,
    PointsPipeline, SqliteStorage,
};

fn generating_pipeline() -> PointsPipeline {
    PointsPipeline {
        can_generate: Box::new(|_| true),
        base_gain: Box::new(|_| Decimal::from(10.0)),
        multipliers: Box::new(|_, gain| gain.mul(&Decimal::from(2.0))),
        powerers: Box::new(|_, gain| gain.pow(&Decimal::from(1.0))),
    }
}

fn prestige_registry() -> LayerRegistry {
    let mut registry = LayerRegistry::new();
    let mut spec = LayerSpec::new("P", "Prestige", 1);
    spec.base_requirement = Decimal::from(1_000.0);
    spec.base_data.unlocked = true;
    spec.calculation = ResourceCalculation::Incremental {
        formula: Box::new(|base| base.div(&Decimal::from(1_000.0)).sqrt()),
        effects: Box::new(Decimal::clone),
        passive_generation: None,
    };
    // Accrue the layer currency passively each tick.
    spec.update = Some(Box::new(|player, diff| {
        let earned = player.points.sqrt().mul(diff);
        if let Some(node) = player.node_mut("P") {
            node.points = node.points.add(&earned);
            node.total = node.total.add(&earned);
        }
    }));
    registry.register(spec);
    registry
}

fn build(storage: MemoryStorage) -> GameEngine<MemoryStorage> {
    GameEngine::new(GameSpec::default(), prestige_registry(), storage, 0)
        .with_pipeline(generating_pipeline())
}

#[test]
fn fresh_engine_seeds_layer_nodes() {
    let engine = build(MemoryStorage::new());
    let node = engine.player().node("P").expect("seeded node");
    assert!(node.unlocked);
    assert!(node.points.is_zero());
    assert!(check_player(engine.player()).is_ok());
}

#[test]
fn ticking_accrues_points_and_layer_currency() {
    let mut engine = build(MemoryStorage::new());
    engine.tick(1_000);
    // 10 base gain doubled for one second on top of 100 starting points.
    assert_eq!(engine.player().points, Decimal::from(120.0));
    assert!(engine.player().node("P").unwrap().points.gt(&Decimal::zero()));
    assert_eq!(engine.player().time_played, 1.0);
}

#[test]
fn save_reload_preserves_progress_across_engines() {
    let mut engine = build(MemoryStorage::new());
    // Persisted config governs offline behavior after reload; keep the
    // comparison exact by switching catch-up off in the save itself.
    engine.player_mut().config.offline_production = false;
    for _ in 0..10 {
        engine.tick(1_000);
    }
    engine.save().unwrap();
    let saved_points = engine.player().points.clone();
    let saved_layer = engine.player().node("P").unwrap().points.clone();

    let storage = engine.into_storage();
    let mut engine = build(storage);
    engine.load(10_000).unwrap();
    assert_eq!(engine.player().points, saved_points);
    assert_eq!(engine.player().node("P").unwrap().points, saved_layer);
}

#[test]
fn offline_production_grants_capped_catch_up() {
    let mut engine = build(MemoryStorage::new());
    engine.save().unwrap();

    // Away for 2 hours: well inside the 24 hour limit.
    let two_hours = 2 * 3600 * 1000;
    engine.load(two_hours).unwrap();
    assert_eq!(engine.player().time_played, 7_200.0);
    // 20 points/sec over 7200 seconds on top of the initial 100.
    assert_eq!(engine.player().points, Decimal::from(144_100.0));
}

#[test]
fn corrupt_envelope_resets_to_defaults() {
    let mut storage = MemoryStorage::new();
    use prestige_core::SaveStorage;
    storage
        .write("tpt-ts", "ModdingTreeSavefileFormatHeader garbage")
        .unwrap();
    let mut engine = build(storage);
    engine.load(5_000).unwrap();
    assert_eq!(engine.player().points, Decimal::from(100.0));
    assert_eq!(engine.player().last_update, 5_000);
    assert!(engine.player().node("P").is_some());
}

#[test]
fn nan_poisoned_save_is_discarded_on_load() {
    let mut engine =
        build(MemoryStorage::new()).with_policy(InvalidSavePolicy::WarnAndSave);
    engine.tick(60_000);
    engine.player_mut().points = Decimal::nan();
    assert!(engine.save().unwrap());

    let storage = engine.into_storage();
    let mut engine = build(storage);
    engine.load(100_000).unwrap();
    assert!(check_player(engine.player()).is_ok());
    assert_eq!(engine.player().points, Decimal::from(100.0));
}

#[test]
fn older_save_is_migrated_forward() {
    let mut engine = build(MemoryStorage::new());
    engine.player_mut().version = "1.9".to_string();
    engine.tick(1_000);
    engine.save().unwrap();

    let storage = engine.into_storage();
    let mut engine = build(storage);
    engine.load(2_000).unwrap();
    assert_eq!(engine.player().version, "2.0-indev1");
}

#[test]
fn newer_save_refuses_to_load() {
    let mut engine = build(MemoryStorage::new());
    engine.player_mut().version = "9.9".to_string();
    engine.save().unwrap();

    let storage = engine.into_storage();
    let mut engine = build(storage);
    assert!(matches!(
        engine.load(2_000),
        Err(GameError::UnsupportedSaveVersion { .. })
    ));
}

#[test]
fn hard_reset_clears_progress_and_persists() {
    let mut engine = build(MemoryStorage::new());
    engine.tick(3_600_000);
    assert!(engine.player().points.gt(&Decimal::from(100.0)));

    engine.reset_save(4_000_000).unwrap();
    assert_eq!(engine.player().points, Decimal::from(100.0));
    assert_eq!(engine.player().time_played, 0.0);
    assert!(engine.player().node("P").unwrap().points.is_zero());

    engine.load(4_000_000).unwrap();
    assert_eq!(engine.player().points, Decimal::from(100.0));
}

#[test]
fn scheduler_driven_run_autosaves() {
    let mut engine = build(MemoryStorage::new());
    engine.load(0).unwrap();

    let mut saves = 0;
    for step in 1..=2_000u64 {
        let fired = engine.advance(step * 33).unwrap();
        if fired.autosave {
            saves += 1;
        }
    }
    // 66 seconds of play at a 30 second autosave period.
    assert_eq!(saves, 2);
    assert!(engine.player().time_played > 60.0);
}

#[test]
fn sqlite_storage_backs_a_full_cycle() {
    let storage = SqliteStorage::in_memory().unwrap();
    let mut engine =
        GameEngine::new(GameSpec::default(), prestige_registry(), storage, 0)
            .with_pipeline(generating_pipeline());
    engine.player_mut().config.offline_production = false;
    engine.tick(5_000);
    let points = engine.player().points.clone();
    engine.save().unwrap();

    engine.player_mut().points = Decimal::zero();
    engine.load(6_000).unwrap();
    assert_eq!(engine.player().points, points);
}
