//! tree-runner: headless runner for the prestige-tree game core.
//!
//! Usage:
//!   tree-runner --ticks 2000 --db save.db
//!   tree-runner --ticks 2000 --speed 10
//!   tree-runner --reset

use anyhow::Result;
use prestige_core::{
    format::{format, format_gain, format_time, format_whole},
    layer::{LayerSpec, ResourceCalculation},
    Decimal, GameEngine, GameSpec, LayerRegistry, PointsPipeline, SqliteStorage,
};
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ticks = parse_arg(&args, "--ticks", 2000u64);
    let speed = parse_arg(&args, "--speed", 1.0f64);
    let reset = args.iter().any(|a| a == "--reset");
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].as_str())
        .unwrap_or(":memory:");

    let spec = GameSpec::default();
    println!("{} :: tree-runner", spec.name);
    println!("  version: {}", spec.version);
    println!("  ticks:   {ticks}");
    println!("  speed:   {speed}");
    println!("  db:      {db}");
    println!();

    let storage = if db == ":memory:" {
        SqliteStorage::in_memory()?
    } else {
        SqliteStorage::open(db)?
    };

    let now = chrono::Utc::now().timestamp_millis() as u64;
    let mut engine = GameEngine::new(spec, build_registry(), storage, now)
        .with_pipeline(build_pipeline());

    if reset {
        engine.reset_save(now)?;
    }
    engine.load(now)?;
    engine.player_mut().dev.speed_mult = speed;

    let period = engine.spec().update_rate_ms;
    let mut clock = now;
    for _ in 0..ticks {
        clock += period;
        engine.advance(clock)?;
    }
    engine.save()?;

    print_summary(&engine, ticks);
    verify_round_trip(&mut engine, clock)?;
    Ok(())
}

/// Demo content: a prestige layer that accrues currency from points, and a
/// booster layer on the static cost path.
fn build_registry() -> LayerRegistry {
    let mut registry = LayerRegistry::new();

    let mut prestige = LayerSpec::new("P", "Prestige", 1);
    prestige.symbol = "P".to_string();
    prestige.base_requirement = Decimal::from(1_000.0);
    prestige.base_data.unlocked = true;
    prestige.calculation = ResourceCalculation::Incremental {
        formula: Box::new(|base| base.div(&Decimal::from(1_000.0)).sqrt()),
        effects: Box::new(Decimal::clone),
        passive_generation: None,
    };
    prestige.update = Some(Box::new(|player, diff| {
        let earned = player.points.sqrt().mul(diff).div(&Decimal::from(100.0));
        if let Some(node) = player.node_mut("P") {
            node.points = node.points.add(&earned);
            node.total = node.total.add(&earned);
            node.best = node.best.max(&node.points);
        }
    }));
    registry.register(prestige);

    let mut boosters = LayerSpec::new("B", "Boosters", 2);
    boosters.symbol = "B".to_string();
    boosters.branches_from = vec!["P".to_string()];
    boosters.base_requirement = Decimal::from(200.0);
    boosters.calculation = ResourceCalculation::Static {
        formula: Box::new(|base| base.pow(&Decimal::from(1.5))),
        effects: Box::new(Decimal::clone),
        round_cost: true,
        can_buy_max: Box::new(|_| false),
    };
    registry.register(boosters);

    registry
}

fn build_pipeline() -> PointsPipeline {
    PointsPipeline {
        can_generate: Box::new(|_| true),
        base_gain: Box::new(|_| Decimal::one()),
        // Prestige currency multiplies point gain.
        multipliers: Box::new(|player, gain| {
            let bonus = match player.node("P") {
                Some(node) => node.points.add(&Decimal::one()),
                None => Decimal::one(),
            };
            gain.mul(&bonus)
        }),
        powerers: Box::new(|_, gain| gain),
    }
}

fn print_summary(engine: &GameEngine<SqliteStorage>, ticks: u64) {
    let player = engine.player();
    let gain = engine.points_gain();

    println!("=== RUN SUMMARY ===");
    println!("  ticks run:   {ticks}");
    println!(
        "  time played: {}",
        format_time(&Decimal::from(player.time_played), true)
    );
    println!(
        "  points:      {} {}",
        format(&player.points, 2),
        format_gain(&player.points, &gain, 2)
    );
    println!(
        "  endgame:     {}",
        if engine.endgame_reached() {
            "reached"
        } else {
            "not reached"
        }
    );
    println!();
    println!("=== LAYERS ===");
    for layer in engine.registry().iter() {
        let Some(node) = player.node(&layer.id) else {
            continue;
        };
        println!(
            "  {:>2} | unlocked: {:5} | currency: {:>12} | best: {}",
            layer.id,
            node.unlocked,
            format(&node.points, 2),
            format_whole(&node.best, false)
        );
    }
    println!();
}

/// Saves, reloads and confirms the codec reproduced the state exactly.
fn verify_round_trip(
    engine: &mut GameEngine<SqliteStorage>,
    clock: u64,
) -> Result<()> {
    let before = engine.player().clone();
    engine.load(clock)?;
    let after = engine.player();
    if after.points == before.points && after.nodes == before.nodes {
        println!("save round-trip: OK");
    } else {
        println!("save round-trip: MISMATCH");
        println!("  before: {}", format(&before.points, 2));
        println!("  after:  {}", format(&after.points, 2));
    }
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
