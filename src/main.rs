//! Headless battle runner
//!
//! Spawns two squads from the class catalog, runs the battle to completion
//! and prints a summary as JSON or text. Seeded runs replay identically.

use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

use ember_tactics::battle::{
    BattleEvent, BattleOutcome, GridBounds, TurnEngine,
};
use ember_tactics::core::config::BattleConfig;
use ember_tactics::core::error::Result;
use ember_tactics::core::types::{Allegiance, GridPos};
use ember_tactics::data::{ClassCatalog, EffectCatalog, SkillCatalog};
use ember_tactics::dice::DiceRoller;

#[derive(Parser, Debug)]
#[command(name = "ember-tactics")]
#[command(about = "Run a headless squad battle and print the result")]
struct Args {
    /// Comma-separated ally class ids
    #[arg(long, default_value = "soldier,ranger")]
    allies: String,

    /// Comma-separated enemy class ids
    #[arg(long, default_value = "warden,hexer")]
    enemies: String,

    /// Battlefield width in tiles
    #[arg(long, default_value_t = 12)]
    map_width: i32,

    /// Battlefield height in tiles
    #[arg(long, default_value_t = 12)]
    map_height: i32,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Battle configuration TOML (defaults apply when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Enable verbose battle logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// JSON output structure
#[derive(Serialize)]
struct BattleSummary {
    outcome: String,
    turns: u32,
    seed: u64,
    ally_survivors: usize,
    enemy_survivors: usize,
    total_damage_events: usize,
    units_died: usize,
}

fn run(args: &Args) -> Result<BattleSummary> {
    let seed = args.seed.unwrap_or_else(rand::random);
    tracing::info!(seed, "battle starting");

    let config = match &args.config {
        Some(path) => BattleConfig::load(path)?,
        None => BattleConfig::default(),
    };

    let mut engine = TurnEngine::new(
        config,
        GridBounds::new(args.map_width, args.map_height),
        SkillCatalog::with_defaults(),
        EffectCatalog::with_defaults(),
        Box::new(DiceRoller::from_seed(seed)),
    )?;

    let classes = ClassCatalog::with_defaults();
    spawn_squad(&mut engine, &classes, &args.allies, Allegiance::Ally, 0)?;
    spawn_squad(
        &mut engine,
        &classes,
        &args.enemies,
        Allegiance::Enemy,
        args.map_width - 1,
    )?;

    if args.verbose {
        engine.subscribe(|event| tracing::info!(?event, "battle event"));
    }

    let outcome = engine.run()?;

    let events = engine.events();
    Ok(BattleSummary {
        outcome: match outcome {
            BattleOutcome::Victory => "victory".into(),
            BattleOutcome::Defeat => "defeat".into(),
            BattleOutcome::Draw => "draw".into(),
        },
        turns: engine.turn(),
        seed,
        ally_survivors: engine.roster().living_count(Allegiance::Ally),
        enemy_survivors: engine.roster().living_count(Allegiance::Enemy),
        total_damage_events: events
            .iter()
            .filter(|e| matches!(e, BattleEvent::DamageCalculated { .. }))
            .count(),
        units_died: events
            .iter()
            .filter(|e| matches!(e, BattleEvent::UnitDied { .. }))
            .count(),
    })
}

/// Spawn one class per entry in a comma-separated list, stacked along a
/// column at the given x coordinate.
fn spawn_squad(
    engine: &mut TurnEngine,
    classes: &ClassCatalog,
    list: &str,
    allegiance: Allegiance,
    column: i32,
) -> Result<()> {
    for (row, class_id) in list.split(',').map(str::trim).enumerate() {
        let class = classes.get(class_id).ok_or_else(|| {
            ember_tactics::core::error::TacticsError::ClassNotFound(class_id.to_string())
        })?;
        let name = format!("{} {}", class.name, row + 1);
        let unit = class
            .spawn(name, allegiance)
            .at(GridPos::new(column, row as i32 * 2));
        engine.add_unit(unit);
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                if args.verbose {
                    "ember_tactics=debug".into()
                } else {
                    "ember_tactics=info".into()
                }
            }),
        )
        .init();

    match run(&args) {
        Ok(summary) => {
            if args.format == "text" {
                println!(
                    "{} after {} turns (seed {}): {} allies / {} enemies standing",
                    summary.outcome,
                    summary.turns,
                    summary.seed,
                    summary.ally_survivors,
                    summary.enemy_survivors,
                );
            } else {
                match serde_json::to_string_pretty(&summary) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("Failed to serialize summary: {}", e);
                        return ExitCode::FAILURE;
                    }
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Battle failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
