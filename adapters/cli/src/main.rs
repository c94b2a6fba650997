#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs the Gloamwell well puzzle as a scripted
//! demonstration: pick up the matchbox, light every torch, and watch the
//! links, the completion lock, and the well opening play out.

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use gloamwell_core::{Command, Event, Item, LightId};
use gloamwell_system_interaction::Interaction;
use gloamwell_world::{self as world, config::LevelConfig, query, World};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Arguments accepted by the Gloamwell demonstration binary.
#[derive(Debug, Parser)]
#[command(name = "gloamwell", about = "Runs the Gloamwell well puzzle demo")]
struct Args {
    /// Path to the TOML level description.
    #[arg(long, default_value = "assets/well.toml")]
    level: PathBuf,
    /// Number of simulation ticks to run after the torches are lit.
    #[arg(long, default_value_t = 50)]
    ticks: u32,
    /// Length of one tick in milliseconds.
    #[arg(long, default_value_t = 100)]
    dt_ms: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let contents = fs::read_to_string(&args.level)
        .with_context(|| format!("failed to read level file at {}", args.level.display()))?;
    let config: LevelConfig =
        toml::from_str(&contents).context("failed to parse level toml contents")?;
    let mut world = World::from_config(&config).context("level configuration was rejected")?;

    println!("{}", query::welcome_banner(&world));

    let dt = Duration::from_millis(args.dt_ms);
    let mut events = Vec::new();

    // The player picks up the matchbox, then stands at each torch and
    // presses the interact key.
    world::apply(
        &mut world,
        Command::GrantItem {
            item: Item::Matchbox,
        },
        &mut events,
    );

    let mut interaction = Interaction::new();
    for link in &config.rules {
        interaction.player_entered(LightId::new(link.source));
    }
    let mut commands = Vec::new();
    interaction.handle(true, &mut commands);
    for command in commands.drain(..) {
        world::apply(&mut world, command, &mut events);
    }

    for _ in 0..args.ticks {
        world::apply(&mut world, Command::Tick { dt }, &mut events);
    }

    for event in events.drain(..) {
        if let Some(line) = describe(&event) {
            info!("{line}");
        }
    }

    let puzzle = query::puzzle(&world);
    info!(
        completed = puzzle.completed,
        locked = puzzle.locked,
        "final puzzle state"
    );
    for obstacle in query::obstacle_view(&world).iter() {
        info!(
            obstacle = obstacle.id.get(),
            blocking = obstacle.enabled,
            "obstacle state"
        );
    }
    for light in query::light_view(&world).iter() {
        info!(
            light = light.id.get(),
            is_on = light.is_on,
            intensity = light.intensity,
            radius = light.radius,
            "light state"
        );
    }

    Ok(())
}

/// Renders an event as a player-facing line; clock noise is skipped.
fn describe(event: &Event) -> Option<String> {
    match event {
        Event::TimeAdvanced { .. } => None,
        Event::LightStateChanged { light, is_on } => Some(format!(
            "light {} is now {}",
            light.get(),
            if *is_on { "ON" } else { "OFF" }
        )),
        Event::IgnitionRejected { light, message } => {
            Some(format!("light {} refused to ignite: {message}", light.get()))
        }
        Event::LifetimeExpired { light } => Some(format!("light {} burned out", light.get())),
        Event::ItemGranted { item } => Some(format!("picked up the {item}")),
        Event::ItemRevoked { item } => Some(format!("lost the {item}")),
        Event::PuzzleCompleted => Some("the puzzle is complete".to_owned()),
        Event::PuzzleReset => Some("the puzzle reset".to_owned()),
        Event::PuzzleResetRefused => Some("cannot reset the puzzle: it is locked".to_owned()),
        Event::PuzzleLocked => Some("the torches can no longer be extinguished".to_owned()),
        Event::PuzzleUnlocked => Some("the puzzle is unlocked".to_owned()),
        Event::WellOpened => Some("the well is now accessible".to_owned()),
        Event::ObstacleToggled { obstacle, enabled } => Some(format!(
            "obstacle {} is now {}",
            obstacle.get(),
            if *enabled { "blocking" } else { "open" }
        )),
    }
}
