#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative environmental state for Gloamwell.
//!
//! The world owns every light source, the player's inventory, the link rules
//! that propagate state between lights, the puzzle completion machinery, and
//! the blocking obstacles the puzzle toggles. Adapters submit [`Command`]
//! values through [`apply`]; the world mutates deterministically and
//! broadcasts [`Event`] values in return. All timing flows through
//! `Command::Tick`, which runs the tick pipeline in a fixed order: lifetime
//! countdowns, fade/flicker integration, then rule evaluation and completion
//! recomputation.

pub mod config;
mod lights;
mod puzzle;

use std::time::Duration;

use gloamwell_core::{
    Command, ConfigError, Event, Item, LightId, ObstacleId, WELCOME_BANNER,
};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use config::LevelConfig;
use lights::{Effect, Gate, Lifetime, Light};
use puzzle::{LinkRule, Puzzle};

/// Items currently carried by the player.
///
/// Owned by the world and consulted by ignition gates; external collaborators
/// mutate it only through `GrantItem`/`RevokeItem` commands.
#[derive(Clone, Copy, Debug, Default)]
struct Inventory {
    flashlight: bool,
    matchbox: bool,
    key: bool,
}

impl Inventory {
    fn has(&self, item: Item) -> bool {
        match item {
            Item::Flashlight => self.flashlight,
            Item::Matchbox => self.matchbox,
            Item::Key => self.key,
        }
    }

    fn grant(&mut self, item: Item) -> bool {
        let slot = self.slot(item);
        let added = !*slot;
        *slot = true;
        added
    }

    fn revoke(&mut self, item: Item) -> bool {
        let slot = self.slot(item);
        let removed = *slot;
        *slot = false;
        removed
    }

    fn slot(&mut self, item: Item) -> &mut bool {
        match item {
            Item::Flashlight => &mut self.flashlight,
            Item::Matchbox => &mut self.matchbox,
            Item::Key => &mut self.key,
        }
    }
}

/// A blocking obstacle whose enabled flag the puzzle toggles.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Obstacle {
    pub(crate) id: ObstacleId,
    pub(crate) enabled: bool,
}

/// Represents the authoritative Gloamwell environmental state.
#[derive(Clone, Debug)]
pub struct World {
    banner: &'static str,
    lights: Vec<Light>,
    inventory: Inventory,
    rules: Vec<LinkRule>,
    puzzle: Puzzle,
    obstacles: Vec<Obstacle>,
    elapsed: Duration,
}

impl World {
    /// Builds a world from a level description, validating every
    /// cross-reference up front. Invalid configurations are rejected here
    /// rather than tolerated at runtime.
    pub fn from_config(config: &LevelConfig) -> Result<Self, ConfigError> {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

        let mut lights: Vec<Light> = Vec::with_capacity(config.lights.len());
        for light_config in &config.lights {
            let id = LightId::new(light_config.id);
            if lights.iter().any(|light| light.id == id) {
                return Err(ConfigError::DuplicateLight { light: id });
            }
            if light_config.fade_speed <= 0.0 {
                return Err(ConfigError::NonPositiveFadeSpeed { light: id });
            }

            let effect = match light_config.flicker {
                Some(flicker) => Effect::Flicker {
                    intensity_variation: flicker.intensity_variation,
                    radius_variation: flicker.radius_variation,
                    speed: flicker.speed,
                    seed: rng.next_u64(),
                },
                None => Effect::Steady,
            };
            let gate = light_config.requires.as_ref().map(|requires| Gate {
                item: requires.item,
                message: requires
                    .message
                    .clone()
                    .unwrap_or_else(|| format!("Need a {} to light this", requires.item)),
            });
            let lifetime = match light_config.lifetime_secs {
                Some(secs) => Lifetime::with_duration(config_duration(secs, id)?),
                None => Lifetime::disabled(),
            };

            lights.push(Light::new(
                id,
                light_config.lit,
                light_config.intensity,
                light_config.radius,
                light_config.fade_speed,
                effect,
                gate,
                lifetime,
            ));
        }

        let mut obstacles: Vec<Obstacle> = Vec::with_capacity(config.obstacles.len());
        for obstacle_config in &config.obstacles {
            let id = ObstacleId::new(obstacle_config.id);
            if obstacles.iter().any(|obstacle| obstacle.id == id) {
                return Err(ConfigError::DuplicateObstacle { obstacle: id });
            }
            obstacles.push(Obstacle {
                id,
                enabled: obstacle_config.blocking,
            });
        }

        if config.rules.is_empty() {
            return Err(ConfigError::EmptyRuleSet);
        }
        let mut rules: Vec<LinkRule> = Vec::with_capacity(config.rules.len());
        for rule_config in &config.rules {
            let source = LightId::new(rule_config.source);
            let target = LightId::new(rule_config.target);
            let Some(source_on) = lights::state_of(&lights, source) else {
                return Err(ConfigError::UnknownLight { light: source });
            };
            if lights::state_of(&lights, target).is_none() {
                return Err(ConfigError::UnknownLight { light: target });
            }
            rules.push(LinkRule::new(
                source,
                target,
                rule_config.invert,
                config_duration(rule_config.delay_secs, source)?,
                source_on,
            ));
        }

        let mut puzzle_obstacles = Vec::with_capacity(config.puzzle.obstacles.len());
        for raw_id in &config.puzzle.obstacles {
            let id = ObstacleId::new(*raw_id);
            if !obstacles.iter().any(|obstacle| obstacle.id == id) {
                return Err(ConfigError::UnknownObstacle { obstacle: id });
            }
            puzzle_obstacles.push(id);
        }

        let puzzle = Puzzle::new(
            config.puzzle.mode,
            config.puzzle.lock_on_completion,
            config.puzzle.force_sources_on_lock,
            config.puzzle.disable_lifetimes_on_lock,
            config.puzzle.open_obstacles_on_completion,
            puzzle_obstacles,
        );

        let mut inventory = Inventory::default();
        for item in &config.items {
            let _ = inventory.grant(*item);
        }

        Ok(Self {
            banner: WELCOME_BANNER,
            lights,
            inventory,
            rules,
            puzzle,
            obstacles,
            elapsed: Duration::ZERO,
        })
    }

    fn light_mut(&mut self, id: LightId) -> Option<&mut Light> {
        self.lights.iter_mut().find(|light| light.id == id)
    }
}

/// Converts a raw config duration. Negative values collapse to zero;
/// non-finite and unrepresentable values are rejected rather than tolerated.
fn config_duration(secs: f32, light: LightId) -> Result<Duration, ConfigError> {
    if !secs.is_finite() {
        return Err(ConfigError::InvalidDuration { light });
    }
    Duration::try_from_secs_f32(secs.max(0.0))
        .map_err(|_| ConfigError::InvalidDuration { light })
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => tick(world, dt, out_events),
        Command::Interact { light } => request_state(world, light, None, out_events),
        Command::TurnOn { light } => request_state(world, light, Some(true), out_events),
        Command::TurnOff { light } => request_state(world, light, Some(false), out_events),
        Command::SetLight { light, on } => request_state(world, light, Some(on), out_events),
        Command::EnableLifetime { light, duration } => {
            if let Some(found) = world.light_mut(light) {
                let is_on = found.is_on;
                found.lifetime.enable(duration, is_on);
            }
        }
        Command::DisableLifetime { light } => {
            if let Some(found) = world.light_mut(light) {
                found.lifetime.disable();
            }
        }
        Command::GrantItem { item } => {
            if world.inventory.grant(item) {
                out_events.push(Event::ItemGranted { item });
            }
        }
        Command::RevokeItem { item } => {
            if world.inventory.revoke(item) {
                out_events.push(Event::ItemRevoked { item });
            }
        }
        Command::ResetPuzzle => puzzle::reset(
            &world.puzzle,
            &world.rules,
            &mut world.lights,
            &mut world.obstacles,
            out_events,
        ),
        Command::CompletePuzzle => {
            puzzle::complete(&world.rules, &mut world.lights, out_events);
        }
        Command::UnlockPuzzle => puzzle::unlock(&mut world.puzzle, out_events),
    }
}

/// Runs one simulation tick in the contract order: lifetime countdowns, then
/// fade/flicker integration, then rule evaluation and completion detection.
fn tick(world: &mut World, dt: Duration, out_events: &mut Vec<Event>) {
    world.elapsed = world.elapsed.saturating_add(dt);
    out_events.push(Event::TimeAdvanced { dt });

    // Burn-outs land before the rule passes so downstream links observe the
    // forced edge within the same tick.
    for light in world.lights.iter_mut() {
        if light.advance_lifetime(dt) {
            let id = light.id;
            if light.set_state(false) {
                out_events.push(Event::LightStateChanged {
                    light: id,
                    is_on: false,
                });
            }
            out_events.push(Event::LifetimeExpired { light: id });
            tracing::debug!(light = id.get(), "lifetime expired");
        }
    }

    let elapsed_seconds = world.elapsed.as_secs_f32();
    let dt_seconds = dt.as_secs_f32();
    for light in world.lights.iter_mut() {
        light.integrate(elapsed_seconds, dt_seconds);
    }

    puzzle::step(
        &mut world.puzzle,
        &mut world.rules,
        &mut world.lights,
        &mut world.obstacles,
        dt,
        out_events,
    );
}

/// Attempts a logical transition on behalf of the player. The off-to-on
/// direction consults the light's ignition gate; a refused attempt changes
/// nothing and surfaces the gate's message. Extinguishing is never gated.
fn request_state(
    world: &mut World,
    id: LightId,
    desired: Option<bool>,
    out_events: &mut Vec<Event>,
) {
    let Some(index) = world.lights.iter().position(|light| light.id == id) else {
        return;
    };
    let on = desired.unwrap_or(!world.lights[index].is_on);

    if on && !world.lights[index].is_on {
        if let Some(gate) = &world.lights[index].gate {
            if !world.inventory.has(gate.item) {
                let message = gate.message.clone();
                tracing::debug!(light = id.get(), %message, "ignition rejected");
                out_events.push(Event::IgnitionRejected { light: id, message });
                return;
            }
        }
    }

    if world.lights[index].set_state(on) {
        out_events.push(Event::LightStateChanged { light: id, is_on: on });
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use gloamwell_core::{
        Item, LightSnapshot, LightView, ObstacleSnapshot, ObstacleView, PuzzleSnapshot,
    };

    use super::World;

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Captures a read-only view of every light in the level.
    #[must_use]
    pub fn light_view(world: &World) -> LightView {
        LightView::from_snapshots(
            world
                .lights
                .iter()
                .map(|light| LightSnapshot {
                    id: light.id,
                    is_on: light.is_on,
                    intensity: light.intensity,
                    radius: light.radius,
                    lifetime_remaining: light.lifetime.remaining(),
                })
                .collect(),
        )
    }

    /// Captures a read-only view of every blocking obstacle.
    #[must_use]
    pub fn obstacle_view(world: &World) -> ObstacleView {
        ObstacleView::from_snapshots(
            world
                .obstacles
                .iter()
                .map(|obstacle| ObstacleSnapshot {
                    id: obstacle.id,
                    enabled: obstacle.enabled,
                })
                .collect(),
        )
    }

    /// Reports the puzzle's completion and lock state.
    #[must_use]
    pub fn puzzle(world: &World) -> PuzzleSnapshot {
        PuzzleSnapshot {
            completed: world.puzzle.completed(),
            locked: world.puzzle.locked(),
            mode: world.puzzle.mode(),
        }
    }

    /// Reports whether the player currently carries the item.
    #[must_use]
    pub fn has_item(world: &World, item: Item) -> bool {
        world.inventory.has(item)
    }

    /// Total simulated time the world has advanced through.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }
}
