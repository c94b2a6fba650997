//! Declarative level descriptions consumed by [`World::from_config`].
//!
//! Adapters deserialize these structs from TOML level files; tests build them
//! directly. All cross-references are validated at world construction, never
//! tolerated at runtime.
//!
//! [`World::from_config`]: crate::World::from_config

use gloamwell_core::{CompletionMode, Item};
use serde::Deserialize;

/// Complete description of a level's lights, obstacles, and puzzle wiring.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LevelConfig {
    /// Seed used to derive per-light flicker noise seeds.
    #[serde(default)]
    pub seed: u64,
    /// Items already in the player's inventory when the level starts.
    #[serde(default)]
    pub items: Vec<Item>,
    /// Every controllable light in the level.
    pub lights: Vec<LightConfig>,
    /// Blocking obstacles the puzzle may toggle.
    #[serde(default)]
    pub obstacles: Vec<ObstacleConfig>,
    /// One-way propagation rules between lights.
    pub rules: Vec<RuleConfig>,
    /// Puzzle completion and lock behavior.
    #[serde(default)]
    pub puzzle: PuzzleConfig,
}

/// Parameters for a single light source.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LightConfig {
    /// Stable identifier other configuration sections refer to.
    pub id: u32,
    /// Whether the light starts the level lit.
    #[serde(default)]
    pub lit: bool,
    /// Intensity reached when fully lit.
    #[serde(default = "default_intensity")]
    pub intensity: f32,
    /// Radius reached when fully lit.
    #[serde(default = "default_radius")]
    pub radius: f32,
    /// Maximum rate of approach toward the targets, in units per second.
    #[serde(default = "default_fade_speed")]
    pub fade_speed: f32,
    /// Flame-style flicker, when present.
    #[serde(default)]
    pub flicker: Option<FlickerConfig>,
    /// Ignition requirement, when present.
    #[serde(default)]
    pub requires: Option<GateConfig>,
    /// Self-extinguish countdown in seconds, when present.
    #[serde(default)]
    pub lifetime_secs: Option<f32>,
}

/// Flicker amplitudes and rate for flame-style lights.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FlickerConfig {
    /// Maximum deviation applied to the intensity target.
    #[serde(default = "default_intensity_variation")]
    pub intensity_variation: f32,
    /// Maximum deviation applied to the radius target.
    #[serde(default = "default_radius_variation")]
    pub radius_variation: f32,
    /// Rate at which the noise field is traversed.
    #[serde(default = "default_flicker_speed")]
    pub speed: f32,
}

impl Default for FlickerConfig {
    fn default() -> Self {
        Self {
            intensity_variation: default_intensity_variation(),
            radius_variation: default_radius_variation(),
            speed: default_flicker_speed(),
        }
    }
}

/// Ignition requirement: the item to check and the message shown on refusal.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GateConfig {
    /// Inventory item the player must carry to ignite the light.
    pub item: Item,
    /// Message surfaced when ignition is refused; a default is derived from
    /// the item when omitted.
    #[serde(default)]
    pub message: Option<String>,
}

/// One-way propagation rule between two configured lights.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    /// Identifier of the observed light.
    pub source: u32,
    /// Identifier of the driven light.
    pub target: u32,
    /// Drives the target to the opposite of the source when set.
    #[serde(default)]
    pub invert: bool,
    /// Seconds between a source edge and the target responding.
    #[serde(default)]
    pub delay_secs: f32,
}

/// Completion predicate, lock behavior, and obstacle wiring.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PuzzleConfig {
    /// Predicate applied over the rule sources.
    #[serde(default = "default_mode")]
    pub mode: CompletionMode,
    /// Whether completing the puzzle freezes it permanently.
    #[serde(default = "default_true")]
    pub lock_on_completion: bool,
    /// Whether locking forces every source light on.
    #[serde(default = "default_true")]
    pub force_sources_on_lock: bool,
    /// Whether locking disables the sources' lifetime countdowns.
    #[serde(default = "default_true")]
    pub disable_lifetimes_on_lock: bool,
    /// Whether completion disables the listed obstacles.
    #[serde(default = "default_true")]
    pub open_obstacles_on_completion: bool,
    /// Obstacles toggled by completion and reset.
    #[serde(default)]
    pub obstacles: Vec<u32>,
}

impl Default for PuzzleConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            lock_on_completion: true,
            force_sources_on_lock: true,
            disable_lifetimes_on_lock: true,
            open_obstacles_on_completion: true,
            obstacles: Vec::new(),
        }
    }
}

/// A single blocking obstacle and its starting state.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObstacleConfig {
    /// Stable identifier the puzzle refers to.
    pub id: u32,
    /// Whether the obstacle starts out blocking passage.
    #[serde(default = "default_true")]
    pub blocking: bool,
}

fn default_intensity() -> f32 {
    1.0
}

fn default_radius() -> f32 {
    5.0
}

fn default_fade_speed() -> f32 {
    3.0
}

fn default_intensity_variation() -> f32 {
    0.2
}

fn default_radius_variation() -> f32 {
    0.5
}

fn default_flicker_speed() -> f32 {
    2.0
}

fn default_mode() -> CompletionMode {
    CompletionMode::AnyLit
}

fn default_true() -> bool {
    true
}
