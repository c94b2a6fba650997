#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Gloamwell simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems and
//! presentation layers to react to deterministically.

use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Gloamwell.";

/// Unique identifier assigned to a light source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LightId(u32);

impl LightId {
    /// Creates a new light identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a blocking obstacle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObstacleId(u32);

impl ObstacleId {
    /// Creates a new obstacle identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Items the player can carry, consulted by ignition requirements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Item {
    /// Handheld light the player can aim.
    Flashlight,
    /// Required to ignite fire-based lights.
    Matchbox,
    /// Opens locked doors elsewhere in the game.
    Key,
}

impl Item {
    /// Canonical display name of the item.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Flashlight => "Flashlight",
            Self::Matchbox => "Matchbox",
            Self::Key => "Key",
        }
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Item {
    type Err = UnknownItem;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "flashlight" => Ok(Self::Flashlight),
            "matchbox" => Ok(Self::Matchbox),
            "key" => Ok(Self::Key),
            _ => Err(UnknownItem {
                name: value.to_owned(),
            }),
        }
    }
}

/// Error produced when parsing an unrecognised item name.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown item `{name}`")]
pub struct UnknownItem {
    /// Name that failed to parse.
    pub name: String,
}

/// Predicate applied over the puzzle's source lights to detect completion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionMode {
    /// At least one source light must be lit.
    AnyLit,
    /// Every source light must be lit.
    AllLit,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Player interaction with a light: toggles it, subject to its gate.
    Interact {
        /// Identifier of the light being interacted with.
        light: LightId,
    },
    /// Requests that a light turn on, subject to its ignition gate.
    TurnOn {
        /// Identifier of the light to ignite.
        light: LightId,
    },
    /// Requests that a light turn off. Extinguishing is never gated.
    TurnOff {
        /// Identifier of the light to extinguish.
        light: LightId,
    },
    /// Requests a specific logical state; the on direction is gated.
    SetLight {
        /// Identifier of the light to drive.
        light: LightId,
        /// Desired logical state.
        on: bool,
    },
    /// Enables the light's lifetime countdown with the provided duration.
    EnableLifetime {
        /// Identifier of the light whose lifetime is configured.
        light: LightId,
        /// Full countdown duration applied on each ignition.
        duration: Duration,
    },
    /// Disables the light's lifetime countdown, cancelling any active timer.
    DisableLifetime {
        /// Identifier of the light whose lifetime is disabled.
        light: LightId,
    },
    /// Adds an item to the player's inventory.
    GrantItem {
        /// Item being granted.
        item: Item,
    },
    /// Removes an item from the player's inventory.
    RevokeItem {
        /// Item being revoked.
        item: Item,
    },
    /// Extinguishes every puzzle light and restores the blocking obstacles.
    ResetPuzzle,
    /// Forces every puzzle source light on; targets follow on the next tick.
    CompletePuzzle,
    /// Clears the puzzle lock without touching completion or obstacles.
    UnlockPuzzle,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a light completed a logical on/off transition.
    LightStateChanged {
        /// Identifier of the light that changed.
        light: LightId,
        /// Logical state after the transition.
        is_on: bool,
    },
    /// Reports that an ignition attempt was rejected by a requirement gate.
    IgnitionRejected {
        /// Identifier of the light that refused to ignite.
        light: LightId,
        /// Human-readable requirement message for presentation.
        message: String,
    },
    /// Reports that a light's lifetime countdown expired and forced it off.
    LifetimeExpired {
        /// Identifier of the light that burned out.
        light: LightId,
    },
    /// Confirms that an item was added to the player's inventory.
    ItemGranted {
        /// Item that was added.
        item: Item,
    },
    /// Confirms that an item was removed from the player's inventory.
    ItemRevoked {
        /// Item that was removed.
        item: Item,
    },
    /// Announces that the puzzle's completion predicate became satisfied.
    PuzzleCompleted,
    /// Announces that the completion predicate became unsatisfied again.
    PuzzleReset,
    /// Reports that a reset request was refused because the puzzle is locked.
    PuzzleResetRefused,
    /// Announces that the puzzle locked itself after completing.
    PuzzleLocked,
    /// Announces that the puzzle lock was explicitly cleared.
    PuzzleUnlocked,
    /// Announces that the well's blocking obstacles were disabled.
    WellOpened,
    /// Confirms that a blocking obstacle changed its enabled flag.
    ObstacleToggled {
        /// Identifier of the obstacle that changed.
        obstacle: ObstacleId,
        /// Whether the obstacle now blocks passage.
        enabled: bool,
    },
}

/// Immutable representation of a single light's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct LightSnapshot {
    /// Unique identifier assigned to the light.
    pub id: LightId,
    /// Logical on/off state.
    pub is_on: bool,
    /// Current visual intensity, lagging the logical state via the fade.
    pub intensity: f32,
    /// Current visual radius, lagging the logical state via the fade.
    pub radius: f32,
    /// Remaining lifetime countdown, when one is armed.
    pub lifetime_remaining: Option<Duration>,
}

/// Read-only snapshot describing all lights in the level.
#[derive(Clone, Debug, Default)]
pub struct LightView {
    snapshots: Vec<LightSnapshot>,
}

impl LightView {
    /// Creates a new light view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<LightSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &LightSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot for a specific light.
    #[must_use]
    pub fn get(&self, light: LightId) -> Option<&LightSnapshot> {
        self.snapshots
            .binary_search_by_key(&light, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<LightSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single obstacle's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObstacleSnapshot {
    /// Unique identifier assigned to the obstacle.
    pub id: ObstacleId,
    /// Whether the obstacle currently blocks passage.
    pub enabled: bool,
}

/// Read-only snapshot describing all blocking obstacles in the level.
#[derive(Clone, Debug, Default)]
pub struct ObstacleView {
    snapshots: Vec<ObstacleSnapshot>,
}

impl ObstacleView {
    /// Creates a new obstacle view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<ObstacleSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &ObstacleSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<ObstacleSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of the puzzle's lock state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PuzzleSnapshot {
    /// Whether the completion predicate is currently satisfied.
    pub completed: bool,
    /// Whether the puzzle froze itself after completing.
    pub locked: bool,
    /// Predicate applied over the source lights.
    pub mode: CompletionMode,
}

/// Reasons a level configuration is rejected at world construction.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Two lights in the level share the same identifier.
    #[error("duplicate light id {}", light.get())]
    DuplicateLight {
        /// Identifier that appeared more than once.
        light: LightId,
    },
    /// Two obstacles in the level share the same identifier.
    #[error("duplicate obstacle id {}", obstacle.get())]
    DuplicateObstacle {
        /// Identifier that appeared more than once.
        obstacle: ObstacleId,
    },
    /// A link rule references a light that does not exist in the level.
    #[error("link rule references unknown light id {}", light.get())]
    UnknownLight {
        /// Identifier that failed to resolve.
        light: LightId,
    },
    /// The puzzle references an obstacle that does not exist in the level.
    #[error("puzzle references unknown obstacle id {}", obstacle.get())]
    UnknownObstacle {
        /// Identifier that failed to resolve.
        obstacle: ObstacleId,
    },
    /// The puzzle was configured without any link rules.
    #[error("puzzle requires at least one link rule")]
    EmptyRuleSet,
    /// A lifetime or rule delay was non-finite or too large to represent.
    #[error("light id {} specifies an unrepresentable duration", light.get())]
    InvalidDuration {
        /// Identifier of the light the duration is attached to; for a rule
        /// delay, the rule's source light.
        light: LightId,
    },
    /// A light was configured with a fade speed that can never converge.
    #[error("light id {} requires a positive fade speed", light.get())]
    NonPositiveFadeSpeed {
        /// Identifier of the misconfigured light.
        light: LightId,
    },
}
