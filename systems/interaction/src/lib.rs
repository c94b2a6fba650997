#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that turns player proximity and keypresses into interaction
//! commands.
//!
//! External physics reports which lights the player stands near; when the
//! interact key is pressed, the system emits `Command::Interact` for each of
//! them. The world decides whether the interaction succeeds, so this system
//! holds no light state of its own.

use std::collections::BTreeSet;

use gloamwell_core::{Command, LightId};

/// Tracks the lights currently within the player's reach and emits
/// interaction commands on demand.
#[derive(Debug, Default)]
pub struct Interaction {
    in_range: BTreeSet<LightId>,
}

impl Interaction {
    /// Creates a new interaction system with nothing in range.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that the player moved within reach of the light.
    pub fn player_entered(&mut self, light: LightId) {
        let _ = self.in_range.insert(light);
    }

    /// Records that the player moved out of reach of the light.
    pub fn player_left(&mut self, light: LightId) {
        let _ = self.in_range.remove(&light);
    }

    /// Reports whether any light is currently within reach.
    #[must_use]
    pub fn anything_in_range(&self) -> bool {
        !self.in_range.is_empty()
    }

    /// Emits an interaction command for every in-range light, in identifier
    /// order, when the interact key was pressed this frame.
    pub fn handle(&mut self, interact_pressed: bool, out: &mut Vec<Command>) {
        if !interact_pressed {
            return;
        }

        for light in &self.in_range {
            out.push(Command::Interact { light: *light });
        }
    }
}
